/// Number of per-word input slots, index-aligned with the sentence words.
pub const SLOT_COUNT: usize = 8;
/// Maximum characters accepted per word slot.
pub const MAX_WORD_LEN: usize = 20;
/// The item redemption buffer holds a single character.
pub const MAX_ITEM_LEN: usize = 1;

/// Engine-level key, decoupled from the terminal backend.
/// The host maps raw key events onto this before calling the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKey {
    Char(char),
    Backspace,
    Submit,
    NextSlot,
    PrevSlot,
}

/// Result of applying a key to the word slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotEdit {
    Edited,
    Submitted,
    Ignored,
}

/// Result of applying a key to the item redemption buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemEdit {
    Edited,
    /// Submit pressed on a non-empty buffer; carries the buffered char and
    /// clears it. Submit on an empty buffer is `Ignored`.
    Submitted(char),
    Ignored,
}

/// Eight per-word text buffers plus one single-char item buffer.
///
/// Focus moves between slots but never wraps; edits apply to the focused
/// slot only. All buffers are reset together on round transitions.
#[derive(Debug, Clone)]
pub struct InputBuffer {
    slots: Vec<String>,
    focus: usize,
    item_buffer: String,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self {
            slots: vec![String::new(); SLOT_COUNT],
            focus: 0,
            item_buffer: String::new(),
        }
    }

    /// Applies a key to the focused word slot.
    pub fn apply(&mut self, key: InputKey) -> SlotEdit {
        match key {
            InputKey::Backspace => {
                if self.slots[self.focus].pop().is_some() {
                    SlotEdit::Edited
                } else {
                    SlotEdit::Ignored
                }
            }
            InputKey::Submit => {
                self.next_slot();
                SlotEdit::Submitted
            }
            InputKey::Char(c) => {
                if is_printable(c) && self.slots[self.focus].len() < MAX_WORD_LEN {
                    self.slots[self.focus].push(c);
                    SlotEdit::Edited
                } else {
                    SlotEdit::Ignored
                }
            }
            InputKey::NextSlot => {
                self.next_slot();
                SlotEdit::Edited
            }
            InputKey::PrevSlot => {
                self.prev_slot();
                SlotEdit::Edited
            }
        }
    }

    /// Applies a key to the item buffer.
    ///
    /// The buffer only claims a printable char while empty, and backspace or
    /// submit while non-empty; everything else is `Ignored` so the host can
    /// fall through to the word slots.
    pub fn apply_item(&mut self, key: InputKey) -> ItemEdit {
        match key {
            InputKey::Char(c) => {
                if is_printable(c) && self.item_buffer.len() < MAX_ITEM_LEN {
                    self.item_buffer.push(c);
                    ItemEdit::Edited
                } else {
                    ItemEdit::Ignored
                }
            }
            InputKey::Backspace => {
                if self.item_buffer.pop().is_some() {
                    ItemEdit::Edited
                } else {
                    ItemEdit::Ignored
                }
            }
            InputKey::Submit => match self.item_buffer.chars().next() {
                Some(c) => {
                    self.item_buffer.clear();
                    ItemEdit::Submitted(c)
                }
                None => ItemEdit::Ignored,
            },
            InputKey::NextSlot | InputKey::PrevSlot => ItemEdit::Ignored,
        }
    }

    /// Clears all slots and the item buffer and refocuses slot 0.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
        self.item_buffer.clear();
        self.focus = 0;
    }

    pub fn next_slot(&mut self) {
        if self.focus < SLOT_COUNT - 1 {
            self.focus += 1;
        }
    }

    pub fn prev_slot(&mut self) {
        if self.focus > 0 {
            self.focus -= 1;
        }
    }

    pub fn slot(&self, index: usize) -> &str {
        self.slots.get(index).map_or("", |s| s.as_str())
    }

    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn item_buffer(&self) -> &str {
        &self.item_buffer
    }

    pub fn completed_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_empty()).count()
    }

    pub fn all_filled(&self) -> bool {
        self.slots.iter().all(|s| !s.is_empty())
    }

    /// Case-insensitive comparison between a slot and a target word.
    pub fn matches_target(&self, index: usize, target: &str) -> bool {
        self.slots
            .get(index)
            .is_some_and(|s| !s.is_empty() && s.eq_ignore_ascii_case(target))
    }
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

fn is_printable(c: char) -> bool {
    (' '..='~').contains(&c)
}

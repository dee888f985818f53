use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::dictionary::{Dictionary, Level};
use crate::falling::{ItemBox, ItemEffect, WordBlock};
use crate::input::InputBuffer;

/// One word block is released this often until the sentence is in flight.
pub const WORD_CREATE_INTERVAL: Duration = Duration::from_secs(3);
/// Falling entities descend one step this often.
pub const DESCENT_INTERVAL: Duration = Duration::from_secs(1);
/// A new item box may spawn this often, if none is active.
pub const ITEM_SPAWN_INTERVAL: Duration = Duration::from_secs(30);
/// Celebration window between completing a round and loading the next one.
pub const ROUND_TRANSITION_DELAY: Duration = Duration::from_secs(2);
/// Seconds of time penalty per word block that reaches the floor.
pub const PENALTY_PER_LANDED_SECS: u64 = 10;

const WORD_FALL_SPEED: f64 = 1.0;

/// Where a round sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Blocks are still being released on the spawn cadence.
    Spawning,
    /// Everything is in flight; no further blocks are created.
    AwaitingCompletion,
    /// All words matched; waiting out the transition delay.
    Complete,
}

/// Play field dimensions the falling entities move within.
#[derive(Debug, Clone, Copy)]
pub struct Playfield {
    pub width: u16,
    pub height: u16,
}

impl Default for Playfield {
    fn default() -> Self {
        Self {
            width: 60,
            height: 30,
        }
    }
}

/// Per-round orchestration: spawn order, descent, matching and item boxes.
///
/// Owns the dictionary handle, the input buffers and the session RNG by
/// value; exactly one sentence is active at a time.
#[derive(Debug)]
pub struct RoundState {
    dictionary: Dictionary,
    pub input: InputBuffer,
    rng: StdRng,
    level: Level,
    playfield: Playfield,
    target_words: Vec<String>,
    blocks: Vec<WordBlock>,
    item_boxes: Vec<ItemBox>,
    spawn_order: Vec<usize>,
    released: usize,
    correct_matches: usize,
    phase: RoundPhase,
    completed_at: Option<Instant>,
    last_word_spawn: Option<Instant>,
    last_descent: Option<Instant>,
    last_item_spawn: Instant,
    rounds_completed: u32,
}

impl RoundState {
    pub fn new(level: Level, playfield: Playfield, seed: u64, now: Instant) -> Self {
        let mut state = Self {
            dictionary: Dictionary::new(),
            input: InputBuffer::new(),
            rng: StdRng::seed_from_u64(seed),
            level,
            playfield,
            target_words: Vec::new(),
            blocks: Vec::new(),
            item_boxes: Vec::new(),
            spawn_order: Vec::new(),
            released: 0,
            correct_matches: 0,
            phase: RoundPhase::Spawning,
            completed_at: None,
            last_word_spawn: None,
            last_descent: None,
            last_item_spawn: now,
            rounds_completed: 0,
        };
        state.load_sentence();
        state
    }

    fn load_sentence(&mut self) {
        self.target_words = self
            .dictionary
            .random_sentence_words(self.level, &mut self.rng);
        self.spawn_order = (0..self.target_words.len()).collect();
        self.spawn_order.shuffle(&mut self.rng);
        self.blocks.clear();
        self.released = 0;
        self.correct_matches = 0;
        self.phase = RoundPhase::Spawning;
        self.completed_at = None;
        self.last_word_spawn = None;
        self.input.reset();
    }

    /// Releases the next word block if the spawn cadence is due. The first
    /// block of a round is released immediately.
    pub fn maybe_release_block(&mut self, now: Instant) {
        if self.phase != RoundPhase::Spawning || self.released >= self.target_words.len() {
            return;
        }

        let due = match self.last_word_spawn {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= WORD_CREATE_INTERVAL,
        };
        if !due {
            return;
        }

        let order_index = self.spawn_order[self.released];
        let text = self.target_words[order_index].clone();
        let mut block = WordBlock::new(
            text,
            order_index,
            self.playfield.width,
            WORD_FALL_SPEED,
            &mut self.rng,
        );
        // A word answered before its block is released spawns already
        // matched; it must not fall and charge a penalty for a correct
        // answer. Retraction still restores it through `check_answers`.
        if self.input.matches_target(order_index, &self.target_words[order_index]) {
            block.mark_matched();
        }
        self.blocks.push(block);
        self.released += 1;
        self.last_word_spawn = Some(now);

        if self.released == self.target_words.len() {
            self.phase = RoundPhase::AwaitingCompletion;
        }
    }

    /// Advances all falling entities one descent step when the cadence is
    /// due. Returns how many word blocks landed during this call; the caller
    /// applies the time penalty.
    pub fn advance(&mut self, now: Instant) -> u64 {
        let due = match self.last_descent {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= DESCENT_INTERVAL,
        };
        if !due {
            return 0;
        }
        self.last_descent = Some(now);

        let height = self.playfield.height;
        let mut landed = 0;
        for block in &mut self.blocks {
            if block.fall(height) {
                landed += 1;
            }
        }

        for item in &mut self.item_boxes {
            item.fall(height);
        }
        // Lazy prune of spent boxes; exact timing is unobservable.
        self.item_boxes.retain(|item| item.is_active());

        self.heal_stalled_round();

        landed
    }

    /// A round with zero in-flight blocks must not stall forever: once all
    /// blocks are released and none is still falling, the unmatched ones are
    /// restored to their spawn positions for another pass.
    fn heal_stalled_round(&mut self) {
        if self.phase != RoundPhase::AwaitingCompletion {
            return;
        }
        if self.blocks.iter().any(|b| b.is_falling()) {
            return;
        }
        if self.correct_matches >= self.target_words.len() {
            return;
        }
        for block in &mut self.blocks {
            if !block.is_matched() {
                block.restore();
            }
        }
    }

    /// Recomputes `correct_matches` from the input slots and syncs block
    /// states. Fires the round-completion transition exactly once, even when
    /// the all-released and all-matched triggers coincide.
    pub fn check_answers(&mut self, now: Instant) -> bool {
        // Defensive no-op on slot/word count mismatch.
        if self.input.slots().len() != self.target_words.len() {
            return false;
        }

        self.correct_matches = 0;
        for (i, word) in self.target_words.iter().enumerate() {
            let matched = self.input.matches_target(i, word);
            if matched {
                self.correct_matches += 1;
            }
            if let Some(block) = self.blocks.iter_mut().find(|b| b.order_index == i) {
                if matched && block.is_falling() {
                    block.mark_matched();
                } else if !matched && block.is_matched() {
                    block.restore();
                }
            }
        }

        if self.correct_matches == self.target_words.len() && self.phase != RoundPhase::Complete {
            self.phase = RoundPhase::Complete;
            self.completed_at = Some(now);
            self.rounds_completed += 1;
            return true;
        }
        false
    }

    /// Spawns an item box on the fixed interval, if none is active.
    pub fn spawn_item_box_if_needed(&mut self, now: Instant) -> bool {
        if self.item_boxes.iter().any(|i| i.is_active()) {
            return false;
        }
        if now.saturating_duration_since(self.last_item_spawn) < ITEM_SPAWN_INTERVAL {
            return false;
        }
        self.item_boxes
            .push(ItemBox::new(self.playfield.width, &mut self.rng));
        self.last_item_spawn = now;
        true
    }

    /// Atomically claims the first active item box when the submitted char
    /// matches its token (case-insensitive). A wrong char leaves the box
    /// active and applies nothing.
    pub fn try_redeem_item(&mut self, submitted: char) -> Option<ItemEffect> {
        let item = self.item_boxes.iter_mut().find(|i| i.is_active())?;
        if item.matches_token(submitted) {
            Some(item.claim())
        } else {
            None
        }
    }

    pub fn ready_for_next_round(&self, now: Instant) -> bool {
        match (self.phase, self.completed_at) {
            (RoundPhase::Complete, Some(at)) => {
                now.saturating_duration_since(at) >= ROUND_TRANSITION_DELAY
            }
            _ => false,
        }
    }

    /// Loads a new random sentence and resets all per-round state. Item
    /// boxes in flight are cleared with the blocks.
    pub fn prepare_next_round(&mut self) {
        self.item_boxes.clear();
        self.load_sentence();
    }

    /// Adopts new play field dimensions mid-round; in-flight entities are
    /// pulled back inside the new bounds.
    pub fn resize(&mut self, playfield: Playfield) {
        self.playfield = playfield;
        for block in &mut self.blocks {
            block.clamp_to(playfield.width, playfield.height);
        }
        for item in &mut self.item_boxes {
            item.clamp_to(playfield.width, playfield.height);
        }
    }

    pub fn active_item(&self) -> Option<&ItemBox> {
        self.item_boxes.iter().find(|i| i.is_active())
    }

    pub fn playfield(&self) -> Playfield {
        self.playfield
    }

    pub fn blocks(&self) -> &[WordBlock] {
        &self.blocks
    }

    pub fn target_words(&self) -> &[String] {
        &self.target_words
    }

    pub fn full_sentence(&self) -> String {
        self.dictionary
            .full_sentence(self.dictionary.current_level(), self.dictionary.current_index())
    }

    pub fn correct_matches(&self) -> usize {
        self.correct_matches
    }

    pub fn words_released(&self) -> usize {
        self.released
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn rounds_completed(&self) -> u32 {
        self.rounds_completed
    }
}

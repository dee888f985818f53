use std::time::Instant;

use crate::dictionary::Level;
use crate::input::{InputKey, ItemEdit, SlotEdit};
use crate::round::{Playfield, RoundPhase, RoundState, PENALTY_PER_LANDED_SECS};
use crate::session::{Session, SessionPhase};

/// Startup parameters. A `None` seed means entropy from the OS.
#[derive(Debug, Clone, Copy)]
pub struct GameConfig {
    pub level: Level,
    pub playfield: Playfield,
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            level: Level::Easy,
            playfield: Playfield::default(),
            seed: None,
        }
    }
}

/// Top-level game orchestrator: one session clock, one active round.
///
/// Single-threaded; state only moves when the host calls `on_tick` or
/// `on_key`. All timing decisions compare `Instant`s recorded on those
/// calls, never tick counts.
#[derive(Debug)]
pub struct Game {
    pub session: Session,
    pub round: RoundState,
    config: GameConfig,
}

impl Game {
    pub fn new(config: GameConfig, now: Instant) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self {
            session: Session::start(config.level, now),
            round: RoundState::new(config.level, config.playfield, seed, now),
            config,
        }
    }

    /// Fixed per-tick order: clock, item spawn, round transition, descent,
    /// word release, then landing penalties.
    pub fn on_tick(&mut self, now: Instant) {
        self.session.tick_at(now);
        if !self.session.is_running() {
            return;
        }

        self.round.spawn_item_box_if_needed(now);

        if self.round.ready_for_next_round(now) {
            self.round.prepare_next_round();
        }

        let landed = self.round.advance(now);
        self.round.maybe_release_block(now);

        if landed > 0 {
            let penalty = landed * PENALTY_PER_LANDED_SECS;
            self.session.apply_time_penalty(penalty, now);
            // The penalty notice wins over the item notice it may replace.
            self.session
                .set_notice(format!("Word missed! -{penalty}s"), now);
        }
    }

    /// Routes one engine key. While an item box is falling the single-char
    /// item buffer gets first claim; keys it ignores fall through to the
    /// word slots.
    pub fn on_key(&mut self, key: InputKey, now: Instant) {
        if !self.session.is_running() {
            return;
        }

        if self.round.active_item().is_some() {
            match self.round.input.apply_item(key) {
                ItemEdit::Edited => return,
                ItemEdit::Submitted(c) => {
                    match self.round.try_redeem_item(c) {
                        Some(effect) => self.session.apply_item_effect(effect, now),
                        None => self.session.set_notice("Item failed", now),
                    }
                    return;
                }
                ItemEdit::Ignored => {}
            }
        }

        if self.round.input.apply(key) == SlotEdit::Submitted
            && self.round.check_answers(now)
        {
            let matches = self.round.correct_matches();
            self.session.scoreboard.complete_round(matches);
            self.session.set_notice("Sentence complete!", now);
        }
    }

    /// Adopts a new play field size mid-session, e.g. on a terminal resize.
    pub fn resize(&mut self, playfield: Playfield) {
        self.config.playfield = playfield;
        self.round.resize(playfield);
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    /// In-progress matches count toward the live total; a just-completed
    /// round's matches are already banked.
    fn unbanked_matches(&self) -> usize {
        if self.round.phase() == RoundPhase::Complete {
            0
        } else {
            self.round.correct_matches()
        }
    }

    pub fn total_score(&self) -> i64 {
        self.session.scoreboard.total(self.unbanked_matches())
    }

    /// Read-only render view for the current instant.
    pub fn snapshot(&self, now: Instant) -> Snapshot {
        let blocks = self
            .round
            .blocks()
            .iter()
            .filter(|b| b.is_falling())
            .map(|b| BlockView {
                text: b.text.clone(),
                x: b.descent.x,
                y: b.descent.y,
            })
            .collect();

        let item = self.round.active_item().map(|i| ItemView {
            token: i.token,
            label: i.effect.description(),
            x: i.descent.x,
            y: i.descent.y,
        });

        let unbanked = self.unbanked_matches();
        let board = &self.session.scoreboard;

        Snapshot {
            level: self.session.level(),
            blocks,
            item,
            slots: self.round.input.slots().to_vec(),
            focus: self.round.input.focus(),
            item_buffer: self.round.input.item_buffer().to_string(),
            target_words: self.round.target_words().to_vec(),
            sentence: self.round.full_sentence(),
            remaining_secs: self.session.remaining_secs(),
            clock: self.session.formatted_time(),
            score: ScoreSummary {
                target: board.target_score(),
                words: board.word_score(unbanked),
                time_bonus: board.time_bonus(),
                level_bonus: board.level_bonus(),
                multiplier: board.multiplier(),
                total: board.total(unbanked),
            },
            matches: self.round.correct_matches(),
            words_released: self.round.words_released(),
            rounds_completed: self.round.rounds_completed(),
            celebrating: self.round.phase() == RoundPhase::Complete,
            time_up: self.session.is_time_up(),
            finished: self.session.phase() == SessionPhase::Finished,
            notice: self.session.notice(now).map(str::to_owned),
        }
    }
}

/// One falling word as the renderer sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockView {
    pub text: String,
    pub x: u16,
    pub y: u16,
}

/// The active item box as the renderer sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemView {
    pub token: char,
    pub label: &'static str,
    pub x: u16,
    pub y: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreSummary {
    pub target: i64,
    pub words: i64,
    pub time_bonus: i64,
    pub level_bonus: i64,
    pub multiplier: i64,
    pub total: i64,
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub level: Level,
    pub blocks: Vec<BlockView>,
    pub item: Option<ItemView>,
    pub slots: Vec<String>,
    pub focus: usize,
    pub item_buffer: String,
    pub target_words: Vec<String>,
    pub sentence: String,
    pub remaining_secs: u64,
    pub clock: String,
    pub score: ScoreSummary,
    pub matches: usize,
    pub words_released: usize,
    pub rounds_completed: u32,
    pub celebrating: bool,
    pub time_up: bool,
    pub finished: bool,
    pub notice: Option<String>,
}

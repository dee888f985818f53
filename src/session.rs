use std::time::{Duration, Instant};

use crate::dictionary::Level;
use crate::falling::ItemEffect;

/// Points awarded per completed sentence.
pub const TARGET_POINTS: i64 = 500;
/// Points per correctly matched word.
pub const WORD_POINTS: i64 = 100;
/// Remaining seconds are worth this many points at the end of the session.
pub const TIME_BONUS_MULTIPLIER: i64 = 10;
/// Flat bonus per difficulty level.
pub const LEVEL_BONUS_BASE: i64 = 1000;
/// Seconds added or removed by a time item.
pub const ITEM_TIME_DELTA_SECS: i64 = 10;
/// How long an effect/notice message stays visible.
pub const NOTICE_DURATION: Duration = Duration::from_secs(3);

/// Session lifecycle. `TimeUp` and `Finished` are terminal: gameplay
/// mutations become no-ops, read access for the final score remains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Running,
    TimeUp,
    Finished,
}

/// Score components, accumulated monotonically across rounds.
///
/// Total formula: `target * multiplier + words + time bonus + level bonus`.
/// The multiplier (a flat x2 from the score item, non-stacking) applies to
/// the target term only.
#[derive(Debug, Clone)]
pub struct Scoreboard {
    target_score: i64,
    banked_word_score: i64,
    time_bonus: i64,
    level_bonus: i64,
    multiplier: i64,
}

impl Scoreboard {
    pub fn new(level: Level) -> Self {
        Self {
            target_score: 0,
            banked_word_score: 0,
            time_bonus: 0,
            level_bonus: level.number() as i64 * LEVEL_BONUS_BASE,
            multiplier: 1,
        }
    }

    /// Banks a completed round: the target award plus the word points for
    /// every matched word.
    pub fn complete_round(&mut self, matched_words: usize) {
        self.target_score += TARGET_POINTS;
        self.banked_word_score += matched_words as i64 * WORD_POINTS;
    }

    pub fn set_multiplier(&mut self, multiplier: i64) {
        self.multiplier = multiplier;
    }

    pub fn target_score(&self) -> i64 {
        self.target_score
    }

    pub fn time_bonus(&self) -> i64 {
        self.time_bonus
    }

    pub fn level_bonus(&self) -> i64 {
        self.level_bonus
    }

    pub fn multiplier(&self) -> i64 {
        self.multiplier
    }

    /// Word score including the in-progress round's current matches.
    pub fn word_score(&self, current_round_matches: usize) -> i64 {
        self.banked_word_score + current_round_matches as i64 * WORD_POINTS
    }

    pub fn total(&self, current_round_matches: usize) -> i64 {
        self.target_score * self.multiplier
            + self.word_score(current_round_matches)
            + self.time_bonus
            + self.level_bonus
    }
}

/// Wall-clock countdown plus the scoreboard.
///
/// `remaining = time_limit - elapsed - penalties + item adjustment`, clamped
/// at zero. Timing always compares explicit `Instant`s so the clock stays
/// correct under irregular tick intervals.
#[derive(Debug, Clone)]
pub struct Session {
    level: Level,
    time_limit_secs: i64,
    started_at: Instant,
    penalty_secs: i64,
    adjust_secs: i64,
    remaining_secs: i64,
    phase: SessionPhase,
    pub scoreboard: Scoreboard,
    notice: Option<(String, Instant)>,
}

impl Session {
    pub fn start(level: Level, now: Instant) -> Self {
        let limit = level.time_limit_secs() as i64;
        Self {
            level,
            time_limit_secs: limit,
            started_at: now,
            penalty_secs: 0,
            adjust_secs: 0,
            remaining_secs: limit,
            phase: SessionPhase::Running,
            scoreboard: Scoreboard::new(level),
            notice: None,
        }
    }

    /// Recomputes remaining time and applies the terminal transition.
    pub fn tick_at(&mut self, now: Instant) {
        if self.phase != SessionPhase::Running {
            return;
        }
        // saturating_duration_since clamps a now before started_at to zero.
        let elapsed = now.saturating_duration_since(self.started_at).as_secs() as i64;
        let remaining = self.time_limit_secs - elapsed - self.penalty_secs + self.adjust_secs;
        self.remaining_secs = remaining.max(0);
        if self.remaining_secs == 0 {
            self.phase = SessionPhase::TimeUp;
        }
    }

    /// Only effective while running; re-evaluates time-up immediately.
    pub fn apply_time_penalty(&mut self, secs: u64, now: Instant) {
        if self.phase != SessionPhase::Running {
            return;
        }
        self.penalty_secs += secs as i64;
        self.tick_at(now);
    }

    pub fn apply_item_effect(&mut self, effect: ItemEffect, now: Instant) {
        if self.phase != SessionPhase::Running {
            return;
        }
        match effect {
            ItemEffect::AddTime => {
                self.adjust_secs += ITEM_TIME_DELTA_SECS;
                self.set_notice("Item: +10s", now);
            }
            ItemEffect::SubtractTime => {
                self.adjust_secs -= ITEM_TIME_DELTA_SECS;
                self.set_notice("Item: -10s", now);
            }
            ItemEffect::DoubleScore => {
                self.scoreboard.set_multiplier(2);
                self.set_notice("Item: Score x2", now);
            }
        }
        self.tick_at(now);
    }

    pub fn set_notice(&mut self, text: impl Into<String>, now: Instant) {
        self.notice = Some((text.into(), now));
    }

    /// The current notice, if still within its display window.
    pub fn notice(&self, now: Instant) -> Option<&str> {
        self.notice.as_ref().and_then(|(text, at)| {
            if now.saturating_duration_since(*at) < NOTICE_DURATION {
                Some(text.as_str())
            } else {
                None
            }
        })
    }

    /// Finalizes the time bonus and freezes the session for read-only
    /// result reporting.
    pub fn end_game(&mut self, now: Instant) {
        if self.phase == SessionPhase::Running {
            self.tick_at(now);
        }
        if self.remaining_secs > 0 {
            self.scoreboard.time_bonus = self.remaining_secs * TIME_BONUS_MULTIPLIER;
        }
        if self.phase == SessionPhase::Running {
            self.phase = SessionPhase::Finished;
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    pub fn is_time_up(&self) -> bool {
        self.phase == SessionPhase::TimeUp
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs.max(0) as u64
    }

    pub fn formatted_time(&self) -> String {
        crate::util::format_clock(self.remaining_secs())
    }
}

use rand::Rng;
use unicode_width::UnicodeWidthStr;

/// Row where falling entities spawn, just below the header.
pub const SPAWN_ROW: u16 = 3;
/// Rows reserved at the bottom of the play field; entities land above them.
pub const FLOOR_MARGIN: u16 = 3;

/// Lifecycle of a falling entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallState {
    Falling,
    /// Reached the floor; a failure event for word blocks.
    Landed,
    /// Entered correctly by the player (word blocks).
    Matched,
    /// Claimed by the player (item boxes).
    Collected,
    /// Deactivated without consequence (item boxes hitting the floor).
    Idle,
}

/// What happens when an entity reaches the floor.
///
/// Word blocks penalize the player; item boxes dissolve silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnLand {
    Penalize,
    Dissolve,
}

/// Shared descent state for word blocks and item boxes.
#[derive(Debug, Clone)]
pub struct Descent {
    pub x: u16,
    pub y: u16,
    initial_x: u16,
    speed: f64,
    pub state: FallState,
}

impl Descent {
    pub fn new(x: u16, speed: f64) -> Self {
        Self {
            x,
            y: SPAWN_ROW,
            initial_x: x,
            speed,
            state: FallState::Falling,
        }
    }

    /// One descent tick: `y += floor(speed)`, landing at the floor row.
    /// Returns true only on the tick the entity lands with a penalty.
    pub fn advance(&mut self, field_height: u16, on_land: OnLand) -> bool {
        if self.state != FallState::Falling {
            return false;
        }

        let floor = field_height.saturating_sub(FLOOR_MARGIN);
        self.y = self.y.saturating_add(self.speed as u16);

        if self.y >= floor {
            self.y = floor;
            match on_land {
                OnLand::Penalize => {
                    self.state = FallState::Landed;
                    return true;
                }
                OnLand::Dissolve => {
                    self.state = FallState::Idle;
                }
            }
        }
        false
    }

    /// Pulls the entity back inside a resized field. A shrink never lands
    /// it on its own: the lowest row it can be left on is above the floor.
    pub fn clamp_to(&mut self, max_x: u16, field_height: u16) {
        self.x = self.x.min(max_x);
        self.initial_x = self.initial_x.min(max_x);
        let lowest = field_height
            .saturating_sub(FLOOR_MARGIN + 1)
            .max(SPAWN_ROW);
        self.y = self.y.min(lowest);
    }

    /// Restores the spawn position and clears terminal-state flags.
    pub fn reset(&mut self) {
        self.x = self.initial_x;
        self.y = SPAWN_ROW;
        self.state = FallState::Falling;
    }

    pub fn is_falling(&self) -> bool {
        self.state == FallState::Falling
    }
}

/// One word of the active sentence, in flight.
#[derive(Debug, Clone)]
pub struct WordBlock {
    pub text: String,
    pub order_index: usize,
    pub descent: Descent,
}

impl WordBlock {
    /// Spawns at a random x that keeps the whole word inside the field.
    pub fn new(
        text: String,
        order_index: usize,
        field_width: u16,
        speed: f64,
        rng: &mut impl Rng,
    ) -> Self {
        let width = text.width() as u16;
        let max_x = field_width.saturating_sub(width + 2).max(2);
        let x = rng.gen_range(1..max_x);
        Self {
            text,
            order_index,
            descent: Descent::new(x, speed),
        }
    }

    /// Descent tick; true when the block lands this tick (penalty event).
    pub fn fall(&mut self, field_height: u16) -> bool {
        self.descent.advance(field_height, OnLand::Penalize)
    }

    pub fn mark_matched(&mut self) {
        self.descent.state = FallState::Matched;
    }

    /// Used when a match is retracted: the block returns to the top.
    pub fn restore(&mut self) {
        self.descent.reset();
    }

    /// Keeps the whole word inside a resized field.
    pub fn clamp_to(&mut self, field_width: u16, field_height: u16) {
        let width = self.text.width() as u16;
        let max_x = field_width.saturating_sub(width + 2).max(1);
        self.descent.clamp_to(max_x, field_height);
    }

    pub fn is_falling(&self) -> bool {
        self.descent.is_falling()
    }

    pub fn is_matched(&self) -> bool {
        self.descent.state == FallState::Matched
    }
}

/// Effect granted by redeeming an item box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemEffect {
    AddTime,
    SubtractTime,
    DoubleScore,
}

impl ItemEffect {
    pub fn description(self) -> &'static str {
        match self {
            ItemEffect::AddTime => "Time +10 sec",
            ItemEffect::SubtractTime => "Time -10 sec",
            ItemEffect::DoubleScore => "Score x2",
        }
    }
}

/// A transient falling pickup, redeemed by typing its token char.
#[derive(Debug, Clone)]
pub struct ItemBox {
    pub effect: ItemEffect,
    pub token: char,
    pub descent: Descent,
}

impl ItemBox {
    pub fn new(field_width: u16, rng: &mut impl Rng) -> Self {
        let effect = match rng.gen_range(0..3) {
            0 => ItemEffect::AddTime,
            1 => ItemEffect::SubtractTime,
            _ => ItemEffect::DoubleScore,
        };
        let token = rng.gen_range(b'a'..=b'z') as char;
        let max_x = field_width.saturating_sub(4).max(2);
        let x = rng.gen_range(1..max_x);
        Self {
            effect,
            token,
            descent: Descent::new(x, 0.8),
        }
    }

    /// Descent tick; landing dissolves the box silently, never a penalty.
    pub fn fall(&mut self, field_height: u16) {
        self.descent.advance(field_height, OnLand::Dissolve);
    }

    /// Keeps the rendered `[t]` marker inside a resized field.
    pub fn clamp_to(&mut self, field_width: u16, field_height: u16) {
        let max_x = field_width.saturating_sub(4).max(1);
        self.descent.clamp_to(max_x, field_height);
    }

    /// Atomically claims the box and yields its effect.
    pub fn claim(&mut self) -> ItemEffect {
        self.descent.state = FallState::Collected;
        self.effect
    }

    pub fn is_active(&self) -> bool {
        self.descent.is_falling()
    }

    pub fn matches_token(&self, c: char) -> bool {
        self.token.eq_ignore_ascii_case(&c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    #[test]
    fn test_descent_advances_by_floored_speed() {
        let mut d = Descent::new(5, 1.0);
        assert_eq!(d.y, SPAWN_ROW);
        d.advance(50, OnLand::Penalize);
        assert_eq!(d.y, SPAWN_ROW + 1);

        // Sub-integer speed floors to zero movement per tick.
        let mut slow = Descent::new(5, 0.8);
        slow.advance(50, OnLand::Penalize);
        assert_eq!(slow.y, SPAWN_ROW);
    }

    #[test]
    fn test_word_block_lands_exactly_once() {
        let mut block = WordBlock::new("village".into(), 0, 60, 1.0, &mut rng());
        let height = 12;
        let mut landings = 0;
        for _ in 0..30 {
            if block.fall(height) {
                landings += 1;
            }
        }
        assert_eq!(landings, 1);
        assert_eq!(block.descent.state, FallState::Landed);
        assert_eq!(block.descent.y, height - FLOOR_MARGIN);
    }

    #[test]
    fn test_item_box_lands_silently() {
        let mut item = ItemBox::new(60, &mut rng());
        item.descent.speed = 2.0;
        for _ in 0..30 {
            item.fall(12);
        }
        assert_eq!(item.descent.state, FallState::Idle);
        assert!(!item.is_active());
    }

    #[test]
    fn test_reset_restores_spawn_state() {
        let mut block = WordBlock::new("path".into(), 3, 60, 1.0, &mut rng());
        let spawn_x = block.descent.x;
        while !block.fall(12) {}
        block.restore();
        assert_eq!(block.descent.x, spawn_x);
        assert_eq!(block.descent.y, SPAWN_ROW);
        assert!(block.is_falling());
    }

    #[test]
    fn test_matched_block_stops_falling() {
        let mut block = WordBlock::new("quiet".into(), 1, 60, 1.0, &mut rng());
        block.mark_matched();
        let y = block.descent.y;
        assert!(!block.fall(12));
        assert_eq!(block.descent.y, y);
        assert!(block.is_matched());
    }

    #[test]
    fn test_clamp_pulls_block_inside_a_smaller_field() {
        let mut block = WordBlock::new("riverside".into(), 0, 60, 1.0, &mut rng());
        block.descent.x = 50;
        block.descent.y = 25;
        block.clamp_to(20, 12);
        assert!(block.descent.x + block.text.len() as u16 <= 20);
        // The shrink leaves the block above the floor, still falling.
        assert!(block.descent.y < 12 - FLOOR_MARGIN);
        assert!(block.is_falling());
    }

    #[test]
    fn test_word_block_spawns_inside_field() {
        let mut r = rng();
        for _ in 0..100 {
            let block = WordBlock::new("riverside".into(), 0, 40, 1.0, &mut r);
            assert!(block.descent.x >= 1);
            assert!((block.descent.x + block.text.len() as u16) < 40);
        }
    }

    #[test]
    fn test_item_token_matches_case_insensitively() {
        let mut item = ItemBox::new(60, &mut rng());
        item.token = 'k';
        assert!(item.matches_token('k'));
        assert!(item.matches_token('K'));
        assert!(!item.matches_token('j'));
    }

    #[test]
    fn test_claim_deactivates_and_returns_effect() {
        let mut item = ItemBox::new(60, &mut rng());
        item.effect = ItemEffect::DoubleScore;
        assert!(item.is_active());
        assert_eq!(item.claim(), ItemEffect::DoubleScore);
        assert!(!item.is_active());
        assert_eq!(item.descent.state, FallState::Collected);
    }

    #[test]
    fn test_effect_descriptions() {
        assert_eq!(ItemEffect::AddTime.description(), "Time +10 sec");
        assert_eq!(ItemEffect::SubtractTime.description(), "Time -10 sec");
        assert_eq!(ItemEffect::DoubleScore.description(), "Score x2");
    }
}

// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod dictionary;
pub mod engine;
pub mod falling;
pub mod input;
pub mod round;
pub mod runtime;
pub mod session;
pub mod ui;
pub mod util;

/// Host tick interval in milliseconds.
pub const TICK_RATE_MS: u64 = 100;

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Terminal happenings the game loop reacts to. `Tick` is synthesized by
/// the runner whenever no real event arrives within one tick interval.
#[derive(Clone, Debug)]
pub enum GameEvent {
    Key(KeyEvent),
    /// New terminal dimensions; the host rebuilds the play field from them.
    Resize(u16, u16),
    Tick,
}

/// Where the runner pulls events from. Production reads crossterm; tests
/// feed a channel.
pub trait GameEventSource: Send + 'static {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError>;
}

/// Tick cadence for the runner.
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Event source backed by a blocking crossterm reader thread.
pub struct CrosstermEventSource {
    rx: Receiver<GameEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || Self::pump(tx));
        Self { rx }
    }

    /// Forwards key and resize events until the receiving side goes away
    /// or the terminal read fails.
    fn pump(tx: Sender<GameEvent>) {
        loop {
            let forwarded = match event::read() {
                Ok(CtEvent::Key(key)) => tx.send(GameEvent::Key(key)),
                Ok(CtEvent::Resize(w, h)) => tx.send(GameEvent::Resize(w, h)),
                Ok(_) => Ok(()),
                Err(_) => break,
            };
            if forwarded.is_err() {
                break;
            }
        }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GameEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Channel-fed source for driving the runner without a terminal.
pub struct TestEventSource {
    rx: Receiver<GameEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<GameEvent>) -> Self {
        Self { rx }
    }
}

impl GameEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Pulls one event per call, degrading to `Tick` when the source times out
/// or hangs up, so the game keeps advancing without input.
pub struct Runner<E: GameEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: GameEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    pub fn step(&self) -> GameEvent {
        self.event_source
            .recv_timeout(self.ticker.interval())
            .unwrap_or(GameEvent::Tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::sync::mpsc;

    fn runner_with(rx: mpsc::Receiver<GameEvent>) -> Runner<TestEventSource, FixedTicker> {
        Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(2)),
        )
    }

    #[test]
    fn idle_source_degrades_to_ticks() {
        let (_tx, rx) = mpsc::channel();
        let runner = runner_with(rx);
        for _ in 0..3 {
            assert!(matches!(runner.step(), GameEvent::Tick));
        }
    }

    #[test]
    fn queued_events_come_out_in_order_with_payloads() {
        let (tx, rx) = mpsc::channel();
        tx.send(GameEvent::Key(KeyEvent::new(
            KeyCode::Char('a'),
            KeyModifiers::NONE,
        )))
        .unwrap();
        tx.send(GameEvent::Resize(100, 30)).unwrap();
        let runner = runner_with(rx);

        match runner.step() {
            GameEvent::Key(key) => assert_eq!(key.code, KeyCode::Char('a')),
            other => panic!("expected key, got {other:?}"),
        }
        match runner.step() {
            GameEvent::Resize(w, h) => assert_eq!((w, h), (100, 30)),
            other => panic!("expected resize, got {other:?}"),
        }
    }

    #[test]
    fn hung_up_source_keeps_ticking() {
        let (tx, rx) = mpsc::channel::<GameEvent>();
        drop(tx);
        let runner = runner_with(rx);
        assert!(matches!(runner.step(), GameEvent::Tick));
        assert!(matches!(runner.step(), GameEvent::Tick));
    }
}

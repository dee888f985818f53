use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    time::{Duration, Instant},
};

use snowfall::{
    dictionary::Level,
    engine::{Game, GameConfig},
    input::InputKey,
    round::Playfield,
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, GameEventSource, Runner, Ticker},
    TICK_RATE_MS,
};

/// falling-words typing game for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Words from a sentence fall across the play field; type each one into its numbered slot before it lands. Landed words cost time, item boxes bend the clock or the score."
)]
struct Cli {
    /// difficulty level (1-3); higher levels get less time
    #[clap(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=3))]
    level: u8,

    /// RNG seed for a reproducible run
    #[clap(short, long)]
    seed: Option<u64>,
}

impl Cli {
    fn to_game_config(&self, playfield: Playfield) -> GameConfig {
        GameConfig {
            level: Level::from_number(self.level),
            playfield,
            seed: self.seed,
        }
    }
}

#[derive(Debug)]
enum ExitType {
    Restart,
    Quit,
}

/// Maps a raw terminal key onto an engine key. Keys the engine does not
/// understand map to `None` and are dropped.
fn map_key(key: KeyEvent) -> Option<InputKey> {
    match key.code {
        KeyCode::Char(c) => Some(InputKey::Char(c)),
        KeyCode::Backspace => Some(InputKey::Backspace),
        KeyCode::Enter => Some(InputKey::Submit),
        KeyCode::Tab | KeyCode::Down => Some(InputKey::NextSlot),
        KeyCode::Up | KeyCode::BackTab => Some(InputKey::PrevSlot),
        _ => None,
    }
}

fn is_quit_key(key: KeyEvent) -> bool {
    key.code == KeyCode::Esc
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

fn playfield_for(width: u16, height: u16) -> Playfield {
    let defaults = Playfield::default();
    Playfield {
        // Matches the renderer's layout: side panel and slot rows come out
        // of the terminal size, with a floor under tiny terminals.
        width: width.saturating_sub(28).max(defaults.width.min(30)),
        height: height.saturating_sub(6).max(12),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = CrosstermEventSource::new();
    let ticker = FixedTicker::new(Duration::from_millis(TICK_RATE_MS));
    let runner = Runner::new(events, ticker);
    let result = start_tui(&mut terminal, &runner, &cli);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: GameEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    runner: &Runner<E, T>,
    cli: &Cli,
) -> Result<(), Box<dyn Error>> {
    loop {
        let size = terminal.size()?;
        let config = cli.to_game_config(playfield_for(size.width, size.height));
        let mut game = Game::new(config, Instant::now());

        let exit_type = run_session(terminal, runner, &mut game)?;
        match exit_type {
            ExitType::Restart => continue,
            ExitType::Quit => break,
        }
    }

    Ok(())
}

fn run_session<B: Backend, E: GameEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    runner: &Runner<E, T>,
    game: &mut Game,
) -> Result<ExitType, Box<dyn Error>> {
    let snapshot = game.snapshot(Instant::now());
    terminal.draw(|f| f.render_widget(&snapshot, f.area()))?;

    loop {
        match runner.step() {
            GameEvent::Tick => {
                game.on_tick(Instant::now());
            }
            GameEvent::Resize(width, height) => {
                game.resize(playfield_for(width, height));
            }
            GameEvent::Key(key) => {
                let now = Instant::now();
                if game.session.is_running() {
                    if is_quit_key(key) {
                        // Ending early still banks the time bonus; the final
                        // score screen handles the actual quit.
                        game.session.end_game(now);
                    } else if let Some(mapped) = map_key(key) {
                        game.on_key(mapped, now);
                    }
                } else {
                    // Game-over screen keys.
                    match key.code {
                        KeyCode::Char('r') => return Ok(ExitType::Restart),
                        KeyCode::Char('q') | KeyCode::Esc => return Ok(ExitType::Quit),
                        _ => {}
                    }
                    if is_quit_key(key) {
                        return Ok(ExitType::Quit);
                    }
                }
            }
        }

        let snapshot = game.snapshot(Instant::now());
        terminal.draw(|f| f.render_widget(&snapshot, f.area()))?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["snowfall"]);
        assert_eq!(cli.level, 1);
        assert_eq!(cli.seed, None);
    }

    #[test]
    fn test_cli_level_flag() {
        let cli = Cli::parse_from(["snowfall", "-l", "3"]);
        assert_eq!(cli.level, 3);

        let cli = Cli::parse_from(["snowfall", "--level", "2"]);
        assert_eq!(cli.level, 2);
    }

    #[test]
    fn test_cli_rejects_out_of_range_level() {
        assert!(Cli::try_parse_from(["snowfall", "--level", "0"]).is_err());
        assert!(Cli::try_parse_from(["snowfall", "--level", "4"]).is_err());
    }

    #[test]
    fn test_cli_seed_flag() {
        let cli = Cli::parse_from(["snowfall", "--seed", "42"]);
        assert_eq!(cli.seed, Some(42));
    }

    #[test]
    fn test_cli_to_game_config() {
        let cli = Cli::parse_from(["snowfall", "--level", "2", "--seed", "7"]);
        let config = cli.to_game_config(Playfield::default());
        assert_eq!(config.level, Level::Medium);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_map_key_typing_keys() {
        let key = |code| KeyEvent::new(code, KeyModifiers::NONE);
        assert_eq!(map_key(key(KeyCode::Char('a'))), Some(InputKey::Char('a')));
        assert_eq!(map_key(key(KeyCode::Backspace)), Some(InputKey::Backspace));
        assert_eq!(map_key(key(KeyCode::Enter)), Some(InputKey::Submit));
        assert_eq!(map_key(key(KeyCode::Tab)), Some(InputKey::NextSlot));
        assert_eq!(map_key(key(KeyCode::Down)), Some(InputKey::NextSlot));
        assert_eq!(map_key(key(KeyCode::Up)), Some(InputKey::PrevSlot));
        assert_eq!(map_key(key(KeyCode::F(1))), None);
    }

    #[test]
    fn test_quit_keys() {
        assert!(is_quit_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_quit_key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        )));
        assert!(!is_quit_key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::NONE
        )));
    }

    #[test]
    fn test_playfield_tracks_terminal_size() {
        let field = playfield_for(120, 40);
        assert_eq!(field.width, 92);
        assert_eq!(field.height, 34);

        // Tiny terminals get a usable floor instead of a zero field.
        let tiny = playfield_for(10, 5);
        assert!(tiny.width >= 30);
        assert!(tiny.height >= 12);
    }

    fn test_game() -> Game {
        let config = GameConfig {
            level: Level::Easy,
            playfield: Playfield::default(),
            seed: Some(1),
        };
        Game::new(config, Instant::now())
    }

    fn test_runner(
        events: Vec<GameEvent>,
    ) -> Runner<snowfall::runtime::TestEventSource, FixedTicker> {
        use std::sync::mpsc;
        let (tx, rx) = mpsc::channel();
        for event in events {
            tx.send(event).unwrap();
        }
        Runner::new(
            snowfall::runtime::TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
        )
    }

    fn key(code: KeyCode) -> GameEvent {
        GameEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_esc_mid_session_banks_the_time_bonus_before_quitting() {
        use ratatui::backend::TestBackend;

        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();

        // Esc ends the session and lands on the final score screen;
        // only the second key actually quits.
        let runner = test_runner(vec![
            GameEvent::Tick,
            key(KeyCode::Char('a')),
            key(KeyCode::Esc),
            key(KeyCode::Char('q')),
        ]);
        let mut game = test_game();
        let exit = run_session(&mut terminal, &runner, &mut game).unwrap();
        assert!(matches!(exit, ExitType::Quit));

        // The typed char reached the game before the session ended.
        assert_eq!(game.round.input.slot(0), "a");

        let snap = game.snapshot(Instant::now());
        assert!(snap.finished);
        assert!(!snap.time_up);
        assert!(snap.score.time_bonus > 0);
        assert_eq!(snap.score.total, snap.score.time_bonus + snap.score.level_bonus);
    }

    #[test]
    fn test_restart_from_the_final_score_screen() {
        use ratatui::backend::TestBackend;

        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();

        let runner = test_runner(vec![key(KeyCode::Esc), key(KeyCode::Char('r'))]);
        let mut game = test_game();
        let exit = run_session(&mut terminal, &runner, &mut game).unwrap();
        assert!(matches!(exit, ExitType::Restart));
    }

    #[test]
    fn test_resize_event_rebuilds_the_playfield() {
        use ratatui::backend::TestBackend;

        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();

        let runner = test_runner(vec![
            GameEvent::Resize(120, 40),
            key(KeyCode::Esc),
            key(KeyCode::Char('q')),
        ]);
        let mut game = test_game();
        run_session(&mut terminal, &runner, &mut game).unwrap();

        let expected = playfield_for(120, 40);
        assert_eq!(game.round.playfield().width, expected.width);
        assert_eq!(game.round.playfield().height, expected.height);
    }
}

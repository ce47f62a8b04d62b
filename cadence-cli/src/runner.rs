use std::{io, time::Duration};

use cadence_lib::{EngineConfig, EngineOptions, MockBackend};
use clap::ArgMatches;
use crossterm::{
    cursor,
    event::{DisableFocusChange, EnableFocusChange},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::{board::Soundboard, cli, controls, error::CliError, logging, ui};

const FRAME: Duration = Duration::from_millis(16);

/// Dispatch the parsed command line. Returns the process exit code.
pub fn run(args: &ArgMatches, log_buffer: logging::LogBuffer) -> Result<i32, CliError> {
    match args.subcommand() {
        Some(("play", sub)) => run_play(sub, log_buffer),
        Some(("check", sub)) => {
            let path = sub
                .get_one::<String>("CONFIG")
                .map(String::as_str)
                .unwrap_or_default();
            cli::check::run_check(path, !sub.get_flag("skip-files"))
        }
        Some(("simulate", sub)) => cli::simulate::run_simulate(sub),
        Some(("create", sub)) => run_create(sub),
        _ => Ok(-1),
    }
}

fn run_create(args: &ArgMatches) -> Result<i32, CliError> {
    match args.subcommand() {
        Some(("config-json", _)) => {
            println!("{}", EngineConfig::template().to_json_pretty()?);
            Ok(0)
        }
        _ => Ok(-1),
    }
}

fn run_play(args: &ArgMatches, log_buffer: logging::LogBuffer) -> Result<i32, CliError> {
    let path = args
        .get_one::<String>("CONFIG")
        .map(String::as_str)
        .unwrap_or_default();
    let config = EngineConfig::from_path(path)?;
    info!("Starting cadence soundboard with {}", path);

    let volume = args
        .get_one::<f32>("gain")
        .map(|gain| gain / 100.0)
        .unwrap_or(config.volume);
    let transition_ms = args
        .get_one::<f64>("transition-ms")
        .copied()
        .unwrap_or(config.transition_duration_ms);
    let mut options = EngineOptions {
        require_consent: config.require_consent,
        volume,
        debug: args.get_flag("debug"),
        seed: None,
    };
    if let Some(seed) = args.get_one::<u64>("seed") {
        options = options.with_seed(*seed);
    }

    // Native output chatter goes to the log panel while the TUI owns the terminal.
    let _stderr_guard = if logging::echoes_stderr() {
        None
    } else {
        logging::capture_stderr(log_buffer.clone())
    };

    let mut board = if args.get_flag("headless") {
        Soundboard::new(&config, MockBackend::new(), options, transition_ms)?
    } else {
        open_device_board(&config, options, transition_ms)?
    };

    let _raw_mode = RawModeGuard::enable().ok();
    let mut stdout = io::stdout();
    let _ = execute!(stdout, EnterAlternateScreen, EnableFocusChange, cursor::Hide);
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout)).ok();

    loop {
        board.frame();
        if let Some(term) = terminal.as_mut() {
            let status = controls::status_text(&board.status(), board.sound_ids());
            let log_lines = logging::snapshot(&log_buffer);
            ui::draw_status(term, &status, &log_lines);
        }
        if !controls::handle_input(&mut board, FRAME) {
            break;
        }
    }

    board.dispose();

    if let Some(mut term) = terminal {
        let _ = term.show_cursor();
        let stdout = term.backend_mut();
        let _ = execute!(stdout, DisableFocusChange, LeaveAlternateScreen, cursor::Show);
    }

    Ok(0)
}

#[cfg(feature = "rodio-backend")]
fn open_device_board(
    config: &EngineConfig,
    options: EngineOptions,
    transition_ms: f64,
) -> Result<Soundboard, CliError> {
    let backend = cadence_lib::backend::RodioBackend::open_default()?;
    Ok(Soundboard::new(config, backend, options, transition_ms)?)
}

#[cfg(not(feature = "rodio-backend"))]
fn open_device_board(
    config: &EngineConfig,
    options: EngineOptions,
    transition_ms: f64,
) -> Result<Soundboard, CliError> {
    log::warn!("built without rodio-backend; falling back to the mock backend");
    Ok(Soundboard::new(config, MockBackend::new(), options, transition_ms)?)
}

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

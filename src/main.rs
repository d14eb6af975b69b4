mod app;
mod cli;
mod client;
mod client_list;
mod commands;
mod config;
mod copy_mode;
mod error;
mod event_loop;
mod fifo;
mod input;
mod layout;
mod rendering;
mod signal_plane;
mod statusbar;
mod style;
mod util;

use std::env;
use std::io;

use crossterm::cursor::{DisableBlinking, EnableBlinking};
use crossterm::event::{DisableMouseCapture, EnableBracketedPaste, DisableBracketedPaste, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::app::App;
use crate::cli::ParseOutcome;
use crate::config::Config;
use crate::event_loop::EventLoop;
use crate::signal_plane::SignalPlane;

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    let args: Vec<String> = env::args().skip(1).collect();
    let parsed = match cli::parse(&args) {
        ParseOutcome::Help => {
            cli::print_help();
            return 0;
        }
        ParseOutcome::Version => {
            cli::print_version();
            return 0;
        }
        ParseOutcome::Error(msg) => {
            eprintln!("tilemux: {msg}");
            return 1;
        }
        ParseOutcome::Run(args) => args,
    };

    let mut config = Config::new();
    if parsed.toggle_mouse {
        config.mouse_enabled_default = !config.mouse_enabled_default;
    }
    if let Some(modifier) = parsed.modifier {
        config.set_modifier(modifier);
    }
    if let Some(ms) = parsed.escape_delay_ms {
        config.escape_delay_ms = ms;
    }
    if let Some(n) = parsed.scrollback {
        config.scrollback = n;
    }
    config.title = parsed.title.clone();
    config.status_fifo = parsed.status_fifo.clone();
    config.cmd_fifo = parsed.cmd_fifo.clone();

    let status_file = match config.status_fifo.as_deref().map(fifo::open_or_create) {
        Some(Ok(f)) => Some(f),
        Some(Err(e)) => {
            eprintln!("tilemux: status fifo: {e}");
            return 1;
        }
        None => None,
    };
    let cmd_file = match config.cmd_fifo.as_deref().map(fifo::open_or_create) {
        Some(Ok(f)) => Some(f),
        Some(Err(e)) => {
            eprintln!("tilemux: cmd fifo: {e}");
            return 1;
        }
        None => None,
    };
    if let Some(path) = &config.cmd_fifo {
        if let Ok(abs) = std::fs::canonicalize(path) {
            env::set_var("DVTM_CMD_FIFO", abs);
        }
    }
    env::set_var("DVTM", cli::VERSION);

    let own_exe_name = cli::program_name();
    let shell = util::resolve_shell(&own_exe_name);

    let (cols, rows) = match crossterm::terminal::size() {
        Ok((c, r)) => (c, r),
        Err(_) => (80, 24),
    };

    let mut app = App::new(config, shell, own_exe_name, rows, cols, status_file, cmd_file);

    let startup_cmds = parsed.commands.clone();
    if startup_cmds.is_empty() {
        if let Err(e) = app.create_client(None, None) {
            eprintln!("tilemux: spawn failed: {e}");
            return 1;
        }
    } else {
        for cmd in &startup_cmds {
            if let Err(e) = app.create_client(Some(cmd), None) {
                eprintln!("tilemux: spawn failed for {cmd:?}: {e}");
            }
        }
    }
    if let Err(e) = commands::run_startup(&mut app) {
        eprintln!("tilemux: startup actions failed: {e}");
    }

    let signals = match SignalPlane::install() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("tilemux: signal setup failed: {e}");
            return 1;
        }
    };

    match run_terminal(&mut app, signals) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("tilemux: {e}");
            1
        }
    }
}

/// Bring up the alternate-screen raw-mode terminal, run the event loop, and
/// restore the terminal on the way out — success or failure — so a crash
/// never leaves the user's shell in raw mode (spec.md section 5's
/// "restore terminal state before exit" rule).
fn run_terminal(app: &mut App, signals: SignalPlane) -> io::Result<()> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableBlinking, EnableMouseCapture, EnableBracketedPaste)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let mut event_loop = EventLoop::new(signals);

    let result = event_loop.run(&mut terminal, app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableBlinking, DisableMouseCapture, DisableBracketedPaste, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

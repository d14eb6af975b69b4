//! L10 EventLoop — the single cooperative, readiness-driven tick that ties
//! every other component together, per spec.md 4.9's ten numbered steps.
//!
//! Grounded on the teacher's top-level `run_remote` poll loop (crossterm
//! `event::poll`/`read`, a version-counter diff against each pane's parser
//! to decide what needs a redraw) in the old `main.rs`; generalized here
//! with the self-pipe signal drain and FIFO servicing spec.md's event loop
//! adds on top of "poll stdin, redraw if dirty".

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event};
use ratatui::backend::Backend;
use ratatui::Terminal;

use crate::app::App;
use crate::input::InputDispatcher;
use crate::signal_plane::SignalPlane;

/// How long a single `event::poll` wait is allowed to block before the loop
/// re-checks signal pipes and PTY versions. Not a spec.md busy-poll: the
/// ideal wait is a single blocking multiplexed read (step 5); crossterm
/// offers only a pollable stdin, so a short timeout stands in for a true
/// `select()` across stdin + every PTY + every FIFO + the signal pipes.
const TICK_TIMEOUT: Duration = Duration::from_millis(50);

pub struct EventLoop {
    dispatcher: InputDispatcher,
    signals: SignalPlane,
    last_versions: Vec<(crate::client::ClientId, u64)>,
    last_title: Option<String>,
    track_title: bool,
}

impl EventLoop {
    pub fn new(signals: SignalPlane) -> Self {
        let track_title = std::env::var("TERM").map(|t| t != "linux").unwrap_or(true);
        EventLoop { dispatcher: InputDispatcher::new(), signals, last_versions: Vec::new(), last_title: None, track_title }
    }

    /// Run until `app.running` goes false or a `quit` command fires.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
        while app.running {
            if self.tick(terminal, app)? {
                break;
            }
        }
        Ok(())
    }

    /// One iteration of spec.md 4.9's ten steps. Returns `true` if `quit`
    /// fired this tick.
    fn tick<B: Backend>(&mut self, terminal: &mut Terminal<B>, app: &mut App) -> io::Result<bool> {
        // Step 1: resize. Crossterm delivers this as an Event::Resize below
        // rather than a separate need_resize flag; handled inline in the
        // stdin servicing branch.

        // Step 2: reap dead editors and apps.
        app.reap_dead();

        // Step 7 (signal drain) runs before stdin service in the source's
        // strict ordering, but the self-pipe here can only be polled, not
        // selected on alongside stdin in one call; draining first keeps a
        // pending SIGCHLD from waiting a full extra tick behind a blocking
        // stdin read. SIGWINCH is also surfaced as crossterm's own Resize
        // event further down; its self-pipe is drained only so it doesn't
        // back up.
        let chld_pending = self.signals.chld.drain();
        self.signals.winch.drain();
        if self.signals.term.drain() {
            app.running = false;
        }
        if chld_pending {
            app.reap_dead();
        }

        // Step 4: refresh output before waiting, matching the "doupdate
        // before select" ordering; redraw only if something changed.
        if app.need_redraw {
            self.redraw(terminal, app)?;
            app.need_redraw = false;
        }
        self.sync_title(app)?;

        // Step 5/6: wait for stdin readiness (bounded, so FIFOs and PTY
        // version counters still get serviced even with no keypress).
        let mut quit = false;
        if event::poll(TICK_TIMEOUT)? {
            match event::read()? {
                Event::Key(key) => {
                    quit = self.dispatcher.handle_key(app, key)?;
                }
                Event::Mouse(me) if app.mouse_enabled => {
                    quit = self.dispatcher.handle_mouse(app, me)?;
                }
                Event::Mouse(_) => {}
                Event::Resize(w, h) => {
                    app.set_screen_size(w, h);
                }
                Event::FocusGained | Event::FocusLost | Event::Paste(_) => {}
            }
        }

        // Step 8: service cmd-fifo, status-fifo.
        if app.has_cmd_fifo() {
            quit = app.service_cmd_fifo()? || quit;
        }
        app.bar.service();

        // Step 9: any client whose PTY version advanced needs a redraw;
        // the reader threads in client.rs already ran `process()` for us.
        if self.versions_changed(app) {
            app.need_redraw = true;
        }

        Ok(quit)
    }

    fn versions_changed(&mut self, app: &App) -> bool {
        let current: Vec<(crate::client::ClientId, u64)> = app
            .clients
            .clients
            .iter()
            .map(|c| (c.id, c.term().version.load(std::sync::atomic::Ordering::Acquire)))
            .collect();
        let changed = current != self.last_versions;
        self.last_versions = current;
        changed
    }

    fn redraw<B: Backend>(&mut self, terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
        terminal.draw(|f| {
            let area = f.size();
            crate::rendering::draw_all(f, app, area);
        })?;
        Ok(())
    }

    /// Outer-terminal title sync (spec.md section 6): a static `-t TITLE`
    /// wins outright; otherwise write OSC-0 with the focused client's title
    /// whenever the selection changes, skipped entirely on `$TERM=linux`.
    fn sync_title(&mut self, app: &App) -> io::Result<()> {
        if !self.track_title {
            return Ok(());
        }
        let title = match &app.config.title {
            Some(t) => t.clone(),
            None => match app.clients.sel().and_then(|id| app.clients.get(id)) {
                Some(c) => c.title.clone(),
                None => return Ok(()),
            },
        };
        if self.last_title.as_deref() == Some(title.as_str()) {
            return Ok(());
        }
        use std::io::Write;
        write!(io::stdout(), "\x1b]0;{title}\x07")?;
        io::stdout().flush()?;
        self.last_title = Some(title);
        Ok(())
    }
}


//! L3 Client — one tile: PTY-backed child, VT parser, title, tags, flags.
//!
//! Grounded on the teacher's `pane.rs` (`create_window`/`split_active_with_command`):
//! a `portable_pty` pair is opened, the child is spawned on the slave side, and a
//! background reader thread feeds raw bytes into a `vt100::Parser` behind a
//! `Mutex`, bumping an `AtomicU64` version counter the event loop polls. Unlike
//! the teacher (one VT per pane, Windows ConPTY only), a `Client` here can carry
//! a *second* parser (`editor`) while copy mode is active, per spec.md section 3.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};

use crate::error::{MuxError, Result};
use crate::util::{truncate_title_bytes, MAX_TITLE_BYTES};

pub type ClientId = u32;

/// One VT-backed child process: the PTY master/child handle plus the shared
/// parser a reader thread feeds. Used for both `Client::app` and the
/// transient `Client::editor` (spec.md section 3/4.5).
pub struct Vt {
    pub master: Box<dyn MasterPty>,
    pub child: Box<dyn Child>,
    pub parser: Arc<Mutex<vt100::Parser>>,
    pub version: Arc<AtomicU64>,
    pub rows: u16,
    pub cols: u16,
}

impl Vt {
    pub(crate) fn spawn(cmd: CommandBuilder, rows: u16, cols: u16, scrollback: usize) -> Result<Self> {
        let pty_system = native_pty_system();
        let size = PtySize { rows, cols, pixel_width: 0, pixel_height: 0 };
        let pair = pty_system
            .openpty(size)
            .map_err(|e| MuxError::Spawn(format!("openpty: {e}")))?;
        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| MuxError::Spawn(format!("spawn: {e}")))?;
        // The slave fd must be dropped in the parent once the child owns it,
        // matching the teacher's comment in pane.rs::create_window.
        drop(pair.slave);

        let parser = Arc::new(Mutex::new(vt100::Parser::new(rows, cols, scrollback)));
        let version = Arc::new(AtomicU64::new(0));
        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| MuxError::Spawn(format!("clone reader: {e}")))?;
        let parser_writer = parser.clone();
        let version_writer = version.clone();
        thread::spawn(move || {
            let mut buf = [0u8; 65536];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        let mut p = parser_writer.lock().unwrap();
                        p.process(&buf[..n]);
                        drop(p);
                        version_writer.fetch_add(1, Ordering::Release);
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Vt { master: pair.master, child, parser, version, rows, cols })
    }

    pub fn write(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.master.write_all(bytes)
    }

    pub fn resize(&mut self, rows: u16, cols: u16) -> std::io::Result<()> {
        self.master.resize(PtySize { rows, cols, pixel_width: 0, pixel_height: 0 })?;
        self.parser.lock().unwrap().screen_mut().set_size(rows, cols);
        self.rows = rows;
        self.cols = cols;
        Ok(())
    }

    /// Non-blocking liveness check: `true` once the child has been reaped,
    /// without blocking (spec.md 4.9 tick 2: reap dead apps). `Err` from the
    /// underlying read (EIO) is treated the same as the process exiting,
    /// per spec.md section 7 ("PTY read EIO: treat as child death").
    pub fn try_wait(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(Some(_)) | Err(_))
    }

    /// Kill the whole process group with `SIGKILL` (spec.md section 5's
    /// cancellation rule), since the child may itself have forked; falls
    /// back to killing just the direct child if its pid can't be read.
    pub fn kill(&mut self) {
        match self.child.process_id() {
            Some(pid) => crate::signal_plane::kill_process_group(pid as libc::pid_t),
            None => {
                let _ = self.child.kill();
            }
        }
    }
}

pub struct Client {
    pub id: ClientId,
    pub order: usize,
    pub tags: u32,
    pub title: String,
    pub cmd: String,
    pub x: u16,
    pub y: u16,
    pub w: u16,
    pub h: u16,
    pub has_title_line: bool,
    pub minimized: bool,
    pub urgent: bool,
    pub died: bool,
    pub editor_died: bool,
    pub app: Vt,
    pub editor: Option<Vt>,
    /// `true` while the active copy-mode child is an "editor"-class
    /// command whose exit should populate the register (spec.md 4.5);
    /// pager-class exits leave the register untouched.
    pub copy_mode_captures: bool,
}

impl Client {
    pub fn spawn(id: ClientId, cmd: Option<&str>, shell: &str, tags: u32, rows: u16, cols: u16, scrollback: usize) -> Result<Self> {
        let mut builder = match cmd {
            Some(c) => {
                let mut b = CommandBuilder::new(shell);
                b.arg("-c");
                b.arg(c);
                b
            }
            None => CommandBuilder::new(shell),
        };
        builder.env("DVTM_WINDOW_ID", id.to_string());
        let app = Vt::spawn(builder, rows, cols, scrollback)?;
        let label = cmd.unwrap_or(shell).to_string();
        Ok(Client {
            id,
            order: 0,
            tags,
            title: truncate_title_bytes(&label),
            cmd: label,
            x: 0,
            y: 0,
            w: cols,
            h: rows,
            has_title_line: false,
            minimized: false,
            urgent: false,
            died: false,
            editor_died: false,
            app,
            editor: None,
            copy_mode_captures: false,
        })
    }

    /// `term` from spec.md section 3: the active VT, editor while in copy
    /// mode, else the app.
    pub fn term(&self) -> &Vt {
        self.editor.as_ref().unwrap_or(&self.app)
    }

    pub fn term_mut(&mut self) -> &mut Vt {
        self.editor.as_mut().unwrap_or(&mut self.app)
    }

    pub fn in_copy_mode(&self) -> bool {
        self.editor.is_some()
    }

    pub fn set_title(&mut self, title: &str) {
        let title = truncate_title_bytes(title);
        self.title = title;
    }

    pub fn display_title(&self, max: usize) -> String {
        crate::util::truncate_right(&self.title, max.min(MAX_TITLE_BYTES))
    }

    pub fn cursor_visible(&self) -> bool {
        !self.term().parser.lock().unwrap().screen().hide_cursor()
    }

    /// Test-only constructor: a real (but trivial, exiting-immediately)
    /// child, used by `client_list.rs`'s list-bookkeeping tests so they
    /// exercise the real spawn path instead of a hand-built struct.
    #[cfg(test)]
    pub fn test_stub(id: ClientId, tags: u32) -> Self {
        Client::spawn(id, Some("true"), "/bin/sh", tags, 24, 80, 100)
            .expect("spawn /bin/sh -c true for test stub")
    }
}

//! L9 CopyMode — `copymode(cmd, seed?)` per spec.md section 4.5: a second
//! VT runs a pager or editor over the selected client's scrollback; on
//! exit, "editor"-class output is drained into the process-wide register.
//!
//! Grounded on `client.rs`'s `Vt::spawn` (reused directly here rather than
//! duplicated — copy mode just spawns a second `Vt` the same way a normal
//! client's `app` VT is spawned). dvtm's distinct `to`/`from` fds (fd 3/4
//! dup'd onto the child beyond its own pty stdio) have no equivalent in
//! `portable_pty::CommandBuilder`, which offers no extra-fd remapping
//! hook; this reads the editor VT's own rendered screen content as the
//! capture source instead of a side channel, which needs no new fd
//! plumbing and still satisfies "editor returns its selection" for any
//! editor that writes the selection back to its own display.

use std::io;

use crate::client::{Client, Vt};

pub const REGISTER_INITIAL_CAP_FLOOR: usize = 4096;

/// Process-wide copy buffer (spec.md section 3: "Register"). Doubles on
/// overflow; silently resets to empty if growth itself fails, per spec.md
/// section 7's "Register growth failure" policy.
pub struct Register {
    buf: Vec<u8>,
}

impl Register {
    pub fn new(configured_scrollback: usize) -> Self {
        let cap = configured_scrollback.max(REGISTER_INITIAL_CAP_FLOOR);
        Register { buf: Vec::with_capacity(cap) }
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn append(&mut self, bytes: &[u8]) {
        if self.buf.len() + bytes.len() > self.buf.capacity() {
            let new_cap = (self.buf.capacity() * 2).max(self.buf.len() + bytes.len());
            let mut grown = Vec::new();
            if grown.try_reserve_exact(new_cap).is_err() {
                self.buf = Vec::new();
                return;
            }
            grown.extend_from_slice(&self.buf);
            self.buf = grown;
        }
        self.buf.extend_from_slice(bytes);
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }
}

/// Resolve the pager/editor program: `$PAGER`/`$EDITOR` if set, else a
/// sane default. `mode` is spec.md's `cmd` — "pager" or "editor".
fn resolve_program(mode: &str) -> String {
    if mode.contains("editor") {
        std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string())
    } else {
        std::env::var("PAGER").unwrap_or_else(|_| "less".to_string())
    }
}

/// Open copy mode on `client`: spawn a second VT sized
/// `(client.h - has_title_line, client.w)`, feed it the scrollback of
/// `client.app` (colored for "pager", plain otherwise, via
/// `write_retrying`'s short EINTR/EAGAIN-tolerant loop), then optionally
/// `seed` bytes. No-op if copy mode is already active.
pub fn enter(client: &mut Client, mode: &str, seed: Option<&[u8]>, scrollback: usize) -> io::Result<()> {
    if client.editor.is_some() {
        return Ok(());
    }

    let rows = client.h.saturating_sub(if client.has_title_line { 1 } else { 0 }).max(1);
    let cols = client.w.max(1);
    let colored = mode.contains("pager");

    let program = resolve_program(mode);
    let builder = portable_pty::CommandBuilder::new(&program);
    let mut editor_vt = Vt::spawn(builder, rows, cols, scrollback)?;

    let scrollback_bytes = render_scrollback(client, colored);
    write_retrying(&mut editor_vt, &scrollback_bytes)?;
    if let Some(seed_bytes) = seed {
        write_retrying(&mut editor_vt, seed_bytes)?;
    }

    client.copy_mode_captures = mode.contains("editor");
    client.editor = Some(editor_vt);
    Ok(())
}

/// Short write loop tolerant of `WouldBlock`/`Interrupted`, per spec.md
/// 4.5 ("a short write loop tolerant of EINTR/EAGAIN").
fn write_retrying(vt: &mut Vt, bytes: &[u8]) -> io::Result<()> {
    let mut offset = 0;
    while offset < bytes.len() {
        match vt.write(&bytes[offset..]) {
            Ok(()) => offset = bytes.len(),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Render the client's entire scrollback history, oldest line first,
/// followed by its current on-screen frame (spec.md 4.5 / scenario 5: the
/// pager receives the full history, not just the visible rows). Walks the
/// vt100 scrollback offset from its deepest point down to the live frame,
/// capturing the one newly-revealed top row at each step — scrolling back
/// by one line always reveals exactly one more historical row at the top
/// of the view, so this never samples the same row twice.
fn render_scrollback(client: &Client, colored: bool) -> Vec<u8> {
    let mut parser = client.app.parser.lock().unwrap();
    let original_offset = parser.screen().scrollback();

    parser.screen_mut().set_scrollback(usize::MAX);
    let history_depth = parser.screen().scrollback();

    let mut out = Vec::new();
    for offset in (1..=history_depth).rev() {
        parser.screen_mut().set_scrollback(offset);
        let frame_text = if colored {
            String::from_utf8_lossy(&parser.screen().contents_formatted()).into_owned()
        } else {
            parser.screen().contents()
        };
        if let Some(line) = frame_text.lines().next() {
            out.extend_from_slice(line.as_bytes());
            out.push(b'\n');
        }
    }

    parser.screen_mut().set_scrollback(0);
    let live_frame = if colored {
        parser.screen().contents_formatted()
    } else {
        parser.screen().contents().into_bytes()
    };
    out.extend_from_slice(&live_frame);

    parser.screen_mut().set_scrollback(original_offset);
    out
}

/// On editor death (spec.md 4.5, driven by the event loop's
/// `editor_died` check): for "editor"-class sessions, drain the editor
/// VT's final screen contents into the register; for "pager"-class
/// sessions the register is left untouched. Always tears down the editor
/// VT and reverts `term` to `app`.
pub fn exit(client: &mut Client, register: &mut Register) {
    if let Some(editor) = client.editor.take() {
        if client.copy_mode_captures {
            let text = {
                let parser = editor.parser.lock().unwrap();
                parser.screen().contents()
            };
            register.clear();
            register.append(text.as_bytes());
        }
    }
    client.copy_mode_captures = false;
    client.editor_died = false;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_appends_and_doubles() {
        let mut r = Register::new(8);
        r.append(b"hello");
        assert_eq!(r.bytes(), b"hello");
        r.append(&vec![b'x'; 1000]);
        assert_eq!(r.bytes().len(), 1005);
    }

    #[test]
    fn register_clear_empties_buffer() {
        let mut r = Register::new(8);
        r.append(b"data");
        r.clear();
        assert!(r.bytes().is_empty());
    }

    #[test]
    fn resolve_program_prefers_pager_default() {
        std::env::remove_var("PAGER");
        assert_eq!(resolve_program("pager"), "less");
    }

    #[test]
    fn resolve_program_prefers_editor_default() {
        std::env::remove_var("EDITOR");
        assert_eq!(resolve_program("editor"), "vi");
    }

    #[test]
    fn exit_on_pager_leaves_register_empty() {
        let mut client = Client::test_stub(1, 1);
        client.editor = Some(crate::client::Vt::spawn(
            portable_pty::CommandBuilder::new("/bin/sh"),
            5,
            20,
            10,
        ).unwrap());
        client.copy_mode_captures = false;
        let mut reg = Register::new(8);
        exit(&mut client, &mut reg);
        assert!(reg.bytes().is_empty());
        assert!(client.editor.is_none());
    }
}

//! L7 InputDispatcher — chord buffer, binding table lookup, and the
//! pass-through path to the focused (or broadcast) client's VT, per
//! spec.md section 4.3.
//!
//! Key-to-bytes encoding is grounded on the teacher's
//! `forward_key_to_active` (Ctrl/Alt/arrow-key translation to the byte
//! sequences a terminal program expects); the chord/binding-table search
//! itself has no teacher precedent (the teacher has one fixed prefix key,
//! not a configurable binding table) and is grounded directly on spec.md
//! 4.3's five-step algorithm.

use std::io;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::app::App;
use crate::commands;
use crate::config::{Key, MAX_KEYS};

pub struct InputDispatcher {
    chord: Vec<Key>,
}

impl InputDispatcher {
    pub fn new() -> Self {
        InputDispatcher { chord: Vec::new() }
    }

    /// Step 1-5 of spec.md 4.3. Returns `true` if the dispatched command
    /// was `quit`.
    pub fn handle_key(&mut self, app: &mut App, key: KeyEvent) -> io::Result<bool> {
        let entry = Key(key.code, key.modifiers);
        self.chord.push(entry);
        if self.chord.len() > MAX_KEYS {
            self.chord.clear();
            self.chord.push(entry);
        }

        let n = self.chord.len();
        let prefix_matches: Vec<usize> = app
            .config
            .bindings
            .iter()
            .enumerate()
            .filter(|(_, b)| b.chord.len() >= n && b.chord[..n] == self.chord[..])
            .map(|(i, _)| i)
            .collect();

        if prefix_matches.is_empty() {
            let pending = std::mem::take(&mut self.chord);
            self.pass_through(app, &pending)?;
            return Ok(false);
        }

        if let Some(&idx) = prefix_matches.iter().find(|&&i| app.config.bindings[i].chord.len() == n) {
            let action = app.config.bindings[idx].action;
            let args = app.config.bindings[idx].args.clone();
            self.chord.clear();
            return commands::execute(app, action, &args);
        }

        // Prefix matches but none complete yet — wait for more keys.
        Ok(false)
    }

    /// Forward every key in `pending` to the focused client's VT (or every
    /// visible client's, in broadcast mode). Only the last key of a
    /// multi-key chord that failed to match anything is meaningfully
    /// distinct from a single keystroke; earlier keys in the chord were
    /// already consumed as a failed prefix and are replayed byte-for-byte
    /// so nothing is silently dropped.
    fn pass_through(&mut self, app: &mut App, pending: &[Key]) -> io::Result<()> {
        for key in pending {
            let bytes = key_to_bytes(key.0, key.1);
            if bytes.is_empty() {
                continue;
            }
            self.write_bytes(app, &bytes)?;
        }
        Ok(())
    }

    fn write_bytes(&self, app: &mut App, bytes: &[u8]) -> io::Result<()> {
        if app.runinall {
            let ids = app.clients.visible_ids();
            for id in ids {
                if let Some(c) = app.clients.get_mut(id) {
                    c.term_mut().write(bytes)?;
                }
            }
            Ok(())
        } else if let Some(sel) = app.clients.sel() {
            if let Some(c) = app.clients.get_mut(sel) {
                c.term_mut().write(bytes)?;
            }
            Ok(())
        } else {
            Ok(())
        }
    }

    /// Mouse events (spec.md 4.7): forward the local coordinate to the
    /// clicked client's VT, then fire every matching mouse binding in
    /// table order.
    pub fn handle_mouse(&mut self, app: &mut App, me: MouseEvent) -> io::Result<bool> {
        let Some((id, local_col, local_row)) = app.client_at(me.column, me.row) else {
            return Ok(false);
        };
        app.msel = Some(id);

        if matches!(me.kind, MouseEventKind::Down(_)) {
            let bytes = mouse_bytes(me, local_col, local_row);
            if !bytes.is_empty() {
                if let Some(c) = app.clients.get_mut(id) {
                    let _ = c.term_mut().write(&bytes);
                }
            }
        }

        let mut quit = false;
        let bindings = app.config.mouse_bindings.clone();
        for b in &bindings {
            if matches_button(me, b.button) {
                let q = commands::execute(app, b.action, &b.args)?;
                quit = quit || q;
            }
        }
        app.msel = None;
        Ok(quit)
    }
}

impl Default for InputDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_button(me: MouseEvent, button: MouseButton) -> bool {
    matches!(me.kind, MouseEventKind::Down(b) if b == button)
}

fn mouse_bytes(_me: MouseEvent, _col: u16, _row: u16) -> Vec<u8> {
    // Mouse-protocol passthrough to the child's own VT mouse mode is a
    // property of the VT layer (vt100 screen mouse_protocol_mode), wired
    // up in rendering.rs where the client's screen is already borrowed;
    // this hook exists so future mouse-protocol encoding has a home.
    Vec::new()
}

/// Translate a crossterm key event into the byte sequence a terminal
/// program expects on its stdin, the way the teacher's
/// `forward_key_to_active` does for Ctrl/Alt/arrow keys.
fn key_to_bytes(code: KeyCode, modifiers: KeyModifiers) -> Vec<u8> {
    match code {
        KeyCode::Char(c) if modifiers.contains(KeyModifiers::CONTROL) && modifiers.contains(KeyModifiers::ALT) => {
            vec![0x1b, ctrl_byte(c)]
        }
        KeyCode::Char(c) if modifiers.contains(KeyModifiers::ALT) => {
            let mut v = vec![0x1b];
            v.extend(c.to_string().into_bytes());
            v
        }
        KeyCode::Char(c) if modifiers.contains(KeyModifiers::CONTROL) => vec![ctrl_byte(c)],
        KeyCode::Char(c) => c.to_string().into_bytes(),
        KeyCode::Enter => vec![b'\r'],
        KeyCode::Tab => vec![b'\t'],
        KeyCode::BackTab => b"\x1b[Z".to_vec(),
        KeyCode::Backspace => vec![0x7f],
        KeyCode::Esc => vec![0x1b],
        KeyCode::Left => b"\x1b[D".to_vec(),
        KeyCode::Right => b"\x1b[C".to_vec(),
        KeyCode::Up => b"\x1b[A".to_vec(),
        KeyCode::Down => b"\x1b[B".to_vec(),
        KeyCode::Home => b"\x1b[H".to_vec(),
        KeyCode::End => b"\x1b[F".to_vec(),
        KeyCode::PageUp => b"\x1b[5~".to_vec(),
        KeyCode::PageDown => b"\x1b[6~".to_vec(),
        KeyCode::Delete => b"\x1b[3~".to_vec(),
        KeyCode::Insert => b"\x1b[2~".to_vec(),
        KeyCode::F(n) => function_key_bytes(n),
        _ => Vec::new(),
    }
}

fn ctrl_byte(c: char) -> u8 {
    (c.to_ascii_lowercase() as u8).wrapping_sub(b'a' - 1)
}

fn function_key_bytes(n: u8) -> Vec<u8> {
    let code = match n {
        1 => "OP",
        2 => "OQ",
        3 => "OR",
        4 => "OS",
        5 => "15~",
        6 => "17~",
        7 => "18~",
        8 => "19~",
        9 => "20~",
        10 => "21~",
        11 => "23~",
        12 => "24~",
        _ => return Vec::new(),
    };
    let mut v = vec![0x1b];
    if code.starts_with('O') {
        v.extend(code.bytes());
    } else {
        v.push(b'[');
        v.extend(code.bytes());
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctrl_a_maps_to_0x01() {
        assert_eq!(key_to_bytes(KeyCode::Char('a'), KeyModifiers::CONTROL), vec![0x01]);
    }

    #[test]
    fn plain_char_passes_through() {
        assert_eq!(key_to_bytes(KeyCode::Char('x'), KeyModifiers::NONE), b"x".to_vec());
    }

    #[test]
    fn arrow_keys_emit_csi_sequences() {
        assert_eq!(key_to_bytes(KeyCode::Up, KeyModifiers::NONE), b"\x1b[A".to_vec());
        assert_eq!(key_to_bytes(KeyCode::Down, KeyModifiers::NONE), b"\x1b[B".to_vec());
    }

    #[test]
    fn alt_prefixes_with_escape() {
        assert_eq!(key_to_bytes(KeyCode::Char('f'), KeyModifiers::ALT), vec![0x1b, b'f']);
    }
}

//! L6 StatusBar — fd, position, autohide flag, and the ≤511-byte text
//! buffer spec.md section 3/4.8 describe.

use std::fs::File;
use std::io::{self, Read};

use unicode_width::UnicodeWidthStr;

pub const STATUS_MAX_BYTES: usize = 511;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarPos {
    Top,
    Bottom,
    Off,
}

pub struct Bar {
    pub fd: Option<File>,
    pub pos: BarPos,
    pub lastpos: BarPos,
    pub autohide: bool,
    pub text: String,
}

impl Bar {
    pub fn new(fd: Option<File>, autohide: bool) -> Self {
        Bar { fd, pos: BarPos::Top, lastpos: BarPos::Top, autohide, text: String::new() }
    }

    /// `togglebar`: position toggling never changes visibility beyond
    /// TOP/BOTTOM; if the bar is OFF, only `lastpos` is recorded (see
    /// `toggle_pos`, and SPEC_FULL.md section 9's Open Question decision
    /// for `togglebarpos`'s missing OFF arm).
    pub fn toggle(&mut self) {
        self.pos = match self.pos {
            BarPos::Off => self.lastpos,
            _ => {
                self.lastpos = self.pos;
                BarPos::Off
            }
        };
    }

    /// `togglebarpos`: swap TOP/BOTTOM. If the bar is currently OFF, the
    /// source left this case unhandled; the decided behavior (no visible
    /// effect, `lastpos` alone flips) keeps `toggle()` idempotent on
    /// visibility while still tracking where the bar would reappear.
    pub fn toggle_pos(&mut self) {
        match self.pos {
            BarPos::Top => self.pos = BarPos::Bottom,
            BarPos::Bottom => self.pos = BarPos::Top,
            BarPos::Off => {
                self.lastpos = match self.lastpos {
                    BarPos::Top => BarPos::Bottom,
                    _ => BarPos::Top,
                };
            }
        }
    }

    pub fn is_visible(&self) -> bool {
        self.pos != BarPos::Off
    }

    /// On fd wakeup: read up to `STATUS_MAX_BYTES`, strip trailing
    /// newlines, retain only the last complete line (spec.md 4.8). On a
    /// read error, store `strerror` text and close the fd.
    pub fn service(&mut self) {
        let Some(file) = self.fd.as_mut() else { return };
        let mut buf = [0u8; STATUS_MAX_BYTES];
        match file.read(&mut buf) {
            Ok(0) => {}
            Ok(n) => {
                let chunk = String::from_utf8_lossy(&buf[..n]);
                let trimmed = chunk.trim_end_matches(['\n', '\r']);
                let last_line = trimmed.rsplit('\n').next().unwrap_or(trimmed);
                self.text = last_line.to_string();
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                self.text = e.to_string();
                self.fd = None;
            }
        }
    }

    pub fn has_fd(&self) -> bool {
        self.fd.is_some()
    }
}

/// Attribute precedence for a tag indicator (spec.md 4.8).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagAttr {
    Sel,
    Urgent,
    Occupied,
    Normal,
}

pub fn tag_attr(is_current: bool, has_urgent_client: bool, has_any_client: bool) -> TagAttr {
    if is_current {
        TagAttr::Sel
    } else if has_urgent_client {
        TagAttr::Urgent
    } else if has_any_client {
        TagAttr::Occupied
    } else {
        TagAttr::Normal
    }
}

/// Right-align `text` within `width` display columns, truncating with a
/// wide-character width function (spec.md 4.8: `screen.w - x - 2`).
pub fn format_right_aligned(text: &str, width: usize) -> String {
    let truncated = crate::util::truncate_right(text, width);
    let pad = width.saturating_sub(truncated.width());
    format!("{}{}", " ".repeat(pad), truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_bar_records_lastpos() {
        let mut bar = Bar::new(None, false);
        bar.pos = BarPos::Bottom;
        bar.toggle();
        assert_eq!(bar.pos, BarPos::Off);
        assert_eq!(bar.lastpos, BarPos::Bottom);
        bar.toggle();
        assert_eq!(bar.pos, BarPos::Bottom);
    }

    #[test]
    fn toggle_pos_swaps_top_and_bottom() {
        let mut bar = Bar::new(None, false);
        assert_eq!(bar.pos, BarPos::Top);
        bar.toggle_pos();
        assert_eq!(bar.pos, BarPos::Bottom);
        bar.toggle_pos();
        assert_eq!(bar.pos, BarPos::Top);
    }

    #[test]
    fn toggle_pos_while_off_only_touches_lastpos() {
        let mut bar = Bar::new(None, false);
        bar.pos = BarPos::Off;
        bar.lastpos = BarPos::Top;
        bar.toggle_pos();
        assert_eq!(bar.pos, BarPos::Off);
        assert_eq!(bar.lastpos, BarPos::Bottom);
    }

    #[test]
    fn tag_attr_precedence() {
        assert_eq!(tag_attr(true, true, true), TagAttr::Sel);
        assert_eq!(tag_attr(false, true, true), TagAttr::Urgent);
        assert_eq!(tag_attr(false, false, true), TagAttr::Occupied);
        assert_eq!(tag_attr(false, false, false), TagAttr::Normal);
    }

    #[test]
    fn right_align_pads_short_text() {
        let out = format_right_aligned("hi", 5);
        assert_eq!(out, "   hi");
    }
}

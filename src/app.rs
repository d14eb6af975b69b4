//! The bundled owning value spec.md's DESIGN NOTES (section 9) call for in
//! place of dvtm's scattered globals: every piece of mutable state plus the
//! operations spec.md section 4 describes as methods on it, so
//! `commands::execute` and `input::InputDispatcher` each take one `&mut App`
//! rather than a fistful of separate globals.
//!
//! Grounded on the teacher's `AppState` in `types.rs` (one struct bundling
//! panes, layout, and UI flags), generalized with the tag/copy-mode/FIFO
//! state spec.md adds.

use std::fs::File;
use std::io::{self, Read};

use crate::client::{Client, ClientId};
use crate::client_list::ClientList;
use crate::commands;
use crate::config::Config;
use crate::copy_mode::{self, Register};
use crate::layout::{self, Direction, LayoutKind, Rect, Tile};
use crate::statusbar::Bar;
use crate::style::ColorPairTable;

/// Screen-wide layout state: geometry plus the last computed per-client
/// rects, kept around so directional focus and mouse hit-testing don't need
/// to recompute the layout (spec.md 3: "Screen").
pub struct Screen {
    pub w: u16,
    pub h: u16,
    pub history: usize,
    pub nmaster: usize,
    pub mfact: f32,
    pub layout: LayoutKind,
    pub rects: Vec<(ClientId, Rect)>,
}

pub struct App {
    pub config: Config,
    pub clients: ClientList,
    pub screen: Screen,
    pub bar: Bar,
    pub register: Register,
    pub mouse_enabled: bool,
    pub runinall: bool,
    pub msel: Option<ClientId>,
    pub need_redraw: bool,
    pub running: bool,
    pub colors: ColorPairTable,
    shell: String,
    own_exe_name: String,
    cmd_fifo: Option<File>,
    next_id: ClientId,
}

impl App {
    pub fn new(
        config: Config,
        shell: String,
        own_exe_name: String,
        rows: u16,
        cols: u16,
        status_fifo: Option<File>,
        cmd_fifo: Option<File>,
    ) -> Self {
        let mouse_enabled = config.mouse_enabled_default;
        let history = config.scrollback;
        let default_tagset = config.tag_bit(&config.tags[0]).unwrap_or(1);
        let register = Register::new(history);
        let bar = Bar::new(status_fifo, false);
        App {
            config,
            clients: ClientList::new(default_tagset),
            screen: Screen { w: cols, h: rows, history, nmaster: crate::config::DEFAULT_NMASTER, mfact: crate::config::DEFAULT_MFACT, layout: LayoutKind::Tile, rects: Vec::new() },
            bar,
            register,
            mouse_enabled,
            runinall: false,
            msel: None,
            need_redraw: true,
            running: true,
            colors: ColorPairTable::new(),
            shell,
            own_exe_name,
            cmd_fifo,
            next_id: 1,
        }
    }

    pub fn own_exe_name(&self) -> &str {
        &self.own_exe_name
    }

    /// `create(cmd?)` — spec.md 3/4.4's client lifecycle: allocate a fresh,
    /// never-reused id, spawn, attach to the spatial list head, focus it.
    pub fn create_client(&mut self, cmd: Option<&str>, title: Option<&str>) -> io::Result<()> {
        let id = self.next_id;
        self.next_id += 1;
        let tags = self.clients.current_tagset;
        let rows = self.screen.h.max(1);
        let cols = self.screen.w.max(1);
        let mut client = Client::spawn(id, cmd, &self.shell, tags, rows, cols, self.screen.history)
            .map_err(io::Error::from)?;
        if let Some(t) = title {
            client.set_title(t);
        }
        match self.clients.sel() {
            Some(after) => self.clients.attach_after(client, after),
            None => self.clients.attach(client),
        }
        self.clients.focus(Some(id));
        self.rearrange();
        Ok(())
    }

    /// `killclient` — destroy the selected client immediately rather than
    /// waiting for the next reap tick (spec.md 4.4).
    pub fn kill_selected(&mut self) {
        let Some(sel) = self.clients.sel() else { return };
        self.destroy_client(sel, true);
    }

    /// Drain every client whose underlying process has already exited
    /// (spec.md 4.9 tick 2/7): dead `app` VTs destroy the client outright;
    /// a dead `editor` VT exits copy mode and restores `term` to `app`.
    pub fn reap_dead(&mut self) {
        let mut editor_exits = Vec::new();
        let mut dead = Vec::new();
        for c in self.clients.clients.iter_mut() {
            if let Some(editor) = c.editor.as_mut() {
                if editor.try_wait() {
                    editor_exits.push(c.id);
                }
            } else if c.app.try_wait() {
                dead.push(c.id);
            }
        }
        for id in editor_exits {
            if let Some(c) = self.clients.get_mut(id) {
                copy_mode::exit(c, &mut self.register);
            }
        }
        for id in dead {
            self.destroy_client(id, false);
        }
    }

    fn destroy_client(&mut self, id: ClientId, kill: bool) {
        let was_last = self.clients.clients.len() == 1;
        let cmd_was_shell = self.clients.get(id).map(|c| c.cmd == self.shell).unwrap_or(false);
        if let Some(mut c) = self.clients.detach(id) {
            if kill {
                c.term_mut().kill();
            }
        }
        if was_last {
            if cmd_was_shell && !self.config.startup.is_empty() {
                self.running = false;
            } else {
                let _ = self.create_client(None, None);
            }
        }
        self.rearrange();
    }

    /// `focusup`/`focusdown`/`focusleft`/`focusright` (spec.md 4.1/4.4):
    /// geometric lookup against the last computed layout, falling back to
    /// list-order `focusprev`/`focusnext` on a miss.
    pub fn focus_direction(&mut self, dir: Direction) {
        let Some(sel) = self.clients.sel() else { return };
        let Some(&(_, current)) = self.screen.rects.iter().find(|(id, _)| *id == sel) else { return };
        let others: Vec<(ClientId, Rect)> = self.screen.rects.iter().copied().filter(|(id, _)| *id != sel).collect();
        match layout::focus_in_direction(current, dir, &others) {
            Some(id) => self.clients.focus(Some(id)),
            None => match dir {
                Direction::Up | Direction::Left => commands::focus_prev(&mut self.clients),
                Direction::Down | Direction::Right => commands::focus_next(&mut self.clients),
            },
        }
    }

    /// Point lookup against the last computed layout, returning the hit
    /// client id plus local (tile-relative) coordinates — spec.md 4.7.
    pub fn client_at(&self, x: u16, y: u16) -> Option<(ClientId, u16, u16)> {
        self.screen
            .rects
            .iter()
            .find(|(_, r)| r.contains(x, y))
            .map(|(id, r)| (*id, x - r.x, y - r.y))
    }

    /// `scrollback(div)` (spec.md 4.4): scroll the selected client's VT by
    /// `h / div` lines, clamped to `[0, history]`.
    pub fn scrollback(&mut self, div: i32) {
        if div == 0 {
            return;
        }
        let Some(sel) = self.clients.sel() else { return };
        let Some(c) = self.clients.get_mut(sel) else { return };
        let delta = c.h as i32 / div;
        let mut parser = c.term_mut().parser.lock().unwrap();
        let current = parser.screen().scrollback() as i32;
        let new_val = (current - delta).max(0) as usize;
        parser.screen_mut().set_scrollback(new_val);
    }

    pub fn enter_copy_mode(&mut self, mode: &str) -> io::Result<()> {
        let Some(sel) = self.clients.sel() else { return Ok(()) };
        let scrollback = self.screen.history;
        if let Some(c) = self.clients.get_mut(sel) {
            copy_mode::enter(c, mode, None, scrollback)?;
        }
        self.rearrange();
        Ok(())
    }

    pub fn paste_register(&mut self) -> io::Result<()> {
        let bytes = self.register.bytes().to_vec();
        if bytes.is_empty() {
            return Ok(());
        }
        self.send_to_focused(&bytes)
    }

    pub fn send_to_focused(&mut self, bytes: &[u8]) -> io::Result<()> {
        let Some(sel) = self.clients.sel() else { return Ok(()) };
        if let Some(c) = self.clients.get_mut(sel) {
            commands::write_to_pty(c.term_mut(), bytes)?;
        }
        Ok(())
    }

    /// Mark `need_resize`: the next tick's rearrange will pick up the new
    /// terminal dimensions (spec.md 4.9 tick 1, driven by `SIGWINCH`).
    pub fn set_screen_size(&mut self, w: u16, h: u16) {
        self.screen.w = w;
        self.screen.h = h;
        self.rearrange();
    }

    /// Recompute every visible client's geometry and resize its VT to
    /// match, per spec.md 4.2. Runs after any command that can change
    /// layout, tagset, minimize state, or client count.
    pub fn rearrange(&mut self) {
        let bar_hidden_by_autohide = layout::bar_should_hide(self.bar.autohide, self.bar.has_fd(), self.clients.visible_count());
        let bar_visible = self.bar.is_visible() && !bar_hidden_by_autohide;
        let bar_on_top = matches!(self.bar.pos, crate::statusbar::BarPos::Top);

        let bar_rows = if bar_visible { 1 } else { 0 };
        let area = Rect {
            x: 0,
            y: if bar_visible && bar_on_top { 1 } else { 0 },
            w: self.screen.w,
            h: self.screen.h.saturating_sub(bar_rows),
        };

        let tiles: Vec<Tile> = self.clients.visible().map(|c| Tile { id: c.id, minimized: c.minimized }).collect();
        let rects = layout::compute(self.screen.layout, &tiles, area, self.screen.nmaster, self.screen.mfact);
        self.screen.rects = rects.clone();

        let has_title_line = self.bar.is_visible() || self.clients.clients.len() > 1;
        for (id, r) in &rects {
            if let Some(c) = self.clients.get_mut(*id) {
                c.x = r.x;
                c.y = r.y;
                c.w = r.w;
                c.h = r.h;
                c.has_title_line = has_title_line;
                let inner_h = r.h.saturating_sub(if has_title_line { 1 } else { 0 }).max(1);
                let inner_w = r.w.max(1);
                if c.term().rows != inner_h || c.term().cols != inner_w {
                    let _ = c.term_mut().resize(inner_h, inner_w);
                }
            }
        }
        self.need_redraw = true;
    }

    /// Service the command FIFO (spec.md 4.6): parse each complete line,
    /// resolve it to an action, and dispatch it. A `fifo_commands` entry's
    /// baked-in arguments shadow the line's own arguments only when that
    /// entry actually has arguments preconfigured (spec.md section 6);
    /// otherwise the FIFO line's own arguments are used as-is. Deliberately
    /// not looked up against `bindings` — a keybinding's baked args are
    /// scoped to that key chord, not to every other way the same action
    /// can be invoked.
    pub fn service_cmd_fifo(&mut self) -> io::Result<bool> {
        let Some(file) = self.cmd_fifo.as_mut() else { return Ok(false) };
        let mut buf = [0u8; 4096];
        let text = match file.read(&mut buf) {
            Ok(0) => return Ok(false),
            Ok(n) => String::from_utf8_lossy(&buf[..n]).into_owned(),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::Interrupted => return Ok(false),
            Err(e) => return Err(e),
        };

        let mut quit = false;
        for line in text.split('\n') {
            if line.trim().is_empty() {
                continue;
            }
            let Some((name, fifo_args)) = commands::parse_fifo_line(line) else { continue };
            let Some(action) = commands::Action::from_name(&name) else { continue };
            let baked = self.config.fifo_commands.iter().find(|c| c.action == action).map(|c| c.args.clone());
            let effective = match baked {
                Some(args) if !args.is_empty() => args,
                _ => fifo_args,
            };
            if commands::execute(self, action, &effective)? {
                quit = true;
            }
        }
        Ok(quit)
    }

    pub fn has_cmd_fifo(&self) -> bool {
        self.cmd_fifo.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> App {
        App::new(Config::new(), "/bin/sh".to_string(), "tilemux".to_string(), 24, 80, None, None)
    }

    #[test]
    fn create_client_attaches_and_focuses() {
        let mut app = test_app();
        app.create_client(Some("true"), None).unwrap();
        assert!(app.clients.sel().is_some());
        assert_eq!(app.clients.clients.len(), 1);
    }

    #[test]
    fn kill_last_client_spawns_replacement_when_no_startup() {
        let mut app = test_app();
        app.create_client(Some("true"), None).unwrap();
        app.kill_selected();
        assert_eq!(app.clients.clients.len(), 1);
    }

    #[test]
    fn rearrange_populates_rects_for_visible_clients() {
        let mut app = test_app();
        app.create_client(Some("true"), None).unwrap();
        app.create_client(Some("true"), None).unwrap();
        assert_eq!(app.screen.rects.len(), 2);
    }

    #[test]
    fn client_at_resolves_local_coordinates() {
        let mut app = test_app();
        app.create_client(Some("true"), None).unwrap();
        let (_, r) = app.screen.rects[0];
        let hit = app.client_at(r.x, r.y);
        assert!(hit.is_some());
    }
}

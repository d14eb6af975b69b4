//! L8 CommandRegistry — the closed, finite command set of spec.md section
//! 4.4, invocable from key bindings, mouse bindings, and the command FIFO.
//!
//! Grounded on the teacher's `Action` enum + `execute_action()` dispatch in
//! `types.rs`/`input.rs`, but realized as the "sum type of command variants"
//! spec.md's DESIGN NOTES recommend over the C function-pointer table, with
//! arguments passed alongside rather than baked into the variant (closer to
//! dvtm's `void (*cmd)(const char *args[])` shape, translated to Rust).

use crate::app::App;
use crate::client_list::ClientList;
use crate::config::{DEFAULT_MFACT, DEFAULT_NMASTER, MAX_ARGS};
use crate::layout::LayoutKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Create,
    KillClient,
    FocusN,
    FocusId,
    FocusNext,
    FocusPrev,
    FocusUp,
    FocusDown,
    FocusLeft,
    FocusRight,
    FocusLast,
    FocusNextNm,
    FocusPrevNm,
    Zoom,
    ToggleMinimize,
    SetLayout,
    IncNMaster,
    SetMfact,
    Tag,
    TagId,
    ToggleTag,
    ToggleView,
    View,
    ViewPrevTag,
    ToggleBar,
    ToggleBarPos,
    ToggleMouse,
    ToggleRunAll,
    ScrollBack,
    CopyMode,
    Paste,
    Send,
    Redraw,
    Quit,
    Startup,
}

impl Action {
    /// Command-FIFO / config name lookup (spec.md section 4.4's named set).
    pub fn from_name(name: &str) -> Option<Action> {
        use Action::*;
        Some(match name {
            "create" => Create,
            "killclient" => KillClient,
            "focusn" => FocusN,
            "focusid" => FocusId,
            "focusnext" => FocusNext,
            "focusprev" => FocusPrev,
            "focusup" => FocusUp,
            "focusdown" => FocusDown,
            "focusleft" => FocusLeft,
            "focusright" => FocusRight,
            "focuslast" => FocusLast,
            "focusnextnm" => FocusNextNm,
            "focusprevnm" => FocusPrevNm,
            "zoom" => Zoom,
            "toggleminimize" => ToggleMinimize,
            "setlayout" => SetLayout,
            "incnmaster" => IncNMaster,
            "setmfact" => SetMfact,
            "tag" => Tag,
            "tagid" => TagId,
            "toggletag" => ToggleTag,
            "toggleview" => ToggleView,
            "view" => View,
            "viewprevtag" => ViewPrevTag,
            "togglebar" => ToggleBar,
            "togglebarpos" => ToggleBarPos,
            "togglemouse" => ToggleMouse,
            "togglerunall" => ToggleRunAll,
            "scrollback" => ScrollBack,
            "copymode" => CopyMode,
            "paste" => Paste,
            "send" => Send,
            "redraw" => Redraw,
            "quit" => Quit,
            "startup" => Startup,
            _ => return None,
        })
    }
}

/// `true` => caller should exit the process (the `quit` command).
pub fn execute(app: &mut App, action: Action, args: &[String]) -> std::io::Result<bool> {
    match action {
        Action::Create => {
            let cmd = args.first().map(|s| s.as_str());
            app.create_client(cmd, None)?;
        }
        Action::KillClient => app.kill_selected(),
        Action::FocusN => {
            if let Some(n) = args.first().and_then(|s| s.parse::<usize>().ok()) {
                focus_nth(&mut app.clients, n);
            }
        }
        Action::FocusId => {
            if let Some(id) = args.first().and_then(|s| s.parse::<u32>().ok()) {
                app.clients.focus(Some(id));
            }
        }
        Action::FocusNext => focus_next(&mut app.clients),
        Action::FocusPrev => focus_prev(&mut app.clients),
        Action::FocusLast => {
            let last = app.clients.lastsel;
            if last.is_some() {
                app.clients.focus(last);
            }
        }
        Action::FocusNextNm => focus_next_nm(&mut app.clients),
        Action::FocusPrevNm => focus_prev_nm(&mut app.clients),
        Action::FocusUp => app.focus_direction(crate::layout::Direction::Up),
        Action::FocusDown => app.focus_direction(crate::layout::Direction::Down),
        Action::FocusLeft => app.focus_direction(crate::layout::Direction::Left),
        Action::FocusRight => app.focus_direction(crate::layout::Direction::Right),
        Action::Zoom => zoom(&mut app.clients),
        Action::ToggleMinimize => toggle_minimize(&mut app.clients),
        Action::SetLayout => {
            if let Some(name) = args.first() {
                if let Some(kind) = LayoutKind::from_symbol(name) {
                    app.screen.layout = kind;
                }
            } else {
                app.screen.layout = app.screen.layout.next();
            }
        }
        Action::IncNMaster => inc_nmaster(app, args.first().map(|s| s.as_str())),
        Action::SetMfact => set_mfact(app, args.first().map(|s| s.as_str())),
        Action::Tag => tag(app, args.first().map(|s| s.as_str())),
        Action::TagId => tag_id(app, args.first().and_then(|s| s.parse().ok())),
        Action::ToggleTag => toggle_tag(app, args.first().map(|s| s.as_str())),
        Action::ToggleView => toggle_view(app, args.first().map(|s| s.as_str())),
        Action::View => view(app, args.first().map(|s| s.as_str())),
        Action::ViewPrevTag => view_prev_tag(app),
        Action::ToggleBar => app.bar.toggle(),
        Action::ToggleBarPos => app.bar.toggle_pos(),
        Action::ToggleMouse => app.mouse_enabled = !app.mouse_enabled,
        Action::ToggleRunAll => app.runinall = !app.runinall,
        Action::ScrollBack => {
            let div = args.first().and_then(|s| s.parse::<i32>().ok()).unwrap_or(-2);
            app.scrollback(div);
        }
        Action::CopyMode => {
            let mode = args.first().map(|s| s.as_str()).unwrap_or("pager");
            app.enter_copy_mode(mode)?;
        }
        Action::Paste => app.paste_register()?,
        Action::Send => {
            if let Some(text) = args.first() {
                app.send_to_focused(text.as_bytes())?;
            }
        }
        Action::Redraw => app.need_redraw = true,
        Action::Quit => return Ok(true),
        Action::Startup => {
            let actions = app.config.startup.clone();
            for (name, sargs) in actions {
                if let Some(a) = Action::from_name(&name) {
                    execute(app, a, &sargs)?;
                }
            }
        }
    }
    Ok(false)
}

fn focus_nth(clients: &mut ClientList, n: usize) {
    let ids = clients.visible_ids();
    if let Some(&id) = ids.get(n.saturating_sub(1)) {
        clients.focus(Some(id));
    }
}

pub(crate) fn focus_next(clients: &mut ClientList) {
    let Some(sel) = clients.sel() else { return };
    let next = clients.next_visible(sel).or_else(|| clients.visible_ids().into_iter().next());
    clients.focus(next);
}

pub(crate) fn focus_prev(clients: &mut ClientList) {
    let Some(sel) = clients.sel() else { return };
    let prev = clients.prev_visible(sel).or_else(|| clients.visible_ids().into_iter().last());
    clients.focus(prev);
}

fn focus_next_nm(clients: &mut ClientList) {
    let Some(mut cur) = clients.sel() else { return };
    let ids = clients.visible_ids();
    for _ in 0..ids.len() {
        match clients.next_visible(cur).or_else(|| ids.first().copied()) {
            Some(next) => {
                cur = next;
                if clients.get(cur).map(|c| !c.minimized).unwrap_or(false) {
                    clients.focus(Some(cur));
                    return;
                }
            }
            None => return,
        }
    }
}

fn focus_prev_nm(clients: &mut ClientList) {
    let Some(mut cur) = clients.sel() else { return };
    let ids = clients.visible_ids();
    for _ in 0..ids.len() {
        match clients.prev_visible(cur).or_else(|| ids.last().copied()) {
            Some(prev) => {
                cur = prev;
                if clients.get(cur).map(|c| !c.minimized).unwrap_or(false) {
                    clients.focus(Some(cur));
                    return;
                }
            }
            None => return,
        }
    }
}

/// `zoom` (spec.md 4.4): promote `sel` to the head of the spatial list,
/// swapping with the previous head if `sel` was already the head.
fn zoom(clients: &mut ClientList) {
    let Some(sel) = clients.sel() else { return };
    let Some(pos) = clients.clients.iter().position(|c| c.id == sel) else { return };
    if pos == 0 {
        if clients.clients.len() > 1 {
            clients.clients.swap(0, 1);
        }
    } else {
        let c = clients.clients.remove(pos);
        clients.clients.insert(0, c);
    }
    clients.renumber();
}

/// `toggleminimize` (spec.md 4.4): keeps non-minimized clients before
/// minimized ones in the spatial list; focus moves to the next
/// non-minimized client when the selection itself gets minimized.
fn toggle_minimize(clients: &mut ClientList) {
    let Some(sel) = clients.sel() else { return };
    let Some(pos) = clients.clients.iter().position(|c| c.id == sel) else { return };
    let was_minimized = clients.clients[pos].minimized;
    if !was_minimized {
        clients.clients[pos].minimized = true;
        let c = clients.clients.remove(pos);
        let first_minimized = clients.clients.iter().position(|x| x.minimized);
        let insert_at = first_minimized.unwrap_or(clients.clients.len());
        clients.clients.insert(insert_at, c);
    } else {
        clients.clients[pos].minimized = false;
    }
    clients.renumber();
    focus_next_nm(clients);
}

fn inc_nmaster(app: &mut App, arg: Option<&str>) {
    if matches!(app.screen.layout, LayoutKind::Fullscreen | LayoutKind::Grid) {
        return;
    }
    // Open Question #1 (SPEC_FULL.md section 9): dvtm.c's `if (args[0])`
    // branch is inverted relative to the correctly-written `setmfact` right
    // below it; the intended shape resets on *no* argument, not on one.
    match arg {
        None => app.screen.nmaster = DEFAULT_NMASTER,
        Some(s) => {
            if let Ok(delta) = s.parse::<i64>() {
                if s.starts_with('+') || s.starts_with('-') {
                    app.screen.nmaster = (app.screen.nmaster as i64 + delta).max(1) as usize;
                } else {
                    app.screen.nmaster = delta.max(1) as usize;
                }
            }
        }
    }
}

fn set_mfact(app: &mut App, arg: Option<&str>) {
    if matches!(app.screen.layout, LayoutKind::Fullscreen | LayoutKind::Grid) {
        return;
    }
    match arg {
        None => app.screen.mfact = DEFAULT_MFACT,
        Some(s) => {
            if let Ok(delta) = s.parse::<f32>() {
                let v = if s.starts_with('+') || s.starts_with('-') {
                    app.screen.mfact + delta
                } else {
                    delta
                };
                app.screen.mfact = v.clamp(0.1, 0.9);
            }
        }
    }
}

fn tag(app: &mut App, arg: Option<&str>) {
    let Some(name) = arg else { return };
    let Some(bit) = app.config.tag_bit(name) else { return };
    let Some(sel) = app.clients.sel() else { return };
    if let Some(c) = app.clients.get_mut(sel) {
        c.tags = bit;
    }
    app.clients.renumber();
}

fn tag_id(app: &mut App, id: Option<u32>) {
    let Some(id) = id else { return };
    let Some(sel) = app.clients.sel() else { return };
    if id as usize <= app.config.tags.len() && id >= 1 {
        if let Some(c) = app.clients.get_mut(sel) {
            c.tags = 1u32 << (id - 1);
        }
    }
    app.clients.renumber();
}

/// `toggletag`: per spec.md section 8 scenario 6, a no-op if the resulting
/// mask would be empty (a client may never end up tagless).
fn toggle_tag(app: &mut App, arg: Option<&str>) {
    let Some(name) = arg else { return };
    let Some(bit) = app.config.tag_bit(name) else { return };
    let Some(sel) = app.clients.sel() else { return };
    if let Some(c) = app.clients.get_mut(sel) {
        let new_mask = c.tags ^ bit;
        if new_mask != 0 {
            c.tags = new_mask;
        }
    }
    app.clients.renumber();
}

fn toggle_view(app: &mut App, arg: Option<&str>) {
    let Some(name) = arg else { return };
    let Some(bit) = app.config.tag_bit(name) else { return };
    let new_set = app.clients.current_tagset ^ bit;
    if new_set != 0 {
        app.clients.prev_tagset = app.clients.current_tagset;
        app.clients.current_tagset = new_set;
        app.clients.renumber();
    }
}

fn view(app: &mut App, arg: Option<&str>) {
    let Some(name) = arg else { return };
    let Some(bit) = app.config.tag_bit(name) else { return };
    app.clients.prev_tagset = app.clients.current_tagset;
    app.clients.current_tagset = bit;
    app.clients.renumber();
}

/// `viewprevtag`: round-trip property from spec.md section 8 —
/// `view(A); view(B); viewprevtag()` restores tagset to A.
fn view_prev_tag(app: &mut App) {
    std::mem::swap(&mut app.clients.current_tagset, &mut app.clients.prev_tagset);
    app.clients.renumber();
}

/// Command-FIFO line grammar (spec.md section 4.6 / external interfaces
/// section 6): `WS CMD (WS ARG)* WS? NL`, honoring `"`/`'` quoting and
/// `\\ \" \'` one-level escape collapse, up to `MAX_ARGS` arguments.
pub fn parse_fifo_line(line: &str) -> Option<(String, Vec<String>)> {
    let mut chars = line.trim_end_matches(['\r', '\n']).chars().peekable();
    skip_ws(&mut chars);
    let name = take_token(&mut chars)?;
    let mut args = Vec::new();
    loop {
        skip_ws(&mut chars);
        if chars.peek().is_none() {
            break;
        }
        if args.len() >= MAX_ARGS {
            break;
        }
        match take_token(&mut chars) {
            Some(tok) => args.push(tok),
            None => break,
        }
    }
    Some((name, args))
}

fn skip_ws(chars: &mut std::iter::Peekable<std::str::Chars>) {
    while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
        chars.next();
    }
}

fn take_token(chars: &mut std::iter::Peekable<std::str::Chars>) -> Option<String> {
    let quote = match chars.peek() {
        Some('"') => Some('"'),
        Some('\'') => Some('\''),
        _ => None,
    };
    if let Some(q) = quote {
        chars.next();
        let mut out = String::new();
        while let Some(&c) = chars.peek() {
            chars.next();
            if c == '\\' {
                if let Some(&next) = chars.peek() {
                    if next == '\\' || next == '"' || next == '\'' {
                        out.push(next);
                        chars.next();
                        continue;
                    }
                }
                out.push(c);
            } else if c == q {
                break;
            } else {
                out.push(c);
            }
        }
        Some(out)
    } else {
        let mut out = String::new();
        let mut any = false;
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                break;
            }
            any = true;
            chars.next();
            out.push(c);
        }
        if any {
            Some(out)
        } else {
            None
        }
    }
}

/// `startup` executes a configured list of (command, args) pairs at
/// launch, spec.md 4.4.
pub fn run_startup(app: &mut App) -> std::io::Result<()> {
    execute(app, Action::Startup, &[]).map(|_| ())
}

/// Flush bytes to a client's active PTY — the shared tail end of `paste`
/// and `send` (spec.md 4.4/4.5).
pub fn write_to_pty(term: &mut crate::client::Vt, bytes: &[u8]) -> std::io::Result<()> {
    term.write(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_line() {
        let (cmd, args) = parse_fifo_line("tag 2\n").unwrap();
        assert_eq!(cmd, "tag");
        assert_eq!(args, vec!["2"]);
    }

    #[test]
    fn parse_quoted_args() {
        let (cmd, args) = parse_fifo_line(r#"send "hello world" 'it''s'"#).unwrap();
        assert_eq!(cmd, "send");
        assert_eq!(args[0], "hello world");
    }

    #[test]
    fn parse_escaped_quote() {
        let (_, args) = parse_fifo_line(r#"send "a \"b\" c""#).unwrap();
        assert_eq!(args[0], "a \"b\" c");
    }

    #[test]
    fn excess_args_ignored() {
        let mut line = String::from("send");
        for i in 0..12 {
            line.push_str(&format!(" a{i}"));
        }
        let (_, args) = parse_fifo_line(&line).unwrap();
        assert_eq!(args.len(), MAX_ARGS);
    }

    #[test]
    fn blank_line_has_no_command() {
        assert!(parse_fifo_line("   \n").is_none());
    }

    #[test]
    fn action_from_name_round_trips_known_commands() {
        assert_eq!(Action::from_name("zoom"), Some(Action::Zoom));
        assert_eq!(Action::from_name("bogus"), None);
    }
}

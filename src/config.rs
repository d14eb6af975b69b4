//! The "compile-time configuration object" spec.md lists as an external
//! collaborator: tag names, layouts, key/mouse bindings, color rules, and
//! startup actions. Built once in `Config::default()` and overridden only
//! by the CLI flags spec.md section 6 names — there is no external config
//! file, matching the "closed set of commands" non-goal.

use crossterm::event::{KeyCode, KeyModifiers, MouseButton};

use crate::commands::Action;

pub const MAX_KEYS: usize = 3;
pub const MAX_ARGS: usize = 8;
pub const DEFAULT_MFACT: f32 = 0.5;
pub const DEFAULT_NMASTER: usize = 1;
pub const DEFAULT_SCROLLBACK: usize = 2000;

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Key(pub KeyCode, pub KeyModifiers);

/// A key binding: a chord (1..=MAX_KEYS keys) mapped to an action with
/// baked-in arguments (spec.md 4.4: "arguments baked at configuration").
#[derive(Clone)]
pub struct KeyBinding {
    pub chord: Vec<Key>,
    pub action: Action,
    pub args: Vec<String>,
}

#[derive(Clone)]
pub struct MouseBinding {
    pub button: MouseButton,
    pub action: Action,
    pub args: Vec<String>,
}

/// Substring-on-title color rule, spec.md 4.10.
#[derive(Clone)]
pub struct ColorRule {
    pub substr: String,
    pub fg: String,
    pub bg: String,
}

/// A command-FIFO entry (spec.md 4.6), kept in its own table distinct from
/// `bindings` — dvtm itself splits `keys[]` from a separate `commands[]`
/// table rather than resolving a FIFO line against the keymap. Args here
/// shadow a FIFO line's own arguments only when non-empty; since almost
/// none of dvtm's own `commands[]` entries bake in an argument, this table
/// is empty by default and every FIFO line's own arguments pass through.
#[derive(Clone)]
pub struct FifoCommand {
    pub action: Action,
    pub args: Vec<String>,
}

pub struct Config {
    pub tags: Vec<String>,
    pub bindings: Vec<KeyBinding>,
    pub mouse_bindings: Vec<MouseBinding>,
    pub fifo_commands: Vec<FifoCommand>,
    pub color_rules: Vec<ColorRule>,
    pub startup: Vec<(String, Vec<String>)>,
    pub mouse_enabled_default: bool,
    pub escape_delay_ms: u64,
    pub scrollback: usize,
    pub title: Option<String>,
    pub status_fifo: Option<String>,
    pub cmd_fifo: Option<String>,
}

fn ctrl(c: char) -> Key {
    Key(KeyCode::Char(c), KeyModifiers::CONTROL)
}

/// The placeholder chord every default binding starts with, substitutable
/// by `-m MOD` (spec.md section 6: "replace the modifier key in every
/// binding whose first key is the placeholder MOD").
pub const MOD_PLACEHOLDER: char = 'g';

impl Config {
    pub fn default_tags() -> Vec<String> {
        (1..=8).map(|i| i.to_string()).collect()
    }

    pub fn new() -> Self {
        let modk = ctrl(MOD_PLACEHOLDER);
        let mut bindings = Vec::new();
        let mut bind = |chord: Vec<Key>, action: Action, args: &[&str]| {
            bindings.push(KeyBinding { chord, action, args: args.iter().map(|s| s.to_string()).collect() });
        };

        bind(vec![modk, Key(KeyCode::Char('c'), KeyModifiers::NONE)], Action::Create, &[]);
        bind(vec![modk, Key(KeyCode::Char('x'), KeyModifiers::NONE)], Action::KillClient, &[]);
        bind(vec![modk, Key(KeyCode::Tab, KeyModifiers::NONE)], Action::FocusNext, &[]);
        bind(vec![modk, Key(KeyCode::BackTab, KeyModifiers::NONE)], Action::FocusPrev, &[]);
        bind(vec![modk, Key(KeyCode::Left, KeyModifiers::NONE)], Action::FocusLeft, &[]);
        bind(vec![modk, Key(KeyCode::Right, KeyModifiers::NONE)], Action::FocusRight, &[]);
        bind(vec![modk, Key(KeyCode::Up, KeyModifiers::NONE)], Action::FocusUp, &[]);
        bind(vec![modk, Key(KeyCode::Down, KeyModifiers::NONE)], Action::FocusDown, &[]);
        bind(vec![modk, ctrl('l')], Action::FocusLast, &[]);
        bind(vec![modk, Key(KeyCode::Char('o'), KeyModifiers::NONE)], Action::Zoom, &[]);
        bind(vec![modk, Key(KeyCode::Char('m'), KeyModifiers::NONE)], Action::ToggleMinimize, &[]);
        bind(vec![modk, Key(KeyCode::Char('t'), KeyModifiers::NONE)], Action::SetLayout, &["tile"]);
        bind(vec![modk, Key(KeyCode::Char('b'), KeyModifiers::NONE)], Action::SetLayout, &["bstack"]);
        bind(vec![modk, Key(KeyCode::Char('g'), KeyModifiers::CONTROL)], Action::SetLayout, &["grid"]);
        bind(vec![modk, Key(KeyCode::Char('f'), KeyModifiers::NONE)], Action::SetLayout, &["fullscreen"]);
        bind(vec![modk, Key(KeyCode::Char('i'), KeyModifiers::NONE)], Action::IncNMaster, &["+1"]);
        bind(vec![modk, Key(KeyCode::Char('d'), KeyModifiers::NONE)], Action::IncNMaster, &["-1"]);
        bind(vec![modk, Key(KeyCode::Char('h'), KeyModifiers::NONE)], Action::SetMfact, &["-0.05"]);
        bind(vec![modk, Key(KeyCode::Char('l'), KeyModifiers::NONE)], Action::SetMfact, &["+0.05"]);
        bind(vec![modk, Key(KeyCode::Char('v'), KeyModifiers::NONE)], Action::View, &[]);
        bind(vec![modk, Key(KeyCode::Char('B'), KeyModifiers::NONE)], Action::ToggleBar, &[]);
        bind(vec![modk, Key(KeyCode::Char('s'), KeyModifiers::CONTROL)], Action::ScrollBack, &[]);
        bind(vec![modk, Key(KeyCode::Char('['), KeyModifiers::NONE)], Action::CopyMode, &["pager"]);
        bind(vec![modk, Key(KeyCode::Char(']'), KeyModifiers::NONE)], Action::Paste, &[]);
        bind(vec![modk, Key(KeyCode::Char('q'), KeyModifiers::NONE)], Action::Quit, &[]);
        for n in 1..=8 {
            bind(
                vec![modk, Key(KeyCode::Char(std::char::from_digit(n, 10).unwrap()), KeyModifiers::NONE)],
                Action::View,
                &[&n.to_string()],
            );
        }

        let mouse_bindings = vec![
            MouseBinding { button: MouseButton::Left, action: Action::FocusId, args: vec![] },
        ];

        Config {
            tags: Self::default_tags(),
            bindings,
            mouse_bindings,
            fifo_commands: Vec::new(),
            color_rules: Vec::new(),
            startup: Vec::new(),
            mouse_enabled_default: false,
            escape_delay_ms: 300,
            scrollback: DEFAULT_SCROLLBACK,
            title: None,
            status_fifo: None,
            cmd_fifo: None,
        }
    }

    /// `-m MOD` per spec.md section 6: replace the modifier key in every
    /// binding whose first key is the placeholder.
    pub fn set_modifier(&mut self, modifier: Key) {
        for b in &mut self.bindings {
            if let Some(first) = b.chord.first_mut() {
                if *first == ctrl(MOD_PLACEHOLDER) {
                    *first = modifier;
                }
            }
        }
    }

    pub fn tag_bit(&self, name: &str) -> Option<u32> {
        self.tags.iter().position(|t| t == name).map(|i| 1u32 << i)
    }

    pub fn all_tags_mask(&self) -> u32 {
        if self.tags.len() >= 32 {
            u32::MAX
        } else {
            (1u32 << self.tags.len()) - 1
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `^x` CTRL(x) syntax from spec.md section 6's `-m MOD` grammar.
pub fn parse_mod_spec(spec: &str) -> Option<Key> {
    if let Some(rest) = spec.strip_prefix('^') {
        let c = rest.chars().next()?;
        return Some(Key(KeyCode::Char(c.to_ascii_lowercase()), KeyModifiers::CONTROL));
    }
    let mut chars = spec.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    Some(Key(KeyCode::Char(c), KeyModifiers::NONE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_bit_is_power_of_two() {
        let cfg = Config::new();
        assert_eq!(cfg.tag_bit("1"), Some(1));
        assert_eq!(cfg.tag_bit("2"), Some(2));
        assert_eq!(cfg.tag_bit("3"), Some(4));
        assert_eq!(cfg.tag_bit("nope"), None);
    }

    #[test]
    fn modifier_substitution_only_touches_placeholder() {
        let mut cfg = Config::new();
        cfg.set_modifier(ctrl('a'));
        for b in &cfg.bindings {
            assert_eq!(b.chord[0], ctrl('a'));
        }
    }

    #[test]
    fn parse_mod_spec_handles_ctrl_syntax() {
        assert_eq!(parse_mod_spec("^x"), Some(ctrl('x')));
        assert_eq!(parse_mod_spec("a"), Some(Key(KeyCode::Char('a'), KeyModifiers::NONE)));
        assert_eq!(parse_mod_spec("ab"), None);
    }
}

//! Color name parsing and the color-pair allocator described in spec.md
//! section 4.10 ("Color pipeline").

use ratatui::style::Color;

/// Map a color name/hex/index string to a ratatui `Color`. Supports named
/// colors, `colourN`/`colorN`, and `#RRGGBB`.
pub fn map_color(name: &str) -> Color {
    let name = name.trim();
    if let Some(hex) = name.strip_prefix('#') {
        if hex.len() == 6 {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return Color::Rgb(r, g, b);
            }
        }
    }
    let lower = name.to_lowercase();
    if let Some(idx_str) = lower.strip_prefix("colour").or_else(|| lower.strip_prefix("color")) {
        if let Ok(idx) = idx_str.parse::<u8>() {
            return Color::Indexed(idx);
        }
    }
    match lower.as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "brightblack" | "gray" | "grey" => Color::DarkGray,
        "brightred" => Color::LightRed,
        "brightgreen" => Color::LightGreen,
        "brightyellow" => Color::LightYellow,
        "brightblue" => Color::LightBlue,
        "brightmagenta" => Color::LightMagenta,
        "brightcyan" => Color::LightCyan,
        "brightwhite" => Color::White,
        _ => Color::Reset,
    }
}

/// Caches `(fg, bg)` pairs behind a stable index the way `init_pair()` /
/// `COLOR_PAIR()` would in a curses program, so the renderer looks up a
/// pair index once per color rule instead of re-resolving names per cell.
pub struct ColorPairTable {
    pairs: Vec<(Color, Color)>,
}

impl ColorPairTable {
    pub fn new() -> Self {
        ColorPairTable { pairs: Vec::new() }
    }

    /// Reserve a pair, returning its cached index (reusing an existing
    /// entry for the same tuple rather than growing unboundedly).
    pub fn alloc(&mut self, fg: Color, bg: Color) -> usize {
        if let Some(idx) = self.pairs.iter().position(|p| *p == (fg, bg)) {
            return idx;
        }
        self.pairs.push((fg, bg));
        self.pairs.len() - 1
    }
}

impl Default for ColorPairTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_color_named() {
        assert_eq!(map_color("red"), Color::Red);
        assert_eq!(map_color("color9"), Color::Indexed(9));
    }

    #[test]
    fn map_color_hex() {
        assert_eq!(map_color("#ff00ff"), Color::Rgb(0xff, 0x00, 0xff));
    }

    #[test]
    fn color_pair_dedups() {
        let mut t = ColorPairTable::new();
        let a = t.alloc(Color::Red, Color::Black);
        let b = t.alloc(Color::Green, Color::Black);
        let c = t.alloc(Color::Red, Color::Black);
        assert_eq!(a, c);
        assert_ne!(a, b);
    }
}

//! L5 LayoutEngine — four pure layout functions from `(visible clients,
//! work area, nmaster, mfact)` to per-client `(x, y, w, h)`, plus the
//! minimized-strip reservation and bar-autohide rule from spec.md 4.2.
//!
//! Grounded on the teacher's `tree.rs` split-ratio geometry walk (the same
//! "divide a rect by a fraction, recurse on the remainder" shape), adapted
//! from a binary split tree to the four named layouts spec.md requires.

use crate::client::ClientId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutKind {
    Tile,
    Bstack,
    Grid,
    Fullscreen,
}

impl LayoutKind {
    pub fn from_symbol(s: &str) -> Option<LayoutKind> {
        Some(match s {
            "tile" => LayoutKind::Tile,
            "bstack" => LayoutKind::Bstack,
            "grid" => LayoutKind::Grid,
            "fullscreen" => LayoutKind::Fullscreen,
            _ => return None,
        })
    }

    pub fn symbol(self) -> &'static str {
        match self {
            LayoutKind::Tile => "[]=",
            LayoutKind::Bstack => "TTT",
            LayoutKind::Grid => "+++",
            LayoutKind::Fullscreen => "[ ]",
        }
    }

    /// Cycle order used by the unparameterized `setlayout` binding.
    pub fn next(self) -> LayoutKind {
        match self {
            LayoutKind::Tile => LayoutKind::Bstack,
            LayoutKind::Bstack => LayoutKind::Grid,
            LayoutKind::Grid => LayoutKind::Fullscreen,
            LayoutKind::Fullscreen => LayoutKind::Tile,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub w: u16,
    pub h: u16,
}

impl Rect {
    pub fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }
}

/// Input the layout engine needs per visible client; deliberately a plain
/// tuple-ish struct rather than borrowing `Client` so the engine stays a
/// pure function of geometry, independent of VT/process state.
#[derive(Clone, Copy)]
pub struct Tile {
    pub id: ClientId,
    pub minimized: bool,
}

/// Top-level entry point: `compute` — the only function `app.rs` calls to
/// rearrange. Returns one `(ClientId, Rect)` per visible client, in the
/// input order.
pub fn compute(kind: LayoutKind, tiles: &[Tile], area: Rect, nmaster: usize, mfact: f32) -> Vec<(ClientId, Rect)> {
    if tiles.is_empty() {
        return Vec::new();
    }

    if kind == LayoutKind::Fullscreen {
        return tiles.iter().map(|t| (t.id, area)).collect();
    }

    let any_minimized = tiles.iter().any(|t| t.minimized);
    let (main_area, strip_area) = if any_minimized && area.h > 0 {
        (
            Rect { x: area.x, y: area.y, w: area.w, h: area.h - 1 },
            Some(Rect { x: area.x, y: area.y + area.h - 1, w: area.w, h: 1 }),
        )
    } else {
        (area, None)
    };

    let main: Vec<Tile> = tiles.iter().copied().filter(|t| !t.minimized).collect();
    let minimized: Vec<Tile> = tiles.iter().copied().filter(|t| t.minimized).collect();

    let mut out = match kind {
        LayoutKind::Tile => tile_layout(&main, main_area, nmaster, mfact),
        LayoutKind::Bstack => bstack_layout(&main, main_area, nmaster, mfact),
        LayoutKind::Grid => grid_layout(&main, main_area),
        LayoutKind::Fullscreen => unreachable!(),
    };

    if let Some(strip) = strip_area {
        out.extend(minimized_strip_layout(&minimized, strip));
    }
    out
}

fn split_counts(total: usize, nmaster: usize) -> (usize, usize) {
    let m = nmaster.min(total);
    (m, total - m)
}

/// Vertical master stack: master column of width `floor(waw * mfact)`,
/// stack column to its right. Either column's rows absorb remainder height
/// into the last tile when it doesn't divide evenly.
fn tile_layout(tiles: &[Tile], area: Rect, nmaster: usize, mfact: f32) -> Vec<(ClientId, Rect)> {
    let (mcount, scount) = split_counts(tiles.len(), nmaster);
    let mw = if scount == 0 { area.w } else { ((area.w as f32) * mfact) as u16 };
    let mut out = Vec::with_capacity(tiles.len());

    stack_row(&tiles[..mcount], Rect { x: area.x, y: area.y, w: mw, h: area.h }, &mut out, false);
    if scount > 0 {
        let sx = area.x + mw;
        let sw = area.w.saturating_sub(mw);
        stack_row(&tiles[mcount..], Rect { x: sx, y: area.y, w: sw, h: area.h }, &mut out, false);
    }
    out
}

/// Horizontal master band on top, stack band below.
fn bstack_layout(tiles: &[Tile], area: Rect, nmaster: usize, mfact: f32) -> Vec<(ClientId, Rect)> {
    let (mcount, scount) = split_counts(tiles.len(), nmaster);
    let mh = if scount == 0 { area.h } else { ((area.h as f32) * mfact) as u16 };
    let mut out = Vec::with_capacity(tiles.len());

    stack_row(&tiles[..mcount], Rect { x: area.x, y: area.y, w: area.w, h: mh }, &mut out, true);
    if scount > 0 {
        let sy = area.y + mh;
        let sh = area.h.saturating_sub(mh);
        stack_row(&tiles[mcount..], Rect { x: area.x, y: sy, w: area.w, h: sh }, &mut out, true);
    }
    out
}

/// Lay `tiles` out across `area`, either as equal-height rows stacked
/// vertically (`horizontal = false`) or equal-width columns stacked
/// horizontally (`horizontal = true`); the last tile absorbs any
/// remainder.
fn stack_row(tiles: &[Tile], area: Rect, out: &mut Vec<(ClientId, Rect)>, horizontal: bool) {
    if tiles.is_empty() {
        return;
    }
    let n = tiles.len() as u16;
    if horizontal {
        let w = area.w / n;
        let mut x = area.x;
        for (i, t) in tiles.iter().enumerate() {
            let this_w = if i + 1 == tiles.len() { area.x + area.w - x } else { w };
            out.push((t.id, Rect { x, y: area.y, w: this_w, h: area.h }));
            x += this_w;
        }
    } else {
        let h = area.h / n;
        let mut y = area.y;
        for (i, t) in tiles.iter().enumerate() {
            let this_h = if i + 1 == tiles.len() { area.y + area.h - y } else { h };
            out.push((t.id, Rect { x: area.x, y, w: area.w, h: this_h }));
            y += this_h;
        }
    }
}

/// `⌈√n⌉` columns × `⌈n/cols⌉` rows, left-to-right top-to-bottom, the last
/// row absorbing remainder columns (spec.md 4.2).
fn grid_layout(tiles: &[Tile], area: Rect) -> Vec<(ClientId, Rect)> {
    let n = tiles.len();
    if n == 0 {
        return Vec::new();
    }
    let cols = (n as f64).sqrt().ceil() as usize;
    let rows = (n + cols - 1) / cols;
    let cell_w = area.w / cols as u16;
    let cell_h = area.h / rows as u16;

    let mut out = Vec::with_capacity(n);
    for (i, t) in tiles.iter().enumerate() {
        let row = i / cols;
        let col = i % cols;
        let is_last_row = row + 1 == rows;
        let cols_in_row = if is_last_row { n - row * cols } else { cols };
        let w = if col + 1 == cols_in_row {
            area.w - cell_w * (cols_in_row as u16 - 1)
        } else {
            cell_w
        };
        let h = if is_last_row { area.h - cell_h * row as u16 } else { cell_h };
        out.push((
            t.id,
            Rect { x: area.x + cell_w * col as u16, y: area.y + cell_h * row as u16, w, h },
        ));
    }
    out
}

/// Minimized strip: horizontal, each client `waw / m` wide, last absorbs
/// remainder (spec.md 4.2).
fn minimized_strip_layout(tiles: &[Tile], area: Rect) -> Vec<(ClientId, Rect)> {
    let mut out = Vec::with_capacity(tiles.len());
    stack_row(tiles, area, &mut out, true);
    out
}

/// Bar autohide (spec.md 4.2): hidden when `autohide` is set, the bar has
/// no fd of its own (`fd == -1`), and at most one client is visible.
pub fn bar_should_hide(autohide: bool, bar_fd_open: bool, visible_count: usize) -> bool {
    autohide && !bar_fd_open && visible_count <= 1
}

/// Directional focus lookup (spec.md 4.4): step one cell outside the
/// current tile toward `dir` (with a `+1` x offset on up/down to skip the
/// vertical gutter between tiles), then a point-in-rect lookup against
/// every other visible tile's rect. Returns `None` on a miss, in which
/// case the caller falls back to list-order `focusprev`/`focusnext`.
pub fn focus_in_direction(current: Rect, dir: Direction, others: &[(ClientId, Rect)]) -> Option<ClientId> {
    if matches!(dir, Direction::Up) && current.y == 0 {
        return None;
    }
    if matches!(dir, Direction::Left) && current.x == 0 {
        return None;
    }

    let mut px = match dir {
        Direction::Up | Direction::Down => current.x,
        Direction::Left => current.x - 1,
        Direction::Right => current.x + current.w,
    };
    let py = match dir {
        Direction::Up => current.y - 1,
        Direction::Down => current.y + current.h,
        Direction::Left | Direction::Right => current.y,
    };
    if matches!(dir, Direction::Up | Direction::Down) {
        px = px.saturating_add(1);
    }
    others.iter().find(|(_, r)| r.contains(px, py)).map(|(id, _)| *id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiles(ids: &[u32]) -> Vec<Tile> {
        ids.iter().map(|&id| Tile { id, minimized: false }).collect()
    }

    #[test]
    fn tile_layout_splits_master_and_stack() {
        let area = Rect { x: 0, y: 0, w: 100, h: 20 };
        let out = compute(LayoutKind::Tile, &tiles(&[1, 2, 3]), area, 1, 0.5);
        assert_eq!(out.len(), 3);
        let master = out.iter().find(|(id, _)| *id == 1).unwrap().1;
        assert_eq!(master.w, 50);
        assert_eq!(master.h, 20);
        let second = out.iter().find(|(id, _)| *id == 2).unwrap().1;
        assert_eq!(second.x, 50);
    }

    #[test]
    fn bstack_layout_splits_top_and_bottom() {
        let area = Rect { x: 0, y: 0, w: 80, h: 24 };
        let out = compute(LayoutKind::Bstack, &tiles(&[1, 2]), area, 1, 0.5);
        let master = out.iter().find(|(id, _)| *id == 1).unwrap().1;
        assert_eq!(master.y, 0);
        assert_eq!(master.h, 12);
        let stack = out.iter().find(|(id, _)| *id == 2).unwrap().1;
        assert_eq!(stack.y, 12);
    }

    #[test]
    fn grid_layout_uses_ceil_sqrt_columns() {
        let area = Rect { x: 0, y: 0, w: 90, h: 60 };
        let out = compute(LayoutKind::Grid, &tiles(&[1, 2, 3, 4, 5]), area, 1, 0.5);
        assert_eq!(out.len(), 5);
        // ceil(sqrt(5)) == 3 columns, 2 rows; last row has 2 columns.
        let last = out.iter().find(|(id, _)| *id == 5).unwrap().1;
        assert_eq!(last.y, 30);
    }

    #[test]
    fn fullscreen_gives_every_tile_the_full_area() {
        let area = Rect { x: 0, y: 0, w: 80, h: 24 };
        let out = compute(LayoutKind::Fullscreen, &tiles(&[1, 2, 3]), area, 1, 0.5);
        for (_, r) in &out {
            assert_eq!(*r, area);
        }
    }

    #[test]
    fn minimized_reserves_bottom_row() {
        let area = Rect { x: 0, y: 0, w: 80, h: 24 };
        let mut ts = tiles(&[1, 2]);
        ts.push(Tile { id: 3, minimized: true });
        let out = compute(LayoutKind::Tile, &ts, area, 1, 0.5);
        let strip = out.iter().find(|(id, _)| *id == 3).unwrap().1;
        assert_eq!(strip.y, 23);
        assert_eq!(strip.h, 1);
        let main = out.iter().find(|(id, _)| *id == 1).unwrap().1;
        assert_eq!(main.h, 23);
    }

    #[test]
    fn bar_autohide_rule() {
        assert!(bar_should_hide(true, false, 1));
        assert!(!bar_should_hide(true, false, 2));
        assert!(!bar_should_hide(true, true, 1));
        assert!(!bar_should_hide(false, false, 1));
    }

    #[test]
    fn focus_direction_finds_right_neighbor() {
        let current = Rect { x: 0, y: 0, w: 40, h: 24 };
        let neighbor = Rect { x: 40, y: 0, w: 40, h: 24 };
        let others = vec![(2u32, neighbor)];
        assert_eq!(focus_in_direction(current, Direction::Right, &others), Some(2));
    }

    #[test]
    fn focus_direction_misses_at_screen_edge() {
        let current = Rect { x: 0, y: 0, w: 40, h: 24 };
        assert_eq!(focus_in_direction(current, Direction::Left, &[]), None);
    }
}

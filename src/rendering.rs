//! L11 Renderer — border/title drawing, content blit, and draw ordering per
//! spec.md 4.10: fullscreen draws only `sel`; otherwise every non-selected
//! visible client, then `sel` last so the cursor lands in it.
//!
//! Grounded on the teacher's `render_node` (per-cell vt100 attribute/color
//! translation into ratatui `Span`s, `Clear` + `Paragraph` blit, cursor
//! placement) in the old `rendering.rs`, adapted from a split-tree walk to a
//! flat list of already-computed client rects (`app.screen.rects`).

use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Clear, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::client::ClientId;
use crate::layout::{LayoutKind, Rect as LRect};
use crate::statusbar::{tag_attr, BarPos, TagAttr};

pub fn vt_to_color(c: vt100::Color) -> Color {
    match c {
        vt100::Color::Default => Color::Reset,
        vt100::Color::Idx(i) => Color::Indexed(i),
        vt100::Color::Rgb(r, g, b) => Color::Rgb(r, g, b),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Attr {
    Normal,
    Selected,
    Urgent,
}

fn attr_for(app: &App, id: ClientId, selected: bool) -> Attr {
    let Some(c) = app.clients.get(id) else { return Attr::Normal };
    if c.urgent && !selected {
        Attr::Urgent
    } else if selected || (app.runinall && !c.minimized) {
        Attr::Selected
    } else {
        Attr::Normal
    }
}

fn to_ratatui_rect(r: LRect) -> Rect {
    Rect { x: r.x, y: r.y, width: r.w.max(1), height: r.h.max(1) }
}

/// `draw_all()` (spec.md 4.10): the only entry point the event loop calls
/// each tick.
pub fn draw_all(f: &mut Frame, app: &mut App, area: Rect) {
    if app.bar.is_visible() {
        draw_bar(f, app, area);
    }

    let fullscreen = app.screen.layout == LayoutKind::Fullscreen;
    let sel = app.clients.sel();
    let rects = app.screen.rects.clone();

    for &(id, r) in &rects {
        if Some(id) == sel {
            continue;
        }
        if fullscreen {
            continue;
        }
        draw_client(f, app, id, r, false);
    }
    if let Some(sel_id) = sel {
        if let Some(&(_, r)) = rects.iter().find(|(id, _)| *id == sel_id) {
            draw_client(f, app, sel_id, r, true);
        }
    }
}

fn draw_client(f: &mut Frame, app: &mut App, id: ClientId, r: LRect, selected: bool) {
    let rect = to_ratatui_rect(r);
    let Some((title, has_title_line, order, minimized, cursor_visible, cursor_pos, rows, cols)) = ({
        app.clients.get(id).map(|c| {
            let cursor_pos = c.term().parser.lock().unwrap().screen().cursor_position();
            (
                c.display_title(rect.width.saturating_sub(6) as usize),
                c.has_title_line,
                c.order,
                c.minimized,
                c.cursor_visible(),
                cursor_pos,
                c.term().rows,
                c.term().cols,
            )
        })
    }) else {
        return;
    };

    let attr = attr_for(app, id, selected);
    let mut content_rect = rect;
    if has_title_line && rect.height > 0 {
        let style = border_style(app, &title, attr);
        draw_title_row(f, rect, &title, order, style);
        content_rect = Rect { x: rect.x, y: rect.y + 1, width: rect.width, height: rect.height.saturating_sub(1) };
    }

    draw_content(f, app, id, content_rect);

    if selected && cursor_visible && !minimized && content_rect.height > 0 {
        let (cr, cc) = cursor_pos;
        let cx = content_rect.x + cc.min(cols.saturating_sub(1));
        let cy = content_rect.y + cr.min(rows.saturating_sub(1));
        f.set_cursor(cx, cy);
    }
}

/// Attribute precedence (spec.md 4.10): URGENT_ATTR (urgent, not selected),
/// SELECTED_ATTR (selected or broadcast-on-and-not-minimized), NORMAL_ATTR
/// otherwise; then a color rule (substring match on title) overrides the
/// fg/bg if one matches.
fn border_style(app: &mut App, title: &str, attr: Attr) -> Style {
    let mut style = match attr {
        Attr::Urgent => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        Attr::Selected => Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED),
        Attr::Normal => Style::default(),
    };
    let rule = app.config.color_rules.iter().find(|r| title.contains(r.substr.as_str())).cloned();
    if let Some(rule) = rule {
        let fg = crate::style::map_color(&rule.fg);
        let bg = crate::style::map_color(&rule.bg);
        app.colors.alloc(fg, bg);
        style = style.fg(fg).bg(bg);
    }
    style
}

/// Horizontal rule with `"[title | #order]"` overlaid starting at column 2
/// (spec.md 4.10).
fn draw_title_row(f: &mut Frame, rect: Rect, title: &str, order: usize, style: Style) {
    let width = rect.width as usize;
    let label = format!("[{title} | #{order}]");
    let mut rule: Vec<char> = std::iter::repeat('─').take(width).collect();
    let start = 2.min(width);
    for (i, ch) in label.chars().enumerate() {
        if start + i >= width {
            break;
        }
        rule[start + i] = ch;
    }
    let text: String = rule.into_iter().collect();
    let title_rect = Rect { x: rect.x, y: rect.y, width: rect.width, height: 1 };
    f.render_widget(Clear, title_rect);
    f.render_widget(Paragraph::new(Line::from(Span::styled(text, style))), title_rect);
}

fn draw_content(f: &mut Frame, app: &App, id: ClientId, rect: Rect) {
    let Some(c) = app.clients.get(id) else { return };
    let parser = c.term().parser.lock().unwrap();
    let screen = parser.screen();
    let mut lines: Vec<Line> = Vec::with_capacity(rect.height as usize);
    for row in 0..rect.height {
        let mut spans: Vec<Span> = Vec::with_capacity(rect.width as usize);
        let mut col = 0u16;
        while col < rect.width {
            if let Some(cell) = screen.cell(row, col) {
                let mut fg = vt_to_color(cell.fgcolor());
                let mut bg = vt_to_color(cell.bgcolor());
                if cell.inverse() {
                    std::mem::swap(&mut fg, &mut bg);
                }
                let mut style = Style::default().fg(fg).bg(bg);
                if cell.bold() {
                    style = style.add_modifier(Modifier::BOLD);
                }
                if cell.italic() {
                    style = style.add_modifier(Modifier::ITALIC);
                }
                if cell.underline() {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }
                let text = cell.contents().to_string();
                let w = UnicodeWidthStr::width(text.as_str()) as u16;
                if w == 0 {
                    spans.push(Span::styled(" ", style));
                    col += 1;
                } else if w >= 2 {
                    spans.push(Span::styled(text, style));
                    col += 2;
                } else {
                    spans.push(Span::styled(text, style));
                    col += 1;
                }
            } else {
                spans.push(Span::raw(" "));
                col += 1;
            }
        }
        lines.push(Line::from(spans));
    }
    drop(parser);
    f.render_widget(Clear, rect);
    f.render_widget(Paragraph::new(Text::from(lines)), rect);
}

/// Tag indicators, layout symbol (broadcast-highlighted), right-aligned
/// status text (spec.md 4.8).
fn draw_bar(f: &mut Frame, app: &mut App, area: Rect) {
    let y = if matches!(app.bar.pos, BarPos::Top) { area.y } else { area.y + area.height.saturating_sub(1) };
    let bar_rect = Rect { x: area.x, y, width: area.width, height: 1 };

    let mut spans: Vec<Span> = Vec::new();
    for (i, tag) in app.config.tags.iter().enumerate() {
        let bit = 1u32 << i;
        let is_current = app.clients.current_tagset & bit != 0;
        let has_any = app.clients.clients.iter().any(|c| c.tags & bit != 0);
        let has_urgent = app.clients.clients.iter().any(|c| c.tags & bit != 0 && c.urgent);
        let style = match tag_attr(is_current, has_urgent, has_any) {
            TagAttr::Sel => Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD),
            TagAttr::Urgent => Style::default().fg(Color::Red),
            TagAttr::Occupied => Style::default().add_modifier(Modifier::BOLD),
            TagAttr::Normal => Style::default(),
        };
        spans.push(Span::styled(format!(" {tag} "), style));
    }
    let layout_style = if app.runinall { Style::default().add_modifier(Modifier::REVERSED) } else { Style::default() };
    spans.push(Span::styled(format!(" {} ", app.screen.layout.symbol()), layout_style));

    let used: usize = spans.iter().map(|s| UnicodeWidthStr::width(s.content.as_ref())).sum();
    let remaining = (area.width as usize).saturating_sub(used).saturating_sub(2);
    let right = crate::statusbar::format_right_aligned(&app.bar.text, remaining);
    spans.push(Span::raw(right));

    f.render_widget(Clear, bar_rect);
    f.render_widget(Paragraph::new(Line::from(spans)), bar_rect);
}

//! Terminal renderings of a grid.

use std::borrow::Cow;
use std::fmt::Write as _;

use crossterm::style::Color as TermColor;
use crossterm::style::Stylize;
use crossterm::style::style;
use place_domain::Color;
use place_domain::Grid;

const CELL_WIDTH: usize = 7;

/// One line per row of color strings, with row and column indices.
pub fn render_plain(grid: &Grid) -> String {
    let mut out = String::new();
    out.push_str("   ");
    for col in 0..grid.size() {
        let _ = write!(out, " {col:<CELL_WIDTH$}");
    }
    out.truncate(out.trim_end().len());
    out.push('\n');
    for (row, cells) in grid.rows().enumerate() {
        let _ = write!(out, "{row:>2} ");
        let line = cells
            .iter()
            .map(|color| format!("{:<CELL_WIDTH$}", printable(color.as_str())))
            .collect::<Vec<_>>()
            .join(" ");
        out.push(' ');
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Two-column true-color blocks per cell.
pub fn render_blocks(grid: &Grid) -> String {
    let mut out = String::from("   ");
    for col in 0..grid.size() {
        let _ = write!(out, "{col:<2}");
    }
    out.push('\n');
    for (row, cells) in grid.rows().enumerate() {
        let _ = write!(out, "{row:>2} ");
        for color in cells {
            out.push_str(&swatch(color));
        }
        out.push('\n');
    }
    out
}

pub fn render_grid(grid: &Grid, color: bool) -> String {
    if color {
        render_blocks(grid)
    } else {
        render_plain(grid)
    }
}

/// Escapes control characters, so text that came from the server can't
/// move the cursor, clear the screen or retitle the terminal.
pub fn printable(text: &str) -> Cow<'_, str> {
    if !text.chars().any(char::is_control) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        if ch.is_control() {
            out.extend(ch.escape_default());
        } else {
            out.push(ch);
        }
    }
    Cow::Owned(out)
}

/// A colored two-cell block. Colors that are not hex notation get a
/// dark grey "??" so they stay visible.
pub fn swatch(color: &Color) -> String {
    match color.rgb() {
        Some((r, g, b)) => style("  ").on(TermColor::Rgb { r, g, b }).to_string(),
        None => style("??").with(TermColor::White).on(TermColor::DarkGrey).to_string(),
    }
}

//! Client-side color palette.

use crate::domain::grid::Color;

pub const PALETTE: [&str; 10] = [
    "#ffffff", "#000000", "#ff0000", "#00ff00", "#0000ff", "#ffff00", "#ff00ff", "#00ffff",
    "#ffa500", "#800080",
];

/// Index into [`PALETTE`] selected before the user picks a color.
pub const DEFAULT_PALETTE_INDEX: usize = 2;

pub fn default_paint_color() -> Color {
    Color::new(PALETTE[DEFAULT_PALETTE_INDEX])
}

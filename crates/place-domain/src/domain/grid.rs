//! Grid, cell coordinate and color types.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;
use thiserror::Error;

/// Width and height of the canvas. Fixed for the process lifetime.
pub const GRID_SIZE: usize = 10;

/// Fill color of a freshly created grid.
pub const DEFAULT_COLOR: &str = "#ffffff";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("Invalid coordinates: ({row}, {col}) is outside 0..{size}", size = GRID_SIZE)]
    InvalidCoordinates { row: i64, col: i64 },
    #[error("Grid must have {expected} rows, got {actual}")]
    RowCount { expected: usize, actual: usize },
    #[error("Grid row {row} must have {expected} cells, got {actual}")]
    RowLength {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// An opaque color token.
///
/// The store accepts any string; only renderers try to interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interprets `#rrggbb` or `#rgb` (case-insensitive).
    pub fn rgb(&self) -> Option<(u8, u8, u8)> {
        let hex = self.0.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        match hex.len() {
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some((r, g, b))
            }
            3 => {
                let expand = |digit: &str| u8::from_str_radix(digit, 16).ok().map(|v| v * 17);
                Some((expand(&hex[0..1])?, expand(&hex[1..2])?, expand(&hex[2..3])?))
            }
            _ => None,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new(DEFAULT_COLOR)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Color {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Color {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Color {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A validated `(row, col)` pair, both in `0..GRID_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    row: usize,
    col: usize,
}

impl CellCoord {
    /// Validates signed input so negative coordinates are reported rather than wrapped.
    pub fn try_new(row: i64, col: i64) -> Result<Self, GridError> {
        let in_range = |v: i64| usize::try_from(v).ok().filter(|v| *v < GRID_SIZE);
        match (in_range(row), in_range(col)) {
            (Some(r), Some(c)) => Ok(Self { row: r, col: c }),
            _ => Err(GridError::InvalidCoordinates { row, col }),
        }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The `GRID_SIZE` x `GRID_SIZE` matrix of cell colors, row-major.
///
/// Serializes as a JSON array of rows. Deserialization rejects any other shape,
/// so a `Grid` value always has the fixed dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<Vec<Color>>")]
pub struct Grid {
    cells: Vec<Vec<Color>>,
}

impl Grid {
    pub fn new() -> Self {
        Self::filled(Color::default())
    }

    pub fn filled(color: impl Into<Color>) -> Self {
        let color = color.into();
        Self {
            cells: vec![vec![color; GRID_SIZE]; GRID_SIZE],
        }
    }

    pub fn size(&self) -> usize {
        GRID_SIZE
    }

    pub fn get(&self, coord: CellCoord) -> &Color {
        &self.cells[coord.row][coord.col]
    }

    /// Sets one cell and returns the color it replaced.
    pub fn paint(&mut self, coord: CellCoord, color: impl Into<Color>) -> Color {
        std::mem::replace(&mut self.cells[coord.row][coord.col], color.into())
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Color]> {
        self.cells.iter().map(Vec::as_slice)
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for Grid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.cells.serialize(serializer)
    }
}

impl TryFrom<Vec<Vec<Color>>> for Grid {
    type Error = GridError;

    fn try_from(cells: Vec<Vec<Color>>) -> Result<Self, Self::Error> {
        if cells.len() != GRID_SIZE {
            return Err(GridError::RowCount {
                expected: GRID_SIZE,
                actual: cells.len(),
            });
        }
        if let Some((row, cols)) = cells
            .iter()
            .enumerate()
            .find(|(_, cols)| cols.len() != GRID_SIZE)
        {
            return Err(GridError::RowLength {
                row,
                expected: GRID_SIZE,
                actual: cols.len(),
            });
        }
        Ok(Self { cells })
    }
}

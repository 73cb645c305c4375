pub mod grid;
pub mod palette;

pub use grid::CellCoord;
pub use grid::Color;
pub use grid::DEFAULT_COLOR;
pub use grid::GRID_SIZE;
pub use grid::Grid;
pub use grid::GridError;
pub use palette::DEFAULT_PALETTE_INDEX;
pub use palette::PALETTE;
pub use palette::default_paint_color;

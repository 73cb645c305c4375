mod grid;
pub mod ports;

pub use grid::{
    PaintCellUseCase, PaintCellUseCaseImpl, PaintInput, ReadGridUseCase, ReadGridUseCaseImpl,
    WatchGridUseCase, WatchGridUseCaseImpl,
};

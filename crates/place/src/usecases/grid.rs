use std::sync::Arc;

use place_domain::CellCoord;
use place_domain::Color;
use place_domain::GridError;
use tracing::debug;

use crate::usecases::ports::CanvasRepository;
use crate::usecases::ports::CanvasSnapshot;
use crate::usecases::ports::GridSubscription;

/// Raw write request; coordinates are unvalidated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaintInput {
    pub row: i64,
    pub col: i64,
    pub color: Color,
}

pub trait ReadGridUseCase: Send + Sync {
    fn execute(&self) -> CanvasSnapshot;
}

pub struct ReadGridUseCaseImpl<R: CanvasRepository> {
    repository: Arc<R>,
}

impl<R: CanvasRepository> ReadGridUseCaseImpl<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

impl<R: CanvasRepository> ReadGridUseCase for ReadGridUseCaseImpl<R> {
    fn execute(&self) -> CanvasSnapshot {
        self.repository.snapshot()
    }
}

pub trait PaintCellUseCase: Send + Sync {
    fn execute(&self, input: PaintInput) -> Result<CanvasSnapshot, GridError>;
}

pub struct PaintCellUseCaseImpl<R: CanvasRepository> {
    repository: Arc<R>,
}

impl<R: CanvasRepository> PaintCellUseCaseImpl<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

impl<R: CanvasRepository> PaintCellUseCase for PaintCellUseCaseImpl<R> {
    #[tracing::instrument(skip(self, input), fields(row = input.row, col = input.col, color = %input.color))]
    fn execute(&self, input: PaintInput) -> Result<CanvasSnapshot, GridError> {
        let coord = CellCoord::try_new(input.row, input.col)?;
        let snapshot = self.repository.paint(coord, input.color);
        debug!(revision = snapshot.revision, "Cell painted");
        Ok(snapshot)
    }
}

pub trait WatchGridUseCase: Send + Sync {
    fn execute(&self) -> GridSubscription;
}

pub struct WatchGridUseCaseImpl<R: CanvasRepository> {
    repository: Arc<R>,
}

impl<R: CanvasRepository> WatchGridUseCaseImpl<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

impl<R: CanvasRepository> WatchGridUseCase for WatchGridUseCaseImpl<R> {
    fn execute(&self) -> GridSubscription {
        self.repository.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockCanvasRepository;
    use place_domain::Grid;

    fn paint(row: i64, col: i64, color: &str) -> PaintInput {
        PaintInput {
            row,
            col,
            color: Color::new(color),
        }
    }

    #[test]
    fn test_read_returns_repository_snapshot() {
        let mut grid = Grid::new();
        grid.paint(CellCoord::try_new(2, 2).unwrap(), "#000000");
        let repo = Arc::new(MockCanvasRepository::with_grid(grid.clone()));
        let usecase = ReadGridUseCaseImpl::new(Arc::clone(&repo));

        let snapshot = usecase.execute();

        assert_eq!(snapshot.grid, grid);
        assert_eq!(snapshot.revision, 0);
    }

    #[test]
    fn test_paint_forwards_validated_coord() {
        let repo = Arc::new(MockCanvasRepository::new());
        let usecase = PaintCellUseCaseImpl::new(Arc::clone(&repo));

        let snapshot = usecase.execute(paint(9, 9, "#0000ff")).unwrap();

        let coord = CellCoord::try_new(9, 9).unwrap();
        assert_eq!(snapshot.grid.get(coord).as_str(), "#0000ff");
        assert_eq!(snapshot.revision, 1);
        assert_eq!(repo.paints(), vec![(coord, Color::new("#0000ff"))]);
    }

    #[test]
    fn test_paint_rejects_out_of_range_without_touching_repository() {
        let repo = Arc::new(MockCanvasRepository::new());
        let usecase = PaintCellUseCaseImpl::new(Arc::clone(&repo));

        let err = usecase.execute(paint(10, 0, "#0000ff")).unwrap_err();

        assert_eq!(err, GridError::InvalidCoordinates { row: 10, col: 0 });
        assert!(repo.paints().is_empty());
        assert_eq!(repo.revision(), 0);
    }

    #[tokio::test]
    async fn test_watch_wakes_on_paint() {
        let repo = Arc::new(MockCanvasRepository::new());
        let watch = WatchGridUseCaseImpl::new(Arc::clone(&repo));
        let painter = PaintCellUseCaseImpl::new(Arc::clone(&repo));
        let mut subscription = watch.execute();
        assert_eq!(subscription.seen(), 0);

        painter.execute(paint(0, 0, "#ff0000")).unwrap();

        assert!(subscription.changed().await);
        assert_eq!(subscription.seen(), 1);
    }
}

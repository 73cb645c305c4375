use std::sync::Arc;

use crate::usecases::PaintCellUseCase;
use crate::usecases::PaintCellUseCaseImpl;
use crate::usecases::ReadGridUseCase;
use crate::usecases::ReadGridUseCaseImpl;
use crate::usecases::WatchGridUseCase;
use crate::usecases::WatchGridUseCaseImpl;
use crate::usecases::ports::CanvasRepository;

/// Use cases the HTTP API dispatches to, all sharing one canvas.
#[derive(Clone)]
pub(crate) struct GridUseCases {
    pub read_grid: Arc<dyn ReadGridUseCase>,
    pub paint_cell: Arc<dyn PaintCellUseCase>,
    pub watch_grid: Arc<dyn WatchGridUseCase>,
}

impl GridUseCases {
    pub fn new<R: CanvasRepository + 'static>(repository: Arc<R>) -> Self {
        Self {
            read_grid: Arc::new(ReadGridUseCaseImpl::new(Arc::clone(&repository))),
            paint_cell: Arc::new(PaintCellUseCaseImpl::new(Arc::clone(&repository))),
            watch_grid: Arc::new(WatchGridUseCaseImpl::new(repository)),
        }
    }
}

use place_domain::CellCoord;
use place_domain::Color;
use place_domain::Grid;
use tokio::sync::watch;

/// A grid copy together with the revision it was taken at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasSnapshot {
    pub grid: Grid,
    pub revision: u64,
}

/// Port for the authoritative canvas.
///
/// Implementations serialize access to the grid; `paint` on one cell never
/// loses a concurrent `paint` on another.
pub trait CanvasRepository: Send + Sync {
    fn snapshot(&self) -> CanvasSnapshot;

    /// Last-write-wins cell update. Returns the grid as it is right after this write.
    fn paint(&self, coord: CellCoord, color: Color) -> CanvasSnapshot;

    fn revision(&self) -> u64;

    fn subscribe(&self) -> GridSubscription;
}

/// Wakes when the canvas revision moves past the last one observed.
pub struct GridSubscription {
    rx: watch::Receiver<u64>,
}

impl GridSubscription {
    pub fn new(rx: watch::Receiver<u64>) -> Self {
        Self { rx }
    }

    /// Revision as of the last `changed` call (or subscription time).
    pub fn seen(&self) -> u64 {
        *self.rx.borrow()
    }

    /// Resolves once a newer revision is published. Returns `false` when the
    /// canvas has been dropped.
    pub async fn changed(&mut self) -> bool {
        match self.rx.changed().await {
            Ok(()) => {
                self.rx.borrow_and_update();
                true
            }
            Err(_) => false,
        }
    }
}

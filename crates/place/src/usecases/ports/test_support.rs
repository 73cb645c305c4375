use std::sync::Mutex;

use place_domain::CellCoord;
use place_domain::Color;
use place_domain::Grid;
use tokio::sync::watch;

use crate::usecases::ports::CanvasRepository;
use crate::usecases::ports::CanvasSnapshot;
use crate::usecases::ports::GridSubscription;

/// Records paint calls without any locking discipline of its own.
pub struct MockCanvasRepository {
    grid: Mutex<Grid>,
    paints: Mutex<Vec<(CellCoord, Color)>>,
    revision_tx: watch::Sender<u64>,
}

impl MockCanvasRepository {
    pub fn new() -> Self {
        Self::with_grid(Grid::new())
    }

    pub fn with_grid(grid: Grid) -> Self {
        let (revision_tx, _) = watch::channel(0);
        Self {
            grid: Mutex::new(grid),
            paints: Mutex::new(Vec::new()),
            revision_tx,
        }
    }

    pub fn paints(&self) -> Vec<(CellCoord, Color)> {
        self.paints.lock().unwrap().clone()
    }
}

impl CanvasRepository for MockCanvasRepository {
    fn snapshot(&self) -> CanvasSnapshot {
        CanvasSnapshot {
            grid: self.grid.lock().unwrap().clone(),
            revision: *self.revision_tx.borrow(),
        }
    }

    fn paint(&self, coord: CellCoord, color: Color) -> CanvasSnapshot {
        self.paints.lock().unwrap().push((coord, color.clone()));
        self.grid.lock().unwrap().paint(coord, color);
        self.revision_tx.send_modify(|rev| *rev += 1);
        self.snapshot()
    }

    fn revision(&self) -> u64 {
        *self.revision_tx.borrow()
    }

    fn subscribe(&self) -> GridSubscription {
        GridSubscription::new(self.revision_tx.subscribe())
    }
}

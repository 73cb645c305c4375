//! In-memory canvas store.

use std::sync::Mutex;

use place_domain::CellCoord;
use place_domain::Color;
use place_domain::Grid;
use tokio::sync::watch;
use tracing::trace;

use crate::common::mutex_lock_or_recover;
use crate::usecases::ports::CanvasRepository;
use crate::usecases::ports::CanvasSnapshot;
use crate::usecases::ports::GridSubscription;

struct CanvasState {
    grid: Grid,
    revision: u64,
}

/// The process-wide grid. Lives until the process exits; nothing is persisted.
pub struct InMemoryCanvas {
    state: Mutex<CanvasState>,
    revision_tx: watch::Sender<u64>,
}

impl InMemoryCanvas {
    pub fn new() -> Self {
        Self::with_grid(Grid::new())
    }

    pub fn with_grid(grid: Grid) -> Self {
        let (revision_tx, _) = watch::channel(0);
        Self {
            state: Mutex::new(CanvasState { grid, revision: 0 }),
            revision_tx,
        }
    }
}

impl Default for InMemoryCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasRepository for InMemoryCanvas {
    fn snapshot(&self) -> CanvasSnapshot {
        let state = mutex_lock_or_recover(&self.state);
        CanvasSnapshot {
            grid: state.grid.clone(),
            revision: state.revision,
        }
    }

    fn paint(&self, coord: CellCoord, color: Color) -> CanvasSnapshot {
        let snapshot = {
            let mut state = mutex_lock_or_recover(&self.state);
            let previous = state.grid.paint(coord, color);
            state.revision += 1;
            trace!(%coord, previous = %previous, revision = state.revision, "Canvas updated");
            CanvasSnapshot {
                grid: state.grid.clone(),
                revision: state.revision,
            }
        };
        // Writers may publish out of order; the published revision only moves forward.
        self.revision_tx.send_if_modified(|published| {
            if snapshot.revision > *published {
                *published = snapshot.revision;
                true
            } else {
                false
            }
        });
        snapshot
    }

    fn revision(&self) -> u64 {
        mutex_lock_or_recover(&self.state).revision
    }

    fn subscribe(&self) -> GridSubscription {
        GridSubscription::new(self.revision_tx.subscribe())
    }
}

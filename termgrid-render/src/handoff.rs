//! Publication of grid snapshots from the terminal producer to the render loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;

use crate::encoder::GridSnapshot;

#[derive(Debug)]
struct Published {
    snapshot: Arc<GridSnapshot>,
    generation: u64,
}

/// Latest published snapshot and its generation.
///
/// The producer publishes whole snapshots; the render loop loads the latest
/// one without locking. A published snapshot is never mutated.
#[derive(Debug)]
pub struct SnapshotHandoff {
    current: ArcSwap<Published>,
    next_generation: AtomicU64,
}

impl SnapshotHandoff {
    /// Start with `initial` as generation 0.
    pub fn new(initial: GridSnapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(Published {
                snapshot: Arc::new(initial),
                generation: 0,
            }),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Publish a new snapshot, returning its generation.
    pub fn publish(&self, snapshot: GridSnapshot) -> u64 {
        let generation = self.next_generation.fetch_add(1, Ordering::AcqRel);
        self.current.store(Arc::new(Published {
            snapshot: Arc::new(snapshot),
            generation,
        }));
        generation
    }

    /// Latest snapshot and its generation.
    pub fn load(&self) -> (Arc<GridSnapshot>, u64) {
        let current = self.current.load();
        (Arc::clone(&current.snapshot), current.generation)
    }

    /// Generation of the latest snapshot.
    pub fn generation(&self) -> u64 {
        self.current.load().generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::LogicalCell;

    #[test]
    fn test_load_returns_latest_publication() {
        let blank = LogicalCell::new(' ', [1.0; 4], [0.0; 4]);
        let handoff = SnapshotHandoff::new(GridSnapshot::filled(2, 1, blank));
        assert_eq!(handoff.load().1, 0);

        let generation = handoff.publish(GridSnapshot::filled(3, 1, blank));
        let (snapshot, loaded) = handoff.load();
        assert_eq!(loaded, generation);
        assert_eq!(snapshot.cols, 3);
    }
}

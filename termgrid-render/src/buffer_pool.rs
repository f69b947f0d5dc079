//! Frame slot pool for multi-buffered GPU resources.
//!
//! A slot is held from the moment a frame starts writing its buffers until
//! the GPU reports the submission complete. Holding is exclusive: the pool
//! never hands out a slot that is still in flight.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Longest single condvar wait between pump calls.
const PUMP_INTERVAL: Duration = Duration::from_millis(2);

#[derive(Debug)]
struct PoolState {
    free: Vec<usize>,
}

#[derive(Debug)]
struct PoolInner {
    state: Mutex<PoolState>,
    available: Condvar,
    capacity: usize,
}

impl PoolInner {
    fn release(&self, index: usize) {
        let mut state = self.state.lock();
        debug_assert!(!state.free.contains(&index), "slot {index} released twice");
        state.free.push(index);
        drop(state);
        self.available.notify_one();
    }
}

/// Pool of `n` reusable frame slots.
#[derive(Debug, Clone)]
pub struct FramePool {
    inner: Arc<PoolInner>,
}

impl FramePool {
    pub fn new(slots: usize) -> Self {
        let capacity = slots.max(1);
        Self {
            inner: Arc::new(PoolInner {
                // Reversed so slot 0 is handed out first
                state: Mutex::new(PoolState {
                    free: (0..capacity).rev().collect(),
                }),
                available: Condvar::new(),
                capacity,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Number of slots currently free.
    pub fn available(&self) -> usize {
        self.inner.state.lock().free.len()
    }

    /// Take a free slot without waiting.
    pub fn try_acquire(&self) -> Option<FrameSlot> {
        let index = self.inner.state.lock().free.pop()?;
        Some(FrameSlot {
            index,
            pool: Some(Arc::clone(&self.inner)),
        })
    }

    /// Take a free slot, waiting at most `timeout`.
    ///
    /// `pump` runs between short waits so completion callbacks that release
    /// slots get a chance to fire (e.g. by polling the GPU device).
    pub fn acquire(&self, timeout: Duration, mut pump: impl FnMut()) -> Option<FrameSlot> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(slot) = self.try_acquire() {
                return Some(slot);
            }

            pump();

            let now = Instant::now();
            if now >= deadline {
                return self.try_acquire();
            }
            let wait = PUMP_INTERVAL.min(deadline - now);
            let mut state = self.inner.state.lock();
            if state.free.is_empty() {
                self.inner.available.wait_for(&mut state, wait);
            }
        }
    }
}

/// Exclusive hold on one frame slot; returns it to the pool on drop.
#[derive(Debug)]
pub struct FrameSlot {
    index: usize,
    pool: Option<Arc<PoolInner>>,
}

impl FrameSlot {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Detach the release into a value that can move into a GPU completion
    /// callback.
    pub fn into_release(mut self) -> SlotRelease {
        SlotRelease {
            index: self.index,
            pool: self.pool.take(),
        }
    }
}

impl Drop for FrameSlot {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.release(self.index);
        }
    }
}

/// Deferred release of a frame slot.
///
/// Releases on [`release`](Self::release) or on drop, whichever comes first.
#[derive(Debug)]
pub struct SlotRelease {
    index: usize,
    pool: Option<Arc<PoolInner>>,
}

impl SlotRelease {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn release(mut self) {
        if let Some(pool) = self.pool.take() {
            pool.release(self.index);
        }
    }
}

impl Drop for SlotRelease {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.release(self.index);
        }
    }
}

//! Manually pumped scheduler

use std::sync::{Arc, Mutex};

use veil_core::scheduler::{Scheduler, TickCallback};

/// A scheduler whose ticks run only when the test pumps them
///
/// Callbacks queued during a pump run on the next pump, mirroring a real
/// dispatcher where "next tick" work never runs on the dispatch that queued
/// it.
pub struct ManualScheduler {
    queue: Mutex<Vec<TickCallback>>,
}

impl ManualScheduler {
    /// Create an empty scheduler
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(Vec::new()),
        })
    }

    /// Number of callbacks waiting for the next pump
    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Run everything queued right now; newly queued work waits
    ///
    /// Returns how many callbacks ran.
    pub fn run_pending(&self) -> usize {
        let batch: Vec<TickCallback> = std::mem::take(&mut *self.queue.lock().unwrap());
        let count = batch.len();
        for callback in batch {
            callback();
        }
        count
    }

    /// Pump until no work remains
    pub fn run_until_idle(&self) -> usize {
        let mut total = 0;
        loop {
            let ran = self.run_pending();
            if ran == 0 {
                return total;
            }
            total += ran;
        }
    }
}

impl Scheduler for ManualScheduler {
    fn run_next_tick(&self, callback: TickCallback) {
        self.queue.lock().unwrap().push(callback);
    }
}

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueStats {
    pub admitted_total: usize,
    pub overridden_total: usize,
    pub batches_total: usize,
    pub dispatched_total: usize,
    pub dispatch_faults_total: usize,
    pub flushes_total: usize,
    pub flush_faults_total: usize,
    pub discarded_on_stop_total: usize,
}

/// Counters updated from both the admitting threads and the pump.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub admitted: AtomicUsize,
    pub overridden: AtomicUsize,
    pub batches: AtomicUsize,
    pub dispatched: AtomicUsize,
    pub dispatch_faults: AtomicUsize,
    pub flushes: AtomicUsize,
    pub flush_faults: AtomicUsize,
    pub discarded_on_stop: AtomicUsize,
}

impl Counters {
    pub fn bump(counter: &AtomicUsize) {
        Self::add(counter, 1);
    }

    pub fn add(counter: &AtomicUsize, n: usize) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> QueueStats {
        let load = |counter: &AtomicUsize| counter.load(Ordering::Relaxed);
        QueueStats {
            admitted_total: load(&self.admitted),
            overridden_total: load(&self.overridden),
            batches_total: load(&self.batches),
            dispatched_total: load(&self.dispatched),
            dispatch_faults_total: load(&self.dispatch_faults),
            flushes_total: load(&self.flushes),
            flush_faults_total: load(&self.flush_faults),
            discarded_on_stop_total: load(&self.discarded_on_stop),
        }
    }
}

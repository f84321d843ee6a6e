use std::collections::BTreeMap;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use crate::config::QueueConfig;
use crate::error::QueueError;
use crate::request::{DispatchOutcome, Request};
use crate::stats::{Counters, QueueStats};
use crate::target::{Connection, ConnectionId};

static NEXT_QUEUE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Default)]
struct Pending {
    requests: Vec<Request>,
    stopped: bool,
}

struct Shared {
    pending: Mutex<Pending>,
    wakeup: Condvar,
    throttle: Duration,
    counters: Counters,
}

impl Shared {
    // A contract-violation panic may poison the lock; the list itself stays
    // consistent, so keep going with it.
    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Flip to stopped and hand back whatever was still queued.
    /// `None` if the queue was already stopped.
    fn shutdown(&self) -> Option<Vec<Request>> {
        let mut pending = self.lock();
        if pending.stopped {
            return None;
        }
        pending.stopped = true;
        self.wakeup.notify_all();
        Some(mem::take(&mut pending.requests))
    }
}

/// Per-session forwarding queue with a dedicated pump thread.
///
/// Callers admit requests with [`RequestQueue::add_request`]; the pump drains
/// everything pending in one swap, dispatches it outside the lock, flushes
/// the connections batched requests went out on, then sleeps the throttle.
pub struct RequestQueue {
    id: u64,
    shared: Arc<Shared>,
}

impl RequestQueue {
    pub fn start(throttle: Duration) -> Result<Self, QueueError> {
        let id = NEXT_QUEUE_ID.fetch_add(1, Ordering::Relaxed);
        let shared = Arc::new(Shared {
            pending: Mutex::new(Pending::default()),
            wakeup: Condvar::new(),
            throttle,
            counters: Counters::default(),
        });

        let pump_shared = Arc::clone(&shared);
        // The handle is dropped: stop() must never wait on the pump.
        thread::Builder::new()
            .name(format!("relaygate-pump-{id}"))
            .spawn(move || pump(id, pump_shared))?;

        log::info!("request queue {id} started (throttle {}ms)", throttle.as_millis());
        Ok(Self { id, shared })
    }

    pub fn from_config(config: &QueueConfig) -> Result<Self, QueueError> {
        Self::start(config.throttle())
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn throttle(&self) -> Duration {
        self.shared.throttle
    }

    /// Admit a request. Returns `true` when it replaced a queued request it
    /// overrides, `false` when it was appended.
    ///
    /// # Panics
    ///
    /// If called after [`RequestQueue::stop`].
    pub fn add_request(&self, request: Request) -> bool {
        let mut pending = self.shared.lock();
        assert!(!pending.stopped, "request admitted to stopped queue {}", self.id);

        let slot = pending.requests.iter().position(|queued| request.overrides(queued));
        let overridden = match slot {
            Some(index) => {
                log::trace!(
                    "queue {}: {} overrides slot {index} (tag {:?})",
                    self.id,
                    request.target().reference(),
                    request.override_tag()
                );
                // Dropping the superseded request here releases its target;
                // its sink was completed when it was built.
                pending.requests[index] = request;
                true
            }
            None => {
                pending.requests.push(request);
                false
            }
        };
        self.shared.wakeup.notify_one();
        drop(pending);

        Counters::bump(&self.shared.counters.admitted);
        if overridden {
            Counters::bump(&self.shared.counters.overridden);
        }
        overridden
    }

    /// Stop the queue without waiting for the pump. Anything not yet
    /// dispatched is discarded and its sink is never completed.
    ///
    /// # Panics
    ///
    /// If the queue was already stopped.
    pub fn stop(&self) {
        let Some(discarded) = self.shared.shutdown() else {
            panic!("request queue {} stopped twice", self.id);
        };
        self.record_discarded(discarded);
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.lock().stopped
    }

    pub fn pending_len(&self) -> usize {
        self.shared.lock().requests.len()
    }

    pub fn stats(&self) -> QueueStats {
        self.shared.counters.snapshot()
    }

    fn record_discarded(&self, discarded: Vec<Request>) {
        Counters::add(&self.shared.counters.discarded_on_stop, discarded.len());
        log::info!(
            "request queue {} stopped, {} pending request(s) discarded",
            self.id,
            discarded.len()
        );
    }
}

impl Drop for RequestQueue {
    fn drop(&mut self) {
        if let Some(discarded) = self.shared.shutdown() {
            self.record_discarded(discarded);
        }
    }
}

impl std::fmt::Debug for RequestQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestQueue")
            .field("id", &self.id)
            .field("throttle", &self.shared.throttle)
            .finish_non_exhaustive()
    }
}

fn pump(id: u64, shared: Arc<Shared>) {
    loop {
        let batch = {
            let pending = shared.lock();
            let mut pending = shared
                .wakeup
                .wait_while(pending, |pending| !pending.stopped && pending.requests.is_empty())
                .unwrap_or_else(PoisonError::into_inner);
            if pending.stopped {
                break;
            }
            mem::take(&mut pending.requests)
        };

        run_batch(id, &shared.counters, batch);

        if !shared.throttle.is_zero() {
            thread::sleep(shared.throttle);
        }
    }
    log::debug!("request queue {id}: pump exited");
}

fn run_batch(id: u64, counters: &Counters, batch: Vec<Request>) {
    Counters::bump(&counters.batches);
    log::debug!("queue {id}: dispatching batch of {} request(s)", batch.len());

    let mut flush_set: BTreeMap<ConnectionId, Arc<dyn Connection>> = BTreeMap::new();
    for request in batch {
        if request.is_batched() {
            match request.connection() {
                Ok(connection) => {
                    flush_set.entry(connection.id()).or_insert(connection);
                }
                Err(fault) => {
                    log::debug!(
                        "queue {id}: no connection to flush for {}: {fault}",
                        request.target().reference()
                    );
                }
            }
        }

        let target = Arc::clone(request.target());
        let outcome = panic::catch_unwind(AssertUnwindSafe(move || request.dispatch()));
        Counters::bump(&counters.dispatched);
        match outcome {
            Ok(DispatchOutcome::Faulted(fault)) => {
                Counters::bump(&counters.dispatch_faults);
                log::warn!("queue {id}: forwarding to {} failed: {fault}", target.reference());
            }
            Ok(outcome) => {
                log::trace!("queue {id}: {} -> {outcome:?}", target.reference());
            }
            Err(_) => {
                Counters::bump(&counters.dispatch_faults);
                log::warn!("queue {id}: forwarding to {} panicked", target.reference());
            }
        }
    }

    for (connection_id, connection) in flush_set {
        let flushed = panic::catch_unwind(AssertUnwindSafe(|| connection.flush_batch()));
        Counters::bump(&counters.flushes);
        match flushed {
            Ok(Ok(())) => {}
            Ok(Err(fault)) => {
                Counters::bump(&counters.flush_faults);
                log::debug!("queue {id}: flushing connection {} failed: {fault}", connection_id.0);
            }
            Err(_) => {
                Counters::bump(&counters.flush_faults);
                log::debug!("queue {id}: flushing connection {} panicked", connection_id.0);
            }
        }
    }
}

#![allow(dead_code)]

use relaygate_queue::sink::channel;
use relaygate_queue::{
    Connection, ConnectionId, Invocation, InvocationMode, InvokeReply, OutgoingCall, RemoteFault,
    Reply, Request, Target, TargetRef,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

pub const WAIT: Duration = Duration::from_secs(5);

/// Ordered record of every call that reached a backend.
#[derive(Default)]
pub struct Journal {
    calls: Mutex<Vec<(String, Instant)>>,
    changed: Condvar,
}

impl Journal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn record(&self, label: String) {
        self.calls.lock().unwrap().push((label, Instant::now()));
        self.changed.notify_all();
    }

    pub fn labels(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(label, _)| label.clone()).collect()
    }

    pub fn wait_for(&self, count: usize) -> Vec<(String, Instant)> {
        let calls = self.calls.lock().unwrap();
        let (calls, timeout) =
            self.changed.wait_timeout_while(calls, WAIT, |calls| calls.len() < count).unwrap();
        assert!(!timeout.timed_out(), "journal stuck at {} of {count} calls", calls.len());
        calls.clone()
    }

    pub fn wait_for_labels(&self, count: usize) -> Vec<String> {
        self.wait_for(count).into_iter().map(|(label, _)| label).collect()
    }
}

pub struct MockConnection {
    id: ConnectionId,
    flushes: AtomicUsize,
    fail: AtomicBool,
}

impl MockConnection {
    pub fn new(id: u64) -> Arc<Self> {
        Arc::new(Self {
            id: ConnectionId(id),
            flushes: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        })
    }

    pub fn failing(id: u64) -> Arc<Self> {
        let connection = Self::new(id);
        connection.fail.store(true, Ordering::SeqCst);
        connection
    }

    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

impl Connection for MockConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn flush_batch(&self) -> Result<(), RemoteFault> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RemoteFault::ConnectionLost { reason: "flush refused".into() });
        }
        Ok(())
    }
}

pub enum Behavior {
    Reply(Vec<u8>),
    Fault(RemoteFault),
    Panic,
    /// Block every call until the test sends on the paired sender.
    Gate(Mutex<mpsc::Receiver<()>>),
}

pub struct MockTarget {
    reference: TargetRef,
    journal: Arc<Journal>,
    connection: Arc<MockConnection>,
    behavior: Behavior,
}

impl MockTarget {
    pub fn new(
        identity: &str,
        mode: InvocationMode,
        journal: &Arc<Journal>,
        connection: &Arc<MockConnection>,
    ) -> Arc<Self> {
        Self::with_behavior(identity, mode, journal, connection, Behavior::Reply(b"ok".to_vec()))
    }

    pub fn with_behavior(
        identity: &str,
        mode: InvocationMode,
        journal: &Arc<Journal>,
        connection: &Arc<MockConnection>,
        behavior: Behavior,
    ) -> Arc<Self> {
        Arc::new(Self {
            reference: TargetRef::new(identity, "tcp -h backend -p 10000", mode),
            journal: Arc::clone(journal),
            connection: Arc::clone(connection),
            behavior,
        })
    }

    /// A two-way target that holds the pump inside `invoke` until released.
    pub fn gate(journal: &Arc<Journal>) -> (Arc<Self>, mpsc::Sender<()>) {
        let (release, held) = mpsc::channel();
        let target = Self::with_behavior(
            "gate",
            InvocationMode::Twoway,
            journal,
            &MockConnection::new(0),
            Behavior::Gate(Mutex::new(held)),
        );
        (target, release)
    }
}

impl Target for MockTarget {
    fn reference(&self) -> &TargetRef {
        &self.reference
    }

    fn invoke(&self, call: &OutgoingCall<'_>) -> Result<InvokeReply, RemoteFault> {
        self.journal.record(String::from_utf8_lossy(call.payload).into_owned());
        match &self.behavior {
            Behavior::Reply(payload) => {
                if self.reference.mode.is_twoway() {
                    Ok(InvokeReply::ok(payload.clone()))
                } else {
                    Ok(InvokeReply::ok(Vec::new()))
                }
            }
            Behavior::Fault(fault) => Err(fault.clone()),
            Behavior::Panic => panic!("backend blew up"),
            Behavior::Gate(held) => {
                let _ = held.lock().unwrap().recv_timeout(WAIT);
                Ok(InvokeReply::ok(Vec::new()))
            }
        }
    }

    fn connection(&self) -> Result<Arc<dyn Connection>, RemoteFault> {
        Ok(self.connection.clone())
    }
}

/// Build a request whose payload doubles as its journal label.
pub fn request(
    target: &Arc<MockTarget>,
    label: &str,
    tag: Option<&str>,
) -> (Request, mpsc::Receiver<Reply>) {
    let mut invocation = Invocation::new("forward");
    if let Some(tag) = tag {
        invocation = invocation.with_override(tag);
    }
    let (sink, rx) = channel();
    let request =
        Request::new(target.clone(), label.as_bytes().to_vec(), invocation, false, Box::new(sink));
    (request, rx)
}

pub fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + WAIT;
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        std::thread::sleep(Duration::from_millis(2));
    }
}

use std::sync::mpsc;

use crate::error::RemoteFault;

/// Where a forwarded call's outcome is delivered.
///
/// Both methods consume the sink, so a sink completes at most once. The
/// queue may complete it from the pump thread.
pub trait ResponseSink: Send {
    fn respond(self: Box<Self>, ok: bool, payload: Vec<u8>);

    fn fail(self: Box<Self>, fault: RemoteFault);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Response { ok: bool, payload: Vec<u8> },
    Fault(RemoteFault),
}

impl Reply {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Response { ok: true, .. })
    }
}

/// Sink that forwards the outcome into an `mpsc` channel.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::Sender<Reply>,
}

/// Create a sink together with the receiver its outcome lands on.
pub fn channel() -> (ChannelSink, mpsc::Receiver<Reply>) {
    let (tx, rx) = mpsc::channel();
    (ChannelSink { tx }, rx)
}

impl ResponseSink for ChannelSink {
    fn respond(self: Box<Self>, ok: bool, payload: Vec<u8>) {
        // The caller may have given up waiting.
        let _ = self.tx.send(Reply::Response { ok, payload });
    }

    fn fail(self: Box<Self>, fault: RemoteFault) {
        let _ = self.tx.send(Reply::Fault(fault));
    }
}

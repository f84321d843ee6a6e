//! Collaborator boundary consumed by the queue.
//!
//! The connection layer hands the gateway [`Target`] handles for backend
//! objects and [`Connection`] handles for the transports underneath them.
//! The queue only invokes and flushes through these; it never opens or
//! closes anything.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::RemoteFault;
use crate::mode::{InvocationMode, OperationMode};

/// Request metadata, ordered by key.
pub type Context = BTreeMap<String, String>;

/// Identity of a backend reference. Two targets with equal references name
/// the same remote object reached the same way.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetRef {
    pub identity: String,
    #[serde(default)]
    pub facet: String,
    pub endpoint: String,
    pub mode: InvocationMode,
}

impl TargetRef {
    pub fn new(
        identity: impl Into<String>,
        endpoint: impl Into<String>,
        mode: InvocationMode,
    ) -> Self {
        Self { identity: identity.into(), facet: String::new(), endpoint: endpoint.into(), mode }
    }

    pub fn with_facet(mut self, facet: impl Into<String>) -> Self {
        self.facet = facet.into();
        self
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.facet.is_empty() {
            write!(f, "{} -{} @ {}", self.identity, self.mode.as_str(), self.endpoint)
        } else {
            write!(
                f,
                "{} -f {} -{} @ {}",
                self.identity,
                self.facet,
                self.mode.as_str(),
                self.endpoint
            )
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

/// One call as it leaves the gateway.
#[derive(Debug, Clone, Copy)]
pub struct OutgoingCall<'a> {
    pub operation: &'a str,
    pub mode: OperationMode,
    pub payload: &'a [u8],
    /// `None` when the session does not forward its context.
    pub context: Option<&'a Context>,
}

/// Raw reply from a backend. `ok == false` carries an encoded user exception.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvokeReply {
    pub ok: bool,
    pub payload: Vec<u8>,
}

impl InvokeReply {
    pub fn ok(payload: Vec<u8>) -> Self {
        Self { ok: true, payload }
    }

    pub fn user_exception(payload: Vec<u8>) -> Self {
        Self { ok: false, payload }
    }
}

pub trait Connection: Send + Sync {
    fn id(&self) -> ConnectionId;

    /// Send everything batched on this connection so far.
    fn flush_batch(&self) -> Result<(), RemoteFault>;
}

pub trait Target: Send + Sync {
    fn reference(&self) -> &TargetRef;

    /// Blocking invocation. For non-two-way modes the reply is empty.
    fn invoke(&self, call: &OutgoingCall<'_>) -> Result<InvokeReply, RemoteFault>;

    /// The transport connection currently carrying this target's traffic.
    fn connection(&self) -> Result<Arc<dyn Connection>, RemoteFault>;

    fn mode(&self) -> InvocationMode {
        self.reference().mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_differing_only_in_mode_are_distinct() {
        let oneway = TargetRef::new("clock", "tcp -h backend -p 10000", InvocationMode::Oneway);
        let datagram = TargetRef { mode: InvocationMode::Datagram, ..oneway.clone() };
        assert_ne!(oneway, datagram);
        assert_eq!(oneway, oneway.clone());
    }

    #[test]
    fn display_includes_facet_when_present() {
        let target = TargetRef::new("clock", "tcp -p 1", InvocationMode::Twoway).with_facet("v2");
        assert_eq!(target.to_string(), "clock -f v2 -twoway @ tcp -p 1");
    }
}

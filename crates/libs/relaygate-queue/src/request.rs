use std::fmt;
use std::sync::Arc;

use crate::error::RemoteFault;
use crate::mode::OperationMode;
use crate::sink::ResponseSink;
use crate::target::{Connection, Context, OutgoingCall, Target};

/// Context key whose value marks a request as replaceable by a later one.
pub const OVERRIDE_CONTEXT_KEY: &str = "_ovrd";

/// Operation name, mode and context of an incoming call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub operation: String,
    pub mode: OperationMode,
    pub context: Context,
}

impl Invocation {
    pub fn new(operation: impl Into<String>) -> Self {
        Self { operation: operation.into(), ..Self::default() }
    }

    pub fn with_mode(mut self, mode: OperationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_override(self, tag: impl Into<String>) -> Self {
        self.with_context(OVERRIDE_CONTEXT_KEY, tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered,
    /// The backend answered with a user exception.
    UserException,
    Faulted(RemoteFault),
}

/// One pending forwarded call.
///
/// A request is either superseded while queued or dispatched exactly once;
/// [`Request::dispatch`] consumes it.
pub struct Request {
    target: Arc<dyn Target>,
    payload: Vec<u8>,
    invocation: Invocation,
    forward_context: bool,
    override_tag: String,
    // `None` once completed, which for non-two-way targets is at construction.
    sink: Option<Box<dyn ResponseSink>>,
}

impl Request {
    pub fn new(
        target: Arc<dyn Target>,
        payload: Vec<u8>,
        invocation: Invocation,
        forward_context: bool,
        sink: Box<dyn ResponseSink>,
    ) -> Self {
        let sink = if target.mode().is_twoway() {
            Some(sink)
        } else {
            sink.respond(true, Vec::new());
            None
        };
        let override_tag =
            invocation.context.get(OVERRIDE_CONTEXT_KEY).cloned().unwrap_or_default();

        Self { target, payload, invocation, forward_context, override_tag, sink }
    }

    pub fn target(&self) -> &Arc<dyn Target> {
        &self.target
    }

    pub fn operation(&self) -> &str {
        &self.invocation.operation
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn override_tag(&self) -> &str {
        &self.override_tag
    }

    /// Whether this request may take `other`'s place in the queue.
    pub fn overrides(&self, other: &Request) -> bool {
        if self.override_tag.is_empty() || other.override_tag.is_empty() {
            return false;
        }

        // Every two-way caller is owed its own response.
        if self.target.mode().is_twoway() || other.target.mode().is_twoway() {
            return false;
        }

        if self.target.reference() != other.target.reference() {
            return false;
        }

        self.override_tag == other.override_tag
    }

    pub fn is_batched(&self) -> bool {
        self.target.mode().is_batched()
    }

    pub fn connection(&self) -> Result<Arc<dyn Connection>, RemoteFault> {
        self.target.connection()
    }

    /// Forward the call, blocking until the backend answers or faults.
    pub fn dispatch(self) -> DispatchOutcome {
        let Self { target, payload, invocation, forward_context, sink, .. } = self;
        let call = OutgoingCall {
            operation: &invocation.operation,
            mode: invocation.mode,
            payload: &payload,
            context: forward_context.then_some(&invocation.context),
        };

        match target.invoke(&call) {
            Ok(reply) => {
                let outcome = if reply.ok {
                    DispatchOutcome::Delivered
                } else {
                    DispatchOutcome::UserException
                };
                if let Some(sink) = sink {
                    sink.respond(reply.ok, reply.payload);
                }
                outcome
            }
            Err(fault) => {
                if let Some(sink) = sink {
                    sink.fail(fault.clone());
                }
                DispatchOutcome::Faulted(fault)
            }
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("target", self.target.reference())
            .field("operation", &self.operation())
            .field("payload_len", &self.payload().len())
            .field("forward_context", &self.forward_context)
            .field("override_tag", &self.override_tag)
            .field("awaiting_response", &self.sink.is_some())
            .finish()
    }
}

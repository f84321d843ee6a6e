//! Session-scoped request forwarding for the relaygate router.
//!
//! Each client session owns one [`RequestQueue`]. Session handlers admit
//! [`Request`]s; a dedicated pump thread forwards them to backend
//! [`Target`]s so the session thread never waits on network latency.
//!
//! - **Admission** coalesces a tagged one-way request into the slot of an
//!   equivalent queued one (see [`Request::overrides`]).
//! - **Dispatch** runs outside the queue lock, one request at a time, and a
//!   failing request never stops the rest of its batch.
//! - **Batched** traffic is flushed once per distinct connection per batch.
//! - **Throttle** spaces consecutive batches to bound backend amplification.
//! - **Shutdown** via [`RequestQueue::stop`] is non-blocking and discards
//!   anything not yet dispatched.

pub mod config;
pub mod error;
pub mod mode;
pub mod queue;
pub mod request;
pub mod sink;
pub mod stats;
pub mod target;

pub use config::QueueConfig;
pub use error::{QueueError, RemoteFault};
pub use mode::{InvocationMode, OperationMode};
pub use queue::RequestQueue;
pub use request::{DispatchOutcome, Invocation, Request, OVERRIDE_CONTEXT_KEY};
pub use sink::{ChannelSink, Reply, ResponseSink};
pub use stats::QueueStats;
pub use target::{Connection, ConnectionId, Context, InvokeReply, OutgoingCall, Target, TargetRef};

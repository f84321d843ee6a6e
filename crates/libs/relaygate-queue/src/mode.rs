use serde::{Deserialize, Serialize};

/// How a target reference delivers calls.
///
/// Only `Twoway` expects a response. Every other mode releases the caller as
/// soon as the request is admitted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum InvocationMode {
    Twoway,
    Oneway,
    Datagram,
    BatchOneway,
    BatchDatagram,
}

impl InvocationMode {
    pub fn is_twoway(self) -> bool {
        matches!(self, Self::Twoway)
    }

    /// Batched modes accumulate on their connection until flushed.
    pub fn is_batched(self) -> bool {
        match self {
            Self::BatchOneway | Self::BatchDatagram => true,
            Self::Twoway | Self::Oneway | Self::Datagram => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Twoway => "twoway",
            Self::Oneway => "oneway",
            Self::Datagram => "datagram",
            Self::BatchOneway => "batch_oneway",
            Self::BatchDatagram => "batch_datagram",
        }
    }
}

/// Operation semantics carried with the call, forwarded untouched.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OperationMode {
    #[default]
    Normal,
    Nonmutating,
    Idempotent,
}

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum TopicError {
    #[error("topic already exists: {name}")]
    AlreadyExists { name: String },

    #[error("no such topic: {name}")]
    NotFound { name: String },

    #[error("invalid type id: {type_id}")]
    InvalidType { type_id: String },

    #[error("backing store missing: {database}")]
    BackingStoreMissing { database: String },

    #[error("storage error: {message}")]
    Storage { message: String },
}

impl From<rusqlite::Error> for TopicError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage { message: err.to_string() }
    }
}

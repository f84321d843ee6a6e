//! Named topic registry for the relaygate router.
//!
//! Topics are recorded in a durable name → type-id dictionary and each owns
//! a backing store. [`TopicRegistry::open`] reconciles the two once at
//! startup; afterwards `create`, `retrieve` and `list_all` serve from memory
//! and keep the dictionary in step.

pub mod config;
pub mod error;
pub mod name;
pub mod registry;
pub mod store;

pub use config::TopicsConfig;
pub use error::TopicError;
pub use name::{database_name, validate_type_id};
pub use registry::{TopicHandle, TopicRegistry};
pub use store::{SqliteTopicStore, TopicStore};

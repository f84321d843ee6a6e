use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_DATABASE: &str = "topics.sqlite3";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopicsConfig {
    #[serde(default = "default_database")]
    pub database: PathBuf,
}

fn default_database() -> PathBuf {
    PathBuf::from(DEFAULT_DATABASE)
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self { database: default_database() }
    }
}

//! Operator CLI for relaygate: topic administration and config checks.

pub mod app;
pub mod config;

pub use app::{execute, run_cli, Cli, Command};
pub use config::RelaygateConfig;

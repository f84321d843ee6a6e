use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use relaygate_queue::RequestQueue;
use relaygate_topics::{SqliteTopicStore, TopicRegistry};
use std::io::Write;
use std::path::PathBuf;

use crate::config::RelaygateConfig;

#[derive(Debug, Clone, Parser)]
#[command(name = "relaygate", about = "relaygate operator CLI", version)]
pub struct Cli {
    /// TOML configuration file. Built-in defaults apply when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Topic database, overriding `topics.database` from the configuration.
    #[arg(long)]
    pub db: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    Topics(TopicsCommand),
    Config(ConfigCommand),
}

#[derive(Debug, Clone, Args)]
pub struct TopicsCommand {
    #[command(subcommand)]
    pub action: TopicsAction,
}

#[derive(Debug, Clone, Subcommand)]
pub enum TopicsAction {
    Create { name: String, type_id: String },
    Get { name: String },
    List,
    Destroy { name: String },
}

#[derive(Debug, Clone, Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigAction {
    /// Parse the configuration and start a queue with it.
    Check,
}

impl Cli {
    pub fn load_config(&self) -> Result<RelaygateConfig> {
        let mut config = match &self.config {
            Some(path) => RelaygateConfig::from_path(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => RelaygateConfig::default(),
        };
        if let Some(db) = &self.db {
            config.topics.database = db.clone();
        }
        log::debug!("effective config: {config:?}");
        Ok(config)
    }
}

pub fn run_cli(cli: Cli) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&cli, &mut out)
}

pub fn execute(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    let config = cli.load_config()?;
    match &cli.command {
        Command::Topics(command) => run_topics(&config, &command.action, out),
        Command::Config(command) => match command.action {
            ConfigAction::Check => check_config(&config, out),
        },
    }
}

fn open_registry(config: &RelaygateConfig) -> Result<TopicRegistry<SqliteTopicStore>> {
    let path = &config.topics.database;
    let store = SqliteTopicStore::open(path)
        .with_context(|| format!("failed to open topic database {}", path.display()))?;
    TopicRegistry::open(store).context("failed to reconcile topic registry")
}

fn run_topics(
    config: &RelaygateConfig,
    action: &TopicsAction,
    out: &mut dyn Write,
) -> Result<()> {
    let topics = open_registry(config)?;
    match action {
        TopicsAction::Create { name, type_id } => {
            let topic = topics
                .create(name, type_id)
                .with_context(|| format!("failed to create topic {name}"))?;
            writeln!(out, "created {} {}", topic.name, topic.type_id)?;
        }
        TopicsAction::Get { name } => {
            let topic = topics.retrieve(name)?;
            writeln!(out, "{} {}", topic.name, topic.type_id)?;
        }
        TopicsAction::List => {
            for topic in topics.list_all()?.values() {
                writeln!(out, "{} {}", topic.name, topic.type_id)?;
            }
        }
        TopicsAction::Destroy { name } => {
            topics.destroy(name)?;
            // Reap now so the destroy is durable before the process exits.
            topics.list_all()?;
            writeln!(out, "destroyed {name}")?;
        }
    }
    Ok(())
}

fn check_config(config: &RelaygateConfig, out: &mut dyn Write) -> Result<()> {
    let queue = RequestQueue::from_config(&config.queue).context("failed to start queue")?;
    queue.stop();
    writeln!(out, "queue throttle: {}ms", config.queue.throttle_ms)?;
    writeln!(out, "topic database: {}", config.topics.database.display())?;
    Ok(())
}

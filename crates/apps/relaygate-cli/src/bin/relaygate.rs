use clap::Parser;
use relaygate_cli::{run_cli, Cli};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    run_cli(Cli::parse())
}

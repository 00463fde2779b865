use clap::Parser;
use tfstate_server::ServiceConfig;

mod cli;
mod commands;
mod logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = ServiceConfig::load(cli.config.as_deref())?;
    logging::init(&config.logging, cli.verbose)?;
    tracing::debug!(environment = %config.environment, config = ?cli.config, "configuration loaded");
    commands::run_command(cli.command, config).await
}

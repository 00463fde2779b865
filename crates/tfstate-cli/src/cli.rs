use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tfstate",
    about = "Remote state backend for OpenTofu and Terraform",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file; environment variables override it
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level regardless of LOG_LEVEL
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Toml,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP state backend
    Serve(ServeArgs),
    /// Apply database migrations and exit
    Migrate(MigrateArgs),
    /// Print the effective configuration with secrets redacted
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Listen address, overriding BIND_ADDR
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Args)]
pub struct MigrateArgs {}

#[derive(Args)]
pub struct ConfigArgs {
    #[arg(long, default_value = "toml")]
    pub format: OutputFormat,
}

use anyhow::Context;
use colored::Colorize;
use tfstate_meta::postgres::redact_url;
use tfstate_meta::PgMetadataStore;
use tfstate_server::{ServiceConfig, StorageBackend, TfstateServer};

use crate::cli::*;

pub async fn run_command(command: Command, config: ServiceConfig) -> anyhow::Result<()> {
    match command {
        Command::Serve(args) => cmd_serve(args, config).await,
        Command::Migrate(_) => cmd_migrate(&config).await,
        Command::Config(args) => cmd_config(args, &config),
    }
}

async fn cmd_serve(args: ServeArgs, mut config: ServiceConfig) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind
            .parse()
            .with_context(|| format!("invalid --bind address {bind:?}"))?;
    }

    let metadata = match &config.database.url {
        Some(url) => redact_url(url),
        None => "in-memory".into(),
    };
    let storage = match config.storage.backend {
        StorageBackend::Memory => "in-memory".to_string(),
        _ => format!("bucket {}", config.storage.s3.bucket),
    };
    println!(
        "{} tfstate on {} (metadata: {}, storage: {})",
        "▶".green().bold(),
        config.server.bind_addr.to_string().bold(),
        metadata.cyan(),
        storage.cyan()
    );

    let server = TfstateServer::from_config(config)
        .await
        .context("failed to start tfstate server")?;
    server.serve().await?;
    Ok(())
}

async fn cmd_migrate(config: &ServiceConfig) -> anyhow::Result<()> {
    let pool = config
        .database
        .pool_config()
        .context("DATABASE_URL is not set; nothing to migrate")?;

    let store = PgMetadataStore::connect(&pool)
        .await
        .context("failed to connect to PostgreSQL")?;
    store.migrate().await?;

    println!(
        "{} Migrations applied to {}",
        "✓".green().bold(),
        redact_url(&pool.url).bold()
    );
    Ok(())
}

fn cmd_config(args: ConfigArgs, config: &ServiceConfig) -> anyhow::Result<()> {
    let redacted = config.redacted();
    match args.format {
        OutputFormat::Toml => print!("{}", redacted.to_toml()?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&redacted)?),
    }
    Ok(())
}

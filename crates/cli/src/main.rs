//! Administrative CLI for Holdfast.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use holdfast_core::AppConfig;
use holdfast_media::{MediaContext, blobs};
use holdfast_metadata::BlobRepo;
use holdfast_signer::SecretConfig;
use holdfast_storage::BackendRegistry;

#[derive(Parser)]
#[command(name = "holdfastctl")]
#[command(about = "Administrative CLI for Holdfast")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "HOLDFAST_CONFIG",
        default_value = "config/server.toml",
        global = true
    )]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Signing secret commands
    Secret {
        #[command(subcommand)]
        command: SecretCommands,
    },
    /// Delete blobs that no record references
    PurgeUnattached {
        /// Only purge blobs created before this RFC 3339 timestamp
        #[arg(long)]
        until: Option<String>,

        /// List what would be purged without deleting anything
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum SecretCommands {
    /// Generate a fresh signing secret suitable for configuration
    Generate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Secret {
            command: SecretCommands::Generate,
        } => {
            println!("{}", SecretConfig::generate_value());
            Ok(())
        }
        Commands::PurgeUnattached { until, dry_run } => {
            let config = load_config(&cli.config)?;
            purge_unattached(config, until.as_deref(), dry_run).await
        }
    }
}

fn load_config(path: &str) -> Result<AppConfig> {
    let mut figment = Figment::new();
    if std::path::Path::new(path).exists() {
        figment = figment.merge(Toml::file(path));
    }
    let config: AppConfig = figment
        .merge(Env::prefixed("HOLDFAST_").split("__"))
        .extract()
        .context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}

async fn purge_unattached(config: AppConfig, until: Option<&str>, dry_run: bool) -> Result<()> {
    let cutoff = until
        .map(|raw| {
            OffsetDateTime::parse(raw, &Rfc3339)
                .with_context(|| format!("invalid --until timestamp '{raw}'"))
        })
        .transpose()?;

    let signer = config
        .signing
        .secret
        .resolve()
        .context("failed to resolve signing secret")?;
    let registry = BackendRegistry::from_config(&config.backends, &config.service)
        .await
        .context("failed to initialize storage backends")?;
    let metadata = holdfast_metadata::open(&config.metadata)
        .await
        .context("failed to open metadata store")?;
    let ctx = MediaContext::new(config.service.clone(), signer, metadata.clone());

    let unattached = metadata.unattached_blobs(cutoff).await?;
    if unattached.is_empty() {
        println!("nothing to purge");
        return Ok(());
    }

    let mut purged = 0u64;
    let mut bytes = 0u64;
    for blob in &unattached {
        let size = blob.byte_size.unwrap_or_default();
        if dry_run {
            println!(
                "would purge {} ({}, {} bytes, backend {})",
                blob.id,
                blob.filename.as_deref().unwrap_or("-"),
                size,
                blob.backend
            );
        } else {
            let handle = registry
                .get(&blob.backend)
                .with_context(|| format!("blob {} references unknown backend", blob.id))?;
            blobs::purge(&ctx, handle.store.as_ref(), blob)
                .await
                .with_context(|| format!("failed to purge blob {}", blob.id))?;
            metadata.delete_blob(&blob.id).await?;
            tracing::info!(blob = %blob.id, backend = %blob.backend, "purged unattached blob");
        }
        purged += 1;
        bytes += size;
    }

    if dry_run {
        println!("{purged} blobs ({bytes} bytes) would be purged");
    } else {
        println!("purged {purged} blobs ({bytes} bytes)");
    }
    Ok(())
}

//! Holdfast server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use holdfast_core::AppConfig;
use holdfast_server::{build_state, create_router};

/// Holdfast - file attachment and serving daemon
#[derive(Parser, Debug)]
#[command(name = "holdfastd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "HOLDFAST_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Holdfast v{}", env!("CARGO_PKG_VERSION"));

    // Config file is optional; environment variables can provide or override
    // everything except the config path itself.
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    if config_path.exists() {
        tracing::info!(config_path = %args.config, "loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!(config_path = %args.config, "no config file found");
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("HOLDFAST_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    let bind = config.server.bind;
    let state = build_state(config).await?;
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!(bind = %bind, "listening");

    axum::serve(listener, router)
        .await
        .context("server error")?;

    Ok(())
}

//! Startup wiring: configuration to a ready [`AppState`].

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use holdfast_core::AppConfig;
use holdfast_media::MediaContext;
use holdfast_metadata::MetadataStore;
use holdfast_storage::BackendRegistry;

use crate::state::AppState;

/// Resolve every configured component and assemble the shared state.
///
/// Fails fast: a bad backend, an unreadable secret, or an unreachable
/// metadata store stops startup here rather than surfacing per-request.
pub async fn build_state(config: AppConfig) -> Result<AppState> {
    config.validate().context("invalid configuration")?;

    let signer = config
        .signing
        .secret
        .resolve()
        .context("failed to resolve signing secret")?;

    let registry = Arc::new(
        BackendRegistry::from_config(&config.backends, &config.service)
            .await
            .context("failed to initialize storage backends")?,
    );

    let metadata = holdfast_metadata::open(&config.metadata)
        .await
        .context("failed to open metadata store")?;
    metadata
        .health_check()
        .await
        .context("metadata store health check failed")?;

    info!(
        backends = registry.names().count(),
        default_backend = %config.service.default_backend,
        "state initialized"
    );

    let media = MediaContext::new(config.service.clone(), signer.clone(), metadata.clone());

    Ok(AppState {
        config: Arc::new(config),
        signer,
        registry,
        metadata,
        media,
    })
}

//! Shared application state.

use std::sync::Arc;

use holdfast_core::AppConfig;
use holdfast_media::MediaContext;
use holdfast_metadata::MetadataStore;
use holdfast_signer::TokenSigner;
use holdfast_storage::BackendRegistry;

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub signer: TokenSigner,
    pub registry: Arc<BackendRegistry>,
    pub metadata: Arc<dyn MetadataStore>,
    pub media: MediaContext,
}

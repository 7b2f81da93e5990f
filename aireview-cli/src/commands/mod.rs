//! CLI command implementations

pub mod catalog;
pub mod chat;
pub mod token;

pub use catalog::{ActionsArgs, ModelsArgs};
pub use chat::ChatArgs;
pub use token::TokenArgs;

use std::sync::Arc;

use aireview_core::{
    Config, CredentialBackend, CredentialResolver, CredentialSourceKind, GeminiClient,
    GeminiProvider, GerritTokenCredentials, LocalCredentials, Secrets,
};
use aireview_gerrit::GerritClient;

/// Build the provider the same way a host registration would
pub(crate) fn build_provider(
    config: &Config,
    secrets: &Secrets,
    gerrit: Arc<GerritClient>,
) -> anyhow::Result<GeminiProvider> {
    let backend: Arc<dyn CredentialBackend> = match config.review.credential_source {
        CredentialSourceKind::Local => Arc::new(LocalCredentials::new(secrets.clone())),
        CredentialSourceKind::Gerrit => Arc::new(GerritTokenCredentials::new(gerrit.clone())),
    };

    let generator = GeminiClient::from_config(&config.gemini)?;

    tracing::debug!(
        credential_source = %config.review.credential_source,
        model = %config.gemini.model,
        "Building provider"
    );

    Ok(GeminiProvider::from_config(
        config,
        CredentialResolver::new(backend),
        gerrit,
        Arc::new(generator),
    ))
}

//! Provider construction from configuration.

use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::info;

use crate::config::schema::ProviderConfig;

use super::base::LLMProvider;
use super::openai::OpenAIProvider;

/// Build the configured LLM provider.
///
/// `useAzure` selects the Azure deployment endpoint; otherwise a direct
/// OpenAI-compatible endpoint is used.
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn LLMProvider>> {
    if config.api_key.is_empty() {
        bail!("No API key configured; set OPENAI_API_KEY or provider.apiKey in the config file");
    }

    let provider: Arc<dyn LLMProvider> = if config.use_azure {
        let endpoint = match config.azure_endpoint.as_deref() {
            Some(endpoint) if !endpoint.is_empty() => endpoint,
            _ => bail!("useAzure is set but azureEndpoint is missing"),
        };
        let deployment = match config.azure_deployment.as_deref() {
            Some(deployment) if !deployment.is_empty() => deployment,
            _ => bail!("useAzure is set but azureDeployment is missing"),
        };
        Arc::new(OpenAIProvider::azure(
            &config.api_key,
            endpoint,
            deployment,
            &config.api_version,
        ))
    } else {
        Arc::new(OpenAIProvider::direct(
            &config.api_key,
            &config.model,
            config.api_base.as_deref(),
        ))
    };

    info!(
        provider = provider.provider_name(),
        model = provider.model(),
        "provider ready"
    );
    Ok(provider)
}

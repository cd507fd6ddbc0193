// src/services/language.rs

//! Language identification client.
//!
//! Keyword matching is language-aware, so a listing without an explicit
//! language gets one identified before curation. The actual detection runs
//! in an external NLP service; this module only holds its client interface
//! plus a fixed-language fallback for offline runs and tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

use crate::error::Result;
use crate::models::LanguageConfig;

/// Identifies the dominant language of a text.
#[async_trait]
pub trait LanguageIdentifier: Send + Sync {
    /// Return a two-letter language code for this text.
    async fn identify(&self, text: &str) -> Result<String>;
}

/// Client for a JSON language-identification endpoint.
///
/// The endpoint takes `{"text": "..."}` and answers `{"language": "sv"}`.
pub struct HttpLanguageIdentifier {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct IdentifyResponse {
    language: String,
}

impl HttpLanguageIdentifier {
    /// Build a client from the language service configuration.
    pub fn new(cfg: &LanguageConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&cfg.user_agent)
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: cfg.endpoint.clone(),
        })
    }
}

#[async_trait]
impl LanguageIdentifier for HttpLanguageIdentifier {
    async fn identify(&self, text: &str) -> Result<String> {
        debug!(
            "Identifying language of [{}..]",
            text.chars().take(20).collect::<String>()
        );
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?
            .error_for_status()?;
        let body: IdentifyResponse = response.json().await?;
        Ok(body.language)
    }
}

/// Fixed-language identifier, used when no endpoint is configured.
pub struct StaticLanguage(pub String);

#[async_trait]
impl LanguageIdentifier for StaticLanguage {
    async fn identify(&self, _text: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Build the identifier this deployment is configured for.
pub fn from_config(cfg: &LanguageConfig) -> Result<Arc<dyn LanguageIdentifier>> {
    if cfg.endpoint.trim().is_empty() {
        Ok(Arc::new(StaticLanguage(cfg.default.clone())))
    } else {
        Ok(Arc::new(HttpLanguageIdentifier::new(cfg)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_language() {
        let id = StaticLanguage("sv".to_string());
        assert_eq!(id.identify("whatever text").await.unwrap(), "sv");
    }

    #[tokio::test]
    async fn test_from_config_picks_static_without_endpoint() {
        let cfg = LanguageConfig::default();
        let id = from_config(&cfg).unwrap();
        assert_eq!(id.identify("text").await.unwrap(), cfg.default);
    }
}

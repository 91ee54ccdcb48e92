// Translation and language detection providers
//
// The session only talks to the traits below; the OpenAI-compatible client is
// the one network implementation. To add another backend, implement both
// traits and return it from `ProviderFactory`.

pub mod openai;
pub mod prompt;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ProviderConfig;
use crate::error::Result;
use crate::notify::SharedNotifier;
use crate::types::{TranslationRequest, TranslationResponse};

/// Produces translations. Errors carry a human-readable message.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    async fn translate(&self, request: &TranslationRequest) -> Result<TranslationResponse>;
}

/// Maps text to an ISO-639-1-like language code.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageDetector: Send + Sync {
    async fn detect(&self, text: &str) -> Result<String>;
}

/// Provider pair handed to a session.
#[derive(Clone)]
pub struct Providers {
    pub translator: Arc<dyn TranslationProvider>,
    pub detector: Arc<dyn LanguageDetector>,
}

/// Factory for creating provider instances
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create the OpenAI-compatible client serving both translation and detection
    pub fn create(config: ProviderConfig, notifier: SharedNotifier) -> Result<Providers> {
        let client = Arc::new(openai::OpenAiClient::new(config, notifier)?);
        Ok(Providers {
            translator: client.clone(),
            detector: client,
        })
    }
}

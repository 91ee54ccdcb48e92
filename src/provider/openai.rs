use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::prompt::{system_prompt, DETECTION_PROMPT};
use super::{LanguageDetector, TranslationProvider};
use crate::config::ProviderConfig;
use crate::error::{ParleyError, Result};
use crate::language::normalize_detected;
use crate::notify::{Notification, SharedNotifier};
use crate::types::{
    ContextualTranslation, Theme, TranslationOutcome, TranslationRequest, TranslationResponse,
    DEFAULT_LANGUAGE,
};

#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Payload requested from the model in contextual mode.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContextualPayload {
    main_translation: String,
    #[serde(default)]
    alternatives: Vec<ContextualTranslation>,
    #[serde(default)]
    detected_theme: Option<String>,
    #[serde(default)]
    detected_language: Option<String>,
}

/// Strip a Markdown code fence the model sometimes wraps JSON in.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Interpret the completion content for `request`.
pub fn parse_outcome(request: &TranslationRequest, content: &str) -> TranslationOutcome {
    let content = content.trim();
    if !request.include_contextual {
        return TranslationOutcome::Plain {
            text: content.to_string(),
        };
    }

    match serde_json::from_str::<ContextualPayload>(strip_code_fence(content)) {
        Ok(payload) => {
            let detected_theme = if request.theme == Theme::Auto {
                payload
                    .detected_theme
                    .as_deref()
                    .and_then(|theme| theme.parse::<Theme>().ok())
                    .filter(|theme| *theme != Theme::Auto)
            } else {
                None
            };
            let detected_language = if request.is_auto_source() {
                payload.detected_language.as_deref().and_then(normalize_detected)
            } else {
                None
            };

            TranslationOutcome::Contextual {
                text: payload.main_translation.trim().to_string(),
                alternatives: payload.alternatives,
                detected_theme,
                detected_language,
            }
        }
        Err(e) => {
            warn!("Failed to parse contextual translation, using raw content: {}", e);
            TranslationOutcome::DegradedContextual {
                text: content.to_string(),
            }
        }
    }
}

/// Client for an OpenAI-compatible chat completions API.
pub struct OpenAiClient {
    client: Client,
    config: ProviderConfig,
    api_key: Option<String>,
    notifier: SharedNotifier,
}

impl OpenAiClient {
    /// Build a client reading the API key from the configured environment variable.
    pub fn new(config: ProviderConfig, notifier: SharedNotifier) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        info!("API key available: {}", api_key.is_some());
        Self::with_api_key(config, api_key, notifier)
    }

    pub fn with_api_key(
        config: ProviderConfig,
        api_key: Option<String>,
        notifier: SharedNotifier,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ParleyError::Http)?;

        Ok(Self {
            client,
            config,
            api_key,
            notifier,
        })
    }

    fn missing_key_notification(&self, feature: &str) -> Notification {
        Notification::error("API key is missing")
            .with_description(format!(
                "Set the {} environment variable to use {}.",
                self.config.api_key_env, feature
            ))
            .persistent()
    }

    /// Send one chat completion and return the trimmed content of the first choice.
    async fn complete(
        &self,
        api_key: &str,
        system: &str,
        user: &str,
        temperature: f32,
        max_tokens: u32,
        failure: &str,
    ) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            temperature,
            max_tokens,
        };

        let url = format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'));
        debug!("Sending completion request to: {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ParleyError::Provider(format!("{}: {}", failure, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|body| body.error)
                .and_then(|detail| detail.message)
                .unwrap_or_else(|| failure.to_string());
            warn!("Completion API error {}: {}", status, body);
            return Err(ParleyError::Provider(message));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| ParleyError::Provider(format!("Failed to parse response: {}", e)))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default()
            .trim()
            .to_string();

        debug!("Raw completion content: {}", content);
        Ok(content)
    }
}

#[async_trait]
impl TranslationProvider for OpenAiClient {
    async fn translate(&self, request: &TranslationRequest) -> Result<TranslationResponse> {
        if request.text.trim().is_empty() {
            return Ok(TranslationResponse::text(""));
        }

        let Some(api_key) = self.api_key.as_deref() else {
            self.notifier.notify(self.missing_key_notification("translation features"));
            return Ok(TranslationResponse::failed(
                format!(
                    "ERROR: API key is missing. Please set the {} environment variable.",
                    self.config.api_key_env
                ),
                "API key missing",
            ));
        };

        let temperature = if request.include_contextual {
            self.config.contextual_temperature
        } else {
            self.config.plain_temperature
        };

        let content = self
            .complete(
                api_key,
                &system_prompt(request),
                &request.text,
                temperature,
                self.config.max_tokens,
                "Translation failed",
            )
            .await?;

        Ok(parse_outcome(request, &content).into())
    }
}

#[async_trait]
impl LanguageDetector for OpenAiClient {
    async fn detect(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(DEFAULT_LANGUAGE.to_string());
        }

        let Some(api_key) = self.api_key.as_deref() else {
            self.notifier.notify(self.missing_key_notification("language detection"));
            return Ok(DEFAULT_LANGUAGE.to_string());
        };

        let content = self
            .complete(
                api_key,
                DETECTION_PROMPT,
                text,
                0.1,
                self.config.detect_max_tokens,
                "Language detection failed",
            )
            .await
            .map_err(|e| ParleyError::Detection(e.user_message()))?;

        normalize_detected(&content).ok_or_else(|| {
            ParleyError::Detection(format!("Unrecognized language code '{}'", content))
        })
    }
}

use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{PlayerCommand, SpeechBackend, Utterance};
use crate::config::SpeechConfig;
use crate::error::{ParleyError, Result};
use crate::language::base_language;

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Deserialize)]
struct SpeechErrorBody {
    message: Option<String>,
    detail: Option<SpeechErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct SpeechErrorDetail {
    message: Option<String>,
}

/// Voice for a language code, using the base language (`en-US` -> `en`) and
/// falling back to the `default` entry.
pub fn voice_for_language<'a>(voices: &'a BTreeMap<String, String>, lang: &str) -> Option<&'a str> {
    let base = base_language(lang).to_lowercase();
    voices
        .get(&base)
        .or_else(|| voices.get("default"))
        .map(String::as_str)
}

/// Renders speech with the ElevenLabs API and plays the audio with a local player
pub struct ElevenLabsBackend {
    client: Client,
    config: SpeechConfig,
    api_key: Option<String>,
}

impl ElevenLabsBackend {
    pub fn new(config: SpeechConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: SpeechConfig, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(ParleyError::Http)?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    async fn fetch_audio(&self, api_key: &str, voice: &str, text: &str) -> Result<Vec<u8>> {
        let url = format!(
            "{}/text-to-speech/{}/stream",
            self.config.endpoint.trim_end_matches('/'),
            voice
        );
        debug!("Requesting speech from: {}", url);

        let body = SpeechRequest {
            text,
            model_id: &self.config.model_id,
            voice_settings: VoiceSettings {
                stability: self.config.stability,
                similarity_boost: self.config.similarity_boost,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ParleyError::Speech(format!("Failed to generate speech: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let raw = response.text().await.unwrap_or_default();
            warn!("Speech API error {}: {}", status, raw);
            let message = serde_json::from_str::<SpeechErrorBody>(&raw)
                .ok()
                .and_then(|body| body.message.or(body.detail.and_then(|detail| detail.message)))
                .unwrap_or_else(|| "Failed to convert text to speech".to_string());
            return Err(ParleyError::Speech(message));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| ParleyError::Speech(format!("Failed to read audio: {}", e)))?;
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl SpeechBackend for ElevenLabsBackend {
    async fn render(&self, text: &str, lang: &str) -> Result<Utterance> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ParleyError::Speech("ElevenLabs API key is missing".to_string()))?;
        let voice = voice_for_language(&self.config.voices, lang)
            .ok_or_else(|| ParleyError::Speech(format!("No voice configured for '{}'", lang)))?;

        let audio = self.fetch_audio(api_key, voice, text).await?;
        info!("Received {} bytes of speech audio", audio.len());

        let mut file = tempfile::Builder::new()
            .prefix("parley-speech-")
            .suffix(".mp3")
            .tempfile()?;
        file.write_all(&audio)?;
        file.flush()?;
        let audio_path = file.into_temp_path();

        let file_arg = audio_path.to_string_lossy().to_string();
        let command = PlayerCommand::new(&self.config.player_binary, "Audio playback")
            .templated_args(&self.config.player_args, &[("file", file_arg.as_str())]);

        Ok(Utterance::with_audio(command, audio_path))
    }
}

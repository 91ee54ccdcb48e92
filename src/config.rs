use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use crate::error::{Result, ParleyError};
use crate::types::{Theme, Tone};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub clipboard: ClipboardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of an OpenAI-compatible API
    pub endpoint: String,
    /// Model used for translation and detection
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Sampling temperature for plain translations
    pub plain_temperature: f32,
    /// Sampling temperature for contextual translations
    pub contextual_temperature: f32,
    /// Completion token budget for translations
    pub max_tokens: u32,
    /// Completion token budget for language detection
    pub detect_max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Quiet period after the last edit before a translation fires
    pub debounce_ms: u64,
    /// Initial source language (`auto` allowed)
    pub source_lang: String,
    /// Initial target language
    pub target_lang: String,
    pub theme: Theme,
    pub tone: Tone,
    /// Start with contextual alternatives enabled
    pub contextual: bool,
    /// Character limit shown next to the input
    pub max_characters: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Directory for the durable key/value store
    pub storage_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechBackendKind {
    /// Local TTS binary (espeak-ng, say, ...)
    System,
    /// ElevenLabs text-to-speech API, played through `player_binary`
    ElevenLabs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub backend: SpeechBackendKind,
    /// Local TTS binary used by the system backend
    pub system_binary: String,
    /// Arguments for the system binary; `{lang}` and `{text}` are substituted
    pub system_args: Vec<String>,
    /// ElevenLabs API base URL
    pub endpoint: String,
    /// Environment variable holding the ElevenLabs API key
    pub api_key_env: String,
    pub model_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
    /// Base language code -> voice id; `default` is used for anything else
    pub voices: BTreeMap<String, String>,
    /// Audio player for rendered speech
    pub player_binary: String,
    /// Arguments for the player; `{file}` is substituted
    pub player_args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipboardConfig {
    /// Binary that reads the text to copy from stdin
    pub binary: String,
    pub args: Vec<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
            plain_temperature: 0.3,
            contextual_temperature: 0.7,
            max_tokens: 1500,
            detect_max_tokens: 10,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            source_lang: "en".to_string(),
            target_lang: "es".to_string(),
            theme: Theme::Auto,
            tone: Tone::Neutral,
            contextual: false,
            max_characters: 5000,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(".parley/storage"),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        let voices = [
            ("default", "21m00Tcm4TlvDq8ikWAM"),
            ("en", "21m00Tcm4TlvDq8ikWAM"),
            ("de", "AZnzlk1XvdvUeBnXmlld"),
            ("es", "EXAVITQu4vr4xnSDxMaL"),
            ("fr", "MF3mGyEYCl7XYWbV9V6O"),
            ("it", "UeuTzRN3HjgJUw7W4KRl"),
        ]
        .into_iter()
        .map(|(lang, voice)| (lang.to_string(), voice.to_string()))
        .collect();

        Self {
            backend: SpeechBackendKind::System,
            system_binary: "espeak-ng".to_string(),
            system_args: vec!["-v".to_string(), "{lang}".to_string(), "{text}".to_string()],
            endpoint: "https://api.elevenlabs.io/v1".to_string(),
            api_key_env: "ELEVENLABS_API_KEY".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            stability: 0.5,
            similarity_boost: 0.75,
            voices,
            player_binary: "ffplay".to_string(),
            player_args: vec![
                "-nodisp".to_string(),
                "-autoexit".to_string(),
                "-loglevel".to_string(),
                "quiet".to_string(),
                "{file}".to_string(),
            ],
        }
    }
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        let (binary, args) = if cfg!(target_os = "macos") {
            ("pbcopy", vec![])
        } else {
            ("xclip", vec!["-selection".to_string(), "clipboard".to_string()])
        };
        Self {
            binary: binary.to_string(),
            args,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ParleyError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| ParleyError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ParleyError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ParleyError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}

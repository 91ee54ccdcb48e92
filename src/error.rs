use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParleyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Translation error: {0}")]
    Provider(String),

    #[error("Language detection error: {0}")]
    Detection(String),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported value: {0}")]
    Unsupported(String),
}

impl ParleyError {
    /// Message suitable for showing to the user, without the category prefix.
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(msg)
            | Self::Detection(msg)
            | Self::Speech(msg)
            | Self::Storage(msg)
            | Self::Clipboard(msg)
            | Self::Config(msg)
            | Self::Unsupported(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ParleyError>;

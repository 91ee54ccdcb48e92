use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParleyError;

/// Source language value that asks the provider to work out the language itself.
pub const AUTO_LANGUAGE: &str = "auto";

/// Language used when nothing better is known (detection fallback, swap fallback).
pub const DEFAULT_LANGUAGE: &str = "en";

/// Domain register hint passed to the provider.
///
/// `Auto` is not the same as `General`: only `Auto` asks the provider to
/// report which theme it detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Auto,
    General,
    Technical,
    Medical,
    Legal,
    Business,
    Academic,
    Literary,
    Casual,
}

impl Theme {
    pub const ALL: [Theme; 9] = [
        Theme::Auto,
        Theme::General,
        Theme::Technical,
        Theme::Medical,
        Theme::Legal,
        Theme::Business,
        Theme::Academic,
        Theme::Literary,
        Theme::Casual,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::General => "general",
            Self::Technical => "technical",
            Self::Medical => "medical",
            Self::Legal => "legal",
            Self::Business => "business",
            Self::Academic => "academic",
            Self::Literary => "literary",
            Self::Casual => "casual",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ParleyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|theme| theme.as_str() == wanted)
            .ok_or_else(|| ParleyError::Unsupported(format!("unknown theme '{}'", s)))
    }
}

/// Emotional register hint passed to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Neutral,
    Formal,
    Informal,
    Friendly,
    Professional,
}

impl Tone {
    pub const ALL: [Tone; 5] = [
        Tone::Neutral,
        Tone::Formal,
        Tone::Informal,
        Tone::Friendly,
        Tone::Professional,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Formal => "formal",
            Self::Informal => "informal",
            Self::Friendly => "friendly",
            Self::Professional => "professional",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = ParleyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|tone| tone.as_str() == wanted)
            .ok_or_else(|| ParleyError::Unsupported(format!("unknown tone '{}'", s)))
    }
}

/// One translation request. Every field takes part in the cache fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRequest {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
    pub include_contextual: bool,
    pub theme: Theme,
    pub tone: Tone,
}

impl TranslationRequest {
    pub fn new<S1, S2, S3>(text: S1, source_lang: S2, target_lang: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self {
            text: text.into(),
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            include_contextual: false,
            theme: Theme::default(),
            tone: Tone::default(),
        }
    }

    pub fn contextual(mut self, include_contextual: bool) -> Self {
        self.include_contextual = include_contextual;
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    pub fn is_auto_source(&self) -> bool {
        self.source_lang == AUTO_LANGUAGE
    }
}

/// Alternative rendering offered in contextual mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextualTranslation {
    pub text: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResponse {
    pub translated_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_theme: Option<Theme>,
    #[serde(default)]
    pub alternatives: Vec<ContextualTranslation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TranslationResponse {
    pub fn text<S: Into<String>>(translated_text: S) -> Self {
        Self {
            translated_text: translated_text.into(),
            ..Self::default()
        }
    }

    /// Response standing in for a call that never happened, e.g. a missing credential.
    pub fn failed<S1: Into<String>, S2: Into<String>>(translated_text: S1, error: S2) -> Self {
        Self {
            translated_text: translated_text.into(),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// What the provider produced, decided by `include_contextual` when the
/// request was built. `DegradedContextual` is only used when a contextual
/// payload could not be parsed and the raw content was kept as plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    Plain {
        text: String,
    },
    Contextual {
        text: String,
        alternatives: Vec<ContextualTranslation>,
        detected_theme: Option<Theme>,
        detected_language: Option<String>,
    },
    DegradedContextual {
        text: String,
    },
}

impl TranslationOutcome {
    pub fn text(&self) -> &str {
        match self {
            Self::Plain { text }
            | Self::Contextual { text, .. }
            | Self::DegradedContextual { text } => text,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::DegradedContextual { .. })
    }
}

impl From<TranslationOutcome> for TranslationResponse {
    fn from(outcome: TranslationOutcome) -> Self {
        match outcome {
            TranslationOutcome::Plain { text } | TranslationOutcome::DegradedContextual { text } => {
                TranslationResponse::text(text)
            }
            TranslationOutcome::Contextual {
                text,
                alternatives,
                detected_theme,
                detected_language,
            } => TranslationResponse {
                translated_text: text,
                detected_language,
                detected_theme,
                alternatives,
                error: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_parse_is_case_insensitive() {
        assert_eq!("Medical".parse::<Theme>().unwrap(), Theme::Medical);
        assert_eq!(" auto ".parse::<Theme>().unwrap(), Theme::Auto);
        assert!("poetry".parse::<Theme>().is_err());
    }

    #[test]
    fn test_auto_and_general_are_distinct() {
        assert_ne!(Theme::Auto, Theme::General);
        assert_eq!(Theme::default(), Theme::Auto);
    }

    #[test]
    fn test_tone_parse() {
        assert_eq!("friendly".parse::<Tone>().unwrap(), Tone::Friendly);
        assert!("angry".parse::<Tone>().is_err());
    }

    #[test]
    fn test_contextual_outcome_keeps_side_channels() {
        let outcome = TranslationOutcome::Contextual {
            text: "Hola".to_string(),
            alternatives: vec![ContextualTranslation {
                text: "Buenas".to_string(),
                explanation: "informal greeting".to_string(),
                context: None,
                style: Some("casual".to_string()),
            }],
            detected_theme: Some(Theme::Casual),
            detected_language: Some("en".to_string()),
        };

        let response = TranslationResponse::from(outcome);
        assert_eq!(response.translated_text, "Hola");
        assert_eq!(response.alternatives.len(), 1);
        assert_eq!(response.detected_theme, Some(Theme::Casual));
        assert_eq!(response.detected_language.as_deref(), Some("en"));
    }

    #[test]
    fn test_degraded_outcome_has_no_alternatives() {
        let outcome = TranslationOutcome::DegradedContextual {
            text: "{not json".to_string(),
        };
        assert!(outcome.is_degraded());

        let response = TranslationResponse::from(outcome);
        assert!(response.alternatives.is_empty());
        assert!(!response.is_error());
    }

    #[test]
    fn test_response_wire_names_are_camel_case() {
        let response = TranslationResponse::text("Hola");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["translatedText"], "Hola");
        assert!(json.get("error").is_none());
    }
}

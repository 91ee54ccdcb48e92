use std::fmt;

use serde::Serialize;

use crate::types::{ContextualTranslation, Theme, Tone};

/// Where the current translation attempt is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Phase {
    /// No source text.
    #[default]
    Idle,
    /// Waiting out the quiet period before firing.
    Debouncing,
    /// Provider call outstanding.
    InFlight,
    Resolved,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "Idle"),
            Phase::Debouncing => write!(f, "Debouncing"),
            Phase::InFlight => write!(f, "InFlight"),
            Phase::Resolved => write!(f, "Resolved"),
            Phase::Failed => write!(f, "Failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CharacterCount {
    pub current: usize,
    pub max: usize,
}

impl CharacterCount {
    pub fn is_over_limit(&self) -> bool {
        self.current > self.max
    }
}

/// Snapshot of everything the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    pub source_text: String,
    pub translated_text: String,
    pub source_lang: String,
    pub target_lang: String,
    pub contextual_mode: bool,
    pub theme: Theme,
    pub tone: Tone,
    pub detected_language: Option<String>,
    pub detected_theme: Option<Theme>,
    pub alternatives: Vec<ContextualTranslation>,
    pub phase: Phase,
    pub is_translating: bool,
    pub is_detecting: bool,
    pub is_speaking: bool,
    pub error: Option<String>,
    pub character_count: CharacterCount,
}

impl SessionState {
    pub(crate) fn new(
        source_lang: &str,
        target_lang: &str,
        theme: Theme,
        tone: Tone,
        contextual_mode: bool,
        max_characters: usize,
    ) -> Self {
        Self {
            source_text: String::new(),
            translated_text: String::new(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            contextual_mode,
            theme,
            tone,
            detected_language: None,
            detected_theme: None,
            alternatives: Vec::new(),
            phase: Phase::Idle,
            is_translating: false,
            is_detecting: false,
            is_speaking: false,
            error: None,
            character_count: CharacterCount {
                current: 0,
                max: max_characters,
            },
        }
    }

    pub fn has_source_text(&self) -> bool {
        !self.source_text.trim().is_empty()
    }
}

//! In-memory translation cache keyed by request fingerprint.
//!
//! Entries live for the lifetime of the process: no capacity bound, no TTL.

use std::collections::HashMap;

use tracing::debug;

use crate::types::{TranslationRequest, TranslationResponse};

/// Deterministic cache key for a request.
///
/// The free-text field is length-prefixed so that no combination of text and
/// language codes can produce the same key as another request.
pub fn fingerprint(request: &TranslationRequest) -> String {
    format!(
        "{}|{}|{}|{}|{}|{}:{}",
        request.source_lang,
        request.target_lang,
        if request.include_contextual { "contextual" } else { "simple" },
        request.theme,
        request.tone,
        request.text.len(),
        request.text,
    )
}

#[derive(Debug, Default)]
pub struct TranslationCache {
    entries: HashMap<String, TranslationResponse>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, request: &TranslationRequest) -> Option<TranslationResponse> {
        let hit = self.entries.get(&fingerprint(request)).cloned();
        debug!(
            hit = hit.is_some(),
            target = %request.target_lang,
            contextual = request.include_contextual,
            "Translation cache lookup"
        );
        hit
    }

    /// Store a response, replacing any previous entry for the same request.
    pub fn put(&mut self, request: &TranslationRequest, response: TranslationResponse) {
        self.entries.insert(fingerprint(request), response);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }
}

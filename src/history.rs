//! Translation history: newest first, capped, persisted on every change.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::storage::KeyValueStore;

/// Storage key holding the serialized history list.
pub const HISTORY_KEY: &str = "translationHistory";

/// Maximum number of entries kept.
pub const HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    /// Creation time in milliseconds since the epoch, bumped to stay unique.
    pub id: u64,
    pub source_text: String,
    pub translated_text: String,
    pub source_lang: String,
    pub target_lang: String,
    /// Human label computed when the entry was created.
    pub timestamp: String,
}

/// `"Today, HH:MM"`, `"Yesterday, HH:MM"` or `"Mon D, HH:MM"`, comparing
/// calendar days of `at` and `now`.
pub fn human_timestamp(at: DateTime<Local>, now: DateTime<Local>) -> String {
    let day = at.date_naive();
    let today = now.date_naive();
    let time = at.format("%H:%M");

    if day == today {
        format!("Today, {}", time)
    } else if today.pred_opt() == Some(day) {
        format!("Yesterday, {}", time)
    } else {
        at.format("%b %-d, %H:%M").to_string()
    }
}

pub struct HistoryStore {
    items: Vec<HistoryItem>,
    storage: Box<dyn KeyValueStore>,
    last_id: u64,
}

impl HistoryStore {
    /// Load the previous snapshot. A missing or unreadable snapshot yields an
    /// empty history.
    pub fn open(storage: Box<dyn KeyValueStore>) -> Self {
        let mut items = match storage.get(HISTORY_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<HistoryItem>>(&raw) {
                Ok(items) => items,
                Err(e) => {
                    warn!("Failed to load translation history, starting empty: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read translation history, starting empty: {}", e);
                Vec::new()
            }
        };
        items.truncate(HISTORY_LIMIT);

        let last_id = items.iter().map(|item| item.id).max().unwrap_or(0);
        info!("Loaded {} history entries", items.len());

        Self {
            items,
            storage,
            last_id,
        }
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Prepend an entry. Blank source or translated text is ignored.
    pub fn append(
        &mut self,
        source_text: &str,
        translated_text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Option<HistoryItem> {
        self.append_at(Local::now(), source_text, translated_text, source_lang, target_lang)
    }

    pub(crate) fn append_at(
        &mut self,
        now: DateTime<Local>,
        source_text: &str,
        translated_text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Option<HistoryItem> {
        if source_text.trim().is_empty() || translated_text.trim().is_empty() {
            return None;
        }

        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let id = millis.max(self.last_id + 1);
        self.last_id = id;

        let item = HistoryItem {
            id,
            source_text: source_text.to_string(),
            translated_text: translated_text.to_string(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            timestamp: human_timestamp(now, now),
        };

        self.items.insert(0, item.clone());
        self.items.truncate(HISTORY_LIMIT);
        debug!(id, entries = self.items.len(), "History entry added");
        self.persist();

        Some(item)
    }

    /// Remove every entry whose id is listed. Returns how many were removed.
    pub fn remove(&mut self, ids: &[u64]) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !ids.contains(&item.id));
        let removed = before - self.items.len();
        if removed > 0 {
            self.persist();
        }
        removed
    }

    pub fn clear(&mut self) -> usize {
        let removed = self.items.len();
        self.items.clear();
        self.persist();
        removed
    }

    fn persist(&mut self) {
        let serialized = match serde_json::to_string(&self.items) {
            Ok(serialized) => serialized,
            Err(e) => {
                warn!("Failed to serialize translation history: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.set(HISTORY_KEY, &serialized) {
            warn!("Failed to save translation history: {}", e);
        }
    }
}

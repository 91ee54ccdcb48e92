//! Parley - Translation front end
//!
//! Debounced, cached translation sessions backed by an OpenAI-compatible
//! chat API, with contextual alternatives, text-to-speech playback and a
//! persisted history of recent translations.

pub mod cache;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod history;
pub mod language;
pub mod notify;
pub mod provider;
pub mod repl;
pub mod session;
pub mod speech;
pub mod storage;
pub mod types;

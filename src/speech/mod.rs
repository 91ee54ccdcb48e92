// Text-to-speech playback
//
// A backend turns text into an `Utterance` (a player command, optionally with
// a rendered audio file). `SpeechSession` owns the single active playback:
// starting a new one stops the previous one first.

pub mod command;
pub mod elevenlabs;
pub mod system;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tempfile::TempPath;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use command::PlayerCommand;

use crate::config::{SpeechBackendKind, SpeechConfig};
use crate::error::Result;
use crate::notify::{Notification, SharedNotifier};

/// A ready-to-play utterance. The rendered audio file, if any, is removed
/// when the utterance is dropped.
pub struct Utterance {
    pub command: PlayerCommand,
    /// Kept alive until playback finishes.
    _audio: Option<TempPath>,
}

impl Utterance {
    pub fn command(command: PlayerCommand) -> Self {
        Self { command, _audio: None }
    }

    pub fn with_audio(command: PlayerCommand, audio: TempPath) -> Self {
        Self {
            command,
            _audio: Some(audio),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    async fn render(&self, text: &str, lang: &str) -> Result<Utterance>;
}

/// Playback callbacks. `on_error` is always followed by `on_end`.
pub trait PlaybackObserver: Send + Sync {
    fn on_start(&self) {}
    fn on_end(&self) {}
    fn on_error(&self, _message: &str) {}
}

/// Ensures each playback reports start at most once and end exactly once.
struct PlaybackSignals {
    observer: Arc<dyn PlaybackObserver>,
    finished: AtomicBool,
}

impl PlaybackSignals {
    fn started(&self) {
        if !self.finished.load(Ordering::SeqCst) {
            self.observer.on_start();
        }
    }

    fn ended(&self) {
        if !self.finished.swap(true, Ordering::SeqCst) {
            self.observer.on_end();
        }
    }

    fn failed(&self, message: &str) {
        if !self.finished.load(Ordering::SeqCst) {
            self.observer.on_error(message);
        }
        self.ended();
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

struct ActivePlayback {
    id: u64,
    token: CancellationToken,
    signals: Arc<PlaybackSignals>,
    handle: JoinHandle<()>,
}

pub struct SpeechSession {
    backend: Arc<dyn SpeechBackend>,
    notifier: SharedNotifier,
    active: Option<ActivePlayback>,
    next_id: AtomicU64,
}

impl SpeechSession {
    pub fn new(backend: Arc<dyn SpeechBackend>, notifier: SharedNotifier) -> Self {
        Self {
            backend,
            notifier,
            active: None,
            next_id: AtomicU64::new(1),
        }
    }

    /// Start speaking `text`, stopping any current playback first.
    /// Returns the playback id, or `None` for blank text.
    pub fn speak(&mut self, text: &str, lang: &str, observer: Arc<dyn PlaybackObserver>) -> Option<u64> {
        self.stop();
        if text.trim().is_empty() {
            return None;
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let token = CancellationToken::new();
        let signals = Arc::new(PlaybackSignals {
            observer,
            finished: AtomicBool::new(false),
        });

        info!(playback = id, lang, "Starting speech playback");
        let handle = tokio::spawn(run_playback(
            self.backend.clone(),
            self.notifier.clone(),
            text.to_string(),
            lang.to_string(),
            token.clone(),
            signals.clone(),
        ));

        self.active = Some(ActivePlayback {
            id,
            token,
            signals,
            handle,
        });
        Some(id)
    }

    /// Stop the current playback. Safe to call when nothing is playing.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            if !active.signals.is_finished() {
                debug!(playback = active.id, "Stopping speech playback");
            }
            active.token.cancel();
            active.signals.ended();
            drop(active.handle);
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.signals.is_finished())
    }
}

impl Drop for SpeechSession {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.token.cancel();
        }
    }
}

async fn run_playback(
    backend: Arc<dyn SpeechBackend>,
    notifier: SharedNotifier,
    text: String,
    lang: String,
    token: CancellationToken,
    signals: Arc<PlaybackSignals>,
) {
    let fail = |message: String| {
        warn!("Speech playback failed: {}", message);
        notifier.notify(Notification::error("Text-to-speech playback failed").with_description(message.clone()));
        signals.failed(&message);
    };

    let rendered = tokio::select! {
        _ = token.cancelled() => return,
        rendered = backend.render(&text, &lang) => rendered,
    };
    let utterance = match rendered {
        Ok(utterance) => utterance,
        Err(e) => return fail(e.user_message()),
    };

    let mut child = match utterance.command.spawn() {
        Ok(child) => child,
        Err(e) => return fail(e.user_message()),
    };
    signals.started();

    let status = tokio::select! {
        _ = token.cancelled() => {
            if let Err(e) = child.kill().await {
                debug!("Failed to kill player: {}", e);
            }
            return;
        }
        status = child.wait() => status,
    };

    match status {
        Ok(status) if status.success() => signals.ended(),
        Ok(status) => fail(format!("{} exited with {}", utterance.command.description, status)),
        Err(e) => fail(format!("{} failed: {}", utterance.command.description, e)),
    }
}

/// Factory for creating speech backends
pub struct SpeechBackendFactory;

impl SpeechBackendFactory {
    pub fn create_backend(config: SpeechConfig) -> Result<Arc<dyn SpeechBackend>> {
        match config.backend {
            SpeechBackendKind::System => Ok(Arc::new(system::SystemBackend::new(&config))),
            SpeechBackendKind::ElevenLabs => Ok(Arc::new(elevenlabs::ElevenLabsBackend::new(config)?)),
        }
    }
}

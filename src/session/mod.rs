//! Translation session: owns the user-visible state and drives the request
//! lifecycle.
//!
//! Every user intent and every asynchronous completion is applied on the
//! task that owns the `Session`. Provider calls run on spawned tasks and
//! report back through an internal channel tagged with the attempt number
//! they were started for; only the current attempt may touch the state.
//!
//! ```text
//! Idle --input--> Debouncing --quiet period--> InFlight --ok--> Resolved
//!   ^                 |  ^                        |  \--err--> Failed
//!   |                 |  \------- new input ------/
//!   \-- blank input --/        (late result dropped)
//! ```

mod state;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use state::{CharacterCount, Phase, SessionState};

use crate::cache::TranslationCache;
use crate::clipboard::Clipboard;
use crate::config::SessionConfig;
use crate::error::{ParleyError, Result};
use crate::history::HistoryStore;
use crate::language::display_name;
use crate::notify::{Notification, SharedNotifier};
use crate::provider::Providers;
use crate::speech::{PlaybackObserver, SpeechSession};
use crate::types::{
    Theme, Tone, TranslationRequest, TranslationResponse, AUTO_LANGUAGE, DEFAULT_LANGUAGE,
};

/// User actions accepted by [`Session::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    SetSourceText(String),
    SetSourceLang(String),
    SetTargetLang(String),
    SetTheme(Theme),
    SetTone(Tone),
    ToggleContextualMode,
    TranslateNow,
    DetectLanguage,
    SwapLanguages,
    SpeakSource,
    SpeakTranslation,
    StopSpeaking,
    CopyTranslation,
    CopyAlternative(usize),
    RemoveHistory(Vec<u64>),
    ClearHistory,
}

/// Collaborators injected into a session.
pub struct SessionDeps {
    pub providers: Providers,
    pub speech: SpeechSession,
    pub clipboard: Arc<dyn Clipboard>,
    pub notifier: SharedNotifier,
}

enum SessionEvent {
    Translated {
        attempt: u64,
        request_id: Uuid,
        request: TranslationRequest,
        result: Result<TranslationResponse>,
    },
    Detected {
        detection: u64,
        text: String,
        result: Result<String>,
    },
    SpeechChanged,
}

enum Wake {
    Intent(Intent),
    Deadline,
    Event(SessionEvent),
    Closed,
}

/// Forwards playback callbacks into the session's event channel.
struct SpeechForwarder {
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl PlaybackObserver for SpeechForwarder {
    fn on_start(&self) {
        let _ = self.events.send(SessionEvent::SpeechChanged);
    }

    fn on_end(&self) {
        let _ = self.events.send(SessionEvent::SpeechChanged);
    }
}

async fn wait_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

pub struct Session {
    state: SessionState,
    debounce: Duration,
    cache: TranslationCache,
    history: HistoryStore,
    providers: Providers,
    speech: SpeechSession,
    clipboard: Arc<dyn Clipboard>,
    notifier: SharedNotifier,
    /// Number of the newest translation attempt; older completions are stale.
    attempt: u64,
    detection: u64,
    deadline: Option<Instant>,
    /// Spawned provider calls whose completion has not been applied yet.
    in_flight: usize,
    last_recorded: Option<String>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    state_tx: watch::Sender<SessionState>,
}

impl Session {
    pub fn new(
        config: &SessionConfig,
        cache: TranslationCache,
        history: HistoryStore,
        deps: SessionDeps,
    ) -> Self {
        let state = SessionState::new(
            &config.source_lang,
            &config.target_lang,
            config.theme,
            config.tone,
            config.contextual,
            config.max_characters,
        );
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(state.clone());

        Self {
            state,
            debounce: Duration::from_millis(config.debounce_ms),
            cache,
            history,
            providers: deps.providers,
            speech: deps.speech,
            clipboard: deps.clipboard,
            notifier: deps.notifier,
            attempt: 0,
            detection: 0,
            deadline: None,
            in_flight: 0,
            last_recorded: None,
            events_tx,
            events_rx,
            state_tx,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Receive a fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    fn publish(&self) {
        debug!(phase = %self.state.phase, "Publishing state");
        self.state_tx.send_replace(self.state.clone());
    }

    fn current_request(&self) -> TranslationRequest {
        TranslationRequest::new(
            self.state.source_text.clone(),
            self.state.source_lang.clone(),
            self.state.target_lang.clone(),
        )
        .contextual(self.state.contextual_mode)
        .theme(self.state.theme)
        .tone(self.state.tone)
    }

    pub fn set_source_text<S: Into<String>>(&mut self, text: S) {
        let text = text.into();
        if text == self.state.source_text {
            return;
        }
        self.state.character_count.current = text.chars().count();
        self.state.source_text = text;
        self.input_changed();
    }

    pub fn set_source_lang<S: Into<String>>(&mut self, lang: S) {
        let lang = lang.into();
        if lang == self.state.source_lang {
            return;
        }
        self.state.source_lang = lang;
        self.input_changed();
    }

    pub fn set_target_lang<S: Into<String>>(&mut self, lang: S) {
        let lang = lang.into();
        if lang == self.state.target_lang {
            return;
        }
        self.state.target_lang = lang;
        self.input_changed();
    }

    pub fn set_theme(&mut self, theme: Theme) {
        if theme == self.state.theme {
            return;
        }
        self.state.theme = theme;
        self.input_changed();
    }

    pub fn set_tone(&mut self, tone: Tone) {
        if tone == self.state.tone {
            return;
        }
        self.state.tone = tone;
        self.input_changed();
    }

    /// Flip contextual mode; with text present, translate right away.
    pub fn toggle_contextual_mode(&mut self) {
        self.state.contextual_mode = !self.state.contextual_mode;
        info!(contextual = self.state.contextual_mode, "Contextual mode toggled");
        if self.state.has_source_text() {
            self.translate_now();
        } else {
            self.publish();
        }
    }

    /// Start a new attempt immediately, superseding anything pending.
    pub fn translate_now(&mut self) {
        self.attempt += 1;
        self.fire();
    }

    /// Exchange texts and languages. The new target prefers the detected
    /// language, then `en` when the old source was `auto`, then the old source.
    pub fn swap_languages(&mut self) {
        let previous_source = std::mem::take(&mut self.state.source_lang);
        let new_target = match self.state.detected_language.take() {
            Some(detected) => detected,
            None if previous_source == AUTO_LANGUAGE => DEFAULT_LANGUAGE.to_string(),
            None => previous_source,
        };
        self.state.source_lang = std::mem::replace(&mut self.state.target_lang, new_target);
        std::mem::swap(&mut self.state.source_text, &mut self.state.translated_text);
        self.state.character_count.current = self.state.source_text.chars().count();
        self.state.detected_theme = None;
        self.state.alternatives.clear();

        info!(
            source = %self.state.source_lang,
            target = %self.state.target_lang,
            "Languages swapped"
        );
        self.input_changed();
    }

    /// Ask the detector for the source language, then translate with it.
    pub fn detect_language(&mut self) {
        if !self.state.has_source_text() {
            return;
        }

        self.detection += 1;
        let detection = self.detection;
        self.state.is_detecting = true;
        self.publish();

        let detector = self.providers.detector.clone();
        let events = self.events_tx.clone();
        let text = self.state.source_text.clone();
        self.in_flight += 1;
        let task_text = text.clone();
        let task = tokio::spawn(async move { detector.detect(&task_text).await });
        tokio::spawn(async move {
            let result = task
                .await
                .unwrap_or_else(|e| Err(ParleyError::Detection(format!("Detection task failed: {}", e))));
            let _ = events.send(SessionEvent::Detected {
                detection,
                text,
                result,
            });
        });
    }

    pub fn speak_source(&mut self) {
        let lang = if self.state.source_lang == AUTO_LANGUAGE {
            self.state
                .detected_language
                .clone()
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
        } else {
            self.state.source_lang.clone()
        };
        let text = self.state.source_text.clone();
        self.speak(&text, &lang);
    }

    pub fn speak_translation(&mut self) {
        let text = self.state.translated_text.clone();
        let lang = self.state.target_lang.clone();
        self.speak(&text, &lang);
    }

    fn speak(&mut self, text: &str, lang: &str) {
        let observer = Arc::new(SpeechForwarder {
            events: self.events_tx.clone(),
        });
        self.speech.speak(text, lang, observer);
        self.sync_speaking();
    }

    pub fn stop_speaking(&mut self) {
        self.speech.stop();
        self.sync_speaking();
    }

    fn sync_speaking(&mut self) {
        let speaking = self.speech.is_speaking();
        if speaking != self.state.is_speaking {
            self.state.is_speaking = speaking;
            self.publish();
        }
    }

    /// Copy the translated text, reporting the outcome as a notification.
    pub async fn copy_translation(&self) -> bool {
        self.copy_text(&self.state.translated_text).await
    }

    /// Copy one contextual alternative by position.
    pub async fn copy_alternative(&self, index: usize) -> bool {
        match self.state.alternatives.get(index) {
            Some(alternative) => self.copy_text(&alternative.text).await,
            None => false,
        }
    }

    async fn copy_text(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }

        match self.clipboard.copy(text).await {
            Ok(()) => {
                self.notifier.notify(Notification::success("Copied to clipboard"));
                true
            }
            Err(e) => {
                warn!("Copy failed: {}", e);
                self.notifier
                    .notify(Notification::error("Failed to copy").with_description(e.user_message()));
                false
            }
        }
    }

    pub fn remove_history(&mut self, ids: &[u64]) -> usize {
        let removed = self.history.remove(ids);
        if removed > 0 {
            self.notifier
                .notify(Notification::info("History updated").with_description(format!("{} removed", removed)));
        }
        removed
    }

    pub fn clear_history(&mut self) -> usize {
        let removed = self.history.clear();
        self.notifier.notify(Notification::info("History cleared"));
        removed
    }

    /// Any change to the request shape: supersede the current attempt and
    /// restart the quiet period, or go idle when there is nothing to translate.
    fn input_changed(&mut self) {
        self.attempt += 1;
        self.state.is_translating = false;

        if self.state.has_source_text() {
            self.deadline = Some(Instant::now() + self.debounce);
            self.state.phase = Phase::Debouncing;
        } else {
            self.deadline = None;
            self.clear_output();
            self.state.phase = Phase::Idle;
        }
        self.publish();
    }

    fn clear_output(&mut self) {
        self.state.translated_text.clear();
        self.state.alternatives.clear();
    }

    fn fire(&mut self) {
        self.deadline = None;

        if !self.state.has_source_text() {
            self.clear_output();
            self.state.is_translating = false;
            self.state.phase = Phase::Idle;
            self.publish();
            return;
        }

        let request = self.current_request();
        self.state.error = None;

        if let Some(cached) = self.cache.get(&request) {
            debug!(attempt = self.attempt, "Applying cached translation");
            self.apply_response(cached);
            self.publish();
            return;
        }

        let attempt = self.attempt;
        let request_id = Uuid::new_v4();
        info!(
            attempt,
            %request_id,
            source = %request.source_lang,
            target = %request.target_lang,
            contextual = request.include_contextual,
            "Requesting translation"
        );

        self.state.phase = Phase::InFlight;
        self.state.is_translating = true;
        self.publish();

        let translator = self.providers.translator.clone();
        let events = self.events_tx.clone();
        self.in_flight += 1;
        let task_request = request.clone();
        let task = tokio::spawn(async move { translator.translate(&task_request).await });
        tokio::spawn(async move {
            let result = task
                .await
                .unwrap_or_else(|e| Err(ParleyError::Provider(format!("Translation task failed: {}", e))));
            let _ = events.send(SessionEvent::Translated {
                attempt,
                request_id,
                request,
                result,
            });
        });
    }

    fn apply_response(&mut self, response: TranslationResponse) {
        self.state.is_translating = false;
        if let Some(language) = response.detected_language {
            self.state.detected_language = Some(language);
        }
        if let Some(theme) = response.detected_theme {
            self.state.detected_theme = Some(theme);
        }
        self.state.translated_text = response.translated_text;
        self.state.alternatives = response.alternatives;

        match response.error {
            Some(error) => {
                self.state.error = Some(error);
                self.state.phase = Phase::Failed;
            }
            None => {
                self.state.error = None;
                self.state.phase = Phase::Resolved;
                self.record_history();
            }
        }
    }

    /// Append to history once per distinct non-empty translation.
    fn record_history(&mut self) {
        let translated = &self.state.translated_text;
        if translated.trim().is_empty() || self.last_recorded.as_ref() == Some(translated) {
            return;
        }

        self.history.append(
            &self.state.source_text,
            translated,
            &self.state.source_lang,
            &self.state.target_lang,
        );
        self.last_recorded = Some(translated.clone());
    }

    fn apply_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Translated {
                attempt,
                request_id,
                request,
                result,
            } => self.on_translated(attempt, request_id, request, result),
            SessionEvent::Detected {
                detection,
                text,
                result,
            } => self.on_detected(detection, text, result),
            SessionEvent::SpeechChanged => self.sync_speaking(),
        }
    }

    fn on_translated(
        &mut self,
        attempt: u64,
        request_id: Uuid,
        request: TranslationRequest,
        result: Result<TranslationResponse>,
    ) {
        self.in_flight = self.in_flight.saturating_sub(1);

        if let Ok(response) = &result {
            if !response.is_error() {
                self.cache.put(&request, response.clone());
            }
        }

        if attempt != self.attempt {
            debug!(attempt, current = self.attempt, %request_id, "Dropping superseded translation");
            return;
        }

        match result {
            Ok(response) => {
                info!(attempt, %request_id, alternatives = response.alternatives.len(), "Translation completed");
                self.apply_response(response);
            }
            Err(e) => {
                let message = e.user_message();
                warn!(attempt, %request_id, "Translation failed: {}", message);
                self.state.is_translating = false;
                self.state.phase = Phase::Failed;
                self.state.error = Some(message.clone());
                self.notifier
                    .notify(Notification::error("Translation failed").with_description(message));
            }
        }
        self.publish();
    }

    fn on_detected(&mut self, detection: u64, text: String, result: Result<String>) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if detection != self.detection {
            debug!(detection, current = self.detection, "Dropping superseded detection");
            return;
        }
        self.state.is_detecting = false;

        // The text was edited while detecting; the pending debounce owns it now.
        if text != self.state.source_text {
            debug!(detection, "Dropping detection for edited text");
            self.publish();
            return;
        }

        match result {
            Ok(code) => {
                info!(language = %code, "Language detected");
                self.notifier.notify(
                    Notification::success("Language detected").with_description(display_name(&code)),
                );
                self.state.source_lang = code.clone();
                self.state.detected_language = Some(code);
                self.translate_now();
            }
            Err(e) => {
                warn!("Language detection failed: {}", e);
                self.notifier.notify(
                    Notification::error("Language detection failed").with_description(e.user_message()),
                );
                self.publish();
            }
        }
    }

    fn drain_ready(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_event(event);
        }
    }

    fn has_pending_work(&self) -> bool {
        self.deadline.is_some() || self.in_flight > 0
    }

    /// Apply the next debounce expiry or completion. Returns `false` when
    /// nothing is pending.
    pub async fn step(&mut self) -> bool {
        self.drain_ready();
        if !self.has_pending_work() {
            return false;
        }

        let deadline = self.deadline;
        let wake = tokio::select! {
            _ = wait_deadline(deadline) => Wake::Deadline,
            Some(event) = self.events_rx.recv() => Wake::Event(event),
        };
        self.handle_wake(wake).await;
        true
    }

    /// Run until no timer or provider call is outstanding.
    pub async fn settle(&mut self) {
        while self.step().await {}
    }

    /// Event loop: applies intents, debounce expiries and completions until
    /// the intent channel closes.
    pub async fn run(mut self, mut intents: mpsc::Receiver<Intent>) {
        info!("Translation session started");
        loop {
            self.drain_ready();
            let deadline = self.deadline;
            let wake = tokio::select! {
                intent = intents.recv() => match intent {
                    Some(intent) => Wake::Intent(intent),
                    None => Wake::Closed,
                },
                _ = wait_deadline(deadline) => Wake::Deadline,
                Some(event) = self.events_rx.recv() => Wake::Event(event),
            };
            if matches!(wake, Wake::Closed) {
                break;
            }
            self.handle_wake(wake).await;
        }
        self.speech.stop();
        info!("Translation session ended");
    }

    async fn handle_wake(&mut self, wake: Wake) {
        match wake {
            Wake::Intent(intent) => self.dispatch(intent).await,
            Wake::Deadline => {
                debug!(attempt = self.attempt, "Quiet period elapsed");
                self.fire();
            }
            Wake::Event(event) => self.apply_event(event),
            Wake::Closed => {}
        }
    }

    pub async fn dispatch(&mut self, intent: Intent) {
        debug!(?intent, "Intent received");
        match intent {
            Intent::SetSourceText(text) => self.set_source_text(text),
            Intent::SetSourceLang(lang) => self.set_source_lang(lang),
            Intent::SetTargetLang(lang) => self.set_target_lang(lang),
            Intent::SetTheme(theme) => self.set_theme(theme),
            Intent::SetTone(tone) => self.set_tone(tone),
            Intent::ToggleContextualMode => self.toggle_contextual_mode(),
            Intent::TranslateNow => self.translate_now(),
            Intent::DetectLanguage => self.detect_language(),
            Intent::SwapLanguages => self.swap_languages(),
            Intent::SpeakSource => self.speak_source(),
            Intent::SpeakTranslation => self.speak_translation(),
            Intent::StopSpeaking => self.stop_speaking(),
            Intent::CopyTranslation => {
                self.copy_translation().await;
            }
            Intent::CopyAlternative(index) => {
                self.copy_alternative(index).await;
            }
            Intent::RemoveHistory(ids) => {
                self.remove_history(&ids);
            }
            Intent::ClearHistory => {
                self.clear_history();
            }
        }
    }
}

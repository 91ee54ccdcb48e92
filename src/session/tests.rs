use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::*;
use crate::clipboard::MockClipboard;
use crate::error::ParleyError;
use crate::notify::testing::RecordingNotifier;
use crate::notify::NotificationLevel;
use crate::provider::{LanguageDetector, MockLanguageDetector, MockTranslationProvider, TranslationProvider};
use crate::speech::MockSpeechBackend;
use crate::storage::MemoryStore;
use crate::types::ContextualTranslation;

/// Translator with canned replies, per-text latency and failures.
#[derive(Default)]
struct FakeTranslator {
    replies: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    failures: HashMap<String, String>,
    calls: Mutex<Vec<(Instant, TranslationRequest)>>,
}

impl FakeTranslator {
    fn reply(mut self, text: &str, translated: &str) -> Self {
        self.replies.insert(text.to_string(), translated.to_string());
        self
    }

    fn delay(mut self, text: &str, delay: Duration) -> Self {
        self.delays.insert(text.to_string(), delay);
        self
    }

    fn fail(mut self, text: &str, message: &str) -> Self {
        self.failures.insert(text.to_string(), message.to_string());
        self
    }

    fn calls(&self) -> Vec<(Instant, TranslationRequest)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranslationProvider for FakeTranslator {
    async fn translate(&self, request: &TranslationRequest) -> Result<TranslationResponse> {
        self.calls.lock().unwrap().push((Instant::now(), request.clone()));

        if let Some(delay) = self.delays.get(&request.text) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(message) = self.failures.get(&request.text) {
            return Err(ParleyError::Provider(message.clone()));
        }

        let text = self
            .replies
            .get(&request.text)
            .cloned()
            .unwrap_or_else(|| format!("[{}] {}", request.target_lang, request.text));

        let mut response = TranslationResponse::text(text.clone());
        if request.is_auto_source() {
            response.detected_language = Some("en".to_string());
        }
        if request.include_contextual {
            response.detected_theme = Some(Theme::Casual);
            response.alternatives = vec![ContextualTranslation {
                text: format!("{} (informal)", text),
                explanation: "Relaxed register".to_string(),
                context: None,
                style: Some("informal".to_string()),
            }];
        }
        Ok(response)
    }
}

struct Harness {
    session: Session,
    notifier: Arc<RecordingNotifier>,
}

fn config_with(source: &str, target: &str) -> SessionConfig {
    SessionConfig {
        source_lang: source.to_string(),
        target_lang: target.to_string(),
        ..SessionConfig::default()
    }
}

fn build(
    config: SessionConfig,
    translator: Arc<dyn TranslationProvider>,
    detector: Arc<dyn LanguageDetector>,
    clipboard: Arc<dyn Clipboard>,
) -> Harness {
    let notifier = Arc::new(RecordingNotifier::default());
    let history = HistoryStore::open(Box::new(MemoryStore::new()));
    let speech = SpeechSession::new(Arc::new(MockSpeechBackend::new()), notifier.clone());
    let deps = SessionDeps {
        providers: Providers {
            translator,
            detector,
        },
        speech,
        clipboard,
        notifier: notifier.clone(),
    };

    Harness {
        session: Session::new(&config, TranslationCache::new(), history, deps),
        notifier,
    }
}

fn harness(config: SessionConfig, translator: Arc<FakeTranslator>) -> Harness {
    build(
        config,
        translator,
        Arc::new(MockLanguageDetector::new()),
        Arc::new(MockClipboard::new()),
    )
}

fn detecting_harness(config: SessionConfig, translator: Arc<FakeTranslator>, detector: MockLanguageDetector) -> Harness {
    build(config, translator, Arc::new(detector), Arc::new(MockClipboard::new()))
}

#[tokio::test(start_paused = true)]
async fn test_debounce_sends_only_last_input() {
    let translator = Arc::new(FakeTranslator::default().reply("Hello", "Hola"));
    let mut h = harness(SessionConfig::default(), translator.clone());
    let start = Instant::now();

    h.session.set_source_text("Hel");
    tokio::time::advance(Duration::from_millis(400)).await;
    h.session.set_source_text("Hello");
    assert_eq!(h.session.state().phase, Phase::Debouncing);

    h.session.settle().await;

    let calls = translator.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1.text, "Hello");
    assert!(calls[0].0 - start >= Duration::from_millis(900));
    assert_eq!(h.session.state().translated_text, "Hola");
    assert_eq!(h.session.state().phase, Phase::Resolved);
}

#[tokio::test(start_paused = true)]
async fn test_cache_hit_resolves_without_provider_call() {
    let translator = Arc::new(FakeTranslator::default().reply("Hello", "Hola"));
    let mut h = harness(SessionConfig::default(), translator.clone());

    h.session.set_source_text("Hello");
    h.session.translate_now();
    assert!(h.session.state().is_translating);
    assert_eq!(h.session.state().phase, Phase::InFlight);
    h.session.settle().await;
    assert_eq!(h.session.state().translated_text, "Hola");

    h.session.translate_now();
    let state = h.session.state();
    assert_eq!(state.phase, Phase::Resolved);
    assert!(!state.is_translating);
    assert_eq!(state.translated_text, "Hola");
    assert_eq!(translator.calls().len(), 1);
    assert_eq!(h.session.history().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_superseded_response_is_cached_but_not_applied() {
    let translator = Arc::new(
        FakeTranslator::default()
            .reply("slow", "lento")
            .reply("fast", "rápido")
            .delay("slow", Duration::from_secs(2)),
    );
    let mut h = harness(SessionConfig::default(), translator.clone());

    h.session.set_source_text("slow");
    h.session.translate_now();
    h.session.set_source_text("fast");
    assert!(!h.session.state().is_translating);
    h.session.translate_now();

    assert!(h.session.step().await);
    assert_eq!(h.session.state().translated_text, "rápido");

    h.session.settle().await;
    let state = h.session.state();
    assert_eq!(state.translated_text, "rápido");
    assert_eq!(state.phase, Phase::Resolved);
    assert_eq!(translator.calls().len(), 2);

    let history = h.session.history().items();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].translated_text, "rápido");

    let slow = TranslationRequest::new("slow", "en", "es");
    let cached = h.session.cache().get(&slow).unwrap();
    assert_eq!(cached.translated_text, "lento");
}

#[tokio::test(start_paused = true)]
async fn test_toggle_contextual_fires_without_debounce() {
    let translator = Arc::new(FakeTranslator::default().reply("Hello", "Hola"));
    let mut h = harness(SessionConfig::default(), translator.clone());

    h.session.set_source_text("Hello");
    h.session.settle().await;

    let toggled_at = Instant::now();
    h.session.toggle_contextual_mode();
    assert!(h.session.state().contextual_mode);
    assert_eq!(h.session.state().phase, Phase::InFlight);
    h.session.settle().await;

    let calls = translator.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].1.include_contextual);
    assert_eq!(calls[1].0, toggled_at);

    let state = h.session.state();
    assert_eq!(state.alternatives.len(), 1);
    assert_eq!(state.detected_theme, Some(Theme::Casual));
}

#[tokio::test(start_paused = true)]
async fn test_toggle_without_text_only_flips_mode() {
    let translator = Arc::new(FakeTranslator::default());
    let mut h = harness(SessionConfig::default(), translator.clone());

    h.session.toggle_contextual_mode();
    h.session.settle().await;

    assert!(h.session.state().contextual_mode);
    assert!(translator.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_clearing_text_resets_output() {
    let translator = Arc::new(FakeTranslator::default().reply("Hello", "Hola"));
    let mut h = harness(SessionConfig::default(), translator.clone());

    h.session.set_source_text("Hello");
    h.session.toggle_contextual_mode();
    h.session.settle().await;
    assert!(!h.session.state().alternatives.is_empty());

    h.session.set_source_text("");
    let state = h.session.state();
    assert_eq!(state.translated_text, "");
    assert!(state.alternatives.is_empty());
    assert_eq!(state.phase, Phase::Idle);
    assert_eq!(state.character_count.current, 0);

    h.session.translate_now();
    h.session.set_source_text("   ");
    h.session.settle().await;
    assert_eq!(h.session.state().phase, Phase::Idle);
    assert_eq!(translator.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failure_keeps_previous_translation() {
    let translator = Arc::new(
        FakeTranslator::default()
            .reply("Hello", "Hola")
            .fail("Hello world", "network down"),
    );
    let mut h = harness(SessionConfig::default(), translator);

    h.session.set_source_text("Hello");
    h.session.settle().await;
    h.session.set_source_text("Hello world");
    h.session.settle().await;

    let state = h.session.state();
    assert_eq!(state.error.as_deref(), Some("network down"));
    assert_eq!(state.translated_text, "Hola");
    assert!(!state.is_translating);
    assert_eq!(state.phase, Phase::Failed);

    let notes = h.notifier.taken();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, NotificationLevel::Error);
    assert_eq!(notes[0].title, "Translation failed");
    assert_eq!(notes[0].description.as_deref(), Some("network down"));
    assert_eq!(h.session.history().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_error_marked_response_is_shown_but_not_cached() {
    let mut translator = MockTranslationProvider::new();
    translator
        .expect_translate()
        .times(2)
        .returning(|_| Ok(TranslationResponse::failed("ERROR: missing key", "API key missing")));
    let mut h = build(
        SessionConfig::default(),
        Arc::new(translator),
        Arc::new(MockLanguageDetector::new()),
        Arc::new(MockClipboard::new()),
    );

    h.session.set_source_text("Hello");
    h.session.settle().await;

    let state = h.session.state();
    assert_eq!(state.translated_text, "ERROR: missing key");
    assert_eq!(state.error.as_deref(), Some("API key missing"));
    assert_eq!(state.phase, Phase::Failed);
    assert!(h.session.cache().is_empty());
    assert!(h.session.history().is_empty());

    h.session.translate_now();
    h.session.settle().await;
}

#[tokio::test(start_paused = true)]
async fn test_auto_source_records_detected_language() {
    let translator = Arc::new(FakeTranslator::default());
    let mut h = harness(config_with("auto", "es"), translator);

    h.session.set_source_text("Hello");
    h.session.settle().await;

    assert_eq!(h.session.state().detected_language.as_deref(), Some("en"));
    assert_eq!(h.session.state().source_lang, "auto");
}

#[tokio::test(start_paused = true)]
async fn test_swap_from_auto_without_detection_targets_english() {
    let translator = Arc::new(FakeTranslator::default().reply("Hola", "Hello"));
    let mut h = harness(config_with("auto", "en"), translator.clone());

    h.session.set_source_text("Hola");
    h.session.settle().await;
    h.session.state.detected_language = None;

    h.session.swap_languages();
    let state = h.session.state();
    assert_eq!(state.source_lang, "en");
    assert_eq!(state.target_lang, "en");
    assert_eq!(state.source_text, "Hello");
    assert_eq!(state.translated_text, "Hola");
    assert_eq!(state.detected_language, None);
    assert_eq!(state.phase, Phase::Debouncing);
}

#[tokio::test(start_paused = true)]
async fn test_swap_uses_detected_language() {
    let translator = Arc::new(FakeTranslator::default().reply("Hello", "Hola"));
    let mut h = harness(config_with("auto", "es"), translator.clone());

    h.session.set_source_text("Hello");
    h.session.toggle_contextual_mode();
    h.session.settle().await;
    assert_eq!(h.session.state().detected_language.as_deref(), Some("en"));

    h.session.swap_languages();
    let state = h.session.state();
    assert_eq!(state.source_lang, "es");
    assert_eq!(state.target_lang, "en");
    assert_eq!(state.source_text, "Hola");
    assert_eq!(state.translated_text, "Hello");
    assert!(state.alternatives.is_empty());
    assert_eq!(state.detected_theme, None);

    h.session.settle().await;
    let last = translator.calls().pop().unwrap().1;
    assert_eq!(last.text, "Hola");
    assert_eq!(last.source_lang, "es");
    assert_eq!(last.target_lang, "en");
}

#[tokio::test(start_paused = true)]
async fn test_swap_with_explicit_source() {
    let translator = Arc::new(FakeTranslator::default());
    let mut h = harness(config_with("de", "fr"), translator);

    h.session.swap_languages();
    let state = h.session.state();
    assert_eq!(state.source_lang, "fr");
    assert_eq!(state.target_lang, "de");
    assert_eq!(state.phase, Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_detection_updates_source_and_translates() {
    let translator = Arc::new(FakeTranslator::default().reply("Bonjour", "Hello"));
    let mut detector = MockLanguageDetector::new();
    detector
        .expect_detect()
        .times(1)
        .returning(|_| Ok("fr".to_string()));
    let mut h = detecting_harness(config_with("auto", "en"), translator.clone(), detector);

    h.session.set_source_text("Bonjour");
    h.session.detect_language();
    assert!(h.session.state().is_detecting);
    h.session.settle().await;

    let state = h.session.state();
    assert!(!state.is_detecting);
    assert_eq!(state.source_lang, "fr");
    assert_eq!(state.detected_language.as_deref(), Some("fr"));
    assert_eq!(state.translated_text, "Hello");

    let calls = translator.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1.source_lang, "fr");

    let notes = h.notifier.taken();
    assert_eq!(notes[0].title, "Language detected");
    assert_eq!(notes[0].description.as_deref(), Some("French"));
}

#[tokio::test(start_paused = true)]
async fn test_detection_failure_notifies() {
    let translator = Arc::new(FakeTranslator::default());
    let mut detector = MockLanguageDetector::new();
    detector
        .expect_detect()
        .returning(|_| Err(ParleyError::Detection("quota exceeded".to_string())));
    let mut h = detecting_harness(config_with("auto", "en"), translator, detector);

    h.session.set_source_text("Bonjour");
    h.session.detect_language();
    h.session.settle().await;

    let state = h.session.state();
    assert!(!state.is_detecting);
    assert_eq!(state.source_lang, "auto");

    let notes = h.notifier.taken();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Language detection failed");
    assert_eq!(notes[0].description.as_deref(), Some("quota exceeded"));
}

#[tokio::test(start_paused = true)]
async fn test_history_skips_repeated_translation() {
    let translator = Arc::new(
        FakeTranslator::default()
            .reply("Hello", "Hola")
            .reply("Hello!", "Hola"),
    );
    let mut h = harness(SessionConfig::default(), translator);

    h.session.set_source_text("Hello");
    h.session.settle().await;
    h.session.set_source_text("Hello!");
    h.session.settle().await;
    assert_eq!(h.session.history().len(), 1);

    h.session.set_source_text("Bye");
    h.session.settle().await;
    let items = h.session.history().items();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].translated_text, "[es] Bye");
    assert_eq!(items[0].source_lang, "en");
}

#[tokio::test(start_paused = true)]
async fn test_language_change_without_text_stays_idle() {
    let translator = Arc::new(FakeTranslator::default());
    let mut h = harness(SessionConfig::default(), translator.clone());

    h.session.set_target_lang("fr");
    h.session.set_theme(Theme::Business);
    h.session.settle().await;

    assert_eq!(h.session.state().phase, Phase::Idle);
    assert!(translator.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_character_count_tracks_input() {
    let mut config = SessionConfig::default();
    config.max_characters = 5;
    let mut h = harness(config, Arc::new(FakeTranslator::default()));

    h.session.set_source_text("Olá mundo");
    let count = h.session.state().character_count;
    assert_eq!(count.current, 9);
    assert!(count.is_over_limit());
}

#[tokio::test(start_paused = true)]
async fn test_copy_translation_notifies() {
    let mut clipboard = MockClipboard::new();
    clipboard
        .expect_copy()
        .withf(|text| text == "Hola")
        .times(1)
        .returning(|_| Ok(()));
    let translator = Arc::new(FakeTranslator::default().reply("Hello", "Hola"));
    let mut h = build(
        SessionConfig::default(),
        translator,
        Arc::new(MockLanguageDetector::new()),
        Arc::new(clipboard),
    );

    assert!(!h.session.copy_translation().await);

    h.session.set_source_text("Hello");
    h.session.settle().await;
    assert!(h.session.copy_translation().await);

    let notes = h.notifier.taken();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Copied to clipboard");
}

#[tokio::test(start_paused = true)]
async fn test_run_loop_publishes_states() {
    let translator = Arc::new(FakeTranslator::default().reply("Hello", "Hola"));
    let h = harness(SessionConfig::default(), translator);
    let mut states = h.session.subscribe();
    let (tx, rx) = mpsc::channel(8);
    let task = tokio::spawn(h.session.run(rx));

    tx.send(Intent::SetSourceText("Hello".to_string())).await.unwrap();
    loop {
        if states.borrow_and_update().translated_text == "Hola" {
            break;
        }
        states.changed().await.unwrap();
    }

    drop(tx);
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_detection_for_edited_text_is_dropped() {
    let translator = Arc::new(FakeTranslator::default());
    let mut detector = MockLanguageDetector::new();
    detector
        .expect_detect()
        .times(1)
        .returning(|_| Ok("fr".to_string()));
    let mut h = detecting_harness(config_with("auto", "en"), translator.clone(), detector);

    h.session.set_source_text("Bonjour");
    h.session.detect_language();
    h.session.set_source_text("Guten Tag");
    h.session.settle().await;

    let state = h.session.state();
    assert!(!state.is_detecting);
    assert_eq!(state.source_lang, "auto");
    assert_eq!(state.translated_text, "[en] Guten Tag");

    let calls = translator.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1.text, "Guten Tag");
    assert_eq!(calls[0].1.source_lang, "auto");
    assert!(h.notifier.taken().iter().all(|n| n.title != "Language detected"));
}

#[tokio::test(start_paused = true)]
async fn test_panicking_provider_fails_the_attempt() {
    let mut translator = MockTranslationProvider::new();
    translator
        .expect_translate()
        .returning(|_| panic!("provider crashed"));
    let mut h = build(
        SessionConfig::default(),
        Arc::new(translator),
        Arc::new(MockLanguageDetector::new()),
        Arc::new(MockClipboard::new()),
    );

    h.session.set_source_text("Hello");
    h.session.settle().await;

    let state = h.session.state();
    assert_eq!(state.phase, Phase::Failed);
    assert!(!state.is_translating);
    assert!(state.error.as_deref().unwrap().contains("Translation task failed"));
    assert_eq!(h.notifier.taken()[0].title, "Translation failed");
}

#[tokio::test(start_paused = true)]
async fn test_copy_alternative_by_position() {
    let mut clipboard = MockClipboard::new();
    clipboard
        .expect_copy()
        .withf(|text| text == "Hola (informal)")
        .times(1)
        .returning(|_| Ok(()));
    let translator = Arc::new(FakeTranslator::default().reply("Hello", "Hola"));
    let mut config = SessionConfig::default();
    config.contextual = true;
    let mut h = build(
        config,
        translator,
        Arc::new(MockLanguageDetector::new()),
        Arc::new(clipboard),
    );

    h.session.set_source_text("Hello");
    h.session.settle().await;

    assert!(h.session.copy_alternative(0).await);
    assert!(!h.session.copy_alternative(3).await);
    assert_eq!(h.notifier.taken()[0].title, "Copied to clipboard");
}

#[tokio::test(start_paused = true)]
async fn test_history_changes_notify() {
    let translator = Arc::new(FakeTranslator::default());
    let mut h = harness(SessionConfig::default(), translator);

    h.session.set_source_text("Hello");
    h.session.settle().await;
    let id = h.session.history().items()[0].id;

    assert_eq!(h.session.remove_history(&[id + 1]), 0);
    assert!(h.notifier.taken().is_empty());

    assert_eq!(h.session.remove_history(&[id]), 1);
    assert_eq!(h.session.clear_history(), 0);

    let notes = h.notifier.taken();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].level, NotificationLevel::Info);
    assert_eq!(notes[0].description.as_deref(), Some("1 removed"));
    assert_eq!(notes[1].title, "History cleared");
}

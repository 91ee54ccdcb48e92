//! Parley - Translation front end
//!
//! Entry point for the `parley` binary: one-shot translate/detect/speak
//! commands, history management and an interactive session.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Notify;
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use parley::cache::TranslationCache;
use parley::cli::{Args, Commands, ConfigAction, HistoryAction};
use parley::clipboard::CommandClipboard;
use parley::config::Config;
use parley::history::HistoryStore;
use parley::language::display_name;
use parley::notify::{ConsoleNotifier, SharedNotifier};
use parley::provider::ProviderFactory;
use parley::repl::{self, Repl};
use parley::session::{Phase, Session, SessionDeps};
use parley::speech::{PlaybackObserver, SpeechBackendFactory, SpeechSession};
use parley::storage::FileStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;
    info!("Starting Parley");

    // Load configuration
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new("parley.toml").exists() {
                info!("Found parley.toml in current directory, loading...");
                Config::from_file("parley.toml")?
            } else {
                Config::default()
            }
        }
    };

    let notifier: SharedNotifier = Arc::new(ConsoleNotifier);

    match args.command {
        Commands::Translate {
            text,
            from,
            to,
            contextual,
            theme,
            tone,
        } => {
            let mut config = config;
            if let Some(from) = from {
                config.session.source_lang = from;
            }
            if let Some(to) = to {
                config.session.target_lang = to;
            }
            if let Some(theme) = theme {
                config.session.theme = theme;
            }
            if let Some(tone) = tone {
                config.session.tone = tone;
            }
            config.session.contextual |= contextual;

            let mut session = build_session(&config, notifier)?;
            session.set_source_text(text);
            session.translate_now();

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
            spinner.set_message("Translating...");
            spinner.enable_steady_tick(Duration::from_millis(100));
            session.settle().await;
            spinner.finish_and_clear();

            let state = session.state();
            println!("{}", repl::render_state(state));
            if state.phase == Phase::Failed {
                anyhow::bail!(state.error.clone().unwrap_or_else(|| "Translation failed".to_string()));
            }
        }
        Commands::Detect { text } => {
            let providers = ProviderFactory::create(config.provider.clone(), notifier)?;
            let code = providers.detector.detect(&text).await?;
            println!("{} ({})", code, display_name(&code));
        }
        Commands::Speak { text, lang } => {
            let backend = SpeechBackendFactory::create_backend(config.speech.clone())?;
            let mut speech = SpeechSession::new(backend, notifier);
            let done = Arc::new(PlaybackDone::default());

            if speech.speak(&text, &lang, done.clone()).is_some() {
                tokio::select! {
                    _ = done.finished.notified() => {}
                    _ = tokio::signal::ctrl_c() => speech.stop(),
                }
            }
        }
        Commands::History { action } => {
            let mut history = open_history(&config)?;
            match action {
                HistoryAction::List { limit } => repl::print_history(&history, limit),
                HistoryAction::Remove { ids } => {
                    let removed = history.remove(&ids);
                    println!("Removed {} history entries", removed);
                }
                HistoryAction::Clear => {
                    let removed = history.clear();
                    println!("Cleared {} history entries", removed);
                }
            }
        }
        Commands::Interactive => {
            let session = build_session(&config, notifier)?;
            Repl::new(config.history.storage_dir.clone()).run(session).await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Init { path, force } => {
                if path.exists() && !force {
                    anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
                }
                Config::default().save_to_file(&path)?;
                println!("Wrote default configuration to {}", path.display());
            }
        },
    }

    Ok(())
}

/// Wakes the speak command once playback ends.
#[derive(Default)]
struct PlaybackDone {
    finished: Notify,
}

impl PlaybackObserver for PlaybackDone {
    fn on_end(&self) {
        self.finished.notify_one();
    }
}

fn open_history(config: &Config) -> Result<HistoryStore> {
    let store = FileStore::open(&config.history.storage_dir)?;
    Ok(HistoryStore::open(Box::new(store)))
}

fn build_session(config: &Config, notifier: SharedNotifier) -> Result<Session> {
    let providers = ProviderFactory::create(config.provider.clone(), notifier.clone())?;
    let backend = SpeechBackendFactory::create_backend(config.speech.clone())?;
    let deps = SessionDeps {
        providers,
        speech: SpeechSession::new(backend, notifier.clone()),
        clipboard: Arc::new(CommandClipboard::new(config.clipboard.clone())),
        notifier,
    };

    Ok(Session::new(
        &config.session,
        TranslationCache::new(),
        open_history(config)?,
        deps,
    ))
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".parley").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Daily rotation; the guard must outlive every log call
    let file_appender = rolling::daily(&log_dir, "parley.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::WARN };

    // Console output goes to stderr; stdout carries translations
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - level: {}, file: {}",
        log_level,
        log_dir.join("parley.log").display()
    );

    Ok(())
}

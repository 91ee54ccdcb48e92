//! Line-oriented interactive front end.
//!
//! Plain lines replace the source text; lines starting with `:` are commands.
//! The session runs on its own task and the prompt renders every settled
//! state it publishes.

use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{ParleyError, Result};
use crate::history::HistoryStore;
use crate::language::display_name;
use crate::session::{Intent, Phase, Session, SessionState};
use crate::storage::FileStore;
use crate::types::{Theme, Tone};

pub const HELP: &str = "\
Type text to translate it. Commands:
  :from <code>    set the source language (\"auto\" to detect)
  :to <code>      set the target language
  :swap           swap languages and texts
  :ctx            toggle contextual alternatives
  :theme <name>   set the theme (auto, general, technical, ...)
  :tone <name>    set the tone (neutral, formal, informal, ...)
  :detect         detect the source language
  :now            translate immediately
  :speak [src]    read the translation (or the source) aloud
  :stop           stop speaking
  :copy [n]       copy the translation (or alternative n)
  :history        show recent translations
  :forget <id..>  remove history entries
  :clear          clear history
  :quit           leave";

#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Intent(Intent),
    ShowHistory,
    Help,
    Quit,
}

/// Parse one input line. `Ok(None)` means nothing to do.
pub fn parse_line(line: &str) -> std::result::Result<Option<ReplCommand>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let Some(command) = trimmed.strip_prefix(':') else {
        return Ok(Some(ReplCommand::Intent(Intent::SetSourceText(line.trim_end().to_string()))));
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let rest: Vec<&str> = parts.collect();
    let argument = |what: &str| {
        rest.first()
            .map(|value| value.to_string())
            .ok_or_else(|| format!(":{} needs {}", name, what))
    };

    let parsed = match name {
        "from" => ReplCommand::Intent(Intent::SetSourceLang(argument("a language code")?)),
        "to" => ReplCommand::Intent(Intent::SetTargetLang(argument("a language code")?)),
        "swap" => ReplCommand::Intent(Intent::SwapLanguages),
        "ctx" => ReplCommand::Intent(Intent::ToggleContextualMode),
        "theme" => {
            let theme: Theme = argument("a theme")?.parse().map_err(|e: ParleyError| e.user_message())?;
            ReplCommand::Intent(Intent::SetTheme(theme))
        }
        "tone" => {
            let tone: Tone = argument("a tone")?.parse().map_err(|e: ParleyError| e.user_message())?;
            ReplCommand::Intent(Intent::SetTone(tone))
        }
        "detect" => ReplCommand::Intent(Intent::DetectLanguage),
        "now" => ReplCommand::Intent(Intent::TranslateNow),
        "speak" => match rest.first() {
            Some(&"src") | Some(&"source") => ReplCommand::Intent(Intent::SpeakSource),
            _ => ReplCommand::Intent(Intent::SpeakTranslation),
        },
        "stop" => ReplCommand::Intent(Intent::StopSpeaking),
        "copy" => match rest.first() {
            None => ReplCommand::Intent(Intent::CopyTranslation),
            Some(n) => match n.parse::<usize>() {
                Ok(n) if n > 0 => ReplCommand::Intent(Intent::CopyAlternative(n - 1)),
                _ => return Err(format!("invalid alternative '{}'", n)),
            },
        },
        "history" => ReplCommand::ShowHistory,
        "forget" => {
            let ids = rest
                .iter()
                .map(|id| id.parse::<u64>().map_err(|_| format!("invalid id '{}'", id)))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            if ids.is_empty() {
                return Err(":forget needs at least one id".to_string());
            }
            ReplCommand::Intent(Intent::RemoveHistory(ids))
        }
        "clear" => ReplCommand::Intent(Intent::ClearHistory),
        "help" | "?" => ReplCommand::Help,
        "quit" | "q" | "exit" => ReplCommand::Quit,
        other => return Err(format!("unknown command ':{}' (try :help)", other)),
    };
    Ok(Some(parsed))
}

/// Text shown once a translation settles.
pub fn render_state(state: &SessionState) -> String {
    let source = match (&state.detected_language, state.source_lang.as_str()) {
        (Some(detected), "auto") => format!("auto:{}", detected),
        _ => state.source_lang.clone(),
    };
    let mut out = format!("[{} -> {}] {}", source, state.target_lang, state.translated_text);

    if let Some(theme) = state.detected_theme {
        out.push_str(&format!("\n  theme: {}", theme));
    }
    for (n, alternative) in state.alternatives.iter().enumerate() {
        match &alternative.style {
            Some(style) => out.push_str(&format!(
                "\n  {}. {} ({}): {}",
                n + 1,
                alternative.text,
                style,
                alternative.explanation
            )),
            None => out.push_str(&format!("\n  {}. {}: {}", n + 1, alternative.text, alternative.explanation)),
        }
    }
    if let Some(error) = &state.error {
        out.push_str(&format!("\n  error: {}", error));
    }
    if state.character_count.is_over_limit() {
        out.push_str(&format!(
            "\n  warning: {}/{} characters",
            state.character_count.current, state.character_count.max
        ));
    }
    out
}

/// Print history entries newest first.
pub fn print_history(history: &HistoryStore, limit: Option<usize>) {
    if history.is_empty() {
        println!("No translations yet.");
        return;
    }
    println!("{:<15} {:<18} {:<8} {}", "Id", "When", "Langs", "Text");
    println!("{}", "-".repeat(70));
    for item in history.items().iter().take(limit.unwrap_or(usize::MAX)) {
        let langs = format!("{}>{}", item.source_lang, item.target_lang);
        println!(
            "{:<15} {:<18} {:<8} {} => {}",
            item.id, item.timestamp, langs, item.source_text, item.translated_text
        );
    }
}

#[derive(PartialEq)]
struct Rendered {
    phase: Phase,
    translated_text: String,
    error: Option<String>,
    alternatives: usize,
    source_lang: String,
    target_lang: String,
}

impl Rendered {
    fn of(state: &SessionState) -> Self {
        Self {
            phase: state.phase,
            translated_text: state.translated_text.clone(),
            error: state.error.clone(),
            alternatives: state.alternatives.len(),
            source_lang: state.source_lang.clone(),
            target_lang: state.target_lang.clone(),
        }
    }
}

pub struct Repl {
    history_dir: PathBuf,
}

impl Repl {
    pub fn new(history_dir: PathBuf) -> Self {
        Self { history_dir }
    }

    fn show_history(&self) -> Result<()> {
        let history = HistoryStore::open(Box::new(FileStore::open(&self.history_dir)?));
        print_history(&history, Some(20));
        Ok(())
    }

    pub async fn run(self, session: Session) -> Result<()> {
        let state = session.state().clone();
        println!(
            "Translating {} to {}. Type :help for commands.",
            display_name(&state.source_lang),
            display_name(&state.target_lang)
        );

        let mut states = session.subscribe();
        let (intents_tx, intents_rx) = mpsc::channel(32);
        let session_task = tokio::spawn(session.run(intents_rx));

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut last = Rendered::of(&state);

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    match parse_line(&line) {
                        Ok(None) => {}
                        Ok(Some(ReplCommand::Quit)) => break,
                        Ok(Some(ReplCommand::Help)) => println!("{}", HELP),
                        Ok(Some(ReplCommand::ShowHistory)) => {
                            if let Err(e) = self.show_history() {
                                warn!("Failed to read history: {}", e);
                            }
                        }
                        Ok(Some(ReplCommand::Intent(intent))) => {
                            if intents_tx.send(intent).await.is_err() {
                                break;
                            }
                        }
                        Err(message) => eprintln!("{}", message),
                    }
                }
                changed = states.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = states.borrow_and_update().clone();
                    show(&state, &mut last);
                }
            }
        }

        drop(intents_tx);
        if let Err(e) = session_task.await {
            debug!("Session task ended abnormally: {}", e);
        }
        info!("Interactive session closed");
        Ok(())
    }
}

fn show(state: &SessionState, last: &mut Rendered) {
    let current = Rendered::of(state);
    if current == *last {
        return;
    }
    let settled = matches!(state.phase, Phase::Resolved | Phase::Failed);
    let languages_changed = current.source_lang != last.source_lang || current.target_lang != last.target_lang;
    if settled {
        println!("{}", render_state(state));
    } else if languages_changed {
        println!(
            "{} -> {}",
            display_name(&state.source_lang),
            display_name(&state.target_lang)
        );
    }
    *last = current;
}

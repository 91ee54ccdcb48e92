use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::types::{Theme, Tone};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate text once and print the result
    Translate {
        /// Text to translate
        text: String,

        /// Source language code, or "auto"
        #[arg(short, long)]
        from: Option<String>,

        /// Target language code
        #[arg(short, long)]
        to: Option<String>,

        /// Ask for contextual alternatives
        #[arg(long)]
        contextual: bool,

        /// Subject domain (auto, general, technical, medical, ...)
        #[arg(long)]
        theme: Option<Theme>,

        /// Register (neutral, formal, informal, friendly, professional)
        #[arg(long)]
        tone: Option<Tone>,
    },

    /// Detect the language of a text
    Detect {
        /// Text to inspect
        text: String,
    },

    /// Read text aloud
    Speak {
        /// Text to speak
        text: String,

        /// Language code used to pick the voice
        #[arg(short, long, default_value = "en")]
        lang: String,
    },

    /// Manage translation history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Start an interactive translation session
    Interactive,

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List recent translations, newest first
    List {
        /// Show at most this many entries
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Remove entries by id
    Remove {
        /// Entry ids as shown by `history list`
        #[arg(required = true)]
        ids: Vec<u64>,
    },

    /// Remove all entries
    Clear,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write the default configuration
    Init {
        /// Destination file
        #[arg(short, long, default_value = "parley.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

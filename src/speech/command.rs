use std::path::Path;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::debug;

use crate::error::{ParleyError, Result};

/// External program invocation used for playback (TTS binary or audio player)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl PlayerCommand {
    /// Create a new playback command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add templated arguments, replacing `{name}` placeholders with values
    pub fn templated_args(mut self, template: &[String], values: &[(&str, &str)]) -> Self {
        for arg in template {
            let mut rendered = arg.clone();
            for (name, value) in values {
                rendered = rendered.replace(&format!("{{{}}}", name), value);
            }
            self.args.push(rendered);
        }
        self
    }

    /// Add a file argument
    pub fn file<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Spawn the program; the child is killed if its handle is dropped
    pub fn spawn(&self) -> Result<Child> {
        debug!("Starting playback command: {} {:?}", self.binary_path, self.args);

        Command::new(&self.binary_path)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ParleyError::Speech(format!("Failed to start {}: {}", self.description, e)))
    }
}

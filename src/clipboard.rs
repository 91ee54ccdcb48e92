//! Copying text to the system clipboard through an external program.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::config::ClipboardConfig;
use crate::error::{ParleyError, Result};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn copy(&self, text: &str) -> Result<()>;
}

/// Pipes text into a clipboard program such as `pbcopy`, `wl-copy` or `xclip`.
pub struct CommandClipboard {
    config: ClipboardConfig,
}

impl CommandClipboard {
    pub fn new(config: ClipboardConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Clipboard for CommandClipboard {
    async fn copy(&self, text: &str) -> Result<()> {
        debug!("Copying {} bytes with {}", text.len(), self.config.binary);

        let mut child = Command::new(&self.config.binary)
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ParleyError::Clipboard(format!("Failed to start {}: {}", self.config.binary, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ParleyError::Clipboard(format!(
                "{} failed: {}",
                self.config.binary,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

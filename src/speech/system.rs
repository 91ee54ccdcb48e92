use async_trait::async_trait;

use super::{PlayerCommand, SpeechBackend, Utterance};
use crate::config::SpeechConfig;
use crate::error::Result;

/// Speaks through a local TTS program such as `espeak-ng` or `say`
pub struct SystemBackend {
    binary: String,
    args: Vec<String>,
}

impl SystemBackend {
    pub fn new(config: &SpeechConfig) -> Self {
        Self {
            binary: config.system_binary.clone(),
            args: config.system_args.clone(),
        }
    }
}

#[async_trait]
impl SpeechBackend for SystemBackend {
    async fn render(&self, text: &str, lang: &str) -> Result<Utterance> {
        let command = PlayerCommand::new(&self.binary, "System speech")
            .templated_args(&self.args, &[("lang", lang), ("text", text)]);
        Ok(Utterance::command(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_render_substitutes_language_and_text() {
        let backend = SystemBackend::new(&SpeechConfig::default());
        let utterance = backend.render("Hola", "es").await.unwrap();

        assert_eq!(utterance.command.binary_path, "espeak-ng");
        assert_eq!(utterance.command.args, vec!["-v", "es", "Hola"]);
    }
}

//! Structure-preserving markdown translation.

use crate::client::{ChatMessage, ChatRequest, OpenAiClient};
use async_trait::async_trait;
use deck_core::{Config, Error, Result, Translator};

/// Build the system instruction for translating into `language`.
fn translation_instruction(language: &str) -> String {
    format!(
        "You are an expert translator from English to {language}. \
Translate the input into natural {language}. Keep the Marp format intact:
- keep the front-matter (the settings block fenced by ---) unchanged
- keep every slide separator (---)
- keep slide headings (# and ##)
- keep bullet list formatting"
    )
}

/// [`Translator`] backed by a chat model.
pub struct ChatTranslator {
    client: OpenAiClient,
    model: String,
    temperature: f32,
    instruction: String,
}

impl ChatTranslator {
    /// Create a translator for the configured target language.
    pub fn new(client: OpenAiClient, config: &Config) -> Self {
        Self {
            client,
            model: config.chat_model.clone(),
            temperature: config.translation_temperature,
            instruction: translation_instruction(&config.target_language),
        }
    }
}

#[async_trait]
impl Translator for ChatTranslator {
    async fn translate(&self, markdown: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage::system(&self.instruction),
                ChatMessage::user(markdown),
            ],
            temperature: Some(self.temperature),
        };

        let translated = self
            .client
            .chat(&request)
            .await?
            .ok_or_else(|| Error::Collaborator("Translation result was empty".to_string()))?;

        log::info!("Translation complete");
        Ok(translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_names_language_and_markers() {
        let instruction = translation_instruction("Japanese");
        assert!(instruction.contains("natural Japanese"));
        assert!(instruction.contains("front-matter"));
        assert!(instruction.contains("slide separator"));
        assert!(instruction.contains("# and ##"));
    }
}

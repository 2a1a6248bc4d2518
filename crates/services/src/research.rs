//! Research collector backed by a chat model.

use crate::client::{ChatMessage, ChatRequest, OpenAiClient};
use async_trait::async_trait;
use deck_core::{Config, Error, ResearchCollector, Result};

/// System instruction asking for a slide-ready markdown report.
const RESEARCH_INSTRUCTION: &str = "You are a meticulous research analyst. \
Write a well-sourced research report on the user's topic as Marp slide markdown:
- start with a front-matter block (`---`, `marp: true`, `---`)
- put the report title on the first slide as a `# ` heading followed by a short summary
- separate slides with a line containing only `---`
- give every following slide a `## ` heading and concise `- ` bullet points
- end with a slide listing the key sources";

/// Builds the user message for a research request.
fn research_prompt(topic: &str, report_type: &str) -> String {
    format!(
        "Report type: {}\nTopic: {}\n\nResearch this topic and write the report.",
        report_type, topic
    )
}

/// [`ResearchCollector`] that asks a chat model for the report.
pub struct ChatResearcher {
    client: OpenAiClient,
    model: String,
}

impl ChatResearcher {
    /// Create a researcher using the configured chat model.
    pub fn new(client: OpenAiClient, config: &Config) -> Self {
        Self {
            client,
            model: config.chat_model.clone(),
        }
    }
}

#[async_trait]
impl ResearchCollector for ChatResearcher {
    async fn research(&self, topic: &str, report_type: &str) -> Result<String> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(Error::Collaborator("Research topic is empty".to_string()));
        }

        let prompt = research_prompt(topic, report_type);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage::system(RESEARCH_INSTRUCTION),
                ChatMessage::user(&prompt),
            ],
            temperature: None,
        };

        let report = self
            .client
            .chat(&request)
            .await?
            .ok_or_else(|| Error::Collaborator("Research report was empty".to_string()))?;

        log::info!("Research report received ({} bytes)", report.len());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_research_prompt_mentions_topic_and_type() {
        let prompt = research_prompt("solid-state batteries", "research_report");
        assert!(prompt.contains("solid-state batteries"));
        assert!(prompt.contains("research_report"));
    }

    #[test]
    fn test_instruction_describes_slide_dialect() {
        assert!(RESEARCH_INSTRUCTION.contains("`---`"));
        assert!(RESEARCH_INSTRUCTION.contains("`# `"));
        assert!(RESEARCH_INSTRUCTION.contains("`## `"));
    }
}

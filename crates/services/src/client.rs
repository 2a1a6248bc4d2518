//! Minimal client for an OpenAI-compatible HTTP API.

use deck_core::{Config, Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Shared HTTP client carrying the credential and base URL.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    api_base: String,
}

impl OpenAiClient {
    /// Create a client from the run configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("research-deck/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Collaborator(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            api_base: config.api_base.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    /// Run a chat completion and return the first choice's content, if any.
    pub async fn chat(&self, request: &ChatRequest<'_>) -> Result<Option<String>> {
        log::debug!(
            "Chat request: model={}, messages={}",
            request.model,
            request.messages.len()
        );

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Collaborator(format!("Chat request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Collaborator(format!(
                "Chat API error: {} - {}",
                status, body
            )));
        }

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Collaborator(format!("Malformed chat response: {}", e)))?;

        Ok(data.first_content())
    }

    /// Request image generation and return the first image URL, if any.
    pub async fn create_image(&self, request: &ImageRequest<'_>) -> Result<Option<String>> {
        log::debug!("Image request: model={}, size={}", request.model, request.size);

        let response = self
            .client
            .post(self.endpoint("images/generations"))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Collaborator(format!("Image request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Collaborator(format!(
                "Image API error: {} - {}",
                status, body
            )));
        }

        let data: ImageResponse = response
            .json()
            .await
            .map_err(|e| Error::Collaborator(format!("Malformed image response: {}", e)))?;

        Ok(data.first_url())
    }

    /// Download a resource; any non-200 status is an error.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Collaborator(format!("Download failed: {}", e)))?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(Error::Collaborator(format!(
                "Image download failed: {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Collaborator(format!("Download interrupted: {}", e)))?;

        Ok(bytes.to_vec())
    }
}

/// Body of a chat completion request.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// One chat message.
#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> ChatMessage<'a> {
    pub fn system(content: &'a str) -> Self {
        Self {
            role: "system",
            content,
        }
    }

    pub fn user(content: &'a str) -> Self {
        Self {
            role: "user",
            content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl ChatResponse {
    fn first_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
    }
}

/// Body of an image generation request.
#[derive(Debug, Serialize)]
pub struct ImageRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub size: &'a str,
    pub quality: &'a str,
    pub n: u8,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

impl ImageResponse {
    fn first_url(self) -> Option<String> {
        self.data
            .into_iter()
            .next()
            .and_then(|d| d.url)
            .filter(|u| !u.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_shape() {
        let request = ChatRequest {
            model: "gpt-4-turbo-preview",
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("hi")],
            temperature: Some(0.5),
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "gpt-4-turbo-preview");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert_eq!(json["temperature"], 0.5);
    }

    #[test]
    fn test_chat_request_omits_temperature() {
        let request = ChatRequest {
            model: "m",
            messages: vec![],
            temperature: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_chat_response_content() {
        let data: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"こんにちは"}}]}"#,
        )
        .unwrap();
        assert_eq!(data.first_content().as_deref(), Some("こんにちは"));
    }

    #[test]
    fn test_chat_response_null_or_missing_content() {
        let data: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert_eq!(data.first_content(), None);

        let data: ChatResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(data.first_content(), None);
    }

    #[test]
    fn test_image_response_url() {
        let data: ImageResponse =
            serde_json::from_str(r#"{"created":1,"data":[{"url":"https://img/x.png"}]}"#).unwrap();
        assert_eq!(data.first_url().as_deref(), Some("https://img/x.png"));

        let data: ImageResponse =
            serde_json::from_str(r#"{"data":[{"b64_json":"AAAA"}]}"#).unwrap();
        assert_eq!(data.first_url(), None);
    }
}

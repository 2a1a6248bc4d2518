//! Seams to the external services the pipeline calls.

use crate::error::Result;
use async_trait::async_trait;

/// Produces a markdown research report for a topic.
#[async_trait]
pub trait ResearchCollector: Send + Sync {
    /// Research `topic` and return the report as markdown.
    async fn research(&self, topic: &str, report_type: &str) -> Result<String>;
}

/// Translates a markdown report, preserving its slide structure.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `markdown`; an empty result is an error.
    async fn translate(&self, markdown: &str) -> Result<String>;
}

/// Generates illustrations from a text prompt.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Request one image, returning its URL, or `None` if the service gave none.
    async fn generate_image(&self, prompt: &str) -> Result<Option<String>>;

    /// Fetch the bytes behind an image URL.
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}

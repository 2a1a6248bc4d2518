//! Title illustration generation.

use crate::client::{ImageRequest, OpenAiClient};
use async_trait::async_trait;
use deck_core::{Config, ImageGenerator, Result};

/// [`ImageGenerator`] backed by an image generation endpoint.
pub struct ImageModelGenerator {
    client: OpenAiClient,
    model: String,
    size: String,
    quality: String,
}

impl ImageModelGenerator {
    /// Create a generator with the configured model, size and quality.
    pub fn new(client: OpenAiClient, config: &Config) -> Self {
        Self {
            client,
            model: config.image_model.clone(),
            size: config.image_size.clone(),
            quality: config.image_quality.clone(),
        }
    }
}

#[async_trait]
impl ImageGenerator for ImageModelGenerator {
    async fn generate_image(&self, prompt: &str) -> Result<Option<String>> {
        let request = ImageRequest {
            model: &self.model,
            prompt,
            size: &self.size,
            quality: &self.quality,
            n: 1,
        };
        self.client.create_image(&request).await
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.client.download(url).await
    }
}

//! Run configuration.
//!
//! The API credential is read once from the environment and threaded into the
//! collaborators explicitly; nothing here is global.

use crate::error::{Error, Result};
use crate::types::Labels;
use std::path::PathBuf;

/// Environment variable holding the AI service credential.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Environment variable overriding the API base URL.
pub const API_BASE_VAR: &str = "OPENAI_BASE_URL";

/// Default OpenAI-compatible API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Settings for one research-to-deck run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer credential for the AI service.
    pub api_key: String,

    /// Base URL of the OpenAI-compatible API, without trailing slash.
    pub api_base: String,

    /// Chat model used for research and translation.
    pub chat_model: String,

    /// Image model used for the title illustration.
    pub image_model: String,

    /// Requested illustration size.
    pub image_size: String,

    /// Requested illustration quality.
    pub image_quality: String,

    /// Sampling temperature for translation.
    pub translation_temperature: f32,

    /// Language the report is translated into.
    pub target_language: String,

    /// Report type tag passed to the research collector.
    pub report_type: String,

    /// Directory receiving the illustration and the deck.
    pub output_dir: PathBuf,

    /// Fallback font applied to every placeholder.
    pub font: String,
}

impl Config {
    /// Create a configuration with defaults around the given credential.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            chat_model: "gpt-4-turbo-preview".to_string(),
            image_model: "dall-e-3".to_string(),
            image_size: "1792x1024".to_string(),
            image_quality: "standard".to_string(),
            translation_temperature: 0.3,
            target_language: "Japanese".to_string(),
            report_type: "research_report".to_string(),
            output_dir: PathBuf::from("output"),
            font: "BIZ UDPゴシック".to_string(),
        }
    }

    /// Build the configuration from process environment variables.
    ///
    /// Fails with [`Error::Configuration`] when the credential is missing.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                Error::Configuration(format!("{} environment variable is not set", API_KEY_VAR))
            })?;

        let mut config = Self::new(api_key);
        if let Some(base) = lookup(API_BASE_VAR).filter(|v| !v.trim().is_empty()) {
            config.api_base = base.trim().trim_end_matches('/').to_string();
        }

        Ok(config)
    }

    /// Filler labels matching the target language.
    pub fn labels(&self) -> Labels {
        Labels::for_language(&self.target_language)
    }

    /// Path of the downloaded title illustration.
    pub fn title_image_path(&self) -> PathBuf {
        self.output_dir.join(TITLE_IMAGE_FILE)
    }
}

/// File name of the downloaded title illustration.
pub const TITLE_IMAGE_FILE: &str = "title_image.png";

/// File name of the saved deck.
pub const DECK_FILE: &str = "presentation.pptx";

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        let err = Config::from_lookup(lookup(&[(API_KEY_VAR, "   ")])).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[(API_KEY_VAR, "sk-test")])).unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.report_type, "research_report");
        assert_eq!(config.title_image_path(), PathBuf::from("output/title_image.png"));
        assert_eq!(config.labels(), Labels::japanese());
    }

    #[test]
    fn test_base_url_override_trims_slash() {
        let config = Config::from_lookup(lookup(&[
            (API_KEY_VAR, "sk-test"),
            (API_BASE_VAR, "http://localhost:8080/v1/"),
        ]))
        .unwrap();
        assert_eq!(config.api_base, "http://localhost:8080/v1");
    }
}

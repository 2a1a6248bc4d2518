//! Error types for research deck generation.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while researching, translating or building a deck.
#[derive(Error, Debug)]
pub enum Error {
    /// Required configuration (such as the API credential) is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An external service (research, translation, image generation) failed.
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    /// Styling or placing an element on a slide failed.
    #[error("Render error: {0}")]
    Render(String),

    /// The final deck file could not be saved or failed verification.
    #[error("Save error: {0}")]
    Save(String),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    Zip(String),

    /// XML generation or parsing error (for PPTX).
    #[error("XML error: {0}")]
    Xml(String),
}

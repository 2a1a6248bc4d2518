//! HTTP collaborators for research deck generation.
//!
//! All three services talk to an OpenAI-compatible API through one shared
//! [`OpenAiClient`].

pub mod client;
pub mod illustrate;
pub mod research;
pub mod translate;

pub use client::OpenAiClient;
pub use illustrate::ImageModelGenerator;
pub use research::ChatResearcher;
pub use translate::ChatTranslator;

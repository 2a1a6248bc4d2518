//! Core domain types, markdown-to-slide parsing, configuration and
//! collaborator traits for research deck generation.

pub mod collaborators;
pub mod config;
pub mod error;
pub mod parser;
pub mod types;

pub use collaborators::{ImageGenerator, ResearchCollector, Translator};
pub use config::Config;
pub use error::{Error, Result};
pub use parser::{normalize_bullet, ContentParser};
pub use types::{Labels, ParsedDeck, SlideRecord, BULLET};

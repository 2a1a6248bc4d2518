//! Domain types for parsed slide content.

use serde::{Deserialize, Serialize};

/// The bullet glyph that replaces `* ` and `- ` list markers.
pub const BULLET: char = '•';

/// A research report segmented into a deck title and ordered slides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDeck {
    /// Deck title, taken from the first `# ` heading or a filler.
    pub title: String,

    /// Content slides in source order.
    pub slides: Vec<SlideRecord>,
}

impl ParsedDeck {
    /// Create a parsed deck from a title and its slides.
    pub fn new(title: impl Into<String>, slides: Vec<SlideRecord>) -> Self {
        Self {
            title: title.into(),
            slides,
        }
    }

    /// Number of slides the built deck will contain, title slide included.
    pub fn deck_len(&self) -> usize {
        self.slides.len() + 1
    }
}

/// One content slide: a heading and its newline-joined body lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideRecord {
    /// Slide heading.
    pub title: String,

    /// Body lines joined by `\n`, bullets already normalized. Never empty.
    pub content: String,
}

impl SlideRecord {
    /// Create a new slide record.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Non-blank body lines in order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content.lines().filter(|l| !l.trim().is_empty())
    }
}

/// Filler strings used when the source text lacks a heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labels {
    /// Title of the slide built from the title block's body text.
    pub introduction: String,

    /// Title of a slide whose block had no `## ` heading.
    pub continued: String,

    /// Deck title when the first block had no `# ` heading.
    pub untitled: String,
}

impl Labels {
    /// English filler strings.
    pub fn english() -> Self {
        Self {
            introduction: "Introduction".to_string(),
            continued: "Continued".to_string(),
            untitled: "Untitled Presentation".to_string(),
        }
    }

    /// Japanese filler strings.
    pub fn japanese() -> Self {
        Self {
            introduction: "はじめに".to_string(),
            continued: "続き".to_string(),
            untitled: "無題のプレゼンテーション".to_string(),
        }
    }

    /// Pick labels for a target language name or code, falling back to English.
    pub fn for_language(language: &str) -> Self {
        match language.trim().to_lowercase().as_str() {
            "ja" | "jp" | "japanese" | "日本語" => Self::japanese(),
            _ => Self::english(),
        }
    }
}

impl Default for Labels {
    fn default() -> Self {
        Self::english()
    }
}

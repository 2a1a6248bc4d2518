//! Markdown report segmentation into slide records.
//!
//! Reports arrive in a Marp-like dialect: an optional front-matter block
//! fenced by `---` lines, then slides separated by standalone `---` lines.
//! The first slide carries the `# ` deck title; later slides carry `## `
//! headings followed by body lines and `* ` / `- ` bullets.

use crate::types::{Labels, ParsedDeck, SlideRecord, BULLET};
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// A standalone slide separator line (trailing whitespace tolerated).
static SEPARATOR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^---[ \t]*$").unwrap());

/// A `* ` or `- ` list marker at the start of a trimmed line.
static BULLET_MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[*-] ").unwrap());

/// Heading marker of the deck title in the first block.
const TITLE_MARKER: &str = "# ";

/// Heading marker of a slide title in subsequent blocks.
const SLIDE_TITLE_MARKER: &str = "## ";

/// Rewrite a leading `* ` or `- ` list marker to the bullet glyph.
///
/// Only the start of the line is considered; markers in the middle of a line
/// are left alone. Lines already using the glyph are returned unchanged.
pub fn normalize_bullet(line: &str) -> Cow<'_, str> {
    if BULLET_MARKER_REGEX.is_match(line) {
        Cow::Owned(format!("{} {}", BULLET, &line[2..]))
    } else {
        Cow::Borrowed(line)
    }
}

fn is_separator(line: &str) -> bool {
    SEPARATOR_REGEX.is_match(line)
}

/// Remove a surrounding ```` ``` ```` fence that chat models sometimes wrap output in.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if !(trimmed.starts_with("```") && trimmed.ends_with("```") && trimmed.len() > 6) {
        return text;
    }

    let inner = &trimmed[..trimmed.len() - 3];
    match inner.find('\n') {
        Some(pos) => &inner[pos + 1..],
        None => text,
    }
}

/// Return the lines following the front-matter block, if any.
///
/// Front-matter is only recognized when the first non-blank line is a
/// separator. With a closing separator everything through it is dropped;
/// without one, the text after the last separator is kept.
fn strip_front_matter<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    let first_content = lines.iter().position(|l| !l.trim().is_empty());
    let separators: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| is_separator(l))
        .map(|(i, _)| i)
        .collect();

    let start = match (first_content, separators.as_slice()) {
        (Some(first), [open, close, ..]) if *open == first => close + 1,
        (Some(first), [only]) if *only == first => only + 1,
        _ => 0,
    };

    lines[start.min(lines.len())..].to_vec()
}

/// Split lines into blocks on separator lines.
fn split_blocks<'a>(lines: &[&'a str]) -> Vec<Vec<&'a str>> {
    let mut blocks = vec![Vec::new()];

    for line in lines {
        if is_separator(line) {
            blocks.push(Vec::new());
        } else if let Some(block) = blocks.last_mut() {
            block.push(*line);
        }
    }

    blocks
}

fn heading<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    line.trim_start().strip_prefix(marker).map(str::trim)
}

/// Parser turning a markdown report into a [`ParsedDeck`].
#[derive(Debug, Clone, Default)]
pub struct ContentParser {
    labels: Labels,
}

impl ContentParser {
    /// Create a parser with English filler labels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given filler labels.
    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    /// The filler labels in use.
    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Parse a markdown report into a deck title and content slides.
    ///
    /// Never fails: empty input yields the untitled filler and no slides.
    pub fn parse(&self, content: &str) -> ParsedDeck {
        let prepared: String = content.replace("\r\n", "\n").nfc().collect();
        let text = strip_code_fence(&prepared);

        let lines: Vec<&str> = text.split('\n').collect();
        let body = strip_front_matter(&lines);
        let blocks = split_blocks(&body);

        let mut slides = Vec::new();
        let mut blocks = blocks.iter();

        let title = match blocks.next() {
            Some(first) => {
                let (title, intro) = self.parse_title_block(first);
                slides.extend(intro);
                title
            }
            None => None,
        };

        for block in blocks {
            if block.iter().all(|l| l.trim().is_empty()) {
                continue;
            }
            slides.extend(self.parse_slide_block(block));
        }

        let title = title.unwrap_or_else(|| self.labels.untitled.clone());
        log::debug!("Parsed deck '{}' with {} content slides", title, slides.len());

        ParsedDeck::new(title, slides)
    }

    /// Parse the title block: `# ` heading plus an optional introduction slide.
    fn parse_title_block(&self, block: &[&str]) -> (Option<String>, Option<SlideRecord>) {
        let mut title: Option<String> = None;
        let mut body = Vec::new();

        for line in block {
            if let Some(text) = heading(line, TITLE_MARKER) {
                title = Some(text.to_string());
            } else if !line.trim().is_empty() {
                body.push(line.trim());
            }
        }

        let intro = if body.is_empty() {
            None
        } else {
            Some(SlideRecord::new(
                self.labels.introduction.clone(),
                body.join("\n"),
            ))
        };

        (title.filter(|t| !t.is_empty()), intro)
    }

    /// Parse a content block: `## ` heading plus normalized body lines.
    fn parse_slide_block(&self, block: &[&str]) -> Option<SlideRecord> {
        let mut title: Option<String> = None;
        let mut body: Vec<String> = Vec::new();

        for line in block {
            if let Some(text) = heading(line, SLIDE_TITLE_MARKER) {
                title = Some(text.to_string());
            } else if !line.trim().is_empty() {
                body.push(normalize_bullet(line.trim()).into_owned());
            }
        }

        if body.is_empty() {
            return None;
        }

        let title = title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.labels.continued.clone());
        Some(SlideRecord::new(title, body.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> ParsedDeck {
        ContentParser::new().parse(content)
    }

    #[test]
    fn test_worked_example() {
        let deck = parse("# Hello\nWorld\n---\n## Topic\n* point one\n- point two\n---\n## End\n");

        assert_eq!(deck.title, "Hello");
        assert_eq!(
            deck.slides,
            vec![
                SlideRecord::new("Introduction", "World"),
                SlideRecord::new("Topic", "• point one\n• point two"),
            ]
        );
    }

    #[test]
    fn test_front_matter_is_stripped() {
        let deck = parse("---\nmarp: true\ntheme: default\n---\n# Deck\n---\n## One\nBody\n");

        assert_eq!(deck.title, "Deck");
        assert_eq!(deck.slides, vec![SlideRecord::new("One", "Body")]);
    }

    #[test]
    fn test_front_matter_after_blank_lines() {
        let deck = parse("\n\n---\nmarp: true\n---\n# Deck\n");
        assert_eq!(deck.title, "Deck");
        assert!(deck.slides.is_empty());
    }

    #[test]
    fn test_unclosed_leading_separator_uses_last_separator() {
        let deck = parse("---\n# Deck\nIntro text\n");
        assert_eq!(deck.title, "Deck");
        assert_eq!(deck.slides, vec![SlideRecord::new("Introduction", "Intro text")]);
    }

    #[test]
    fn test_no_front_matter_no_separators() {
        let deck = parse("# Only Title\nSome words");
        assert_eq!(deck.title, "Only Title");
        assert_eq!(deck.slides, vec![SlideRecord::new("Introduction", "Some words")]);
    }

    #[test]
    fn test_empty_input() {
        let deck = parse("");
        assert_eq!(deck.title, "Untitled Presentation");
        assert!(deck.slides.is_empty());
    }

    #[test]
    fn test_whitespace_only_block_skipped() {
        let deck = parse("# T\n---\n   \n\n---\n## A\nx\n");
        assert_eq!(deck.slides, vec![SlideRecord::new("A", "x")]);
    }

    #[test]
    fn test_heading_only_block_dropped() {
        let deck = parse("# T\n---\n## Lonely\n\n---\n## Full\nbody\n");
        assert_eq!(deck.slides, vec![SlideRecord::new("Full", "body")]);
    }

    #[test]
    fn test_body_without_heading_is_continued() {
        let deck = parse("# T\n---\n- carried over\nmore\n");
        assert_eq!(
            deck.slides,
            vec![SlideRecord::new("Continued", "• carried over\nmore")]
        );
    }

    #[test]
    fn test_title_block_bullets_not_normalized() {
        let deck = parse("# T\n* raw bullet\n");
        assert_eq!(deck.slides, vec![SlideRecord::new("Introduction", "* raw bullet")]);
    }

    #[test]
    fn test_title_block_without_heading_uses_filler() {
        let deck = parse("just text\n---\n## A\nb\n");
        assert_eq!(deck.title, "Untitled Presentation");
        assert_eq!(deck.slides[0], SlideRecord::new("Introduction", "just text"));
    }

    #[test]
    fn test_japanese_labels() {
        let parser = ContentParser::new().with_labels(Labels::japanese());
        let deck = parser.parse("概要\n---\n本文\n");

        assert_eq!(deck.title, "無題のプレゼンテーション");
        assert_eq!(deck.slides[0].title, "はじめに");
        assert_eq!(deck.slides[1].title, "続き");
    }

    #[test]
    fn test_bullet_normalization_line_start_only() {
        assert_eq!(normalize_bullet("* item"), "• item");
        assert_eq!(normalize_bullet("- item"), "• item");
        assert_eq!(normalize_bullet("a - b * c"), "a - b * c");
        assert_eq!(normalize_bullet("-no space"), "-no space");
    }

    #[test]
    fn test_bullet_normalization_idempotent() {
        for line in ["* one", "- two", "• three", "plain"] {
            let once = normalize_bullet(line).into_owned();
            let twice = normalize_bullet(&once).into_owned();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_indented_bullets_are_trimmed_then_normalized() {
        let deck = parse("# T\n---\n## A\n   - nested\n");
        assert_eq!(deck.slides[0].content, "• nested");
    }

    #[test]
    fn test_crlf_and_code_fence() {
        let deck = parse("```markdown\r\n# Fenced\r\n---\r\n## A\r\n* x\r\n```");
        assert_eq!(deck.title, "Fenced");
        assert_eq!(deck.slides, vec![SlideRecord::new("A", "• x")]);
    }

    #[test]
    fn test_separator_with_trailing_spaces() {
        let deck = parse("# T\n---  \n## A\nbody\n");
        assert_eq!(deck.slides, vec![SlideRecord::new("A", "body")]);
    }

    #[test]
    fn test_nfc_normalization() {
        // "か" + combining dakuten composes to "が"
        let deck = parse("# T\n---\n## A\n\u{304B}\u{3099}\n");
        assert_eq!(deck.slides[0].content, "\u{304C}");
    }
}

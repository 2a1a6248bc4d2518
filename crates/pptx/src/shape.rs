//! Slide elements: placeholders, pictures and their text.

use deck_core::{Error, Result};

/// Largest paragraph indentation level PresentationML allows.
pub const MAX_LEVEL: u8 = 8;

/// Font size bounds in points (`sz` is stored in hundredths, 100..=400000).
const MIN_FONT_SIZE: f64 = 1.0;
const MAX_FONT_SIZE: f64 = 4000.0;

/// Position and size in EMUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Rect {
    pub fn new(x: i64, y: i64, cx: i64, cy: i64) -> Self {
        Self { x, y, cx, cy }
    }
}

/// Character formatting of a paragraph's run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Font {
    name: Option<String>,
    size: Option<f64>,
}

impl Font {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set the typeface. Empty names are rejected.
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::Render("Font name is empty".to_string()));
        }
        self.name = Some(name.to_string());
        Ok(())
    }

    /// Size in points.
    pub fn size(&self) -> Option<f64> {
        self.size
    }

    /// Set the size in points.
    pub fn set_size(&mut self, points: f64) -> Result<()> {
        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&points) {
            return Err(Error::Render(format!(
                "Font size {}pt outside {}..={}",
                points, MIN_FONT_SIZE, MAX_FONT_SIZE
            )));
        }
        self.size = Some(points);
        Ok(())
    }

    /// Size in hundredths of a point, as written to `a:rPr/@sz`.
    pub(crate) fn size_hundredths(&self) -> Option<u32> {
        self.size.map(|s| (s * 100.0).round() as u32)
    }
}

/// One paragraph of a text frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paragraph {
    text: String,
    level: u8,
    font: Font,
}

impl Paragraph {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Indentation level, 0 being the outermost.
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Set the indentation level (0..=8).
    pub fn set_level(&mut self, level: u8) -> Result<()> {
        if level > MAX_LEVEL {
            return Err(Error::Render(format!(
                "Paragraph level {} exceeds {}",
                level, MAX_LEVEL
            )));
        }
        self.level = level;
        Ok(())
    }

    pub fn font(&self) -> &Font {
        &self.font
    }

    pub fn font_mut(&mut self) -> &mut Font {
        &mut self.font
    }
}

/// Capability of holding editable paragraphs.
pub trait TextContainer {
    /// Remove every paragraph.
    fn clear(&mut self);

    /// Append an empty paragraph and return it.
    fn add_paragraph(&mut self) -> &mut Paragraph;

    /// Paragraphs in order.
    fn paragraphs(&self) -> &[Paragraph];
}

/// The text body of a placeholder.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextFrame {
    paragraphs: Vec<Paragraph>,
}

impl TextFrame {
    /// A frame holding one paragraph of text.
    pub fn with_text(text: &str) -> Self {
        let mut frame = Self::default();
        frame.add_paragraph().set_text(text);
        frame
    }

    /// All paragraph texts joined by newlines.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl TextContainer for TextFrame {
    fn clear(&mut self) {
        self.paragraphs.clear();
    }

    fn add_paragraph(&mut self) -> &mut Paragraph {
        self.paragraphs.push(Paragraph::default());
        let last = self.paragraphs.len() - 1;
        &mut self.paragraphs[last]
    }

    fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }
}

/// Role of a placeholder within its layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// Centered title of a title slide.
    CenterTitle,
    /// Subtitle of a title slide.
    SubTitle,
    /// Title of a content slide.
    Title,
    /// Body of a content slide.
    Body,
}

impl PlaceholderKind {
    pub fn is_title(self) -> bool {
        matches!(self, Self::CenterTitle | Self::Title)
    }

    /// Value of `p:ph/@type`, or `None` for the implicit object type.
    pub(crate) fn ph_type(self) -> Option<&'static str> {
        match self {
            Self::CenterTitle => Some("ctrTitle"),
            Self::SubTitle => Some("subTitle"),
            Self::Title => Some("title"),
            Self::Body => None,
        }
    }

    pub(crate) fn display_name(self) -> &'static str {
        match self {
            Self::CenterTitle | Self::Title => "Title",
            Self::SubTitle => "Subtitle",
            Self::Body => "Content Placeholder",
        }
    }
}

/// A predefined text region inherited from a layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    pub(crate) id: u32,
    pub(crate) kind: PlaceholderKind,
    pub(crate) idx: Option<u32>,
    /// Explicit geometry; `None` inherits from the layout.
    pub(crate) rect: Option<Rect>,
    /// Fallback typeface written into the list style.
    pub(crate) fallback_font: Option<String>,
    pub(crate) frame: TextFrame,
}

impl Placeholder {
    pub(crate) fn new(id: u32, kind: PlaceholderKind, idx: Option<u32>) -> Self {
        Self {
            id,
            kind,
            idx,
            rect: None,
            fallback_font: None,
            frame: TextFrame::default(),
        }
    }

    pub(crate) fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = Some(rect);
        self
    }

    pub(crate) fn with_prompt(mut self, prompt: &str) -> Self {
        self.frame = TextFrame::with_text(prompt);
        self
    }

    /// Copy of this placeholder as it appears on a fresh slide: same
    /// identity, inherited geometry and style, no text.
    pub(crate) fn instantiate(&self) -> Self {
        Self::new(self.id, self.kind, self.idx)
    }

    pub fn kind(&self) -> PlaceholderKind {
        self.kind
    }

    pub fn idx(&self) -> Option<u32> {
        self.idx
    }

    pub fn fallback_font(&self) -> Option<&str> {
        self.fallback_font.as_deref()
    }

    /// Set the typeface used when paragraphs carry none of their own.
    pub fn set_fallback_font(&mut self, font: &str) -> Result<()> {
        if font.trim().is_empty() {
            return Err(Error::Render("Fallback font name is empty".to_string()));
        }
        self.fallback_font = Some(font.to_string());
        Ok(())
    }

    pub fn frame(&self) -> &TextFrame {
        &self.frame
    }
}

/// An image stretched over a rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Picture {
    pub(crate) id: u32,
    pub(crate) media: usize,
    pub(crate) rect: Rect,
    pub(crate) description: String,
}

impl Picture {
    /// Index of the image in the deck's media list.
    pub fn media(&self) -> usize {
        self.media
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }
}

/// An element of a slide's shape tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Placeholder(Placeholder),
    Picture(Picture),
}

impl Shape {
    pub fn id(&self) -> u32 {
        match self {
            Self::Placeholder(p) => p.id,
            Self::Picture(p) => p.id,
        }
    }

    /// The shape's text, for variants that have one.
    pub fn text_container(&self) -> Option<&dyn TextContainer> {
        match self {
            Self::Placeholder(p) => Some(&p.frame),
            Self::Picture(_) => None,
        }
    }

    /// Mutable access to the shape's text, for variants that have one.
    pub fn text_container_mut(&mut self) -> Option<&mut dyn TextContainer> {
        match self {
            Self::Placeholder(p) => Some(&mut p.frame),
            Self::Picture(_) => None,
        }
    }

    pub fn as_placeholder(&self) -> Option<&Placeholder> {
        match self {
            Self::Placeholder(p) => Some(p),
            Self::Picture(_) => None,
        }
    }

    pub fn is_picture(&self) -> bool {
        matches!(self, Self::Picture(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_size_bounds() {
        let mut font = Font::default();
        assert!(font.set_size(16.0).is_ok());
        assert_eq!(font.size_hundredths(), Some(1600));
        assert!(matches!(font.set_size(0.0), Err(Error::Render(_))));
        assert!(matches!(font.set_size(5000.0), Err(Error::Render(_))));
        assert_eq!(font.size(), Some(16.0));
    }

    #[test]
    fn test_paragraph_level_bounds() {
        let mut p = Paragraph::default();
        assert!(p.set_level(1).is_ok());
        assert!(p.set_level(9).is_err());
        assert_eq!(p.level(), 1);
    }

    #[test]
    fn test_text_frame_clear_and_add() {
        let mut frame = TextFrame::with_text("prompt");
        frame.clear();
        assert!(frame.paragraphs().is_empty());

        frame.add_paragraph().set_text("one");
        frame.add_paragraph().set_text("two");
        assert_eq!(frame.text(), "one\ntwo");
    }

    #[test]
    fn test_picture_has_no_text_container() {
        let mut shape = Shape::Picture(Picture {
            id: 4,
            media: 0,
            rect: Rect::default(),
            description: String::new(),
        });
        assert!(shape.text_container_mut().is_none());

        let mut shape = Shape::Placeholder(Placeholder::new(2, PlaceholderKind::Title, None));
        let frame = shape.text_container_mut().unwrap();
        frame.add_paragraph().set_text("Hi");
        assert_eq!(shape.text_container().unwrap().paragraphs().len(), 1);
    }

    #[test]
    fn test_instantiate_drops_text_and_geometry() {
        let layout_ph = Placeholder::new(3, PlaceholderKind::Body, Some(1))
            .with_rect(Rect::new(1, 2, 3, 4))
            .with_prompt("Click to add text");
        let slide_ph = layout_ph.instantiate();
        assert_eq!(slide_ph.id, 3);
        assert_eq!(slide_ph.idx(), Some(1));
        assert!(slide_ph.rect.is_none());
        assert!(slide_ph.frame().paragraphs().is_empty());
    }
}

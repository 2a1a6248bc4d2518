//! In-memory deck: canvas, layouts, slides and media.

use crate::shape::{Picture, Placeholder, PlaceholderKind, Rect, Shape, TextContainer};
use deck_core::{Error, Result};

/// English Metric Units per inch.
pub const EMU_PER_INCH: i64 = 914_400;

/// Convert inches to EMUs.
pub const fn inches(value: i64) -> i64 {
    value * EMU_PER_INCH
}

/// First `p:sldId/@id` PowerPoint accepts.
const FIRST_SLIDE_ID: u32 = 256;

/// Supported embedded image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Detect the format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }
        None
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// An embedded image part.
#[derive(Debug, Clone)]
pub struct Media {
    pub(crate) data: Vec<u8>,
    pub(crate) format: ImageFormat,
}

impl Media {
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// The two layouts a deck offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    /// Centered title and subtitle.
    Title,
    /// Title bar and body region.
    TitleAndBody,
}

impl LayoutKind {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Title => "Title Slide",
            Self::TitleAndBody => "Title and Content",
        }
    }

    /// Value of `p:sldLayout/@type`.
    pub(crate) fn layout_type(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::TitleAndBody => "obj",
        }
    }
}

/// A slide layout template and its placeholders.
#[derive(Debug, Clone)]
pub struct Layout {
    pub(crate) kind: LayoutKind,
    pub(crate) placeholders: Vec<Placeholder>,
}

impl Layout {
    fn title(width: i64, height: i64) -> Self {
        Self {
            kind: LayoutKind::Title,
            placeholders: vec![
                Placeholder::new(2, PlaceholderKind::CenterTitle, None)
                    .with_rect(Rect::new(
                        width * 75 / 1000,
                        height * 310 / 1000,
                        width * 850 / 1000,
                        height * 215 / 1000,
                    ))
                    .with_prompt("Click to edit Master title style"),
                Placeholder::new(3, PlaceholderKind::SubTitle, Some(1))
                    .with_rect(Rect::new(
                        width * 150 / 1000,
                        height * 570 / 1000,
                        width * 700 / 1000,
                        height * 255 / 1000,
                    ))
                    .with_prompt("Click to edit Master subtitle style"),
            ],
        }
    }

    fn title_and_body(width: i64, height: i64) -> Self {
        let (title, body) = content_regions(width, height);
        Self {
            kind: LayoutKind::TitleAndBody,
            placeholders: vec![
                Placeholder::new(2, PlaceholderKind::Title, None)
                    .with_rect(title)
                    .with_prompt("Click to edit Master title style"),
                Placeholder::new(3, PlaceholderKind::Body, Some(1))
                    .with_rect(body)
                    .with_prompt("Click to edit Master text styles"),
            ],
        }
    }

    pub fn kind(&self) -> LayoutKind {
        self.kind
    }

    pub fn placeholders(&self) -> &[Placeholder] {
        &self.placeholders
    }
}

/// Title bar and body regions of a content slide; also used by the master.
pub(crate) fn content_regions(width: i64, height: i64) -> (Rect, Rect) {
    (
        Rect::new(
            width * 50 / 1000,
            height * 40 / 1000,
            width * 900 / 1000,
            height * 167 / 1000,
        ),
        Rect::new(
            width * 50 / 1000,
            height * 233 / 1000,
            width * 900 / 1000,
            height * 660 / 1000,
        ),
    )
}

/// One slide built from a layout.
#[derive(Debug, Clone)]
pub struct Slide {
    pub(crate) slide_id: u32,
    pub(crate) layout: LayoutKind,
    pub(crate) shapes: Vec<Shape>,
    next_shape_id: u32,
}

impl Slide {
    fn from_layout(slide_id: u32, layout: &Layout) -> Self {
        let shapes: Vec<Shape> = layout
            .placeholders
            .iter()
            .map(|p| Shape::Placeholder(p.instantiate()))
            .collect();
        let next_shape_id = shapes.iter().map(Shape::id).max().unwrap_or(1) + 1;

        Self {
            slide_id,
            layout: layout.kind,
            shapes,
            next_shape_id,
        }
    }

    pub fn slide_id(&self) -> u32 {
        self.slide_id
    }

    pub fn layout(&self) -> LayoutKind {
        self.layout
    }

    /// Shapes in z-order, back to front.
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// The title placeholder's text, if the layout has one.
    pub fn title_mut(&mut self) -> Option<&mut dyn TextContainer> {
        self.shapes
            .iter_mut()
            .find(|s| matches!(s, Shape::Placeholder(p) if p.kind.is_title()))
            .and_then(Shape::text_container_mut)
    }

    /// The text of the placeholder with the given `idx`.
    pub fn placeholder_mut(&mut self, idx: u32) -> Option<&mut dyn TextContainer> {
        self.shapes
            .iter_mut()
            .find(|s| matches!(s, Shape::Placeholder(p) if p.idx == Some(idx)))
            .and_then(Shape::text_container_mut)
    }

    pub fn placeholder_count(&self) -> usize {
        self.shapes
            .iter()
            .filter(|s| s.as_placeholder().is_some())
            .count()
    }

    /// Title text, if any paragraph was set.
    pub fn title_text(&self) -> Option<String> {
        self.shapes
            .iter()
            .filter_map(Shape::as_placeholder)
            .find(|p| p.kind.is_title())
            .map(|p| p.frame.text())
            .filter(|t| !t.is_empty())
    }

    /// Add a picture on top of the shape tree; returns its index.
    pub fn add_picture(&mut self, media: usize, rect: Rect, description: &str) -> usize {
        let id = self.next_shape_id;
        self.next_shape_id += 1;
        self.shapes.push(Shape::Picture(Picture {
            id,
            media,
            rect,
            description: description.to_string(),
        }));
        self.shapes.len() - 1
    }

    /// Move the shape at `index` to the back of the z-order.
    pub fn send_to_back(&mut self, index: usize) -> Result<()> {
        if index >= self.shapes.len() {
            return Err(Error::Render(format!(
                "No shape at index {} (slide has {})",
                index,
                self.shapes.len()
            )));
        }
        let shape = self.shapes.remove(index);
        self.shapes.insert(0, shape);
        Ok(())
    }

    pub fn has_picture(&self) -> bool {
        self.shapes.iter().any(Shape::is_picture)
    }
}

/// A presentation under construction.
#[derive(Debug, Clone)]
pub struct Deck {
    title: String,
    width: i64,
    height: i64,
    pub(crate) layouts: Vec<Layout>,
    pub(crate) slides: Vec<Slide>,
    pub(crate) media: Vec<Media>,
}

impl Deck {
    /// Create a 16:9 deck, 16 by 9 inches, with the title and content layouts.
    pub fn widescreen() -> Self {
        Self::with_size(inches(16), inches(9))
    }

    /// Create a deck with a custom canvas in EMUs.
    pub fn with_size(width: i64, height: i64) -> Self {
        Self {
            title: String::new(),
            width,
            height,
            layouts: vec![
                Layout::title(width, height),
                Layout::title_and_body(width, height),
            ],
            slides: Vec::new(),
            media: Vec::new(),
        }
    }

    pub fn width(&self) -> i64 {
        self.width
    }

    pub fn height(&self) -> i64 {
        self.height
    }

    /// The full canvas as a rectangle.
    pub fn canvas(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// Document title written to the core properties.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    pub fn layouts(&self) -> &[Layout] {
        &self.layouts
    }

    pub fn layout(&self, kind: LayoutKind) -> Option<&Layout> {
        self.layouts.iter().find(|l| l.kind == kind)
    }

    /// Set the fallback font on every placeholder of every layout.
    pub fn apply_fallback_font(&mut self, font: &str) -> Result<()> {
        for placeholder in self.layouts.iter_mut().flat_map(|l| l.placeholders.iter_mut()) {
            placeholder.set_fallback_font(font)?;
        }
        Ok(())
    }

    /// Append a slide built from `kind` and return it.
    pub fn add_slide(&mut self, kind: LayoutKind) -> Result<&mut Slide> {
        let slide_id = FIRST_SLIDE_ID + self.slides.len() as u32;
        let layout = self
            .layout(kind)
            .ok_or_else(|| Error::Render(format!("Deck has no '{}' layout", kind.name())))?;
        let slide = Slide::from_layout(slide_id, layout);

        self.slides.push(slide);
        let last = self.slides.len() - 1;
        Ok(&mut self.slides[last])
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn slide_mut(&mut self, index: usize) -> Option<&mut Slide> {
        self.slides.get_mut(index)
    }

    /// Embed image bytes, returning the media index.
    pub fn add_media(&mut self, data: Vec<u8>) -> Result<usize> {
        let format = ImageFormat::from_magic(&data)
            .ok_or_else(|| Error::Render("Unrecognized image format".to_string()))?;
        self.media.push(Media { data, format });
        Ok(self.media.len() - 1)
    }

    pub fn media(&self) -> &[Media] {
        &self.media
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::widescreen()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Smallest valid PNG signature plus padding.
    pub(crate) const PNG_BYTES: &[u8] = &[
        0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0,
    ];

    #[test]
    fn test_widescreen_canvas() {
        let deck = Deck::widescreen();
        assert_eq!(deck.width(), 14_630_400);
        assert_eq!(deck.height(), 8_229_600);
        assert_eq!(deck.layouts().len(), 2);
    }

    #[test]
    fn test_fallback_font_reaches_every_layout_placeholder() {
        let mut deck = Deck::widescreen();
        deck.apply_fallback_font("Noto Sans JP").unwrap();

        for layout in deck.layouts() {
            for placeholder in layout.placeholders() {
                assert_eq!(placeholder.fallback_font(), Some("Noto Sans JP"));
            }
        }
        assert!(deck.apply_fallback_font("  ").is_err());
    }

    #[test]
    fn test_add_slide_instantiates_placeholders() {
        let mut deck = Deck::widescreen();
        let slide = deck.add_slide(LayoutKind::TitleAndBody).unwrap();
        assert_eq!(slide.slide_id(), 256);
        assert_eq!(slide.placeholder_count(), 2);

        slide.title_mut().unwrap().add_paragraph().set_text("Topic");
        slide.placeholder_mut(1).unwrap().add_paragraph().set_text("Body");
        assert_eq!(slide.title_text().as_deref(), Some("Topic"));

        let second = deck.add_slide(LayoutKind::Title).unwrap();
        assert_eq!(second.slide_id(), 257);
        assert_eq!(second.title_text(), None);
    }

    #[test]
    fn test_picture_sent_to_back() {
        let mut deck = Deck::widescreen();
        let media = deck.add_media(PNG_BYTES.to_vec()).unwrap();
        let canvas = deck.canvas();
        let slide = deck.add_slide(LayoutKind::Title).unwrap();

        let index = slide.add_picture(media, canvas, "background");
        assert_eq!(index, 2);
        slide.send_to_back(index).unwrap();

        assert!(slide.shapes()[0].is_picture());
        assert_eq!(slide.shapes()[0].id(), 4);
        assert!(slide.send_to_back(10).is_err());
    }

    #[test]
    fn test_unknown_media_rejected() {
        let mut deck = Deck::widescreen();
        assert!(matches!(deck.add_media(b"GIF89a".to_vec()), Err(Error::Render(_))));
    }

    #[test]
    fn test_image_format_from_magic() {
        assert_eq!(ImageFormat::from_magic(PNG_BYTES), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_magic(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_magic(b"PK"), None);
    }
}

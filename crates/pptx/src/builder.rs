//! Deck construction from parsed slide records.
//!
//! Cosmetic steps (fonts, sizes, the title illustration) are best-effort:
//! each returns a `Result` that is logged and dropped where it is called, so
//! a slide falls back to layout defaults instead of aborting the run. Only
//! the final save propagates errors.

use crate::deck::{Deck, LayoutKind, Slide};
use crate::package::{PackageSink, ZipPackageSink};
use crate::reader::DeckReader;
use crate::shape::TextContainer;
use deck_core::config::{DECK_FILE, TITLE_IMAGE_FILE};
use deck_core::{Config, ContentParser, Error, ImageGenerator, Result, SlideRecord, BULLET};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Font sizes and typeface applied while building.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckStyle {
    /// Fallback typeface for every placeholder.
    pub font: String,
    /// Title slide heading size in points.
    pub title_size: f64,
    /// Content slide heading size in points.
    pub slide_title_size: f64,
    /// Plain body line size in points.
    pub body_size: f64,
    /// Bulleted body line size in points.
    pub bullet_size: f64,
}

impl DeckStyle {
    pub fn with_font(font: impl Into<String>) -> Self {
        Self {
            font: font.into(),
            ..Self::default()
        }
    }
}

impl Default for DeckStyle {
    fn default() -> Self {
        Self {
            font: "BIZ UDPゴシック".to_string(),
            title_size: 32.0,
            slide_title_size: 28.0,
            body_size: 18.0,
            bullet_size: 16.0,
        }
    }
}

/// Prompt for the title slide illustration.
pub fn title_image_prompt(title: &str, audience: &str) -> String {
    format!(
        "Create a presentation cover image for the following topic:\n\
{title}\n\n\
Style:\n\
- modern, professional design\n\
- abstract background suited to a business presentation\n\
- clean and refined impression\n\
- restrained color palette appropriate to {audience} business culture\n\
- no text or lettering"
    )
}

/// Builds and saves a deck from slide records.
pub struct DeckBuilder {
    images: Arc<dyn ImageGenerator>,
    sink: Box<dyn PackageSink>,
    parser: ContentParser,
    style: DeckStyle,
    audience: String,
}

impl DeckBuilder {
    /// Create a builder using the configured font, labels and audience.
    pub fn new(images: Arc<dyn ImageGenerator>, config: &Config) -> Self {
        Self {
            images,
            sink: Box::new(ZipPackageSink),
            parser: ContentParser::new().with_labels(config.labels()),
            style: DeckStyle::with_font(config.font.clone()),
            audience: config.target_language.clone(),
        }
    }

    /// Replace where the finished deck is written.
    pub fn with_sink(mut self, sink: impl PackageSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn with_parser(mut self, parser: ContentParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_style(mut self, style: DeckStyle) -> Self {
        self.style = style;
        self
    }

    /// Parse `markdown` and build the deck into `output_dir`.
    pub async fn create_presentation(&self, markdown: &str, output_dir: &Path) -> Result<PathBuf> {
        let parsed = self.parser.parse(markdown);
        self.build(&parsed.title, &parsed.slides, output_dir).await
    }

    /// Build a title slide plus one content slide per record and save it.
    ///
    /// Returns the saved file's path. Fails with [`Error::Save`] when the file
    /// is missing, empty or unreadable after writing.
    pub async fn build(
        &self,
        title: &str,
        slides: &[SlideRecord],
        output_dir: &Path,
    ) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir)?;

        let mut deck = Deck::widescreen();
        deck.set_title(title);
        if let Err(e) = deck.apply_fallback_font(&self.style.font) {
            log::warn!("Failed to apply fallback font: {}", e);
        }

        let image_path = output_dir.join(TITLE_IMAGE_FILE);
        let image = self.fetch_title_image(title, &image_path).await;

        self.add_title_slide(&mut deck, title, image.as_deref())?;
        for record in slides {
            self.add_content_slide(&mut deck, record)?;
        }

        self.save(&deck, output_dir)
    }

    /// Generate and download the title illustration to `path`.
    ///
    /// Any failure leaves no file behind and the deck proceeds without it.
    async fn fetch_title_image(&self, title: &str, path: &Path) -> Option<PathBuf> {
        match std::fs::remove_file(path) {
            Ok(()) => log::debug!("Removed stale {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove stale {}: {}", path.display(), e),
        }

        let prompt = title_image_prompt(title, &self.audience);
        let url = match self.images.generate_image(&prompt).await {
            Ok(Some(url)) => url,
            Ok(None) => {
                log::warn!("Image generation returned no URL");
                return None;
            }
            Err(e) => {
                log::warn!("Image generation error: {}", e);
                return None;
            }
        };

        let bytes = match self.images.download(&url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Failed to download title image: {}", e);
                return None;
            }
        };

        match std::fs::write(path, &bytes) {
            Ok(()) => {
                log::info!("Saved title image to {}", path.display());
                Some(path.to_path_buf())
            }
            Err(e) => {
                log::warn!("Failed to write title image: {}", e);
                None
            }
        }
    }

    fn add_title_slide(&self, deck: &mut Deck, title: &str, image: Option<&Path>) -> Result<()> {
        let media = image.and_then(|path| {
            match std::fs::read(path)
                .map_err(Error::from)
                .and_then(|data| deck.add_media(data))
            {
                Ok(media) => Some(media),
                Err(e) => {
                    log::warn!("Failed to set background image: {}", e);
                    None
                }
            }
        });
        let canvas = deck.canvas();

        let slide = deck.add_slide(LayoutKind::Title)?;
        if let Err(e) = set_title(slide, title, &self.style.font, self.style.title_size) {
            log::warn!("Failed to set title: {}", e);
        }

        if let Some(media) = media {
            let index = slide.add_picture(media, canvas, "Title background");
            if let Err(e) = slide.send_to_back(index) {
                log::warn!("Failed to move background image to the back: {}", e);
            }
        }

        Ok(())
    }

    fn add_content_slide(&self, deck: &mut Deck, record: &SlideRecord) -> Result<()> {
        let slide = deck.add_slide(LayoutKind::TitleAndBody)?;

        if let Err(e) = set_title(
            slide,
            &record.title,
            &self.style.font,
            self.style.slide_title_size,
        ) {
            log::warn!("Failed to set slide title '{}': {}", record.title, e);
        }

        if let Err(e) = self.fill_body(slide, record) {
            log::warn!("Failed to set body of '{}': {}", record.title, e);
        }

        Ok(())
    }

    fn fill_body(&self, slide: &mut Slide, record: &SlideRecord) -> Result<()> {
        let body = slide
            .placeholder_mut(1)
            .ok_or_else(|| Error::Render("Layout has no body placeholder".to_string()))?;
        body.clear();

        for line in record.lines() {
            let bullet = line.starts_with(BULLET);
            let paragraph = body.add_paragraph();
            paragraph.set_text(line);

            let font = paragraph.font_mut();
            if let Err(e) = font.set_name(&self.style.font) {
                log::warn!("Failed to set body font: {}", e);
            }
            let size = if bullet {
                self.style.bullet_size
            } else {
                self.style.body_size
            };
            if let Err(e) = font.set_size(size) {
                log::warn!("Failed to set body font size: {}", e);
            }
            if let Err(e) = paragraph.set_level(u8::from(bullet)) {
                log::warn!("Failed to set paragraph level: {}", e);
            }
        }

        Ok(())
    }

    /// Write the deck and verify the result on disk.
    fn save(&self, deck: &Deck, output_dir: &Path) -> Result<PathBuf> {
        let path = output_dir.join(DECK_FILE);
        self.sink.write(deck, &path)?;

        let size = std::fs::metadata(&path)
            .map(|m| m.len())
            .map_err(|e| Error::Save(format!("{} was not created: {}", path.display(), e)))?;
        if size == 0 {
            return Err(Error::Save(format!("{} is empty", path.display())));
        }

        let summary = DeckReader::new()
            .open(&path)
            .map_err(|e| Error::Save(format!("{} is unreadable: {}", path.display(), e)))?;
        if summary.slides.len() != deck.slide_count() {
            return Err(Error::Save(format!(
                "{} holds {} slides, expected {}",
                path.display(),
                summary.slides.len(),
                deck.slide_count()
            )));
        }

        log::info!(
            "Saved {} ({} slides, {} bytes)",
            path.display(),
            summary.slides.len(),
            size
        );
        Ok(path)
    }
}

/// Replace the slide title with one styled paragraph.
fn set_title(slide: &mut Slide, text: &str, font: &str, size: f64) -> Result<()> {
    let frame = slide
        .title_mut()
        .ok_or_else(|| Error::Render("Layout has no title placeholder".to_string()))?;
    frame.clear();

    let paragraph = frame.add_paragraph();
    paragraph.set_text(text);
    paragraph.font_mut().set_name(font)?;
    paragraph.font_mut().set_size(size)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::tests::PNG_BYTES;
    use crate::reader::{DeckSummary, ShapeKind};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves a fixed PNG for every request.
    struct StaticImages {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageGenerator for StaticImages {
        async fn generate_image(&self, prompt: &str) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(prompt.contains("Hello"));
            Ok(Some("https://images.test/cover.png".to_string()))
        }

        async fn download(&self, url: &str) -> Result<Vec<u8>> {
            assert_eq!(url, "https://images.test/cover.png");
            Ok(PNG_BYTES.to_vec())
        }
    }

    /// Simulates a network failure.
    struct FailingImages;

    #[async_trait]
    impl ImageGenerator for FailingImages {
        async fn generate_image(&self, _prompt: &str) -> Result<Option<String>> {
            Err(Error::Collaborator("connection reset".to_string()))
        }

        async fn download(&self, _url: &str) -> Result<Vec<u8>> {
            unreachable!("download must not run after a failed generation")
        }
    }

    /// Returns a URL whose download fails with a non-200 status.
    struct NotFoundImages;

    #[async_trait]
    impl ImageGenerator for NotFoundImages {
        async fn generate_image(&self, _prompt: &str) -> Result<Option<String>> {
            Ok(Some("https://images.test/gone.png".to_string()))
        }

        async fn download(&self, _url: &str) -> Result<Vec<u8>> {
            Err(Error::Collaborator("Image download failed: 404 Not Found".to_string()))
        }
    }

    /// Creates the target file but writes nothing.
    struct ZeroByteSink;

    impl PackageSink for ZeroByteSink {
        fn write(&self, _deck: &Deck, path: &Path) -> Result<()> {
            std::fs::File::create(path)?;
            Ok(())
        }
    }

    /// Never creates the target file.
    struct VanishingSink;

    impl PackageSink for VanishingSink {
        fn write(&self, _deck: &Deck, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    fn builder(images: Arc<dyn ImageGenerator>) -> DeckBuilder {
        DeckBuilder::new(images, &Config::new("sk-test")).with_parser(ContentParser::new())
    }

    fn records() -> Vec<SlideRecord> {
        vec![
            SlideRecord::new("Introduction", "World"),
            SlideRecord::new("Topic", "• point one\n• point two"),
            SlideRecord::new("Summary", "Plain line\n\n• last point"),
        ]
    }

    fn read(path: &Path) -> DeckSummary {
        DeckReader::new().open(path).unwrap()
    }

    #[tokio::test]
    async fn test_builds_title_plus_one_slide_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let images = Arc::new(StaticImages {
            calls: AtomicUsize::new(0),
        });

        let path = builder(images.clone())
            .build("Hello", &records(), dir.path())
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("presentation.pptx"));
        assert_eq!(images.calls.load(Ordering::SeqCst), 1);

        let summary = read(&path);
        assert_eq!(summary.slides.len(), 4);
        assert_eq!(summary.slides[0].texts(), vec!["Hello"]);
        assert_eq!(summary.slides[1].texts(), vec!["Introduction", "World"]);
        assert_eq!(
            summary.slides[2].texts(),
            vec!["Topic", "• point one", "• point two"]
        );
        assert_eq!(
            summary.slides[3].texts(),
            vec!["Summary", "Plain line", "• last point"]
        );
    }

    #[tokio::test]
    async fn test_title_image_is_stretched_behind_title() {
        let dir = tempfile::tempdir().unwrap();
        let images = Arc::new(StaticImages {
            calls: AtomicUsize::new(0),
        });

        let path = builder(images)
            .build("Hello", &records(), dir.path())
            .await
            .unwrap();

        assert!(dir.path().join("title_image.png").exists());
        let summary = read(&path);
        let title = &summary.slides[0];
        assert_eq!(title.shapes[0].kind, ShapeKind::Picture);
        assert!(summary.slides[1..].iter().all(|s| !s.has_picture()));
    }

    #[tokio::test]
    async fn test_bullet_lines_are_indented() {
        let dir = tempfile::tempdir().unwrap();
        let path = builder(Arc::new(FailingImages))
            .build("Hello", &records(), dir.path())
            .await
            .unwrap();

        let summary = read(&path);
        let body = &summary.slides[3].shapes[1];
        let levels: Vec<u8> = body.paragraphs.iter().map(|p| p.level).collect();
        assert_eq!(levels, vec![0, 1]);
    }

    #[tokio::test]
    async fn test_image_failure_still_saves_without_picture() {
        let dir = tempfile::tempdir().unwrap();
        let path = builder(Arc::new(FailingImages))
            .build("Hello", &records(), dir.path())
            .await
            .unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("title_image.png").exists());
        let summary = read(&path);
        assert_eq!(summary.slides.len(), 4);
        assert!(!summary.slides[0].has_picture());
    }

    #[tokio::test]
    async fn test_download_failure_degrades_and_clears_stale_image() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("title_image.png"), PNG_BYTES).unwrap();

        let path = builder(Arc::new(NotFoundImages))
            .build("Hello", &records(), dir.path())
            .await
            .unwrap();

        assert!(!dir.path().join("title_image.png").exists());
        assert!(!read(&path).slides[0].has_picture());
    }

    #[tokio::test]
    async fn test_zero_byte_save_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = builder(Arc::new(FailingImages))
            .with_sink(ZeroByteSink)
            .build("Hello", &records(), dir.path())
            .await;

        assert!(matches!(result, Err(Error::Save(_))));
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = builder(Arc::new(FailingImages))
            .with_sink(VanishingSink)
            .build("Hello", &records(), dir.path())
            .await;

        assert!(matches!(result, Err(Error::Save(_))));
    }

    #[tokio::test]
    async fn test_create_presentation_parses_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let markdown = "---\nmarp: true\n---\n# Hello\nWorld\n---\n## Topic\n* point one\n- point two\n---\n## End\n";

        let path = builder(Arc::new(FailingImages))
            .create_presentation(markdown, &dir.path().join("nested"))
            .await
            .unwrap();

        let summary = read(&path);
        assert_eq!(summary.slides.len(), 3);
        assert_eq!(summary.slides[0].texts(), vec!["Hello"]);
        assert_eq!(summary.slides[2].texts(), vec!["Topic", "• point one", "• point two"]);
    }

    #[tokio::test]
    async fn test_empty_record_list_yields_title_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = builder(Arc::new(FailingImages))
            .build("Lonely", &[], dir.path())
            .await
            .unwrap();

        assert_eq!(read(&path).slides.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_style_is_logged_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let style = DeckStyle {
            font: String::new(),
            bullet_size: 0.0,
            ..DeckStyle::default()
        };

        let path = builder(Arc::new(FailingImages))
            .with_style(style)
            .build("Hello", &records(), dir.path())
            .await
            .unwrap();

        let summary = read(&path);
        assert_eq!(summary.slides.len(), 4);
        // Title setting stops at the empty font name but the text is already in place.
        assert_eq!(summary.slides[0].texts(), vec!["Hello"]);
        assert_eq!(summary.slides[2].shapes[1].paragraphs.len(), 2);
    }

    #[test]
    fn test_title_image_prompt() {
        let prompt = title_image_prompt("量子コンピュータ", "Japanese");
        assert!(prompt.contains("量子コンピュータ"));
        assert!(prompt.contains("Japanese business culture"));
    }
}

//! PPTX package reader used to verify saved decks.

use deck_core::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// What a saved deck contains, slide by slide.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeckSummary {
    /// Canvas width in EMUs.
    pub width: i64,
    /// Canvas height in EMUs.
    pub height: i64,
    /// Slides in presentation order.
    pub slides: Vec<SlideSummary>,
}

/// Shapes of one slide in z-order, back to front.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideSummary {
    /// 1-based slide number.
    pub number: usize,
    pub shapes: Vec<ShapeSummary>,
}

impl SlideSummary {
    pub fn has_picture(&self) -> bool {
        self.shapes.iter().any(|s| s.kind == ShapeKind::Picture)
    }

    /// Texts of every non-empty paragraph across all shapes.
    pub fn texts(&self) -> Vec<&str> {
        self.shapes
            .iter()
            .flat_map(|s| s.paragraphs.iter().map(|p| p.text.as_str()))
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Text,
    Picture,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeSummary {
    pub kind: ShapeKind,
    pub paragraphs: Vec<ParagraphSummary>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParagraphSummary {
    pub level: u8,
    pub text: String,
}

/// Reader for PPTX (Office Open XML) packages.
pub struct DeckReader;

impl DeckReader {
    /// Create a new PPTX reader.
    pub fn new() -> Self {
        Self
    }

    /// Read the package at `path`.
    pub fn open(&self, path: &Path) -> Result<DeckSummary> {
        let file = File::open(path)?;
        self.read(BufReader::new(file))
    }

    /// Read a package from a seekable reader.
    pub fn read<R: Read + Seek>(&self, reader: R) -> Result<DeckSummary> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::Zip(format!("Failed to open ZIP: {}", e)))?;

        let targets = self.slide_targets(&mut archive)?;
        let presentation = self.read_file_from_archive(&mut archive, "ppt/presentation.xml")?;
        let (width, height, order) = parse_presentation(&presentation)?;

        let slide_paths: Vec<String> = if order.is_empty() {
            let mut fallback: Vec<(String, Option<usize>)> = targets
                .values()
                .map(|t| (t.clone(), extract_slide_number(t)))
                .collect();
            fallback.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
            fallback.into_iter().map(|(path, _)| path).collect()
        } else {
            order
                .iter()
                .map(|id| {
                    targets.get(id).cloned().ok_or_else(|| {
                        Error::Xml(format!("Slide relationship '{}' not found", id))
                    })
                })
                .collect::<Result<_>>()?
        };

        let mut summary = DeckSummary {
            width,
            height,
            slides: Vec::with_capacity(slide_paths.len()),
        };
        for (idx, path) in slide_paths.iter().enumerate() {
            let content = self.read_file_from_archive(&mut archive, path)?;
            summary.slides.push(SlideSummary {
                number: idx + 1,
                shapes: extract_shapes(&content)?,
            });
        }

        Ok(summary)
    }

    /// Map slide relationship ids to part paths from the presentation rels.
    fn slide_targets<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
    ) -> Result<HashMap<String, String>> {
        let rels_content =
            self.read_file_from_archive(archive, "ppt/_rels/presentation.xml.rels")?;
        let mut targets = HashMap::new();

        let mut reader = Reader::from_str(&rels_content);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let rel_type = attr(e, b"Type").unwrap_or_default();
                    let target = attr(e, b"Target").unwrap_or_default();
                    let id = attr(e, b"Id").unwrap_or_default();

                    if rel_type.ends_with("/slide") {
                        let full_path = match target.strip_prefix('/') {
                            Some(absolute) => absolute.to_string(),
                            None => format!("ppt/{}", target),
                        };
                        targets.insert(id, full_path);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!("Error parsing relationships: {}", e)));
                }
                _ => {}
            }
        }

        Ok(targets)
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::Zip(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::Zip(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for DeckReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Canvas size and slide relationship ids in `p:sldIdLst` order.
fn parse_presentation(xml: &str) -> Result<(i64, i64, Vec<String>)> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let (mut width, mut height) = (0, 0);
    let mut order = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                match local_name(e.name().as_ref()) {
                    b"sldSz" => {
                        width = attr(e, b"cx").and_then(|v| v.parse().ok()).unwrap_or(0);
                        height = attr(e, b"cy").and_then(|v| v.parse().ok()).unwrap_or(0);
                    }
                    b"sldId" => {
                        if let Some(id) = attr(e, b"r:id") {
                            order.push(id);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(format!("Error parsing presentation: {}", e))),
            _ => {}
        }
    }

    Ok((width, height, order))
}

/// Extract shapes with their paragraphs from slide XML, in tree order.
fn extract_shapes(xml_content: &str) -> Result<Vec<ShapeSummary>> {
    let mut shapes = Vec::new();
    let mut reader = Reader::from_str(xml_content);
    reader.trim_text(true);

    let mut current: Option<ShapeSummary> = None;
    let mut paragraph: Option<ParagraphSummary> = None;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => {
                    current = Some(ShapeSummary {
                        kind: ShapeKind::Text,
                        paragraphs: Vec::new(),
                    });
                }
                b"pic" => {
                    current = Some(ShapeSummary {
                        kind: ShapeKind::Picture,
                        paragraphs: Vec::new(),
                    });
                }
                b"p" if current.is_some() => {
                    paragraph = Some(ParagraphSummary::default());
                }
                b"pPr" => read_level(e, paragraph.as_mut()),
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                if local_name(e.name().as_ref()) == b"pPr" {
                    read_level(e, paragraph.as_mut());
                }
            }
            Ok(Event::Text(ref e)) => {
                if in_text {
                    if let Some(p) = paragraph.as_mut() {
                        let text = e.unescape().unwrap_or_default();
                        p.text.push_str(&text);
                    }
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" | b"pic" => {
                    if let Some(shape) = current.take() {
                        shapes.push(shape);
                    }
                }
                b"p" => {
                    if let (Some(p), Some(shape)) = (paragraph.take(), current.as_mut()) {
                        shape.paragraphs.push(p);
                    }
                }
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(format!("Error parsing slide: {}", e))),
            _ => {}
        }
    }

    Ok(shapes)
}

fn read_level(e: &BytesStart, paragraph: Option<&mut ParagraphSummary>) {
    if let Some(p) = paragraph {
        if let Some(level) = attr(e, b"lvl").and_then(|v| v.parse().ok()) {
            p.level = level;
        }
    }
}

/// Look up an attribute value by its qualified name.
fn attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

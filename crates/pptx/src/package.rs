//! PresentationML package writer.
//!
//! Serializes a [`Deck`] into the ZIP parts of a `.pptx` file.

use crate::deck::{Deck, ImageFormat, Layout, LayoutKind, Slide};
use crate::shape::{Paragraph, Placeholder, Rect, Shape, TextContainer, MAX_LEVEL};
use crate::template::{self, content_type, rel, NS_A, NS_CONTENT_TYPES, NS_P, NS_R, NS_RELS};
use deck_core::{Error, Result};
use quick_xml::escape::escape;
use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Relationship ids fixed in `presentation.xml.rels` before the slides.
const PRESENTATION_FIXED_RELS: usize = 5;

fn xml_err(e: std::fmt::Error) -> Error {
    Error::Xml(e.to_string())
}

fn zip_err(e: zip::result::ZipError) -> Error {
    Error::Zip(e.to_string())
}

/// Destination for a finished deck.
pub trait PackageSink: Send + Sync {
    /// Write `deck` to `path`.
    fn write(&self, deck: &Deck, path: &Path) -> Result<()>;
}

/// Writes decks as `.pptx` ZIP packages on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipPackageSink;

impl PackageSink for ZipPackageSink {
    fn write(&self, deck: &Deck, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        write_package(deck, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Serialize `deck` as a `.pptx` package into `writer`.
pub fn write_package<W: Write + Seek>(deck: &Deck, writer: W) -> Result<()> {
    let mut zip = ZipWriter::new(writer);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let put = |zip: &mut ZipWriter<W>, name: &str, data: &[u8]| -> Result<()> {
        zip.start_file(name, options).map_err(zip_err)?;
        zip.write_all(data)?;
        Ok(())
    };

    put(&mut zip, "[Content_Types].xml", content_types_xml(deck)?.as_bytes())?;
    put(&mut zip, "_rels/.rels", package_rels_xml().as_bytes())?;
    put(&mut zip, "docProps/core.xml", core_props_xml(deck).as_bytes())?;
    put(&mut zip, "docProps/app.xml", app_props_xml(deck).as_bytes())?;
    put(&mut zip, "ppt/presentation.xml", presentation_xml(deck)?.as_bytes())?;
    put(
        &mut zip,
        "ppt/_rels/presentation.xml.rels",
        presentation_rels_xml(deck)?.as_bytes(),
    )?;
    put(
        &mut zip,
        "ppt/slideMasters/slideMaster1.xml",
        template::slide_master_xml(deck.width(), deck.height()).as_bytes(),
    )?;
    put(
        &mut zip,
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        template::slide_master_rels_xml().as_bytes(),
    )?;

    for (i, layout) in deck.layouts.iter().enumerate() {
        let n = i + 1;
        put(
            &mut zip,
            &format!("ppt/slideLayouts/slideLayout{}.xml", n),
            layout_xml(layout)?.as_bytes(),
        )?;
        put(
            &mut zip,
            &format!("ppt/slideLayouts/_rels/slideLayout{}.xml.rels", n),
            layout_rels_xml().as_bytes(),
        )?;
    }

    put(&mut zip, "ppt/theme/theme1.xml", template::theme_xml().as_bytes())?;
    put(&mut zip, "ppt/presProps.xml", template::pres_props_xml().as_bytes())?;
    put(&mut zip, "ppt/viewProps.xml", template::view_props_xml().as_bytes())?;
    put(&mut zip, "ppt/tableStyles.xml", template::table_styles_xml().as_bytes())?;

    for (i, slide) in deck.slides.iter().enumerate() {
        let n = i + 1;
        let image_rels = slide_image_rels(slide);
        put(
            &mut zip,
            &format!("ppt/slides/slide{}.xml", n),
            slide_xml(slide, &image_rels)?.as_bytes(),
        )?;
        put(
            &mut zip,
            &format!("ppt/slides/_rels/slide{}.xml.rels", n),
            slide_rels_xml(deck, slide, &image_rels)?.as_bytes(),
        )?;
    }

    for (i, media) in deck.media.iter().enumerate() {
        put(
            &mut zip,
            &media_part_name(i, media.format),
            &media.data,
        )?;
    }

    zip.finish().map_err(zip_err)?;
    Ok(())
}

fn media_part_name(index: usize, format: ImageFormat) -> String {
    format!("ppt/media/image{}.{}", index + 1, format.extension())
}

fn layout_index(kind: LayoutKind) -> usize {
    match kind {
        LayoutKind::Title => 1,
        LayoutKind::TitleAndBody => 2,
    }
}

/// Map each media index used on `slide` to its relationship id (rId2, rId3...).
fn slide_image_rels(slide: &Slide) -> BTreeMap<usize, String> {
    let mut rels = BTreeMap::new();
    for shape in &slide.shapes {
        if let Shape::Picture(picture) = shape {
            let next = rels.len() + 2;
            rels.entry(picture.media)
                .or_insert_with(|| format!("rId{}", next));
        }
    }
    rels
}

fn content_types_xml(deck: &Deck) -> Result<String> {
    let mut xml = String::with_capacity(2048);
    xml.push_str(template::XML_DECLARATION);
    write!(xml, r#"<Types xmlns="{}">"#, NS_CONTENT_TYPES).map_err(xml_err)?;
    write!(
        xml,
        r#"<Default Extension="rels" ContentType="{}"/><Default Extension="xml" ContentType="{}"/>"#,
        content_type::RELATIONSHIPS,
        content_type::XML
    )
    .map_err(xml_err)?;
    for format in [ImageFormat::Png, ImageFormat::Jpeg] {
        write!(
            xml,
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            format.extension(),
            format.content_type()
        )
        .map_err(xml_err)?;
    }

    let mut overrides = vec![
        ("/ppt/presentation.xml".to_string(), content_type::PRESENTATION),
        ("/ppt/slideMasters/slideMaster1.xml".to_string(), content_type::SLIDE_MASTER),
        ("/ppt/theme/theme1.xml".to_string(), content_type::THEME),
        ("/ppt/presProps.xml".to_string(), content_type::PRES_PROPS),
        ("/ppt/viewProps.xml".to_string(), content_type::VIEW_PROPS),
        ("/ppt/tableStyles.xml".to_string(), content_type::TABLE_STYLES),
        ("/docProps/core.xml".to_string(), content_type::CORE_PROPERTIES),
        ("/docProps/app.xml".to_string(), content_type::EXTENDED_PROPERTIES),
    ];
    for n in 1..=deck.layouts.len() {
        overrides.push((
            format!("/ppt/slideLayouts/slideLayout{}.xml", n),
            content_type::SLIDE_LAYOUT,
        ));
    }
    for n in 1..=deck.slides.len() {
        overrides.push((format!("/ppt/slides/slide{}.xml", n), content_type::SLIDE));
    }

    for (part, ct) in overrides {
        write!(xml, r#"<Override PartName="{}" ContentType="{}"/>"#, part, ct)
            .map_err(xml_err)?;
    }
    xml.push_str("</Types>");
    Ok(xml)
}

fn package_rels_xml() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<Relationships xmlns="{ns}">"#,
            r#"<Relationship Id="rId1" Type="{doc}" Target="ppt/presentation.xml"/>"#,
            r#"<Relationship Id="rId2" Type="{core}" Target="docProps/core.xml"/>"#,
            r#"<Relationship Id="rId3" Type="{app}" Target="docProps/app.xml"/>"#,
            "</Relationships>"
        ),
        decl = template::XML_DECLARATION,
        ns = NS_RELS,
        doc = rel::OFFICE_DOCUMENT,
        core = rel::CORE_PROPERTIES,
        app = rel::EXTENDED_PROPERTIES,
    )
}

fn core_props_xml(deck: &Deck) -> String {
    format!(
        concat!(
            "{decl}",
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "<dc:title>{title}</dc:title>",
            "<dc:creator>research-deck</dc:creator>",
            "</cp:coreProperties>"
        ),
        decl = template::XML_DECLARATION,
        title = escape(deck.title()),
    )
}

fn app_props_xml(deck: &Deck) -> String {
    format!(
        concat!(
            "{decl}",
            r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">"#,
            "<Application>research-deck</Application>",
            "<Slides>{slides}</Slides>",
            "</Properties>"
        ),
        decl = template::XML_DECLARATION,
        slides = deck.slide_count(),
    )
}

fn slide_rel_id(index: usize) -> String {
    format!("rId{}", PRESENTATION_FIXED_RELS + 1 + index)
}

fn presentation_xml(deck: &Deck) -> Result<String> {
    let mut xml = String::with_capacity(1024);
    xml.push_str(template::XML_DECLARATION);
    write!(
        xml,
        r#"<p:presentation xmlns:a="{}" xmlns:r="{}" xmlns:p="{}" saveSubsetFonts="1">"#,
        NS_A, NS_R, NS_P
    )
    .map_err(xml_err)?;
    xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);

    if !deck.slides.is_empty() {
        xml.push_str("<p:sldIdLst>");
        for (index, slide) in deck.slides.iter().enumerate() {
            write!(
                xml,
                r#"<p:sldId id="{}" r:id="{}"/>"#,
                slide.slide_id(),
                slide_rel_id(index)
            )
            .map_err(xml_err)?;
        }
        xml.push_str("</p:sldIdLst>");
    }

    write!(
        xml,
        r#"<p:sldSz cx="{}" cy="{}"/>"#,
        deck.width(),
        deck.height()
    )
    .map_err(xml_err)?;
    xml.push_str(r#"<p:notesSz cx="6858000" cy="9144000"/>"#);
    xml.push_str("</p:presentation>");
    Ok(xml)
}

fn presentation_rels_xml(deck: &Deck) -> Result<String> {
    let mut xml = String::with_capacity(1024);
    xml.push_str(template::XML_DECLARATION);
    write!(xml, r#"<Relationships xmlns="{}">"#, NS_RELS).map_err(xml_err)?;

    let fixed = [
        (rel::SLIDE_MASTER, "slideMasters/slideMaster1.xml"),
        (rel::PRES_PROPS, "presProps.xml"),
        (rel::VIEW_PROPS, "viewProps.xml"),
        (rel::THEME, "theme/theme1.xml"),
        (rel::TABLE_STYLES, "tableStyles.xml"),
    ];
    for (i, (rel_type, target)) in fixed.iter().enumerate() {
        write!(
            xml,
            r#"<Relationship Id="rId{}" Type="{}" Target="{}"/>"#,
            i + 1,
            rel_type,
            target
        )
        .map_err(xml_err)?;
    }

    for index in 0..deck.slides.len() {
        write!(
            xml,
            r#"<Relationship Id="{}" Type="{}" Target="slides/slide{}.xml"/>"#,
            slide_rel_id(index),
            rel::SLIDE,
            index + 1
        )
        .map_err(xml_err)?;
    }

    xml.push_str("</Relationships>");
    Ok(xml)
}

fn layout_rels_xml() -> String {
    format!(
        r#"{}<Relationships xmlns="{}"><Relationship Id="rId1" Type="{}" Target="../slideMasters/slideMaster1.xml"/></Relationships>"#,
        template::XML_DECLARATION,
        NS_RELS,
        rel::SLIDE_MASTER
    )
}

fn write_group_header(xml: &mut String) {
    xml.push_str(r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#);
    xml.push_str(r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#);
    xml.push_str(r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#);
}

fn write_xfrm(xml: &mut String, rect: &Rect) -> Result<()> {
    write!(
        xml,
        r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
        rect.x, rect.y, rect.cx, rect.cy
    )
    .map_err(xml_err)
}

fn layout_xml(layout: &Layout) -> Result<String> {
    let mut xml = String::with_capacity(4096);
    xml.push_str(template::XML_DECLARATION);
    write!(
        xml,
        r#"<p:sldLayout xmlns:a="{}" xmlns:r="{}" xmlns:p="{}" type="{}" preserve="1">"#,
        NS_A,
        NS_R,
        NS_P,
        layout.kind.layout_type()
    )
    .map_err(xml_err)?;
    write!(xml, r#"<p:cSld name="{}"><p:spTree>"#, layout.kind.name()).map_err(xml_err)?;
    write_group_header(&mut xml);

    for placeholder in &layout.placeholders {
        write_placeholder(&mut xml, placeholder)?;
    }

    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
    xml.push_str("</p:sldLayout>");
    Ok(xml)
}

fn slide_xml(slide: &Slide, image_rels: &BTreeMap<usize, String>) -> Result<String> {
    let mut xml = String::with_capacity(4096);
    xml.push_str(template::XML_DECLARATION);
    write!(
        xml,
        r#"<p:sld xmlns:a="{}" xmlns:r="{}" xmlns:p="{}">"#,
        NS_A, NS_R, NS_P
    )
    .map_err(xml_err)?;
    xml.push_str("<p:cSld><p:spTree>");
    write_group_header(&mut xml);

    for shape in &slide.shapes {
        match shape {
            Shape::Placeholder(placeholder) => write_placeholder(&mut xml, placeholder)?,
            Shape::Picture(picture) => {
                let rel_id = image_rels.get(&picture.media).ok_or_else(|| {
                    Error::Xml(format!("No relationship for media {}", picture.media))
                })?;
                xml.push_str("<p:pic><p:nvPicPr>");
                write!(
                    xml,
                    r#"<p:cNvPr id="{}" name="Picture {}" descr="{}"/>"#,
                    picture.id,
                    picture.id,
                    escape(&picture.description)
                )
                .map_err(xml_err)?;
                xml.push_str(r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#);
                write!(
                    xml,
                    r#"<p:blipFill><a:blip r:embed="{}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#,
                    rel_id
                )
                .map_err(xml_err)?;
                xml.push_str("<p:spPr>");
                write_xfrm(&mut xml, &picture.rect)?;
                xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>"#);
                xml.push_str("</p:pic>");
            }
        }
    }

    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
    xml.push_str("</p:sld>");
    Ok(xml)
}

fn slide_rels_xml(
    deck: &Deck,
    slide: &Slide,
    image_rels: &BTreeMap<usize, String>,
) -> Result<String> {
    let mut xml = String::with_capacity(512);
    xml.push_str(template::XML_DECLARATION);
    write!(xml, r#"<Relationships xmlns="{}">"#, NS_RELS).map_err(xml_err)?;
    write!(
        xml,
        r#"<Relationship Id="rId1" Type="{}" Target="../slideLayouts/slideLayout{}.xml"/>"#,
        rel::SLIDE_LAYOUT,
        layout_index(slide.layout)
    )
    .map_err(xml_err)?;

    for (media_index, rel_id) in image_rels {
        let media = deck
            .media
            .get(*media_index)
            .ok_or_else(|| Error::Xml(format!("Missing media {}", media_index)))?;
        write!(
            xml,
            r#"<Relationship Id="{}" Type="{}" Target="../media/image{}.{}"/>"#,
            rel_id,
            rel::IMAGE,
            media_index + 1,
            media.format.extension()
        )
        .map_err(xml_err)?;
    }

    xml.push_str("</Relationships>");
    Ok(xml)
}

/// Write a placeholder shape; geometry and list style only when set.
fn write_placeholder(xml: &mut String, placeholder: &Placeholder) -> Result<()> {
    xml.push_str("<p:sp><p:nvSpPr>");
    write!(
        xml,
        r#"<p:cNvPr id="{}" name="{} {}"/>"#,
        placeholder.id,
        placeholder.kind.display_name(),
        placeholder.id - 1
    )
    .map_err(xml_err)?;
    xml.push_str(r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph"#);
    if let Some(ph_type) = placeholder.kind.ph_type() {
        write!(xml, r#" type="{}""#, ph_type).map_err(xml_err)?;
    }
    if let Some(idx) = placeholder.idx {
        write!(xml, r#" idx="{}""#, idx).map_err(xml_err)?;
    }
    xml.push_str("/></p:nvPr></p:nvSpPr>");

    match &placeholder.rect {
        Some(rect) => {
            xml.push_str("<p:spPr>");
            write_xfrm(xml, rect)?;
            xml.push_str("</p:spPr>");
        }
        None => xml.push_str("<p:spPr/>"),
    }

    xml.push_str("<p:txBody><a:bodyPr/>");
    match &placeholder.fallback_font {
        Some(font) => write_fallback_list_style(xml, font)?,
        None => xml.push_str("<a:lstStyle/>"),
    }

    let paragraphs = placeholder.frame.paragraphs();
    if paragraphs.is_empty() {
        xml.push_str("<a:p/>");
    }
    for paragraph in paragraphs {
        write_paragraph(xml, paragraph)?;
    }

    xml.push_str("</p:txBody></p:sp>");
    Ok(())
}

/// List style assigning `font` as the default typeface at every level.
fn write_fallback_list_style(xml: &mut String, font: &str) -> Result<()> {
    let font = escape(font);
    xml.push_str("<a:lstStyle>");
    for level in 1..=(MAX_LEVEL + 1) {
        write!(
            xml,
            r#"<a:lvl{lvl}pPr><a:defRPr><a:latin typeface="{font}"/><a:ea typeface="{font}"/></a:defRPr></a:lvl{lvl}pPr>"#,
            lvl = level,
            font = font
        )
        .map_err(xml_err)?;
    }
    xml.push_str("</a:lstStyle>");
    Ok(())
}

fn write_paragraph(xml: &mut String, paragraph: &Paragraph) -> Result<()> {
    xml.push_str("<a:p>");
    if paragraph.level() > 0 {
        write!(xml, r#"<a:pPr lvl="{}"/>"#, paragraph.level()).map_err(xml_err)?;
    }

    if !paragraph.text().is_empty() {
        xml.push_str(r#"<a:r><a:rPr lang="ja-JP" altLang="en-US""#);
        let font = paragraph.font();
        if let Some(sz) = font.size_hundredths() {
            write!(xml, r#" sz="{}""#, sz).map_err(xml_err)?;
        }
        xml.push_str(r#" dirty="0">"#);
        if let Some(name) = font.name() {
            let name = escape(name);
            write!(
                xml,
                r#"<a:latin typeface="{}"/><a:ea typeface="{}"/>"#,
                name, name
            )
            .map_err(xml_err)?;
        }
        xml.push_str("</a:rPr>");
        write!(xml, "<a:t>{}</a:t></a:r>", escape(paragraph.text())).map_err(xml_err)?;
    }

    xml.push_str("</a:p>");
    Ok(())
}

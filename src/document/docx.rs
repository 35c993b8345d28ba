//! OOXML (WordprocessingML) packaging for laid-out documents.
//!
//! Static parts are fixed strings. `word/document.xml` and
//! `docProps/core.xml` carry user text and go through the quick-xml writer so
//! everything is escaped. Zip entries use a fixed timestamp; only the
//! creation date in `core.xml` varies between runs.

use std::io::{Cursor, Write};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use super::{Align, Block, Document};
use crate::error::{DiplomError, Result};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/><Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" Target="numbering.xml"/></Relationships>"#;

const APP_PROPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>diplom-ai</Application></Properties>"#;

// Times New Roman 14pt body, the usual requirement for Russian theses.
const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Times New Roman" w:hAnsi="Times New Roman" w:cs="Times New Roman" w:eastAsia="Times New Roman"/><w:sz w:val="28"/><w:szCs w:val="28"/><w:lang w:val="ru-RU"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="0" w:line="360" w:lineRule="auto"/></w:pPr></w:pPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:jc w:val="center"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/><w:szCs w:val="32"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="200" w:after="80"/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="ListBullet"><w:name w:val="List Bullet"/><w:basedOn w:val="Normal"/><w:pPr><w:numPr><w:numId w:val="1"/></w:numPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:style></w:styles>"#;

const NUMBERING: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:abstractNum w:abstractNumId="0"><w:multiLevelType w:val="singleLevel"/><w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="bullet"/><w:lvlText w:val="•"/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl></w:abstractNum><w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num></w:numbering>"#;

/// Render a document into a complete `.docx` byte buffer.
pub fn package(document: &Document) -> Result<Vec<u8>> {
    let body = document_xml(document)?;
    let core = core_xml(document, chrono::Utc::now())?;

    let parts: [(&str, &[u8]); 8] = [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", PACKAGE_RELS.as_bytes()),
        ("docProps/core.xml", &core),
        ("docProps/app.xml", APP_PROPS.as_bytes()),
        ("word/document.xml", &body),
        ("word/styles.xml", STYLES.as_bytes()),
        ("word/numbering.xml", NUMBERING.as_bytes()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS.as_bytes()),
    ];

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in parts {
        zip.start_file(name, entry_options())?;
        zip.write_all(bytes)?;
    }
    Ok(zip.finish()?.into_inner())
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
}

/// `word/document.xml` for the given blocks.
pub fn document_xml(document: &Document) -> Result<Vec<u8>> {
    let mut w = Writer::new(Vec::new());
    emit(&mut w, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    emit(
        &mut w,
        Event::Start(BytesStart::new("w:document").with_attributes([("xmlns:w", W_NS), ("xmlns:r", R_NS)])),
    )?;
    open(&mut w, "w:body")?;

    for block in &document.blocks {
        write_block(&mut w, block)?;
    }

    // A4 portrait; 30mm left, 15mm right, 20mm top and bottom margins
    open(&mut w, "w:sectPr")?;
    empty(&mut w, "w:pgSz", &[("w:w", "11906"), ("w:h", "16838")])?;
    empty(
        &mut w,
        "w:pgMar",
        &[
            ("w:top", "1134"),
            ("w:right", "850"),
            ("w:bottom", "1134"),
            ("w:left", "1701"),
            ("w:header", "708"),
            ("w:footer", "708"),
            ("w:gutter", "0"),
        ],
    )?;
    close(&mut w, "w:sectPr")?;

    close(&mut w, "w:body")?;
    close(&mut w, "w:document")?;
    Ok(w.into_inner())
}

fn write_block(w: &mut Writer<Vec<u8>>, block: &Block) -> Result<()> {
    open(w, "w:p")?;
    match block {
        Block::Paragraph { text, align, bold } => {
            if let Some(align) = align {
                let val = match align {
                    Align::Left => "left",
                    Align::Center => "center",
                };
                open(w, "w:pPr")?;
                empty(w, "w:jc", &[("w:val", val)])?;
                close(w, "w:pPr")?;
            }
            if !text.is_empty() {
                write_run(w, text, *bold)?;
            }
        }
        Block::Heading { level, text } => {
            let style = format!("Heading{}", level);
            open(w, "w:pPr")?;
            empty(w, "w:pStyle", &[("w:val", style.as_str())])?;
            close(w, "w:pPr")?;
            write_run(w, text, false)?;
        }
        Block::Bullet { text } => {
            open(w, "w:pPr")?;
            empty(w, "w:pStyle", &[("w:val", "ListBullet")])?;
            open(w, "w:numPr")?;
            empty(w, "w:ilvl", &[("w:val", "0")])?;
            empty(w, "w:numId", &[("w:val", "1")])?;
            close(w, "w:numPr")?;
            close(w, "w:pPr")?;
            write_run(w, text, false)?;
        }
        Block::PageBreak => {
            open(w, "w:r")?;
            empty(w, "w:br", &[("w:type", "page")])?;
            close(w, "w:r")?;
        }
    }
    close(w, "w:p")
}

fn write_run(w: &mut Writer<Vec<u8>>, text: &str, bold: bool) -> Result<()> {
    ensure_xml_text(text)?;
    open(w, "w:r")?;
    if bold {
        open(w, "w:rPr")?;
        empty(w, "w:b", &[])?;
        close(w, "w:rPr")?;
    }
    emit(
        w,
        Event::Start(BytesStart::new("w:t").with_attributes([("xml:space", "preserve")])),
    )?;
    emit(w, Event::Text(BytesText::new(text)))?;
    close(w, "w:t")?;
    close(w, "w:r")
}

/// `docProps/core.xml` with title, author and creation time.
pub fn core_xml(document: &Document, created: chrono::DateTime<chrono::Utc>) -> Result<Vec<u8>> {
    let mut w = Writer::new(Vec::new());
    emit(&mut w, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    emit(
        &mut w,
        Event::Start(BytesStart::new("cp:coreProperties").with_attributes([
            (
                "xmlns:cp",
                "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
            ),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("xmlns:dcterms", "http://purl.org/dc/terms/"),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
        ])),
    )?;
    text_element(&mut w, "dc:title", &[], &document.title)?;
    text_element(&mut w, "dc:creator", &[], &document.author)?;
    let stamp = created.format("%Y-%m-%dT%H:%M:%SZ").to_string();
    text_element(&mut w, "dcterms:created", &[("xsi:type", "dcterms:W3CDTF")], &stamp)?;
    close(&mut w, "cp:coreProperties")?;
    Ok(w.into_inner())
}

fn text_element(
    w: &mut Writer<Vec<u8>>,
    name: &str,
    attrs: &[(&str, &str)],
    text: &str,
) -> Result<()> {
    ensure_xml_text(text)?;
    emit(
        w,
        Event::Start(BytesStart::new(name).with_attributes(attrs.iter().copied())),
    )?;
    emit(w, Event::Text(BytesText::new(text)))?;
    close(w, name)
}

/// Whether XML 1.0 allows `c` in character data.
///
/// Escaping cannot help with C0 controls other than tab, LF and CR, or with
/// U+FFFE/U+FFFF; Word refuses packages that contain them.
pub fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

fn ensure_xml_text(text: &str) -> Result<()> {
    match text.chars().find(|c| !is_xml_char(*c)) {
        Some(c) => Err(DiplomError::Assembly {
            message: format!("text contains U+{:04X}, which XML does not allow", c as u32),
        }),
        None => Ok(()),
    }
}

fn open(w: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    emit(w, Event::Start(BytesStart::new(name)))
}

fn close(w: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    emit(w, Event::End(BytesEnd::new(name)))
}

fn empty(w: &mut Writer<Vec<u8>>, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    emit(
        w,
        Event::Empty(BytesStart::new(name).with_attributes(attrs.iter().copied())),
    )
}

fn emit(w: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    w.write_event(event).map_err(|e| DiplomError::Assembly {
        message: format!("xml write failed: {}", e),
    })
}

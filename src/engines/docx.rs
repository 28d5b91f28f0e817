//! Plain-text access to WordprocessingML documents.

use quick_xml::{Reader, escape::escape, events::Event};

use super::package::{PackageWriter, read_part};
use crate::error::EngineError;

const DOCUMENT_PART: &str = "word/document.xml";

const CONTENT_TYPES: &str = r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Extracts the text of a `.docx` file, one line per paragraph.
///
/// Tabs inside runs become `\t`, line and carriage breaks become `\n`.
pub(crate) fn extract_text(bytes: &[u8]) -> Result<String, EngineError> {
    let xml = read_part(bytes, DOCUMENT_PART)?;
    let mut reader = Reader::from_str(&xml);

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_paragraph = false;
    let mut run_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => {
                    in_paragraph = true;
                    current.clear();
                }
                b"r" => run_depth += 1,
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"p" => paragraphs.push(String::new()),
                b"tab" if run_depth > 0 => current.push('\t'),
                b"br" | b"cr" if run_depth > 0 => current.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text => current.push_str(&t.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"p" if in_paragraph => {
                    in_paragraph = false;
                    paragraphs.push(std::mem::take(&mut current));
                }
                b"r" => run_depth = run_depth.saturating_sub(1),
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

/// Writes `text` as a minimal `.docx`, one paragraph per line.
pub(crate) fn from_text(text: &str) -> Result<Vec<u8>, EngineError> {
    let mut body = String::new();
    for line in text.lines() {
        body.push_str("<w:p>");
        if !line.is_empty() {
            body.push_str("<w:r>");
            for (i, segment) in line.split('\t').enumerate() {
                if i > 0 {
                    body.push_str("<w:tab/>");
                }
                if !segment.is_empty() {
                    body.push_str(r#"<w:t xml:space="preserve">"#);
                    body.push_str(&escape(segment));
                    body.push_str("</w:t>");
                }
            }
            body.push_str("</w:r>");
        }
        body.push_str("</w:p>");
    }

    let document = format!(
        r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}<w:sectPr/></w:body></w:document>"#
    );

    let mut package = PackageWriter::new();
    package.add_xml("[Content_Types].xml", CONTENT_TYPES)?;
    package.add_xml("_rels/.rels", ROOT_RELS)?;
    package.add_xml(DOCUMENT_PART, &document)?;
    package.finish()
}

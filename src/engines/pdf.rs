//! PDF text extraction and plain-text PDF generation.

use lopdf::{
    Document, Object, Stream,
    content::{Content, Operation},
    dictionary,
};

use crate::error::EngineError;

const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN: i64 = 72;
const FONT_SIZE: i64 = 11;
const LEADING: i64 = 14;
const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize;
/// Helvetica at 11pt averages a little under 5.5pt per glyph across 468pt.
const WRAP_COLUMNS: usize = 85;

/// Extracts text page by page, in page order.
///
/// Each page's text is followed by exactly one newline. Lines holding only
/// whitespace come back empty.
pub(crate) fn extract_text(bytes: &[u8]) -> Result<String, EngineError> {
    let document = Document::load_mem(bytes)?;
    if document.is_encrypted() {
        return Err(EngineError::invalid_input("encrypted PDFs are not supported"));
    }

    let mut text = String::new();
    for page_number in document.get_pages().keys() {
        let page_text = document.extract_text(&[*page_number])?;
        let lines: Vec<&str> = page_text
            .trim_end_matches(['\r', '\n'])
            .lines()
            .map(|line| if line.trim().is_empty() { "" } else { line })
            .collect();
        text.push_str(&lines.join("\n"));
        text.push('\n');
    }
    Ok(text)
}

/// Typesets `text` onto Letter pages in Helvetica.
pub(crate) fn from_text(text: &str) -> Result<Vec<u8>, EngineError> {
    let lines: Vec<String> = text.lines().flat_map(wrap_line).collect();

    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();
    let font_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = document.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids = Vec::new();
    let chunks: Vec<&[String]> = if lines.is_empty() {
        vec![&[]]
    } else {
        lines.chunks(LINES_PER_PAGE).collect()
    };
    for chunk in chunks {
        let content = Content {
            operations: page_operations(chunk),
        };
        let content_id = document.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH),
                Object::Integer(PAGE_HEIGHT),
            ],
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);
    document.compress();

    let mut buffer = Vec::new();
    document.save_to(&mut buffer)?;
    Ok(buffer)
}

/// One text object per line so extraction yields one line per object.
///
/// Blank lines are drawn as a single space; an empty text object would be
/// merged into the previous line on extraction.
fn page_operations(lines: &[String]) -> Vec<Operation> {
    let mut operations = Vec::with_capacity(lines.len() * 4);
    for (row, line) in lines.iter().enumerate() {
        let y = PAGE_HEIGHT - MARGIN - LEADING * row as i64;
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec!["F1".into(), Object::Integer(FONT_SIZE)],
        ));
        operations.push(Operation::new(
            "Td",
            vec![Object::Integer(MARGIN), Object::Integer(y)],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(if line.is_empty() {
                vec![b' ']
            } else {
                win_ansi_bytes(line)
            })],
        ));
        operations.push(Operation::new("ET", vec![]));
    }
    operations
}

/// Latin-1 subset of WinAnsi; anything else becomes `?`.
fn win_ansi_bytes(line: &str) -> Vec<u8> {
    line.chars()
        .map(|c| match c {
            '\t' => b' ',
            c if (c as u32) < 0x100 => c as u8,
            _ => b'?',
        })
        .collect()
}

/// Greedy word wrap at [`WRAP_COLUMNS`], hard-splitting words that are longer.
fn wrap_line(line: &str) -> Vec<String> {
    let mut wrapped = Vec::new();
    let mut current = String::new();
    for word in line.split(' ') {
        let mut word = word.to_string();
        while word.chars().count() > WRAP_COLUMNS {
            if !current.is_empty() {
                wrapped.push(std::mem::take(&mut current));
            }
            let split_at = word
                .char_indices()
                .nth(WRAP_COLUMNS)
                .map(|(i, _)| i)
                .unwrap_or(word.len());
            let rest = word.split_off(split_at);
            wrapped.push(word);
            word = rest;
        }
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > WRAP_COLUMNS && !current.is_empty() {
            wrapped.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    wrapped.push(current);
    wrapped
}

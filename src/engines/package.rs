//! Reading and writing Office Open XML packages (zip archives of XML parts).

use std::io::{Cursor, Read, Write};

use zip::{CompressionMethod, ZipArchive, ZipWriter, write::SimpleFileOptions};

use crate::error::EngineError;

pub(crate) const XML_DECLARATION: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Builds a package in memory, one part at a time.
pub(crate) struct PackageWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl PackageWriter {
    pub(crate) fn new() -> Self {
        PackageWriter {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        }
    }

    /// Adds an XML part, prefixing the standard declaration.
    pub(crate) fn add_xml(&mut self, name: &str, body: &str) -> Result<(), EngineError> {
        self.zip.start_file(name, self.options)?;
        self.zip.write_all(XML_DECLARATION.as_bytes())?;
        self.zip.write_all(body.as_bytes())?;
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<Vec<u8>, EngineError> {
        Ok(self.zip.finish()?.into_inner())
    }
}

/// Reads one part of a package as UTF-8 text.
pub(crate) fn read_part(bytes: &[u8], name: &str) -> Result<String, EngineError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut part = archive.by_name(name)?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Spreadsheet column name for a zero-based index (`0` → `A`, `26` → `AA`).
pub(crate) fn column_name(index: usize) -> String {
    let mut n = index + 1;
    let mut name = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        name.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

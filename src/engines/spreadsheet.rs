//! Spreadsheet conversions between XLSX, CSV and JSON.
//!
//! Only the first worksheet is read. Rows are kept as a rectangular-ish grid of
//! [`Cell`]s; writers pad short rows to the sheet width.

use std::{collections::HashMap, io::Cursor};

use async_trait::async_trait;
use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
use lazy_static::lazy_static;
use quick_xml::escape::escape;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use super::{
    package::{PackageWriter, column_name},
    run_blocking,
    text::decode_text,
};
use crate::{
    error::EngineError, formats::Category, formats::FormatType, traits::Engine,
    types::TransformRequest,
};

lazy_static! {
    static ref NUMBER: Regex = Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").unwrap();
}

const SHEET_NAME: &str = "Sheet1";

const CONTENT_TYPES: &str = r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#;

/// A single spreadsheet value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Bool(bool),
    Text(String),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Infers a typed cell from CSV text: numbers, `TRUE`/`FALSE`, else text.
    pub fn infer(raw: &str) -> Cell {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return Cell::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Cell::Bool(false);
        }
        if NUMBER.is_match(trimmed) {
            if let Ok(number) = trimmed.parse::<f64>() {
                return Cell::Number(number);
            }
        }
        Cell::Text(raw.to_string())
    }

    /// Formatted value, as it would be shown in a cell.
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(n) => format_number(*n),
            Cell::Bool(true) => "TRUE".to_string(),
            Cell::Bool(false) => "FALSE".to_string(),
            Cell::Text(s) => s.clone(),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Cell::Empty => Value::Null,
            Cell::Number(n) => number_value(*n),
            Cell::Bool(b) => Value::Bool(*b),
            Cell::Text(s) => Value::String(s.clone()),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::Bool(b) => Cell::Bool(*b),
            Data::String(s) if s.is_empty() => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            // serial date number, as an unformatted cell reads
            Data::DateTime(d) => Cell::Number(d.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(e) => Cell::Text(e.to_string()),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

/// The rows of one worksheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// Number of columns, i.e. the length of the longest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Reads the first worksheet of an XLSX workbook.
    pub fn from_xlsx(bytes: &[u8]) -> Result<Sheet, EngineError> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;
        let Some(name) = workbook.sheet_names().first().cloned() else {
            return Ok(Sheet::default());
        };
        let range = workbook.worksheet_range(&name)?;
        let rows = range
            .rows()
            .map(|row| row.iter().map(Cell::from).collect())
            .collect();
        Ok(Sheet { rows })
    }

    /// Reads CSV text, inferring numbers and booleans.
    pub fn from_csv(bytes: &[u8]) -> Result<Sheet, EngineError> {
        let text = decode_text(bytes);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(Cell::infer).collect());
        }
        Ok(Sheet { rows })
    }

    pub fn to_csv(&self) -> Result<Vec<u8>, EngineError> {
        let width = self.width();
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in &self.rows {
            let mut fields: Vec<String> = row.iter().map(Cell::display).collect();
            fields.resize(width, String::new());
            writer.write_record(&fields)?;
        }
        writer
            .into_inner()
            .map_err(|err| EngineError::Io(err.into_error()))
    }

    /// Rows after the first as objects keyed by the first row's headers.
    ///
    /// Empty cells are left out of each object and rows with no values are
    /// skipped. Blank headers become `__EMPTY`; repeated headers get `_1`,
    /// `_2`, ... suffixes.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        let Some((header_row, body)) = self.rows.split_first() else {
            return Vec::new();
        };
        let headers = header_names(header_row, self.width());

        body.iter()
            .filter_map(|row| {
                let record: Map<String, Value> = row
                    .iter()
                    .zip(&headers)
                    .filter(|(cell, _)| !cell.is_empty())
                    .map(|(cell, header)| (header.clone(), cell.to_json()))
                    .collect();
                (!record.is_empty()).then_some(record)
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<Vec<u8>, EngineError> {
        Ok(serde_json::to_vec(&self.to_records())?)
    }

    /// Writes a single-sheet workbook with shared strings.
    pub fn to_xlsx(&self) -> Result<Vec<u8>, EngineError> {
        let mut strings: Vec<&str> = Vec::new();
        let mut string_index: HashMap<&str, usize> = HashMap::new();
        let mut sheet_data = String::new();

        for (r, row) in self.rows.iter().enumerate() {
            sheet_data.push_str(&format!(r#"<row r="{}">"#, r + 1));
            for (c, cell) in row.iter().enumerate() {
                let reference = format!("{}{}", column_name(c), r + 1);
                match cell {
                    Cell::Empty => {}
                    Cell::Number(n) => {
                        sheet_data.push_str(&format!(r#"<c r="{reference}"><v>{n}</v></c>"#));
                    }
                    Cell::Bool(b) => {
                        sheet_data.push_str(&format!(r#"<c r="{reference}" t="b"><v>{}</v></c>"#, u8::from(*b)));
                    }
                    Cell::Text(s) => {
                        let index = *string_index.entry(s.as_str()).or_insert_with(|| {
                            strings.push(s.as_str());
                            strings.len() - 1
                        });
                        sheet_data.push_str(&format!(r#"<c r="{reference}" t="s"><v>{index}</v></c>"#));
                    }
                }
            }
            sheet_data.push_str("</row>");
        }

        let worksheet = format!(
            r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{sheet_data}</sheetData></worksheet>"#
        );
        let mut shared = format!(
            r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
            strings.len()
        );
        for s in &strings {
            shared.push_str(r#"<si><t xml:space="preserve">"#);
            shared.push_str(&escape(*s));
            shared.push_str("</t></si>");
        }
        shared.push_str("</sst>");
        let workbook = format!(
            r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{SHEET_NAME}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
        );

        let mut package = PackageWriter::new();
        package.add_xml("[Content_Types].xml", CONTENT_TYPES)?;
        package.add_xml("_rels/.rels", ROOT_RELS)?;
        package.add_xml("xl/workbook.xml", &workbook)?;
        package.add_xml("xl/_rels/workbook.xml.rels", WORKBOOK_RELS)?;
        package.add_xml("xl/worksheets/sheet1.xml", &worksheet)?;
        package.add_xml("xl/sharedStrings.xml", &shared)?;
        package.finish()
    }
}

fn header_names(row: &[Cell], width: usize) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut headers = Vec::with_capacity(width);
    for column in 0..width {
        let base = match row.get(column) {
            Some(cell) if !cell.is_empty() => cell.display(),
            _ => "__EMPTY".to_string(),
        };
        let name = match seen.get(&base).copied() {
            None => {
                seen.insert(base.clone(), 1);
                base
            }
            Some(mut counter) => {
                let mut candidate = format!("{base}_{counter}");
                while seen.contains_key(&candidate) {
                    counter += 1;
                    candidate = format!("{base}_{counter}");
                }
                seen.insert(base, counter + 1);
                seen.insert(candidate.clone(), 1);
                candidate
            }
        };
        headers.push(name);
    }
    headers
}

/// Converts between XLSX, CSV and JSON row objects.
#[derive(Debug, Clone, Default)]
pub struct SpreadsheetEngine;

impl SpreadsheetEngine {
    pub fn new() -> Self {
        SpreadsheetEngine
    }
}

#[async_trait]
impl Engine for SpreadsheetEngine {
    fn category(&self) -> Category {
        Category::Spreadsheet
    }

    fn name(&self) -> &'static str {
        "spreadsheet"
    }

    async fn transform(&self, request: TransformRequest) -> Result<Vec<u8>, EngineError> {
        run_blocking(move || {
            let sheet = match request.input {
                FormatType::Xlsx => Sheet::from_xlsx(&request.bytes)?,
                FormatType::Csv => Sheet::from_csv(&request.bytes)?,
                other => {
                    return Err(EngineError::invalid_input(format!(
                        "`{other}` is not a spreadsheet"
                    )));
                }
            };
            debug!(rows = sheet.rows.len(), columns = sheet.width(), "read worksheet");
            match request.output {
                FormatType::Csv => sheet.to_csv(),
                FormatType::Json => sheet.to_json(),
                FormatType::Xlsx => sheet.to_xlsx(),
                other => Err(EngineError::Unsupported(format!(
                    "cannot write a spreadsheet as `{other}`"
                ))),
            }
        })
        .await
    }
}

//! XLSX to JSON conversion.
//!
//! An `.xlsx` workbook is a ZIP archive of XML parts. Only the first
//! worksheet is read: its shared strings are resolved, cells are placed by
//! their `A1`-style references, and the resulting grid becomes an array of
//! row objects keyed by the header row, matching the CSV mapping.

use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::FormatError;

const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const FIRST_SHEET_PART: &str = "xl/worksheets/sheet1.xml";

/// Parses workbook bytes into an array of row objects.
pub(crate) fn parse(bytes: &[u8]) -> Result<Value, FormatError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let shared = match read_part(&mut archive, SHARED_STRINGS_PART) {
        Ok(xml) => parse_shared_strings(&xml)?,
        Err(FormatError::Archive(ZipError::FileNotFound)) => Vec::new(),
        Err(err) => return Err(err),
    };

    let sheet_xml = read_part(&mut archive, FIRST_SHEET_PART).map_err(|err| match err {
        FormatError::Archive(ZipError::FileNotFound) => {
            FormatError::MissingWorksheet { part: FIRST_SHEET_PART.to_string() }
        }
        other => other,
    })?;

    let rows = parse_sheet(&sheet_xml, &shared)?;
    Ok(rows_to_objects(rows))
}

fn read_part(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<String, FormatError> {
    let mut file = archive.by_name(name)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).map_err(|err| FormatError::Archive(err.into()))?;
    Ok(contents)
}

fn parse_shared_strings(xml: &str) -> Result<Vec<String>, FormatError> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(start) => match start.name().as_ref() {
                b"si" => current.clear(),
                b"t" => in_text = true,
                _ => {}
            },
            Event::Text(event) if in_text => {
                current.push_str(&event.unescape().map_err(quick_xml::Error::from)?);
            }
            Event::End(end) => match end.name().as_ref() {
                b"t" => in_text = false,
                b"si" => strings.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(strings)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CellType {
    Number,
    SharedString,
    InlineString,
    Boolean,
    FormulaString,
    Error,
}

impl CellType {
    fn from_attr(value: &str) -> Self {
        match value {
            "s" => Self::SharedString,
            "inlineStr" => Self::InlineString,
            "b" => Self::Boolean,
            "str" => Self::FormulaString,
            "e" => Self::Error,
            _ => Self::Number,
        }
    }
}

struct Cell {
    column: usize,
    cell_type: CellType,
    raw: Option<String>,
}

fn parse_sheet(xml: &str, shared: &[String]) -> Result<Vec<Vec<Value>>, FormatError> {
    let mut reader = Reader::from_str(xml);
    let mut rows: Vec<Vec<Value>> = Vec::new();
    let mut current_row: Vec<Value> = Vec::new();
    let mut cell: Option<Cell> = None;
    let mut in_value = false;
    let mut in_inline_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(start) => match start.name().as_ref() {
                b"row" => current_row.clear(),
                b"c" => cell = Some(start_cell(&start, current_row.len())?),
                b"v" => in_value = true,
                b"t" => in_inline_text = cell.is_some(),
                _ => {}
            },
            Event::Empty(start) => {
                if start.name().as_ref() == b"c" {
                    let empty = start_cell(&start, current_row.len())?;
                    place(&mut current_row, empty.column, Value::Null);
                }
            }
            Event::Text(event) if in_value || in_inline_text => {
                if let Some(cell) = cell.as_mut() {
                    let text = event.unescape().map_err(quick_xml::Error::from)?;
                    cell.raw.get_or_insert_with(String::new).push_str(&text);
                }
            }
            Event::End(end) => match end.name().as_ref() {
                b"v" => in_value = false,
                b"t" => in_inline_text = false,
                b"c" => {
                    if let Some(cell) = cell.take() {
                        let value = resolve_cell(&cell, shared)?;
                        place(&mut current_row, cell.column, value);
                    }
                }
                b"row" => rows.push(std::mem::take(&mut current_row)),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(rows)
}

fn start_cell(start: &BytesStart<'_>, fallback_column: usize) -> Result<Cell, FormatError> {
    let mut column = fallback_column;
    let mut cell_type = CellType::Number;

    for attribute in start.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        let value = attribute.unescape_value().map_err(quick_xml::Error::from)?;
        match attribute.key.as_ref() {
            b"r" => column = column_index(&value)?,
            b"t" => cell_type = CellType::from_attr(&value),
            _ => {}
        }
    }
    Ok(Cell { column, cell_type, raw: None })
}

fn resolve_cell(cell: &Cell, shared: &[String]) -> Result<Value, FormatError> {
    let Some(raw) = cell.raw.as_deref() else {
        return Ok(Value::Null);
    };
    let value = match cell.cell_type {
        CellType::SharedString => {
            let index: usize = raw.trim().parse().map_err(|_| {
                FormatError::InvalidSharedStringIndex { raw: raw.to_string() }
            })?;
            let text = shared
                .get(index)
                .ok_or(FormatError::SharedStringOutOfRange { index })?;
            Value::String(text.clone())
        }
        CellType::Boolean => Value::Bool(raw.trim() != "0"),
        CellType::InlineString | CellType::FormulaString | CellType::Error => {
            Value::String(raw.to_string())
        }
        CellType::Number => super::infer_scalar(raw.trim()),
    };
    Ok(value)
}

/// Converts the letter prefix of an `A1`-style reference to a zero-based
/// column index. The widest real column is `XFD`, so anything past three
/// letters is rejected rather than accumulated.
fn column_index(reference: &str) -> Result<usize, FormatError> {
    let letters: String =
        reference.chars().take_while(|ch| ch.is_ascii_alphabetic()).collect();
    if letters.is_empty() || letters.len() > 3 {
        return Err(FormatError::InvalidCellReference { reference: reference.to_string() });
    }
    let mut index = 0usize;
    for ch in letters.chars() {
        index = index * 26 + (ch.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    Ok(index - 1)
}

fn place(row: &mut Vec<Value>, column: usize, value: Value) {
    while row.len() < column {
        row.push(Value::Null);
    }
    if row.len() == column {
        row.push(value);
    } else {
        row[column] = value;
    }
}

fn rows_to_objects(rows: Vec<Vec<Value>>) -> Value {
    let mut iter = rows.into_iter();
    let Some(header_row) = iter.next() else {
        return Value::Array(Vec::new());
    };

    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::String(name) if !name.is_empty() => name.clone(),
            Value::Null => format!("column{}", index + 1),
            other => other.to_string(),
        })
        .collect();

    let objects = iter
        .map(|row| {
            let mut object = Map::with_capacity(headers.len());
            for (index, header) in headers.iter().enumerate() {
                object.insert(
                    header.clone(),
                    row.get(index).cloned().unwrap_or(Value::Null),
                );
            }
            Value::Object(object)
        })
        .collect();
    Value::Array(objects)
}

//! Conversion of external input formats into JSON values.
//!
//! Parsing is delegated to third-party parsers; this module only owns the
//! mapping into a JSON-compatible value and the format-specific error
//! surface. After conversion every document is treated as opaque JSON.

mod excel;
mod xml;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde_json::{Map, Number, Value};

use crate::FormatError;

/// Supported input formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// Plain JSON (the native format; passed through unchanged).
    Json,
    /// YAML, converted via its serde data model.
    Yaml,
    /// Delimited text with a header row; becomes an array of row objects.
    Csv,
    /// XML; elements become nested objects with `@attr` and `#text` keys.
    Xml,
    /// An `.xlsx` workbook; the first worksheet becomes an array of row
    /// objects keyed by the header row.
    Excel,
}

impl Format {
    /// Detects a format from a file extension, case-insensitively.
    ///
    /// ```
    /// use jcv_core::format::Format;
    ///
    /// assert_eq!(Format::from_extension("YAML"), Some(Format::Yaml));
    /// assert_eq!(Format::from_extension("txt"), None);
    /// ```
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "csv" => Some(Self::Csv),
            "xml" => Some(Self::Xml),
            "xlsx" | "xlsm" => Some(Self::Excel),
            _ => None,
        }
    }

    /// Detects a format from a file path's extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension().and_then(|ext| ext.to_str()).and_then(Self::from_extension)
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "csv" => Ok(Self::Csv),
            "xml" => Ok(Self::Xml),
            "excel" | "xlsx" => Ok(Self::Excel),
            other => Err(format!("unknown format: {other}")),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Yaml => f.write_str("yaml"),
            Self::Csv => f.write_str("csv"),
            Self::Xml => f.write_str("xml"),
            Self::Excel => f.write_str("excel"),
        }
    }
}

/// Converts raw input bytes in the given format into a JSON value.
///
/// A parse failure is reported as a format-specific error and produces no
/// partial output; callers keep their previous buffers on error.
///
/// ```
/// use jcv_core::format::{to_value, Format};
///
/// let value = to_value(b"name,age\nada,36\n", Format::Csv).unwrap();
/// assert_eq!(value, serde_json::json!([{"name": "ada", "age": 36}]));
/// ```
pub fn to_value(bytes: &[u8], format: Format) -> Result<Value, FormatError> {
    match format {
        Format::Json => Ok(serde_json::from_slice(bytes)?),
        Format::Yaml => {
            let value: serde_yaml::Value = serde_yaml::from_slice(bytes)?;
            Ok(serde_json::to_value(value)?)
        }
        Format::Csv => csv_to_value(bytes),
        Format::Xml => xml::parse(std::str::from_utf8(bytes)?),
        Format::Excel => excel::parse(bytes),
    }
}

fn csv_to_value(bytes: &[u8]) -> Result<Value, FormatError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = Map::with_capacity(headers.len());
        for (index, header) in headers.iter().enumerate() {
            row.insert(header.to_string(), infer_scalar(record.get(index).unwrap_or("")));
        }
        rows.push(Value::Object(row));
    }
    Ok(Value::Array(rows))
}

/// Maps a bare text field onto the narrowest JSON scalar it parses as.
pub(crate) fn infer_scalar(field: &str) -> Value {
    if field.is_empty() {
        return Value::Null;
    }
    match field {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(int) = field.parse::<i64>() {
        return Value::Number(Number::from(int));
    }
    if let Ok(float) = field.parse::<f64>() {
        if let Some(number) = Number::from_f64(float) {
            return Value::Number(number);
        }
    }
    Value::String(field.to_string())
}

use thiserror::Error;

/// Errors that can occur while converting external input into a JSON value.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The provided JSON input was invalid.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The provided YAML input was invalid.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The provided CSV input was invalid.
    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),
    /// The provided XML input was malformed.
    #[error("invalid XML: {0}")]
    Xml(#[from] quick_xml::Error),
    /// The workbook container could not be opened.
    #[error("invalid workbook archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    /// Input was declared as text but is not valid UTF-8.
    #[error("input is not valid UTF-8")]
    NonUtf8(#[from] std::str::Utf8Error),
    /// The workbook does not contain the expected worksheet part.
    #[error("workbook is missing part {part}")]
    MissingWorksheet {
        /// The archive path that was expected to exist.
        part: String,
    },
    /// A worksheet cell carried a reference that could not be interpreted.
    #[error("invalid cell reference: {reference}")]
    InvalidCellReference {
        /// The offending `A1`-style reference.
        reference: String,
    },
    /// A shared-string index pointed outside the shared string table.
    #[error("shared string index {index} out of range")]
    SharedStringOutOfRange {
        /// The offending index.
        index: usize,
    },
    /// A shared-string cell carried a non-numeric index.
    #[error("invalid shared string index: {raw}")]
    InvalidSharedStringIndex {
        /// The raw cell contents.
        raw: String,
    },
    /// XML documents must have exactly one root element.
    #[error("XML document has no root element")]
    MissingXmlRoot,
}

/// Errors produced while encoding or decoding shareable state.
#[derive(Debug, Error)]
pub enum ShareError {
    /// The encoded parameter was not valid base64.
    #[error("invalid share encoding: {0}")]
    Decode(#[from] base64::DecodeError),
    /// The decoded payload was not the expected JSON shape.
    #[error("invalid share payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Errors produced by the snapshot store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the snapshot file failed.
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The snapshot file exists but does not deserialize.
    #[error("snapshot is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    /// No platform data directory could be resolved.
    #[error("unable to resolve a data directory for snapshots")]
    NoDataDir,
}

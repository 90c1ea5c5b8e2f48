//! Structured-data codecs
//!
//! Pure byte-level encode/decode per supported format. Nothing in here
//! performs I/O: the client downloads raw bytes, hands them to a codec, and
//! uploads whatever a codec produced. Each module returns its own error type;
//! the client attaches the remote path and format when mapping into the crate
//! error.

pub mod archive;
pub mod csv;
pub mod excel;
pub mod parquet;
pub mod yaml;

/// The structured formats the client understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Yaml,
    Csv,
    Parquet,
    Excel,
    Zip,
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Format::Text => "text",
            Format::Yaml => "yaml",
            Format::Csv => "csv",
            Format::Parquet => "parquet",
            Format::Excel => "excel",
            Format::Zip => "zip",
        };
        write!(f, "{name}")
    }
}

//! Error types for drawpad

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DrawpadError>;

/// Main error type for drawpad
#[derive(Debug, Error)]
pub enum DrawpadError {
    #[error("unknown style property: {0}")]
    UnknownProperty(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("font loading failed: {0}")]
    FontLoad(#[from] FontLoadError),

    #[error("shaping failed: {0}")]
    Shaping(#[from] ShapingError),

    #[error("export failed: {0}")]
    Export(#[from] ExportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Font loading errors
#[derive(Debug, Error)]
pub enum FontLoadError {
    #[error("font file not found: {0}")]
    FileNotFound(String),

    #[error("invalid font data")]
    InvalidData,

    #[error("font family not found: {0}")]
    FamilyNotFound(String),

    #[error("font file too large: {size} bytes (max {max}) at {path}")]
    TooLarge { path: String, size: u64, max: u64 },

    #[error("failed to read font at {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
}

/// Shaping errors
#[derive(Debug, Error)]
pub enum ShapingError {
    #[error("backend error: {0}")]
    Backend(String),
}

/// Export errors
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unsupported file type: {0}")]
    UnknownFormat(String),

    #[error("format not supported by this document: {0}")]
    FormatNotSupported(String),

    #[error("encoding failed: {0}")]
    Encoding(String),

    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

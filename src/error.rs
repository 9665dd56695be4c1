use std::path::PathBuf;

use thiserror::Error;

/// Reading or decoding a company logo.
#[derive(Debug, Error)]
pub enum LogoError {
    #[error("Failed to read logo file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Logo is not a readable image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Malformed logo data URI: {0}")]
    DataUri(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Preview capture is empty")]
    Empty,

    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("Failed to write PDF: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export worker stopped before finishing")]
    Interrupted,

    #[error("Preview could not be captured whole")]
    Incomplete,

    #[error("Preview changed while it was being captured")]
    PreviewChanged,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid settings: {message}")]
    Invalid { message: String },
}

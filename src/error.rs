//! Error handling and custom error types
//!
//! Provides unified error handling across the crate using thiserror.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Image decode error: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to create thumbnail {}: {source}", path.display())]
    CreateThumbnail {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Thumbnail encode error: {0}")]
    EncodeThumbnail(#[source] image::ImageError),

    #[error("Failed to rewind upload stream: {0}")]
    Rewind(#[source] std::io::Error),

    #[error("Failed to create original {}: {source}", path.display())]
    CreateOriginal {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to copy upload to {}: {source}", path.display())]
    Copy {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a single upload.
///
/// `filename` is the name that was generated for the upload before the
/// failing step, or `None` when the content type was rejected up front.
/// A name being present says nothing about what reached the disk.
#[derive(Error, Debug)]
#[error("{source}")]
pub struct UploadError {
    pub filename: Option<String>,
    #[source]
    pub source: Error,
}

impl UploadError {
    pub fn new(filename: Option<String>, source: Error) -> Self {
        Self { filename, source }
    }

    pub fn kind(&self) -> &Error {
        &self.source
    }
}

impl From<Error> for UploadError {
    fn from(source: Error) -> Self {
        Self::new(None, source)
    }
}

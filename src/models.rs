//! Data models and structures
//!
//! Defines the content types the processor understands, the record of a
//! stored upload, and environment-driven configuration.

use crate::{Error, Result};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_UPLOADS_DIR: &str = "./public/uploads";
pub const THUMBNAILS_SUBDIR: &str = "thumbnails";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Png,
    Jpeg,
}

impl ContentType {
    /// Resolve an exact MIME string. Anything but `image/png` or `image/jpeg`
    /// is rejected.
    pub fn parse(mime: &str) -> Result<Self> {
        match mime {
            "image/png" => Ok(Self::Png),
            "image/jpeg" => Ok(Self::Jpeg),
            other => Err(Error::UnsupportedContentType(other.to_string())),
        }
    }

    /// Legacy resolution: everything that is not `image/png` is JPEG.
    pub fn parse_or_jpeg(mime: &str) -> Self {
        if mime == "image/png" {
            Self::Png
        } else {
            Self::Jpeg
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
        }
    }
}

/// Where an upload ended up on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredUpload {
    pub filename: String,
    pub content_type: ContentType,
    pub original_path: PathBuf,
    pub thumbnail_path: PathBuf,
    pub size: u64,
}

// Configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub uploads_dir: PathBuf,
    pub thumbnails_dir: PathBuf,
    pub jpeg_fallback: bool,
}

impl Default for Config {
    fn default() -> Self {
        let uploads_dir = PathBuf::from(DEFAULT_UPLOADS_DIR);
        Self {
            thumbnails_dir: uploads_dir.join(THUMBNAILS_SUBDIR),
            uploads_dir,
            jpeg_fallback: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let uploads_dir = lookup("UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOADS_DIR));
        let thumbnails_dir = lookup("THUMBNAILS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| uploads_dir.join(THUMBNAILS_SUBDIR));
        let jpeg_fallback = match lookup("UPLOADS_JPEG_FALLBACK") {
            Some(value) => parse_flag(&value).ok_or_else(|| {
                Error::Config(format!("UPLOADS_JPEG_FALLBACK must be a boolean, got '{}'", value))
            })?,
            None => false,
        };

        Ok(Self {
            uploads_dir,
            thumbnails_dir,
            jpeg_fallback,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

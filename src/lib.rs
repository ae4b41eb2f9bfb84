//! Local storage for uploaded images
//!
//! Accepts a PNG or JPEG upload, stores the original bytes under a random
//! filename and writes a 300x300 thumbnail alongside it.

pub mod app;
pub mod error;
pub mod image;
pub mod models;

pub use error::{Error, Result, UploadError};

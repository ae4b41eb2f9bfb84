//! Image upload processing
//!
//! Decodes uploaded PNG/JPEG images, writes a fixed-size thumbnail next to a
//! verbatim copy of the original, and reports where both ended up.

pub mod mime;
pub mod mock;
pub mod processor;

pub use mime::detect_image_mime;
pub use mock::MockImageProcessor;
pub use processor::{generate_filename, LocalImageProcessor, THUMBNAIL_SIZE};

use crate::error::UploadError;
use crate::models::StoredUpload;
use std::io::{Read, Seek};

/// A byte stream that can be read to the end and rewound.
pub trait UploadSource: Read + Seek {}

impl<T: Read + Seek + ?Sized> UploadSource for T {}

pub trait ImageService: Send + Sync {
    /// Store `src` under a freshly generated name.
    ///
    /// The stream is read from its current position, rewound to offset 0 and
    /// read again. It is never closed.
    fn process(
        &self,
        src: &mut dyn UploadSource,
        content_type: &str,
    ) -> std::result::Result<StoredUpload, UploadError>;
}

//! Application entry point for storing uploaded image files.

use crate::error::UploadError;
use crate::image::{detect_image_mime, ImageService, LocalImageProcessor};
use crate::models::{Config, StoredUpload};
use crate::{Error, Result};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

const SIGNATURE_LEN: u64 = 8;

/// Hands files on disk to an [`ImageService`].
pub struct App {
    image: Arc<dyn ImageService>,
}

impl App {
    /// Build an app around a concrete service, e.g. a mock in tests.
    pub fn with_service(image: Arc<dyn ImageService>) -> Self {
        Self { image }
    }

    /// Construct an app backed by [`LocalImageProcessor`].
    pub fn new(config: &Config) -> Self {
        info!(
            "Storing uploads in {} (thumbnails in {})",
            config.uploads_dir.display(),
            config.thumbnails_dir.display()
        );
        Self::with_service(Arc::new(LocalImageProcessor::from_config(config)))
    }

    /// Store the file at `path`.
    ///
    /// When `content_type` is `None` it is sniffed from the file signature.
    pub async fn run(
        &self,
        path: &Path,
        content_type: Option<&str>,
    ) -> std::result::Result<StoredUpload, UploadError> {
        tokio::task::spawn_blocking({
            let image = Arc::clone(&self.image);
            let path = path.to_path_buf();
            let content_type = content_type.map(str::to_string);
            move || Self::process_file(image.as_ref(), path, content_type)
        })
        .await
        .map_err(|e| Error::Invariant(format!("Upload task join error: {}", e)))?
    }

    fn process_file(
        image: &dyn ImageService,
        path: PathBuf,
        content_type: Option<String>,
    ) -> std::result::Result<StoredUpload, UploadError> {
        let mut file = File::open(&path).map_err(Error::Io)?;

        let content_type = match content_type {
            Some(content_type) => content_type,
            None => {
                let sniffed = sniff_content_type(&mut file)?;
                warn!(
                    "No content type given for {}, detected {}",
                    path.display(),
                    sniffed
                );
                sniffed.to_string()
            }
        };

        info!("Processing {} as {}", path.display(), content_type);
        image.process(&mut file, &content_type)
    }
}

/// Detect the content type from the leading bytes, leaving the stream
/// rewound to the start.
pub fn sniff_content_type<R: Read + Seek>(src: &mut R) -> Result<&'static str> {
    let mut header = Vec::with_capacity(SIGNATURE_LEN as usize);
    src.by_ref().take(SIGNATURE_LEN).read_to_end(&mut header)?;
    src.rewind()?;

    detect_image_mime(&header).ok_or_else(|| {
        Error::UnsupportedContentType("unrecognized file signature".to_string())
    })
}

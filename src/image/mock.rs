use super::{generate_filename, ImageService, UploadSource};
use crate::error::UploadError;
use crate::models::{ContentType, StoredUpload};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub struct MockImageProcessor {
    process_count: Arc<Mutex<usize>>,
    content_types: Arc<Mutex<Vec<String>>>,
    base_path: PathBuf,
    should_fail: Arc<Mutex<bool>>,
}

impl MockImageProcessor {
    pub fn new() -> Self {
        Self {
            process_count: Arc::new(Mutex::new(0)),
            content_types: Arc::new(Mutex::new(Vec::new())),
            base_path: PathBuf::from("/tmp"),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = path.into();
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_process_count(&self) -> usize {
        *self.process_count.lock().unwrap()
    }

    /// Content types in the order they were received.
    pub fn get_content_types(&self) -> Vec<String> {
        self.content_types.lock().unwrap().clone()
    }
}

impl Default for MockImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageService for MockImageProcessor {
    fn process(
        &self,
        src: &mut dyn UploadSource,
        content_type: &str,
    ) -> std::result::Result<StoredUpload, UploadError> {
        self.content_types
            .lock()
            .unwrap()
            .push(content_type.to_string());

        let content_type = ContentType::parse_or_jpeg(content_type);
        let filename = generate_filename(content_type);

        if *self.should_fail.lock().unwrap() {
            return Err(UploadError::new(
                Some(filename),
                crate::Error::Decode(image::ImageError::IoError(std::io::Error::other(
                    "Mock failure",
                ))),
            ));
        }

        let size = std::io::copy(src, &mut std::io::sink()).map_err(crate::Error::Io)?;

        let mut count = self.process_count.lock().unwrap();
        *count += 1;

        Ok(StoredUpload {
            original_path: self.base_path.join(&filename),
            thumbnail_path: self.base_path.join("thumbnails").join(&filename),
            filename,
            content_type,
            size,
        })
    }
}

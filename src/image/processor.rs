use super::{ImageService, UploadSource};
use crate::error::UploadError;
use crate::models::{Config, ContentType, StoredUpload};
use crate::{Error, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageError};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Width and height of every thumbnail, in pixels.
pub const THUMBNAIL_SIZE: u32 = 300;

const FILENAME_TOKEN_LEN: usize = 16;

/// Random `[A-Za-z0-9]{16}` token plus the extension for `content_type`.
pub fn generate_filename(content_type: ContentType) -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(FILENAME_TOKEN_LEN)
        .map(char::from)
        .collect();
    format!("{}.{}", token, content_type.extension())
}

/// Stores originals under `base_dir` and thumbnails under `thumbnails_dir`.
#[derive(Debug, Clone)]
pub struct LocalImageProcessor {
    base_dir: PathBuf,
    thumbnails_dir: PathBuf,
    jpeg_fallback: bool,
}

impl LocalImageProcessor {
    pub fn new(base_dir: impl Into<PathBuf>, thumbnails_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            thumbnails_dir: thumbnails_dir.into(),
            jpeg_fallback: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.uploads_dir, &config.thumbnails_dir)
            .with_jpeg_fallback(config.jpeg_fallback)
    }

    /// Treat every content type other than `image/png` as JPEG instead of
    /// rejecting it.
    pub fn with_jpeg_fallback(mut self, enabled: bool) -> Self {
        self.jpeg_fallback = enabled;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn thumbnails_dir(&self) -> &Path {
        &self.thumbnails_dir
    }

    fn resolve_content_type(&self, mime: &str) -> Result<ContentType> {
        if self.jpeg_fallback {
            Ok(ContentType::parse_or_jpeg(mime))
        } else {
            ContentType::parse(mime)
        }
    }

    fn store(
        &self,
        src: &mut dyn UploadSource,
        content_type: ContentType,
        filename: &str,
    ) -> Result<StoredUpload> {
        ensure_dir(&self.base_dir)?;
        ensure_dir(&self.thumbnails_dir)?;

        let image = decode(src, content_type)?;
        debug!(
            "Decoded {} upload {} ({}x{})",
            content_type.mime(),
            filename,
            image.width(),
            image.height()
        );

        let thumbnail_path = self.thumbnails_dir.join(filename);
        write_thumbnail(&make_thumbnail(&image), content_type, &thumbnail_path)?;
        debug!("Wrote thumbnail {}", thumbnail_path.display());

        src.seek(SeekFrom::Start(0)).map_err(Error::Rewind)?;

        let original_path = self.base_dir.join(filename);
        let size = copy_original(src, &original_path)?;
        debug!("Copied {} bytes to {}", size, original_path.display());

        Ok(StoredUpload {
            filename: filename.to_string(),
            content_type,
            original_path,
            thumbnail_path,
            size,
        })
    }
}

impl ImageService for LocalImageProcessor {
    fn process(
        &self,
        src: &mut dyn UploadSource,
        content_type: &str,
    ) -> std::result::Result<StoredUpload, UploadError> {
        let content_type = self.resolve_content_type(content_type)?;
        let filename = generate_filename(content_type);

        let stored = self
            .store(src, content_type, &filename)
            .map_err(|e| UploadError::new(Some(filename.clone()), e))?;

        info!("Stored upload {} ({} bytes)", stored.filename, stored.size);
        Ok(stored)
    }
}

fn ensure_dir(path: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o777);
    }

    builder.create(path).map_err(|source| Error::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

fn decode(src: &mut dyn UploadSource, content_type: ContentType) -> Result<DynamicImage> {
    image::load(BufReader::new(src), content_type.image_format()).map_err(Error::Decode)
}

// Crop before scaling: memory stays bounded by the source, whatever its aspect.
fn make_thumbnail(image: &DynamicImage) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    let side = width.min(height);
    let square = image.crop_imm((width - side) / 2, (height - side) / 2, side, side);
    square.resize_exact(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Lanczos3)
}

fn write_thumbnail(
    thumbnail: &DynamicImage,
    content_type: ContentType,
    path: &Path,
) -> Result<()> {
    let file = File::create(path).map_err(|source| Error::CreateThumbnail {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    // JPEG has no alpha channel.
    let encoded = match content_type {
        ContentType::Png => DynamicImage::ImageRgba8(thumbnail.to_rgba8()),
        ContentType::Jpeg => DynamicImage::ImageRgb8(thumbnail.to_rgb8()),
    };
    encoded
        .write_to(&mut writer, content_type.image_format())
        .map_err(Error::EncodeThumbnail)?;
    writer
        .flush()
        .map_err(|e| Error::EncodeThumbnail(ImageError::IoError(e)))
}

fn copy_original(src: &mut dyn UploadSource, path: &Path) -> Result<u64> {
    let mut dst = File::create(path).map_err(|source| Error::CreateOriginal {
        path: path.to_path_buf(),
        source,
    })?;

    io::copy(src, &mut dst).map_err(|source| Error::Copy {
        path: path.to_path_buf(),
        source,
    })
}

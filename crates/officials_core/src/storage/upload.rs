//! Client upload description and image type detection.

use image::ImageFormat;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Extensions accepted for profile images (compared lowercased).
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["jpeg", "png", "jpg", "gif"];
/// Maximum accepted profile image size in kilobytes.
pub const MAX_IMAGE_KILOBYTES: u64 = 5120;

const SNIFF_LEN: u64 = 16;

/// Image formats accepted for profile images.
pub const ALLOWED_IMAGE_FORMATS: &[ImageFormat] =
    &[ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::Gif];

/// An uploaded file waiting on local disk, as a multipart layer leaves it.
///
/// The temporary file at `path` is consumed (moved) when the upload is
/// stored; `original_name` is the client-side filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub path: PathBuf,
    pub original_name: String,
}

/// Facts read from an upload during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadInspection {
    /// Detected format, `None` when not one of `ALLOWED_IMAGE_FORMATS`.
    pub kind: Option<ImageFormat>,
    /// Lowercased extension of `original_name`, without the dot.
    pub extension: Option<String>,
    pub size_bytes: u64,
}

impl UploadedImage {
    pub fn new(path: impl Into<PathBuf>, original_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            original_name: original_name.into(),
        }
    }

    /// Lowercased extension of the client filename.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .map(str::to_ascii_lowercase)
    }

    /// Reads size and leading bytes of the upload.
    pub fn inspect(&self) -> io::Result<UploadInspection> {
        let size_bytes = std::fs::metadata(&self.path)?.len();
        let kind = sniff_image_kind(&self.path)?;
        Ok(UploadInspection {
            kind,
            extension: self.extension(),
            size_bytes,
        })
    }
}

/// Detects JPEG/PNG/GIF content from the leading bytes of `path`.
pub fn sniff_image_kind(path: &Path) -> io::Result<Option<ImageFormat>> {
    let mut header = Vec::new();
    File::open(path)?.take(SNIFF_LEN).read_to_end(&mut header)?;
    Ok(kind_from_header(&header))
}

fn kind_from_header(header: &[u8]) -> Option<ImageFormat> {
    image::guess_format(header)
        .ok()
        .filter(|format| ALLOWED_IMAGE_FORMATS.contains(format))
}

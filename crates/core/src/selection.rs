//! Pre-flight file selection.
//!
//! Filters a list of candidate files down to the images the pipeline will
//! accept: a supported image type, no larger than the size limit, and
//! within the maximum resolution. Only the image header is decoded.
//! Rejected files are reported with a reason instead of aborting the
//! whole selection.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};

use crate::task::FileRef;

/// Default maximum file size in bytes (5 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Default maximum image width in pixels.
pub const DEFAULT_MAX_WIDTH: u32 = 3000;

/// Default maximum image height in pixels.
pub const DEFAULT_MAX_HEIGHT: u32 = 2000;

/// Image formats the pipeline accepts.
const SUPPORTED_FORMATS: &[ImageFormat] = &[ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::WebP];

/// Limits applied by [`select_files`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionLimits {
    pub max_file_size: u64,
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for SelectionLimits {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
        }
    }
}

/// A file picked by the user, before validation.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Why a candidate was left out of the batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("not a supported image (PNG, JPEG or WebP)")]
    UnsupportedType,

    #[error("file is too large ({size} bytes, limit {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },

    #[error("resolution {width}x{height} exceeds {max_width}x{max_height}")]
    TooHighResolution {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },

    #[error("unreadable image header: {0}")]
    Unreadable(String),
}

/// A candidate that did not pass selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedFile {
    pub name: String,
    pub reason: Rejection,
}

/// Outcome of [`select_files`]. `accepted` keeps the input order.
#[derive(Debug, Default)]
pub struct Selection {
    pub accepted: Vec<FileRef>,
    pub rejected: Vec<RejectedFile>,
}

/// Split `candidates` into accepted files and rejections.
pub fn select_files(
    candidates: impl IntoIterator<Item = CandidateFile>,
    limits: &SelectionLimits,
) -> Selection {
    let mut selection = Selection::default();

    for candidate in candidates {
        match check_candidate(&candidate, limits) {
            Ok(format) => selection.accepted.push(FileRef::new(
                candidate.name,
                format.to_mime_type(),
                candidate.bytes,
            )),
            Err(reason) => selection.rejected.push(RejectedFile {
                name: candidate.name,
                reason,
            }),
        }
    }

    selection
}

fn check_candidate(candidate: &CandidateFile, limits: &SelectionLimits) -> Result<ImageFormat, Rejection> {
    let format = image::guess_format(&candidate.bytes).map_err(|_| Rejection::UnsupportedType)?;
    if !SUPPORTED_FORMATS.contains(&format) {
        return Err(Rejection::UnsupportedType);
    }

    let size = candidate.bytes.len() as u64;
    if size > limits.max_file_size {
        return Err(Rejection::TooLarge {
            size,
            limit: limits.max_file_size,
        });
    }

    let (width, height) = ImageReader::with_format(Cursor::new(&candidate.bytes), format)
        .into_dimensions()
        .map_err(|e| Rejection::Unreadable(e.to_string()))?;

    if width > limits.max_width || height > limits.max_height {
        return Err(Rejection::TooHighResolution {
            width,
            height,
            max_width: limits.max_width,
            max_height: limits.max_height,
        });
    }

    Ok(format)
}

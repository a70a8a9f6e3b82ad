//! File input boundary.
//!
//! Validates a user-selected file before any processing: MIME-type prefix
//! (`image/*`, plus `video/*` when video support is enabled) and a size
//! ceiling — 10MB for image-only operation, 50MB once video is supported.
//! Rejection is immediate and leaves all state untouched; there is no
//! partial processing.

use crate::config::StudioConfig;
use crate::error::{DetectError, DetectResult};

pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;
pub const MAX_VIDEO_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Video,
}

#[derive(Clone, Debug)]
pub struct FileIntake {
    video_enabled: bool,
    max_image_bytes: u64,
    max_video_bytes: u64,
}

impl FileIntake {
    pub fn new(video_enabled: bool) -> Self {
        Self {
            video_enabled,
            max_image_bytes: MAX_IMAGE_BYTES,
            max_video_bytes: MAX_VIDEO_BYTES,
        }
    }

    pub fn from_config(config: &StudioConfig) -> Self {
        Self {
            video_enabled: config.video_enabled,
            max_image_bytes: config.max_image_bytes,
            max_video_bytes: config.max_video_bytes,
        }
    }

    fn size_ceiling(&self) -> u64 {
        if self.video_enabled {
            self.max_video_bytes
        } else {
            self.max_image_bytes
        }
    }

    /// Classify a file by MIME type and enforce the size ceiling.
    pub fn classify(&self, mime: &str, len: u64) -> DetectResult<FileKind> {
        let kind = if mime.starts_with("image/") {
            FileKind::Image
        } else if mime.starts_with("video/") {
            if !self.video_enabled {
                return Err(DetectError::InvalidInput(
                    "video uploads are not supported".into(),
                ));
            }
            FileKind::Video
        } else {
            return Err(DetectError::InvalidInput(
                "please select a valid image or video file".into(),
            ));
        };

        let ceiling = self.size_ceiling();
        if len > ceiling {
            return Err(DetectError::InvalidInput(format!(
                "file size must be less than {}MB",
                ceiling / (1024 * 1024)
            )));
        }
        Ok(kind)
    }
}

//! Still image source.
//!
//! Decodes a user-supplied byte blob exactly once; `current_frame` is
//! idempotent afterward and always ready.

use image::RgbaImage;
use std::sync::Arc;

use crate::error::{DetectError, DetectResult};
use crate::frame::Frame;

use super::FrameSource;

pub struct StillSource {
    image: Arc<RgbaImage>,
    display_name: String,
}

impl StillSource {
    /// Decode from raw bytes. Decode failures are user-correctable input
    /// errors, not inference errors.
    pub fn decode(bytes: &[u8], display_name: &str) -> DetectResult<Self> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| DetectError::InvalidInput(format!("could not decode image: {e}")))?;
        Ok(Self {
            image: Arc::new(decoded.to_rgba8()),
            display_name: display_name.to_string(),
        })
    }

    pub fn from_image(image: RgbaImage, display_name: &str) -> Self {
        Self {
            image: Arc::new(image),
            display_name: display_name.to_string(),
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Shared handle to the decoded pixels, used as the history sourceRef.
    pub fn image(&self) -> Arc<RgbaImage> {
        self.image.clone()
    }
}

impl FrameSource for StillSource {
    fn current_frame(&mut self) -> Option<Frame> {
        Some(Frame::from_shared(self.image.clone(), 0))
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn is_live(&self) -> bool {
        false
    }
}

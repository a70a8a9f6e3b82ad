//! Frame container shared by sources, the detector, and the overlay renderer.
//!
//! A `Frame` is one decoded RGBA image handed from a media source to the
//! detection loop. The pixel buffer sits behind an `Arc` so single-shot
//! results can keep a reference to the originating image in history without
//! copying the pixels.

use image::RgbaImage;
use std::sync::Arc;

/// One decoded frame from a media source.
#[derive(Clone)]
pub struct Frame {
    pub image: Arc<RgbaImage>,
    /// Source-local sequence number. Live sources count delivered frames;
    /// still images are always frame 0.
    pub seq: u64,
}

impl Frame {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
            seq: 0,
        }
    }

    pub fn from_shared(image: Arc<RgbaImage>, seq: u64) -> Self {
        Self { image, seq }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Generate a deterministic gradient pattern. Used by the synthetic sources
/// and the demo binary; `phase` shifts the gradient so consecutive frames
/// differ.
pub fn test_pattern(width: u32, height: u32, phase: u64) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let v = ((x as u64 + y as u64 + phase) % 256) as u8;
        image::Rgba([v, v.wrapping_mul(3), v.wrapping_add(89), 255])
    })
}

//! Media source adapters.
//!
//! Three source kinds are normalized into one frame-provider abstraction:
//! - Still images: decoded once from user bytes, always ready afterward.
//! - File-backed video: a host playback surface with buffered-readiness and
//!   pause state; no frames while paused or below the readiness threshold.
//! - Webcam: a live capture stream; presents whatever the hardware currently
//!   delivers, no buffering, no replay.
//!
//! Sources never call the detector and never render; they only hand frames
//! to the loop controller.

mod camera;
mod still;
mod video;

pub use camera::{
    CameraAccess, CameraSource, CaptureConstraints, DeniedCamera, FacingPreference, LiveFeed,
    SyntheticCamera,
};
pub use still::StillSource;
pub use video::{PlaybackControl, PlaybackSurface, SyntheticPlayback, VideoSource};

use crate::frame::Frame;

/// Uniform frame-provider capability over all source kinds.
pub trait FrameSource {
    /// Latest frame, or `None` while the source is not ready to provide one.
    fn current_frame(&mut self) -> Option<Frame>;

    /// Readiness predicate. Polled by callers instead of wiring source-kind
    /// specific readiness callbacks into the loop.
    fn is_ready(&self) -> bool;

    /// Live sources reflect current hardware output; non-live sources are
    /// replayable.
    fn is_live(&self) -> bool;
}

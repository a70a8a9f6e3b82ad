//! Sightloop
//!
//! Client-local object detection core: load a model once, run it over still
//! images, video playback, or a live camera, and present annotated results.
//! All inference is local; no frame ever leaves the process.
//!
//! # Architecture
//!
//! The session enforces a small set of invariants by construction:
//!
//! 1. **One model**: loaded once at init; a load failure is terminal.
//! 2. **At most one inference in flight**: ticks that arrive during a pass
//!    are absorbed, never queued.
//! 3. **Stale results are discarded**: stopping (or restarting) the loop
//!    invalidates any in-flight pass before it can reach the canvas.
//! 4. **Cameras never leak**: leaving webcam mode or tearing down the
//!    session stops every live track.
//! 5. **History is bounded**: at most five records, most recent first, each
//!    replayable without the detector.
//!
//! # Module Structure
//!
//! - `detect`: detector contract and the loaded-model handle
//! - `source`: still / video / webcam adapters behind one frame provider
//! - `session`: detection loop controller, tick scheduling, shared canvas
//! - `overlay`: pure composite renderer (boxes, labels, index-based color)
//! - `mode`, `intake`, `history`, `export`: mode machine, file validation,
//!   bounded result store, PNG export
//! - `studio`: the facade hosts talk to

use std::time::{SystemTime, UNIX_EPOCH};

pub mod config;
pub mod detect;
pub mod error;
pub mod export;
pub mod frame;
pub mod history;
pub mod intake;
pub mod mode;
pub mod overlay;
pub mod session;
pub mod source;
pub mod studio;

pub use config::StudioConfig;
pub use detect::{BBox, Detector, DetectorHandle, ModelLoader, Prediction, StubDetector, StubLoader};
pub use error::{DetectError, DetectResult};
pub use export::ExportBlob;
pub use frame::Frame;
pub use history::{DetectionRecord, ResultHistory, HISTORY_CAPACITY};
pub use intake::{FileIntake, FileKind};
pub use mode::{Mode, ModeState};
pub use session::{Canvas, FrameTicker, LoopController, LoopStats, LoopTicket, RefreshTicker};
pub use source::{
    CameraAccess, CameraSource, CaptureConstraints, DeniedCamera, FacingPreference, FrameSource,
    LiveFeed, PlaybackControl, PlaybackSurface, StillSource, SyntheticCamera, SyntheticPlayback,
    VideoSource,
};
pub use studio::Studio;

/// Milliseconds since the Unix epoch; zero if the clock is before it.
pub(crate) fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

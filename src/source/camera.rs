//! Live camera source.
//!
//! Acquisition is asynchronous and may be denied by the user or host; denial
//! surfaces `DetectError::MediaAcquisition` and the caller's mode is left
//! unchanged. Once acquired, the stream is owned exclusively and must be
//! released before the owner leaves webcam mode or tears down — the
//! `LiveFeed::live_tracks` probe makes release observable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{DetectError, DetectResult};
use crate::frame::Frame;

use super::FrameSource;

pub const DEFAULT_CAPTURE_WIDTH: u32 = 1280;
pub const DEFAULT_CAPTURE_HEIGHT: u32 = 720;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingPreference {
    /// Front-facing.
    User,
    /// Rear-facing. Preferred where available.
    Environment,
}

/// Requested capture parameters. "Ideal", not mandatory — hardware may
/// deliver a different geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConstraints {
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub facing: FacingPreference,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            ideal_width: DEFAULT_CAPTURE_WIDTH,
            ideal_height: DEFAULT_CAPTURE_HEIGHT,
            facing: FacingPreference::Environment,
        }
    }
}

/// A live, video-only capture stream bound to a device.
pub trait LiveFeed: Send {
    /// Whatever the hardware is presenting right now. `None` until the first
    /// decoded frame arrives, and after shutdown.
    fn poll_frame(&mut self) -> Option<Frame>;

    /// Number of live tracks still open on the device.
    fn live_tracks(&self) -> usize;

    /// Stop every track. Idempotent.
    fn shutdown(&mut self);
}

/// Camera permission boundary.
#[async_trait]
pub trait CameraAccess: Send + Sync {
    /// Request a capture stream. Resolving may take arbitrarily long and may
    /// be denied; denial does not auto-retry.
    async fn request(&self, constraints: &CaptureConstraints) -> DetectResult<Box<dyn LiveFeed>>;
}

/// Frame-provider adapter over an acquired stream.
pub struct CameraSource {
    feed: Box<dyn LiveFeed>,
    delivered_first: bool,
    seq: u64,
}

impl CameraSource {
    pub fn new(feed: Box<dyn LiveFeed>) -> Self {
        Self {
            feed,
            delivered_first: false,
            seq: 0,
        }
    }

    pub fn live_tracks(&self) -> usize {
        self.feed.live_tracks()
    }

    /// Release the underlying stream. Called by the mode state machine
    /// before it transitions away from webcam, and again (harmlessly) on
    /// drop.
    pub fn release(&mut self) {
        self.feed.shutdown();
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        // No leak path: dropping the source always stops the tracks.
        self.feed.shutdown();
    }
}

impl FrameSource for CameraSource {
    fn current_frame(&mut self) -> Option<Frame> {
        let mut frame = self.feed.poll_frame()?;
        self.delivered_first = true;
        self.seq += 1;
        frame.seq = self.seq;
        Some(frame)
    }

    fn is_ready(&self) -> bool {
        // Ready once the stream has delivered at least one decoded frame.
        self.delivered_first
    }

    fn is_live(&self) -> bool {
        true
    }
}

// ----------------------------------------------------------------------------
// Synthetic camera for tests and the demo
// ----------------------------------------------------------------------------

/// Grants every request with a gradient-pattern feed. The track counter is
/// shared so tests can observe release after the source is gone.
pub struct SyntheticCamera {
    tracks: Arc<AtomicUsize>,
}

impl SyntheticCamera {
    pub fn new() -> Self {
        Self {
            tracks: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Probe counting live tracks across every feed this camera granted.
    pub fn track_probe(&self) -> Arc<AtomicUsize> {
        self.tracks.clone()
    }
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CameraAccess for SyntheticCamera {
    async fn request(&self, constraints: &CaptureConstraints) -> DetectResult<Box<dyn LiveFeed>> {
        self.tracks.fetch_add(1, Ordering::SeqCst);
        log::info!(
            "synthetic camera granted ({}x{}, {:?})",
            constraints.ideal_width,
            constraints.ideal_height,
            constraints.facing
        );
        Ok(Box::new(SyntheticFeed {
            tracks: self.tracks.clone(),
            open: true,
            width: constraints.ideal_width,
            height: constraints.ideal_height,
            seq: 0,
        }))
    }
}

struct SyntheticFeed {
    tracks: Arc<AtomicUsize>,
    open: bool,
    width: u32,
    height: u32,
    seq: u64,
}

impl LiveFeed for SyntheticFeed {
    fn poll_frame(&mut self) -> Option<Frame> {
        if !self.open {
            return None;
        }
        self.seq += 1;
        Some(Frame::new(crate::frame::test_pattern(
            self.width,
            self.height,
            self.seq,
        )))
    }

    fn live_tracks(&self) -> usize {
        if self.open {
            1
        } else {
            0
        }
    }

    fn shutdown(&mut self) {
        if self.open {
            self.open = false;
            self.tracks.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// Always denies, as if the user rejected the permission prompt.
pub struct DeniedCamera;

#[async_trait]
impl CameraAccess for DeniedCamera {
    async fn request(&self, _constraints: &CaptureConstraints) -> DetectResult<Box<dyn LiveFeed>> {
        Err(DetectError::MediaAcquisition(
            "camera permission denied".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ready_after_first_decoded_frame() {
        let camera = SyntheticCamera::new();
        let feed = camera.request(&CaptureConstraints::default()).await.unwrap();
        let mut source = CameraSource::new(feed);

        assert!(!source.is_ready());
        assert!(source.is_live());
        let frame = source.current_frame().unwrap();
        assert!(source.is_ready());
        assert_eq!(frame.seq, 1);
        assert_eq!(frame.width(), DEFAULT_CAPTURE_WIDTH);
    }

    #[tokio::test]
    async fn release_and_drop_both_stop_tracks() {
        let camera = SyntheticCamera::new();
        let probe = camera.track_probe();

        let feed = camera.request(&CaptureConstraints::default()).await.unwrap();
        let mut source = CameraSource::new(feed);
        assert_eq!(probe.load(Ordering::SeqCst), 1);

        source.release();
        assert_eq!(probe.load(Ordering::SeqCst), 0);
        // Shutdown is idempotent; drop must not double-count.
        drop(source);
        assert_eq!(probe.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn denial_is_media_acquisition() {
        let err = DeniedCamera
            .request(&CaptureConstraints::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, DetectError::MediaAcquisition(_)));
    }
}

//! Mode state machine.
//!
//! One mode is active at a time. Entering a mode tears down the previous
//! mode's acquisitions first — in particular the camera stream, which must
//! never outlive webcam mode. Webcam entry is two-phase: the request is
//! pending until the permission prompt resolves, and a denial leaves the
//! previous mode active.

use serde::{Deserialize, Serialize};

use crate::error::DetectResult;
use crate::source::{CameraAccess, CameraSource, CaptureConstraints, VideoSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Image,
    Video,
    Webcam,
}

pub struct ModeState {
    current: Mode,
    pending_webcam: bool,
    camera: Option<CameraSource>,
    video: Option<VideoSource>,
}

impl ModeState {
    /// Sessions open in image mode.
    pub fn new() -> Self {
        Self {
            current: Mode::Image,
            pending_webcam: false,
            camera: None,
            video: None,
        }
    }

    pub fn current(&self) -> Mode {
        self.current
    }

    /// True while a webcam permission request is unresolved.
    pub fn is_pending(&self) -> bool {
        self.pending_webcam
    }

    pub fn has_camera(&self) -> bool {
        self.camera.is_some()
    }

    pub fn camera_mut(&mut self) -> Option<&mut CameraSource> {
        self.camera.as_mut()
    }

    pub fn video_mut(&mut self) -> Option<&mut VideoSource> {
        self.video.as_mut()
    }

    /// Switch to image or video mode. Webcam entry goes through
    /// `enter_webcam` because acquisition can fail.
    pub fn enter(&mut self, target: Mode) {
        debug_assert_ne!(target, Mode::Webcam);
        self.leave_current();
        self.current = target;
    }

    /// Request the camera and, on grant, switch to webcam mode. On denial
    /// the mode and any existing acquisitions are left untouched.
    pub async fn enter_webcam(
        &mut self,
        access: &dyn CameraAccess,
        constraints: &CaptureConstraints,
    ) -> DetectResult<()> {
        // Re-entering webcam releases the old stream before requesting a
        // fresh one; two live streams must never coexist.
        if self.current == Mode::Webcam {
            self.leave_current();
        }
        self.pending_webcam = true;
        let feed = match access.request(constraints).await {
            Ok(feed) => feed,
            Err(e) => {
                self.pending_webcam = false;
                log::warn!("webcam acquisition failed, staying in {:?}: {e}", self.current);
                return Err(e);
            }
        };
        self.pending_webcam = false;
        self.leave_current();
        self.camera = Some(CameraSource::new(feed));
        self.current = Mode::Webcam;
        Ok(())
    }

    /// Attach a playback surface for video mode.
    pub fn bind_video(&mut self, video: VideoSource) {
        self.video = Some(video);
    }

    /// Tear down every acquisition without changing the mode label. Used at
    /// session teardown.
    pub fn release_all(&mut self) {
        self.leave_current();
    }

    fn leave_current(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            camera.release();
        }
        self.video = None;
    }
}

impl Default for ModeState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{DeniedCamera, SyntheticCamera};
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn denial_leaves_the_previous_mode_active() {
        let mut state = ModeState::new();
        assert_eq!(state.current(), Mode::Image);

        let err = state
            .enter_webcam(&DeniedCamera, &CaptureConstraints::default())
            .await
            .err()
            .unwrap();
        assert!(!err.is_fatal());
        assert_eq!(state.current(), Mode::Image);
        assert!(!state.is_pending());
        assert!(!state.has_camera());
    }

    #[tokio::test]
    async fn leaving_webcam_releases_every_track() {
        let camera = SyntheticCamera::new();
        let probe = camera.track_probe();

        let mut state = ModeState::new();
        state
            .enter_webcam(&camera, &CaptureConstraints::default())
            .await
            .unwrap();
        assert_eq!(state.current(), Mode::Webcam);
        assert_eq!(probe.load(Ordering::SeqCst), 1);

        state.enter(Mode::Image);
        assert_eq!(state.current(), Mode::Image);
        assert_eq!(probe.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reentering_webcam_never_holds_two_streams() {
        let camera = SyntheticCamera::new();
        let probe = camera.track_probe();

        let mut state = ModeState::new();
        state
            .enter_webcam(&camera, &CaptureConstraints::default())
            .await
            .unwrap();
        state
            .enter_webcam(&camera, &CaptureConstraints::default())
            .await
            .unwrap();
        assert_eq!(probe.load(Ordering::SeqCst), 1);

        state.release_all();
        assert_eq!(probe.load(Ordering::SeqCst), 0);
    }
}

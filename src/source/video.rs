//! File-backed video source.
//!
//! Wraps a seekable, user-controlled playback surface owned by the host.
//! The adapter reports ready only once the surface has metadata and the
//! minimum buffered threshold; no frames are produced while paused, so the
//! loop reschedules without calling the detector.

use crate::frame::Frame;

use super::FrameSource;

/// Host-facing playback handle. The host drives play/pause/seek; the adapter
/// only observes readiness and grabs whatever the playhead currently shows.
pub trait PlaybackSurface {
    /// Metadata loaded and the minimum buffered-readiness threshold reached.
    fn buffered_ready(&self) -> bool;

    fn paused(&self) -> bool;

    /// Decode the frame at the current playhead. `None` when nothing is
    /// decodable yet.
    fn grab(&mut self) -> Option<Frame>;
}

pub struct VideoSource {
    surface: Box<dyn PlaybackSurface>,
    display_name: String,
}

impl VideoSource {
    pub fn new(surface: Box<dyn PlaybackSurface>, display_name: &str) -> Self {
        Self {
            surface,
            display_name: display_name.to_string(),
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl FrameSource for VideoSource {
    fn current_frame(&mut self) -> Option<Frame> {
        if !self.surface.buffered_ready() || self.surface.paused() {
            return None;
        }
        self.surface.grab()
    }

    fn is_ready(&self) -> bool {
        self.surface.buffered_ready()
    }

    fn is_live(&self) -> bool {
        false
    }
}

// ----------------------------------------------------------------------------
// Synthetic playback surface for tests and the demo
// ----------------------------------------------------------------------------

/// In-memory playback surface producing gradient frames. Shares its control
/// state so tests can toggle pause/readiness while the source is borrowed by
/// a running loop.
pub struct SyntheticPlayback {
    state: std::sync::Arc<std::sync::Mutex<PlaybackState>>,
    width: u32,
    height: u32,
}

struct PlaybackState {
    ready: bool,
    paused: bool,
    seq: u64,
}

/// Control half of a `SyntheticPlayback`.
#[derive(Clone)]
pub struct PlaybackControl {
    state: std::sync::Arc<std::sync::Mutex<PlaybackState>>,
}

impl SyntheticPlayback {
    pub fn new(width: u32, height: u32) -> (Self, PlaybackControl) {
        let state = std::sync::Arc::new(std::sync::Mutex::new(PlaybackState {
            ready: false,
            paused: true,
            seq: 0,
        }));
        (
            Self {
                state: state.clone(),
                width,
                height,
            },
            PlaybackControl { state },
        )
    }
}

impl PlaybackControl {
    fn lock(&self) -> std::sync::MutexGuard<'_, PlaybackState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Simulate metadata + buffered threshold reached.
    pub fn set_ready(&self) {
        self.lock().ready = true;
    }

    pub fn play(&self) {
        self.lock().paused = false;
    }

    pub fn pause(&self) {
        self.lock().paused = true;
    }
}

impl PlaybackSurface for SyntheticPlayback {
    fn buffered_ready(&self) -> bool {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).ready
    }

    fn paused(&self) -> bool {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).paused
    }

    fn grab(&mut self) -> Option<Frame> {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state.seq += 1;
        let seq = state.seq;
        drop(state);
        let mut frame = Frame::new(crate::frame::test_pattern(self.width, self.height, seq));
        frame.seq = seq;
        Some(frame)
    }
}

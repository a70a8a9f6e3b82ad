//! Studio facade.
//!
//! Owns one detection session end to end: the loaded detector, the active
//! mode and its media source, the shared canvas, the loop controller, and
//! the result history. Hosts talk to `Studio`; the modules underneath never
//! talk to the host directly.

use crate::config::StudioConfig;
use crate::detect::DetectorHandle;
use crate::detect::ModelLoader;
use crate::error::{DetectError, DetectResult};
use crate::export::{export_canvas, ExportBlob};
use crate::frame::Frame;
use crate::history::{DetectionRecord, ResultHistory};
use crate::intake::{FileIntake, FileKind};
use crate::mode::{Mode, ModeState};
use crate::now_epoch_ms;
use crate::overlay;
use crate::session::{Canvas, FrameTicker, LoopController};
use crate::source::{CameraAccess, PlaybackSurface, StillSource, VideoSource};

pub struct Studio {
    config: StudioConfig,
    detector: DetectorHandle,
    intake: FileIntake,
    history: ResultHistory,
    canvas: Canvas,
    loop_ctl: LoopController,
    mode: ModeState,
}

impl Studio {
    /// Load the model and open a session in image mode. A load failure is
    /// fatal: there is no session to return.
    pub async fn init(loader: &dyn ModelLoader, config: StudioConfig) -> DetectResult<Self> {
        let detector = DetectorHandle::load(loader).await?;
        Ok(Self {
            intake: FileIntake::from_config(&config),
            loop_ctl: LoopController::new(detector.clone()),
            config,
            detector,
            history: ResultHistory::new(),
            canvas: Canvas::default(),
            mode: ModeState::new(),
        })
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.mode.current()
    }

    /// True while webcam acquisition is unresolved; callers should disable
    /// actions that need a ready source until this clears.
    pub fn mode_pending(&self) -> bool {
        self.mode.is_pending()
    }

    /// Shared canvas handle for presenting and exporting.
    pub fn canvas(&self) -> Canvas {
        self.canvas.clone()
    }

    /// Shared loop control block, for stopping or reading telemetry while a
    /// run borrows the studio.
    pub fn controller(&self) -> LoopController {
        self.loop_ctl.clone()
    }

    pub fn history(&self) -> &ResultHistory {
        &self.history
    }

    /// Switch modes. Always stops any running loop first; webcam entry may
    /// fail on denial, in which case the previous mode stays active.
    pub async fn select_mode(
        &mut self,
        target: Mode,
        access: &dyn CameraAccess,
    ) -> DetectResult<()> {
        let settled = self.mode.current() == target
            && !self.mode.is_pending()
            && (target != Mode::Webcam || self.mode.has_camera());
        if settled {
            return Ok(());
        }
        self.loop_ctl.stop();
        match target {
            Mode::Webcam => self.mode.enter_webcam(access, &self.config.capture).await,
            other => {
                self.mode.enter(other);
                Ok(())
            }
        }
    }

    /// Validate and take in a user file. An accepted image is detected
    /// immediately and recorded; an accepted video switches to video mode
    /// and waits for `bind_playback`. A rejected file changes nothing.
    pub async fn ingest_file(
        &mut self,
        display_name: &str,
        mime: &str,
        bytes: &[u8],
    ) -> DetectResult<Option<DetectionRecord>> {
        let kind = self.intake.classify(mime, bytes.len() as u64)?;
        self.loop_ctl.stop();
        match kind {
            FileKind::Image => {
                let source = StillSource::decode(bytes, display_name)?;
                self.mode.enter(Mode::Image);
                self.detect_still(&source).await.map(Some)
            }
            FileKind::Video => {
                self.mode.enter(Mode::Video);
                Ok(None)
            }
        }
    }

    /// One inference pass over a still source: present the composite and
    /// record the result.
    async fn detect_still(&mut self, source: &StillSource) -> DetectResult<DetectionRecord> {
        let frame = Frame::from_shared(source.image(), 0);
        let predictions = self.detector.detect(&frame).await?;
        log::info!(
            "still detection on '{}': {} objects",
            source.display_name(),
            predictions.len()
        );
        self.canvas.present(overlay::render(&frame.image, &predictions));
        let record = DetectionRecord {
            predictions,
            source: source.image(),
            display_name: source.display_name().to_string(),
            created_at_ms: now_epoch_ms(),
        };
        self.history.record(record.clone());
        Ok(record)
    }

    /// Attach the host's playback surface after a video file was accepted.
    pub fn bind_playback(&mut self, surface: Box<dyn PlaybackSurface>, display_name: &str) {
        self.mode.bind_video(VideoSource::new(surface, display_name));
    }

    /// Run the continuous loop over the current mode's source until stopped
    /// via the controller. Image mode has no continuous source.
    pub async fn run_live(&mut self, ticker: &mut dyn FrameTicker) -> DetectResult<()> {
        let current = self.mode.current();
        let ctl = self.loop_ctl.clone();
        let canvas = self.canvas.clone();
        let source: &mut dyn crate::source::FrameSource = match current {
            Mode::Webcam => self.mode.camera_mut().ok_or_else(|| {
                DetectError::MediaAcquisition("no camera stream acquired".into())
            })?,
            Mode::Video => self.mode.video_mut().ok_or_else(|| {
                DetectError::InvalidInput("no playback surface bound".into())
            })?,
            Mode::Image => {
                return Err(DetectError::InvalidInput(
                    "image mode has no continuous source".into(),
                ))
            }
        };
        let ticket = ctl.start(current);
        ctl.run(ticket, source, ticker, &canvas).await;
        Ok(())
    }

    pub fn stop(&self) {
        self.loop_ctl.stop();
    }

    /// Bring a stored result back onto the canvas without re-running the
    /// detector.
    pub fn show_history_entry(&self, index: usize) -> DetectResult<()> {
        let composite = self
            .history
            .replay(index)
            .ok_or_else(|| DetectError::InvalidInput(format!("no history entry {index}")))?;
        self.canvas.present(composite);
        Ok(())
    }

    /// PNG-encode whatever the canvas currently shows.
    pub fn export(&self) -> DetectResult<ExportBlob> {
        export_canvas(&self.canvas)
    }

    /// Dismiss results: history and canvas both reset.
    pub fn clear(&mut self) {
        self.history.clear();
        self.canvas.clear();
    }

    /// Stop the loop and release every media acquisition.
    pub fn teardown(&mut self) {
        self.loop_ctl.stop();
        self.mode.release_all();
    }
}

impl Drop for Studio {
    fn drop(&mut self) {
        self.teardown();
    }
}

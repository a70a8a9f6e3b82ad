//! Detection loop controller.
//!
//! Drives continuous detection over a live or playing source with one hard
//! invariant: at most one inference call in flight per session. Scheduling is
//! cooperative — a tick fires, the current frame (if any) is scored, the
//! overlay is presented, and only then does the loop wait for the next tick.
//! Ticks that arrive while inference runs are absorbed, never queued.
//!
//! Stopping is generation-based. `start` hands out a ticket stamped with the
//! current generation; `stop` (or a newer `start`) bumps the generation, and
//! any in-flight result whose ticket is stale is discarded without touching
//! the canvas or counters.

use async_trait::async_trait;
use image::RgbaImage;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

use crate::detect::DetectorHandle;
use crate::mode::Mode;
use crate::overlay;
use crate::source::FrameSource;

/// Throughput is published once per elapsed window.
pub const FPS_WINDOW: Duration = Duration::from_millis(1000);

/// Telemetry snapshot for the current run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Completed inference passes since the run started.
    pub frames_processed: u64,
    /// Completions in the last full window. Zero until the first window
    /// elapses.
    pub fps: u32,
}

struct SessionState {
    running: bool,
    generation: u64,
    mode: Option<Mode>,
    frames_processed: u64,
    fps: u32,
    window_count: u32,
    window_start: Instant,
}

/// Proof of which `start` call a loop body belongs to. Stale tickets make
/// in-flight results discardable.
#[derive(Clone, Copy, Debug)]
pub struct LoopTicket {
    generation: u64,
}

/// Shared control block for the detection loop. Clones observe and control
/// the same session.
#[derive(Clone)]
pub struct LoopController {
    detector: DetectorHandle,
    state: Arc<Mutex<SessionState>>,
}

impl LoopController {
    pub fn new(detector: DetectorHandle) -> Self {
        Self {
            detector,
            state: Arc::new(Mutex::new(SessionState {
                running: false,
                generation: 0,
                mode: None,
                frames_processed: 0,
                fps: 0,
                window_count: 0,
                window_start: Instant::now(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Begin a new run. Any previous run is implicitly stopped: its ticket
    /// goes stale the moment the generation advances.
    pub fn start(&self, mode: Mode) -> LoopTicket {
        let mut state = self.lock();
        state.generation += 1;
        state.running = true;
        state.mode = Some(mode);
        state.frames_processed = 0;
        state.fps = 0;
        state.window_count = 0;
        state.window_start = Instant::now();
        log::info!("detection loop started ({mode:?}, gen {})", state.generation);
        LoopTicket {
            generation: state.generation,
        }
    }

    /// Stop the current run. Idempotent; an in-flight inference finishes but
    /// its result is discarded.
    pub fn stop(&self) {
        let mut state = self.lock();
        if state.running {
            state.running = false;
            state.mode = None;
            log::info!("detection loop stopped (gen {})", state.generation);
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    pub fn mode(&self) -> Option<Mode> {
        self.lock().mode
    }

    pub fn is_current(&self, ticket: &LoopTicket) -> bool {
        let state = self.lock();
        state.running && state.generation == ticket.generation
    }

    pub fn stats(&self) -> LoopStats {
        let state = self.lock();
        LoopStats {
            frames_processed: state.frames_processed,
            fps: state.fps,
        }
    }

    fn complete_frame(&self) {
        let mut state = self.lock();
        state.frames_processed += 1;
        state.window_count += 1;
        if state.window_start.elapsed() >= FPS_WINDOW {
            state.fps = state.window_count;
            state.window_count = 0;
            state.window_start = Instant::now();
        }
    }

    /// Body of one run. Returns when the ticket goes stale (stop, or a newer
    /// start). Ticks with no ready frame reschedule without inference; a
    /// failed inference is logged and the loop keeps going.
    pub async fn run(
        &self,
        ticket: LoopTicket,
        source: &mut dyn FrameSource,
        ticker: &mut dyn FrameTicker,
        canvas: &Canvas,
    ) {
        loop {
            ticker.next_tick().await;
            if !self.is_current(&ticket) {
                break;
            }
            let Some(frame) = source.current_frame() else {
                continue;
            };
            match self.detector.detect(&frame).await {
                Ok(predictions) => {
                    // A stop that landed during inference wins; the result is
                    // dropped before it can reach the canvas.
                    if !self.is_current(&ticket) {
                        break;
                    }
                    canvas.present(overlay::render(&frame.image, &predictions));
                    self.complete_frame();
                }
                Err(e) => {
                    log::warn!("inference pass failed, continuing: {e}");
                }
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Tick scheduling
// ----------------------------------------------------------------------------

/// One awaitable tick per display refresh opportunity.
#[async_trait]
pub trait FrameTicker: Send {
    async fn next_tick(&mut self);
}

/// Fixed-interval ticker. Ticks that elapse while the loop is busy fire
/// immediately on the next await instead of piling up.
pub struct RefreshTicker {
    interval: tokio::time::Interval,
}

impl RefreshTicker {
    pub fn new(period: Duration) -> Self {
        Self {
            interval: tokio::time::interval(period),
        }
    }
}

#[async_trait]
impl FrameTicker for RefreshTicker {
    async fn next_tick(&mut self) {
        self.interval.tick().await;
    }
}

// ----------------------------------------------------------------------------
// Canvas
// ----------------------------------------------------------------------------

/// Shared presentation surface. The loop writes composites into it; the host
/// snapshots or exports from it. Cleared when results are dismissed.
#[derive(Clone, Default)]
pub struct Canvas {
    inner: Arc<Mutex<Option<RgbaImage>>>,
}

impl Canvas {
    pub fn present(&self, image: RgbaImage) {
        *self.inner.lock().unwrap_or_else(|p| p.into_inner()) = Some(image);
    }

    pub fn snapshot(&self) -> Option<RgbaImage> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn clear(&self) {
        *self.inner.lock().unwrap_or_else(|p| p.into_inner()) = None;
    }

    pub fn is_blank(&self) -> bool {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{BBox, Prediction, StubDetector};
    use crate::source::{CameraAccess, CameraSource, CaptureConstraints, SyntheticCamera};

    fn stub_controller(stub: StubDetector) -> (LoopController, Arc<StubDetector>) {
        let stub = Arc::new(stub);
        let handle = DetectorHandle::from_detector(stub.clone());
        (LoopController::new(handle), stub)
    }

    fn person() -> Prediction {
        Prediction::new(BBox::new(4.0, 4.0, 20.0, 16.0), "person", 0.9)
    }

    async fn camera_source() -> CameraSource {
        let camera = SyntheticCamera::new();
        let feed = camera
            .request(&CaptureConstraints {
                ideal_width: 48,
                ideal_height: 32,
                ..Default::default()
            })
            .await
            .unwrap();
        CameraSource::new(feed)
    }

    #[tokio::test(start_paused = true)]
    async fn newer_start_invalidates_older_ticket() {
        let (ctl, _) = stub_controller(StubDetector::new());
        let first = ctl.start(Mode::Webcam);
        assert!(ctl.is_current(&first));

        let second = ctl.start(Mode::Webcam);
        assert!(!ctl.is_current(&first));
        assert!(ctl.is_current(&second));

        ctl.stop();
        assert!(!ctl.is_current(&second));
        assert!(!ctl.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn not_ready_source_never_reaches_the_detector() {
        let (ctl, stub) = stub_controller(StubDetector::new());
        let canvas = Canvas::default();
        let (surface, _control) = crate::source::SyntheticPlayback::new(16, 16);
        let mut source = crate::source::VideoSource::new(Box::new(surface), "clip.mp4");

        let ticket = ctl.start(Mode::Video);
        let stopper = {
            let ctl = ctl.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                ctl.stop();
            }
        };
        let mut ticker = RefreshTicker::new(Duration::from_millis(33));
        tokio::join!(ctl.run(ticket, &mut source, &mut ticker, &canvas), stopper);

        assert_eq!(stub.calls(), 0);
        assert!(canvas.is_blank());
        assert_eq!(ctl.stats(), LoopStats::default());
    }

    #[tokio::test(start_paused = true)]
    async fn fps_published_after_each_full_window() {
        // 50ms inference latency against a 33ms tick: completions land every
        // 50ms, so a full window holds exactly 20.
        let stub = StubDetector::new()
            .with_predictions(vec![person()])
            .with_latency(Duration::from_millis(50));
        let (ctl, stub) = stub_controller(stub);
        let canvas = Canvas::default();
        let mut source = camera_source().await;

        let ticket = ctl.start(Mode::Webcam);
        let stopper = {
            let ctl = ctl.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(1010)).await;
                ctl.stop();
            }
        };
        let mut ticker = RefreshTicker::new(Duration::from_millis(33));
        tokio::join!(ctl.run(ticket, &mut source, &mut ticker, &canvas), stopper);

        let stats = ctl.stats();
        assert_eq!(stats.fps, 20);
        assert_eq!(stats.frames_processed, 20);
        assert!(!canvas.is_blank());
        assert!(stub.calls() >= 20);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_inference_discards_the_result() {
        let stub = StubDetector::new()
            .with_predictions(vec![person()])
            .with_latency(Duration::from_millis(100));
        let (ctl, stub) = stub_controller(stub);
        let canvas = Canvas::default();
        let mut source = camera_source().await;

        let ticket = ctl.start(Mode::Webcam);
        let stopper = {
            let ctl = ctl.clone();
            async move {
                // Lands mid-inference: the first call starts at t=0 and
                // resolves at t=100.
                tokio::time::sleep(Duration::from_millis(40)).await;
                ctl.stop();
            }
        };
        let mut ticker = RefreshTicker::new(Duration::from_millis(33));
        tokio::join!(ctl.run(ticket, &mut source, &mut ticker, &canvas), stopper);

        assert_eq!(stub.calls(), 1);
        assert!(canvas.is_blank());
        assert_eq!(ctl.stats().frames_processed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_inference_failure_does_not_stop_the_loop() {
        let stub = StubDetector::new()
            .with_predictions(vec![person()])
            .with_latency(Duration::from_millis(50))
            .with_failing_calls(&[0]);
        let (ctl, stub) = stub_controller(stub);
        let canvas = Canvas::default();
        let mut source = camera_source().await;

        let ticket = ctl.start(Mode::Webcam);
        let stopper = {
            let ctl = ctl.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(160)).await;
                ctl.stop();
            }
        };
        let mut ticker = RefreshTicker::new(Duration::from_millis(33));
        tokio::join!(ctl.run(ticket, &mut source, &mut ticker, &canvas), stopper);

        // Call 0 failed, later calls succeeded and kept presenting.
        assert!(stub.calls() >= 2);
        assert!(!canvas.is_blank());
        assert!(ctl.stats().frames_processed >= 1);
    }
}

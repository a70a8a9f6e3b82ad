//! Detector handle and the inference seam.
//!
//! The detection model is an external collaborator: this module only defines
//! the contract (`Detector`, `ModelLoader`) and the handle that owns the
//! loaded model. The handle does not serialize calls — the detection loop
//! controller is responsible for at-most-one-in-flight (see `session`).

mod stub;

pub use stub::{StubDetector, StubLoader};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::DetectResult;
use crate::frame::Frame;

/// Axis-aligned box in source-pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// One detected object. Immutable once produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub bbox: BBox,
    pub class_label: String,
    /// Confidence in `[0, 1]`.
    pub score: f32,
}

impl Prediction {
    pub fn new(bbox: BBox, class_label: impl Into<String>, score: f32) -> Self {
        Self {
            bbox,
            class_label: class_label.into(),
            score,
        }
    }
}

/// Inference capability. Implementations may be called from concurrent
/// contexts; serialization of calls within one session is the loop
/// controller's job, not the detector's.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Backend identifier for logs.
    fn name(&self) -> &'static str;

    /// Score one frame. Predictions come back in model output order.
    async fn detect(&self, frame: &Frame) -> DetectResult<Vec<Prediction>>;
}

/// Asynchronous model loading. Attempted exactly once at studio init;
/// a failure is `DetectError::ModelLoad` and is terminal for the session.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self) -> DetectResult<Arc<dyn Detector>>;
}

/// Owns the loaded detection model. Loaded once, read-only thereafter;
/// cloning shares the same model.
#[derive(Clone)]
pub struct DetectorHandle {
    inner: Arc<dyn Detector>,
}

impl DetectorHandle {
    pub async fn load(loader: &dyn ModelLoader) -> DetectResult<Self> {
        let inner = loader.load().await?;
        log::info!("detector '{}' loaded", inner.name());
        Ok(Self { inner })
    }

    pub fn from_detector(detector: Arc<dyn Detector>) -> Self {
        Self { inner: detector }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name()
    }

    pub async fn detect(&self, frame: &Frame) -> DetectResult<Vec<Prediction>> {
        self.inner.detect(frame).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DetectError;
    use crate::frame::test_pattern;

    #[tokio::test]
    async fn handle_load_propagates_model_failure() {
        let loader = StubLoader::failing("weights missing");
        let err = DetectorHandle::load(&loader).await.err().unwrap();
        assert!(matches!(err, DetectError::ModelLoad(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn handle_returns_canned_predictions() {
        let prediction = Prediction::new(BBox::new(1.0, 2.0, 3.0, 4.0), "person", 0.9);
        let loader = StubLoader::with_predictions(vec![prediction.clone()]);
        let handle = DetectorHandle::load(&loader).await.unwrap();

        let frame = Frame::new(test_pattern(16, 16, 0));
        let out = handle.detect(&frame).await.unwrap();
        assert_eq!(out, vec![prediction]);
    }
}

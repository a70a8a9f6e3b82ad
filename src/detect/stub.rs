//! Scriptable stub detector for tests and the demo binary.
//!
//! Mirrors the real contract closely enough to exercise the loop controller:
//! canned predictions, optional per-call latency, and scripted failures on
//! selected call indices.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{DetectError, DetectResult};
use crate::frame::Frame;

use super::{Detector, ModelLoader, Prediction};

pub struct StubDetector {
    canned: Vec<Prediction>,
    latency: Duration,
    failing_calls: HashSet<u64>,
    calls: AtomicU64,
}

impl StubDetector {
    pub fn new() -> Self {
        Self {
            canned: Vec::new(),
            latency: Duration::ZERO,
            failing_calls: HashSet::new(),
            calls: AtomicU64::new(0),
        }
    }

    pub fn with_predictions(mut self, predictions: Vec<Prediction>) -> Self {
        self.canned = predictions;
        self
    }

    /// Each `detect` call sleeps this long before answering. Under a paused
    /// tokio clock this makes detector throughput exact in tests.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Calls with these zero-based indices return `DetectError::Inference`.
    pub fn with_failing_calls(mut self, indices: &[u64]) -> Self {
        self.failing_calls = indices.iter().copied().collect();
        self
    }

    /// Number of `detect` calls issued so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for StubDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Detector for StubDetector {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn detect(&self, _frame: &Frame) -> DetectResult<Vec<Prediction>> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.failing_calls.contains(&index) {
            return Err(DetectError::Inference(format!(
                "scripted failure on call {index}"
            )));
        }
        Ok(self.canned.clone())
    }
}

/// Loader producing a `StubDetector`, or a scripted `ModelLoad` failure.
pub struct StubLoader {
    detector: Option<Arc<StubDetector>>,
    failure: Option<String>,
}

impl StubLoader {
    pub fn new(detector: StubDetector) -> Self {
        Self {
            detector: Some(Arc::new(detector)),
            failure: None,
        }
    }

    pub fn with_predictions(predictions: Vec<Prediction>) -> Self {
        Self::new(StubDetector::new().with_predictions(predictions))
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            detector: None,
            failure: Some(reason.to_string()),
        }
    }

    /// Shared reference to the detector, for call-count assertions.
    pub fn detector(&self) -> Option<Arc<StubDetector>> {
        self.detector.clone()
    }
}

#[async_trait]
impl ModelLoader for StubLoader {
    async fn load(&self) -> DetectResult<Arc<dyn Detector>> {
        match (&self.detector, &self.failure) {
            (Some(detector), _) => Ok(detector.clone() as Arc<dyn Detector>),
            (None, Some(reason)) => Err(DetectError::ModelLoad(reason.clone())),
            (None, None) => Err(DetectError::ModelLoad("no detector configured".into())),
        }
    }
}

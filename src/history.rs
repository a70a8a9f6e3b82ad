//! Result history.
//!
//! Bounded, most-recent-first store of completed single-shot detections.
//! Each record keeps the prediction list plus a shared handle to the source
//! pixels, so any entry can be re-rendered later without touching the
//! detector. Live loop iterations are never recorded here.

use image::RgbaImage;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::detect::Prediction;
use crate::overlay;

/// Oldest entries are evicted beyond this.
pub const HISTORY_CAPACITY: usize = 5;

/// One completed detection pass over a still source.
#[derive(Clone)]
pub struct DetectionRecord {
    pub predictions: Vec<Prediction>,
    /// Source pixels at detection time. Shared, never copied.
    pub source: Arc<RgbaImage>,
    pub display_name: String,
    pub created_at_ms: u64,
}

#[derive(Default)]
pub struct ResultHistory {
    records: VecDeque<DetectionRecord>,
}

impl ResultHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a record, evicting the oldest once past capacity.
    pub fn record(&mut self, record: DetectionRecord) {
        self.records.push_front(record);
        self.records.truncate(HISTORY_CAPACITY);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index 0 is the most recent record.
    pub fn get(&self, index: usize) -> Option<&DetectionRecord> {
        self.records.get(index)
    }

    pub fn latest(&self) -> Option<&DetectionRecord> {
        self.records.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DetectionRecord> {
        self.records.iter()
    }

    /// Re-render a stored result from its retained predictions and source
    /// pixels. No inference happens here.
    pub fn replay(&self, index: usize) -> Option<RgbaImage> {
        let record = self.records.get(index)?;
        Some(overlay::render(&record.source, &record.predictions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BBox;
    use crate::frame::test_pattern;

    fn record(name: &str) -> DetectionRecord {
        DetectionRecord {
            predictions: vec![Prediction::new(
                BBox::new(2.0, 2.0, 10.0, 8.0),
                "person",
                0.9,
            )],
            source: Arc::new(test_pattern(32, 24, 0)),
            display_name: name.to_string(),
            created_at_ms: 0,
        }
    }

    #[test]
    fn most_recent_first_with_eviction_at_capacity() {
        let mut history = ResultHistory::new();
        for i in 0..7 {
            history.record(record(&format!("photo-{i}.png")));
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.get(0).unwrap().display_name, "photo-6.png");
        assert_eq!(history.get(4).unwrap().display_name, "photo-2.png");
        // photo-0 and photo-1 were evicted.
        assert!(history.get(5).is_none());
    }

    #[test]
    fn clear_empties_the_store() {
        let mut history = ResultHistory::new();
        history.record(record("a.png"));
        history.record(record("b.png"));
        history.clear();
        assert!(history.is_empty());
        assert!(history.latest().is_none());
    }

    #[test]
    fn replay_renders_without_a_detector() {
        let mut history = ResultHistory::new();
        history.record(record("a.png"));

        let replayed = history.replay(0).unwrap();
        let expected = overlay::render(
            &history.get(0).unwrap().source,
            &history.get(0).unwrap().predictions,
        );
        assert_eq!(replayed.as_raw(), expected.as_raw());
        assert!(history.replay(1).is_none());
    }
}

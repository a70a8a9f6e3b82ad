use thiserror::Error;

/// Error taxonomy for the detection studio.
///
/// `ModelLoad` is fatal: the detector failed to initialize and every mode
/// stays disabled until the caller re-initializes. The remaining variants are
/// local to the action that raised them — they never stop a running loop and
/// never touch already-recorded history.
#[derive(Debug, Error)]
pub enum DetectError {
    /// Detector failed to initialize. User must reload; no automatic retry.
    #[error("model failed to load: {0}")]
    ModelLoad(String),

    /// A single `detect` call failed. Transient; the loop continues.
    #[error("inference failed: {0}")]
    Inference(String),

    /// Wrong file type, oversize file, or undecodable payload.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Camera permission denied or device unavailable.
    #[error("media acquisition failed: {0}")]
    MediaAcquisition(String),

    /// Plumbing failure with no user-correctable action (e.g. encoder error).
    #[error("operation failed: {0}")]
    Internal(String),
}

impl DetectError {
    /// Fatal errors disable dependent functionality globally.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DetectError::ModelLoad(_))
    }
}

pub type DetectResult<T> = Result<T, DetectError>;

//! Canvas export.
//!
//! Snapshots whatever the canvas currently shows, encodes it as PNG, and
//! names the blob with a millisecond timestamp so repeated exports never
//! collide. Exporting observes the canvas; it never re-runs detection.

use std::io::Cursor;

use crate::error::{DetectError, DetectResult};
use crate::now_epoch_ms;
use crate::session::Canvas;

/// An encoded export, ready to hand to the host for saving.
pub struct ExportBlob {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Encode the current canvas contents as PNG.
pub fn export_canvas(canvas: &Canvas) -> DetectResult<ExportBlob> {
    let image = canvas
        .snapshot()
        .ok_or_else(|| DetectError::InvalidInput("nothing rendered to export".into()))?;

    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| DetectError::Internal(format!("png encode failed: {e}")))?;

    Ok(ExportBlob {
        file_name: format!("detection-result-{}.png", now_epoch_ms()),
        bytes,
    })
}

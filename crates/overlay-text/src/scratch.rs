//! Overlay scratch file.
//!
//! The text-draw filter reads the caption through `textfile=` so the
//! caption never has to survive filter-graph escaping.

use std::path::{Path, PathBuf};

use pitchpilot_common::error::{PitchpilotError, PitchpilotResult};

use crate::sanitize::{sanitize, SanitizedText};

/// Filename of the caption scratch file inside a render's work directory.
pub const OVERLAY_TEXT_FILE: &str = "overlay.txt";

/// A sanitized caption persisted for the encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayText {
    /// Script text as received.
    pub raw: String,

    /// Caption derived from `raw`.
    pub sanitized: SanitizedText,

    /// File holding exactly `sanitized`.
    pub scratch_file_path: PathBuf,
}

impl OverlayText {
    /// Sanitize `raw` and write it to `<work_dir>/overlay.txt`.
    ///
    /// Any previous content of the scratch file is replaced. A write
    /// failure is fatal to the render.
    pub fn prepare(raw: &str, work_dir: &Path) -> PitchpilotResult<Self> {
        let sanitized = sanitize(raw);
        let scratch_file_path = write_overlay_text_file(work_dir, &sanitized)?;
        tracing::debug!(
            path = %scratch_file_path.display(),
            chars = sanitized.len(),
            fallback = sanitized.is_fallback(),
            "Overlay text written"
        );
        Ok(Self {
            raw: raw.to_string(),
            sanitized,
            scratch_file_path,
        })
    }
}

/// Write `text` to `<work_dir>/overlay.txt`, creating `work_dir` if needed.
pub fn write_overlay_text_file(work_dir: &Path, text: &SanitizedText) -> PitchpilotResult<PathBuf> {
    std::fs::create_dir_all(work_dir).map_err(|e| {
        PitchpilotError::text(format!(
            "Failed to create work directory {}: {e}",
            work_dir.display()
        ))
    })?;

    let path = work_dir.join(OVERLAY_TEXT_FILE);
    std::fs::write(&path, text.as_str()).map_err(|e| {
        PitchpilotError::text(format!(
            "Failed to write overlay text {}: {e}",
            path.display()
        ))
    })?;

    Ok(path)
}

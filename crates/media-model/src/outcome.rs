//! Render outcome reported back to the caller.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::request::RenderId;

/// What happened to the caption overlay during a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayStatus {
    /// Caption burned into the video.
    Applied,
    /// No font was available, so no overlay was ever built.
    NotAttempted,
    /// The first attempt with overlay failed and the retry without it succeeded.
    DisabledAfterFailure,
}

/// Successful render result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOutcome {
    /// Invocation the outcome belongs to.
    pub render_id: RenderId,

    /// Rendered video file.
    pub output_path: PathBuf,

    /// Scratch file holding the sanitized caption.
    pub overlay_text_path: PathBuf,

    /// Caption overlay status.
    pub overlay: OverlayStatus,

    /// Whether title/outro cards were part of the graph.
    pub title_cards: bool,

    /// Number of encoder runs it took (1 or 2).
    pub attempts: u32,
}

impl RenderOutcome {
    /// True only when the overlay was attempted and then dropped.
    pub fn overlay_disabled(&self) -> bool {
        self.overlay == OverlayStatus::DisabledAfterFailure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(overlay: OverlayStatus) -> RenderOutcome {
        RenderOutcome {
            render_id: RenderId::new(),
            output_path: PathBuf::from("/tmp/pitchpilot/x/output.mp4"),
            overlay_text_path: PathBuf::from("/tmp/pitchpilot/x/overlay.txt"),
            overlay,
            title_cards: false,
            attempts: 1,
        }
    }

    #[test]
    fn test_never_attempted_is_not_disabled() {
        assert!(!outcome(OverlayStatus::NotAttempted).overlay_disabled());
        assert!(!outcome(OverlayStatus::Applied).overlay_disabled());
        assert!(outcome(OverlayStatus::DisabledAfterFailure).overlay_disabled());
    }

    #[test]
    fn test_overlay_status_serializes_snake_case() {
        let json = serde_json::to_string(&OverlayStatus::DisabledAfterFailure).unwrap();
        assert_eq!(json, "\"disabled_after_failure\"");
    }
}

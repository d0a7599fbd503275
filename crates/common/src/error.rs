//! Error types shared across PitchPilot crates.

use std::path::PathBuf;

/// Top-level error type for PitchPilot operations.
#[derive(Debug, thiserror::Error)]
pub enum PitchpilotError {
    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Asset error: {message}")]
    Assets { message: String },

    #[error("Overlay text error: {message}")]
    Text { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias using PitchpilotError.
pub type PitchpilotResult<T> = Result<T, PitchpilotError>;

impl PitchpilotError {
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn assets(msg: impl Into<String>) -> Self {
        Self::Assets {
            message: msg.into(),
        }
    }

    pub fn text(msg: impl Into<String>) -> Self {
        Self::Text {
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_message() {
        let err = PitchpilotError::render("ffmpeg exited with status 1");
        assert_eq!(err.to_string(), "Render error: ffmpeg exited with status 1");
    }

    #[test]
    fn test_io_error_is_transparent() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: PitchpilotError = io.into();
        assert_eq!(err.to_string(), "read-only");
    }
}

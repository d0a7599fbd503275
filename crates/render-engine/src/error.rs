//! Render failures and their retry classification.

use std::path::PathBuf;

use pitchpilot_common::error::PitchpilotError;

use crate::graph::GraphError;

/// Why a render attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The encoder ran and exited unsuccessfully.
    #[error("Encoder failed ({}): {message}", status_text(*.status))]
    Encoder {
        message: String,
        status: Option<i32>,
        stderr: String,
    },

    /// The encoder binary could not be launched.
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The encoder exceeded its wall-clock limit and was killed.
    #[error("Encoder timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The encoder reported success but left no usable file behind.
    #[error("Encoder produced no output at {path}")]
    MissingOutput { path: PathBuf },

    /// A required input file does not exist.
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid filter graph: {0}")]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RenderError {
    pub fn encoder(message: impl Into<String>, status: Option<i32>, stderr: impl Into<String>) -> Self {
        Self::Encoder {
            message: message.into(),
            status,
            stderr: stderr.into(),
        }
    }

    /// Only an encoder run that started and failed may be retried
    /// without the overlay. Launch failures, timeouts and graph errors
    /// would fail the same way again.
    pub fn is_retry_eligible(&self) -> bool {
        matches!(self, RenderError::Encoder { .. })
    }

    /// Captured encoder diagnostics, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            RenderError::Encoder { stderr, .. } if !stderr.is_empty() => Some(stderr),
            _ => None,
        }
    }
}

fn status_text(status: Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}

impl From<RenderError> for PitchpilotError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::NotFound { path } => PitchpilotError::FileNotFound { path },
            RenderError::Io(e) => PitchpilotError::Io(e),
            other => PitchpilotError::render(other.to_string()),
        }
    }
}

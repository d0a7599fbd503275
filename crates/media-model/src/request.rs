//! Render requests and their identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a single render invocation.
///
/// Also names the invocation's work directory, so two renders never
/// share scratch or output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderId(Uuid);

impl RenderId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RenderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_hyphenated())
    }
}

/// Input of one render: the script to caption the video with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Arbitrary script text, possibly empty or non-ASCII.
    #[serde(rename = "script")]
    pub script_text: String,
}

impl RenderRequest {
    pub fn new(script_text: impl Into<String>) -> Self {
        Self {
            script_text: script_text.into(),
        }
    }
}

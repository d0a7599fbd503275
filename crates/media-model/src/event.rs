//! Lifecycle events emitted while a render runs.
//!
//! Events are fire-and-forget notifications for progress UIs. They
//! serialize to the `{topic, payload, time}` envelope used by the event
//! relay, with the stage name in `payload.step`.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::request::RenderId;

/// Topic carrying every intermediate stage transition.
pub const PROGRESS_TOPIC: &str = "pitchpilot/video/progress";

/// Topic carrying the completion event.
pub const DONE_TOPIC: &str = "pitchpilot/video/done";

/// Named stage transitions of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Request accepted, nothing prepared yet.
    Start,
    /// Text and assets prepared, about to build the graph.
    RenderStart,
    /// Encoder process launched for the primary attempt.
    FfmpegStart,
    /// Retry without text overlay launched.
    OverlayDisabled,
    /// Render failed terminally.
    Error,
    /// Output file written.
    Done,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::RenderStart => "render-start",
            Stage::FfmpegStart => "ffmpeg-start",
            Stage::OverlayDisabled => "overlay-disabled",
            Stage::Error => "error",
            Stage::Done => "done",
        }
    }

    /// Relay topic the stage is published on.
    pub fn topic(self) -> &'static str {
        match self {
            Stage::Done => DONE_TOPIC,
            _ => PROGRESS_TOPIC,
        }
    }

    /// Whether no further events follow this one.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Error | Stage::Done)
    }
}

/// Stage-specific payload of a lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Stage that was entered.
    pub step: Stage,

    /// Render the event belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_id: Option<RenderId>,

    /// Failure description (only for `error`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Output file reference (only for `done`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// A single lifecycle notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub topic: String,
    pub payload: EventPayload,
    pub time: DateTime<Utc>,
}

impl LifecycleEvent {
    /// Create an event for `step`, stamped now.
    pub fn new(step: Stage) -> Self {
        Self {
            topic: step.topic().to_string(),
            payload: EventPayload {
                step,
                render_id: None,
                message: None,
                file: None,
            },
            time: Utc::now(),
        }
    }

    pub fn with_render_id(mut self, id: RenderId) -> Self {
        self.payload.render_id = Some(id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.payload.message = Some(message.into());
        self
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.payload.file = Some(file.into());
        self
    }

    pub fn stage(&self) -> Stage {
        self.payload.step
    }
}

/// Encoder progress snapshot, parsed from the encoder's progress stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderProgress {
    /// Output timestamp reached so far, in seconds.
    pub out_time_secs: f64,

    /// Frames written so far.
    pub frame: u64,

    /// Encode speed relative to realtime, when reported.
    pub speed: Option<f64>,

    /// Whether the encoder reported the end of its progress stream.
    pub complete: bool,
}

//! PitchPilot Render Engine
//!
//! Turns a script and a directory of stock clips into a captioned
//! 1280x720 video by driving ffmpeg with a generated filter graph.
//!
//! # Pipeline Architecture
//!
//! ```text
//! script ──► sanitize ──► overlay.txt ─────────────┐
//!                                                  │
//! clip1..3.mp4 ──┐                                 │
//!                ├── Resolve assets ──► Build graph ──► Encode (H.264)
//! bg.mp3 ────────┘    (skip missing)    (scale, fit,        │
//!                                        cards, concat,     ├─ ok ──► output.mp4
//!                                        caption, audio)    │
//!                                                           └─ fail ─► rebuild without
//!                                                                      overlay, encode once
//! ```
//!
//! Lifecycle events (`render-start`, `ffmpeg-start`, `overlay-disabled`,
//! `error`, `done`) go to a caller-supplied [`ProgressPublisher`].

pub mod assets;
pub mod builder;
pub mod command;
pub mod encoder;
pub mod error;
pub mod executor;
pub mod graph;
pub mod pipeline;
pub mod poster;
pub mod publisher;

pub use assets::AssetResolver;
pub use builder::{build_render_graph, CaptionPlacement, FitMode, GraphOptions, RenderGraph};
pub use command::EncodeCommand;
pub use encoder::{encoder_available, EncodeObserver, Encoder, FfmpegEncoder};
pub use error::RenderError;
pub use executor::{RenderExecutor, RenderPlan};
pub use graph::{FilterGraph, GraphError};
pub use pipeline::{PlannedRender, VideoPipeline, OUTPUT_FILE};
pub use poster::PosterExtractor;
pub use publisher::{
    ChannelPublisher, Fanout, NullPublisher, ProgressPublisher, PublisherMessage, TracingPublisher,
};

//! Poster frame extraction.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::command::poster_command;
use crate::encoder::{Encoder, NoopObserver};
use crate::error::RenderError;

/// Timestamp of the poster frame, in seconds.
pub const POSTER_AT_SECS: u32 = 1;

/// Extracts and caches a still frame next to a rendered video.
pub struct PosterExtractor {
    encoder: Arc<dyn Encoder>,
    program: PathBuf,
}

impl PosterExtractor {
    pub fn new(encoder: Arc<dyn Encoder>, program: PathBuf) -> Self {
        Self { encoder, program }
    }

    /// Where the poster for `video` lives.
    pub fn poster_path(video: &Path) -> PathBuf {
        video.with_extension("jpg")
    }

    /// Return the poster for `video`, extracting it on first request.
    pub async fn poster_for(&self, video: &Path) -> Result<PathBuf, RenderError> {
        if !video.is_file() {
            return Err(RenderError::NotFound {
                path: video.to_path_buf(),
            });
        }

        let poster = Self::poster_path(video);
        if poster.is_file() {
            tracing::debug!(path = %poster.display(), "Poster cached");
            return Ok(poster);
        }

        let command = poster_command(&self.program, video, &poster, POSTER_AT_SECS);
        self.encoder.run(&command, &NoopObserver).await?;

        if !poster.is_file() {
            return Err(RenderError::MissingOutput { path: poster });
        }
        tracing::info!(path = %poster.display(), "Poster extracted");
        Ok(poster)
    }
}

//! Asset resolution.
//!
//! Probes the configured assets directory for clips and background audio.
//! Missing files are skipped silently; zero clips is a valid outcome.

use std::path::{Path, PathBuf};

use pitchpilot_common::config::PipelineConfig;
use pitchpilot_media_model::assets::ResolvedAssets;

/// Probes a fixed, ordered list of candidate files.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    clip_candidates: Vec<PathBuf>,
    background_audio: PathBuf,
    font: PathBuf,
}

impl AssetResolver {
    pub fn new(clip_candidates: Vec<PathBuf>, background_audio: PathBuf, font: PathBuf) -> Self {
        Self {
            clip_candidates,
            background_audio,
            font,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.clip_paths(),
            config.background_audio_path(),
            config.font_path.clone(),
        )
    }

    /// Candidate clip paths, in priority order.
    pub fn clip_candidates(&self) -> &[PathBuf] {
        &self.clip_candidates
    }

    /// Collect the candidates that exist right now, preserving order.
    pub fn resolve(&self) -> ResolvedAssets {
        let clips: Vec<PathBuf> = self
            .clip_candidates
            .iter()
            .filter(|path| is_file(path))
            .cloned()
            .collect();

        let background_audio = Some(&self.background_audio)
            .filter(|path| is_file(path))
            .cloned();

        tracing::debug!(
            clips = clips.len(),
            candidates = self.clip_candidates.len(),
            audio = background_audio.is_some(),
            "Assets resolved"
        );

        ResolvedAssets::new(clips, background_audio)
    }

    /// The configured font, if it exists.
    pub fn font(&self) -> Option<&Path> {
        if is_file(&self.font) {
            Some(&self.font)
        } else {
            tracing::warn!(path = %self.font.display(), "Font not found, text overlays disabled");
            None
        }
    }
}

fn is_file(path: &Path) -> bool {
    path.is_file()
}

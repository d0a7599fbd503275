//! Resolved input assets for a render.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The concrete clip and audio inputs a render will use.
///
/// Produced once per invocation by probing the assets directory and never
/// mutated afterwards. An empty `clips` list is valid and makes the graph
/// builder substitute a synthetic filler segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAssets {
    /// Existing clip files, in candidate priority order.
    pub clips: Vec<PathBuf>,

    /// Background audio file, if present.
    pub background_audio: Option<PathBuf>,
}

impl ResolvedAssets {
    pub fn new(clips: Vec<PathBuf>, background_audio: Option<PathBuf>) -> Self {
        Self {
            clips,
            background_audio,
        }
    }

    /// Number of real clips found.
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    /// Number of body segments the video will contain (filler counts as one).
    pub fn segment_count(&self) -> usize {
        self.clips.len().max(1)
    }

    /// Whether a synthetic filler replaces the clips.
    pub fn needs_filler(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn has_background_audio(&self) -> bool {
        self.background_audio.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_assets_need_one_filler_segment() {
        let assets = ResolvedAssets::default();
        assert!(assets.needs_filler());
        assert_eq!(assets.segment_count(), 1);
        assert!(!assets.has_background_audio());
    }

    #[test]
    fn test_segment_count_tracks_clips() {
        let assets = ResolvedAssets::new(
            vec![PathBuf::from("a.mp4"), PathBuf::from("b.mp4")],
            Some(PathBuf::from("bg.mp3")),
        );
        assert!(!assets.needs_filler());
        assert_eq!(assets.clip_count(), 2);
        assert_eq!(assets.segment_count(), 2);
        assert!(assets.has_background_audio());
    }
}

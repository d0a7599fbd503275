//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the encoder binary.
pub const FFMPEG_PATH_ENV: &str = "FFMPEG_PATH";

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Render pipeline locations and limits.
    pub pipeline: PipelineConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Operator-level settings for the render pipeline.
///
/// Resolution, frame rate and segment durations are fixed by the render
/// engine; only filesystem locations and process limits live here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory probed for clips and background audio.
    pub assets_dir: PathBuf,

    /// Clip filenames inside `assets_dir`, in priority order.
    pub clip_candidates: Vec<String>,

    /// Background audio filename inside `assets_dir`.
    pub background_audio: String,

    /// Font used by every text-draw stage.
    pub font_path: PathBuf,

    /// Root under which each render gets its own work directory.
    pub output_root: PathBuf,

    /// Explicit encoder binary. `FFMPEG_PATH` takes precedence.
    pub ffmpeg_path: Option<PathBuf>,

    /// Wall-clock ceiling for a single encoder run.
    pub encode_timeout_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "pitchpilot=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("public").join("video").join("assets"),
            clip_candidates: vec![
                "clip1.mp4".to_string(),
                "clip2.mp4".to_string(),
                "clip3.mp4".to_string(),
            ],
            background_audio: "bg.mp3".to_string(),
            font_path: PathBuf::from("public").join("fonts").join("DejaVuSans.ttf"),
            output_root: std::env::temp_dir().join("pitchpilot"),
            ffmpeg_path: None,
            encode_timeout_secs: 60,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl PipelineConfig {
    /// Encoder binary to invoke, honoring the `FFMPEG_PATH` override.
    pub fn ffmpeg_binary(&self) -> PathBuf {
        resolve_ffmpeg_binary(
            std::env::var(FFMPEG_PATH_ENV).ok(),
            self.ffmpeg_path.as_deref(),
        )
    }

    /// Absolute-or-relative path of every clip candidate, in priority order.
    pub fn clip_paths(&self) -> Vec<PathBuf> {
        self.clip_candidates
            .iter()
            .map(|name| self.assets_dir.join(name))
            .collect()
    }

    /// Path of the background audio candidate.
    pub fn background_audio_path(&self) -> PathBuf {
        self.assets_dir.join(&self.background_audio)
    }
}

/// Pick the encoder binary: a non-blank env override wins, then the
/// configured path, then `ffmpeg` from `PATH`.
pub fn resolve_ffmpeg_binary(env_override: Option<String>, configured: Option<&Path>) -> PathBuf {
    if let Some(raw) = env_override {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    configured
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("ffmpeg"))
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit file, falling back to defaults.
    pub fn load_from(config_path: &Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&config_file_path())
    }

    /// Save config to an explicit file.
    pub fn save_to(&self, config_path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("pitchpilot").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_override_wins() {
        let bin = resolve_ffmpeg_binary(
            Some("  /opt/ffmpeg/bin/ffmpeg ".to_string()),
            Some(Path::new("/usr/local/bin/ffmpeg")),
        );
        assert_eq!(bin, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
    }

    #[test]
    fn test_blank_env_override_is_ignored() {
        let bin = resolve_ffmpeg_binary(Some("   ".to_string()), None);
        assert_eq!(bin, PathBuf::from("ffmpeg"));

        let bin = resolve_ffmpeg_binary(None, Some(Path::new("/usr/local/bin/ffmpeg")));
        assert_eq!(bin, PathBuf::from("/usr/local/bin/ffmpeg"));
    }

    #[test]
    fn test_default_clip_candidates_keep_priority_order() {
        let config = PipelineConfig::default();
        let paths = config.clip_paths();
        assert_eq!(paths.len(), 3);
        assert!(paths[0].ends_with("clip1.mp4"));
        assert!(paths[2].ends_with("clip3.mp4"));
        assert!(config.background_audio_path().ends_with("bg.mp3"));
        assert_eq!(config.encode_timeout_secs, 60);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.pipeline.encode_timeout_secs = 15;
        config.logging.json = true;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.pipeline.encode_timeout_secs, 15);
        assert!(loaded.logging.json);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"pipeline":{"assets_dir":"/srv/assets"}}"#).unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.pipeline.assets_dir, PathBuf::from("/srv/assets"));
        assert_eq!(loaded.pipeline.background_audio, "bg.mp3");
        assert_eq!(loaded.logging.level, "info");
    }

    #[test]
    fn test_unparsable_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.pipeline.clip_candidates.len(), 3);
    }
}

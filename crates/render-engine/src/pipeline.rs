//! End-to-end render orchestration.
//!
//! Ties the text sanitizer, asset resolver and executor together for one
//! request. Every invocation works inside its own directory under the
//! configured output root, named after its [`RenderId`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use pitchpilot_common::config::PipelineConfig;
use pitchpilot_common::error::{PitchpilotError, PitchpilotResult};
use pitchpilot_media_model::assets::ResolvedAssets;
use pitchpilot_media_model::event::{LifecycleEvent, Stage};
use pitchpilot_media_model::outcome::RenderOutcome;
use pitchpilot_media_model::request::{RenderId, RenderRequest};
use pitchpilot_overlay_text::scratch::{OverlayText, OVERLAY_TEXT_FILE};

use crate::assets::AssetResolver;
use crate::builder::{GraphOptions, RenderGraph};
use crate::command::{
    placeholder_audio_command, placeholder_clip_command, render_command, EncodeCommand,
};
use crate::encoder::{Encoder, FfmpegEncoder, NoopObserver};
use crate::executor::{RenderExecutor, RenderPlan};
use crate::poster::PosterExtractor;
use crate::publisher::ProgressPublisher;

/// Filename of the rendered video inside a work directory.
pub const OUTPUT_FILE: &str = "output.mp4";

/// Colors and tones of the generated placeholder clips, in clip order.
pub const PLACEHOLDER_CLIPS: [(&str, u32); 3] = [("blue", 440), ("green", 523), ("red", 659)];
const PLACEHOLDER_CLIP_SECS: u32 = 4;
const PLACEHOLDER_AUDIO_HZ: u32 = 220;
const PLACEHOLDER_AUDIO_SECS: u32 = 20;

/// What a render would do right now, without running it.
#[derive(Debug, Clone)]
pub struct PlannedRender {
    pub assets: ResolvedAssets,
    pub font: Option<PathBuf>,
    pub graph: RenderGraph,
    pub command: EncodeCommand,
}

/// The video generation pipeline.
pub struct VideoPipeline {
    config: PipelineConfig,
    resolver: AssetResolver,
    executor: RenderExecutor,
    posters: PosterExtractor,
    options: GraphOptions,
}

impl VideoPipeline {
    /// Pipeline running the configured ffmpeg binary.
    pub fn new(config: PipelineConfig) -> Self {
        let encoder = match config.encode_timeout_secs {
            0 => FfmpegEncoder::new(),
            secs => FfmpegEncoder::with_timeout(Duration::from_secs(secs)),
        };
        Self::with_encoder(config, Arc::new(encoder))
    }

    /// Pipeline running a custom encoder backend.
    pub fn with_encoder(config: PipelineConfig, encoder: Arc<dyn Encoder>) -> Self {
        let program = config.ffmpeg_binary();
        Self {
            resolver: AssetResolver::from_config(&config),
            executor: RenderExecutor::new(encoder.clone(), program.clone()),
            posters: PosterExtractor::new(encoder, program),
            options: GraphOptions::default(),
            config,
        }
    }

    /// Use a different graph variant for subsequent renders.
    pub fn with_options(mut self, options: GraphOptions) -> Self {
        self.options = options;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn options(&self) -> &GraphOptions {
        &self.options
    }

    pub fn resolver(&self) -> &AssetResolver {
        &self.resolver
    }

    /// Encoder binary every command runs.
    pub fn program(&self) -> &Path {
        self.executor.program()
    }

    /// Private directory of render `id`.
    pub fn work_dir(&self, id: RenderId) -> PathBuf {
        self.config.output_root.join(id.to_string())
    }

    /// Render `request` under a fresh id.
    pub async fn render(
        &self,
        request: &RenderRequest,
        publisher: &dyn ProgressPublisher,
    ) -> PitchpilotResult<RenderOutcome> {
        self.render_with_id(RenderId::new(), request, publisher).await
    }

    /// Render `request` as invocation `render_id`.
    ///
    /// Emits `start` before any work and `error` if preparation fails;
    /// the executor takes over from `render-start` on.
    pub async fn render_with_id(
        &self,
        render_id: RenderId,
        request: &RenderRequest,
        publisher: &dyn ProgressPublisher,
    ) -> PitchpilotResult<RenderOutcome> {
        publisher.publish(LifecycleEvent::new(Stage::Start).with_render_id(render_id));

        let work_dir = self.work_dir(render_id);
        let overlay = match OverlayText::prepare(&request.script_text, &work_dir) {
            Ok(overlay) => overlay,
            Err(e) => {
                tracing::error!(%render_id, error = %e, "Failed to prepare overlay text");
                remove_work_dir(&work_dir);
                publisher.publish(
                    LifecycleEvent::new(Stage::Error)
                        .with_render_id(render_id)
                        .with_message(e.to_string()),
                );
                return Err(e);
            }
        };

        let assets = self.resolver.resolve();
        let font = self.resolver.font();
        let output = work_dir.join(OUTPUT_FILE);

        tracing::info!(
            %render_id,
            work_dir = %work_dir.display(),
            caption_fallback = overlay.sanitized.is_fallback(),
            "Render accepted"
        );

        let plan = RenderPlan {
            render_id,
            assets: &assets,
            overlay_text_file: &overlay.scratch_file_path,
            font,
            options: self.options,
            output_path: &output,
        };

        match self.executor.render(&plan, publisher).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                remove_work_dir(&work_dir);
                Err(e.into())
            }
        }
    }

    /// Delete the work directory of a finished render, poster included.
    ///
    /// Returns `false` if there was nothing to delete.
    pub fn discard(&self, id: RenderId) -> PitchpilotResult<bool> {
        let work_dir = self.work_dir(id);
        match std::fs::remove_dir_all(&work_dir) {
            Ok(()) => {
                tracing::info!(render_id = %id, work_dir = %work_dir.display(), "Render discarded");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve assets and build the command a render would run, without
    /// writing or running anything.
    pub fn plan(&self) -> PitchpilotResult<PlannedRender> {
        let render_id = RenderId::new();
        let work_dir = self.work_dir(render_id);
        let assets = self.resolver.resolve();
        let font = self.resolver.font().map(Path::to_path_buf);
        let output = work_dir.join(OUTPUT_FILE);
        let text_file = work_dir.join(OVERLAY_TEXT_FILE);

        let plan = RenderPlan {
            render_id,
            assets: &assets,
            overlay_text_file: &text_file,
            font: font.as_deref(),
            options: self.options,
            output_path: &output,
        };
        let graph = plan.graph(true)?;
        let command = render_command(self.program(), &graph, &output);

        Ok(PlannedRender {
            assets,
            font,
            graph,
            command,
        })
    }

    /// Poster frame for a rendered video, extracted on first request.
    pub async fn poster(&self, video: &Path) -> PitchpilotResult<PathBuf> {
        Ok(self.posters.poster_for(video).await?)
    }

    /// Write synthetic clips and background audio into the assets
    /// directory. Existing files are kept unless `overwrite` is set.
    pub async fn generate_placeholder_assets(&self, overwrite: bool) -> PitchpilotResult<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.config.assets_dir).map_err(|e| {
            PitchpilotError::assets(format!(
                "Failed to create assets directory {}: {e}",
                self.config.assets_dir.display()
            ))
        })?;

        let program = self.program();
        let mut commands: Vec<EncodeCommand> = self
            .config
            .clip_paths()
            .iter()
            .zip(PLACEHOLDER_CLIPS)
            .map(|(path, (color, hz))| {
                placeholder_clip_command(program, path, color, hz, PLACEHOLDER_CLIP_SECS)
            })
            .collect();
        commands.push(placeholder_audio_command(
            program,
            &self.config.background_audio_path(),
            PLACEHOLDER_AUDIO_HZ,
            PLACEHOLDER_AUDIO_SECS,
        ));

        let mut written = Vec::new();
        for command in commands {
            if command.output_path.exists() && !overwrite {
                tracing::info!(path = %command.output_path.display(), "Asset exists, skipping");
                continue;
            }
            self.executor
                .encoder()
                .run(&command, &NoopObserver)
                .await
                .map_err(|e| {
                    PitchpilotError::assets(format!(
                        "Failed to generate {}: {e}",
                        command.output_path.display()
                    ))
                })?;
            tracing::info!(path = %command.output_path.display(), "Asset generated");
            written.push(command.output_path);
        }
        Ok(written)
    }
}

/// Best-effort removal of a failed render's work directory.
fn remove_work_dir(work_dir: &Path) {
    if !work_dir.is_dir() {
        return;
    }
    match std::fs::remove_dir_all(work_dir) {
        Ok(()) => tracing::debug!(work_dir = %work_dir.display(), "Removed work directory"),
        Err(e) => tracing::warn!(
            work_dir = %work_dir.display(),
            error = %e,
            "Failed to remove work directory"
        ),
    }
}

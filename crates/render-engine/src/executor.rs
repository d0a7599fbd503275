//! Render executor with the drop-overlay-and-retry-once policy.
//!
//! ```text
//!   primary graph ──► encoder ──ok──────────────────────────► done
//!                        │
//!                        └─err (encoder, overlay present)
//!                              │
//!                              ▼
//!   graph without overlay ──► encoder ──ok──► done (overlay disabled)
//!                                │
//!                                └─err──► error
//! ```
//!
//! Any other failure is terminal: no overlay to drop, a launch failure,
//! a timeout, or a failed retry.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pitchpilot_media_model::assets::ResolvedAssets;
use pitchpilot_media_model::event::{LifecycleEvent, RenderProgress, Stage};
use pitchpilot_media_model::outcome::{OverlayStatus, RenderOutcome};
use pitchpilot_media_model::request::RenderId;

use crate::builder::{build_render_graph, GraphOptions, RenderGraph};
use crate::command::render_command;
use crate::encoder::{EncodeObserver, Encoder};
use crate::error::RenderError;
use crate::publisher::ProgressPublisher;

/// Everything one render needs, prepared by the caller.
#[derive(Debug, Clone)]
pub struct RenderPlan<'a> {
    pub render_id: RenderId,
    pub assets: &'a ResolvedAssets,
    /// Scratch file holding the sanitized caption.
    pub overlay_text_file: &'a Path,
    /// Font for text-draw stages; `None` disables every overlay.
    pub font: Option<&'a Path>,
    pub options: GraphOptions,
    pub output_path: &'a Path,
}

impl RenderPlan<'_> {
    /// Build the graph for this plan, optionally without text stages.
    pub fn graph(&self, overlay: bool) -> Result<RenderGraph, RenderError> {
        let options = if overlay {
            self.options
        } else {
            self.options.without_overlay()
        };
        Ok(build_render_graph(
            self.assets,
            self.overlay_text_file,
            self.font,
            &options,
        )?)
    }
}

/// Drives the encoder for a [`RenderPlan`].
pub struct RenderExecutor {
    encoder: Arc<dyn Encoder>,
    program: PathBuf,
}

impl RenderExecutor {
    pub fn new(encoder: Arc<dyn Encoder>, program: PathBuf) -> Self {
        Self { encoder, program }
    }

    /// Encoder binary passed to every command.
    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn encoder(&self) -> &Arc<dyn Encoder> {
        &self.encoder
    }

    /// Render `plan`, retrying once without the overlay if the first
    /// encoder run fails while an overlay was present.
    ///
    /// Publishes `render-start`, `ffmpeg-start`, optionally
    /// `overlay-disabled`, then exactly one of `done` or `error`.
    pub async fn render(
        &self,
        plan: &RenderPlan<'_>,
        publisher: &dyn ProgressPublisher,
    ) -> Result<RenderOutcome, RenderError> {
        publisher.publish(LifecycleEvent::new(Stage::RenderStart).with_render_id(plan.render_id));

        match self.render_inner(plan, publisher).await {
            Ok(outcome) => {
                publisher.publish(
                    LifecycleEvent::new(Stage::Done)
                        .with_render_id(plan.render_id)
                        .with_file(&outcome.output_path),
                );
                Ok(outcome)
            }
            Err(err) => {
                tracing::error!(render_id = %plan.render_id, error = %err, "Render failed");
                remove_partial_output(plan.output_path);
                publisher.publish(
                    LifecycleEvent::new(Stage::Error)
                        .with_render_id(plan.render_id)
                        .with_message(err.to_string()),
                );
                Err(err)
            }
        }
    }

    async fn render_inner(
        &self,
        plan: &RenderPlan<'_>,
        publisher: &dyn ProgressPublisher,
    ) -> Result<RenderOutcome, RenderError> {
        let primary = plan.graph(true)?;
        tracing::info!(
            render_id = %plan.render_id,
            clips = plan.assets.clip_count(),
            has_audio = primary.has_audio,
            font = plan.font.is_some(),
            overlay = primary.has_overlay,
            title_cards = primary.options.title_cards,
            "Starting render"
        );

        // Unwritable destinations are fatal, never retried.
        prepare_output(plan.output_path)?;

        let observer = StageObserver {
            render_id: plan.render_id,
            start_stage: Some(Stage::FfmpegStart),
            publisher,
        };
        let first = self.attempt(&primary, plan.output_path, &observer).await;

        let (status, attempts) = match first {
            Ok(()) => {
                let status = if primary.has_overlay {
                    OverlayStatus::Applied
                } else {
                    OverlayStatus::NotAttempted
                };
                (status, 1)
            }
            Err(err) if err.is_retry_eligible() && primary.has_overlay => {
                tracing::warn!(
                    render_id = %plan.render_id,
                    error = %err,
                    stderr = err.stderr().unwrap_or_default(),
                    "Render with overlay failed, retrying without it"
                );
                remove_partial_output(plan.output_path);

                let fallback = plan.graph(false)?;
                publisher.publish(
                    LifecycleEvent::new(Stage::OverlayDisabled).with_render_id(plan.render_id),
                );
                let observer = StageObserver {
                    render_id: plan.render_id,
                    start_stage: None,
                    publisher,
                };
                self.attempt(&fallback, plan.output_path, &observer).await?;
                (OverlayStatus::DisabledAfterFailure, 2)
            }
            Err(err) => return Err(err),
        };

        verify_output(plan.output_path)?;

        Ok(RenderOutcome {
            render_id: plan.render_id,
            output_path: plan.output_path.to_path_buf(),
            overlay_text_path: plan.overlay_text_file.to_path_buf(),
            overlay: status,
            title_cards: primary.options.title_cards,
            attempts,
        })
    }

    async fn attempt(
        &self,
        graph: &RenderGraph,
        output: &Path,
        observer: &StageObserver<'_>,
    ) -> Result<(), RenderError> {
        let command = render_command(&self.program, graph, output);
        tracing::debug!(
            encoder = self.encoder.name(),
            overlay = graph.has_overlay,
            command = %command.display_line(),
            "Launching encoder"
        );
        self.encoder.run(&command, observer).await
    }
}

/// Bridges encoder notifications to the publisher.
struct StageObserver<'a> {
    render_id: RenderId,
    /// Stage published when the process launches.
    start_stage: Option<Stage>,
    publisher: &'a dyn ProgressPublisher,
}

impl EncodeObserver for StageObserver<'_> {
    fn started(&self, pid: Option<u32>) {
        tracing::debug!(render_id = %self.render_id, ?pid, "Encoder running");
        if let Some(stage) = self.start_stage {
            self.publisher
                .publish(LifecycleEvent::new(stage).with_render_id(self.render_id));
        }
    }

    fn progress(&self, progress: RenderProgress) {
        self.publisher.progress(self.render_id, progress);
    }
}

fn prepare_output(path: &Path) -> Result<(), RenderError> {
    std::fs::File::create(path)?;
    Ok(())
}

fn verify_output(path: &Path) -> Result<(), RenderError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        _ => Err(RenderError::MissingOutput {
            path: path.to_path_buf(),
        }),
    }
}

fn remove_partial_output(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial output"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::EncodeCommand;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Encoder that fails the runs listed in `fail_on` (1-based).
    struct Scripted {
        fail_on: Vec<usize>,
        runs: Mutex<Vec<EncodeCommand>>,
    }

    impl Scripted {
        fn new(fail_on: &[usize]) -> Arc<Self> {
            Arc::new(Self {
                fail_on: fail_on.to_vec(),
                runs: Mutex::new(Vec::new()),
            })
        }

        fn graphs(&self) -> Vec<String> {
            self.runs
                .lock()
                .unwrap()
                .iter()
                .map(|cmd| {
                    let i = cmd.args.iter().position(|a| a == "-filter_complex").unwrap();
                    cmd.args[i + 1].clone()
                })
                .collect()
        }
    }

    #[async_trait]
    impl Encoder for Scripted {
        async fn run(&self, command: &EncodeCommand, observer: &dyn EncodeObserver) -> Result<(), RenderError> {
            let run = {
                let mut runs = self.runs.lock().unwrap();
                runs.push(command.clone());
                runs.len()
            };
            observer.started(Some(4242));
            // Leave a partial file behind either way.
            std::fs::write(&command.output_path, b"mp4")?;
            if self.fail_on.contains(&run) {
                return Err(RenderError::encoder("drawtext failed", Some(1), "Error: drawtext"));
            }
            Ok(())
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
        assets: ResolvedAssets,
        font: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let font = dir.path().join("font.ttf");
            std::fs::write(&font, b"ttf").unwrap();
            std::fs::write(dir.path().join("overlay.txt"), b"Caption").unwrap();
            Self {
                assets: ResolvedAssets::new(vec![dir.path().join("clip1.mp4")], None),
                dir,
                font,
            }
        }

        fn text(&self) -> PathBuf {
            self.dir.path().join("overlay.txt")
        }

        fn output(&self) -> PathBuf {
            self.dir.path().join("output.mp4")
        }
    }

    fn stages(events: &Mutex<Vec<LifecycleEvent>>) -> Vec<Stage> {
        events.lock().unwrap().iter().map(LifecycleEvent::stage).collect()
    }

    async fn run(
        fixture: &Fixture,
        encoder: Arc<Scripted>,
        with_font: bool,
        events: &Mutex<Vec<LifecycleEvent>>,
    ) -> Result<RenderOutcome, RenderError> {
        let executor = RenderExecutor::new(encoder, PathBuf::from("ffmpeg"));
        let text = fixture.text();
        let output = fixture.output();
        let plan = RenderPlan {
            render_id: RenderId::new(),
            assets: &fixture.assets,
            overlay_text_file: &text,
            font: with_font.then_some(fixture.font.as_path()),
            options: GraphOptions::classic(),
            output_path: &output,
        };
        let publisher = |event: LifecycleEvent| events.lock().unwrap().push(event);
        executor.render(&plan, &publisher).await
    }

    #[tokio::test]
    async fn test_success_with_overlay() {
        let fixture = Fixture::new();
        let encoder = Scripted::new(&[]);
        let events = Mutex::new(Vec::new());

        let outcome = run(&fixture, encoder.clone(), true, &events).await.unwrap();
        assert_eq!(outcome.overlay, OverlayStatus::Applied);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(
            stages(&events),
            vec![Stage::RenderStart, Stage::FfmpegStart, Stage::Done]
        );
        let done = events.lock().unwrap().last().cloned().unwrap();
        assert_eq!(done.payload.file, Some(fixture.output()));
        assert!(encoder.graphs()[0].contains("drawtext"));
    }

    #[tokio::test]
    async fn test_first_failure_retries_without_overlay() {
        let fixture = Fixture::new();
        let encoder = Scripted::new(&[1]);
        let events = Mutex::new(Vec::new());

        let outcome = run(&fixture, encoder.clone(), true, &events).await.unwrap();
        assert_eq!(outcome.overlay, OverlayStatus::DisabledAfterFailure);
        assert!(outcome.overlay_disabled());
        assert_eq!(outcome.attempts, 2);
        assert_eq!(
            stages(&events),
            vec![
                Stage::RenderStart,
                Stage::FfmpegStart,
                Stage::OverlayDisabled,
                Stage::Done
            ]
        );

        let graphs = encoder.graphs();
        assert_eq!(graphs.len(), 2);
        assert!(graphs[0].contains("drawtext"));
        assert!(!graphs[1].contains("drawtext"));
    }

    #[tokio::test]
    async fn test_second_failure_is_fatal_and_cleans_up() {
        let fixture = Fixture::new();
        let encoder = Scripted::new(&[1, 2]);
        let events = Mutex::new(Vec::new());

        let err = run(&fixture, encoder.clone(), true, &events).await.unwrap_err();
        assert!(matches!(err, RenderError::Encoder { .. }));
        assert_eq!(encoder.graphs().len(), 2);
        assert_eq!(
            stages(&events),
            vec![
                Stage::RenderStart,
                Stage::FfmpegStart,
                Stage::OverlayDisabled,
                Stage::Error
            ]
        );
        let error = events.lock().unwrap().last().cloned().unwrap();
        assert!(error.payload.message.unwrap().contains("drawtext failed"));
        assert!(!fixture.output().exists());
    }

    #[tokio::test]
    async fn test_failure_without_overlay_is_not_retried() {
        let fixture = Fixture::new();
        let encoder = Scripted::new(&[1]);
        let events = Mutex::new(Vec::new());

        run(&fixture, encoder.clone(), false, &events).await.unwrap_err();
        assert_eq!(encoder.graphs().len(), 1);
        assert_eq!(
            stages(&events),
            vec![Stage::RenderStart, Stage::FfmpegStart, Stage::Error]
        );
    }

    #[tokio::test]
    async fn test_no_font_is_not_attempted() {
        let fixture = Fixture::new();
        let encoder = Scripted::new(&[]);
        let events = Mutex::new(Vec::new());

        let outcome = run(&fixture, encoder.clone(), false, &events).await.unwrap();
        assert_eq!(outcome.overlay, OverlayStatus::NotAttempted);
        assert!(!outcome.overlay_disabled());
        assert!(!encoder.graphs()[0].contains("drawtext"));
    }

    #[tokio::test]
    async fn test_unwritable_output_fails_before_encoding() {
        let fixture = Fixture::new();
        let encoder = Scripted::new(&[]);
        let executor = RenderExecutor::new(encoder.clone(), PathBuf::from("ffmpeg"));
        let text = fixture.text();
        let output = fixture.dir.path().join("missing").join("output.mp4");
        let plan = RenderPlan {
            render_id: RenderId::new(),
            assets: &fixture.assets,
            overlay_text_file: &text,
            font: Some(fixture.font.as_path()),
            options: GraphOptions::classic(),
            output_path: &output,
        };
        let events = Mutex::new(Vec::new());
        let publisher = |event: LifecycleEvent| events.lock().unwrap().push(event);

        let err = executor.render(&plan, &publisher).await.unwrap_err();
        assert!(matches!(err, RenderError::Io(_)));
        assert!(!err.is_retry_eligible());
        assert!(encoder.graphs().is_empty());
        assert_eq!(stages(&events), vec![Stage::RenderStart, Stage::Error]);
    }

    #[tokio::test]
    async fn test_timeout_is_not_retried() {
        struct Slow(Mutex<usize>);

        #[async_trait]
        impl Encoder for Slow {
            async fn run(&self, _command: &EncodeCommand, _observer: &dyn EncodeObserver) -> Result<(), RenderError> {
                *self.0.lock().unwrap() += 1;
                Err(RenderError::Timeout { secs: 60 })
            }

            fn name(&self) -> &str {
                "slow"
            }
        }

        let fixture = Fixture::new();
        let encoder = Arc::new(Slow(Mutex::new(0)));
        let executor = RenderExecutor::new(encoder.clone(), PathBuf::from("ffmpeg"));
        let text = fixture.text();
        let output = fixture.output();
        let plan = RenderPlan {
            render_id: RenderId::new(),
            assets: &fixture.assets,
            overlay_text_file: &text,
            font: Some(fixture.font.as_path()),
            options: GraphOptions::enhanced(),
            output_path: &output,
        };

        let err = executor.render(&plan, &crate::publisher::NullPublisher).await.unwrap_err();
        assert!(matches!(err, RenderError::Timeout { secs: 60 }));
        assert_eq!(*encoder.0.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_success_without_file_is_missing_output() {
        struct Liar;

        #[async_trait]
        impl Encoder for Liar {
            async fn run(&self, _command: &EncodeCommand, _observer: &dyn EncodeObserver) -> Result<(), RenderError> {
                Ok(())
            }

            fn name(&self) -> &str {
                "liar"
            }
        }

        let fixture = Fixture::new();
        let executor = RenderExecutor::new(Arc::new(Liar), PathBuf::from("ffmpeg"));
        let text = fixture.text();
        let output = fixture.output();
        let plan = RenderPlan {
            render_id: RenderId::new(),
            assets: &fixture.assets,
            overlay_text_file: &text,
            font: None,
            options: GraphOptions::classic(),
            output_path: &output,
        };

        let err = executor.render(&plan, &crate::publisher::NullPublisher).await.unwrap_err();
        assert!(matches!(err, RenderError::MissingOutput { .. }));
    }
}

//! Encoder process execution.
//!
//! [`Encoder`] is the seam between the render executor and the external
//! ffmpeg process, so the retry policy can be exercised without a real
//! encoder installed.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use pitchpilot_media_model::event::RenderProgress;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use crate::command::EncodeCommand;
use crate::error::RenderError;

/// Receives notifications from a running encoder.
pub trait EncodeObserver: Send + Sync {
    /// The process was launched.
    fn started(&self, pid: Option<u32>);

    /// A progress block was parsed.
    fn progress(&self, _progress: RenderProgress) {}
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl EncodeObserver for NoopObserver {
    fn started(&self, _pid: Option<u32>) {}
}

/// Runs an [`EncodeCommand`] to completion.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Run the command. `Ok` means the process exited successfully.
    async fn run(&self, command: &EncodeCommand, observer: &dyn EncodeObserver) -> Result<(), RenderError>;

    /// Human-readable backend name.
    fn name(&self) -> &str;
}

/// Encoder backed by an ffmpeg child process.
#[derive(Debug, Clone, Default)]
pub struct FfmpegEncoder {
    timeout: Option<Duration>,
}

impl FfmpegEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill the process if it runs longer than `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    async fn run_inner(&self, command: &EncodeCommand, observer: &dyn EncodeObserver) -> Result<(), RenderError> {
        let program = command.program.display().to_string();
        tracing::debug!(program = %program, args = ?command.args, "Running encoder");

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|source| RenderError::Spawn {
            program: program.clone(),
            source,
        })?;

        tracing::info!(pid = child.id(), args_len = command.args.len(), "Encoder process started");
        observer.started(child.id());

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RenderError::encoder("Failed to capture encoder stdout", None, ""))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| RenderError::encoder("Failed to capture encoder stderr", None, ""))?;

        // Drain stderr concurrently so a chatty encoder never blocks on a full pipe.
        let stderr_task = tokio::spawn(async move {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output).await {
                Ok(_) => output,
                Err(err) => format!("<failed to read encoder stderr: {err}>"),
            }
        });

        let mut lines = BufReader::new(stdout).lines();
        let mut state = ProgressState::default();
        while let Some(line) = lines.next_line().await? {
            let trimmed = line.trim();
            if let Some((key, value)) = trimmed.split_once('=') {
                if state.update(key, value) {
                    observer.progress(state.snapshot());
                }
            }
        }

        let status = child.wait().await?;
        let stderr_output = stderr_task
            .await
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        tracing::debug!(
            elapsed_secs = start.elapsed().as_secs_f64(),
            out_time_secs = state.out_time_secs,
            %status,
            "Encoder exited"
        );

        if !status.success() {
            let stderr_output = stderr_output.trim().to_string();
            let message = stderr_output
                .lines()
                .last()
                .unwrap_or("no diagnostics")
                .to_string();
            return Err(RenderError::encoder(message, status.code(), stderr_output));
        }

        Ok(())
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn run(&self, command: &EncodeCommand, observer: &dyn EncodeObserver) -> Result<(), RenderError> {
        let Some(limit) = self.timeout else {
            return self.run_inner(command, observer).await;
        };

        // Dropping the in-flight future drops the child, and kill_on_drop reaps it.
        let result = tokio::time::timeout(limit, self.run_inner(command, observer)).await;
        match result {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(secs = limit.as_secs(), "Encoder timed out, killed");
                Err(RenderError::Timeout {
                    secs: limit.as_secs(),
                })
            }
        }
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Whether `program` can be launched at all.
pub async fn encoder_available(program: &std::path::Path) -> bool {
    Command::new(program)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Accumulates `key=value` lines of ffmpeg's `-progress` stream.
#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    frame: u64,
    speed: Option<f64>,
    complete: bool,
}

impl ProgressState {
    /// Apply one line. Returns true when a progress block is complete.
    fn update(&mut self, key: &str, value: &str) -> bool {
        match key {
            // out_time_ms is microseconds despite its name.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "frame" => {
                if let Ok(frame) = value.parse::<u64>() {
                    self.frame = frame;
                }
            }
            "speed" => {
                self.speed = value.trim_end_matches('x').trim().parse::<f64>().ok();
            }
            "progress" => {
                self.complete = value == "end";
                return true;
            }
            _ => {}
        }
        false
    }

    fn snapshot(&self) -> RenderProgress {
        RenderProgress {
            out_time_secs: self.out_time_secs,
            frame: self.frame,
            speed: self.speed,
            complete: self.complete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[test]
    fn test_progress_state_parses_block() {
        let mut state = ProgressState::default();
        assert!(!state.update("frame", "90"));
        assert!(!state.update("out_time_us", "3000000"));
        assert!(!state.update("speed", "1.5x"));
        assert!(state.update("progress", "continue"));

        let snap = state.snapshot();
        assert_eq!(snap.frame, 90);
        assert!((snap.out_time_secs - 3.0).abs() < f64::EPSILON);
        assert_eq!(snap.speed, Some(1.5));
        assert!(!snap.complete);

        state.update("speed", "N/A");
        assert!(state.update("progress", "end"));
        assert!(state.snapshot().complete);
        assert_eq!(state.snapshot().speed, None);
    }

    #[test]
    fn test_progress_state_ignores_garbage() {
        let mut state = ProgressState::default();
        state.update("out_time_ms", "N/A");
        state.update("frame", "-");
        state.update("bitrate", "1000kbits/s");
        assert_eq!(state.snapshot(), RenderProgress::default());
    }

    #[derive(Default)]
    struct Recorder {
        started: Mutex<Vec<Option<u32>>>,
    }

    impl EncodeObserver for Recorder {
        fn started(&self, pid: Option<u32>) {
            self.started.lock().unwrap().push(pid);
        }
    }

    fn command(program: &str, args: &[&str]) -> EncodeCommand {
        EncodeCommand {
            program: PathBuf::from(program),
            args: args.iter().map(|s| s.to_string()).collect(),
            output_path: PathBuf::from("/dev/null"),
        }
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let recorder = Recorder::default();
        let err = FfmpegEncoder::new()
            .run(&command("/nonexistent/pitchpilot-ffmpeg", &[]), &recorder)
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::Spawn { .. }));
        assert!(!err.is_retry_eligible());
        assert!(recorder.started.lock().unwrap().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_encoder_error_with_stderr() {
        let recorder = Recorder::default();
        let err = FfmpegEncoder::new()
            .run(&command("sh", &["-c", "echo 'bad filter' >&2; exit 3"]), &recorder)
            .await
            .unwrap_err();
        match err {
            RenderError::Encoder {
                message,
                status,
                stderr,
            } => {
                assert_eq!(message, "bad filter");
                assert_eq!(status, Some(3));
                assert_eq!(stderr, "bad filter");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(recorder.started.lock().unwrap().len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_process() {
        let err = FfmpegEncoder::with_timeout(Duration::from_millis(200))
            .run(&command("sh", &["-c", "sleep 5"]), &NoopObserver)
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::Timeout { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_progress_lines_reach_observer() {
        #[derive(Default)]
        struct Progress(Mutex<Vec<RenderProgress>>);
        impl EncodeObserver for Progress {
            fn started(&self, _pid: Option<u32>) {}
            fn progress(&self, progress: RenderProgress) {
                self.0.lock().unwrap().push(progress);
            }
        }

        let observer = Progress::default();
        FfmpegEncoder::new()
            .run(
                &command(
                    "sh",
                    &["-c", "printf 'frame=30\\nout_time_us=1000000\\nprogress=continue\\nframe=60\\nprogress=end\\n'"],
                ),
                &observer,
            )
            .await
            .unwrap();

        let seen = observer.0.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].frame, 30);
        assert!(seen[1].complete);
    }

    #[tokio::test]
    async fn test_encoder_available_for_missing_binary() {
        assert!(!encoder_available(std::path::Path::new("/nonexistent/pitchpilot-ffmpeg")).await);
    }
}

//! Encoder argument assembly.

use std::path::{Path, PathBuf};

use crate::builder::RenderGraph;

/// A fully assembled encoder invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// File the invocation is expected to produce.
    pub output_path: PathBuf,
}

impl EncodeCommand {
    /// Shell-like rendering for logs and `plan` output.
    pub fn display_line(&self) -> String {
        let mut line = shell_quote(&self.program.display().to_string());
        for arg in &self.args {
            line.push(' ');
            line.push_str(&shell_quote(arg));
        }
        line
    }

    /// Whether the progress stream is requested on stdout.
    pub fn reports_progress(&self) -> bool {
        self.args
            .windows(2)
            .any(|w| w[0] == "-progress" && w[1] == "pipe:1")
    }
}

/// Process-level flags shared by every invocation.
fn base_args() -> Vec<String> {
    [
        "-nostdin",
        "-hide_banner",
        "-loglevel",
        "error",
        "-nostats",
        "-y",
        "-threads",
        "1",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn video_codec_args() -> Vec<String> {
    [
        "-c:v",
        "libx264",
        "-preset",
        "fast",
        "-crf",
        "23",
        "-pix_fmt",
        "yuv420p",
        "-movflags",
        "+faststart",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Encode `graph` into `output`.
pub fn render_command(program: &Path, graph: &RenderGraph, output: &Path) -> EncodeCommand {
    let mut args = base_args();
    args.push("-progress".to_string());
    args.push("pipe:1".to_string());

    for input in &graph.inputs {
        args.extend(input.args());
    }

    args.push("-filter_complex".to_string());
    args.push(graph.graph.to_filter_complex());
    args.extend(graph.graph.map_args());

    args.extend(video_codec_args());
    if graph.has_audio {
        args.push("-c:a".to_string());
        args.push("aac".to_string());
    }

    args.push(output.display().to_string());

    EncodeCommand {
        program: program.to_path_buf(),
        args,
        output_path: output.to_path_buf(),
    }
}

/// Grab a single frame of `video` at `at_secs` as a JPEG.
pub fn poster_command(program: &Path, video: &Path, poster: &Path, at_secs: u32) -> EncodeCommand {
    let mut args = base_args();
    args.extend([
        "-ss".to_string(),
        at_secs.to_string(),
        "-i".to_string(),
        video.display().to_string(),
        "-frames:v".to_string(),
        "1".to_string(),
        "-q:v".to_string(),
        "2".to_string(),
        poster.display().to_string(),
    ]);
    EncodeCommand {
        program: program.to_path_buf(),
        args,
        output_path: poster.to_path_buf(),
    }
}

/// Synthesize a solid-color clip with a sine tone, for local testing.
pub fn placeholder_clip_command(
    program: &Path,
    output: &Path,
    color: &str,
    frequency_hz: u32,
    duration_secs: u32,
) -> EncodeCommand {
    let mut args = base_args();
    args.extend([
        "-f".to_string(),
        "lavfi".to_string(),
        "-i".to_string(),
        format!("color=c={color}:size=640x480:duration={duration_secs}"),
        "-f".to_string(),
        "lavfi".to_string(),
        "-i".to_string(),
        format!("sine=frequency={frequency_hz}:duration={duration_secs}"),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-t".to_string(),
        duration_secs.to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        output.display().to_string(),
    ]);
    EncodeCommand {
        program: program.to_path_buf(),
        args,
        output_path: output.to_path_buf(),
    }
}

/// Synthesize a sine-tone MP3, for local testing.
pub fn placeholder_audio_command(
    program: &Path,
    output: &Path,
    frequency_hz: u32,
    duration_secs: u32,
) -> EncodeCommand {
    let mut args = base_args();
    args.extend([
        "-f".to_string(),
        "lavfi".to_string(),
        "-i".to_string(),
        format!("sine=frequency={frequency_hz}:duration={duration_secs}"),
        "-c:a".to_string(),
        "libmp3lame".to_string(),
        "-b:a".to_string(),
        "128k".to_string(),
        output.display().to_string(),
    ]);
    EncodeCommand {
        program: program.to_path_buf(),
        args,
        output_path: output.to_path_buf(),
    }
}

fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=+@,".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_render_graph, GraphOptions};
    use pitchpilot_media_model::assets::ResolvedAssets;

    fn graph(audio: bool) -> RenderGraph {
        let assets = ResolvedAssets::new(
            vec![PathBuf::from("/a/clip1.mp4"), PathBuf::from("/a/clip2.mp4")],
            audio.then(|| PathBuf::from("/a/bg.mp3")),
        );
        build_render_graph(
            &assets,
            Path::new("/w/overlay.txt"),
            Some(Path::new("/f/font.ttf")),
            &GraphOptions::classic(),
        )
        .unwrap()
    }

    fn position(args: &[String], flag: &str) -> usize {
        args.iter().position(|a| a == flag).unwrap()
    }

    #[test]
    fn test_render_command_layout() {
        let cmd = render_command(Path::new("ffmpeg"), &graph(true), Path::new("/w/output.mp4"));

        assert_eq!(cmd.args.last().map(String::as_str), Some("/w/output.mp4"));
        assert_eq!(cmd.output_path, PathBuf::from("/w/output.mp4"));
        assert!(cmd.reports_progress());
        assert!(cmd.args.contains(&"-nostdin".to_string()));

        // Inputs come before the graph, the graph before maps and codecs.
        let inputs: Vec<_> = cmd
            .args
            .windows(2)
            .filter(|w| w[0] == "-i")
            .map(|w| w[1].clone())
            .collect();
        assert_eq!(inputs, vec!["/a/clip1.mp4", "/a/clip2.mp4", "/a/bg.mp3"]);
        assert!(position(&cmd.args, "-filter_complex") > position(&cmd.args, "-i"));
        assert!(position(&cmd.args, "-map") > position(&cmd.args, "-filter_complex"));
        assert!(position(&cmd.args, "-c:v") > position(&cmd.args, "-shortest"));
        assert!(cmd.args.contains(&"aac".to_string()));
    }

    #[test]
    fn test_video_only_command_skips_audio_codec() {
        let cmd = render_command(Path::new("ffmpeg"), &graph(false), Path::new("/w/output.mp4"));
        assert!(!cmd.args.contains(&"-c:a".to_string()));
    }

    #[test]
    fn test_poster_command_seeks_before_input() {
        let cmd = poster_command(
            Path::new("/usr/bin/ffmpeg"),
            Path::new("/w/output.mp4"),
            Path::new("/w/output.jpg"),
            1,
        );
        assert!(position(&cmd.args, "-ss") < position(&cmd.args, "-i"));
        assert_eq!(cmd.output_path, PathBuf::from("/w/output.jpg"));
        assert!(!cmd.reports_progress());
    }

    #[test]
    fn test_placeholder_commands() {
        let clip = placeholder_clip_command(Path::new("ffmpeg"), Path::new("clip1.mp4"), "blue", 440, 4);
        assert!(clip.args.contains(&"color=c=blue:size=640x480:duration=4".to_string()));
        assert!(clip.args.contains(&"sine=frequency=440:duration=4".to_string()));

        let audio = placeholder_audio_command(Path::new("ffmpeg"), Path::new("bg.mp3"), 220, 20);
        assert!(audio.args.contains(&"libmp3lame".to_string()));
        assert_eq!(audio.args.last().map(String::as_str), Some("bg.mp3"));
    }

    #[test]
    fn test_display_line_quotes_graph() {
        let cmd = render_command(Path::new("ffmpeg"), &graph(false), Path::new("/w/out put.mp4"));
        let line = cmd.display_line();
        assert!(line.starts_with("ffmpeg -nostdin"));
        assert!(line.contains("'[0:v]scale="));
        assert!(line.ends_with("'/w/out put.mp4'"));
    }
}

//! Filter-graph builder for script videos.
//!
//! One parameterized builder produces every graph variant: with or without
//! title/outro cards, cropped or letterboxed clips, and with or without the
//! text overlay stages. The executor calls it again with `overlay = false`
//! to build the fallback graph.

use std::path::{Path, PathBuf};

use pitchpilot_media_model::assets::ResolvedAssets;
use serde::{Deserialize, Serialize};

use crate::graph::{params, FilterGraph, GraphBuilder, GraphError, Label, Pad};

/// Output frame width.
pub const TARGET_WIDTH: u32 = 1280;
/// Output frame height.
pub const TARGET_HEIGHT: u32 = 720;
/// Output frame rate.
pub const TARGET_FPS: u32 = 30;
/// Duration of the synthetic filler used when no clip resolves.
pub const FILLER_SECS: u32 = 6;
/// Duration of the title card.
pub const TITLE_SECS: u32 = 1;
/// Duration of the outro card.
pub const OUTRO_SECS: u32 = 2;
/// How long the caption stays visible once the clip body starts.
pub const CAPTION_WINDOW_SECS: u32 = 6;
/// Text burned into the title card.
pub const TITLE_TEXT: &str = "PitchPilot";
/// Text burned into the outro card.
pub const OUTRO_TEXT: &str = "Thank you for watching!";

const CARD_COLOR: &str = "black";
const PAD_COLOR: &str = "black";

/// How clips are fitted to the target frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    /// Scale up and crop the overflow; no bars.
    Fill,
    /// Scale down and pad with a solid color.
    Letterbox,
}

/// Where and how the caption is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionPlacement {
    /// Centered in the frame, large type, light box.
    Center,
    /// Anchored near the bottom edge, smaller type, darker box.
    Bottom,
}

impl CaptionPlacement {
    fn font_size(self) -> u32 {
        match self {
            CaptionPlacement::Center => 36,
            CaptionPlacement::Bottom => 32,
        }
    }

    fn y(self) -> &'static str {
        match self {
            CaptionPlacement::Center => "(h-text_h)/2",
            CaptionPlacement::Bottom => "h-text_h-50",
        }
    }

    fn box_color(self) -> &'static str {
        match self {
            CaptionPlacement::Center => "black@0.35",
            CaptionPlacement::Bottom => "black@0.5",
        }
    }

    fn box_border(self) -> u32 {
        match self {
            CaptionPlacement::Center => 12,
            CaptionPlacement::Bottom => 10,
        }
    }
}

/// Switches that select a graph variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphOptions {
    pub fit: FitMode,
    /// Add the title and outro cards around the clips.
    pub title_cards: bool,
    /// Add text-draw stages. Ignored when no font is available.
    pub overlay: bool,
    pub caption: CaptionPlacement,
}

impl GraphOptions {
    /// Letterboxed clips, no cards, centered caption.
    pub fn classic() -> Self {
        Self {
            fit: FitMode::Letterbox,
            title_cards: false,
            overlay: true,
            caption: CaptionPlacement::Center,
        }
    }

    /// Cropped clips between title and outro cards, bottom caption.
    pub fn enhanced() -> Self {
        Self {
            fit: FitMode::Fill,
            title_cards: true,
            overlay: true,
            caption: CaptionPlacement::Bottom,
        }
    }

    /// Same variant with every text-draw stage removed.
    pub fn without_overlay(self) -> Self {
        Self {
            overlay: false,
            ..self
        }
    }
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self::classic()
    }
}

/// An encoder input, in the order it is passed on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// A media file read from disk.
    File(PathBuf),
    /// A solid-color clip synthesized by the encoder.
    Color { color: &'static str, duration_secs: u32 },
}

impl InputSource {
    fn color(duration_secs: u32) -> Self {
        InputSource::Color {
            color: CARD_COLOR,
            duration_secs,
        }
    }

    /// Command-line arguments declaring this input.
    pub fn args(&self) -> Vec<String> {
        match self {
            InputSource::File(path) => vec!["-i".to_string(), path.display().to_string()],
            InputSource::Color {
                color,
                duration_secs,
            } => vec![
                "-f".to_string(),
                "lavfi".to_string(),
                "-i".to_string(),
                format!(
                    "color=c={color}:s={TARGET_WIDTH}x{TARGET_HEIGHT}:r={TARGET_FPS}:d={duration_secs}"
                ),
            ],
        }
    }
}

/// A built graph together with the inputs it indexes into.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderGraph {
    pub inputs: Vec<InputSource>,
    pub graph: FilterGraph,
    pub options: GraphOptions,
    /// Whether any text-draw stage made it into the graph.
    pub has_overlay: bool,
    pub has_audio: bool,
    /// Number of body segments (clips, or the single filler).
    pub segments: usize,
}

impl RenderGraph {
    /// Label mapped as the primary video stream.
    pub fn video_output(&self) -> &Label {
        &self.graph.maps()[0]
    }
}

/// Build the filter graph for `assets`.
///
/// Text-draw stages are only added when `options.overlay` is set and a
/// font is available; otherwise the concatenated video is mapped directly.
/// With no clips, one synthetic black filler takes their place.
pub fn build_render_graph(
    assets: &ResolvedAssets,
    overlay_text_file: &Path,
    font: Option<&Path>,
    options: &GraphOptions,
) -> Result<RenderGraph, GraphError> {
    let text_font = font.filter(|_| options.overlay);

    let mut inputs: Vec<InputSource> = if assets.clips.is_empty() {
        vec![InputSource::color(FILLER_SECS)]
    } else {
        assets.clips.iter().cloned().map(InputSource::File).collect()
    };
    let segments = inputs.len();

    let cards = if options.title_cards {
        let title = inputs.len();
        inputs.push(InputSource::color(TITLE_SECS));
        let outro = inputs.len();
        inputs.push(InputSource::color(OUTRO_SECS));
        Some((title, outro))
    } else {
        None
    };

    let audio_index = assets.background_audio.as_ref().map(|path| {
        inputs.push(InputSource::File(path.clone()));
        inputs.len() - 1
    });

    let mut b = GraphBuilder::new(inputs.len());

    // 1) Normalize each segment -> [v0]..[vN-1]
    let mut body = Vec::with_capacity(segments);
    for i in 0..segments {
        body.push(normalize_segment(&mut b, i, options.fit)?);
    }

    // 2-3) Title and outro cards, optionally with burned-in text
    let mut title_label = None;
    let mut outro_label = None;
    if let Some((title_idx, outro_idx)) = cards {
        let title = b.chain("fps", fps_params(), Pad::video(title_idx), "vtitle")?;
        let outro = b.chain("fps", fps_params(), Pad::video(outro_idx), "voutro")?;
        let (title, outro) = match text_font {
            Some(font) => (
                b.chain(
                    "drawtext",
                    card_text_params(font, TITLE_TEXT, 48, "blue@0.8", 20),
                    Pad::Label(title),
                    "vtitle_text",
                )?,
                b.chain(
                    "drawtext",
                    card_text_params(font, OUTRO_TEXT, 36, "purple@0.8", 15),
                    Pad::Label(outro),
                    "voutro_text",
                )?,
            ),
            None => (title, outro),
        };
        title_label = Some(title);
        outro_label = Some(outro);
    }

    // 4) Concat title + body + outro -> [vcat]
    let concat_inputs: Vec<Pad> = title_label
        .into_iter()
        .chain(body)
        .chain(outro_label)
        .map(Pad::Label)
        .collect();
    let n = concat_inputs.len();
    b.node(
        "concat",
        params(&[("n", n), ("v", 1), ("a", 0)]),
        concat_inputs,
        vec![Label::new("vcat")],
    )?;
    let mut video_out = Label::new("vcat");

    // 5) Caption overlay, visible only during the clip body
    if let Some(font) = text_font {
        let window = caption_window(options.title_cards, assets.clips.is_empty());
        video_out = b.chain(
            "drawtext",
            caption_params(font, overlay_text_file, options.caption, window),
            Pad::Label(video_out),
            "vout",
        )?;
    }

    // 6) Background audio -> [aout]
    let mut maps = vec![video_out];
    if let Some(idx) = audio_index {
        let audio = b.chain(
            "aresample",
            params(&[("async", 1), ("first_pts", 0)]),
            Pad::audio(idx),
            "aout",
        )?;
        maps.push(audio);
    }

    // 7) Map outputs; always stop at the shortest stream
    let graph = b.finish(maps, true)?;

    tracing::debug!(
        segments,
        inputs = inputs.len(),
        nodes = graph.nodes().len(),
        overlay = text_font.is_some(),
        title_cards = options.title_cards,
        audio = audio_index.is_some(),
        "Filter graph built"
    );

    Ok(RenderGraph {
        inputs,
        graph,
        options: *options,
        has_overlay: text_font.is_some(),
        has_audio: audio_index.is_some(),
        segments,
    })
}

fn normalize_segment(b: &mut GraphBuilder, i: usize, fit: FitMode) -> Result<Label, GraphError> {
    let aspect = match fit {
        FitMode::Fill => "increase",
        FitMode::Letterbox => "decrease",
    };
    let scaled = b.chain(
        "scale",
        params(&[
            ("w", TARGET_WIDTH.to_string()),
            ("h", TARGET_HEIGHT.to_string()),
            ("force_original_aspect_ratio", aspect.to_string()),
        ]),
        Pad::video(i),
        format!("s{i}"),
    )?;

    let fitted = match fit {
        FitMode::Fill => b.chain(
            "crop",
            params(&[("w", TARGET_WIDTH), ("h", TARGET_HEIGHT)]),
            Pad::Label(scaled),
            format!("c{i}"),
        )?,
        FitMode::Letterbox => b.chain(
            "pad",
            params(&[
                ("w", TARGET_WIDTH.to_string()),
                ("h", TARGET_HEIGHT.to_string()),
                ("x", "(ow-iw)/2".to_string()),
                ("y", "(oh-ih)/2".to_string()),
                ("color", PAD_COLOR.to_string()),
            ]),
            Pad::Label(scaled),
            format!("p{i}"),
        )?,
    };

    b.chain("fps", fps_params(), Pad::Label(fitted), format!("v{i}"))
}

fn fps_params() -> Vec<(String, String)> {
    params(&[("fps", TARGET_FPS)])
}

fn card_text_params(
    font: &Path,
    text: &str,
    font_size: u32,
    box_color: &str,
    border: u32,
) -> Vec<(String, String)> {
    params(&[
        ("fontfile", font.display().to_string()),
        ("text", text.to_string()),
        ("fontcolor", "white".to_string()),
        ("fontsize", font_size.to_string()),
        ("x", "(w-text_w)/2".to_string()),
        ("y", "(h-text_h)/2".to_string()),
        ("box", "1".to_string()),
        ("boxcolor", box_color.to_string()),
        ("boxborderw", border.to_string()),
    ])
}

/// Seconds `(start, end)` during which the caption is drawn.
///
/// The body starts after the title card. The filler body has a known
/// length; clip lengths are not probed, so clip bodies get the fixed
/// caption window.
fn caption_window(title_cards: bool, filler: bool) -> (u32, u32) {
    let start = if title_cards { TITLE_SECS } else { 0 };
    let body = if filler { FILLER_SECS } else { CAPTION_WINDOW_SECS };
    (start, start + body)
}

fn caption_params(
    font: &Path,
    text_file: &Path,
    placement: CaptionPlacement,
    (start_secs, end_secs): (u32, u32),
) -> Vec<(String, String)> {
    params(&[
        ("fontfile", font.display().to_string()),
        ("textfile", text_file.display().to_string()),
        ("reload", "0".to_string()),
        ("expansion", "none".to_string()),
        ("fontcolor", "white".to_string()),
        ("fontsize", placement.font_size().to_string()),
        ("x", "(w-text_w)/2".to_string()),
        ("y", placement.y().to_string()),
        ("box", "1".to_string()),
        ("boxcolor", placement.box_color().to_string()),
        ("boxborderw", placement.box_border().to_string()),
        ("enable", format!("between(t,{start_secs},{end_secs})")),
    ])
}

//! Dry-run: show what a render would do.

use pitchpilot_common::config::PipelineConfig;
use pitchpilot_render_engine::VideoPipeline;

pub fn run(config: PipelineConfig, enhanced: bool) -> anyhow::Result<()> {
    let pipeline = VideoPipeline::new(config).with_options(super::graph_options(enhanced));
    let planned = pipeline.plan()?;

    println!("Clips: {}", planned.assets.clip_count());
    for clip in &planned.assets.clips {
        println!("  {}", clip.display());
    }
    match &planned.assets.background_audio {
        Some(path) => println!("Background audio: {}", path.display()),
        None => println!("Background audio: none"),
    }
    match &planned.font {
        Some(path) => println!("Font: {}", path.display()),
        None => println!("Font: missing (no text overlay)"),
    }

    println!();
    println!("Filter graph ({} nodes):", planned.graph.graph.nodes().len());
    for segment in planned.graph.graph.to_filter_complex().split(';') {
        println!("  {segment}");
    }

    println!();
    println!("{}", planned.command.display_line());
    Ok(())
}

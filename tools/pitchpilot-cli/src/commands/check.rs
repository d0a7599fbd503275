//! Check the render environment.

use pitchpilot_common::config::PipelineConfig;
use pitchpilot_render_engine::{encoder_available, VideoPipeline};

pub async fn run(config: PipelineConfig) -> anyhow::Result<()> {
    println!("PitchPilot System Check");
    println!("{}", "=".repeat(50));

    let pipeline = VideoPipeline::new(config);
    let program = pipeline.program();

    let ffmpeg_ok = encoder_available(program).await;
    if ffmpeg_ok {
        println!("[OK] Encoder: {}", program.display());
    } else {
        println!("[FAIL] Encoder not runnable: {}", program.display());
        println!("       Install ffmpeg or set FFMPEG_PATH.");
    }

    let assets = pipeline.resolver().resolve();
    let candidates = pipeline.resolver().clip_candidates().len();
    if assets.clips.is_empty() {
        println!(
            "[WARN] Clips: none of {candidates} found in {} (a black filler will be used)",
            pipeline.config().assets_dir.display()
        );
    } else {
        println!("[OK] Clips: {}/{candidates}", assets.clip_count());
        for clip in &assets.clips {
            println!("     {}", clip.display());
        }
    }

    match &assets.background_audio {
        Some(path) => println!("[OK] Background audio: {}", path.display()),
        None => println!("[WARN] Background audio: missing (video will be silent)"),
    }

    match pipeline.resolver().font() {
        Some(path) => println!("[OK] Font: {}", path.display()),
        None => println!(
            "[WARN] Font: {} missing (captions disabled)",
            pipeline.config().font_path.display()
        ),
    }

    println!(
        "[OK] Output root: {}",
        pipeline.config().output_root.display()
    );

    println!();
    if ffmpeg_ok {
        println!("Encoder is available. PitchPilot is ready.");
    } else {
        println!("The encoder is missing. See above for fixes.");
    }

    Ok(())
}

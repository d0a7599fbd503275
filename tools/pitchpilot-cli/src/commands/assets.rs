//! Generate placeholder assets for local testing.

use pitchpilot_common::config::PipelineConfig;
use pitchpilot_render_engine::VideoPipeline;

pub async fn run(config: PipelineConfig, force: bool) -> anyhow::Result<()> {
    let pipeline = VideoPipeline::new(config);
    println!(
        "Generating placeholder assets in: {}",
        pipeline.config().assets_dir.display()
    );

    let written = pipeline.generate_placeholder_assets(force).await?;
    if written.is_empty() {
        println!("All assets already exist (use --force to regenerate).");
    }
    for path in &written {
        println!("  Created {}", path.display());
    }
    Ok(())
}

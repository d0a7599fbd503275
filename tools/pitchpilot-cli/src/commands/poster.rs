//! Extract a poster frame.

use std::path::PathBuf;

use pitchpilot_common::config::PipelineConfig;
use pitchpilot_render_engine::VideoPipeline;

pub async fn run(config: PipelineConfig, video: PathBuf) -> anyhow::Result<()> {
    let pipeline = VideoPipeline::new(config);
    let poster = pipeline
        .poster(&video)
        .await
        .map_err(|e| anyhow::anyhow!("Poster extraction failed: {e}"))?;
    println!("{}", poster.display());
    Ok(())
}

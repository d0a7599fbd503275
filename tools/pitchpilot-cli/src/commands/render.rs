//! Render a captioned video for a script.

use std::io::Read;
use std::path::PathBuf;

use pitchpilot_common::config::PipelineConfig;
use pitchpilot_media_model::outcome::OverlayStatus;
use pitchpilot_media_model::request::RenderRequest;
use pitchpilot_render_engine::{
    ChannelPublisher, Fanout, PublisherMessage, TracingPublisher, VideoPipeline,
};

pub async fn run(
    config: PipelineConfig,
    script: Option<String>,
    script_file: Option<PathBuf>,
    enhanced: bool,
    json: bool,
) -> anyhow::Result<()> {
    let script = read_script(script, script_file)?;
    let pipeline = VideoPipeline::new(config).with_options(super::graph_options(enhanced));

    let (channel, mut rx) = ChannelPublisher::channel();
    let printer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            print_message(&message, json);
        }
    });

    let publisher = Fanout(channel, TracingPublisher);
    let result = pipeline
        .render(&RenderRequest::new(script), &publisher)
        .await;

    // Closing the channel lets the printer drain and exit.
    drop(publisher);
    printer.await?;

    let outcome = result.map_err(|e| anyhow::anyhow!("Render failed: {e}"))?;

    if json {
        println!("{}", serde_json::to_string(&outcome)?);
        return Ok(());
    }

    println!();
    println!("Render complete: {}", outcome.output_path.display());
    println!("  Render id: {}", outcome.render_id);
    println!("  Caption file: {}", outcome.overlay_text_path.display());
    let overlay = match outcome.overlay {
        OverlayStatus::Applied => "applied",
        OverlayStatus::NotAttempted => "not attempted (font missing)",
        OverlayStatus::DisabledAfterFailure => "disabled after encoder failure",
    };
    println!("  Overlay: {overlay}");
    println!("  Encoder runs: {}", outcome.attempts);

    Ok(())
}

fn read_script(script: Option<String>, script_file: Option<PathBuf>) -> anyhow::Result<String> {
    if let Some(script) = script {
        return Ok(script);
    }
    if let Some(path) = script_file {
        return std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Failed to read script {}: {e}", path.display()));
    }
    let mut script = String::new();
    std::io::stdin().read_to_string(&mut script)?;
    Ok(script)
}

fn print_message(message: &PublisherMessage, json: bool) {
    match message {
        PublisherMessage::Event(event) => {
            if json {
                match serde_json::to_string(event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::warn!("Failed to serialize event: {e}"),
                }
            } else {
                match &event.payload.message {
                    Some(msg) => println!("  [{}] {msg}", event.stage().as_str()),
                    None => println!("  [{}]", event.stage().as_str()),
                }
            }
        }
        PublisherMessage::Progress { progress, .. } => {
            if !json {
                eprint!(
                    "\r  Progress: {:.1}s ({} frames)  ",
                    progress.out_time_secs, progress.frame
                );
            }
        }
    }
}

//! CLI command implementations.

pub mod assets;
pub mod check;
pub mod plan;
pub mod poster;
pub mod render;

use pitchpilot_render_engine::GraphOptions;

/// Graph variant selected by `--enhanced`.
pub(crate) fn graph_options(enhanced: bool) -> GraphOptions {
    if enhanced {
        GraphOptions::enhanced()
    } else {
        GraphOptions::classic()
    }
}

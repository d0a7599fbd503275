//! PitchPilot Overlay Text
//!
//! Turns arbitrary, often AI-generated script text into a caption the
//! encoder's text-draw filter can always render:
//! - **Sanitize:** ASCII-only, whitespace-collapsed, length-bounded, never empty
//! - **Scratch file:** the caption is handed to the encoder by file
//!   reference, never inline in the filter graph

pub mod sanitize;
pub mod scratch;

pub use sanitize::*;
pub use scratch::*;

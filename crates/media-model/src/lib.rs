//! PitchPilot Media Model
//!
//! Plain data shared between the render pipeline and its callers:
//! - **Request:** the script text a render starts from
//! - **Assets:** which clips and background audio a render will use
//! - **Events:** lifecycle notifications emitted while rendering
//! - **Outcome:** where the video landed and whether the caption survived
//!
//! Nothing in this crate touches the filesystem or spawns processes.

pub mod assets;
pub mod event;
pub mod outcome;
pub mod request;

pub use assets::*;
pub use event::*;
pub use outcome::*;
pub use request::*;

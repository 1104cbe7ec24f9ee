//! Camera, picking and hover outlines.
//!
//! Rasterization lives with the host renderer; this module only produces
//! camera poses, ray hits and the node set the outline pass should draw.

mod camera;
pub mod highlight;
pub mod pick;

pub use camera::{Camera, CameraPose, OrbitControls};
pub use highlight::{HighlightSet, HoverHighlighter, HoverState};
pub use pick::{PickHit, Picker};

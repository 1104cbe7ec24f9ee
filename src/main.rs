//! Showroom - interactive 3D showroom controller
//!
//! Drives the interactive layer of a virtual showroom:
//! - Ray picking of pointer positions against the scene description
//! - Camera fly-to transitions between named views, one at a time
//! - Control-panel toggle switches bound to lights and materials
//! - Per-frame hover outlines
//!
//! Rasterization is left to the host renderer, which reads the camera pose,
//! light/material state and highlight set from the session every frame.

mod app;
mod render;
mod scene;
mod ui;

fn main() {
    app::run();
}

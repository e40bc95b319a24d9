//! # User Interface Module
//!
//! Dear ImGui-based interface overlaying the 3D viewer: the catalog browser
//! panels and the manager wiring ImGui into winit and wgpu.
//!
//! The UI system properly handles input capture to prevent conflicts with
//! camera controls: events the UI claims never reach the orbit camera.

pub mod browser;
pub mod manager;

// Re-export main types
pub use browser::{draw_browser, draw_stats_overlay, GeometryStats};
pub use manager::UiManager;

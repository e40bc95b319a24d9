// src/lib.rs
//! Vesalius
//!
//! An interactive 3D anatomy viewer built on wgpu and winit: a catalog of
//! anatomical models with subpart browsing, PBR rendering with HDR
//! environment lighting, and an orbit camera with mouse and touch controls.

pub mod app;
pub mod assets;
pub mod catalog;
pub mod error;
pub mod gfx;
pub mod lifecycle;
pub mod performance;
pub mod prelude;
pub mod selection;
pub mod session;
pub mod ui;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::VesaliusApp;
pub use error::ViewerError;

/// Creates the viewer with the built-in catalog and the default `assets/`
/// bundle root.
pub fn default() -> VesaliusApp {
    VesaliusApp::new("assets")
}

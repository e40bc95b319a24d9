//! # Graphics Module
//!
//! All GPU-facing functionality: camera systems, rendering pipelines, scene
//! management, environment lighting and resource handling.
//!
//! ## Architecture Overview
//!
//! - **Camera System** ([`camera`]) - Orbit camera with touch and mouse controls
//! - **Rendering Pipeline** ([`rendering`]) - PBR rendering with shadow mapping and a sky pass
//! - **Scene Management** ([`scene`]) - Displayed model, materials, decoding
//! - **Environment Lighting** ([`environment`]) - HDR decoding and IBL prefiltering
//! - **Resource Management** ([`resources`]) - Materials, textures, and GPU resources
//!
//! The [`viewer::ModelViewer`] ties these together behind the session's
//! surface boundary.

pub mod camera;
pub mod environment;
pub mod rendering;
pub mod resources;
pub mod scene;
pub mod viewer;

// Re-export commonly used types
pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
pub use viewer::ModelViewer;

//! # Vesalius Prelude
//!
//! Convenient imports for typical viewer applications:
//!
//! ```rust
//! use vesalius::prelude::*;
//! ```

// Re-export core application types
pub use crate::app::VesaliusApp;
pub use crate::default;
pub use crate::error::ViewerError;

// Catalog and browsing state
pub use crate::assets::AssetStore;
pub use crate::catalog::{AnatomyModel, Catalog};
pub use crate::selection::{BrowsePage, SelectionAction, SelectionState};

// Session and lifecycle
pub use crate::lifecycle::{Lifecycle, LifecycleObserver};
pub use crate::session::{ModelFormat, PointerEvent, RenderSession, SurfaceViewer};

// Graphics and scene types
pub use crate::gfx::camera::CameraManager;
pub use crate::gfx::scene::Scene;
pub use crate::gfx::ModelViewer;

// Performance monitoring
pub use crate::performance::{PerformanceMetrics, PerformanceMonitor};

// Common external dependencies
pub use cgmath::{InnerSpace, Vector3, Zero};
pub use imgui::Ui;

// src/error.rs
//! Error types for asset access, model decoding, and environment setup.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the viewer library.
///
/// Most of these never cross the session boundary: asset and decode failures
/// are logged and swallowed so the previously displayed model stays up. They
/// exist so the internal load paths can use `?` and so the fatal surface
/// bootstrap has a typed cause to report.
#[derive(Error, Debug)]
pub enum ViewerError {
    /// An asset file could not be read from the bundle.
    #[error("failed to read asset {path:?}: {source}")]
    AssetRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A model buffer could not be decoded.
    #[error("failed to decode model '{name}': {reason}")]
    ModelDecode { name: String, reason: String },

    /// A model asset has an extension no decoder is registered for.
    #[error("unsupported model format for '{0}'")]
    UnsupportedModelFormat(String),

    /// A Radiance HDR buffer is malformed or uses an unsupported variant.
    #[error("failed to decode HDR image: {0}")]
    HdrDecode(String),

    /// The GPU surface could not be created for the window.
    #[error("failed to create rendering surface: {0}")]
    SurfaceCreation(String),
}

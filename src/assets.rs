// src/assets.rs
//! Bundled asset access
//!
//! Model and environment assets are addressed throughout the library by
//! relative path strings ("models/heart.glb", "environments/lightroom_14b.hdr").
//! The [`AssetStore`] resolves those strings against a bundle root directory
//! and reads files fully into memory; decoding happens elsewhere.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ViewerError;

/// Resolves and reads bundled asset files.
///
/// Reads are synchronous and whole-file; the viewer hands the resulting
/// buffer straight to a decoder. There is no caching layer, every load
/// request hits the filesystem.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    /// Default bundle root, relative to the working directory.
    pub const DEFAULT_ROOT: &'static str = "assets";

    /// Creates a store rooted at the given bundle directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the bundle root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a relative asset path against the bundle root.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Reads an asset file fully into memory.
    ///
    /// # Arguments
    /// * `relative` - Asset path relative to the bundle root
    ///
    /// # Returns
    /// The file contents, or [`ViewerError::AssetRead`] with the resolved path
    pub fn read(&self, relative: &str) -> Result<Vec<u8>, ViewerError> {
        let path = self.resolve(relative);
        fs::read(&path).map_err(|source| ViewerError::AssetRead { path, source })
    }
}

impl Default for AssetStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ROOT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "vesalius_assets_{}_{}",
            tag,
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_read_resolves_against_root() {
        let dir = scratch_dir("read");
        fs::create_dir_all(dir.join("models")).unwrap();
        fs::write(dir.join("models/heart.glb"), b"glb-bytes").unwrap();

        let store = AssetStore::new(&dir);
        let bytes = store.read("models/heart.glb").unwrap();
        assert_eq!(bytes, b"glb-bytes");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_asset_reports_resolved_path() {
        let dir = scratch_dir("missing");
        let store = AssetStore::new(&dir);

        let err = store.read("models/missing.glb").unwrap_err();
        match err {
            ViewerError::AssetRead { path, .. } => {
                assert_eq!(path, dir.join("models/missing.glb"));
            }
            other => panic!("unexpected error: {other}"),
        }

        fs::remove_dir_all(&dir).ok();
    }
}

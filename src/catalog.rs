// src/catalog.rs
//! Static anatomy model catalog
//!
//! The catalog maps model names to bundled asset paths and groups child
//! "subpart" models under their main entry. It is constructed once and never
//! mutated; the UI reads it, the selection state machine consults it when a
//! main entry is picked.

use std::collections::HashMap;

/// A selectable 3D anatomy model backed by a bundled asset file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnatomyModel {
    pub name: String,
    pub file_path: String,
}

impl AnatomyModel {
    pub fn new(name: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_path: file_path.into(),
        }
    }

    /// Derives the preview image path for this model: the name with spaces
    /// removed and lowercased, suffixed `.png`, under the bundle's `image/`
    /// directory.
    pub fn preview_image_path(&self) -> String {
        let stem: String = self
            .name
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(|c| c.to_lowercase())
            .collect();
        format!("image/{}.png", stem)
    }

    /// Short description text shown in the expandable card.
    pub fn description(&self) -> String {
        format!(
            "{} is presented as a detailed, interactive 3D visualization. \
             Rotate, pan and zoom to explore its structure and its relation \
             to the surrounding anatomy.",
            self.name
        )
    }
}

/// Ordered main models plus a per-name subpart lookup. Read-only after
/// construction.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    main_models: Vec<AnatomyModel>,
    subparts: HashMap<String, Vec<AnatomyModel>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in anatomy atlas shipped with the bundled assets.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.add_main(AnatomyModel::new("Splanchnology", "models/splanchnology.glb"));
        catalog.add_main(AnatomyModel::new("Neurology", "models/neurology.glb"));
        catalog.add_main(AnatomyModel::new("Myology", "models/myology.glb"));
        catalog.add_subparts(
            "Splanchnology",
            vec![
                AnatomyModel::new("Heart", "models/heart.glb"),
                AnatomyModel::new("Lungs", "models/lungs.glb"),
                AnatomyModel::new("Liver", "models/liver.glb"),
                AnatomyModel::new("Kidney", "models/kidney.glb"),
            ],
        );
        catalog
    }

    pub fn add_main(&mut self, model: AnatomyModel) {
        self.main_models.push(model);
    }

    pub fn add_subparts(&mut self, main_name: &str, subparts: Vec<AnatomyModel>) {
        self.subparts.insert(main_name.to_string(), subparts);
    }

    /// Ordered main catalog entries.
    pub fn main_models(&self) -> &[AnatomyModel] {
        &self.main_models
    }

    /// Subparts configured for a main entry, empty if none.
    pub fn subparts_of(&self, main_name: &str) -> Vec<AnatomyModel> {
        self.subparts.get(main_name).cloned().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.main_models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_image_path_lowercases_and_strips_spaces() {
        let model = AnatomyModel::new("Left Atrium", "models/left_atrium.glb");
        assert_eq!(model.preview_image_path(), "image/leftatrium.png");

        let model = AnatomyModel::new("Splanchnology", "models/splanchnology.glb");
        assert_eq!(model.preview_image_path(), "image/splanchnology.png");
    }

    #[test]
    fn test_builtin_catalog_structure() {
        let catalog = Catalog::builtin();
        let names: Vec<&str> = catalog
            .main_models()
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, ["Splanchnology", "Neurology", "Myology"]);

        let subparts = catalog.subparts_of("Splanchnology");
        assert_eq!(subparts.len(), 4);
        assert_eq!(subparts[0].name, "Heart");
        assert_eq!(subparts[0].file_path, "models/heart.glb");
    }

    #[test]
    fn test_unconfigured_subparts_are_empty() {
        let catalog = Catalog::builtin();
        assert!(catalog.subparts_of("Neurology").is_empty());
        assert!(catalog.subparts_of("Nonexistent").is_empty());
    }
}

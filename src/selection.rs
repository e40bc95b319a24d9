// src/selection.rs
//! Catalog browsing state machine
//!
//! Tracks which model is displayed and whether the browser panel shows the
//! main catalog or the subparts of the current main model. UI panels emit
//! [`SelectionAction`]s; the app applies them here and issues a model load
//! when the displayed model changes.

use crate::catalog::AnatomyModel;

/// Which list the browser panel is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowsePage {
    /// The top-level catalog of main models.
    Main,
    /// The subparts of the currently selected main model.
    Subparts,
}

/// An intent emitted by the browser UI, applied by the app after the frame.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionAction {
    /// A main catalog entry was tapped.
    SelectMain(AnatomyModel),
    /// A subpart of the current main model was tapped.
    SelectSubpart(AnatomyModel),
    /// The list toggle was tapped (switch between main catalog and subparts).
    TogglePage,
}

/// Current browsing and display state.
///
/// `current_main` is the last selected top-level model and anchors the
/// subpart list; `displayed` is whatever model the viewer was last asked to
/// load (main or subpart).
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    page_is_subparts: bool,
    current_main: Option<AnatomyModel>,
    displayed: Option<AnatomyModel>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self) -> BrowsePage {
        if self.page_is_subparts {
            BrowsePage::Subparts
        } else {
            BrowsePage::Main
        }
    }

    /// The main model anchoring the subpart list, if any selection happened.
    pub fn current_main(&self) -> Option<&AnatomyModel> {
        self.current_main.as_ref()
    }

    /// The model currently shown in the viewer, if any.
    pub fn displayed(&self) -> Option<&AnatomyModel> {
        self.displayed.as_ref()
    }

    /// Whether the page toggle makes sense right now (it needs a current
    /// main model to anchor the subparts page, or an active subparts page
    /// to return from).
    pub fn can_toggle(&self) -> bool {
        self.page_is_subparts || self.current_main.is_some()
    }

    /// Applies a UI action. Returns the asset path of the model to load, if
    /// the displayed model changed.
    pub fn apply(&mut self, action: SelectionAction) -> Option<String> {
        match action {
            SelectionAction::SelectMain(model) => {
                // Selecting a main model always lands the browser on its
                // subpart page, even when that page is empty.
                self.page_is_subparts = true;
                self.current_main = Some(model.clone());
                self.displayed = Some(model.clone());
                Some(model.file_path)
            }
            SelectionAction::SelectSubpart(model) => {
                self.displayed = Some(model.clone());
                Some(model.file_path)
            }
            SelectionAction::TogglePage => {
                if self.page_is_subparts {
                    self.page_is_subparts = false;
                } else if self.can_toggle() {
                    self.page_is_subparts = true;
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn heart(catalog: &Catalog) -> AnatomyModel {
        catalog.subparts_of("Splanchnology")[0].clone()
    }

    #[test]
    fn test_initial_state_shows_main_page() {
        let state = SelectionState::new();
        assert_eq!(state.page(), BrowsePage::Main);
        assert!(state.displayed().is_none());
        assert!(!state.can_toggle());
    }

    #[test]
    fn test_select_main_with_subparts_switches_page_and_loads() {
        let catalog = Catalog::builtin();
        let mut state = SelectionState::new();

        let load = state.apply(SelectionAction::SelectMain(
            catalog.main_models()[0].clone(),
        ));
        assert_eq!(load.as_deref(), Some("models/splanchnology.glb"));
        assert_eq!(state.page(), BrowsePage::Subparts);
        assert_eq!(state.current_main().unwrap().name, "Splanchnology");
        assert_eq!(state.displayed().unwrap().name, "Splanchnology");
    }

    #[test]
    fn test_select_main_without_subparts_still_shows_subparts_page() {
        let catalog = Catalog::builtin();
        let mut state = SelectionState::new();

        // Neurology has no configured subparts; the browser still lands on
        // its (empty) subparts page.
        let load = state.apply(SelectionAction::SelectMain(
            catalog.main_models()[1].clone(),
        ));
        assert_eq!(load.as_deref(), Some("models/neurology.glb"));
        assert!(catalog.subparts_of("Neurology").is_empty());
        assert_eq!(state.page(), BrowsePage::Subparts);

        state.apply(SelectionAction::TogglePage);
        assert_eq!(state.page(), BrowsePage::Main);
    }

    #[test]
    fn test_select_sole_entry_without_subparts() {
        let mut catalog = Catalog::new();
        catalog.add_main(AnatomyModel::new("Heart", "models/heart.glb"));
        let mut state = SelectionState::new();

        state.apply(SelectionAction::SelectMain(
            catalog.main_models()[0].clone(),
        ));
        assert_eq!(state.page(), BrowsePage::Subparts);
        assert!(catalog.subparts_of("Heart").is_empty());

        state.apply(SelectionAction::TogglePage);
        assert_eq!(state.page(), BrowsePage::Main);
        assert_eq!(state.current_main().unwrap().name, "Heart");
    }

    #[test]
    fn test_select_subpart_keeps_main_anchor() {
        let catalog = Catalog::builtin();
        let mut state = SelectionState::new();
        state.apply(SelectionAction::SelectMain(
            catalog.main_models()[0].clone(),
        ));

        let load = state.apply(SelectionAction::SelectSubpart(heart(&catalog)));
        assert_eq!(load.as_deref(), Some("models/heart.glb"));
        assert_eq!(state.current_main().unwrap().name, "Splanchnology");
        assert_eq!(state.displayed().unwrap().name, "Heart");
        assert_eq!(state.page(), BrowsePage::Subparts);
    }

    #[test]
    fn test_toggle_round_trip() {
        let catalog = Catalog::builtin();
        let mut state = SelectionState::new();
        state.apply(SelectionAction::SelectMain(
            catalog.main_models()[0].clone(),
        ));
        assert_eq!(state.page(), BrowsePage::Subparts);

        assert!(state.apply(SelectionAction::TogglePage).is_none());
        assert_eq!(state.page(), BrowsePage::Main);

        // The main anchor is retained, so toggling forward works again.
        assert!(state.can_toggle());
        state.apply(SelectionAction::TogglePage);
        assert_eq!(state.page(), BrowsePage::Subparts);
    }

    #[test]
    fn test_toggle_without_selection_is_inert() {
        let mut state = SelectionState::new();
        assert!(state.apply(SelectionAction::TogglePage).is_none());
        assert_eq!(state.page(), BrowsePage::Main);
    }
}

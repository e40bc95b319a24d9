// src/ui/browser.rs
//! Catalog browser panels
//!
//! Builds the ImGui panels for browsing the anatomy catalog: the model list
//! (main catalog or subparts of the current selection), a description card
//! for the displayed model, and a small geometry stats overlay. Interaction
//! is reported as [`SelectionAction`]s which the app applies after the
//! frame.

use imgui::Ui;

use crate::catalog::Catalog;
use crate::selection::{BrowsePage, SelectionAction, SelectionState};

/// Geometry counters shown in the stats overlay.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryStats {
    pub vertices: u32,
    pub triangles: u32,
}

/// Draws the browser side panel and pushes tapped intents into `actions`.
pub fn draw_browser(
    ui: &Ui,
    catalog: &Catalog,
    state: &SelectionState,
    actions: &mut Vec<SelectionAction>,
) {
    ui.window("Atlas")
        .size([320.0, 560.0], imgui::Condition::FirstUseEver)
        .position([16.0, 16.0], imgui::Condition::FirstUseEver)
        .build(|| {
            draw_page_header(ui, state, actions);
            ui.separator();
            draw_model_list(ui, catalog, state, actions);
            draw_description(ui, state);
        });
}

fn draw_page_header(ui: &Ui, state: &SelectionState, actions: &mut Vec<SelectionAction>) {
    match state.page() {
        BrowsePage::Main => {
            ui.text("Catalog");
            if state.can_toggle() {
                ui.same_line();
                if ui.small_button("Subparts") {
                    actions.push(SelectionAction::TogglePage);
                }
            }
        }
        BrowsePage::Subparts => {
            let title = state
                .current_main()
                .map(|m| m.name.as_str())
                .unwrap_or("Subparts");
            ui.text(title);
            ui.same_line();
            if ui.small_button("Back") {
                actions.push(SelectionAction::TogglePage);
            }
        }
    }
}

fn draw_model_list(
    ui: &Ui,
    catalog: &Catalog,
    state: &SelectionState,
    actions: &mut Vec<SelectionAction>,
) {
    let width = ui.content_region_avail()[0];

    match state.page() {
        BrowsePage::Main => {
            for model in catalog.main_models() {
                if ui.button_with_size(&model.name, [width, 36.0]) {
                    actions.push(SelectionAction::SelectMain(model.clone()));
                }
                ui.text_disabled(model.preview_image_path());
            }
        }
        BrowsePage::Subparts => {
            let Some(main) = state.current_main() else {
                return;
            };
            for model in catalog.subparts_of(&main.name) {
                let selected = state.displayed() == Some(&model);
                let _highlight = selected.then(|| {
                    ui.push_style_color(imgui::StyleColor::Button, [0.26, 0.46, 0.70, 1.0])
                });
                if ui.button_with_size(&model.name, [width, 36.0]) {
                    actions.push(SelectionAction::SelectSubpart(model.clone()));
                }
            }
        }
    }
}

fn draw_description(ui: &Ui, state: &SelectionState) {
    let Some(displayed) = state.displayed() else {
        ui.separator();
        ui.text_wrapped("Select a model to view it.");
        return;
    };

    ui.separator();
    if ui.collapsing_header(&displayed.name, imgui::TreeNodeFlags::DEFAULT_OPEN) {
        ui.text_wrapped(displayed.description());
    }
}

/// Small overlay with geometry counters, anchored to the bottom-left.
pub fn draw_stats_overlay(ui: &Ui, stats: GeometryStats) {
    let display_size = ui.io().display_size;
    ui.window("Stats")
        .position(
            [16.0, display_size[1] - 72.0],
            imgui::Condition::Always,
        )
        .size([220.0, 56.0], imgui::Condition::Always)
        .no_decoration()
        .bg_alpha(0.4)
        .build(|| {
            ui.text(format!("vertices:  {}", stats.vertices));
            ui.text(format!("triangles: {}", stats.triangles));
        });
}

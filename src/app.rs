//! Application shell
//!
//! Wires the winit event loop to the render session: window creation, host
//! lifecycle, pointer-event translation and the browser UI overlay. The
//! session itself never sees winit types.

use std::path::PathBuf;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes},
};

use crate::assets::AssetStore;
use crate::catalog::Catalog;
use crate::gfx::ModelViewer;
use crate::lifecycle::Lifecycle;
use crate::performance::PerformanceMonitor;
use crate::selection::{SelectionAction, SelectionState};
use crate::session::{PointerEvent, RenderSession, TouchPhase};
use crate::ui::{draw_browser, draw_stats_overlay, GeometryStats, UiManager};

/// Bundled panorama used for environment lighting.
pub const ENVIRONMENT_ASSET: &str = "environments/lightroom_14b.hdr";

/// The anatomy viewer application.
///
/// Construct with [`VesaliusApp::new`] and start with [`VesaliusApp::run`],
/// which consumes the app and blocks on the event loop.
pub struct VesaliusApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    window: Option<Arc<Window>>,
    ui_manager: Option<UiManager>,
    session: RenderSession<ModelViewer>,
    lifecycle: Lifecycle,
    catalog: Catalog,
    selection: SelectionState,
    monitor: PerformanceMonitor,
    title: String,
    window_size: (u32, u32),
    vsync: bool,
}

impl VesaliusApp {
    /// Creates the app with the built-in catalog and the given asset bundle
    /// root.
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        Self::with_catalog(asset_root, Catalog::builtin())
    }

    pub fn with_catalog(asset_root: impl Into<PathBuf>, catalog: Catalog) -> Self {
        let event_loop = EventLoop::new().expect("Failed to create event loop");
        let assets = AssetStore::new(asset_root);
        let session = RenderSession::new(assets, ENVIRONMENT_ASSET);

        Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                window: None,
                ui_manager: None,
                session,
                lifecycle: Lifecycle::new(),
                catalog,
                selection: SelectionState::new(),
                monitor: PerformanceMonitor::new(),
                title: "Vesalius".to_string(),
                window_size: (1200, 800),
                vsync: true,
            },
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.app_state.title = title.into();
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.app_state.window_size = (width, height);
        self
    }

    /// Disables vsync for uncapped frame rates. On by default.
    pub fn with_vsync(mut self, enabled: bool) -> Self {
        self.app_state.vsync = enabled;
        self
    }

    /// Runs the event loop until exit.
    ///
    /// The first catalog entry is requested up front; the session buffers
    /// the request until the surface attaches.
    pub fn run(mut self) {
        if let Some(first) = self.app_state.catalog.main_models().first().cloned() {
            let load = self
                .app_state
                .selection
                .apply(SelectionAction::SelectMain(first));
            if let Some(path) = load {
                self.app_state.session.load_model(&path);
            }
        }

        let event_loop = self.event_loop.take().expect("Event loop already consumed");
        event_loop.set_control_flow(ControlFlow::Poll);

        event_loop
            .run_app(&mut self.app_state)
            .expect("Failed to run event loop");
    }
}

impl AppState {
    /// Applies browser intents gathered during the frame, issuing a model
    /// load when the displayed model changes.
    fn apply_actions(&mut self, actions: Vec<SelectionAction>) {
        for action in actions {
            if let Some(path) = self.selection.apply(action) {
                self.session.load_model(&path);
            }
        }
    }

    fn redraw(&mut self) {
        let Some(window) = self.window.clone() else {
            return;
        };
        if !self.session.frames_enabled() {
            return;
        }

        self.monitor.begin_frame();
        let frame_time_nanos = self.session.frame_time_nanos();

        let mut actions = Vec::new();
        let catalog = &self.catalog;
        let selection = &self.selection;
        let monitor = &self.monitor;

        if let Some(viewer) = self.session.viewer_mut() {
            let (vertices, triangles) = viewer.scene().geometry_stats();
            let stats = GeometryStats {
                vertices,
                triangles,
            };

            if let Some(ui_manager) = self.ui_manager.as_mut() {
                viewer.render_with_ui(frame_time_nanos, |device, queue, encoder, color_attachment| {
                    ui_manager.update_logic(&window, |ui| {
                        draw_browser(ui, catalog, selection, &mut actions);
                        draw_stats_overlay(ui, stats);
                        monitor.render_overlay(ui);
                    });
                    ui_manager.render_display_only(device, queue, encoder, color_attachment);
                });
            }
        }

        self.monitor.end_frame();
        self.apply_actions(actions);
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let (win_width, win_height) = self.window_size;
            let window = match event_loop.create_window(
                WindowAttributes::default()
                    .with_title(&self.title)
                    .with_inner_size(winit::dpi::LogicalSize::new(win_width, win_height)),
            ) {
                Ok(window) => Arc::new(window),
                Err(e) => {
                    log::error!("window creation failed: {e}");
                    event_loop.exit();
                    return;
                }
            };
            self.window = Some(window.clone());

            let (width, height) = window.inner_size().into();
            let attach = self.session.attach_surface(
                || ModelViewer::new(window.clone(), width, height),
                &mut self.lifecycle,
            );
            if let Err(e) = attach {
                log::error!("surface bootstrap failed: {e}");
                event_loop.exit();
                return;
            }

            if !self.vsync {
                if let Some(viewer) = self.session.viewer_mut() {
                    viewer.engine_mut().set_vsync(false);
                }
            }

            if let Some(viewer) = self.session.viewer() {
                let engine = viewer.engine();
                let mut ui_manager = UiManager::new(
                    engine.device(),
                    engine.queue(),
                    engine.surface_format(),
                    self.window.as_ref().unwrap(),
                );
                ui_manager.update_display_size(width, height);
                self.ui_manager = Some(ui_manager);
            }
        }

        self.lifecycle.resume();
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        self.lifecycle.pause();
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.lifecycle.destroy();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };

        // Modifier state feeds the camera's drag mode and must survive UI
        // capture.
        if let WindowEvent::ModifiersChanged(modifiers) = &event {
            self.session.pointer_event(PointerEvent::Modifiers {
                shift: modifiers.state().shift_key(),
            });
        }

        // UI input has priority; captured events never reach the camera.
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            if ui_manager.handle_window_event(&window, &event) {
                window.request_redraw();
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.session.resize(width, height);
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.session.pointer_event(PointerEvent::Moved {
                    x: position.x as f32,
                    y: position.y as f32,
                });
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let event = match state {
                    ElementState::Pressed => PointerEvent::Pressed,
                    ElementState::Released => PointerEvent::Released,
                };
                self.session.pointer_event(event);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 * 0.01,
                };
                self.session.pointer_event(PointerEvent::Scroll { delta });
            }
            WindowEvent::PinchGesture { delta, .. } => {
                self.session.pointer_event(PointerEvent::Pinch {
                    delta: delta as f32,
                });
            }
            WindowEvent::Touch(touch) => {
                let phase = match touch.phase {
                    winit::event::TouchPhase::Started => TouchPhase::Started,
                    winit::event::TouchPhase::Moved => TouchPhase::Moved,
                    winit::event::TouchPhase::Ended => TouchPhase::Ended,
                    winit::event::TouchPhase::Cancelled => TouchPhase::Cancelled,
                };
                self.session.pointer_event(PointerEvent::Touch {
                    phase,
                    x: touch.location.x as f32,
                    y: touch.location.y as f32,
                });
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        // Continuous redraw only while the lifecycle gate is open.
        if self.session.frames_enabled() {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
    }
}

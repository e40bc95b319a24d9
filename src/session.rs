// src/session.rs
//! Render session
//!
//! Owns the bridge between the UI-facing model catalog and the GPU-facing
//! viewer. The session accepts model load requests at any time: before a
//! surface exists they are buffered (latest request wins, earlier ones are
//! discarded), and the buffered request is flushed once the surface
//! attaches. Frame production is gated by the host lifecycle: frames run
//! only while the host is resumed.
//!
//! The GPU side is abstracted behind [`SurfaceViewer`] so the session's
//! buffering and gating rules are testable without a device.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use crate::assets::AssetStore;
use crate::error::ViewerError;
use crate::lifecycle::{Lifecycle, LifecycleObserver, SubscriptionId};

/// Model container format, chosen from the asset file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    /// Binary glTF container.
    Glb,
    /// Wavefront OBJ text.
    Obj,
}

impl ModelFormat {
    pub fn from_path(path: &str) -> Result<Self, ViewerError> {
        let extension = path.rsplit('.').next().unwrap_or_default();
        match extension.to_ascii_lowercase().as_str() {
            "glb" => Ok(Self::Glb),
            "obj" => Ok(Self::Obj),
            other => Err(ViewerError::UnsupportedModelFormat(other.to_string())),
        }
    }
}

/// Touch phase for pointer events, mirroring the host's touch reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Started,
    Moved,
    Ended,
    Cancelled,
}

/// A pointer interaction forwarded to the viewer's camera controller.
///
/// Positions are in physical surface pixels. The app translates host window
/// events into this form so the camera path stays host-agnostic. Keyboard
/// modifier changes ride along as `Modifiers` so drags can switch between
/// orbiting and panning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Pressed,
    Released,
    Moved { x: f32, y: f32 },
    Scroll { delta: f32 },
    Pinch { delta: f32 },
    Touch { phase: TouchPhase, x: f32, y: f32 },
    Modifiers { shift: bool },
}

/// GPU-facing surface operations the session drives.
///
/// The production implementation is `gfx::ModelViewer`; tests substitute a
/// recording fake.
pub trait SurfaceViewer {
    /// Decodes model bytes and replaces the displayed model.
    fn load_model(
        &mut self,
        name: &str,
        format: ModelFormat,
        bytes: &[u8],
    ) -> Result<(), ViewerError>;

    /// Rescales and recenters the displayed model to fit a unit cube at the
    /// origin.
    fn frame_model(&mut self);

    /// Decodes an equirectangular Radiance HDR panorama and installs
    /// image-based lighting plus the sky background.
    fn setup_environment(&mut self, hdr_bytes: &[u8]) -> Result<(), ViewerError>;

    /// Forwards a pointer interaction to the camera controller.
    fn pointer_event(&mut self, event: PointerEvent);

    /// Resizes the render surface.
    fn resize(&mut self, width: u32, height: u32);

    /// Renders one frame. `frame_time_nanos` is a monotonic timestamp used
    /// for animation pacing.
    fn render(&mut self, frame_time_nanos: u64);
}

/// Shares the lifecycle-driven frame gate between the session and its
/// lifecycle subscription.
struct FramePacing {
    gate: Rc<Cell<bool>>,
}

impl LifecycleObserver for FramePacing {
    fn on_resume(&mut self) {
        self.gate.set(true);
    }
    fn on_pause(&mut self) {
        self.gate.set(false);
    }
    fn on_destroy(&mut self) {
        self.gate.set(false);
    }
}

/// Drives a [`SurfaceViewer`] through the surface lifecycle.
pub struct RenderSession<V: SurfaceViewer> {
    assets: AssetStore,
    viewer: Option<V>,
    /// Latest load request accepted before the surface attached. A new
    /// request overwrites any buffered one.
    pending_asset: Option<String>,
    environment_asset: String,
    frame_gate: Rc<Cell<bool>>,
    subscription: Option<SubscriptionId>,
    epoch: Instant,
}

impl<V: SurfaceViewer> RenderSession<V> {
    pub fn new(assets: AssetStore, environment_asset: impl Into<String>) -> Self {
        Self {
            assets,
            viewer: None,
            pending_asset: None,
            environment_asset: environment_asset.into(),
            frame_gate: Rc::new(Cell::new(false)),
            subscription: None,
            epoch: Instant::now(),
        }
    }

    /// Attaches the render surface. `construct` builds the viewer bound to
    /// the surface; a construction failure is fatal and propagates. On
    /// success the session subscribes to the lifecycle for frame gating,
    /// installs the environment lighting, and flushes any buffered load
    /// request.
    pub fn attach_surface<F>(
        &mut self,
        construct: F,
        lifecycle: &mut Lifecycle,
    ) -> Result<(), ViewerError>
    where
        F: FnOnce() -> Result<V, ViewerError>,
    {
        let mut viewer = construct()?;

        let pacing = FramePacing {
            gate: self.frame_gate.clone(),
        };
        self.subscription = Some(lifecycle.subscribe(Rc::new(std::cell::RefCell::new(pacing))));
        self.frame_gate.set(lifecycle.is_resumed());
        self.epoch = Instant::now();

        // Environment lighting is best-effort: a missing or malformed
        // panorama leaves the scene lit by the directional light only.
        match self.assets.read(&self.environment_asset) {
            Ok(bytes) => {
                if let Err(err) = viewer.setup_environment(&bytes) {
                    log::error!("environment setup failed: {err}");
                }
            }
            Err(err) => log::error!("environment setup failed: {err}"),
        }

        self.viewer = Some(viewer);

        if let Some(asset_path) = self.pending_asset.take() {
            self.load_model(&asset_path);
        }
        Ok(())
    }

    /// Requests a model load by bundled asset path. Before the surface
    /// attaches the request is buffered, replacing any earlier buffered
    /// request. After attach the asset is read, decoded and framed
    /// immediately; failures are logged and leave the previous model
    /// displayed.
    pub fn load_model(&mut self, asset_path: &str) {
        let Some(viewer) = self.viewer.as_mut() else {
            self.pending_asset = Some(asset_path.to_string());
            return;
        };

        let loaded = Self::load_into(&self.assets, viewer, asset_path);
        if let Err(err) = loaded {
            log::error!("failed to load model '{asset_path}': {err}");
        }
    }

    fn load_into(assets: &AssetStore, viewer: &mut V, asset_path: &str) -> Result<(), ViewerError> {
        let format = ModelFormat::from_path(asset_path)?;
        let bytes = assets.read(asset_path)?;
        let name = asset_path
            .rsplit('/')
            .next()
            .and_then(|file| file.split('.').next())
            .unwrap_or(asset_path);
        viewer.load_model(name, format, &bytes)?;
        viewer.frame_model();
        Ok(())
    }

    /// Detaches and unsubscribes. The lifecycle also drops the subscription
    /// itself on destroy; calling this is only needed for early teardown.
    pub fn detach_surface(&mut self, lifecycle: &mut Lifecycle) {
        if let Some(id) = self.subscription.take() {
            lifecycle.unsubscribe(id);
        }
        self.frame_gate.set(false);
        self.viewer = None;
    }

    pub fn is_attached(&self) -> bool {
        self.viewer.is_some()
    }

    pub fn pending_asset(&self) -> Option<&str> {
        self.pending_asset.as_deref()
    }

    /// Whether continuous frames should run right now.
    pub fn frames_enabled(&self) -> bool {
        self.frame_gate.get() && self.viewer.is_some()
    }

    /// Monotonic timestamp for the next frame, measured from surface attach.
    pub fn frame_time_nanos(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    /// Renders one frame if the lifecycle gate is open and a surface is
    /// attached. Returns whether a frame was produced.
    pub fn render_frame(&mut self) -> bool {
        if !self.frame_gate.get() {
            return false;
        }
        let nanos = self.frame_time_nanos();
        match self.viewer.as_mut() {
            Some(viewer) => {
                viewer.render(nanos);
                true
            }
            None => false,
        }
    }

    pub fn pointer_event(&mut self, event: PointerEvent) {
        if let Some(viewer) = self.viewer.as_mut() {
            viewer.pointer_event(event);
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(viewer) = self.viewer.as_mut() {
            viewer.resize(width, height);
        }
    }

    pub fn viewer(&self) -> Option<&V> {
        self.viewer.as_ref()
    }

    pub fn viewer_mut(&mut self) -> Option<&mut V> {
        self.viewer.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[derive(Default)]
    struct FakeViewer {
        loads: Vec<(String, ModelFormat, usize)>,
        framed: usize,
        environments: usize,
        frames: Vec<u64>,
        pointer_events: Vec<PointerEvent>,
        fail_loads: bool,
    }

    impl SurfaceViewer for FakeViewer {
        fn load_model(
            &mut self,
            name: &str,
            format: ModelFormat,
            bytes: &[u8],
        ) -> Result<(), ViewerError> {
            if self.fail_loads {
                return Err(ViewerError::ModelDecode {
                    name: name.to_string(),
                    reason: "forced failure".to_string(),
                });
            }
            self.loads.push((name.to_string(), format, bytes.len()));
            Ok(())
        }

        fn frame_model(&mut self) {
            self.framed += 1;
        }

        fn setup_environment(&mut self, _hdr_bytes: &[u8]) -> Result<(), ViewerError> {
            self.environments += 1;
            Ok(())
        }

        fn pointer_event(&mut self, event: PointerEvent) {
            self.pointer_events.push(event);
        }

        fn resize(&mut self, _width: u32, _height: u32) {}

        fn render(&mut self, frame_time_nanos: u64) {
            self.frames.push(frame_time_nanos);
        }
    }

    fn asset_store_with(files: &[(&str, &[u8])]) -> (AssetStore, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!(
            "vesalius_session_test_{}_{:?}",
            std::process::id(),
            std::thread::current().id()
        ));
        let _ = fs::remove_dir_all(&dir);
        for (name, bytes) in files {
            let path = dir.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, bytes).unwrap();
        }
        fs::create_dir_all(&dir).unwrap();
        (AssetStore::new(&dir), dir)
    }

    fn attach(session: &mut RenderSession<FakeViewer>, lifecycle: &mut Lifecycle) {
        session
            .attach_surface(|| Ok(FakeViewer::default()), lifecycle)
            .unwrap();
    }

    #[test]
    fn test_model_format_from_path() {
        assert_eq!(
            ModelFormat::from_path("models/heart.glb").unwrap(),
            ModelFormat::Glb
        );
        assert_eq!(
            ModelFormat::from_path("models/HEART.OBJ").unwrap(),
            ModelFormat::Obj
        );
        assert!(matches!(
            ModelFormat::from_path("models/heart.fbx"),
            Err(ViewerError::UnsupportedModelFormat(ext)) if ext == "fbx"
        ));
    }

    #[test]
    fn test_requests_before_attach_are_buffered_latest_wins() {
        let (assets, dir) = asset_store_with(&[
            ("models/heart.glb", b"heart-bytes"),
            ("env.hdr", b"not-used-by-fake"),
        ]);
        let mut session = RenderSession::<FakeViewer>::new(assets, "env.hdr");

        session.load_model("models/liver.glb");
        session.load_model("models/heart.glb");
        assert_eq!(session.pending_asset(), Some("models/heart.glb"));
        assert!(!session.is_attached());

        let mut lifecycle = Lifecycle::new();
        attach(&mut session, &mut lifecycle);

        let viewer = session.viewer().unwrap();
        assert_eq!(viewer.loads.len(), 1);
        assert_eq!(viewer.loads[0].0, "heart");
        assert_eq!(viewer.loads[0].1, ModelFormat::Glb);
        assert_eq!(viewer.loads[0].2, b"heart-bytes".len());
        assert_eq!(viewer.framed, 1);
        assert_eq!(viewer.environments, 1);
        assert!(session.pending_asset().is_none());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_load_after_attach_is_immediate() {
        let (assets, dir) = asset_store_with(&[
            ("models/lungs.glb", b"lungs"),
            ("env.hdr", b"hdr"),
        ]);
        let mut session = RenderSession::<FakeViewer>::new(assets, "env.hdr");
        let mut lifecycle = Lifecycle::new();
        attach(&mut session, &mut lifecycle);

        session.load_model("models/lungs.glb");
        assert_eq!(session.viewer().unwrap().loads.len(), 1);
        assert!(session.pending_asset().is_none());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_load_failures_keep_previous_model() {
        let (assets, dir) = asset_store_with(&[
            ("models/heart.glb", b"heart"),
            ("env.hdr", b"hdr"),
        ]);
        let mut session = RenderSession::<FakeViewer>::new(assets, "env.hdr");
        let mut lifecycle = Lifecycle::new();
        attach(&mut session, &mut lifecycle);

        session.load_model("models/heart.glb");

        // Missing asset, unsupported extension and decode failure are all
        // swallowed without disturbing the displayed model.
        session.load_model("models/missing.glb");
        session.load_model("models/heart.fbx");
        session.viewer_mut().unwrap().fail_loads = true;
        session.load_model("models/heart.glb");

        let viewer = session.viewer().unwrap();
        assert_eq!(viewer.loads.len(), 1);
        assert_eq!(viewer.framed, 1);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_missing_environment_is_not_fatal() {
        let (assets, dir) = asset_store_with(&[("models/heart.glb", b"heart")]);
        let mut session = RenderSession::<FakeViewer>::new(assets, "missing_env.hdr");
        let mut lifecycle = Lifecycle::new();
        attach(&mut session, &mut lifecycle);

        assert!(session.is_attached());
        assert_eq!(session.viewer().unwrap().environments, 0);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_frames_follow_lifecycle_gate() {
        let (assets, dir) = asset_store_with(&[("env.hdr", b"hdr")]);
        let mut session = RenderSession::<FakeViewer>::new(assets, "env.hdr");
        let mut lifecycle = Lifecycle::new();
        attach(&mut session, &mut lifecycle);

        // Not resumed yet: no frames.
        assert!(!session.frames_enabled());
        assert!(!session.render_frame());

        lifecycle.resume();
        assert!(session.frames_enabled());
        assert!(session.render_frame());
        assert!(session.render_frame());

        lifecycle.pause();
        assert!(!session.frames_enabled());
        assert!(!session.render_frame());

        lifecycle.resume();
        assert!(session.render_frame());

        let frames = &session.viewer().unwrap().frames;
        assert_eq!(frames.len(), 3);
        // Frame timestamps are monotonic.
        assert!(frames.windows(2).all(|w| w[0] <= w[1]));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_destroy_disarms_frames_permanently() {
        let (assets, dir) = asset_store_with(&[("env.hdr", b"hdr")]);
        let mut session = RenderSession::<FakeViewer>::new(assets, "env.hdr");
        let mut lifecycle = Lifecycle::new();
        attach(&mut session, &mut lifecycle);

        lifecycle.resume();
        assert!(session.render_frame());

        lifecycle.destroy();
        assert_eq!(lifecycle.observer_count(), 0);
        assert!(!session.frames_enabled());
        assert!(!session.render_frame());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_attach_while_resumed_opens_gate() {
        let (assets, dir) = asset_store_with(&[("env.hdr", b"hdr")]);
        let mut session = RenderSession::<FakeViewer>::new(assets, "env.hdr");
        let mut lifecycle = Lifecycle::new();

        lifecycle.resume();
        attach(&mut session, &mut lifecycle);
        assert!(session.frames_enabled());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_attach_failure_propagates() {
        let (assets, dir) = asset_store_with(&[]);
        let mut session = RenderSession::<FakeViewer>::new(assets, "env.hdr");
        let mut lifecycle = Lifecycle::new();

        let result = session.attach_surface(
            || Err(ViewerError::SurfaceCreation("no adapter".to_string())),
            &mut lifecycle,
        );
        assert!(result.is_err());
        assert!(!session.is_attached());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_pointer_events_forward_to_viewer() {
        let (assets, dir) = asset_store_with(&[("env.hdr", b"hdr")]);
        let mut session = RenderSession::<FakeViewer>::new(assets, "env.hdr");

        // Dropped silently before attach.
        session.pointer_event(PointerEvent::Pressed);

        let mut lifecycle = Lifecycle::new();
        attach(&mut session, &mut lifecycle);
        session.pointer_event(PointerEvent::Moved { x: 4.0, y: 2.0 });
        session.pointer_event(PointerEvent::Scroll { delta: 1.5 });

        let viewer = session.viewer().unwrap();
        assert_eq!(
            viewer.pointer_events,
            [
                PointerEvent::Moved { x: 4.0, y: 2.0 },
                PointerEvent::Scroll { delta: 1.5 }
            ]
        );

        let _ = fs::remove_dir_all(dir);
    }
}

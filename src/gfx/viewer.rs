//! The GPU-backed model viewer.
//!
//! [`ModelViewer`] is the production [`SurfaceViewer`]: it owns the render
//! engine bound to the window surface and the scene holding the displayed
//! model. The session drives it through the trait; the app additionally uses
//! [`ModelViewer::render_with_ui`] to overlay the browser interface.

use crate::error::ViewerError;
use crate::gfx::environment::{hdr::decode_hdr, IblBaker};
use crate::gfx::rendering::RenderEngine;
use crate::gfx::scene::Scene;
use crate::session::{ModelFormat, PointerEvent, SurfaceViewer};

pub struct ModelViewer {
    engine: RenderEngine,
    scene: Scene,
    ibl_baker: IblBaker,
}

impl ModelViewer {
    /// Bootstraps the GPU against the given window surface. Failure here is
    /// fatal for the session attach.
    pub fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self, ViewerError> {
        let engine = pollster::block_on(RenderEngine::new(window, width, height))?;
        let ibl_baker = IblBaker::new(engine.device());
        let aspect = width as f32 / height.max(1) as f32;

        Ok(Self {
            engine,
            scene: Scene::new(aspect),
            ibl_baker,
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn engine(&self) -> &RenderEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut RenderEngine {
        &mut self.engine
    }

    /// Renders one frame with a UI overlay drawn after the scene passes.
    pub fn render_with_ui<F>(&mut self, frame_time_nanos: u64, ui_callback: F)
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        self.advance_frame(frame_time_nanos);
        self.engine.render_frame(&self.scene, Some(ui_callback));
    }

    /// Per-frame CPU and upload work shared by both render paths.
    fn advance_frame(&mut self, frame_time_nanos: u64) {
        self.scene.update(frame_time_nanos);
        self.engine.prepare_scene(&mut self.scene);
        self.engine.update(&self.scene);
    }
}

impl SurfaceViewer for ModelViewer {
    fn load_model(
        &mut self,
        name: &str,
        format: ModelFormat,
        bytes: &[u8],
    ) -> Result<(), ViewerError> {
        self.scene.replace_model(name, format, bytes)
    }

    fn frame_model(&mut self) {
        self.scene.frame_model();
    }

    fn setup_environment(&mut self, hdr_bytes: &[u8]) -> Result<(), ViewerError> {
        let image = decode_hdr(hdr_bytes)?;
        let maps = self
            .ibl_baker
            .bake(self.engine.device(), self.engine.queue(), &image);
        self.engine.set_environment(maps);
        Ok(())
    }

    fn pointer_event(&mut self, event: PointerEvent) {
        self.scene.camera_manager.process_pointer(event);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.engine.resize(width, height);
        self.scene
            .camera_manager
            .camera
            .resize_projection(width, height);
    }

    fn render(&mut self, frame_time_nanos: u64) {
        self.advance_frame(frame_time_nanos);
        self.engine.render_frame_simple(&self.scene);
    }
}

//! WGPU-based rendering engine
//!
//! Owns the surface, device and per-frame render graph: a shadow depth pass,
//! the main PBR pass with image-based lighting, the sky background pass and
//! an optional UI overlay.

use std::sync::Arc;
use wgpu::TextureFormat;

use crate::error::ViewerError;
use crate::gfx::{
    environment::EnvironmentMaps,
    resources::{
        global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO},
        material::MaterialBindings,
        texture_resource::TextureResource,
    },
    scene::{object::Object, scene::Scene},
};
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
};

use super::pipeline_manager::{PipelineConfig, PipelineManager};
use super::skybox::SkyPass;

const SHADOW_MAP_SIZE: u32 = 2048;

/// Core rendering engine managing GPU resources and draw calls.
///
/// Bind group slots are fixed across the PBR pipeline:
/// 0 globals, 1 object transform, 2 material, 3 shadow map, 4 environment.
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    pub pipeline_manager: PipelineManager,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,

    shadow_map: TextureResource,
    shadow_bind_group: wgpu::BindGroup,

    transform_layout: BindGroupLayoutWithDesc,

    environment_layout: BindGroupLayoutWithDesc,
    environment_bind_group: wgpu::BindGroup,
    // Kept alive for as long as the bind groups reference its textures.
    environment: EnvironmentMaps,
    has_environment: bool,

    sky: SkyPass,
}

impl RenderEngine {
    /// Creates a render engine for the given window.
    ///
    /// Fails with [`ViewerError::SurfaceCreation`] when no usable adapter or
    /// device exists; the caller treats that as fatal.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<RenderEngine, ViewerError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|e| ViewerError::SurfaceCreation(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| ViewerError::SurfaceCreation(e.to_string()))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| ViewerError::SurfaceCreation(e.to_string()))?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(surface_capabilities.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            // Vsync-paced: the viewer redraws continuously while resumed.
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");
        let shadow_map = TextureResource::create_shadow_map(&device, SHADOW_MAP_SIZE);

        let shadow_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_depth_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Comparison))
            .create(&device, "Shadow Layout");
        let shadow_bind_group = BindGroupBuilder::new(&shadow_layout)
            .texture(&shadow_map.view)
            .sampler(&shadow_map.sampler)
            .create(&device, "Shadow Bind Group");

        let global_ubo = GlobalUBO::new(&device);
        let mut global_bindings = GlobalBindings::new(&device);
        global_bindings.create_bind_group(&device, &global_ubo);

        let transform_layout = BindGroupLayoutBuilder::new()
            .next_binding_vertex(binding_types::uniform())
            .create(&device, "Transform Layout");

        // Prefiltered environment set: irradiance, specular chain, BRDF LUT
        // and a shared sampler. Starts on black placeholders so the PBR
        // pipeline layout never changes.
        let environment_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_cube())
            .next_binding_fragment(binding_types::texture_cube())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(&device, "Environment Layout");
        let environment = EnvironmentMaps::placeholder(&device);
        let environment_bind_group =
            Self::create_environment_bind_group(&device, &environment_layout, &environment);

        let sky = SkyPass::new(&device);

        let temp_material_bindings = MaterialBindings::new(&device);
        let material_layout = temp_material_bindings.bind_group_layouts().clone();

        let device_handle: Arc<wgpu::Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        let _ = pipeline_manager.load_shader("pbr", include_str!("pbr.wgsl"));
        let _ = pipeline_manager.load_shader("shadow", include_str!("shadow_pass.wgsl"));
        let _ = pipeline_manager.load_shader("sky", include_str!("skybox.wgsl"));

        // Depth-only shadow pass. No culling, so thin closed meshes do not
        // leak light through their backfaces.
        pipeline_manager.register_pipeline(
            "Shadow",
            PipelineConfig::default()
                .with_label("SHADOW")
                .with_shader("shadow")
                .with_depth_stencil(shadow_map.texture.clone())
                .with_cull_mode(None)
                .with_vertex_only()
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layouts().clone(),
                    transform_layout.layout.clone(),
                ])
                .with_color_targets(vec![]),
        );

        pipeline_manager.register_pipeline(
            "PBR",
            PipelineConfig::default()
                .with_label("PBR")
                .with_shader("pbr")
                .with_depth_stencil(depth_texture.texture.clone())
                .with_color_targets(vec![Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })])
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layouts().clone(),
                    transform_layout.layout.clone(),
                    material_layout,
                    shadow_layout.layout.clone(),
                    environment_layout.layout.clone(),
                ]),
        );

        // Sky fills the far plane after the model is drawn.
        pipeline_manager.register_pipeline(
            "Sky",
            PipelineConfig::default()
                .with_label("SKY")
                .with_shader("sky")
                .with_depth_stencil(depth_texture.texture.clone())
                .with_read_only_depth()
                .with_cull_mode(None)
                .with_no_vertex_buffers()
                .with_color_targets(vec![Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })])
                .with_bind_group_layouts(sky.bind_group_layouts()),
        );

        if let Err(errors) = pipeline_manager.create_all_pipelines() {
            for error in &errors {
                log::error!("pipeline creation: {error}");
            }
        }

        Ok(RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            depth_texture,
            format,
            pipeline_manager,
            global_ubo,
            global_bindings,
            shadow_map,
            shadow_bind_group,
            transform_layout,
            environment_layout,
            environment_bind_group,
            environment,
            has_environment: false,
            sky,
        })
    }

    fn create_environment_bind_group(
        device: &wgpu::Device,
        layout: &BindGroupLayoutWithDesc,
        maps: &EnvironmentMaps,
    ) -> wgpu::BindGroup {
        BindGroupBuilder::new(layout)
            .texture(&maps.irradiance.view)
            .texture(&maps.specular.view)
            .texture(&maps.brdf_lut.view)
            .sampler(&maps.specular.sampler)
            .create(device, "Environment Bind Group")
    }

    /// Installs a prefiltered environment, replacing the placeholder (or the
    /// previous environment). The sky pass starts drawing from this point.
    pub fn set_environment(&mut self, maps: EnvironmentMaps) {
        self.environment_bind_group =
            Self::create_environment_bind_group(&self.device, &self.environment_layout, &maps);
        self.sky.set_environment(&self.device, &maps.environment);
        self.environment = maps;
        self.has_environment = true;
    }

    pub fn has_environment(&self) -> bool {
        self.has_environment
    }

    /// Uploads whatever the scene needs on the GPU before encoding: mesh
    /// buffers, per-object transforms and material uniforms.
    pub fn prepare_scene(&mut self, scene: &mut Scene) {
        scene
            .material_manager
            .update_all_gpu_resources(&self.device, &self.queue);

        for object in &mut scene.objects {
            for mesh in &mut object.meshes {
                mesh.ensure_gpu_buffers(&self.device);
            }

            if object.gpu_resources.is_none() {
                let transform_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("Object Transform Buffer"),
                    size: std::mem::size_of::<[[f32; 4]; 4]>() as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                let transform_bind_group = BindGroupBuilder::new(&self.transform_layout)
                    .resource(transform_buffer.as_entire_binding())
                    .create(&self.device, "Object Transform Bind Group");
                object.gpu_resources = Some(crate::gfx::scene::object::ObjectGpuResources {
                    transform_buffer,
                    transform_bind_group,
                });
            }

            if let Some(gpu) = &object.gpu_resources {
                let transform: [[f32; 4]; 4] = object.transform.into();
                self.queue
                    .write_buffer(&gpu.transform_buffer, 0, bytemuck::cast_slice(&transform));
            }
        }
    }

    /// Updates the per-frame uniforms from the scene's camera and light.
    pub fn update(&mut self, scene: &Scene) {
        update_global_ubo(
            &mut self.global_ubo,
            &self.queue,
            scene.camera_manager.camera.uniform,
            scene.light,
            scene.ibl_intensity,
        );
        self.sky.update(
            &self.queue,
            scene
                .camera_manager
                .camera
                .build_rotation_only_view_projection(),
        );
    }

    /// Renders a frame: shadow pass, PBR pass, sky pass, then the optional
    /// UI overlay callback.
    pub fn render_frame<F>(&mut self, scene: &Scene, ui_callback: Option<F>)
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(e) => {
                log::error!("surface frame acquisition failed: {e}");
                return;
            }
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        if scene.light.cast_shadows {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Depth Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            shadow_pass.set_bind_group(0, self.global_bindings.bind_groups(), &[]);

            if let Some(shadow_pipeline) = self.pipeline_manager.get_pipeline("Shadow") {
                shadow_pass.set_pipeline(shadow_pipeline);
                for object in scene.objects.iter().filter(|o| o.visible) {
                    Self::draw_object(&mut shadow_pass, object);
                }
            }
        }

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.02,
                            g: 0.02,
                            b: 0.03,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.global_bindings.bind_groups(), &[]);
            render_pass.set_bind_group(3, &self.shadow_bind_group, &[]);
            render_pass.set_bind_group(4, &self.environment_bind_group, &[]);

            if let Some(pipeline) = self.pipeline_manager.get_pipeline("PBR") {
                render_pass.set_pipeline(pipeline);

                for object in scene.objects.iter().filter(|o| o.visible) {
                    let material = scene
                        .material_manager
                        .get_material_for_object(object.material_id.as_ref());
                    if let Some(material_bind_group) = material.get_bind_group() {
                        render_pass.set_bind_group(2, material_bind_group, &[]);
                        Self::draw_object(&mut render_pass, object);
                    }
                }
            }

            if self.sky.has_environment() {
                if let Some(sky_pipeline) = self.pipeline_manager.get_pipeline("Sky") {
                    self.sky.record(&mut render_pass, sky_pipeline);
                }
            }
        }

        if let Some(ui_callback) = ui_callback {
            ui_callback(
                &self.device,
                &self.queue,
                &mut encoder,
                &surface_texture_view,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
    }

    /// Convenience method for rendering without a UI overlay.
    pub fn render_frame_simple(&mut self, scene: &Scene) {
        self.render_frame(
            scene,
            None::<fn(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView)>,
        );
    }

    fn draw_object(render_pass: &mut wgpu::RenderPass, object: &Object) {
        let Some(gpu) = &object.gpu_resources else {
            return;
        };
        render_pass.set_bind_group(1, &gpu.transform_bind_group, &[]);
        for mesh in &object.meshes {
            if let (Some(vertex_buffer), Some(index_buffer)) =
                (mesh.vertex_buffer(), mesh.index_buffer())
            {
                render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
                render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }
    }

    /// Resizes the surface and recreates the depth buffer. The shadow map
    /// keeps its fixed resolution.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    /// Switches between vsync-paced (FIFO) and immediate presentation.
    pub fn set_vsync(&mut self, enabled: bool) {
        let mode = if enabled {
            wgpu::PresentMode::Fifo
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        if self.config.present_mode != mode {
            self.config.present_mode = mode;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

//! Sky background pass.
//!
//! Draws the environment cubemap behind the model with a fullscreen
//! triangle. Depth is tested read-only against the scene depth buffer, so
//! the sky only fills pixels left at the far plane.

use cgmath::{Matrix4, SquareMatrix};

use crate::gfx::resources::TextureResource;
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::UniformBuffer,
};

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct SkyUniformContent {
    /// Inverse of the rotation-only view-projection: clip space back to a
    /// world-space view direction.
    inv_rotation_view_proj: [[f32; 4]; 4],
}

/// Resources for the sky pass. The pipeline itself lives in the pipeline
/// manager; this owns the bind groups it needs.
pub struct SkyPass {
    uniform: UniformBuffer<SkyUniformContent>,
    uniform_layout: BindGroupLayoutWithDesc,
    uniform_bind_group: wgpu::BindGroup,
    env_layout: BindGroupLayoutWithDesc,
    env_bind_group: Option<wgpu::BindGroup>,
}

impl SkyPass {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform = UniformBuffer::new_with_data(
            device,
            &SkyUniformContent {
                inv_rotation_view_proj: Matrix4::identity().into(),
            },
        );

        let uniform_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Sky Uniform Layout");
        let uniform_bind_group = BindGroupBuilder::new(&uniform_layout)
            .resource(uniform.binding_resource())
            .create(device, "Sky Uniform Bind Group");

        let env_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_cube())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(device, "Sky Environment Layout");

        Self {
            uniform,
            uniform_layout,
            uniform_bind_group,
            env_layout,
            env_bind_group: None,
        }
    }

    /// Layouts in bind slot order for pipeline registration.
    pub fn bind_group_layouts(&self) -> Vec<wgpu::BindGroupLayout> {
        vec![
            self.uniform_layout.layout.clone(),
            self.env_layout.layout.clone(),
        ]
    }

    /// Points the sky at a new environment cubemap. Until the first call the
    /// pass draws nothing.
    pub fn set_environment(&mut self, device: &wgpu::Device, environment: &TextureResource) {
        self.env_bind_group = Some(
            BindGroupBuilder::new(&self.env_layout)
                .texture(&environment.view)
                .sampler(&environment.sampler)
                .create(device, "Sky Environment Bind Group"),
        );
    }

    pub fn has_environment(&self) -> bool {
        self.env_bind_group.is_some()
    }

    /// Updates the unprojection matrix from the camera's rotation-only
    /// view-projection.
    pub fn update(&mut self, queue: &wgpu::Queue, rotation_view_proj: Matrix4<f32>) {
        let inverse = rotation_view_proj
            .invert()
            .unwrap_or_else(Matrix4::identity);
        self.uniform.update_content(
            queue,
            SkyUniformContent {
                inv_rotation_view_proj: inverse.into(),
            },
        );
    }

    /// Records the fullscreen draw. No-op while no environment is set.
    pub fn record<'a>(
        &'a self,
        render_pass: &mut wgpu::RenderPass<'a>,
        pipeline: &'a wgpu::RenderPipeline,
    ) {
        let Some(env_bind_group) = &self.env_bind_group else {
            return;
        };
        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        render_pass.set_bind_group(1, env_bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}

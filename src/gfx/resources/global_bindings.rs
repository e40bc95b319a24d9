//! Global uniform bindings for camera and lighting data
//!
//! Manages the per-frame uniform buffer and bind group shared by every
//! render pipeline: camera matrices, the directional key light and the
//! image-based-lighting intensity. Bound to slot 0 in all pipelines.

use cgmath::{InnerSpace, SquareMatrix};

use crate::{
    gfx::camera::camera_utils::CameraUniform,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Global uniform buffer content.
///
/// MUST match the `Globals` struct in the shaders exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct GlobalUBOContent {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],

    light_direction: [f32; 3],
    ibl_intensity: f32,
    light_color: [f32; 3],
    light_intensity: f32,
    // Light's view-projection matrix for shadow lookup
    light_view_proj: [[f32; 4]; 4],
}

unsafe impl bytemuck::Pod for GlobalUBOContent {}
unsafe impl bytemuck::Zeroable for GlobalUBOContent {}

/// Directional key light.
///
/// Intensity is photometric (lux); the shader pre-exposes it. Direction is
/// the direction light travels, not the direction towards the light.
#[derive(Copy, Clone, Debug)]
pub struct DirectionalLight {
    pub direction: [f32; 3],
    pub color: [f32; 3],
    pub intensity: f32,
    pub cast_shadows: bool,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: [0.0, -1.0, 0.0],
            color: [1.0, 1.0, 1.0],
            intensity: 50_000.0,
            cast_shadows: true,
        }
    }
}

impl DirectionalLight {
    /// Orthographic view-projection covering the unit-cube framing volume,
    /// looking along the light direction at the origin.
    pub fn view_proj(&self) -> cgmath::Matrix4<f32> {
        let direction = cgmath::Vector3::from(self.direction);
        let direction = if direction.magnitude2() > 0.0 {
            direction.normalize()
        } else {
            -cgmath::Vector3::unit_y()
        };
        let eye = cgmath::Point3::new(-direction.x * 4.0, -direction.y * 4.0, -direction.z * 4.0);

        // Pick an up vector not parallel to the light direction.
        let up = if direction.y.abs() > 0.99 {
            cgmath::Vector3::unit_z()
        } else {
            cgmath::Vector3::unit_y()
        };

        let view = cgmath::Matrix4::look_at_rh(eye, cgmath::Point3::new(0.0, 0.0, 0.0), up);
        let proj = cgmath::ortho(-1.5, 1.5, -1.5, 1.5, 0.1, 8.0);
        proj * view
    }
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

/// Updates the global uniform buffer with camera, light and IBL data.
///
/// Called each frame before encoding render passes.
pub fn update_global_ubo(
    ubo: &mut GlobalUBO,
    queue: &wgpu::Queue,
    camera: CameraUniform,
    light: DirectionalLight,
    ibl_intensity: f32,
) {
    let content = GlobalUBOContent {
        view_position: camera.view_position,
        view_proj: camera.view_proj,
        light_direction: light.direction,
        ibl_intensity,
        light_color: light.color,
        light_intensity: light.intensity,
        light_view_proj: if light.cast_shadows {
            light.view_proj().into()
        } else {
            cgmath::Matrix4::identity().into()
        },
    };

    ubo.update_content(queue, content);
}

/// Manages the bind group layout and bind group for global uniforms.
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: Option<wgpu::BindGroup>,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Globals Bind Group");

        GlobalBindings {
            bind_group_layout,
            bind_group: None,
        }
    }

    /// Creates the bind group with the provided uniform buffer. Must be
    /// called before any rendering that needs global uniforms.
    pub fn create_bind_group(&mut self, device: &wgpu::Device, ubo: &GlobalUBO) {
        self.bind_group = Some(
            BindGroupBuilder::new(&self.bind_group_layout)
                .resource(ubo.binding_resource())
                .create(device, "Global Bind Group"),
        );
    }

    pub fn bind_group_layouts(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    /// # Panics
    /// Panics if `create_bind_group()` hasn't been called yet
    pub fn bind_groups(&self) -> &wgpu::BindGroup {
        self.bind_group
            .as_ref()
            .expect("Bind group has not been created yet!")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_view_proj_handles_straight_down_light() {
        let light = DirectionalLight::default();
        let matrix = light.view_proj();
        // A finite matrix: the vertical light must not collapse against a
        // parallel up vector.
        let flat: [[f32; 4]; 4] = matrix.into();
        assert!(flat.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn test_global_ubo_content_size_matches_shader_layout() {
        // 16 + 64 + 12 + 4 + 12 + 4 + 64 bytes.
        assert_eq!(std::mem::size_of::<GlobalUBOContent>(), 176);
    }
}

//! GPU prefiltering of HDR panoramas for image-based lighting.
//!
//! Runs once per environment setup: the decoded panorama is uploaded as an
//! equirectangular texture, converted to a cubemap, then convolved into the
//! irradiance and roughness-chained specular maps the PBR shader samples.
//! The BRDF integration table only depends on the shading model, but it is
//! cheap enough to bake alongside the rest.

use crate::gfx::resources::TextureResource;
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::UniformBuffer,
};

use super::hdr::HdrImage;

pub const ENVIRONMENT_FACE_SIZE: u32 = 512;
pub const IRRADIANCE_FACE_SIZE: u32 = 64;
pub const SPECULAR_FACE_SIZE: u32 = 256;
pub const SPECULAR_MIP_COUNT: u32 = 6;
pub const BRDF_LUT_SIZE: u32 = 512;

const WORKGROUP_SIZE: u32 = 8;

/// The prefiltered texture set the PBR and sky passes bind.
pub struct EnvironmentMaps {
    /// Full-resolution environment cubemap, sampled by the sky pass.
    pub environment: TextureResource,
    /// Cosine-convolved diffuse irradiance.
    pub irradiance: TextureResource,
    /// GGX-prefiltered specular chain, roughness increasing per mip.
    pub specular: TextureResource,
    /// Split-sum BRDF integration table.
    pub brdf_lut: TextureResource,
    pub specular_mip_count: u32,
}

impl EnvironmentMaps {
    /// 1x1 black placeholder set so pipelines have a stable environment
    /// layout before any HDR is installed. wgpu zero-initializes textures,
    /// so these sample as black.
    pub fn placeholder(device: &wgpu::Device) -> Self {
        Self {
            environment: TextureResource::create_hdr_cubemap(device, 1, 1, "Placeholder Environment"),
            irradiance: TextureResource::create_hdr_cubemap(device, 1, 1, "Placeholder Irradiance"),
            specular: TextureResource::create_hdr_cubemap(device, 1, 1, "Placeholder Specular"),
            brdf_lut: create_lut_texture(device, 1, "Placeholder BRDF LUT"),
            specular_mip_count: 1,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct PrefilterParams {
    roughness: f32,
    _pad: [f32; 3],
}

/// Compute pipelines for the environment bake.
pub struct IblBaker {
    equirect_layout: BindGroupLayoutWithDesc,
    equirect_pipeline: wgpu::ComputePipeline,
    irradiance_layout: BindGroupLayoutWithDesc,
    irradiance_pipeline: wgpu::ComputePipeline,
    specular_layout: BindGroupLayoutWithDesc,
    specular_pipeline: wgpu::ComputePipeline,
    brdf_layout: BindGroupLayoutWithDesc,
    brdf_pipeline: wgpu::ComputePipeline,
}

impl IblBaker {
    pub fn new(device: &wgpu::Device) -> Self {
        let storage_cube = || {
            binding_types::image_2d_array(
                TextureResource::HDR_FORMAT,
                wgpu::StorageTextureAccess::WriteOnly,
            )
        };

        let equirect_layout = BindGroupLayoutBuilder::new()
            .next_binding_compute(binding_types::texture_2d())
            .next_binding_compute(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .next_binding_compute(storage_cube())
            .create(device, "Equirect To Cube Layout");
        let equirect_pipeline = create_compute_pipeline(
            device,
            "Equirect To Cube",
            include_str!("equirect_to_cube.wgsl"),
            &equirect_layout.layout,
        );

        let irradiance_layout = BindGroupLayoutBuilder::new()
            .next_binding_compute(binding_types::texture_cube())
            .next_binding_compute(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .next_binding_compute(storage_cube())
            .create(device, "Irradiance Layout");
        let irradiance_pipeline = create_compute_pipeline(
            device,
            "Irradiance Convolution",
            include_str!("irradiance.wgsl"),
            &irradiance_layout.layout,
        );

        let specular_layout = BindGroupLayoutBuilder::new()
            .next_binding_compute(binding_types::texture_cube())
            .next_binding_compute(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .next_binding_compute(storage_cube())
            .next_binding_compute(binding_types::uniform())
            .create(device, "Specular Prefilter Layout");
        let specular_pipeline = create_compute_pipeline(
            device,
            "Specular Prefilter",
            include_str!("specular_prefilter.wgsl"),
            &specular_layout.layout,
        );

        let brdf_layout = BindGroupLayoutBuilder::new()
            .next_binding_compute(binding_types::image_2d(
                TextureResource::HDR_FORMAT,
                wgpu::StorageTextureAccess::WriteOnly,
            ))
            .create(device, "BRDF LUT Layout");
        let brdf_pipeline = create_compute_pipeline(
            device,
            "BRDF Integration",
            include_str!("brdf_lut.wgsl"),
            &brdf_layout.layout,
        );

        Self {
            equirect_layout,
            equirect_pipeline,
            irradiance_layout,
            irradiance_pipeline,
            specular_layout,
            specular_pipeline,
            brdf_layout,
            brdf_pipeline,
        }
    }

    /// Uploads the panorama and runs the full prefilter chain. The
    /// equirectangular source texture is destroyed once the bake is
    /// submitted; only the cubemaps and the LUT survive.
    pub fn bake(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &HdrImage,
    ) -> EnvironmentMaps {
        let equirect =
            TextureResource::create_equirect_hdr(device, queue, image, "Environment Panorama");

        let environment = TextureResource::create_hdr_cubemap(
            device,
            ENVIRONMENT_FACE_SIZE,
            1,
            "Environment Cubemap",
        );
        let irradiance = TextureResource::create_hdr_cubemap(
            device,
            IRRADIANCE_FACE_SIZE,
            1,
            "Irradiance Cubemap",
        );
        let specular = TextureResource::create_hdr_cubemap(
            device,
            SPECULAR_FACE_SIZE,
            SPECULAR_MIP_COUNT,
            "Specular Cubemap",
        );
        let brdf_lut = create_lut_texture(device, BRDF_LUT_SIZE, "BRDF LUT");

        // Per-mip roughness uniforms, created up front so one submission
        // covers the whole chain.
        let specular_params: Vec<UniformBuffer<PrefilterParams>> = (0..SPECULAR_MIP_COUNT)
            .map(|mip| {
                let roughness = mip as f32 / (SPECULAR_MIP_COUNT - 1) as f32;
                UniformBuffer::new_with_data(
                    device,
                    &PrefilterParams {
                        roughness,
                        _pad: [0.0; 3],
                    },
                )
            })
            .collect();

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Environment Bake Encoder"),
        });

        // Stage 1: panorama to cubemap.
        {
            let out_view = storage_face_view(&environment.texture, 0);
            let bind_group = BindGroupBuilder::new(&self.equirect_layout)
                .texture(&equirect.view)
                .sampler(&equirect.sampler)
                .texture(&out_view)
                .create(device, "Equirect To Cube Bind Group");

            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Equirect To Cube Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.equirect_pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            dispatch_faces(&mut pass, ENVIRONMENT_FACE_SIZE);
        }

        // Stage 2: diffuse irradiance.
        {
            let out_view = storage_face_view(&irradiance.texture, 0);
            let bind_group = BindGroupBuilder::new(&self.irradiance_layout)
                .texture(&environment.view)
                .sampler(&environment.sampler)
                .texture(&out_view)
                .create(device, "Irradiance Bind Group");

            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Irradiance Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.irradiance_pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            dispatch_faces(&mut pass, IRRADIANCE_FACE_SIZE);
        }

        // Stage 3: specular prefilter, one dispatch per mip.
        {
            let mip_views: Vec<wgpu::TextureView> = (0..SPECULAR_MIP_COUNT)
                .map(|mip| storage_face_view(&specular.texture, mip))
                .collect();
            let bind_groups: Vec<wgpu::BindGroup> = mip_views
                .iter()
                .zip(&specular_params)
                .map(|(view, params)| {
                    BindGroupBuilder::new(&self.specular_layout)
                        .texture(&environment.view)
                        .sampler(&environment.sampler)
                        .texture(view)
                        .resource(params.binding_resource())
                        .create(device, "Specular Prefilter Bind Group")
                })
                .collect();

            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Specular Prefilter Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.specular_pipeline);
            for (mip, bind_group) in bind_groups.iter().enumerate() {
                pass.set_bind_group(0, bind_group, &[]);
                dispatch_faces(&mut pass, SPECULAR_FACE_SIZE >> mip);
            }
        }

        // Stage 4: BRDF integration table.
        {
            let bind_group = BindGroupBuilder::new(&self.brdf_layout)
                .texture(&brdf_lut.view)
                .create(device, "BRDF LUT Bind Group");

            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("BRDF Integration Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.brdf_pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            let groups = BRDF_LUT_SIZE.div_ceil(WORKGROUP_SIZE);
            pass.dispatch_workgroups(groups, groups, 1);
        }

        queue.submit(std::iter::once(encoder.finish()));

        // The panorama is only the bake input; release its memory now.
        equirect.texture.destroy();

        EnvironmentMaps {
            environment,
            irradiance,
            specular,
            brdf_lut,
            specular_mip_count: SPECULAR_MIP_COUNT,
        }
    }
}

fn dispatch_faces(pass: &mut wgpu::ComputePass, face_size: u32) {
    let groups = face_size.max(1).div_ceil(WORKGROUP_SIZE);
    pass.dispatch_workgroups(groups, groups, 6);
}

/// View over one mip of a cubemap, bound as a 2D array so a single dispatch
/// writes all six faces.
fn storage_face_view(texture: &wgpu::Texture, mip: u32) -> wgpu::TextureView {
    texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("Cubemap Storage View"),
        dimension: Some(wgpu::TextureViewDimension::D2Array),
        base_mip_level: mip,
        mip_level_count: Some(1),
        ..Default::default()
    })
}

fn create_lut_texture(device: &wgpu::Device, size: u32, label: &str) -> TextureResource {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TextureResource::HDR_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::STORAGE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });
    TextureResource {
        texture,
        view,
        sampler,
    }
}

fn create_compute_pipeline(
    device: &wgpu::Device,
    label: &str,
    source: &str,
    layout: &wgpu::BindGroupLayout,
) -> wgpu::ComputePipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });
    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        module: &module,
        entry_point: Some("cs_main"),
        compilation_options: wgpu::PipelineCompilationOptions::default(),
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specular_roughness_spans_full_range() {
        let last = SPECULAR_MIP_COUNT - 1;
        let first_roughness = 0.0 / last as f32;
        let last_roughness = last as f32 / last as f32;
        assert_eq!(first_roughness, 0.0);
        assert_eq!(last_roughness, 1.0);
    }

    #[test]
    fn test_specular_chain_stays_above_workgroup_size() {
        // The smallest prefiltered mip must still cover a full workgroup
        // dispatch.
        let smallest = SPECULAR_FACE_SIZE >> (SPECULAR_MIP_COUNT - 1);
        assert!(smallest >= WORKGROUP_SIZE);
    }
}

// src/gfx/environment/mod.rs
//! HDR environment lighting
//!
//! Decodes equirectangular Radiance HDR panoramas and prefilters them on the
//! GPU into the cubemaps the PBR pass samples: a base environment cubemap, a
//! diffuse irradiance cubemap, a roughness-chained specular cubemap and a
//! BRDF integration lookup table.

pub mod hdr;
pub mod ibl;

pub use hdr::HdrImage;
pub use ibl::{EnvironmentMaps, IblBaker};

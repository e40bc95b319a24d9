//! # Scene Management Module
//!
//! 3D scene management: the scene container, renderable objects, model
//! decoding and vertex data structures.
//!
//! ## Key Components
//!
//! - [`Scene`] - The main scene container that manages objects, camera, and materials
//! - [`Object`] - Individual 3D objects with meshes, materials, and transforms
//! - [`decode`] - Binary glTF and OBJ decoding into meshes and materials
//! - [`Vertex3D`] - 3D vertex data structure with position and normal

pub mod decode;
pub mod object;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use object::{Aabb, Mesh, Object};
pub use scene::Scene;
pub use vertex::Vertex3D;

//! GLB/glTF utilities for the pool-cue asset tools
//!
//! This library provides builder-pattern APIs for constructing and patching GLB files:
//! - BufferBuilder: Pack binary data with automatic 4-byte alignment
//! - MeshBuilder: Positions / normals / UVs / indices into accessors
//! - PbrMaterial: Named metallic-roughness materials
//! - GltfBuilder: Top-level document construction
//! - GlbDocument: Parse an existing GLB and append new meshes without
//!   disturbing existing indices
//!
//! # Example
//!
//! ```no_run
//! use glb_builder::*;
//!
//! let mut buffer = BufferBuilder::new();
//! let mesh = MeshBuilder::new()
//!     .positions(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]])
//!     .normals(&[[0.0, 0.0, 1.0]; 3])
//!     .indices(&[0, 1, 2])
//!     .build(&mut buffer)
//!     .unwrap();
//!
//! let gltf = GltfBuilder::new()
//!     .buffer_byte_length(buffer.data().len() as u64)
//!     .add_material(PbrMaterial::new("outside"))
//!     .add_mesh_from_accessors("Triangle", &[(mesh, Some(0))]);
//!
//! let root = gltf.build(buffer.views(), buffer.accessors(), "glb-builder");
//! let glb_bytes = assemble_glb(&root, buffer.data()).unwrap();
//! ```

pub mod buffer;
pub mod document;
pub mod error;
pub mod glb;
pub mod material;
pub mod mesh;
pub mod utils;

pub use buffer::{AccessorIndex, BufferBuilder};
pub use document::GltfBuilder;
pub use error::GlbError;
pub use glb::{AppendRequest, AppendedMesh, GlbDocument};
pub use material::PbrMaterial;
pub use mesh::{MeshAccessors, MeshBuilder};
pub use utils::{align_buffer, assemble_glb, compute_bounds, pad_to_4};

// Re-export commonly used gltf-json types
pub use gltf_json as json;
pub use gltf_json::validation::Checked::Valid;

/// Component type for 32-bit floats (FLOAT)
pub const COMPONENT_F32: u32 = 5126;
/// Component type for 16-bit unsigned integers (UNSIGNED_SHORT)
pub const COMPONENT_U16: u32 = 5123;
/// Buffer view target for vertex attributes (ARRAY_BUFFER)
pub const TARGET_ARRAY_BUFFER: u32 = 34962;
/// Buffer view target for indices (ELEMENT_ARRAY_BUFFER)
pub const TARGET_ELEMENT_ARRAY_BUFFER: u32 = 34963;

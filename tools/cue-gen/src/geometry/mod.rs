//! Procedural geometry for cue parts
//!
//! All meshes are Y-up with the cue axis along +Y, u16-indexed triangle lists.

mod shell;
mod uv;

pub use shell::{CapFacing, MIN_SEGMENTS, generate_cap, generate_shell, radius_at};
pub use uv::{Axis, CAP_NORMAL_THRESHOLD, CAP_UV, fix_cylindrical_seam, project_cylindrical};

use glb_builder::MeshBuilder;
use thiserror::Error;

/// Largest vertex count addressable by u16 indices
pub const MAX_VERTICES: usize = u16::MAX as usize + 1;

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("at least 3 radial segments are required, got {0}")]
    TooFewSegments(u32),

    #[error("{0} vertices exceed the u16 index range")]
    TooManyVertices(usize),

    #[error("radius must not be negative, got {0}")]
    NegativeRadius(f32),

    #[error("mesh has {actual} {attribute} values for {expected} vertices")]
    MissingAttribute {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// One primitive's worth of vertex data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// TEXCOORD_0, empty when the mesh has none
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u16>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Merge another mesh into this one, offsetting its indices
    ///
    /// Normals and UVs must be present on both meshes or on neither.
    pub fn append(&mut self, other: &MeshData) -> Result<(), GeometryError> {
        let base = self.positions.len();
        let total = base + other.positions.len();
        if total > MAX_VERTICES {
            return Err(GeometryError::TooManyVertices(total));
        }

        let attributes = [
            ("NORMAL", self.normals.len(), other.normals.len()),
            ("TEXCOORD_0", self.uvs.len(), other.uvs.len()),
        ];
        for (attribute, ours, theirs) in attributes {
            let complete = ours == base && theirs == other.positions.len();
            if ours + theirs != 0 && !complete {
                return Err(GeometryError::MissingAttribute {
                    attribute,
                    expected: total,
                    actual: ours + theirs,
                });
            }
        }

        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.uvs.extend_from_slice(&other.uvs);
        self.indices
            .extend(other.indices.iter().map(|i| (base + *i as usize) as u16));
        Ok(())
    }

    /// Move every vertex along the cue axis
    pub fn translate_y(&mut self, offset: f32) {
        for p in &mut self.positions {
            p[1] += offset;
        }
    }

    /// Builder packing this mesh; empty normals / UVs are left out
    pub fn to_builder(&self) -> MeshBuilder {
        let mut builder = MeshBuilder::new().positions(&self.positions);
        if !self.normals.is_empty() {
            builder = builder.normals(&self.normals);
        }
        if !self.uvs.is_empty() {
            builder = builder.uvs(&self.uvs);
        }
        if !self.indices.is_empty() {
            builder = builder.indices(&self.indices);
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_offsets_indices() {
        let mut a = generate_shell(3, 1.0, 1.0, 0.0, 1.0).unwrap();
        let b = generate_shell(4, 1.0, 1.0, 1.0, 2.0).unwrap();
        let a_vertices = a.vertex_count();

        a.append(&b).unwrap();

        assert_eq!(a.vertex_count(), a_vertices + b.vertex_count());
        assert_eq!(a.triangle_count(), 3 * 2 + 4 * 2);
        let tail = &a.indices[18..];
        assert_eq!(tail[0] as usize, a_vertices + b.indices[0] as usize);
        assert!(a.indices.iter().all(|i| (*i as usize) < a.vertex_count()));
    }

    #[test]
    fn test_append_rejects_one_sided_attributes() {
        let mut a = generate_shell(3, 1.0, 1.0, 0.0, 1.0).unwrap();
        let mut b = generate_shell(3, 1.0, 1.0, 1.0, 2.0).unwrap();
        b.uvs.clear();
        let before = a.clone();

        let err = a.append(&b).unwrap_err();
        assert_eq!(
            err,
            GeometryError::MissingAttribute {
                attribute: "TEXCOORD_0",
                expected: 16,
                actual: 8,
            }
        );
        assert_eq!(a, before);

        // Neither side has UVs: fine
        a.uvs.clear();
        a.append(&b).unwrap();
        assert!(a.uvs.is_empty());
        assert_eq!(a.normals.len(), a.vertex_count());
    }

    #[test]
    fn test_append_into_empty_mesh() {
        let mut mesh = MeshData::default();
        let shell = generate_shell(4, 1.0, 1.0, 0.0, 1.0).unwrap();
        mesh.append(&shell).unwrap();
        assert_eq!(mesh, shell);
    }

    #[test]
    fn test_translate_y_moves_only_height() {
        let mut mesh = generate_shell(3, 1.0, 1.0, 0.0, 1.0).unwrap();
        let before = mesh.positions.clone();
        mesh.translate_y(-0.5);
        for (p, q) in before.iter().zip(&mesh.positions) {
            assert_eq!(p[0], q[0]);
            assert_eq!(p[1] - 0.5, q[1]);
            assert_eq!(p[2], q[2]);
        }
    }
}

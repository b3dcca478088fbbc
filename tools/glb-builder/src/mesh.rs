//! High-level mesh construction

use crate::buffer::{AccessorIndex, BufferBuilder};
use crate::GlbError;

/// Accessor indices for one mesh primitive
#[derive(Debug, Clone)]
pub struct MeshAccessors {
    pub positions: AccessorIndex,
    pub normals: Option<AccessorIndex>,
    pub uvs: Option<AccessorIndex>,
    pub indices: Option<AccessorIndex>,
    pub vertex_count: usize,
    pub index_count: usize,
}

/// Builder for mesh data
#[derive(Default)]
pub struct MeshBuilder {
    positions: Vec<[f32; 3]>,
    normals: Option<Vec<[f32; 3]>>,
    uvs: Option<Vec<[f32; 2]>>,
    indices: Option<Vec<u16>>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set positions (required)
    pub fn positions(mut self, positions: &[[f32; 3]]) -> Self {
        self.positions = positions.to_vec();
        self
    }

    /// Set normals (optional)
    pub fn normals(mut self, normals: &[[f32; 3]]) -> Self {
        self.normals = Some(normals.to_vec());
        self
    }

    /// Set UVs (optional, TEXCOORD_0)
    pub fn uvs(mut self, uvs: &[[f32; 2]]) -> Self {
        self.uvs = Some(uvs.to_vec());
        self
    }

    /// Set indices (optional)
    pub fn indices(mut self, indices: &[u16]) -> Self {
        self.indices = Some(indices.to_vec());
        self
    }

    /// Check attribute counts and index ranges without packing anything
    pub fn validate(&self) -> Result<(), GlbError> {
        let vertex_count = self.positions.len();

        let attributes = [
            ("NORMAL", self.normals.as_ref().map(Vec::len)),
            ("TEXCOORD_0", self.uvs.as_ref().map(Vec::len)),
        ];
        for (attribute, len) in attributes {
            match len {
                Some(actual) if actual != vertex_count => {
                    return Err(GlbError::AttributeCount {
                        attribute,
                        expected: vertex_count,
                        actual,
                    });
                }
                _ => {}
            }
        }

        let out_of_range = self.indices.as_ref().and_then(|indices| {
            indices
                .iter()
                .enumerate()
                .find(|(_, v)| **v as usize >= vertex_count)
        });
        if let Some((index, &value)) = out_of_range {
            return Err(GlbError::IndexOutOfRange {
                index,
                value,
                vertex_count,
            });
        }

        Ok(())
    }

    /// Validate, then pack into buffer in the order positions, normals, UVs, indices
    pub fn build(self, buffer: &mut BufferBuilder) -> Result<MeshAccessors, GlbError> {
        self.validate()?;

        let positions = buffer.pack_positions(&self.positions);
        let normals = self.normals.as_ref().map(|n| buffer.pack_vec3(n));
        let uvs = self.uvs.as_ref().map(|uv| buffer.pack_vec2(uv));
        let indices = self.indices.as_ref().map(|i| buffer.pack_indices_u16(i));

        Ok(MeshAccessors {
            positions,
            normals,
            uvs,
            indices,
            vertex_count: self.positions.len(),
            index_count: self.indices.as_ref().map_or(0, Vec::len),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_builder_basic() {
        let mut buffer = BufferBuilder::new();
        let mesh = MeshBuilder::new()
            .positions(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]])
            .normals(&[[0.0, 0.0, 1.0]; 3])
            .indices(&[0, 1, 2])
            .build(&mut buffer)
            .unwrap();

        assert_eq!(mesh.positions, AccessorIndex(0));
        assert_eq!(mesh.normals, Some(AccessorIndex(1)));
        assert_eq!(mesh.indices, Some(AccessorIndex(2)));
        assert!(mesh.uvs.is_none());
        assert_eq!(mesh.vertex_count, 3);
        assert_eq!(mesh.index_count, 3);
    }

    #[test]
    fn test_mesh_builder_rejects_mismatched_uvs() {
        let mut buffer = BufferBuilder::new();
        let err = MeshBuilder::new()
            .positions(&[[0.0; 3]; 3])
            .uvs(&[[0.0; 2]; 2])
            .build(&mut buffer)
            .unwrap_err();

        assert!(matches!(
            err,
            GlbError::AttributeCount {
                attribute: "TEXCOORD_0",
                expected: 3,
                actual: 2
            }
        ));
        assert!(buffer.data().is_empty());
    }

    #[test]
    fn test_mesh_builder_rejects_out_of_range_index() {
        let mut buffer = BufferBuilder::new();
        let err = MeshBuilder::new()
            .positions(&[[0.0; 3]; 3])
            .indices(&[0, 1, 3])
            .build(&mut buffer)
            .unwrap_err();

        assert!(matches!(
            err,
            GlbError::IndexOutOfRange {
                index: 2,
                value: 3,
                vertex_count: 3
            }
        ));
    }
}

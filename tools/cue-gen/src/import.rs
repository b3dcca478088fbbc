//! Reading primitives back out of a GLB
//!
//! Only the embedded BIN chunk is consulted; images are never decoded.

use crate::geometry::MeshData;
use gltf::Gltf;
use gltf::mesh::{Mode, Semantic};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid glTF: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("buffer {0} is external; only self-contained GLB files are supported")]
    ExternalBuffer(usize),

    #[error("mesh {mesh} primitive {primitive} has no POSITION attribute")]
    NoPositions { mesh: usize, primitive: usize },

    #[error("mesh {mesh} primitive {primitive}: index {value} does not fit in u16")]
    IndexTooLarge {
        mesh: usize,
        primitive: usize,
        value: u32,
    },
}

/// One primitive's geometry plus what is needed to write it back
#[derive(Debug, Clone)]
pub struct ImportedPrimitive {
    pub mesh_index: usize,
    pub primitive_index: usize,
    pub mesh_name: Option<String>,
    pub material_name: Option<String>,
    pub mode: Mode,
    /// False for non-indexed primitives; `data.indices` is then empty
    pub indexed: bool,
    pub data: MeshData,
    /// Attributes present in the file that `data` does not carry
    pub dropped_attributes: Vec<String>,
}

impl ImportedPrimitive {
    /// Indexed triangle list, the only layout the mesh modifiers understand
    pub fn is_indexed_triangles(&self) -> bool {
        self.indexed && self.mode == Mode::Triangles
    }

    pub fn label(&self) -> String {
        format!(
            "{} primitive {}",
            self.mesh_name.as_deref().unwrap_or("<unnamed>"),
            self.primitive_index
        )
    }
}

/// Parse a GLB, refusing anything that needs files next to it
pub fn read_glb(bytes: &[u8]) -> Result<Gltf, ImportError> {
    let gltf = Gltf::from_slice(bytes)?;
    for buffer in gltf.buffers() {
        if let gltf::buffer::Source::Uri(_) = buffer.source() {
            return Err(ImportError::ExternalBuffer(buffer.index()));
        }
    }
    Ok(gltf)
}

/// Read every primitive of one mesh
pub fn read_mesh(gltf: &Gltf, mesh: &gltf::Mesh<'_>) -> Result<Vec<ImportedPrimitive>, ImportError> {
    let blob = gltf.blob.as_deref();

    mesh.primitives()
        .map(|primitive| {
            let reader = primitive.reader(|_| blob);
            let ids = (mesh.index(), primitive.index());

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .ok_or(ImportError::NoPositions {
                    mesh: ids.0,
                    primitive: ids.1,
                })?
                .collect();
            let normals = reader
                .read_normals()
                .map(|iter| iter.collect())
                .unwrap_or_default();
            let uvs = reader
                .read_tex_coords(0)
                .map(|iter| iter.into_f32().collect())
                .unwrap_or_default();

            let (indexed, indices) = match reader.read_indices() {
                Some(read) => {
                    let indices = read
                        .into_u32()
                        .map(|value| {
                            u16::try_from(value).map_err(|_| ImportError::IndexTooLarge {
                                mesh: ids.0,
                                primitive: ids.1,
                                value,
                            })
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    (true, indices)
                }
                None => (false, Vec::new()),
            };

            let dropped_attributes = primitive
                .attributes()
                .filter_map(|(semantic, _)| match semantic {
                    Semantic::Positions | Semantic::Normals | Semantic::TexCoords(0) => None,
                    other => Some(other.to_string()),
                })
                .collect();

            Ok(ImportedPrimitive {
                mesh_index: ids.0,
                primitive_index: ids.1,
                mesh_name: mesh.name().map(str::to_string),
                material_name: primitive.material().name().map(str::to_string),
                mode: primitive.mode(),
                indexed,
                data: MeshData {
                    positions,
                    normals,
                    uvs,
                    indices,
                },
                dropped_attributes,
            })
        })
        .collect()
}

/// Read every primitive of every mesh, in document order
pub fn read_primitives(gltf: &Gltf) -> Result<Vec<ImportedPrimitive>, ImportError> {
    let mut primitives = Vec::new();
    for mesh in gltf.meshes() {
        primitives.extend(read_mesh(gltf, &mesh)?);
    }
    Ok(primitives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CueConfig;
    use crate::cue::build_cue;

    #[test]
    fn test_generated_cue_reads_back() {
        let cue = build_cue(&CueConfig::default()).unwrap();
        let gltf = read_glb(&cue.glb).unwrap();
        let primitives = read_primitives(&gltf).unwrap();

        assert_eq!(primitives.len(), 5);
        let vertices: usize = primitives.iter().map(|p| p.data.vertex_count()).sum();
        assert_eq!(vertices, cue.vertex_count);
        for p in &primitives {
            assert!(p.is_indexed_triangles());
            assert_eq!(p.data.normals.len(), p.data.positions.len());
            assert_eq!(p.data.uvs.len(), p.data.positions.len());
            assert!(p.dropped_attributes.is_empty());
        }
        assert_eq!(primitives[3].material_name.as_deref(), Some("outside"));
        assert_eq!(primitives[0].label(), "PoolCue primitive 0");
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(read_glb(b"glTF garbage"), Err(ImportError::Gltf(_))));
    }
}

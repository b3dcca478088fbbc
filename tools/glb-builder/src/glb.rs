//! Existing GLB documents: parsing, append-only patching and re-serialization
//!
//! Appending never reorders or rewrites existing entries. Every new bufferView,
//! accessor, material, mesh and node gets the index equal to the length of its
//! collection before the append, so references held by the existing document
//! (and by anything outside it) stay valid.

use crate::document::{mesh_node, primitive_from_accessors};
use crate::utils::assemble_glb;
use crate::{BufferBuilder, GlbError, MeshAccessors, MeshBuilder, PbrMaterial};
use gltf_json as json;
use tracing::{debug, info};

/// Headroom reserved for the GLB header, chunk headers and JSON when checking
/// that an appended blob still fits the u32 length fields.
const CONTAINER_HEADROOM: usize = 1 << 20;

/// A parsed GLB: JSON document plus the embedded binary chunk
#[derive(Debug, Clone)]
pub struct GlbDocument {
    pub root: json::Root,
    pub blob: Vec<u8>,
}

/// Geometry and naming for a mesh to append
pub struct AppendRequest<'a> {
    pub mesh_name: &'a str,
    pub node_name: &'a str,
    pub positions: &'a [[f32; 3]],
    pub normals: &'a [[f32; 3]],
    pub uvs: &'a [[f32; 2]],
    pub indices: &'a [u16],
    pub material: PbrMaterial,
}

/// Indices and layout of everything an append created
#[derive(Debug, Clone)]
pub struct AppendedMesh {
    pub accessors: MeshAccessors,
    pub buffer_views: Vec<u32>,
    /// Byte offset of each new buffer view, in packing order
    pub byte_offsets: Vec<u64>,
    /// Bytes added to the blob, including alignment padding
    pub appended_bytes: usize,
    pub material: u32,
    pub mesh: u32,
    pub node: u32,
    pub scene: u32,
}

impl GlbDocument {
    /// Parse a GLB container
    pub fn from_slice(bytes: &[u8]) -> Result<Self, GlbError> {
        let glb =
            gltf::Glb::from_slice(bytes).map_err(|e| GlbError::InvalidContainer(e.to_string()))?;
        let root =
            json::Root::from_slice(&glb.json).map_err(|e| GlbError::InvalidJson(e.to_string()))?;
        let blob = glb.bin.map(|bin| bin.into_owned()).unwrap_or_default();

        Ok(Self { root, blob })
    }

    /// Serialize back to GLB bytes
    pub fn to_glb(&self) -> Result<Vec<u8>, GlbError> {
        assemble_glb(&self.root, &self.blob)
    }

    /// The scene new nodes are attached to: `scene` if set, otherwise scene 0
    pub fn default_scene_index(&self) -> usize {
        self.root.scene.map_or(0, |s| s.value())
    }

    /// Append a mesh (positions, normals, UVs, indices) with its own material and node.
    ///
    /// The new node copies the scale of `nodes[0]` so the appended geometry lives in
    /// the same space as the existing root object, and is added to the default scene.
    pub fn append_mesh(&mut self, request: AppendRequest<'_>) -> Result<AppendedMesh, GlbError> {
        if self.root.buffers.first().is_some_and(|b| b.uri.is_some()) {
            return Err(GlbError::ExternalBuffer(0));
        }

        let scene_count = self.root.scenes.len();
        if scene_count > 0 && self.default_scene_index() >= scene_count {
            return Err(GlbError::InvalidJson(format!(
                "default scene {} does not exist",
                self.default_scene_index()
            )));
        }

        let mesh = MeshBuilder::new()
            .positions(request.positions)
            .normals(request.normals)
            .uvs(request.uvs)
            .indices(request.indices);
        mesh.validate()?;

        let previous_len = self.blob.len();
        let view_base = self.root.buffer_views.len() as u32;
        let accessor_base = self.root.accessors.len() as u32;

        let mut buffer = BufferBuilder::resume(self.blob.clone(), view_base, accessor_base);
        let accessors = mesh.build(&mut buffer)?;

        let total = buffer.data().len();
        if total > u32::MAX as usize - CONTAINER_HEADROOM {
            return Err(GlbError::TooLarge(total));
        }

        let byte_offsets: Vec<u64> = buffer
            .views()
            .iter()
            .map(|view| view.byte_offset.map_or(0, |o| o.0))
            .collect();
        let buffer_views = (view_base..view_base + buffer.views().len() as u32).collect();

        self.root.buffer_views.extend_from_slice(buffer.views());
        self.root.accessors.extend_from_slice(buffer.accessors());
        self.blob = buffer.into_data();

        if self.root.buffers.is_empty() {
            self.root.buffers.push(json::Buffer {
                byte_length: 0u64.into(),
                extensions: Default::default(),
                extras: Default::default(),
                name: None,
                uri: None,
            });
        }
        self.root.buffers[0].byte_length = (self.blob.len() as u64).into();

        let material = self.root.materials.len() as u32;
        self.root.materials.push(request.material.to_json());

        let mesh_index = self.root.meshes.len() as u32;
        self.root.meshes.push(json::Mesh {
            extensions: Default::default(),
            extras: Default::default(),
            name: Some(request.mesh_name.to_string()),
            primitives: vec![primitive_from_accessors(&accessors, Some(material))],
            weights: None,
        });

        let scale = self.root.nodes.first().and_then(|node| node.scale);
        let node = self.root.nodes.len() as u32;
        self.root
            .nodes
            .push(mesh_node(request.node_name, mesh_index, scale));

        if self.root.scenes.is_empty() {
            self.root.scenes.push(json::Scene {
                extensions: Default::default(),
                extras: Default::default(),
                name: Some("Scene".to_string()),
                nodes: Vec::new(),
            });
            self.root.scene = Some(json::Index::new(0));
        }
        let scene = self.default_scene_index();
        self.root.scenes[scene].nodes.push(json::Index::new(node));

        for (i, offset) in byte_offsets.iter().enumerate() {
            debug!(
                "appended bufferView {} at byte offset {}",
                view_base + i as u32,
                offset
            );
        }
        info!(
            "Appended mesh '{}' (mesh {}, node {}, material {}): {} vertices, {} indices, {} bytes",
            request.mesh_name,
            mesh_index,
            node,
            material,
            accessors.vertex_count,
            accessors.index_count,
            self.blob.len() - previous_len
        );

        Ok(AppendedMesh {
            appended_bytes: self.blob.len() - previous_len,
            accessors,
            buffer_views,
            byte_offsets,
            material,
            mesh: mesh_index,
            node,
            scene: scene as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GltfBuilder;

    fn single_triangle_glb(scale: Option<[f32; 3]>) -> Vec<u8> {
        let mut buffer = BufferBuilder::new();
        let mesh = MeshBuilder::new()
            .positions(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]])
            .indices(&[0, 1, 2])
            .build(&mut buffer)
            .unwrap();
        let root = GltfBuilder::new()
            .buffer_byte_length(buffer.data().len() as u64)
            .add_material(PbrMaterial::new("shaft"))
            .add_mesh_from_accessors("Cue", &[(mesh, Some(0))])
            .add_node(mesh_node("Cue", 0, scale))
            .add_scene("Scene", &[0])
            .build(buffer.views(), buffer.accessors(), "test");
        assemble_glb(&root, buffer.data()).unwrap()
    }

    fn quad_request() -> AppendRequest<'static> {
        AppendRequest {
            mesh_name: "Layer",
            node_name: "LayerNode",
            positions: &[[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
            normals: &[[0.0, 0.0, 1.0]; 4],
            uvs: &[[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]],
            indices: &[0, 1, 2, 1, 3, 2],
            material: PbrMaterial::new("outside"),
        }
    }

    #[test]
    fn test_append_uses_prior_lengths_as_indices() {
        let mut doc = GlbDocument::from_slice(&single_triangle_glb(None)).unwrap();
        let views_before = doc.root.buffer_views.len() as u32;
        let accessors_before = doc.root.accessors.len() as u32;

        let appended = doc.append_mesh(quad_request()).unwrap();

        assert_eq!(appended.buffer_views[0], views_before);
        assert_eq!(appended.accessors.positions.0, accessors_before);
        assert_eq!(appended.material, 1);
        assert_eq!(appended.mesh, 1);
        assert_eq!(appended.node, 1);
        assert_eq!(doc.root.scenes[0].nodes.len(), 2);
        // Existing mesh still points at its original accessors
        let original = &doc.root.meshes[0].primitives[0];
        assert_eq!(original.indices.map(|i| i.value()), Some(1));
    }

    #[test]
    fn test_append_offsets_aligned_and_buffer_length_updated() {
        let mut doc = GlbDocument::from_slice(&single_triangle_glb(None)).unwrap();
        let before = doc.blob.len();

        let appended = doc.append_mesh(quad_request()).unwrap();

        assert!(appended.byte_offsets.iter().all(|o| o % 4 == 0));
        assert_eq!(appended.byte_offsets[0] as usize, before);
        // positions 48 + normals 48 + uvs 32 + indices 12
        assert_eq!(appended.appended_bytes, 48 + 48 + 32 + 12);
        assert_eq!(doc.root.buffers[0].byte_length.0 as usize, doc.blob.len());
    }

    #[test]
    fn test_append_inherits_root_node_scale() {
        let scale = [0.00723, 1.009, 0.00723];
        let mut doc = GlbDocument::from_slice(&single_triangle_glb(Some(scale))).unwrap();
        let appended = doc.append_mesh(quad_request()).unwrap();
        assert_eq!(doc.root.nodes[appended.node as usize].scale, Some(scale));
    }

    #[test]
    fn test_patched_glb_reparses() {
        let mut doc = GlbDocument::from_slice(&single_triangle_glb(None)).unwrap();
        doc.append_mesh(quad_request()).unwrap();
        let bytes = doc.to_glb().unwrap();

        let gltf = gltf::Gltf::from_slice(&bytes).unwrap();
        assert_eq!(gltf.meshes().count(), 2);
        let names: Vec<_> = gltf.materials().filter_map(|m| m.name()).collect();
        assert_eq!(names, vec!["shaft", "outside"]);
    }

    #[test]
    fn test_invalid_container_rejected() {
        let err = GlbDocument::from_slice(b"not a glb file").unwrap_err();
        assert!(matches!(err, GlbError::InvalidContainer(_)));
    }
}

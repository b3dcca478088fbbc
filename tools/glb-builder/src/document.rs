//! GLTF document construction

use crate::{MeshAccessors, PbrMaterial};
use gltf_json as json;
use gltf_json::validation::Checked::Valid;
use std::collections::BTreeMap;

/// Build a triangle-list primitive from packed accessors
pub fn primitive_from_accessors(
    accessors: &MeshAccessors,
    material: Option<u32>,
) -> json::mesh::Primitive {
    let mut attributes = BTreeMap::new();
    attributes.insert(
        Valid(json::mesh::Semantic::Positions),
        accessors.positions.as_json_index(),
    );

    if let Some(normals) = accessors.normals {
        attributes.insert(
            Valid(json::mesh::Semantic::Normals),
            normals.as_json_index(),
        );
    }

    if let Some(uvs) = accessors.uvs {
        attributes.insert(
            Valid(json::mesh::Semantic::TexCoords(0)),
            uvs.as_json_index(),
        );
    }

    json::mesh::Primitive {
        attributes,
        extensions: Default::default(),
        extras: Default::default(),
        indices: accessors.indices.map(|i| i.as_json_index()),
        material: material.map(json::Index::new),
        mode: Valid(json::mesh::Mode::Triangles),
        targets: None,
    }
}

/// Node that instances a mesh, optionally scaled
pub fn mesh_node(name: &str, mesh: u32, scale: Option<[f32; 3]>) -> json::Node {
    json::Node {
        camera: None,
        children: None,
        extensions: Default::default(),
        extras: Default::default(),
        matrix: None,
        mesh: Some(json::Index::new(mesh)),
        name: Some(name.to_string()),
        rotation: None,
        scale,
        skin: None,
        translation: None,
        weights: None,
    }
}

/// Builder for complete GLTF documents with a single embedded buffer
#[derive(Default)]
pub struct GltfBuilder {
    nodes: Vec<json::Node>,
    meshes: Vec<json::Mesh>,
    materials: Vec<json::Material>,
    scenes: Vec<json::Scene>,
    buffer_byte_length: u64,
}

impl GltfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set buffer byte length (required before building)
    pub fn buffer_byte_length(mut self, length: u64) -> Self {
        self.buffer_byte_length = length;
        self
    }

    pub fn add_node(mut self, node: json::Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add a material; its index is the material count before the call
    pub fn add_material(self, material: PbrMaterial) -> Self {
        self.add_materials([material])
    }

    /// Add materials in order
    pub fn add_materials(mut self, materials: impl IntoIterator<Item = PbrMaterial>) -> Self {
        self.materials
            .extend(materials.into_iter().map(|m| m.to_json()));
        self
    }

    /// Add a mesh with one primitive per `(accessors, material index)` pair
    pub fn add_mesh_from_accessors(
        mut self,
        name: &str,
        primitives: &[(MeshAccessors, Option<u32>)],
    ) -> Self {
        self.meshes.push(json::Mesh {
            extensions: Default::default(),
            extras: Default::default(),
            name: Some(name.to_string()),
            primitives: primitives
                .iter()
                .map(|(accessors, material)| primitive_from_accessors(accessors, *material))
                .collect(),
            weights: None,
        });
        self
    }

    /// Add a scene; the first scene added becomes the default
    pub fn add_scene(mut self, name: &str, root_nodes: &[u32]) -> Self {
        self.scenes.push(json::Scene {
            extensions: Default::default(),
            extras: Default::default(),
            name: Some(name.to_string()),
            nodes: root_nodes.iter().copied().map(json::Index::new).collect(),
        });
        self
    }

    /// Build final GLTF Root (requires buffer views and accessors from BufferBuilder)
    pub fn build(
        self,
        buffer_views: &[json::buffer::View],
        accessors: &[json::Accessor],
        generator: &str,
    ) -> json::Root {
        let buffer = json::Buffer {
            byte_length: self.buffer_byte_length.into(),
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            uri: None,
        };

        json::Root {
            accessors: accessors.to_vec(),
            asset: json::Asset {
                generator: Some(generator.to_string()),
                version: "2.0".to_string(),
                ..Default::default()
            },
            buffers: vec![buffer],
            buffer_views: buffer_views.to_vec(),
            materials: self.materials,
            meshes: self.meshes,
            nodes: self.nodes,
            scene: (!self.scenes.is_empty()).then(|| json::Index::new(0)),
            scenes: self.scenes,
            ..Default::default()
        }
    }
}

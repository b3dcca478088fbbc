//! Re-shading an existing GLB through a stack of mesh modifiers
//!
//! Every primitive is read back, run through the configured modifiers in order
//! and packed into a fresh buffer. Materials, meshes, nodes, scenes and names are
//! carried over unchanged. A modifier that fails is logged and skipped; the rest
//! of the stack still runs.

mod normals;
mod subdivide;

pub use normals::{AutoSmooth, Weighting, WeightedNormals};
pub use subdivide::Subdivide;

use crate::config::SmoothConfig;
use crate::contract::is_customizable_material;
use crate::geometry::{Axis, GeometryError, MeshData, project_cylindrical};
use crate::import::{read_glb, read_primitives};
use anyhow::{Context, Result, bail};
use glb_builder::document::primitive_from_accessors;
use glb_builder::{BufferBuilder, GlbDocument, assemble_glb, json};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error, PartialEq)]
pub enum ModifierError {
    #[error("mesh is not a valid indexed triangle list")]
    NotTriangles,

    #[error("{0} must be positive, got {1}")]
    InvalidParameter(&'static str, f32),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// An in-place mesh transform that may fail without spoiling the mesh
pub trait MeshModifier {
    fn name(&self) -> &'static str;

    /// Whether this modifier should run on a primitive with the given material
    fn applies_to(&self, _material: Option<&str>) -> bool {
        true
    }

    /// Apply this modifier; on error the mesh is left as it was
    fn apply(&self, mesh: &mut MeshData) -> Result<(), ModifierError>;
}

/// Cylindrical UV re-projection, only for customizable parts
pub struct CylindricalUv {
    pub axis: Axis,
}

impl MeshModifier for CylindricalUv {
    fn name(&self) -> &'static str {
        "cylindrical_uv"
    }

    fn applies_to(&self, material: Option<&str>) -> bool {
        material.is_some_and(is_customizable_material)
    }

    fn apply(&self, mesh: &mut MeshData) -> Result<(), ModifierError> {
        project_cylindrical(mesh, self.axis)?;
        Ok(())
    }
}

/// Modifiers selectable from cue.toml
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    AutoSmooth,
    WeightedNormals,
    Subdivide,
    CylindricalUv,
}

/// Instantiate the configured modifiers in order
pub fn build_stack(config: &SmoothConfig) -> Vec<Box<dyn MeshModifier>> {
    config
        .modifiers
        .iter()
        .map(|kind| -> Box<dyn MeshModifier> {
            match kind {
                ModifierKind::AutoSmooth => Box::new(AutoSmooth {
                    angle_deg: config.smooth_angle_deg,
                    weld_threshold: config.weld_threshold,
                }),
                ModifierKind::WeightedNormals => Box::new(WeightedNormals {
                    angle_deg: config.smooth_angle_deg,
                    weld_threshold: config.weld_threshold,
                }),
                ModifierKind::Subdivide => Box::new(Subdivide {
                    levels: config.subdivision_levels,
                }),
                ModifierKind::CylindricalUv => Box::new(CylindricalUv {
                    axis: config.uv_axis,
                }),
            }
        })
        .collect()
}

/// What happened to one primitive
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimitiveReport {
    pub label: String,
    pub applied: Vec<&'static str>,
    pub failed: Vec<(&'static str, String)>,
    /// Not an indexed triangle list; copied through unmodified
    pub skipped: bool,
}

#[derive(Debug, Clone)]
pub struct SmoothOutcome {
    pub glb: Vec<u8>,
    pub primitives: Vec<PrimitiveReport>,
}

/// Run each modifier in turn, collecting successes and failures
pub fn run_stack(
    label: &str,
    mesh: &mut MeshData,
    material: Option<&str>,
    stack: &[Box<dyn MeshModifier>],
) -> PrimitiveReport {
    let mut report = PrimitiveReport {
        label: label.to_string(),
        ..Default::default()
    };

    for modifier in stack {
        if !modifier.applies_to(material) {
            debug!("{}: {} does not apply", label, modifier.name());
            continue;
        }
        match modifier.apply(mesh) {
            Ok(()) => report.applied.push(modifier.name()),
            Err(e) => {
                warn!("{}: {} failed: {}", label, modifier.name(), e);
                report.failed.push((modifier.name(), e.to_string()));
            }
        }
    }
    report
}

/// Bytes of a buffer view in the document's embedded blob
fn view_bytes(document: &GlbDocument, view: usize) -> Result<&[u8]> {
    let view = document
        .root
        .buffer_views
        .get(view)
        .with_context(|| format!("Missing buffer view {}", view))?;
    if view.buffer.value() != 0 {
        bail!("Buffer view refers to buffer {}", view.buffer.value());
    }
    let start = view.byte_offset.map_or(0, |o| o.0) as usize;
    let end = start + view.byte_length.0 as usize;
    document
        .blob
        .get(start..end)
        .with_context(|| format!("Buffer view range {}..{} exceeds the binary chunk", start, end))
}

/// Re-shade every primitive of a GLB and write it back out
pub fn smooth_glb(input: &[u8], config: &SmoothConfig) -> Result<SmoothOutcome> {
    config.validate().context("Invalid smooth config")?;

    let document = GlbDocument::from_slice(input).context("Failed to read input GLB")?;
    if !document.root.skins.is_empty() || !document.root.animations.is_empty() {
        bail!("Skinned or animated GLB files are not supported");
    }
    let has_morph_targets = document
        .root
        .meshes
        .iter()
        .flat_map(|mesh| &mesh.primitives)
        .any(|p| p.targets.as_ref().is_some_and(|t| !t.is_empty()));
    if has_morph_targets {
        bail!("GLB files with morph targets are not supported");
    }
    if document.root.buffers.len() > 1 {
        bail!(
            "Expected a single embedded buffer, found {}",
            document.root.buffers.len()
        );
    }

    let gltf = read_glb(input)?;
    let primitives = read_primitives(&gltf)?;
    let stack = build_stack(config);

    let mut root = document.root.clone();
    let mut buffer = BufferBuilder::new();
    let mut reports = Vec::with_capacity(primitives.len());

    for primitive in primitives {
        let label = primitive.label();
        if !primitive.dropped_attributes.is_empty() {
            warn!(
                "{}: dropping attributes {}",
                label,
                primitive.dropped_attributes.join(", ")
            );
        }

        let mut data = primitive.data.clone();
        let report = if primitive.is_indexed_triangles() {
            run_stack(
                &label,
                &mut data,
                primitive.material_name.as_deref(),
                &stack,
            )
        } else {
            warn!(
                "{}: skipping modifiers, {:?} {} primitive",
                label,
                primitive.mode,
                if primitive.indexed { "indexed" } else { "non-indexed" }
            );
            PrimitiveReport {
                label: label.clone(),
                skipped: true,
                ..Default::default()
            }
        };

        let accessors = data
            .to_builder()
            .build(&mut buffer)
            .with_context(|| format!("Failed to pack {}", label))?;
        debug!(
            "{}: {} vertices, {} indices",
            label, accessors.vertex_count, accessors.index_count
        );

        let target = &mut root.meshes[primitive.mesh_index].primitives[primitive.primitive_index];
        target.attributes = primitive_from_accessors(&accessors, None).attributes;
        target.indices = accessors.indices.map(|i| i.as_json_index());
        reports.push(report);
    }

    for image in &mut root.images {
        if let Some(view) = image.buffer_view {
            let bytes = view_bytes(&document, view.value())?;
            image.buffer_view = Some(buffer.pack_bytes(bytes));
        }
    }

    root.accessors = buffer.accessors().to_vec();
    root.buffer_views = buffer.views().to_vec();
    root.buffers = vec![json::Buffer {
        byte_length: (buffer.data().len() as u64).into(),
        extensions: Default::default(),
        extras: Default::default(),
        name: None,
        uri: None,
    }];

    let glb = assemble_glb(&root, buffer.data())?;
    let failures: usize = reports.iter().map(|r| r.failed.len()).sum();
    info!(
        "Smoothed {} primitives ({} modifier failures): {} bytes -> {} bytes",
        reports.len(),
        failures,
        input.len(),
        glb.len()
    );

    Ok(SmoothOutcome {
        glb,
        primitives: reports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CueConfig;
    use crate::cue::build_cue;
    use crate::geometry::{CapFacing, generate_cap, generate_shell};
    use glb_builder::{GltfBuilder, PbrMaterial, document::mesh_node};

    fn glb_with_material(mesh: &MeshData, material: &str) -> Vec<u8> {
        let mut buffer = BufferBuilder::new();
        let accessors = mesh.to_builder().build(&mut buffer).unwrap();
        let root = GltfBuilder::new()
            .buffer_byte_length(buffer.data().len() as u64)
            .add_material(PbrMaterial::new(material))
            .add_mesh_from_accessors("Part", &[(accessors, Some(0))])
            .add_node(mesh_node("Part", 0, Some([0.01, 0.01, 0.01])))
            .add_scene("Scene", &[0])
            .build(buffer.views(), buffer.accessors(), "test");
        assemble_glb(&root, buffer.data()).unwrap()
    }

    #[test]
    fn test_default_stack_on_generated_cue() {
        let cue = build_cue(&CueConfig::default()).unwrap();
        let outcome = smooth_glb(&cue.glb, &SmoothConfig::default()).unwrap();

        assert_eq!(outcome.primitives.len(), 5);
        for report in &outcome.primitives {
            assert_eq!(report.applied, vec!["auto_smooth", "weighted_normals"]);
            assert!(report.failed.is_empty());
            assert!(!report.skipped);
        }

        let gltf = read_glb(&outcome.glb).unwrap();
        let names: Vec<_> = gltf.materials().filter_map(|m| m.name()).collect();
        assert_eq!(names, vec!["tip", "shaft", "ferrule", "outside", "bumper"]);
        let primitives = read_primitives(&gltf).unwrap();
        let vertices: usize = primitives.iter().map(|p| p.data.vertex_count()).sum();
        assert_eq!(vertices, cue.vertex_count);
    }

    #[test]
    fn test_subdivision_grows_mesh() {
        let cue = build_cue(&CueConfig::default()).unwrap();
        let config = SmoothConfig {
            modifiers: vec![ModifierKind::Subdivide, ModifierKind::AutoSmooth],
            ..Default::default()
        };
        let outcome = smooth_glb(&cue.glb, &config).unwrap();

        let gltf = read_glb(&outcome.glb).unwrap();
        let primitives = read_primitives(&gltf).unwrap();
        let indices: usize = primitives.iter().map(|p| p.data.indices.len()).sum();
        assert_eq!(indices, 4 * cue.index_count);
    }

    #[test]
    fn test_failed_modifier_does_not_stop_the_stack() {
        let mut mesh = generate_shell(8, 1.0, 1.0, 0.0, 1.0).unwrap();
        mesh.normals.clear();
        let glb = glb_with_material(&mesh, "outside");
        let config = SmoothConfig {
            modifiers: vec![ModifierKind::CylindricalUv, ModifierKind::AutoSmooth],
            ..Default::default()
        };

        let outcome = smooth_glb(&glb, &config).unwrap();

        let report = &outcome.primitives[0];
        assert_eq!(report.applied, vec!["auto_smooth"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "cylindrical_uv");

        // Normals were created, node scale survived
        let gltf = read_glb(&outcome.glb).unwrap();
        let primitives = read_primitives(&gltf).unwrap();
        assert_eq!(primitives[0].data.normals.len(), mesh.vertex_count());
        let node = gltf.nodes().next().unwrap();
        assert_eq!(node.transform().decomposed().2, [0.01, 0.01, 0.01]);
    }

    #[test]
    fn test_cylindrical_uv_only_for_customizable_materials() {
        let mut mesh = generate_shell(8, 1.0, 1.0, 0.0, 1.0).unwrap();
        mesh.append(&generate_cap(8, 1.0, 1.0, CapFacing::Up).unwrap())
            .unwrap();
        let config = SmoothConfig {
            modifiers: vec![ModifierKind::CylindricalUv],
            ..Default::default()
        };

        let shaft = smooth_glb(&glb_with_material(&mesh, "shaft"), &config).unwrap();
        assert!(shaft.primitives[0].applied.is_empty());

        let body = smooth_glb(&glb_with_material(&mesh, "Cue_Body"), &config).unwrap();
        assert_eq!(body.primitives[0].applied, vec!["cylindrical_uv"]);

        // The wrap is split: one seam column of the shell is duplicated
        let gltf = read_glb(&body.glb).unwrap();
        let data = &read_primitives(&gltf).unwrap()[0].data;
        assert_eq!(data.vertex_count(), 18 + 9 + 2);
        assert!(data.uvs.iter().any(|uv| uv[0] >= 1.0));
    }

    #[test]
    fn test_non_glb_is_rejected() {
        assert!(smooth_glb(b"not a glb", &SmoothConfig::default()).is_err());
    }
}

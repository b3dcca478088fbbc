//! Procedural cue assembly
//!
//! Sections are stacked along +Y from the butt up to the tip. Each section and
//! each decorative ring becomes one primitive (side shell plus both end caps) of
//! a single mesh, so the customizer sees one object with one material per part.
//! Customizable sections are unwrapped with the cylindrical projection, caps
//! collapsed, so the texture wraps the same way as on the authored assets.

use crate::config::CueConfig;
use crate::geometry::{
    Axis, CapFacing, MeshData, generate_cap, generate_shell, project_cylindrical,
};
use crate::section::Section;
use anyhow::{Context, Result};
use glb_builder::{
    BufferBuilder, GltfBuilder, MeshAccessors, PbrMaterial, assemble_glb, compute_bounds,
    document::mesh_node,
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Generator string written to `asset.generator`
pub const GENERATOR: &str = "cue-gen";

/// A generated cue and its vital statistics
#[derive(Debug, Clone)]
pub struct BuiltCue {
    pub glb: Vec<u8>,
    pub primitive_count: usize,
    pub vertex_count: usize,
    pub index_count: usize,
    /// Material names in document order
    pub materials: Vec<String>,
    pub bounds: ([f32; 3], [f32; 3]),
}

struct Part {
    name: String,
    mesh: MeshData,
    material: u32,
}

/// Materials in order of first use, one per distinct name
#[derive(Default)]
struct MaterialTable {
    materials: Vec<PbrMaterial>,
    by_name: HashMap<String, u32>,
}

impl MaterialTable {
    fn index_of(&mut self, material: PbrMaterial) -> u32 {
        if let Some(&index) = self.by_name.get(&material.name) {
            if self.materials[index as usize] != material {
                warn!(
                    "Material '{}' is defined more than once with different settings, keeping the first",
                    material.name
                );
            }
            return index;
        }
        let index = self.materials.len() as u32;
        self.by_name.insert(material.name.clone(), index);
        self.materials.push(material);
        index
    }
}

/// Closed tapered cylinder: side shell from `bottom` to `top` plus both caps
fn closed_cylinder(
    segments: u32,
    radius_bottom: f32,
    radius_top: f32,
    bottom: f32,
    top: f32,
) -> Result<MeshData> {
    let mut mesh = generate_shell(segments, radius_bottom, radius_top, bottom, top)?;
    mesh.append(&generate_cap(segments, radius_top, top, CapFacing::Up)?)?;
    mesh.append(&generate_cap(
        segments,
        radius_bottom,
        bottom,
        CapFacing::Down,
    )?)?;
    Ok(mesh)
}

/// One line per section: length, share of the total and material
pub fn summary(sections: &[Section]) -> Vec<String> {
    let total: f32 = sections.iter().map(|s| s.length_mm).sum();
    sections
        .iter()
        .map(|s| {
            let share = if total > 0.0 {
                s.length_mm / total * 100.0
            } else {
                0.0
            };
            format!(
                "{}: {}mm ({:.1}%) - material: '{}'{}",
                s.name,
                s.length_mm,
                share,
                s.material.name,
                if s.customizable { " [customizable]" } else { "" }
            )
        })
        .collect()
}

/// Generate a cue GLB from its config
pub fn build_cue(config: &CueConfig) -> Result<BuiltCue> {
    config.validate().context("Invalid cue config")?;

    let sections = config.resolved_sections();
    let rings = config.resolved_rings();
    let scale = config.scale;
    let total_mm: f32 = sections.iter().map(|s| s.length_mm).sum();

    info!(
        "Building cue '{}' from {} sections, {}mm",
        config.mesh_name(),
        sections.len(),
        total_mm
    );
    for line in summary(&sections) {
        info!("  - {}", line);
    }

    let mut materials = MaterialTable::default();
    let mut parts = Vec::with_capacity(sections.len() + rings.len());
    let mut butt_ends = HashMap::new();

    let mut top = (total_mm + config.butt_end_mm()) * scale;
    for section in &sections {
        let bottom = top - section.length_mm * scale;
        let mut mesh = closed_cylinder(
            section.segments,
            section.diameter_end_mm * scale / 2.0,
            section.diameter_start_mm * scale / 2.0,
            bottom,
            top,
        )
        .with_context(|| format!("Failed to generate section '{}'", section.name))?;
        if section.customizable {
            project_cylindrical(&mut mesh, Axis::Y)
                .with_context(|| format!("Failed to unwrap section '{}'", section.name))?;
            debug!(
                "{}: cylindrical UVs, {} vertices after seam split",
                section.name,
                mesh.vertex_count()
            );
        }

        parts.push(Part {
            name: section.name.clone(),
            mesh,
            material: materials.index_of(section.material.to_pbr()?),
        });
        butt_ends.insert(section.name.as_str(), bottom);
        top = bottom;
    }

    for ring in &rings {
        let Some(&joint) = butt_ends.get(ring.after_section.as_str()) else {
            anyhow::bail!(
                "Ring '{}' follows unknown section '{}'",
                ring.name,
                ring.after_section
            );
        };
        let center = joint + ring.offset_mm * scale;
        let half = ring.length_mm * scale / 2.0;
        let radius = ring.diameter_mm * scale / 2.0;
        let mesh = closed_cylinder(ring.segments, radius, radius, center - half, center + half)
            .with_context(|| format!("Failed to generate ring '{}'", ring.name))?;

        parts.push(Part {
            name: ring.name.clone(),
            mesh,
            material: materials.index_of(ring.material.to_pbr()?),
        });
    }

    if config.centered() {
        let (min_y, max_y) = parts
            .iter()
            .flat_map(|part| part.mesh.positions.iter().map(|p| p[1]))
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), y| {
                (lo.min(y), hi.max(y))
            });
        let offset = -(min_y + max_y) / 2.0;
        for part in &mut parts {
            part.mesh.translate_y(offset);
        }
    }

    let mut buffer = BufferBuilder::new();
    let mut primitives: Vec<(MeshAccessors, Option<u32>)> = Vec::with_capacity(parts.len());
    let mut all_positions = Vec::new();
    for part in &parts {
        let accessors = part
            .mesh
            .to_builder()
            .build(&mut buffer)
            .with_context(|| format!("Failed to pack '{}'", part.name))?;
        all_positions.extend_from_slice(&part.mesh.positions);
        primitives.push((accessors, Some(part.material)));
    }

    let root = GltfBuilder::new()
        .buffer_byte_length(buffer.data().len() as u64)
        .add_materials(materials.materials.iter().cloned())
        .add_mesh_from_accessors(config.mesh_name(), &primitives)
        .add_node(mesh_node(config.mesh_name(), 0, None))
        .add_scene("Scene", &[0])
        .build(buffer.views(), buffer.accessors(), GENERATOR);
    let glb = assemble_glb(&root, buffer.data())?;

    let vertex_count = primitives.iter().map(|(a, _)| a.vertex_count).sum();
    let index_count = primitives.iter().map(|(a, _)| a.index_count).sum();
    let bounds = compute_bounds(&all_positions);
    info!(
        "Cue '{}': {} primitives, {} vertices, {} indices, {} materials, {} bytes",
        config.mesh_name(),
        primitives.len(),
        vertex_count,
        index_count,
        materials.materials.len(),
        glb.len()
    );

    Ok(BuiltCue {
        glb,
        primitive_count: primitives.len(),
        vertex_count,
        index_count,
        materials: materials.materials.into_iter().map(|m| m.name).collect(),
        bounds,
    })
}

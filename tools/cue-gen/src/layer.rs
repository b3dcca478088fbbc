//! Customizable layer appended to an existing cue GLB

use crate::config::LayerConfig;
use crate::geometry::generate_shell;
use anyhow::{Context, Result};
use glb_builder::{AppendRequest, AppendedMesh, GlbDocument};
use tracing::info;

/// Patched GLB plus what the append created
#[derive(Debug, Clone)]
pub struct LayerOutcome {
    pub glb: Vec<u8>,
    pub appended: AppendedMesh,
}

/// Wrap an open cylinder carrying the customizable material around an existing model
///
/// Existing buffer views, accessors, materials, meshes and nodes are left as they
/// are; everything new is appended after them.
pub fn add_customizable_layer(input: &[u8], config: &LayerConfig) -> Result<LayerOutcome> {
    config.validate().context("Invalid layer config")?;

    let shell = generate_shell(
        config.segments,
        config.radius,
        config.radius,
        config.height_start,
        config.height_end,
    )
    .context("Failed to generate layer geometry")?;

    let mut document = GlbDocument::from_slice(input).context("Failed to read input GLB")?;
    info!(
        "Input: {} meshes, {} accessors, {} buffer views, {} bytes of buffer",
        document.root.meshes.len(),
        document.root.accessors.len(),
        document.root.buffer_views.len(),
        document.blob.len()
    );

    let appended = document
        .append_mesh(AppendRequest {
            mesh_name: &config.mesh_name,
            node_name: &config.node_name,
            positions: &shell.positions,
            normals: &shell.normals,
            uvs: &shell.uvs,
            indices: &shell.indices,
            material: config.material.to_pbr()?,
        })
        .context("Failed to append layer")?;

    let glb = document.to_glb()?;
    Ok(LayerOutcome { glb, appended })
}

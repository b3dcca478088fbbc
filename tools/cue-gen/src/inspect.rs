//! UV-space measurement for texture authoring
//!
//! Splits a mesh's UV layout into the side rectangle and the cap circles and
//! reports how many pixels the rectangle covers at common texture sizes. Faces
//! are rebuilt from consecutive triangle pairs that share an edge (the way quads
//! are triangulated on export) so a side quad is judged by all four corners.

use crate::config::InspectConfig;
use crate::import::{ImportError, read_glb, read_mesh};
use thiserror::Error;
use tracing::warn;

/// Texture sizes the pixel table is printed for
pub const TEXTURE_SIZES: [u32; 4] = [512, 1024, 2048, 4096];

/// Texture size the recommendation is based on
pub const RECOMMENDED_SIZE: u32 = 2048;

#[derive(Debug, Error)]
pub enum InspectError {
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("no mesh object found")]
    NoMesh(Option<String>),

    #[error("mesh has no UV layers")]
    NoUvs,

    #[error("no rectangle UVs found")]
    NoRectangle,
}

impl InspectError {
    /// How a problem with the asset itself is shown to the operator
    pub fn report_lines(&self) -> Option<Vec<String>> {
        let lines = match self {
            InspectError::Import(_) => return None,
            InspectError::NoMesh(None) => vec![
                "ERROR: No mesh object found!".to_string(),
                "The file contains no meshes.".to_string(),
            ],
            InspectError::NoMesh(Some(name)) => vec![
                "ERROR: No mesh object found!".to_string(),
                format!("No mesh named '{}'.", name),
            ],
            InspectError::NoUvs => vec!["ERROR: Mesh has no UV layers!".to_string()],
            InspectError::NoRectangle => vec![
                "ERROR: No rectangle UVs found!".to_string(),
                "Try adjusting threshold.".to_string(),
            ],
        };
        Some(lines)
    }
}

/// Bounds of a set of UV points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvIsland {
    pub points: usize,
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl UvIsland {
    fn from_points(points: &[[f32; 2]]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min = [f32::INFINITY; 2];
        let mut max = [f32::NEG_INFINITY; 2];
        for uv in points {
            for axis in 0..2 {
                min[axis] = min[axis].min(uv[axis]);
                max[axis] = max[axis].max(uv[axis]);
            }
        }
        Some(Self {
            points: points.len(),
            min,
            max,
        })
    }

    pub fn width(&self) -> f32 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f32 {
        self.max[1] - self.min[1]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UvReport {
    pub object: String,
    pub rect: UvIsland,
    pub caps: Option<UvIsland>,
    pub threshold: f32,
}

impl UvReport {
    /// Width over height of the rectangle, 1 when it has no height
    pub fn aspect(&self) -> f32 {
        let height = self.rect.height();
        if height > 0.0 {
            self.rect.width() / height
        } else {
            1.0
        }
    }

    /// Rectangle size in whole pixels on a `base`-sized texture (truncated)
    pub fn pixel_dimensions(&self, base: u32) -> (u32, u32) {
        (
            (base as f32 * self.rect.width()) as u32,
            (base as f32 * self.rect.height()) as u32,
        )
    }

    /// Suggested surface texture size at [`RECOMMENDED_SIZE`] (rounded)
    pub fn recommended(&self) -> (u32, u32) {
        let base = RECOMMENDED_SIZE as f32;
        (
            (base * self.rect.width()).round() as u32,
            (base * self.rect.height()).round() as u32,
        )
    }

    pub fn lines(&self) -> Vec<String> {
        let rect = &self.rect;
        let mut lines = vec![
            format!("Object: {}", self.object),
            String::new(),
            "═══ RECTANGLE (Side) ═══".to_string(),
            format!("UV Points: {}", rect.points),
            format!("U: {:.4} → {:.4}", rect.min[0], rect.max[0]),
            format!("V: {:.4} → {:.4}", rect.min[1], rect.max[1]),
            format!("Width: {:.4}", rect.width()),
            format!("Height: {:.4}", rect.height()),
            format!("Aspect: {:.2}:1", self.aspect()),
            String::new(),
            "═══ CIRCLES (Caps) ═══".to_string(),
            format!("UV Points: {}", self.caps.map_or(0, |c| c.points)),
        ];
        if let Some(caps) = &self.caps {
            lines.push(format!("U: {:.4} → {:.4}", caps.min[0], caps.max[0]));
            lines.push(format!("V: {:.4} → {:.4}", caps.min[1], caps.max[1]));
        }

        lines.push(String::new());
        lines.push("═══ PIXEL DIMENSIONS ═══".to_string());
        lines.push("(Rectangle only, 1:1 mapping)".to_string());
        lines.push(String::new());
        for base in TEXTURE_SIZES {
            let (w, h) = self.pixel_dimensions(base);
            lines.push(format!("  {}px → {} × {}", base, w, h));
        }

        let (w, h) = self.recommended();
        lines.push(String::new());
        lines.push("═══ RECOMMENDATION ═══".to_string());
        lines.push(format!("surface.jpg: {} × {}", w, h));
        lines.push(format!("Aspect ratio: {:.2}:1", self.aspect()));

        lines.push(String::new());
        lines.push("═══ FOR main.js ═══".to_string());
        lines.push(format!(
            "Rect V range: {:.4} to {:.4}",
            rect.min[1], rect.max[1]
        ));
        lines.push(format!("Apply texture only where V > {}", self.threshold));
        lines
    }
}

/// Group a triangle list into faces, pairing consecutive triangles that share an edge
fn faces(indices: &[u32]) -> Vec<Vec<u32>> {
    let triangles: Vec<&[u32]> = indices.chunks_exact(3).collect();
    let mut faces = Vec::with_capacity(triangles.len());

    let mut i = 0;
    while i < triangles.len() {
        let current = triangles[i];
        let paired = triangles
            .get(i + 1)
            .filter(|next| next.iter().filter(|&&v| current.contains(&v)).count() == 2);
        match paired {
            Some(next) => {
                let mut face = current.to_vec();
                face.extend(next.iter().filter(|&&v| !current.contains(&v)));
                faces.push(face);
                i += 2;
            }
            None => {
                faces.push(current.to_vec());
                i += 1;
            }
        }
    }
    faces
}

/// Measure the side rectangle of a mesh (the named one, else the first)
pub fn analyze_uv(
    glb: &[u8],
    mesh_name: Option<&str>,
    config: &InspectConfig,
) -> Result<UvReport, InspectError> {
    let gltf = read_glb(glb)?;
    let mesh = match mesh_name {
        Some(name) => gltf.meshes().find(|m| m.name() == Some(name)),
        None => gltf.meshes().next(),
    }
    .ok_or_else(|| InspectError::NoMesh(mesh_name.map(str::to_string)))?;

    let primitives = read_mesh(&gltf, &mesh)?;
    if primitives.iter().all(|p| p.data.uvs.is_empty()) {
        return Err(InspectError::NoUvs);
    }

    let mut rect_uvs = Vec::new();
    let mut cap_uvs = Vec::new();
    for primitive in &primitives {
        let data = &primitive.data;
        if data.uvs.len() != data.positions.len() {
            continue;
        }
        let indices: Vec<u32> = if primitive.indexed {
            data.indices.iter().map(|&i| u32::from(i)).collect()
        } else {
            (0..data.positions.len() as u32).collect()
        };
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= data.uvs.len()) {
            warn!(
                "{}: skipping, index {} is out of range for {} vertices",
                primitive.label(),
                bad,
                data.uvs.len()
            );
            continue;
        }

        for face in faces(&indices) {
            let face_uvs: Vec<[f32; 2]> = face.iter().map(|i| data.uvs[*i as usize]).collect();
            let avg_v = face_uvs.iter().map(|uv| uv[1]).sum::<f32>() / face_uvs.len() as f32;
            if avg_v > config.rect_v_threshold {
                rect_uvs.extend(face_uvs);
            } else {
                cap_uvs.extend(face_uvs);
            }
        }
    }

    let rect = UvIsland::from_points(&rect_uvs).ok_or(InspectError::NoRectangle)?;
    Ok(UvReport {
        object: mesh.name().unwrap_or("<unnamed>").to_string(),
        rect,
        caps: UvIsland::from_points(&cap_uvs),
        threshold: config.rect_v_threshold,
    })
}

/// Report lines for a GLB; problems with the mesh itself come back as `ERROR:` lines
pub fn measure_uv(
    glb: &[u8],
    mesh_name: Option<&str>,
    config: &InspectConfig,
) -> Result<Vec<String>, ImportError> {
    match analyze_uv(glb, mesh_name, config) {
        Ok(report) => Ok(report.lines()),
        Err(InspectError::Import(e)) => Err(e),
        Err(problem) => Ok(problem.report_lines().unwrap_or_default()),
    }
}

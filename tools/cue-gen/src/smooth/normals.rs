//! Normal recomputation: angle-limited smoothing and face-area weighting

use super::{MeshModifier, ModifierError};
use crate::geometry::MeshData;
use glam::Vec3;
use std::collections::HashMap;

/// How face normals contribute to a vertex normal
///
/// Both weight by the face's corner angle at the vertex, so a quad split into two
/// triangles counts the same as one that was not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weighting {
    CornerAngle,
    AreaAndAngle,
}

/// Smooth shading with an angle limit
///
/// Each vertex averages the normals of every face touching its position (within
/// `weld_threshold`), but only faces within `angle_deg` of the vertex's own faces
/// take part, so edges sharper than the limit keep their crease.
pub struct AutoSmooth {
    pub angle_deg: f32,
    pub weld_threshold: f32,
}

impl Default for AutoSmooth {
    fn default() -> Self {
        Self {
            angle_deg: 60.0,
            weld_threshold: 0.0001,
        }
    }
}

impl MeshModifier for AutoSmooth {
    fn name(&self) -> &'static str {
        "auto_smooth"
    }

    fn apply(&self, mesh: &mut MeshData) -> Result<(), ModifierError> {
        recompute_normals(
            mesh,
            self.angle_deg,
            self.weld_threshold,
            Weighting::CornerAngle,
        )
    }
}

/// Face-area weighted normals that keep sharp edges
///
/// Large faces dominate the shading of the vertices they share with small ones,
/// which keeps long flat strips looking flat next to narrow bevels.
pub struct WeightedNormals {
    pub angle_deg: f32,
    pub weld_threshold: f32,
}

impl Default for WeightedNormals {
    fn default() -> Self {
        Self {
            angle_deg: 60.0,
            weld_threshold: 0.0001,
        }
    }
}

impl MeshModifier for WeightedNormals {
    fn name(&self) -> &'static str {
        "weighted_normals"
    }

    fn apply(&self, mesh: &mut MeshData) -> Result<(), ModifierError> {
        recompute_normals(
            mesh,
            self.angle_deg,
            self.weld_threshold,
            Weighting::AreaAndAngle,
        )
    }
}

/// Group id per vertex; vertices closer than `threshold` share a group
pub(crate) fn weld_groups(positions: &[[f32; 3]], threshold: f32) -> Vec<usize> {
    let cell_of = |p: Vec3| (p / threshold).floor().as_ivec3();
    let mut grid: HashMap<glam::IVec3, Vec<usize>> = HashMap::new();
    let mut groups = Vec::with_capacity(positions.len());

    for (i, position) in positions.iter().enumerate() {
        let p = Vec3::from(*position);
        let cell = cell_of(p);

        let mut found = None;
        'search: for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let neighbor = cell + glam::IVec3::new(dx, dy, dz);
                    let Some(representatives) = grid.get(&neighbor) else {
                        continue;
                    };
                    for &rep in representatives {
                        if Vec3::from(positions[rep]).distance(p) < threshold {
                            found = Some(groups[rep]);
                            break 'search;
                        }
                    }
                }
            }
        }

        match found {
            Some(group) => groups.push(group),
            None => {
                groups.push(i);
                grid.entry(cell).or_default().push(i);
            }
        }
    }
    groups
}

pub(crate) fn check_triangles(mesh: &MeshData) -> Result<(), ModifierError> {
    if mesh.indices.is_empty() || mesh.indices.len() % 3 != 0 {
        return Err(ModifierError::NotTriangles);
    }
    if mesh
        .indices
        .iter()
        .any(|i| *i as usize >= mesh.positions.len())
    {
        return Err(ModifierError::NotTriangles);
    }
    Ok(())
}

/// Angle between the two edges leaving `corner` of a triangle
fn corner_angle(p: [Vec3; 3], corner: usize) -> f32 {
    let a = (p[(corner + 1) % 3] - p[corner]).normalize_or_zero();
    let b = (p[(corner + 2) % 3] - p[corner]).normalize_or_zero();
    if a == Vec3::ZERO || b == Vec3::ZERO {
        return 0.0;
    }
    a.dot(b).clamp(-1.0, 1.0).acos()
}

struct Face {
    normal: Vec3,
    area: f32,
    corners: [f32; 3],
}

fn recompute_normals(
    mesh: &mut MeshData,
    angle_deg: f32,
    weld_threshold: f32,
    weighting: Weighting,
) -> Result<(), ModifierError> {
    check_triangles(mesh)?;
    if weld_threshold.is_nan() || weld_threshold <= 0.0 {
        return Err(ModifierError::InvalidParameter(
            "weld_threshold",
            weld_threshold,
        ));
    }
    let cos_limit = angle_deg.to_radians().cos();

    let faces: Vec<Face> = mesh
        .indices
        .chunks_exact(3)
        .map(|tri| {
            let p = [0, 1, 2].map(|k| Vec3::from(mesh.positions[tri[k] as usize]));
            // Cross product length is twice the face area
            let cross = (p[1] - p[0]).cross(p[2] - p[0]);
            Face {
                normal: cross.normalize_or_zero(),
                area: cross.length() * 0.5,
                corners: [0, 1, 2].map(|k| corner_angle(p, k)),
            }
        })
        .collect();

    let groups = weld_groups(&mesh.positions, weld_threshold);
    let mut vertex_faces: Vec<Vec<usize>> = vec![Vec::new(); mesh.positions.len()];
    // (face, corner) pairs touching each welded position
    let mut group_corners: HashMap<usize, Vec<(usize, usize)>> = HashMap::new();
    for (face, tri) in mesh.indices.chunks_exact(3).enumerate() {
        for (corner, &v) in tri.iter().enumerate() {
            vertex_faces[v as usize].push(face);
            group_corners
                .entry(groups[v as usize])
                .or_default()
                .push((face, corner));
        }
    }
    for corners in group_corners.values_mut() {
        corners.sort_unstable();
        corners.dedup_by_key(|(face, _)| *face);
    }

    let normals = (0..mesh.positions.len())
        .map(|v| {
            let previous = mesh.normals.get(v).copied().unwrap_or([0.0, 1.0, 0.0]);
            let reference = vertex_faces[v]
                .iter()
                .map(|f| faces[*f].normal)
                .sum::<Vec3>()
                .normalize_or_zero();
            if reference == Vec3::ZERO {
                return previous;
            }

            let smoothed = group_corners
                .get(&groups[v])
                .map(|corners| {
                    corners
                        .iter()
                        .map(|&(f, corner)| (&faces[f], corner))
                        .filter(|(face, _)| face.normal.dot(reference) >= cos_limit)
                        .map(|(face, corner)| {
                            let weight = match weighting {
                                Weighting::CornerAngle => face.corners[corner],
                                Weighting::AreaAndAngle => face.corners[corner] * face.area,
                            };
                            face.normal * weight
                        })
                        .sum::<Vec3>()
                        .normalize_or_zero()
                })
                .unwrap_or(Vec3::ZERO);

            let normal = if smoothed == Vec3::ZERO {
                reference
            } else {
                smoothed
            };
            normal.to_array()
        })
        .collect();

    mesh.normals = normals;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{CapFacing, generate_cap, generate_shell};

    fn capped_shell() -> MeshData {
        let mut mesh = generate_shell(16, 1.0, 1.0, 0.0, 2.0).unwrap();
        mesh.append(&generate_cap(16, 1.0, 2.0, CapFacing::Up).unwrap())
            .unwrap();
        mesh
    }

    #[test]
    fn test_weld_groups() {
        let positions = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.00001, 0.0, 0.0],
            [1.0, 0.0, 0.00005],
        ];
        let groups = weld_groups(&positions, 0.0001);
        assert_eq!(groups, vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_cylinder_stays_radial_and_seam_is_closed() {
        let mut mesh = generate_shell(8, 1.0, 1.0, 0.0, 1.0).unwrap();
        AutoSmooth::default().apply(&mut mesh).unwrap();

        for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
            let radial = Vec3::new(p[0], 0.0, p[2]).normalize();
            assert!(radial.dot(Vec3::from(*n)) > 0.999);
        }
        // First and last ring share a position, so they share a normal
        let first = Vec3::from(mesh.normals[0]);
        let last = Vec3::from(mesh.normals[16]);
        assert!(first.distance(last) < 1e-5);
    }

    #[test]
    fn test_cap_edge_stays_sharp() {
        let mut mesh = capped_shell();
        AutoSmooth::default().apply(&mut mesh).unwrap();

        // Top ring vertex of the side
        assert!(mesh.normals[1][1].abs() < 1e-5);
        // Cap center and rim
        let cap_start = 2 * 17;
        assert!((mesh.normals[cap_start][1] - 1.0).abs() < 1e-5);
        assert!((mesh.normals[cap_start + 1][1] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_wide_angle_rounds_the_edge() {
        let mut mesh = capped_shell();
        AutoSmooth {
            angle_deg: 100.0,
            ..Default::default()
        }
        .apply(&mut mesh)
        .unwrap();
        assert!(mesh.normals[1][1] > 0.1);
    }

    #[test]
    fn test_large_faces_dominate_weighted_normals() {
        let base = MeshData {
            positions: vec![
                [0.0, 0.0, 0.0],
                [10.0, 0.0, 0.0],
                [0.0, 10.0, 0.0],
                [0.0, -1.0, 0.0],
                [1.0, 0.0, 1.0],
            ],
            indices: vec![0, 1, 2, 0, 3, 4],
            ..Default::default()
        };

        let mut uniform = base.clone();
        AutoSmooth::default().apply(&mut uniform).unwrap();
        let mut weighted = base;
        WeightedNormals::default().apply(&mut weighted).unwrap();

        assert!(weighted.normals[0][2] > uniform.normals[0][2]);
        assert!(weighted.normals[0][2] > 0.99);
    }

    #[test]
    fn test_requires_triangles() {
        let mut mesh = generate_shell(4, 1.0, 1.0, 0.0, 1.0).unwrap();
        mesh.indices.clear();
        assert_eq!(
            AutoSmooth::default().apply(&mut mesh),
            Err(ModifierError::NotTriangles)
        );
    }
}

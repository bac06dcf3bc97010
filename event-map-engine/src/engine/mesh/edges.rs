//! Crease-edge extraction for wireframe overlays.
//!
//! An edge is kept when it borders a single triangle or when the normals of
//! the two triangles meeting there differ by more than the crease angle.
//! Vertices are welded by quantised position first, so split normals and UV
//! seams do not turn every triangle border into an edge.

use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::PrimitiveTopology;
use std::collections::HashMap;

use super::triangles::TriangleSoup;

const WELD_PRECISION: f32 = 1e4;

fn weld_key(p: Vec3) -> (i64, i64, i64) {
    (
        (p.x * WELD_PRECISION).round() as i64,
        (p.y * WELD_PRECISION).round() as i64,
        (p.z * WELD_PRECISION).round() as i64,
    )
}

struct EdgeFaces {
    endpoints: [Vec3; 2],
    first_normal: Vec3,
    second_normal: Option<Vec3>,
    shared: usize,
}

pub fn crease_edges(soup: &TriangleSoup, threshold_deg: f32) -> Vec<[Vec3; 2]> {
    let cos_threshold = threshold_deg.to_radians().cos();
    let mut welded: HashMap<(i64, i64, i64), usize> = HashMap::new();
    let mut edges: HashMap<(usize, usize), EdgeFaces> = HashMap::new();
    let mut order: Vec<(usize, usize)> = Vec::new();

    for tri in soup.triangles() {
        let normal = (tri[1] - tri[0]).cross(tri[2] - tri[0]);
        if normal.length_squared() <= f32::EPSILON * f32::EPSILON {
            continue;
        }
        let normal = normal.normalize();

        let mut ids = [0usize; 3];
        for (slot, p) in tri.iter().enumerate() {
            let next_id = welded.len();
            ids[slot] = *welded.entry(weld_key(*p)).or_insert(next_id);
        }

        for (a, b) in [(0, 1), (1, 2), (2, 0)] {
            let key = (ids[a].min(ids[b]), ids[a].max(ids[b]));
            if key.0 == key.1 {
                continue;
            }
            match edges.get_mut(&key) {
                Some(entry) => {
                    entry.shared += 1;
                    if entry.second_normal.is_none() {
                        entry.second_normal = Some(normal);
                    }
                }
                None => {
                    order.push(key);
                    edges.insert(
                        key,
                        EdgeFaces {
                            endpoints: [tri[a], tri[b]],
                            first_normal: normal,
                            second_normal: None,
                            shared: 1,
                        },
                    );
                }
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| {
            let entry = edges.get(&key)?;
            let keep = match entry.second_normal {
                None => true,
                Some(_) if entry.shared > 2 => true,
                Some(second) => entry.first_normal.dot(second) <= cos_threshold,
            };
            keep.then_some(entry.endpoints)
        })
        .collect()
}

/// Line-list mesh drawing `segments`.
pub fn edge_line_mesh(segments: &[[Vec3; 2]]) -> Mesh {
    let positions: Vec<[f32; 3]> = segments
        .iter()
        .flat_map(|[a, b]| [a.to_array(), b.to_array()])
        .collect();
    let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_soup() -> TriangleSoup {
        let mesh = Mesh::from(Cuboid::new(2.0, 2.0, 2.0));
        super::super::triangles::mesh_triangles(&mesh).unwrap()
    }

    #[test]
    fn cube_has_twelve_crease_edges() {
        let edges = crease_edges(&cube_soup(), 30.0);
        assert_eq!(edges.len(), 12);
    }

    #[test]
    fn coplanar_quad_keeps_only_its_border() {
        let soup = TriangleSoup {
            positions: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            indices: vec![0, 2, 1, 0, 3, 2],
        };
        let edges = crease_edges(&soup, 30.0);
        assert_eq!(edges.len(), 4);
    }

    #[test]
    fn line_mesh_has_two_vertices_per_segment() {
        let mesh = edge_line_mesh(&[[Vec3::ZERO, Vec3::X], [Vec3::X, Vec3::Y]]);
        assert_eq!(mesh.count_vertices(), 4);
    }
}

use bevy::render::mesh::{Indices, PrimitiveTopology, VertexAttributeValues};
use bevy::prelude::*;

/// Positions and triangle-list indices read back from a render mesh.
#[derive(Debug, Clone, Default)]
pub struct TriangleSoup {
    pub positions: Vec<Vec3>,
    pub indices: Vec<usize>,
}

impl TriangleSoup {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            Some([
                *self.positions.get(tri[0])?,
                *self.positions.get(tri[1])?,
                *self.positions.get(tri[2])?,
            ])
        })
    }
}

/// Extract the triangle list of `mesh`. Non-triangle topologies and meshes
/// without float positions yield `None`.
pub fn mesh_triangles(mesh: &Mesh) -> Option<TriangleSoup> {
    if mesh.primitive_topology() != PrimitiveTopology::TriangleList {
        return None;
    }
    let VertexAttributeValues::Float32x3(raw) = mesh.attribute(Mesh::ATTRIBUTE_POSITION)? else {
        return None;
    };
    let positions: Vec<Vec3> = raw.iter().map(|p| Vec3::from_array(*p)).collect();
    let indices = match mesh.indices() {
        Some(Indices::U16(values)) => values.iter().map(|&i| i as usize).collect(),
        Some(Indices::U32(values)) => values.iter().map(|&i| i as usize).collect(),
        None => (0..positions.len()).collect(),
    };
    Some(TriangleSoup { positions, indices })
}

use cgmath::{Vector3, Vector4};

use crate::{
    data_structures::model::{Material, Mesh, UvLayer},
    error::{AseError, Result},
    resources::geometry::{Corner, RawFace, MAX_POOL_SIZE},
};

/**
 * Turn face-indexed geometry into a renderer-ready [`Mesh`].
 *
 * Vertex `i` of the mesh is vertex `i` of the pool, so the index buffer is
 * the faces' vertex indices in order. Per-corner attributes are collapsed
 * to one value per vertex: the first corner referencing the vertex, scanning
 * faces in order and corners A, B, C, provides its normal, tangent,
 * binormal and texture coordinate. Unreferenced vertices get zeros.
 */
pub fn flatten(
    name: impl Into<String>,
    vertices: &[Vector4<f32>],
    faces: &[RawFace],
    material: Material,
) -> Result<Mesh> {
    let vertex_count = vertices.len();
    if vertex_count > MAX_POOL_SIZE {
        return Err(AseError::CapacityExceeded {
            what: "vertex",
            count: vertex_count,
            limit: MAX_POOL_SIZE,
        });
    }
    if faces.len() > MAX_POOL_SIZE {
        return Err(AseError::CapacityExceeded {
            what: "face",
            count: faces.len(),
            limit: MAX_POOL_SIZE,
        });
    }

    let mut first_corner: Vec<Option<&Corner>> = vec![None; vertex_count];
    let mut indices = Vec::with_capacity(faces.len() * 3);
    for face in faces {
        for (corner, &v) in face.corners.iter().zip(face.indices.iter()) {
            let out_of_range = AseError::IndexOutOfRange {
                pool: "vertex",
                index: v,
                len: vertex_count,
            };
            let slot = first_corner.get_mut(v).ok_or(out_of_range)?;
            slot.get_or_insert(corner);
            // v < vertex_count <= u16::MAX
            indices.push(v as u16);
        }
    }

    let unused = Corner::default();
    let mut normals = Vec::with_capacity(vertex_count * 3);
    let mut layer = UvLayer {
        tangents: Vec::with_capacity(vertex_count * 3),
        binormals: Vec::with_capacity(vertex_count * 3),
        uv_coordinates: Vec::with_capacity(vertex_count * 3),
    };
    for corner in first_corner.iter().map(|c| c.unwrap_or(&unused)) {
        normals.extend_from_slice(&xyz(corner.normal));
        layer.tangents.extend_from_slice(&xyz(corner.tangent));
        layer.binormals.extend_from_slice(&xyz(corner.binormal));
        layer.uv_coordinates.extend_from_slice(&xyz(corner.uv));
    }

    let mut mesh = Mesh {
        name: name.into(),
        vertex_count,
        positions: vertices.iter().flat_map(|v| [v.x, v.y, v.z, v.w]).collect(),
        normals,
        uv_layers: Vec::new(),
        indices,
        materials: vec![material],
    };
    mesh.push_uv_layer(layer)?;
    Ok(mesh)
}

fn xyz(v: Vector3<f32>) -> [f32; 3] {
    v.into()
}

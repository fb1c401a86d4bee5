use std::collections::HashMap;

use cgmath::{InnerSpace, Vector3, Vector4, Zero};

use crate::{
    config::{DegenerateUvPolicy, LoaderConfig, VertexSharing},
    error::{AseError, Result},
    resources::geometry::{Corner, RawFace},
};

/// Tangent and binormal of a triangle from its positions and texture
/// coordinates.
///
/// Returns `None` when the UV determinant is within `epsilon` of zero or the
/// resulting vectors have no length.
pub fn face_tangent_basis(
    positions: [Vector3<f32>; 3],
    uvs: [Vector3<f32>; 3],
    epsilon: f32,
) -> Option<(Vector3<f32>, Vector3<f32>)> {
    let e1 = positions[1] - positions[0];
    let e2 = positions[2] - positions[0];
    let d1 = uvs[1] - uvs[0];
    let d2 = uvs[2] - uvs[0];

    let det = d1.x * d2.y - d2.x * d1.y;
    if !(det.abs() > epsilon) {
        return None;
    }
    let r = 1.0 / det;
    let tangent = (e1 * d2.y - e2 * d1.y) * r;
    let binormal = (e2 * d1.x - e1 * d2.x) * r;
    Some((unit(tangent)?, unit(binormal)?))
}

fn unit(v: Vector3<f32>) -> Option<Vector3<f32>> {
    let len2 = v.magnitude2();
    (len2 > 0.0 && len2.is_finite()).then(|| v.normalize())
}

/// Mean of the distinct vectors in `values`; exact duplicates count once.
/// Zero when there are no values.
pub fn mean_of_distinct(values: impl IntoIterator<Item = Vector3<f32>>) -> Vector3<f32> {
    let mut distinct: Vec<Vector3<f32>> = Vec::new();
    for value in values {
        if !distinct.contains(&value) {
            distinct.push(value);
        }
    }
    if distinct.is_empty() {
        return Vector3::zero();
    }
    distinct.iter().fold(Vector3::zero(), |acc, &v| acc + v) / distinct.len() as f32
}

/// Faces incident to each vertex, built once per object.
///
/// Vertices are grouped first; with [`VertexSharing::ByIndex`] every vertex
/// is its own group, with [`VertexSharing::ByPosition`] vertices with
/// bit-identical positions share one.
#[derive(Debug)]
pub struct VertexAdjacency {
    group_of: Vec<usize>,
    faces_of: Vec<Vec<usize>>,
}

impl VertexAdjacency {
    pub fn build(
        vertices: &[Vector4<f32>],
        faces: &[RawFace],
        sharing: VertexSharing,
    ) -> Result<Self> {
        let group_of: Vec<usize> = match sharing {
            VertexSharing::ByIndex => (0..vertices.len()).collect(),
            VertexSharing::ByPosition => {
                let mut groups: HashMap<[u32; 4], usize> = HashMap::new();
                vertices
                    .iter()
                    .map(|v| {
                        let next = groups.len();
                        *groups.entry(position_key(v)).or_insert(next)
                    })
                    .collect()
            }
        };

        let group_count = group_of.iter().max().map_or(0, |&max| max + 1);
        let mut faces_of = vec![Vec::new(); group_count];
        for (f, face) in faces.iter().enumerate() {
            for &v in &face.indices {
                let group = *group_of.get(v).ok_or(AseError::IndexOutOfRange {
                    pool: "vertex",
                    index: v,
                    len: vertices.len(),
                })?;
                let incident = &mut faces_of[group];
                if incident.last() != Some(&f) {
                    incident.push(f);
                }
            }
        }
        Ok(Self { group_of, faces_of })
    }

    pub fn group_count(&self) -> usize {
        self.faces_of.len()
    }

    pub fn group(&self, vertex: usize) -> Option<usize> {
        self.group_of.get(vertex).copied()
    }

    /// Faces incident to `vertex` (or to its position group), in face order.
    pub fn incident_faces(&self, vertex: usize) -> &[usize] {
        self.group(vertex).map_or(&[], |g| &self.faces_of[g])
    }
}

fn average_corner(incident: &[usize], faces: &[RawFace]) -> Corner {
    let bases: Vec<_> = incident
        .iter()
        .filter_map(|&f| faces[f].tangent_basis)
        .collect();
    Corner {
        normal: mean_of_distinct(incident.iter().map(|&f| faces[f].face_normal)),
        tangent: mean_of_distinct(bases.iter().map(|&(t, _)| t)),
        binormal: mean_of_distinct(bases.iter().map(|&(_, b)| b)),
        uv: Vector3::zero(),
    }
}

// `-0.0` and `0.0` compare equal, so they must share a key.
fn position_key(v: &Vector4<f32>) -> [u32; 4] {
    [v.x, v.y, v.z, v.w].map(|c| (c + 0.0).to_bits())
}

/**
 * Rebuild per-corner normals, tangents and binormals for one object.
 *
 * Every face first gets its own tangent basis from its UVs. Each vertex then
 * receives the mean of the distinct face normals, tangents and binormals of
 * its incident faces, and that average is written to every corner that
 * references the vertex. Faces with degenerate UVs are handled per
 * `config.degenerate_uv`.
 */
pub fn compute_tangent_space(
    vertices: &[Vector4<f32>],
    faces: &mut [RawFace],
    config: &LoaderConfig,
) -> Result<()> {
    let adjacency = VertexAdjacency::build(vertices, faces, config.vertex_sharing)?;

    let mut degenerate = 0;
    for (index, face) in faces.iter_mut().enumerate() {
        let positions = face.indices.map(|v| vertices[v].truncate());
        let uvs = face.corners.map(|corner| corner.uv);
        face.tangent_basis = face_tangent_basis(positions, uvs, config.uv_epsilon);
        if face.tangent_basis.is_none() {
            match config.degenerate_uv {
                DegenerateUvPolicy::Fail => return Err(AseError::DegenerateUv { face: index }),
                DegenerateUvPolicy::Skip => degenerate += 1,
            }
        }
    }
    if degenerate > 0 {
        log::warn!(
            "{degenerate} of {} face(s) have degenerate texture coordinates and no tangent basis",
            faces.len()
        );
    }

    let averages: Vec<Corner> = adjacency
        .faces_of
        .iter()
        .map(|incident| average_corner(incident, faces))
        .collect();

    for face in faces.iter_mut() {
        for (corner, &v) in face.corners.iter_mut().zip(face.indices.iter()) {
            let average = &averages[adjacency.group_of[v]];
            corner.normal = average.normal;
            corner.tangent = average.tangent;
            corner.binormal = average.binormal;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn v3(x: f32, y: f32, z: f32) -> Vector3<f32> {
        Vector3::new(x, y, z)
    }

    fn v4(x: f32, y: f32, z: f32) -> Vector4<f32> {
        Vector4::new(x, y, z, 1.0)
    }

    fn face(indices: [usize; 3], normal: Vector3<f32>, uvs: [Vector3<f32>; 3]) -> RawFace {
        let mut face = RawFace::new(indices);
        face.face_normal = normal;
        for (corner, uv) in face.corners.iter_mut().zip(uvs) {
            corner.uv = uv;
        }
        face
    }

    fn unit_uvs() -> [Vector3<f32>; 3] {
        [v3(0.0, 0.0, 0.0), v3(1.0, 0.0, 0.0), v3(0.0, 1.0, 0.0)]
    }

    #[test]
    fn axis_aligned_basis() {
        let positions = [v3(0.0, 0.0, 0.0), v3(2.0, 0.0, 0.0), v3(0.0, 2.0, 0.0)];
        let (t, b) = face_tangent_basis(positions, unit_uvs(), 1e-12).unwrap();
        assert_eq!(t, v3(1.0, 0.0, 0.0));
        assert_eq!(b, v3(0.0, 1.0, 0.0));
    }

    #[test]
    fn collinear_uvs_have_no_basis() {
        let positions = [v3(0.0, 0.0, 0.0), v3(1.0, 0.0, 0.0), v3(0.0, 1.0, 0.0)];
        let uvs = [v3(0.0, 0.0, 0.0), v3(0.5, 0.5, 0.0), v3(1.0, 1.0, 0.0)];
        assert!(face_tangent_basis(positions, uvs, 1e-12).is_none());
        assert!(face_tangent_basis(positions, [Vector3::zero(); 3], 1e-12).is_none());
    }

    #[test]
    fn duplicates_count_once() {
        let up = v3(0.0, 0.0, 1.0);
        let side = v3(1.0, 0.0, 0.0);
        assert_eq!(mean_of_distinct([up, up, up, side]), v3(0.5, 0.0, 0.5));
        assert_eq!(mean_of_distinct(std::iter::empty()), Vector3::zero());
    }

    #[test]
    fn shared_vertices_average_face_normals() {
        // Two faces folded along the edge 0-1.
        let vertices = [
            v4(0.0, 0.0, 0.0),
            v4(1.0, 0.0, 0.0),
            v4(0.0, 1.0, 0.0),
            v4(0.0, 0.0, 1.0),
        ];
        let mut faces = vec![
            face([0, 1, 2], v3(0.0, 0.0, 1.0), unit_uvs()),
            face([1, 0, 3], v3(0.0, 1.0, 0.0), unit_uvs()),
        ];
        compute_tangent_space(&vertices, &mut faces, &LoaderConfig::default()).unwrap();

        assert_eq!(faces[0].corners[0].normal, v3(0.0, 0.5, 0.5));
        assert_eq!(faces[1].corners[1].normal, v3(0.0, 0.5, 0.5));
        assert_eq!(faces[0].corners[2].normal, v3(0.0, 0.0, 1.0));
        assert_eq!(faces[1].corners[2].normal, v3(0.0, 1.0, 0.0));
        // Corners keep their own texture coordinates.
        assert_eq!(faces[1].corners[0].uv, unit_uvs()[0]);
        assert_eq!(faces[1].corners[1].uv, unit_uvs()[1]);
    }

    #[test]
    fn degenerate_faces_are_skipped_or_rejected() {
        let vertices = [v4(0.0, 0.0, 0.0), v4(1.0, 0.0, 0.0), v4(0.0, 1.0, 0.0)];
        let mut faces = vec![face([0, 1, 2], v3(0.0, 0.0, 1.0), [Vector3::zero(); 3])];

        compute_tangent_space(&vertices, &mut faces, &LoaderConfig::default()).unwrap();
        assert!(faces[0].tangent_basis.is_none());
        assert_eq!(faces[0].corners[0].tangent, Vector3::zero());
        assert_eq!(faces[0].corners[0].normal, v3(0.0, 0.0, 1.0));

        let strict = LoaderConfig::default().with_degenerate_uv(DegenerateUvPolicy::Fail);
        let err = compute_tangent_space(&vertices, &mut faces, &strict).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DegenerateUv);
    }

    #[test]
    fn position_sharing_merges_split_vertices() {
        // Vertex 3 duplicates vertex 0, as exporters do along UV seams.
        let vertices = [
            v4(0.0, 0.0, 0.0),
            v4(1.0, 0.0, 0.0),
            v4(0.0, 1.0, 0.0),
            v4(-0.0, 0.0, 0.0),
            v4(0.0, 0.0, 1.0),
        ];
        let faces = vec![
            face([0, 1, 2], v3(0.0, 0.0, 1.0), unit_uvs()),
            face([3, 4, 1], v3(0.0, 1.0, 0.0), unit_uvs()),
        ];

        let by_index = VertexAdjacency::build(&vertices, &faces, VertexSharing::ByIndex).unwrap();
        assert_eq!(by_index.incident_faces(0), &[0]);
        assert_eq!(by_index.incident_faces(1), &[0, 1]);

        let by_position =
            VertexAdjacency::build(&vertices, &faces, VertexSharing::ByPosition).unwrap();
        assert_eq!(by_position.group_count(), 4);
        assert_eq!(by_position.group(3), by_position.group(0));
        assert_eq!(by_position.incident_faces(0), &[0, 1]);
    }

    #[test]
    fn unknown_vertex_is_rejected() {
        let vertices = [v4(0.0, 0.0, 0.0)];
        let mut faces = vec![RawFace::new([0, 0, 1])];
        let err = compute_tangent_space(&vertices, &mut faces, &LoaderConfig::default());
        assert_eq!(err.unwrap_err().kind(), ErrorKind::IndexOutOfRange);
    }
}

//! `*GEOMOBJECT` parsing.
//!
//! Produces the intermediate, face-indexed representation of one object:
//! a vertex pool, triangles referencing it, per-corner texture coordinates
//! and per-face normals. Tangent space and flattening happen afterwards.

use cgmath::{InnerSpace, Vector3, Vector4, Zero};

use crate::{
    data_structures::model::Color,
    error::{AseError, Result},
    resources::chunk::{
        find_chunk, find_label, has_field, read_quoted, read_usize, read_vec3, require_chunk,
        FieldReader,
    },
};

/// Largest vertex or face pool that can be addressed with 16-bit indices.
pub const MAX_POOL_SIZE: usize = u16::MAX as usize;

/// Attributes of one triangle corner.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Corner {
    pub normal: Vector3<f32>,
    pub tangent: Vector3<f32>,
    pub binormal: Vector3<f32>,
    /// Texture coordinate, `z` is always 0.
    pub uv: Vector3<f32>,
}

impl Default for Corner {
    fn default() -> Self {
        Self {
            normal: Vector3::zero(),
            tangent: Vector3::zero(),
            binormal: Vector3::zero(),
            uv: Vector3::zero(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RawFace {
    /// Indices into the object's vertex pool, corners A, B and C.
    pub indices: [usize; 3],
    pub face_normal: Vector3<f32>,
    /// Face tangent and binormal; `None` while not computed or when the
    /// face's texture coordinates are degenerate.
    pub tangent_basis: Option<(Vector3<f32>, Vector3<f32>)>,
    pub corners: [Corner; 3],
}

impl RawFace {
    pub fn new(indices: [usize; 3]) -> Self {
        Self {
            indices,
            face_normal: Vector3::zero(),
            tangent_basis: None,
            corners: [Corner::default(); 3],
        }
    }
}

/// How an object names its material.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MaterialSource {
    /// Index into the scene's material list.
    Reference(usize),
    /// No material; the object's wireframe colour stands in for one.
    Wireframe(Color),
    Unspecified,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RawObject {
    pub name: String,
    /// Positions with `w = 1`.
    pub vertices: Vec<Vector4<f32>>,
    pub faces: Vec<RawFace>,
    pub material: MaterialSource,
}

/// Parse the body of a `*GEOMOBJECT` chunk.
///
/// Errors after the object's name has been read are reported as
/// `AseError::Object` carrying that name.
pub fn parse_object(text: &str) -> Result<RawObject> {
    let name = read_quoted(text, "*NODE_NAME")?.to_string();
    let parsed = parse_geometry(text).and_then(|(vertices, faces)| {
        read_material_source(text).map(|material| (vertices, faces, material))
    });
    match parsed {
        Ok((vertices, faces, material)) => Ok(RawObject {
            name,
            vertices,
            faces,
            material,
        }),
        Err(err) => Err(err.in_object(&name)),
    }
}

fn read_material_source(text: &str) -> Result<MaterialSource> {
    if has_field(text, "*MATERIAL_REF") {
        return Ok(MaterialSource::Reference(read_usize(text, "*MATERIAL_REF")?));
    }
    if has_field(text, "*WIREFRAME_COLOR") {
        let [r, g, b] = read_vec3(text, "*WIREFRAME_COLOR")?;
        return Ok(MaterialSource::Wireframe(Color::rgb(r, g, b)));
    }
    Ok(MaterialSource::Unspecified)
}

fn read_count(text: &str, tag: &str, what: &'static str) -> Result<usize> {
    let count = read_usize(text, tag)?;
    if count > MAX_POOL_SIZE {
        return Err(AseError::CapacityExceeded {
            what,
            count,
            limit: MAX_POOL_SIZE,
        });
    }
    Ok(count)
}

/**
 * Collect the `tag <index> …` entries of a list chunk, placing each at its
 * explicit index. The number of entries must equal `declared` and every
 * index below it must be present exactly once.
 */
fn read_entries<'a, T>(
    list: &'a str,
    tag: &str,
    declared: usize,
    what: &'static str,
    mut parse: impl FnMut(&mut FieldReader<'a>) -> Result<T>,
) -> Result<Vec<T>> {
    let mut entries: Vec<Option<T>> = (0..declared).map(|_| None).collect();
    let mut parsed = 0;
    let mut reader = FieldReader::new(list);
    while reader.try_seek(tag) {
        let index = reader.next_index()?;
        let value = parse(&mut reader)?;
        parsed += 1;
        let slot = entries.get_mut(index).ok_or(AseError::IndexOutOfRange {
            pool: what,
            index,
            len: declared,
        })?;
        *slot = Some(value);
    }

    if parsed != declared {
        return Err(AseError::CountMismatch {
            what,
            declared,
            parsed,
        });
    }
    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| entry.ok_or_else(|| AseError::FieldNotFound(format!("{tag} {i}"))))
        .collect()
}

fn parse_geometry(text: &str) -> Result<(Vec<Vector4<f32>>, Vec<RawFace>)> {
    let mesh = require_chunk(text, "*MESH")?.body;
    let vertex_count = read_count(mesh, "*MESH_NUMVERTEX", "vertex")?;
    let face_count = read_count(mesh, "*MESH_NUMFACES", "face")?;

    let vertices = if vertex_count > 0 {
        let list = require_chunk(mesh, "*MESH_VERTEX_LIST")?;
        read_entries(list.body, "*MESH_VERTEX", vertex_count, "vertex", |r| {
            let [x, y, z] = r.next_vec3()?;
            Ok(Vector4::new(x, y, z, 1.0))
        })?
    } else {
        Vec::new()
    };

    let mut faces = if face_count > 0 {
        let list = require_chunk(mesh, "*MESH_FACE_LIST")?;
        read_entries(list.body, "*MESH_FACE", face_count, "face", |r| {
            Ok(RawFace::new([
                r.next_keyed_usize("A")?,
                r.next_keyed_usize("B")?,
                r.next_keyed_usize("C")?,
            ]))
        })?
    } else {
        Vec::new()
    };
    for &index in faces.iter().flat_map(|face| face.indices.iter()) {
        if index >= vertex_count {
            return Err(AseError::IndexOutOfRange {
                pool: "vertex",
                index,
                len: vertex_count,
            });
        }
    }

    read_texture_coordinates(mesh, &mut faces)?;
    read_face_normals(mesh, &vertices, &mut faces)?;
    Ok((vertices, faces))
}

/// Assign each face corner its UV from the first mapping channel.
fn read_texture_coordinates(mesh: &str, faces: &mut [RawFace]) -> Result<()> {
    // Additional channels repeat the same tags inside their own blocks.
    let channel = match find_label(mesh, "*MESH_MAPPINGCHANNEL", 0) {
        Some(idx) => &mesh[..idx],
        None => mesh,
    };
    if !has_field(channel, "*MESH_NUMTVERTEX") {
        return Ok(());
    }
    let tvert_count = read_count(channel, "*MESH_NUMTVERTEX", "texture vertex")?;
    if tvert_count == 0 || faces.is_empty() {
        return Ok(());
    }

    let list = require_chunk(channel, "*MESH_TVERTLIST")?;
    let tverts = read_entries(list.body, "*MESH_TVERT", tvert_count, "texture vertex", |r| {
        Ok(Vector3::new(r.next_f32()?, r.next_f32()?, 0.0))
    })?;

    let list = require_chunk(channel, "*MESH_TFACELIST")?;
    let tfaces = read_entries(list.body, "*MESH_TFACE", faces.len(), "texture face", |r| {
        Ok([r.next_usize()?, r.next_usize()?, r.next_usize()?])
    })?;

    for (face, tface) in faces.iter_mut().zip(tfaces) {
        for (corner, index) in face.corners.iter_mut().zip(tface) {
            corner.uv = *tverts.get(index).ok_or(AseError::IndexOutOfRange {
                pool: "texture vertex",
                index,
                len: tvert_count,
            })?;
        }
    }
    Ok(())
}

/// Read `*MESH_FACENORMAL` entries, or derive normals from the winding when
/// the exporter wrote none.
fn read_face_normals(mesh: &str, vertices: &[Vector4<f32>], faces: &mut [RawFace]) -> Result<()> {
    if faces.is_empty() {
        return Ok(());
    }
    let Some(list) = find_chunk(mesh, "*MESH_NORMALS", 0)? else {
        log::debug!("no *MESH_NORMALS block, deriving face normals from winding");
        for face in faces.iter_mut() {
            face.face_normal = winding_normal(vertices, face.indices);
        }
        return Ok(());
    };

    let normals = read_entries(list.body, "*MESH_FACENORMAL", faces.len(), "face normal", |r| {
        let [x, y, z] = r.next_vec3()?;
        Ok(Vector3::new(x, y, z))
    })?;
    for (face, normal) in faces.iter_mut().zip(normals) {
        face.face_normal = normal;
    }
    Ok(())
}

/// Unit normal of a counter-clockwise triangle; zero when it has no area.
fn winding_normal(vertices: &[Vector4<f32>], [a, b, c]: [usize; 3]) -> Vector3<f32> {
    let p0 = vertices[a].truncate();
    let normal = (vertices[b].truncate() - p0).cross(vertices[c].truncate() - p0);
    if normal.magnitude2() > 0.0 {
        normal.normalize()
    } else {
        Vector3::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const TRIANGLE: &str = r#"
	*NODE_NAME "Tri01"
	*NODE_TM {
		*NODE_NAME "Tri01"
	}
	*MESH {
		*TIMEVALUE 0
		*MESH_NUMVERTEX 3
		*MESH_NUMFACES 1
		*MESH_VERTEX_LIST {
			*MESH_VERTEX    0	0.0000	0.0000	0.0000
			*MESH_VERTEX    2	0.0000	1.0000	0.0000
			*MESH_VERTEX    1	1.0000	0.0000	0.0000
		}
		*MESH_FACE_LIST {
			*MESH_FACE    0:    A:    0 B:    1 C:    2 AB:    1 BC:    1 CA:    1	 *MESH_SMOOTHING 1 	*MESH_MTLID 0
		}
		*MESH_NUMTVERTEX 3
		*MESH_TVERTLIST {
			*MESH_TVERT 0	0.0000	0.0000	0.0000
			*MESH_TVERT 1	1.0000	0.0000	0.0000
			*MESH_TVERT 2	0.0000	1.0000	0.0000
		}
		*MESH_NUMTVFACES 1
		*MESH_TFACELIST {
			*MESH_TFACE 0	0	1	2
		}
		*MESH_NORMALS {
			*MESH_FACENORMAL 0	0.0000	0.0000	1.0000
				*MESH_VERTEXNORMAL 0	0.0000	0.0000	1.0000
				*MESH_VERTEXNORMAL 1	0.0000	0.0000	1.0000
				*MESH_VERTEXNORMAL 2	0.0000	0.0000	1.0000
		}
	}
	*WIREFRAME_COLOR 0.6941	0.3451	0.8941
"#;

    #[test]
    fn parses_a_triangle() {
        let object = parse_object(TRIANGLE).unwrap();
        assert_eq!(object.name, "Tri01");
        assert_eq!(
            object.vertices,
            vec![
                Vector4::new(0.0, 0.0, 0.0, 1.0),
                Vector4::new(1.0, 0.0, 0.0, 1.0),
                Vector4::new(0.0, 1.0, 0.0, 1.0),
            ]
        );
        assert_eq!(object.faces.len(), 1);
        let face = &object.faces[0];
        assert_eq!(face.indices, [0, 1, 2]);
        assert_eq!(face.face_normal, Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(face.corners[1].uv, Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(face.corners[2].uv, Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(
            object.material,
            MaterialSource::Wireframe(Color::rgb(0.6941, 0.3451, 0.8941))
        );
    }

    #[test]
    fn material_reference_wins_over_wireframe() {
        let text = format!("{TRIANGLE}\n*MATERIAL_REF 3");
        assert_eq!(parse_object(&text).unwrap().material, MaterialSource::Reference(3));
    }

    #[test]
    fn bad_material_fields_name_the_object() {
        let text = format!("{TRIANGLE}\n*MATERIAL_REF x");
        let err = parse_object(&text).unwrap_err();
        assert!(matches!(err, AseError::Object { ref name, .. } if name == "Tri01"));

        let text = TRIANGLE.replace("*WIREFRAME_COLOR 0.6941\t0.3451", "*WIREFRAME_COLOR 0.6941");
        let err = parse_object(&text).unwrap_err();
        assert!(err.to_string().starts_with("object `Tri01`"));
    }

    #[test]
    fn face_index_beyond_pool_is_rejected() {
        let text = TRIANGLE.replace("C:    2 AB", "C:    3 AB");
        let err = parse_object(&text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
        assert!(err.to_string().starts_with("object `Tri01`"));
    }

    #[test]
    fn texture_face_index_beyond_pool_is_rejected() {
        let text = TRIANGLE.replace("*MESH_TFACE 0	0	1	2", "*MESH_TFACE 0	0	1	7");
        let err = parse_object(&text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
    }

    #[test]
    fn declared_counts_must_match() {
        let text = TRIANGLE.replace("*MESH_NUMVERTEX 3", "*MESH_NUMVERTEX 4");
        assert_eq!(parse_object(&text).unwrap_err().kind(), ErrorKind::CountMismatch);
    }

    #[test]
    fn required_fields() {
        let text = TRIANGLE.replace("*MESH_NUMFACES 1", "");
        assert_eq!(parse_object(&text).unwrap_err().kind(), ErrorKind::FieldNotFound);
        let text = TRIANGLE.replace("*NODE_NAME", "*NODE_LABEL");
        assert_eq!(parse_object(&text).unwrap_err().kind(), ErrorKind::FieldNotFound);
    }

    #[test]
    fn oversized_pools_are_rejected_before_parsing() {
        let text = TRIANGLE.replace("*MESH_NUMVERTEX 3", "*MESH_NUMVERTEX 70000");
        assert_eq!(parse_object(&text).unwrap_err().kind(), ErrorKind::CapacityExceeded);
    }

    #[test]
    fn missing_normals_are_derived_from_winding() {
        let start = TRIANGLE.find("*MESH_NORMALS").unwrap();
        let end = start + TRIANGLE[start..].find("}").unwrap() + 1;
        let text = format!("{}{}", &TRIANGLE[..start], &TRIANGLE[end..]);
        let object = parse_object(&text).unwrap();
        assert_eq!(object.faces[0].face_normal, Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn objects_without_uvs_keep_zero_coordinates() {
        let start = TRIANGLE.find("*MESH_NUMTVERTEX").unwrap();
        let end = TRIANGLE.find("*MESH_NORMALS").unwrap();
        let text = format!("{}{}", &TRIANGLE[..start], &TRIANGLE[end..]);
        let object = parse_object(&text).unwrap();
        assert!(object.faces[0].corners.iter().all(|c| c.uv == Vector3::zero()));
    }
}

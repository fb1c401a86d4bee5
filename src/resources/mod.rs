use std::{io, path::Path};

use crate::{
    config::{LoaderConfig, ObjectErrorPolicy},
    data_structures::{
        model::{Material, Mesh},
        scene_graph::Model,
    },
    error::{AseError, Result},
    resources::{
        chunk::find_chunk,
        geometry::{parse_object, MaterialSource, RawObject},
        material::parse_materials,
        mesh::flatten,
        tangent::compute_tangent_space,
    },
};

/**
 * This module contains all logic for loading scenes and their textures from
 * ASE files: chunk scanning, material and geometry parsing, tangent-space
 * reconstruction and flattening into renderable meshes.
 */
pub mod chunk;
pub mod geometry;
pub mod material;
pub mod mesh;
pub mod tangent;
pub mod texture;

/// Load an ASE scene with the default [`LoaderConfig`].
pub fn load_scene(path: impl AsRef<Path>) -> Result<Model> {
    load_scene_with(path, &LoaderConfig::default())
}

/// Load an ASE scene. The root model is named after the file stem.
pub fn load_scene_with(path: impl AsRef<Path>, config: &LoaderConfig) -> Result<Model> {
    let path = path.as_ref();
    let text = load_string(path)?;
    let mut scene = load_scene_from_str(&text, config)?;
    if let Some(stem) = path.file_stem() {
        scene.name = stem.to_string_lossy().into_owned();
    }
    Ok(scene)
}

/// Read a whole scene file. Invalid UTF-8 is replaced rather than rejected.
pub fn load_string(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => AseError::FileNotFound(path.to_path_buf()),
        _ => AseError::FileUnreadable {
            path: path.to_path_buf(),
            source,
        },
    })?;
    if bytes.is_empty() {
        return Err(AseError::FileEmpty(path.to_path_buf()));
    }

    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            log::warn!("{} is not valid UTF-8, decoding lossily", path.display());
            Ok(String::from_utf8_lossy(err.as_bytes()).into_owned())
        }
    }
}

/// Build a scene from ASE text already in memory. The root is named `scene`
/// and holds one child model per `*GEOMOBJECT`, in file order.
pub fn load_scene_from_str(text: &str, config: &LoaderConfig) -> Result<Model> {
    if !text.contains('{') {
        return Err(AseError::NoChunks);
    }
    let materials = parse_materials(text, config)?;

    let mut scene = Model::new("scene");
    let mut offset = 0;
    let mut index = 0;
    while let Some(chunk) = find_chunk(text, "*GEOMOBJECT", offset)? {
        offset = chunk.end;
        match load_object(chunk.body, &materials, config) {
            Ok(model) => scene.add_child(model),
            Err(err) if config.on_object_error == ObjectErrorPolicy::Skip => {
                log::warn!("skipping *GEOMOBJECT #{index}: {err}");
            }
            Err(err) => return Err(err),
        }
        index += 1;
    }

    log::info!(
        "loaded {} of {index} object(s) with {} material(s)",
        scene.children.len(),
        materials.len()
    );
    Ok(scene)
}

fn load_object(text: &str, materials: &[Material], config: &LoaderConfig) -> Result<Model> {
    let object = parse_object(text)?;
    let name = object.name.clone();
    build_model(object, materials, config).map_err(|err| err.in_object(&name))
}

fn build_model(mut object: RawObject, materials: &[Material], config: &LoaderConfig) -> Result<Model> {
    compute_tangent_space(&object.vertices, &mut object.faces, config)?;
    let material = resolve_material(&object, materials, config)?;
    let mesh: Mesh = flatten(
        format!("{}_mesh", object.name),
        &object.vertices,
        &object.faces,
        material,
    )?;
    log::debug!(
        "object {:?}: {} vertices, {} triangles",
        object.name,
        mesh.vertex_count,
        mesh.triangle_count()
    );
    Ok(Model::with_mesh(object.name, mesh))
}

fn resolve_material(
    object: &RawObject,
    materials: &[Material],
    config: &LoaderConfig,
) -> Result<Material> {
    match object.material {
        MaterialSource::Reference(index) => {
            materials
                .get(index)
                .cloned()
                .ok_or(AseError::IndexOutOfRange {
                    pool: "material",
                    index,
                    len: materials.len(),
                })
        }
        MaterialSource::Wireframe(color) => {
            Ok(Material::solid(
                format!("{}_wireframe", object.name),
                color,
                &config.uvw_defaults,
            ))
        }
        MaterialSource::Unspecified => {
            log::warn!(
                "object {:?} has neither a material reference nor a wireframe colour",
                object.name
            );
            Ok(Material::untextured(&config.uvw_defaults))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::UvwDefaults,
        data_structures::model::{BUMP_SLOT, TEXTURE_SLOT_COUNT},
        error::ErrorKind,
    };

    const SCENE: &str = r#"*3DSMAX_ASCIIEXPORT	200
*COMMENT "AsciiExport Version  2,00"
*SCENE {
	*SCENE_FILENAME "two.max"
}
*MATERIAL_LIST {
	*MATERIAL_COUNT 1
	*MATERIAL 0 {
		*MATERIAL_NAME "Stone"
		*MATERIAL_DIFFUSE 0.5000	0.5000	0.5000
	}
}
*GEOMOBJECT {
	*NODE_NAME "First"
	*MESH {
		*MESH_NUMVERTEX 3
		*MESH_NUMFACES 1
		*MESH_VERTEX_LIST {
			*MESH_VERTEX 0	0.0	0.0	0.0
			*MESH_VERTEX 1	1.0	0.0	0.0
			*MESH_VERTEX 2	0.0	1.0	0.0
		}
		*MESH_FACE_LIST {
			*MESH_FACE 0:	A: 0 B: 1 C: 2
		}
	}
	*MATERIAL_REF 0
}
*GEOMOBJECT {
	*NODE_NAME "Second"
	*MESH {
		*MESH_NUMVERTEX 0
		*MESH_NUMFACES 0
	}
	*WIREFRAME_COLOR 0.1000	0.2000	0.3000
}
"#;

    #[test]
    fn objects_become_children_in_order() {
        let scene = load_scene_from_str(SCENE, &LoaderConfig::default()).unwrap();
        assert_eq!(scene.name, "scene");
        assert!(scene.meshes.is_empty());
        let names: Vec<_> = scene.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);

        let first = &scene.children[0].meshes[0];
        assert_eq!(first.name, "First_mesh");
        assert_eq!(first.materials[0].name, "Stone");
        let second = &scene.children[1].meshes[0];
        assert_eq!(second.vertex_count, 0);
        assert_eq!(second.materials[0].name, "Second_wireframe");
        assert_eq!(second.materials[0].textures.len(), TEXTURE_SLOT_COUNT);
    }

    #[test]
    fn fallback_materials_carry_every_slot() {
        let text = SCENE.replace("*WIREFRAME_COLOR 0.1000\t0.2000\t0.3000", "");
        let config = LoaderConfig::default().with_uvw_defaults(UvwDefaults::identity());
        let scene = load_scene_from_str(&text, &config).unwrap();
        let material = &scene.children[1].meshes[0].materials[0];
        assert_eq!(material.textures.len(), TEXTURE_SLOT_COUNT);
        assert!(material.textures[BUMP_SLOT].is_empty());
        assert_eq!(material.textures[BUMP_SLOT].v_scale, 1.0);
    }

    #[test]
    fn bad_material_reference() {
        let text = SCENE.replace("*MATERIAL_REF 0", "*MATERIAL_REF 4");
        let err = load_scene_from_str(&text, &LoaderConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
        assert!(matches!(err, AseError::Object { ref name, .. } if name == "First"));
    }

    #[test]
    fn skip_policy_keeps_loading() {
        let text = SCENE.replace("A: 0 B: 1 C: 2", "A: 0 B: 1 C: 9");
        let err = load_scene_from_str(&text, &LoaderConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);

        let config = LoaderConfig::default().with_object_errors(ObjectErrorPolicy::Skip);
        let scene = load_scene_from_str(&text, &config).unwrap();
        assert_eq!(scene.children.len(), 1);
        assert_eq!(scene.children[0].name, "Second");
    }

    #[test]
    fn text_without_chunks() {
        let err = load_scene_from_str("*3DSMAX_ASCIIEXPORT 200", &LoaderConfig::default());
        assert_eq!(err.unwrap_err().kind(), ErrorKind::MalformedChunk);
    }
}

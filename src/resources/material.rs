use std::collections::BTreeMap;

use crate::{
    config::{LoaderConfig, UvwDefaults},
    data_structures::model::{Color, Material, TextureMap, TEXTURE_SLOT_COUNT},
    error::{AseError, Result},
    resources::chunk::{
        chunk_at, find_chunk, find_label, has_field, read_optional_f32, read_optional_quoted,
        read_quoted, read_usize, read_vec3, FieldReader,
    },
};

/// Texture blocks read from every material, in slot order.
const TEXTURE_SLOTS: [&str; TEXTURE_SLOT_COUNT] = ["*MAP_DIFFUSE", "*MAP_OPACITY", "*MAP_BUMP"];

/**
 * Reads the scene's `*MATERIAL_LIST`.
 *
 * Materials are returned in index order so that `*MATERIAL_REF n` can index
 * the result directly. A scene without a material list has no materials.
 */
pub fn parse_materials(text: &str, config: &LoaderConfig) -> Result<Vec<Material>> {
    let Some(list) = find_chunk(text, "*MATERIAL_LIST", 0)? else {
        log::debug!("scene has no *MATERIAL_LIST");
        return Ok(Vec::new());
    };
    let count = read_usize(list.body, "*MATERIAL_COUNT")?;

    // The declared count is untrusted; it only bounds the indices.
    let mut materials = BTreeMap::new();
    let mut parsed = 0;
    let mut reader = FieldReader::new(list.body);
    while reader.try_seek("*MATERIAL") {
        let index = reader.next_index()?;
        let chunk = chunk_at(list.body, reader.position(), "*MATERIAL")?;
        reader.skip_to(chunk.end);
        parsed += 1;

        if index >= count {
            return Err(AseError::IndexOutOfRange {
                pool: "material list",
                index,
                len: count,
            });
        }
        materials.insert(index, parse_material(chunk.body, config)?);
    }

    if parsed != count {
        return Err(AseError::CountMismatch {
            what: "material",
            declared: count,
            parsed,
        });
    }
    (0..count)
        .map(|i| {
            materials
                .remove(&i)
                .ok_or_else(|| AseError::FieldNotFound(format!("*MATERIAL {i}")))
        })
        .collect()
}

fn parse_material(body: &str, config: &LoaderConfig) -> Result<Material> {
    // Sub-materials are not supported; only read the material's own fields.
    let body = match find_label(body, "*SUBMATERIAL", 0) {
        Some(idx) => &body[..idx],
        None => body,
    };

    let name = read_quoted(body, "*MATERIAL_NAME")?.to_string();
    let transparency = read_optional_f32(body, "*MATERIAL_TRANSPARENCY")?.unwrap_or(0.0);
    let textures = TEXTURE_SLOTS
        .iter()
        .map(|label| parse_texture_map(body, label, &config.uvw_defaults))
        .collect::<Result<Vec<_>>>()?;

    let mapped = textures.iter().filter(|t| !t.is_empty()).count();
    log::debug!("material {name:?}: {mapped} texture(s)");
    Ok(Material {
        ambient: read_color(body, "*MATERIAL_AMBIENT")?,
        diffuse: read_color(body, "*MATERIAL_DIFFUSE")?,
        specular: read_color(body, "*MATERIAL_SPECULAR")?,
        shininess: read_optional_f32(body, "*MATERIAL_SHINESTRENGTH")?.unwrap_or(0.0),
        opacity: 1.0 - transparency,
        textures,
        name,
    })
}

/// Absent colours read as white.
fn read_color(body: &str, tag: &str) -> Result<Color> {
    if !has_field(body, tag) {
        return Ok(Color::WHITE);
    }
    let [r, g, b] = read_vec3(body, tag)?;
    Ok(Color::rgb(r, g, b))
}

fn parse_texture_map(body: &str, label: &str, defaults: &UvwDefaults) -> Result<TextureMap> {
    let Some(chunk) = find_chunk(body, label, 0)? else {
        return Ok(TextureMap::empty(defaults));
    };
    let map = chunk.body;

    Ok(TextureMap {
        name: read_optional_quoted(map, "*MAP_NAME")?.unwrap_or_default().to_string(),
        path: read_quoted(map, "*BITMAP")?.to_string(),
        class: read_optional_quoted(map, "*MAP_CLASS")?.unwrap_or_default().to_string(),
        u_offset: read_optional_f32(map, "*UVW_U_OFFSET")?.unwrap_or(defaults.u_offset),
        v_offset: read_optional_f32(map, "*UVW_V_OFFSET")?.unwrap_or(defaults.v_offset),
        u_scale: read_optional_f32(map, "*UVW_U_TILING")?.unwrap_or(defaults.u_scale),
        v_scale: read_optional_f32(map, "*UVW_V_TILING")?.unwrap_or(defaults.v_scale),
        angle: read_optional_f32(map, "*UVW_ANGLE")?.unwrap_or(defaults.angle),
    })
}

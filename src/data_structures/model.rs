//! Renderable geometry and the materials applied to it.
//!
//! A [`Mesh`] is the smallest renderable unit: flat, per-vertex attribute
//! arrays plus a 16-bit index buffer. Only triangles are stored.

use crate::{
    config::UvwDefaults,
    error::{AseError, Result},
};

/// Maximum number of UV layers a mesh can carry.
pub const MAX_UV_LAYERS: usize = 8;

/// Texture slot order inside [`Material::textures`].
pub const DIFFUSE_SLOT: usize = 0;
pub const OPACITY_SLOT: usize = 1;
pub const BUMP_SLOT: usize = 2;
pub const TEXTURE_SLOT_COUNT: usize = 3;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }
}

/// A texture referenced by a material.
///
/// Textures are distinct by `path`; an empty path marks an unused slot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextureMap {
    pub name: String,
    pub path: String,
    /// Map class as written by the exporter, e.g. `Bitmap`.
    pub class: String,
    pub u_offset: f32,
    pub v_offset: f32,
    pub u_scale: f32,
    pub v_scale: f32,
    pub angle: f32,
}

impl TextureMap {
    /// An unused slot carrying the given UVW transform.
    pub fn empty(defaults: &UvwDefaults) -> Self {
        Self {
            u_offset: defaults.u_offset,
            v_offset: defaults.v_offset,
            u_scale: defaults.u_scale,
            v_scale: defaults.v_scale,
            angle: defaults.angle,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
    pub shininess: f32,
    pub opacity: f32,
    /// Positional slots: diffuse, opacity, bump.
    pub textures: Vec<TextureMap>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            ambient: Color::default(),
            diffuse: Color::default(),
            specular: Color::default(),
            shininess: 0.0,
            opacity: 1.0,
            textures: vec![TextureMap::default(); TEXTURE_SLOT_COUNT],
        }
    }
}

impl Material {
    /// A material with every texture slot present but unused.
    pub fn untextured(defaults: &UvwDefaults) -> Self {
        Self {
            textures: vec![TextureMap::empty(defaults); TEXTURE_SLOT_COUNT],
            ..Default::default()
        }
    }

    /// Single-colour material used when an object references no material.
    pub fn solid(name: impl Into<String>, color: Color, defaults: &UvwDefaults) -> Self {
        Self {
            name: name.into(),
            ambient: color,
            diffuse: color,
            ..Self::untextured(defaults)
        }
    }

    fn slot(&self, slot: usize) -> Option<&TextureMap> {
        self.textures.get(slot).filter(|map| !map.is_empty())
    }

    pub fn diffuse_map(&self) -> Option<&TextureMap> {
        self.slot(DIFFUSE_SLOT)
    }

    pub fn opacity_map(&self) -> Option<&TextureMap> {
        self.slot(OPACITY_SLOT)
    }

    pub fn bump_map(&self) -> Option<&TextureMap> {
        self.slot(BUMP_SLOT)
    }
}

/// Tangent-space and texture data for one UV channel, 3 floats per vertex.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UvLayer {
    pub tangents: Vec<f32>,
    pub binormals: Vec<f32>,
    pub uv_coordinates: Vec<f32>,
}

/// Flattened, renderer-ready geometry.
///
/// `positions` holds 4 floats per vertex and `normals` 3; every
/// [`UvLayer`] is sized by `vertex_count` as well. `indices` holds three
/// entries per triangle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub vertex_count: usize,
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub uv_layers: Vec<UvLayer>,
    pub indices: Vec<u16>,
    pub materials: Vec<Material>,
}

impl Mesh {
    pub fn push_uv_layer(&mut self, layer: UvLayer) -> Result<()> {
        if self.uv_layers.len() >= MAX_UV_LAYERS {
            return Err(AseError::CapacityExceeded {
                what: "uv layer",
                count: self.uv_layers.len() + 1,
                limit: MAX_UV_LAYERS,
            });
        }
        self.uv_layers.push(layer);
        Ok(())
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Paths of every texture used by this mesh's materials, in slot order.
    pub fn texture_paths(&self) -> impl Iterator<Item = &str> {
        self.materials
            .iter()
            .flat_map(|material| material.textures.iter())
            .filter(|map| !map.is_empty())
            .map(|map| map.path.as_str())
    }

    pub fn position(&self, vertex: usize) -> Option<[f32; 4]> {
        let p = self.positions.get(vertex * 4..vertex * 4 + 4)?;
        Some([p[0], p[1], p[2], p[3]])
    }

    pub fn normal(&self, vertex: usize) -> Option<[f32; 3]> {
        triple(&self.normals, vertex)
    }
}

pub(crate) fn triple(values: &[f32], index: usize) -> Option<[f32; 3]> {
    let v = values.get(index * 3..index * 3 + 3)?;
    Some([v[0], v[1], v[2]])
}

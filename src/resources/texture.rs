use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

use image::RgbaImage;

use crate::data_structures::{scene_graph::Model, texture::Texture};

/// Decoded textures of a scene, keyed by the path written in the file.
#[derive(Debug, Default)]
pub struct TextureSet {
    pub images: HashMap<String, RgbaImage>,
    /// Paths that could not be resolved or decoded, in traversal order.
    pub missing: Vec<String>,
}

impl TextureSet {
    pub fn get(&self, path: &str) -> Option<&RgbaImage> {
        self.images.get(path)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Upload every decoded texture. Bump maps of `model` are stored linear,
    /// everything else as sRGB.
    pub fn upload(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        model: &Model,
    ) -> HashMap<String, Texture> {
        let linear = bump_map_paths(model);
        self.images
            .iter()
            .map(|(path, rgba)| {
                let linear = linear.contains(path);
                let texture = Texture::from_rgba(device, queue, rgba, Some(path.as_str()), linear);
                (path.clone(), texture)
            })
            .collect()
    }
}

fn bump_map_paths(model: &Model) -> HashSet<String> {
    model
        .meshes()
        .flat_map(|mesh| mesh.materials.iter())
        .filter_map(|material| material.bump_map())
        .map(|map| map.path.clone())
        .collect()
}

/// Final component of a path written on any platform.
fn file_name(path: &str) -> &str {
    path.rfind(|c: char| c == '\\' || c == '/')
        .map_or(path, |idx| &path[idx + 1..])
}

/// Locate a texture referenced by a scene.
///
/// Tries the path as written, then relative to `base_dir`, then its file
/// name inside `base_dir`; exporters usually write absolute paths from the
/// authoring machine.
pub fn resolve_texture_path(path: &str, base_dir: &Path) -> Option<PathBuf> {
    if path.is_empty() {
        return None;
    }
    [
        PathBuf::from(path),
        base_dir.join(path),
        base_dir.join(file_name(path)),
    ]
    .into_iter()
    .find(|candidate| candidate.is_file())
}

/// Decode every texture referenced by `model`. Loading never fails as a
/// whole; unusable paths are logged and recorded in
/// [`TextureSet::missing`].
pub fn load_textures(model: &Model, base_dir: impl AsRef<Path>) -> TextureSet {
    let base_dir = base_dir.as_ref();
    let mut set = TextureSet::default();
    for path in model.unique_texture_paths() {
        let Some(resolved) = resolve_texture_path(&path, base_dir) else {
            log::warn!("texture {path:?} not found (searched {})", base_dir.display());
            set.missing.push(path);
            continue;
        };
        match image::open(&resolved) {
            Ok(img) => {
                log::debug!("decoded texture {}", resolved.display());
                set.images.insert(path, img.to_rgba8());
            }
            Err(err) => {
                log::warn!("texture {} could not be decoded: {err}", resolved.display());
                set.missing.push(path);
            }
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_handles_both_separators() {
        assert_eq!(file_name("C:\\maps\\wood.tga"), "wood.tga");
        assert_eq!(file_name("/home/art/wood.tga"), "wood.tga");
        assert_eq!(file_name("wood.tga"), "wood.tga");
    }

    #[test]
    fn resolves_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("wood.tga"), b"").unwrap();

        assert_eq!(
            resolve_texture_path("C:\\maps\\wood.tga", dir.path()),
            Some(dir.path().join("wood.tga"))
        );
        assert_eq!(
            resolve_texture_path("wood.tga", dir.path()),
            Some(dir.path().join("wood.tga"))
        );
        assert_eq!(resolve_texture_path("stone.tga", dir.path()), None);
        assert_eq!(resolve_texture_path("", dir.path()), None);
    }
}

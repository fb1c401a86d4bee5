//! Scene graph produced by the loader.
//!
//! A [`Model`] is a named node owning its meshes and its child models. The
//! loader returns one root whose children are the scene's objects; dropping
//! the root releases the whole tree.

use std::collections::HashSet;

use crate::data_structures::model::Mesh;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Model {
    pub name: String,
    pub meshes: Vec<Mesh>,
    pub children: Vec<Model>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// A node owning a single mesh, as produced for every scene object.
    pub fn with_mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            name: name.into(),
            meshes: vec![mesh],
            children: Vec::new(),
        }
    }

    pub fn add_mesh(&mut self, mesh: Mesh) {
        self.meshes.push(mesh);
    }

    pub fn add_child(&mut self, child: Model) {
        self.children.push(child);
    }

    /// Detach the meshes from this node, leaving it empty.
    pub fn take_meshes(&mut self) -> Vec<Mesh> {
        std::mem::take(&mut self.meshes)
    }

    /// Detach the child models from this node, leaving it a leaf.
    pub fn take_children(&mut self) -> Vec<Model> {
        std::mem::take(&mut self.children)
    }

    /// Depth-first, pre-order walk over this node and all descendants.
    pub fn iter(&self) -> ModelIter<'_> {
        ModelIter { stack: vec![self] }
    }

    /// First node (pre-order) with the given name.
    pub fn find(&self, name: &str) -> Option<&Model> {
        self.iter().find(|model| model.name == name)
    }

    pub fn mesh_count(&self) -> usize {
        self.iter().map(|model| model.meshes.len()).sum()
    }

    pub fn meshes(&self) -> impl Iterator<Item = &Mesh> {
        self.iter().flat_map(|model| model.meshes.iter())
    }

    /// Every texture path referenced below this node, in traversal order.
    ///
    /// Own meshes come before children; within a mesh, materials and their
    /// slots keep their order. Paths repeat when several materials share a
    /// texture; use [`unique_texture_paths`](Self::unique_texture_paths) for
    /// batch loading.
    pub fn texture_paths(&self) -> Vec<String> {
        self.meshes()
            .flat_map(|mesh| mesh.texture_paths())
            .map(str::to_string)
            .collect()
    }

    /// [`texture_paths`](Self::texture_paths) without repeats, first
    /// occurrence kept.
    pub fn unique_texture_paths(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.texture_paths()
            .into_iter()
            .filter(|path| seen.insert(path.clone()))
            .collect()
    }
}

pub struct ModelIter<'a> {
    stack: Vec<&'a Model>,
}

impl<'a> Iterator for ModelIter<'a> {
    type Item = &'a Model;

    fn next(&mut self) -> Option<Self::Item> {
        let model = self.stack.pop()?;
        self.stack.extend(model.children.iter().rev());
        Some(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::model::{Material, TextureMap};

    fn textured_mesh(name: &str, paths: &[&str]) -> Mesh {
        Mesh {
            name: name.to_string(),
            materials: vec![Material {
                textures: paths
                    .iter()
                    .map(|path| TextureMap {
                        path: path.to_string(),
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn scene() -> Model {
        let mut root = Model::new("root");
        root.add_mesh(textured_mesh("root_mesh", &["sky.tga"]));
        let mut a = Model::with_mesh("a", textured_mesh("a_mesh", &["wood.tga", "", "wood_n.tga"]));
        a.add_child(Model::with_mesh("a1", textured_mesh("a1_mesh", &["wood.tga"])));
        root.add_child(a);
        root.add_child(Model::with_mesh("b", textured_mesh("b_mesh", &["stone.tga"])));
        root
    }

    #[test]
    fn iter_is_pre_order() {
        let root = scene();
        let names: Vec<_> = root.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["root", "a", "a1", "b"]);
    }

    #[test]
    fn texture_paths_walk_the_whole_tree() {
        let root = scene();
        assert_eq!(
            root.texture_paths(),
            vec!["sky.tga", "wood.tga", "wood_n.tga", "wood.tga", "stone.tga"]
        );
        assert_eq!(
            root.unique_texture_paths(),
            vec!["sky.tga", "wood.tga", "wood_n.tga", "stone.tga"]
        );
    }

    #[test]
    fn find_and_count() {
        let root = scene();
        assert_eq!(root.mesh_count(), 4);
        assert_eq!(root.find("a1").map(|m| m.meshes[0].name.as_str()), Some("a1_mesh"));
        assert!(root.find("missing").is_none());
    }

    #[test]
    fn take_children_detaches_subtrees() {
        let mut root = scene();
        let children = root.take_children();
        assert_eq!(children.len(), 2);
        assert!(root.children.is_empty());
        assert_eq!(root.mesh_count(), 1);
        assert_eq!(root.take_meshes().len(), 1);
        assert_eq!(root.mesh_count(), 0);
    }
}

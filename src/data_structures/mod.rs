//! Scene data structures: meshes, materials, the scene graph and GPU textures.
//!
//! - `model` contains mesh and material definitions as produced by the loader
//! - `scene_graph` holds the [`Model`](scene_graph::Model) tree returned for a scene
//! - `texture` contains the GPU texture wrapper and creation utilities

pub mod model;
pub mod scene_graph;
pub mod texture;

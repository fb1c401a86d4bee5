//! ase-scene
//!
//! Loads ASCII Scene Export (ASE) files, as written by 3D authoring tools,
//! into an owned tree of renderable meshes. Per-vertex normals, tangents and
//! binormals are rebuilt from the faces so the result is ready for normal
//! mapping, and meshes can be uploaded to the GPU with 16-bit indices.
//!
//! High-level modules
//! - `config`: loader knobs ([`LoaderConfig`])
//! - `data_structures`: meshes, materials, the scene graph and GPU textures
//! - `error`: the [`AseError`] type returned by every loading operation
//! - `resources`: chunk scanning, parsing and scene assembly, texture loading
//! - `render`: vertex interleaving and GPU buffer upload
//!
//! ```no_run
//! let scene = ase_scene::load_scene("assets/crate.ase")?;
//! for model in scene.iter() {
//!     println!("{}: {} mesh(es)", model.name, model.meshes.len());
//! }
//! # Ok::<(), ase_scene::AseError>(())
//! ```

pub mod config;
pub mod data_structures;
pub mod error;
pub mod render;
pub mod resources;

pub use config::{DegenerateUvPolicy, LoaderConfig, ObjectErrorPolicy, UvwDefaults, VertexSharing};
pub use data_structures::{
    model::{Color, Material, Mesh, TextureMap, UvLayer},
    scene_graph::Model,
};
pub use error::{AseError, ErrorKind, Result};
pub use resources::{load_scene, load_scene_from_str, load_scene_with};

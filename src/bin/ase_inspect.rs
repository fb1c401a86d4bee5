use std::path::PathBuf;

use anyhow::Context;
use ase_scene::{
    resources::texture::load_textures, DegenerateUvPolicy, LoaderConfig, Model,
    ObjectErrorPolicy, VertexSharing,
};
use clap::Parser;

#[derive(Parser)]
#[command(name = "ase-inspect")]
#[command(version)]
#[command(about = "Print the scene tree of an ASE file")]
#[command(long_about = "
ase-inspect loads an ASCII Scene Export file and prints its objects with
vertex, triangle and material information.

Example usage:
  ase-inspect level.ase --by-position
  RUST_LOG=debug ase-inspect crate.ase --textures --texture-dir textures/
")]
struct Cli {
    /// Scene file to load
    file: PathBuf,

    /// Average normals and tangents over vertices sharing a position
    #[arg(long)]
    by_position: bool,

    /// Skip objects that fail to load instead of aborting
    #[arg(long)]
    skip_bad_objects: bool,

    /// Fail on faces with degenerate texture coordinates
    #[arg(long)]
    fail_on_degenerate_uv: bool,

    /// List referenced textures and try to decode them
    #[arg(long)]
    textures: bool,

    /// Directory searched for textures (defaults to the scene's directory)
    #[arg(long, value_name = "DIR")]
    texture_dir: Option<PathBuf>,
}

impl Cli {
    fn config(&self) -> LoaderConfig {
        let mut config = LoaderConfig::default();
        if self.by_position {
            config = config.with_vertex_sharing(VertexSharing::ByPosition);
        }
        if self.skip_bad_objects {
            config = config.with_object_errors(ObjectErrorPolicy::Skip);
        }
        if self.fail_on_degenerate_uv {
            config = config.with_degenerate_uv(DegenerateUvPolicy::Fail);
        }
        config
    }
}

fn print_model(model: &Model, depth: usize) {
    let indent = "  ".repeat(depth);
    println!("{indent}{}", model.name);
    for mesh in &model.meshes {
        let material = mesh
            .materials
            .first()
            .map_or("<none>", |material| material.name.as_str());
        println!(
            "{indent}  mesh {}: {} vertices, {} triangles, material {material}",
            mesh.name,
            mesh.vertex_count,
            mesh.triangle_count()
        );
    }
    for child in &model.children {
        print_model(child, depth + 1);
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let scene = ase_scene::load_scene_with(&cli.file, &cli.config())
        .with_context(|| format!("failed to load {}", cli.file.display()))?;
    print_model(&scene, 0);

    if cli.textures {
        let base_dir = match &cli.texture_dir {
            Some(dir) => dir.clone(),
            None => cli
                .file
                .parent()
                .map(PathBuf::from)
                .unwrap_or_default(),
        };
        let textures = load_textures(&scene, &base_dir);
        for path in scene.unique_texture_paths() {
            match textures.get(&path) {
                Some(image) => println!("texture {path}: {}x{}", image.width(), image.height()),
                None => println!("texture {path}: missing"),
            }
        }
    }
    Ok(())
}

use std::path::PathBuf;

use ase_scene::{LoaderConfig, Mesh, Model};

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn fixture_text(name: &str) -> String {
    std::fs::read_to_string(fixture(name)).expect("fixture is readable")
}

/// Load scene text and return the single mesh of its first object.
pub fn first_mesh(text: &str, config: &LoaderConfig) -> Mesh {
    let mut scene: Model = ase_scene::load_scene_from_str(text, config).expect("scene loads");
    let mut object = scene.take_children().into_iter().next().expect("one object");
    object.take_meshes().into_iter().next().expect("one mesh")
}

pub fn assert_close(actual: [f32; 3], expected: [f32; 3]) {
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-6, "expected {expected:?}, got {actual:?}");
    }
}

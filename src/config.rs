//! Loader configuration.
//!
//! [`LoaderConfig`] gathers the knobs that change how a scene is parsed and how
//! the tangent space is rebuilt. `LoaderConfig::default()` reproduces the
//! behaviour of the exporter-side tooling the format comes from, except where
//! that behaviour was unsafe (unchecked indices, unguarded divisions).

/// What to do with a face whose texture coordinates span no area.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DegenerateUvPolicy {
    /// The face keeps no tangent basis and does not contribute to the
    /// per-vertex tangent/binormal average.
    #[default]
    Skip,
    /// Loading the object fails with `ErrorKind::DegenerateUv`.
    Fail,
}

/// Which faces count as incident to a vertex when averaging normals,
/// tangents and binormals.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum VertexSharing {
    /// Faces that reference the vertex index.
    #[default]
    ByIndex,
    /// Faces that reference any vertex with exactly the same position.
    /// Exporters split vertices along UV seams; this smooths across them.
    ByPosition,
}

/// What the scene assembler does when one `*GEOMOBJECT` fails to parse.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ObjectErrorPolicy {
    #[default]
    Abort,
    /// Log the error and continue with the next object.
    Skip,
}

/// Texture-map transform used for absent maps and absent `*UVW_*` fields.
///
/// The scales default to `0.0`, which collapses any UV transform built from
/// them. Existing content relies on that value being passed through
/// untouched, so it is kept as the default and can be overridden here.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UvwDefaults {
    pub u_offset: f32,
    pub v_offset: f32,
    pub u_scale: f32,
    pub v_scale: f32,
    pub angle: f32,
}

impl Default for UvwDefaults {
    fn default() -> Self {
        Self {
            u_offset: 0.0,
            v_offset: 0.0,
            u_scale: 0.0,
            v_scale: 0.0,
            angle: 0.0,
        }
    }
}

impl UvwDefaults {
    /// Identity transform: no offset, unit tiling, no rotation.
    pub fn identity() -> Self {
        Self {
            u_scale: 1.0,
            v_scale: 1.0,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoaderConfig {
    pub uvw_defaults: UvwDefaults,
    pub degenerate_uv: DegenerateUvPolicy,
    /// Faces with `|Δu1·Δv2 − Δu2·Δv1|` at or below this value are degenerate.
    pub uv_epsilon: f32,
    pub vertex_sharing: VertexSharing,
    pub on_object_error: ObjectErrorPolicy,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            uvw_defaults: UvwDefaults::default(),
            degenerate_uv: DegenerateUvPolicy::default(),
            uv_epsilon: 1e-12,
            vertex_sharing: VertexSharing::default(),
            on_object_error: ObjectErrorPolicy::default(),
        }
    }
}

impl LoaderConfig {
    pub fn with_uvw_defaults(mut self, defaults: UvwDefaults) -> Self {
        self.uvw_defaults = defaults;
        self
    }

    pub fn with_degenerate_uv(mut self, policy: DegenerateUvPolicy) -> Self {
        self.degenerate_uv = policy;
        self
    }

    pub fn with_uv_epsilon(mut self, epsilon: f32) -> Self {
        self.uv_epsilon = epsilon;
        self
    }

    pub fn with_vertex_sharing(mut self, sharing: VertexSharing) -> Self {
        self.vertex_sharing = sharing;
        self
    }

    pub fn with_object_errors(mut self, policy: ObjectErrorPolicy) -> Self {
        self.on_object_error = policy;
        self
    }
}

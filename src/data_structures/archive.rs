//! Parsed contents of a model archive (`.pba`).
//!
//! An [`Archive`] is immutable once parsed and is shared read-only (behind an
//! `Arc`) by every batch composed from it.

use crate::data_structures::name::ResourceName;

/// Format version of the legacy variant, which carries no alternate-texture lists.
pub const LEGACY_FORMAT: u32 = 1;

#[derive(Clone, Debug, PartialEq)]
pub struct Archive {
    pub format: u32,
    pub name: String,
    pub transforms: Vec<Transform>,
    /// Index-addressable texture table as stored on disk.
    pub textures: Vec<String>,
    pub meshes: Vec<Mesh>,
}

impl Archive {
    pub fn is_legacy(&self) -> bool {
        self.format == LEGACY_FORMAT
    }

    /// Distinct normalized texture names referenced by the texture table.
    pub fn texture_names(&self) -> impl Iterator<Item = ResourceName> + '_ {
        self.textures.iter().map(ResourceName::from)
    }

    /// Resolves a surface texture index against the table.
    ///
    /// Negative or out-of-range indices fall back to the first entry. `None`
    /// only when the table is empty.
    pub fn texture_for(&self, texture_id: i32) -> Option<ResourceName> {
        usize::try_from(texture_id)
            .ok()
            .and_then(|idx| self.textures.get(idx))
            .or_else(|| self.textures.first())
            .map(ResourceName::from)
    }

    /// The transform carrying the mesh-local static placement, matched by exact name.
    pub fn transform_for(&self, mesh_name: &str) -> Option<&Transform> {
        self.transforms.iter().find(|t| t.name == mesh_name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    pub name: String,
    pub parent: i32,
    /// Quaternion in on-disk order: w, x, y, z.
    pub rotation: [f32; 4],
    pub translation: [f32; 3],
}

impl Transform {
    /// Roots carry a negative parent index.
    pub fn is_root(&self) -> bool {
        self.parent < 0
    }

    pub fn quaternion(&self) -> cgmath::Quaternion<f32> {
        let [w, x, y, z] = self.rotation;
        cgmath::Quaternion::new(w, x, y, z)
    }
}

/// On-disk mesh type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshKind {
    Rigid,
    Flexible,
    Animated,
    Nodes,
    Undefined,
}

impl From<u32> for MeshKind {
    fn from(tag: u32) -> Self {
        match tag {
            1 => MeshKind::Rigid,
            2 => MeshKind::Flexible,
            3 => MeshKind::Animated,
            4 => MeshKind::Nodes,
            _ => MeshKind::Undefined,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    pub kind: MeshKind,
    pub name: String,
    /// Bounding sphere: center x, y, z and radius. Passed through unvalidated.
    pub sphere: [f32; 4],
    pub geometry: Geometry,
}

/// Mesh geometry, shaped by the mesh type.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// One vertex buffer per surface, same order and length as `surfaces`.
    Rigid {
        surfaces: Vec<Surface>,
        vertices: Vec<VertexBuffer>,
    },
    /// One buffer shared by all surfaces.
    Animated {
        vertices: VertexBuffer,
        surfaces: Vec<Surface>,
    },
    /// Skipped by the parser; the mesh frame was consumed opaquely.
    Unknown,
}

impl Geometry {
    pub fn surfaces(&self) -> &[Surface] {
        match self {
            Geometry::Rigid { surfaces, .. } | Geometry::Animated { surfaces, .. } => surfaces,
            Geometry::Unknown => &[],
        }
    }

    /// Vertex buffer backing the surface at `idx`.
    pub fn vertices_for(&self, idx: usize) -> Option<&VertexBuffer> {
        match self {
            Geometry::Rigid { vertices, .. } => vertices.get(idx),
            Geometry::Animated { vertices, surfaces } => (idx < surfaces.len()).then_some(vertices),
            Geometry::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Geometry::Unknown)
    }
}

/// Blend class of a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialFlags {
    None,
    Alpha,
    AlphaTest,
    Shadow,
    /// Any value the format does not define; drawn as opaque.
    Other(u32),
}

impl From<u32> for MaterialFlags {
    fn from(raw: u32) -> Self {
        match raw {
            0 => MaterialFlags::None,
            1 => MaterialFlags::Alpha,
            2 => MaterialFlags::AlphaTest,
            3 => MaterialFlags::Shadow,
            other => MaterialFlags::Other(other),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Surface {
    /// Index into the archive texture table. Invalid values fall back to entry 0.
    pub texture_id: i32,
    pub material: MaterialFlags,
    /// Sub-range of the shared buffer used by an animated surface.
    pub num_vertices: Option<u32>,
    pub indices: Vec<u16>,
    /// Parsed but not consumed downstream. Always empty in legacy archives.
    pub alternate_textures: Vec<String>,
}

/// Parallel vertex attribute arrays, all describing `num_vertices` vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexBuffer {
    pub num_vertices: u32,
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    /// RGBA, 0-255 per channel, not normalized.
    pub colors: Vec<u8>,
    pub uv: Vec<f32>,
}

impl VertexBuffer {
    pub fn with_capacity(num_vertices: u32) -> Self {
        let n = num_vertices as usize;
        Self {
            num_vertices,
            positions: Vec::with_capacity(n * 3),
            normals: Vec::with_capacity(n * 3),
            colors: Vec::with_capacity(n * 4),
            uv: Vec::with_capacity(n * 2),
        }
    }

    pub fn len(&self) -> usize {
        self.num_vertices as usize
    }

    pub fn is_empty(&self) -> bool {
        self.num_vertices == 0
    }

    /// Checks that all four arrays agree with `num_vertices`.
    pub fn is_consistent(&self) -> bool {
        let n = self.len();
        self.positions.len() == n * 3
            && self.normals.len() == n * 3
            && self.colors.len() == n * 4
            && self.uv.len() == n * 2
    }
}

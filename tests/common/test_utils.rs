use std::{
    cell::RefCell,
    collections::HashMap,
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
};

use flow_nature::{
    AssetConfig, LoadContext, ResourceName,
    resources::{fetch::Fetch, texture::TextureDecoder},
};
use futures::future::{FutureExt, LocalBoxFuture};

pub const RIGID: u32 = 1;
pub const FLEXIBLE: u32 = 2;
pub const ANIMATED: u32 = 3;

pub const NONE: u32 = 0;
pub const ALPHA: u32 = 1;
pub const ALPHA_TEST: u32 = 2;
pub const SHADOW: u32 = 3;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_f32(out: &mut Vec<u8>, v: f32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_string(out: &mut Vec<u8>, s: &str) {
    put_u32(out, s.len() as u32);
    out.extend_from_slice(s.as_bytes());
}

fn put_frame(out: &mut Vec<u8>, body: &[u8]) {
    put_u32(out, body.len() as u32);
    out.extend_from_slice(body);
}

/// Surface description for generated meshes.
#[derive(Clone, Debug)]
pub struct SurfaceSpec {
    pub texture_id: i32,
    pub material: u32,
    pub indices: Vec<u16>,
    pub alternates: Vec<String>,
    pub vertices: u32,
}

impl SurfaceSpec {
    pub fn new(texture_id: i32, material: u32) -> Self {
        Self {
            texture_id,
            material,
            indices: vec![0, 1, 2],
            alternates: Vec::new(),
            vertices: 3,
        }
    }

    pub fn alternates(mut self, names: &[&str]) -> Self {
        self.alternates = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn vertices(mut self, count: u32) -> Self {
        self.vertices = count;
        self
    }
}

/// Writes a vertex buffer whose vertex `i` sits at `(i, 0, 0)`.
fn put_vertices(out: &mut Vec<u8>, count: u32) {
    put_u32(out, count);
    for i in 0..count {
        for v in [i as f32, 0.0, 0.0, 0.0, 1.0, 0.0] {
            put_f32(out, v);
        }
        out.extend_from_slice(&[255, 128, 64, 32]);
        put_f32(out, 0.25);
        put_f32(out, 0.75);
    }
}

/// Builds model archives byte by byte.
pub struct ArchiveWriter {
    format: u32,
    name: String,
    transforms: Vec<u8>,
    num_transforms: u32,
    textures: Vec<String>,
    meshes: Vec<Vec<u8>>,
}

impl ArchiveWriter {
    pub fn new(format: u32, name: &str) -> Self {
        Self {
            format,
            name: name.to_string(),
            transforms: Vec::new(),
            num_transforms: 0,
            textures: Vec::new(),
            meshes: Vec::new(),
        }
    }

    pub fn transform(
        mut self,
        name: &str,
        parent: i32,
        rotation: [f32; 4],
        translation: [f32; 3],
    ) -> Self {
        put_string(&mut self.transforms, name);
        self.transforms.extend_from_slice(&parent.to_le_bytes());
        rotation.into_iter().for_each(|v| put_f32(&mut self.transforms, v));
        translation.into_iter().for_each(|v| put_f32(&mut self.transforms, v));
        self.num_transforms += 1;
        self
    }

    pub fn texture(mut self, name: &str) -> Self {
        self.textures.push(name.to_string());
        self
    }

    fn mesh_header(kind: u32, name: &str) -> Vec<u8> {
        let mut mesh = Vec::new();
        put_u32(&mut mesh, kind);
        put_string(&mut mesh, name);
        for v in [0.0, 1.0, 0.0, 2.5] {
            put_f32(&mut mesh, v);
        }
        mesh
    }

    fn put_surface(&self, mesh: &mut Vec<u8>, surface: &SurfaceSpec, animated: bool) {
        mesh.extend_from_slice(&surface.texture_id.to_le_bytes());
        put_u32(mesh, surface.material);
        if animated {
            put_u32(mesh, surface.vertices);
        }
        put_u32(mesh, surface.indices.len() as u32);
        for idx in &surface.indices {
            mesh.extend_from_slice(&idx.to_le_bytes());
        }
        if self.format != 1 {
            put_u32(mesh, surface.alternates.len() as u32);
            for alt in &surface.alternates {
                put_string(mesh, alt);
            }
        }
    }

    pub fn rigid_mesh(self, name: &str, surfaces: &[SurfaceSpec]) -> Self {
        self.rigid_mesh_with_trailer(name, surfaces, &[])
    }

    /// Rigid mesh followed by bytes a newer writer might have appended.
    pub fn rigid_mesh_with_trailer(
        mut self,
        name: &str,
        surfaces: &[SurfaceSpec],
        trailer: &[u8],
    ) -> Self {
        let mut mesh = Self::mesh_header(RIGID, name);
        put_u32(&mut mesh, surfaces.len() as u32);
        for surface in surfaces {
            self.put_surface(&mut mesh, surface, false);
        }
        for surface in surfaces {
            put_vertices(&mut mesh, surface.vertices);
        }
        mesh.extend_from_slice(trailer);
        self.meshes.push(mesh);
        self
    }

    pub fn animated_mesh(
        mut self,
        name: &str,
        shared_vertices: u32,
        surfaces: &[SurfaceSpec],
    ) -> Self {
        let mut mesh = Self::mesh_header(ANIMATED, name);
        put_vertices(&mut mesh, shared_vertices);
        put_u32(&mut mesh, surfaces.len() as u32);
        for surface in surfaces {
            self.put_surface(&mut mesh, surface, true);
        }
        self.meshes.push(mesh);
        self
    }

    /// A mesh of any type with an opaque payload.
    pub fn opaque_mesh(mut self, kind: u32, name: &str, payload: &[u8]) -> Self {
        let mut mesh = Self::mesh_header(kind, name);
        mesh.extend_from_slice(payload);
        self.meshes.push(mesh);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut list = Vec::new();
        put_u32(&mut list, self.meshes.len() as u32);
        for mesh in &self.meshes {
            put_frame(&mut list, mesh);
        }

        let mut scene = Vec::new();
        put_u32(&mut scene, self.num_transforms);
        scene.extend_from_slice(&self.transforms);
        put_u32(&mut scene, self.textures.len() as u32);
        for texture in &self.textures {
            put_string(&mut scene, texture);
        }
        put_frame(&mut scene, &list);

        let mut body = Vec::new();
        put_string(&mut body, &self.name);
        put_frame(&mut body, &scene);

        let mut out = Vec::new();
        put_u32(&mut out, self.format);
        put_frame(&mut out, &body);
        out
    }
}

struct YieldNow(bool);

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// In-memory asset store that counts how often each key is fetched.
#[derive(Default)]
pub struct MemoryFetch {
    files: HashMap<String, Vec<u8>>,
    calls: RefCell<HashMap<String, usize>>,
    in_flight: RefCell<usize>,
    peak: RefCell<usize>,
}

impl MemoryFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(key.to_string(), bytes);
        self
    }

    pub fn calls(&self, key: &str) -> usize {
        self.calls.borrow().get(key).copied().unwrap_or(0)
    }

    /// Largest number of fetches that were pending at the same time.
    pub fn peak_in_flight(&self) -> usize {
        *self.peak.borrow()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.borrow().values().sum()
    }
}

impl Fetch for MemoryFetch {
    fn fetch<'a>(&'a self, key: &'a str) -> LocalBoxFuture<'a, anyhow::Result<Vec<u8>>> {
        async move {
            *self.calls.borrow_mut().entry(key.to_string()).or_default() += 1;
            {
                let mut in_flight = self.in_flight.borrow_mut();
                *in_flight += 1;
                let mut peak = self.peak.borrow_mut();
                *peak = (*peak).max(*in_flight);
            }
            // let sibling fetches make progress before this one settles
            YieldNow(false).await;
            *self.in_flight.borrow_mut() -= 1;
            self.files
                .get(key)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no such asset: {key}"))
        }
        .boxed_local()
    }
}

/// Texture handle of the stub decoder: the decoded bytes as text.
#[derive(Debug, PartialEq)]
pub struct StubTexture {
    pub name: String,
    pub payload: String,
}

#[derive(Default)]
pub struct StubDecoder;

impl TextureDecoder for StubDecoder {
    type Texture = StubTexture;

    fn decode(&self, name: &ResourceName, bytes: &[u8]) -> anyhow::Result<StubTexture> {
        let payload = std::str::from_utf8(bytes)?.to_string();
        if payload.is_empty() {
            anyhow::bail!("empty texture");
        }
        Ok(StubTexture {
            name: name.to_string(),
            payload,
        })
    }
}

pub fn context(fetch: &Rc<MemoryFetch>) -> LoadContext<StubDecoder> {
    init_logger();
    let fetch: Rc<dyn Fetch> = fetch.clone();
    LoadContext::new(AssetConfig::default(), fetch, StubDecoder)
}

/// The archive of the tree scenario: one rigid mesh with an opaque and an alpha-tested surface.
pub fn tree_archive() -> Vec<u8> {
    ArchiveWriter::new(2, "Tree")
        .transform("Tree", -1, [1.0, 0.0, 0.0, 0.0], [0.0, 0.0, 0.0])
        .texture("bark")
        .texture("leaf")
        .rigid_mesh(
            "Tree",
            &[SurfaceSpec::new(0, NONE), SurfaceSpec::new(1, ALPHA_TEST).vertices(4)],
        )
        .build()
}

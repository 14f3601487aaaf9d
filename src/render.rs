//! Instanced batch composition.
//!
//! This module turns parsed archives plus placement records into
//! [`InstanceBatch`]es sorted into the four material buckets a renderer
//! draws in a fixed order. It runs synchronously over already resolved
//! resources and never touches the GPU itself.
//!
//! # Key types
//!
//! - [`MaterialBucket`] is the depth/blend class of a batch and its draw order
//! - [`InstanceBatch<T>`] is one draw call: shared surface geometry, one texture,
//!   one world matrix per placement
//! - [`NatureScene<T>`] holds the composed buckets of a scene
//! - [`WaterBatch<T>`] is one water geometry ready to draw
//!

use std::{collections::BTreeMap, sync::Arc};

use log::{trace, warn};

use crate::{
    context::TimeUniform,
    data_structures::{
        archive::{Archive, Geometry, MaterialFlags, Surface, VertexBuffer},
        instance::{Instance, InstanceRaw, PlacementRecord},
        model::NatureVertex,
        name::ResourceName,
        water::WaterSurface,
    },
    pipelines::nature::{DrawState, NatureUniform, WaterUniform, water_draw_state},
    resources::LoadError,
};

/// Material class of a batch. Declaration order is draw order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MaterialBucket {
    Shadow,
    Opaque,
    AlphaTest,
    Alpha,
}

impl MaterialBucket {
    pub const DRAW_ORDER: [MaterialBucket; 4] = [
        MaterialBucket::Shadow,
        MaterialBucket::Opaque,
        MaterialBucket::AlphaTest,
        MaterialBucket::Alpha,
    ];
}

impl From<MaterialFlags> for MaterialBucket {
    fn from(flags: MaterialFlags) -> Self {
        match flags {
            MaterialFlags::AlphaTest => MaterialBucket::AlphaTest,
            MaterialFlags::Alpha => MaterialBucket::Alpha,
            MaterialFlags::Shadow => MaterialBucket::Shadow,
            MaterialFlags::None | MaterialFlags::Other(_) => MaterialBucket::Opaque,
        }
    }
}

/// One draw call covering every placement of a model for one of its surfaces.
///
/// Geometry is borrowed from the shared archive, never copied; only the
/// instance matrices are per batch.
#[derive(Debug, Clone)]
pub struct InstanceBatch<T> {
    pub bucket: MaterialBucket,
    pub model: ResourceName,
    pub mesh_name: String,
    pub texture_name: ResourceName,
    pub texture: Arc<T>,
    /// World matrices, back to front along the depth axis.
    pub instances: Vec<cgmath::Matrix4<f32>>,
    pub time: TimeUniform,
    archive: Arc<Archive>,
    mesh: usize,
    surface: usize,
}

impl<T> InstanceBatch<T> {
    pub fn archive(&self) -> &Arc<Archive> {
        &self.archive
    }

    fn geometry(&self) -> &Geometry {
        &self.archive.meshes[self.mesh].geometry
    }

    pub fn surface_index(&self) -> usize {
        self.surface
    }

    pub fn surface(&self) -> &Surface {
        &self.geometry().surfaces()[self.surface]
    }

    /// Vertex data of the surface; animated meshes share one buffer across surfaces.
    pub fn vertex_buffer(&self) -> &VertexBuffer {
        match self.geometry() {
            Geometry::Rigid { vertices, .. } => &vertices[self.surface],
            Geometry::Animated { vertices, .. } => vertices,
            Geometry::Unknown => unreachable!("batches are only built for decodable geometry"),
        }
    }

    pub fn indices(&self) -> &[u16] {
        &self.surface().indices
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Interleaved vertices ready for a vertex buffer upload.
    pub fn vertices(&self) -> Vec<NatureVertex> {
        NatureVertex::interleave(self.vertex_buffer())
    }

    /// Instance rows ready for an instance buffer upload.
    pub fn to_raw(&self) -> Vec<InstanceRaw> {
        self.instances
            .iter()
            .copied()
            .map(InstanceRaw::from_matrix)
            .collect()
    }

    pub fn draw_state(&self) -> DrawState {
        DrawState::for_bucket(self.bucket)
    }

    pub fn uniform(&self) -> NatureUniform {
        NatureUniform::new(self.time.get())
    }
}

/// Composed nature batches, grouped by bucket.
#[derive(Debug, Clone)]
pub struct NatureScene<T> {
    pub shadow: Vec<InstanceBatch<T>>,
    pub opaque: Vec<InstanceBatch<T>>,
    pub alpha_test: Vec<InstanceBatch<T>>,
    pub alpha: Vec<InstanceBatch<T>>,
    pub time: TimeUniform,
}

impl<T> NatureScene<T> {
    pub fn new(time: TimeUniform) -> Self {
        Self {
            shadow: Vec::new(),
            opaque: Vec::new(),
            alpha_test: Vec::new(),
            alpha: Vec::new(),
            time,
        }
    }

    fn bucket_mut(&mut self, bucket: MaterialBucket) -> &mut Vec<InstanceBatch<T>> {
        match bucket {
            MaterialBucket::Shadow => &mut self.shadow,
            MaterialBucket::Opaque => &mut self.opaque,
            MaterialBucket::AlphaTest => &mut self.alpha_test,
            MaterialBucket::Alpha => &mut self.alpha,
        }
    }

    pub fn bucket(&self, bucket: MaterialBucket) -> &[InstanceBatch<T>] {
        match bucket {
            MaterialBucket::Shadow => &self.shadow,
            MaterialBucket::Opaque => &self.opaque,
            MaterialBucket::AlphaTest => &self.alpha_test,
            MaterialBucket::Alpha => &self.alpha,
        }
    }

    pub fn push(&mut self, batch: InstanceBatch<T>) {
        self.bucket_mut(batch.bucket).push(batch);
    }

    /// Buckets in the order they must be drawn.
    pub fn buckets(&self) -> impl Iterator<Item = (MaterialBucket, &[InstanceBatch<T>])> {
        MaterialBucket::DRAW_ORDER
            .into_iter()
            .map(move |bucket| (bucket, self.bucket(bucket)))
    }

    /// Every batch in draw order.
    pub fn iter(&self) -> impl Iterator<Item = &InstanceBatch<T>> {
        self.buckets().flat_map(|(_, batches)| batches.iter())
    }

    pub fn batch_count(&self) -> usize {
        self.shadow.len() + self.opaque.len() + self.alpha_test.len() + self.alpha.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch_count() == 0
    }
}

/// Groups placement records by normalized model name, keeping input order per model.
pub fn group_placements(
    placements: &[PlacementRecord],
) -> BTreeMap<ResourceName, Vec<PlacementRecord>> {
    let mut groups: BTreeMap<ResourceName, Vec<PlacementRecord>> = BTreeMap::new();
    for record in placements {
        groups.entry(record.model()).or_default().push(record.clone());
    }
    groups
}

/// Sorts placements back to front: descending depth, stable on ties.
pub fn sort_back_to_front(records: &mut [PlacementRecord]) {
    records.sort_by(|a, b| b.depth().total_cmp(&a.depth()));
}

/// Composes every resolved model into instanced batches.
///
/// Models are visited in name order and surfaces in declaration order. Only
/// the first mesh of an archive is instanced. A transform named like that mesh
/// is applied in mesh-local space before each placement.
///
/// Every texture the drawn surfaces bind must already be in `textures`; a
/// missing one fails the whole composition instead of dropping the surface.
pub fn compose<T>(
    archives: &BTreeMap<ResourceName, Arc<Archive>>,
    textures: &BTreeMap<ResourceName, Arc<T>>,
    placements: &BTreeMap<ResourceName, Vec<PlacementRecord>>,
    time: &TimeUniform,
) -> Result<NatureScene<T>, LoadError> {
    let mut scene = NatureScene::new(time.clone());

    for (model, archive) in archives {
        let Some(records) = placements.get(model) else {
            continue;
        };
        let Some(mesh) = archive.meshes.first() else {
            warn!("Model {model} has no meshes, nothing to draw");
            continue;
        };
        if mesh.geometry.is_unknown() {
            warn!(
                "Model {model}: first mesh {:?} ({:?}) has no drawable geometry",
                mesh.name, mesh.kind
            );
            continue;
        }

        let local = archive
            .transform_for(&mesh.name)
            .map(Instance::from)
            .unwrap_or_default();

        let mut records = records.clone();
        sort_back_to_front(&mut records);
        let instances: Vec<_> = records
            .iter()
            .map(|record| (&Instance::from(record) * &local).to_matrix())
            .collect();

        for (idx, surface) in mesh.geometry.surfaces().iter().enumerate() {
            if mesh.geometry.vertices_for(idx).is_none() {
                warn!("Model {model}: surface {idx} has no vertex buffer");
                continue;
            }
            let Some(texture_name) = archive.texture_for(surface.texture_id) else {
                warn!("Model {model} has an empty texture table, skipping surface {idx}");
                continue;
            };
            let Some(texture) = textures.get(&texture_name) else {
                return Err(LoadError::UnresolvedTexture {
                    model: model.clone(),
                    texture: texture_name,
                });
            };

            let bucket = MaterialBucket::from(surface.material);
            trace!(
                "{model}/{idx}: {} instances into {bucket:?} with {texture_name}",
                instances.len()
            );
            scene.push(InstanceBatch {
                bucket,
                model: model.clone(),
                mesh_name: mesh.name.clone(),
                texture_name,
                texture: Arc::clone(texture),
                instances: instances.clone(),
                time: time.clone(),
                archive: Arc::clone(archive),
                mesh: 0,
                surface: idx,
            });
        }
    }

    Ok(scene)
}

/// One water geometry, drawn blended over the depth buffer.
#[derive(Debug, Clone)]
pub struct WaterBatch<T> {
    pub texture: Arc<T>,
    pub vertices: Vec<f32>,
    pub indices: Vec<u16>,
    pub direction: [f32; 2],
    pub time: TimeUniform,
}

impl<T> WaterBatch<T> {
    pub fn draw_state(&self) -> DrawState {
        water_draw_state()
    }

    pub fn uniform(&self) -> WaterUniform {
        WaterUniform::new(self.time.get(), self.direction)
    }
}

/// One batch per water geometry, in input order, all sharing the surface texture.
pub fn compose_water<T>(surface: &WaterSurface<T>, time: &TimeUniform) -> Vec<WaterBatch<T>> {
    surface
        .geometries
        .iter()
        .map(|geom| WaterBatch {
            texture: Arc::clone(&surface.texture),
            vertices: geom.vertices.clone(),
            indices: geom.indices.clone(),
            direction: geom.flow(),
            time: time.clone(),
        })
        .collect()
}

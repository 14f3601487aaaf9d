//! Explicit state for one scene load.
//!
//! Everything a load needs (where assets live, how they are fetched and
//! decoded, which resources are already in flight and the time value shaders
//! animate with) is bundled in [`LoadContext`] instead of living in globals.

use std::{
    path::PathBuf,
    rc::Rc,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
};

use crate::{
    data_structures::name::ResourceName,
    resources::{
        fetch::{AssetDir, Fetch},
        resolver::ResourceResolver,
        texture::TextureDecoder,
    },
};

/// Where assets live and how resource names map to asset keys.
#[derive(Clone, Debug)]
pub struct AssetConfig {
    pub root: PathBuf,
    pub model_extension: String,
    pub texture_extension: String,
}

impl AssetConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn model_key(&self, name: &ResourceName) -> String {
        format!("{}.{}", name, self.model_extension)
    }

    pub fn texture_key(&self, name: &ResourceName) -> String {
        format!("{}.{}", name, self.texture_extension)
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: std::path::Path::new("./").join("assets"),
            model_extension: "pba".to_string(),
            texture_extension: "ptx".to_string(),
        }
    }
}

/// Shared animation time, read by every batch of a scene.
///
/// Cloning shares the value; the renderer bumps it once per frame.
#[derive(Clone, Debug, Default)]
pub struct TimeUniform(Arc<AtomicU32>);

impl TimeUniform {
    pub fn new(seconds: f32) -> Self {
        Self(Arc::new(AtomicU32::new(seconds.to_bits())))
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, seconds: f32) {
        self.0.store(seconds.to_bits(), Ordering::Relaxed);
    }

    pub fn ptr_eq(&self, other: &TimeUniform) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// State of one scene load. Drop it (or call [`LoadContext::clear`]) to tear
/// the caches down once the scene has been composed.
pub struct LoadContext<D: TextureDecoder> {
    pub time: TimeUniform,
    pub(crate) resolver: ResourceResolver<D>,
}

impl<D> LoadContext<D>
where
    D: TextureDecoder + 'static,
    D::Texture: 'static,
{
    pub fn new(config: AssetConfig, fetch: Rc<dyn Fetch>, decoder: D) -> Self {
        Self {
            time: TimeUniform::default(),
            resolver: ResourceResolver::new(config, fetch, Rc::new(decoder)),
        }
    }

    /// Context fetching from the configured asset directory.
    pub fn from_config(config: AssetConfig, decoder: D) -> Self {
        let fetch = Rc::new(AssetDir::new(config.root.clone()));
        Self::new(config, fetch, decoder)
    }

    pub fn with_time(mut self, time: TimeUniform) -> Self {
        self.time = time;
        self
    }

    pub fn config(&self) -> &AssetConfig {
        self.resolver.config()
    }

    pub fn resolver(&self) -> &ResourceResolver<D> {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut ResourceResolver<D> {
        &mut self.resolver
    }

    pub fn clear(&mut self) {
        self.resolver.clear();
    }
}

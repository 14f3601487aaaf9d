//! De-duplicating, concurrent resolution of named resources.
//!
//! Every name is fetched and decoded at most once per cache. The first request
//! for a name stores a shared future; later requests, whether the first one is
//! still in flight or long settled, get a clone of that same future and
//! therefore the same `Arc`.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    rc::Rc,
    sync::Arc,
};

use futures::future::{FutureExt, LocalBoxFuture, Shared, join_all};
use thiserror::Error;

use crate::{
    context::AssetConfig,
    data_structures::{archive::Archive, name::ResourceName},
    resources::{cursor::ParseError, fetch::Fetch, pba::parse_archive, texture::TextureDecoder},
};

#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("failed to fetch `{key}`: {message}")]
    Fetch { key: String, message: String },
    #[error("failed to parse model archive `{name}`")]
    Parse {
        name: ResourceName,
        #[source]
        source: ParseError,
    },
    #[error("failed to decode texture `{name}`: {message}")]
    Decode { name: ResourceName, message: String },
    #[error("model `{model}` binds texture `{texture}`, which was never resolved")]
    UnresolvedTexture {
        model: ResourceName,
        texture: ResourceName,
    },
}

type Pending<T> = Shared<LocalBoxFuture<'static, Result<Arc<T>, LoadError>>>;

/// Write-once map from name to an in-flight or settled load.
pub struct ResourceCache<T> {
    entries: HashMap<ResourceName, Pending<T>>,
}

impl<T: 'static> ResourceCache<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Returns the load for `name`, starting it with `load` only if none exists yet.
    pub fn request<F>(&mut self, name: &ResourceName, load: F) -> Pending<T>
    where
        F: FnOnce() -> LocalBoxFuture<'static, Result<T, LoadError>>,
    {
        self.entries
            .entry(name.clone())
            .or_insert_with(|| load().map(|res| res.map(Arc::new)).boxed_local().shared())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: 'static> Default for ResourceCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Joins every pending load; the first failure (in name order) wins.
async fn settle<T: 'static>(
    pending: Vec<(ResourceName, Pending<T>)>,
) -> Result<BTreeMap<ResourceName, Arc<T>>, LoadError> {
    let (names, futures): (Vec<_>, Vec<_>) = pending.into_iter().unzip();
    names
        .into_iter()
        .zip(join_all(futures).await)
        .map(|(name, res)| res.map(|value| (name, value)))
        .collect()
}

/// Resolves model archives and textures for one scene load.
pub struct ResourceResolver<D: TextureDecoder> {
    config: AssetConfig,
    fetch: Rc<dyn Fetch>,
    decoder: Rc<D>,
    models: ResourceCache<Archive>,
    textures: ResourceCache<D::Texture>,
}

impl<D> ResourceResolver<D>
where
    D: TextureDecoder + 'static,
    D::Texture: 'static,
{
    pub fn new(config: AssetConfig, fetch: Rc<dyn Fetch>, decoder: Rc<D>) -> Self {
        Self {
            config,
            fetch,
            decoder,
            models: ResourceCache::new(),
            textures: ResourceCache::new(),
        }
    }

    pub fn config(&self) -> &AssetConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &Rc<dyn Fetch> {
        &self.fetch
    }

    pub fn models(&self) -> &ResourceCache<Archive> {
        &self.models
    }

    pub fn textures(&self) -> &ResourceCache<D::Texture> {
        &self.textures
    }

    /// Fetches and parses each distinct model once, all concurrently.
    pub async fn resolve_models(
        &mut self,
        names: &BTreeSet<ResourceName>,
    ) -> Result<BTreeMap<ResourceName, Arc<Archive>>, LoadError> {
        let pending = names
            .iter()
            .map(|name| {
                let key = self.config.model_key(name);
                let fetch = Rc::clone(&self.fetch);
                let owned = name.clone();
                let load = self.models.request(name, move || {
                    async move {
                        log::debug!("loading model archive {key}");
                        let bytes = fetch.fetch(&key).await.map_err(|e| LoadError::Fetch {
                            key: key.clone(),
                            message: format!("{e:#}"),
                        })?;
                        parse_archive(&bytes).map_err(|source| LoadError::Parse {
                            name: owned,
                            source,
                        })
                    }
                    .boxed_local()
                });
                (name.clone(), load)
            })
            .collect();
        settle(pending).await
    }

    /// Fetches and decodes each distinct texture once, all concurrently.
    pub async fn resolve_textures(
        &mut self,
        names: &BTreeSet<ResourceName>,
    ) -> Result<BTreeMap<ResourceName, Arc<D::Texture>>, LoadError> {
        let pending = names
            .iter()
            .map(|name| {
                let key = self.config.texture_key(name);
                let fetch = Rc::clone(&self.fetch);
                let decoder = Rc::clone(&self.decoder);
                let owned = name.clone();
                let load = self.textures.request(name, move || {
                    async move {
                        log::debug!("loading texture {key}");
                        let bytes = fetch.fetch(&key).await.map_err(|e| LoadError::Fetch {
                            key: key.clone(),
                            message: format!("{e:#}"),
                        })?;
                        decoder
                            .decode(&owned, &bytes)
                            .map_err(|e| LoadError::Decode {
                                name: owned.clone(),
                                message: format!("{e:#}"),
                            })
                    }
                    .boxed_local()
                });
                (name.clone(), load)
            })
            .collect();
        settle(pending).await
    }

    /// Drops every cached entry, ending the current scene load.
    pub fn clear(&mut self) {
        self.models.clear();
        self.textures.clear();
    }
}

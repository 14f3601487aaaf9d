use std::collections::BTreeSet;

use crate::{
    context::LoadContext,
    data_structures::{instance::PlacementRecord, name::ResourceName, water::WaterSurface},
    render::{self, NatureScene, WaterBatch},
};

/**
 * This module contains all logic for loading archives/textures/etc. from external files.
 */
pub mod cursor;
pub mod fetch;
pub mod pba;
pub mod resolver;
pub mod texture;

pub use resolver::LoadError;

/// Loads and composes every placed model of a scene.
///
/// Models are fetched concurrently, then all textures they reference, and
/// only once both sets have settled are batches built. Any fetch, parse or
/// decode failure aborts the whole load.
pub async fn load_nature<D>(
    ctx: &mut LoadContext<D>,
    placements: &[PlacementRecord],
) -> anyhow::Result<NatureScene<D::Texture>>
where
    D: texture::TextureDecoder + 'static,
    D::Texture: 'static,
{
    let groups = render::group_placements(placements);
    let model_names: BTreeSet<ResourceName> = groups.keys().cloned().collect();
    log::info!(
        "Loading {} placements of {} distinct models",
        placements.len(),
        model_names.len()
    );

    let archives = ctx.resolver.resolve_models(&model_names).await?;

    let texture_names: BTreeSet<ResourceName> = archives
        .values()
        .flat_map(|archive| archive.texture_names())
        .collect();
    let textures = ctx.resolver.resolve_textures(&texture_names).await?;

    let scene = render::compose(&archives, &textures, &groups, &ctx.time)?;
    log::info!(
        "Composed {} batches from {} models and {} textures",
        scene.batch_count(),
        archives.len(),
        textures.len()
    );
    Ok(scene)
}

/// Loads the mission's water file, if it has one, and composes its batches.
///
/// `parse` is the external water-file parser.
pub async fn load_water<D, P>(
    ctx: &LoadContext<D>,
    key: Option<&str>,
    parse: P,
) -> anyhow::Result<Vec<WaterBatch<D::Texture>>>
where
    D: texture::TextureDecoder + 'static,
    D::Texture: 'static,
    P: FnOnce(&[u8]) -> anyhow::Result<WaterSurface<D::Texture>>,
{
    let Some(key) = key else {
        return Ok(Vec::new());
    };
    let bytes = ctx.resolver.fetcher().fetch(key).await.map_err(|e| LoadError::Fetch {
        key: key.to_string(),
        message: format!("{e:#}"),
    })?;
    let surface = parse(&bytes)?;
    Ok(render::compose_water(&surface, &ctx.time))
}

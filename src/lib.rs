//! flow-nature
//!
//! Loads a mission's scenery for the flow engine: model archives (`.pba`)
//! are parsed from their framed binary layout, every placed model and every
//! texture it references is fetched exactly once, and the placements are
//! composed into instanced draw batches sorted into shadow, opaque,
//! alpha-test and alpha buckets. Rasterization stays with the renderer.
//!
//! High-level modules
//! - `context`: per-load state (asset config, fetcher, caches, shared time)
//! - `data_structures`: archives, instances, vertex layouts, textures, water input
//! - `pipelines`: depth/blend state and uniforms per bucket
//! - `resources`: byte cursor, archive parser, fetching and resolution, load entry points
//! - `render`: batch composition in draw order
//!

pub mod context;
pub mod data_structures;
pub mod pipelines;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use context::{AssetConfig, LoadContext, TimeUniform};
pub use data_structures::{archive::Archive, instance::PlacementRecord, name::ResourceName};
pub use render::{InstanceBatch, MaterialBucket, NatureScene};
pub use resources::{LoadError, load_nature, load_water};

/// Installs the platform logger: `env_logger` natively, the browser console on wasm.
pub fn init_logging() {
    #[cfg(target_arch = "wasm32")]
    {
        let _ = console_log::init_with_level(log::Level::Info);
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init();
    }
}

//! Engine data structures: archives, instances, vertex layouts and textures.
//!
//! - `archive` holds the parsed model archive (transforms, texture table, meshes)
//! - `instance` holds placement records and per-instance transformation data
//! - `model` contains GPU vertex layouts for archive geometry
//! - `name` is the single case-folding rule for resource lookups
//! - `texture` contains the decoded texture handle
//! - `water` is the input shape of externally parsed water surfaces

pub mod archive;
pub mod instance;
pub mod model;
pub mod name;
pub mod texture;
pub mod water;

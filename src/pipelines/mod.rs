//! Draw state for the nature and water buckets.

pub mod nature;

//! Output shape of the external water-surface parser.
//!
//! Water files are parsed elsewhere; this crate only composes them into
//! draw batches next to the nature batches.

use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct WaterSurface<T> {
    /// The first texture of the water file, shared by every geometry.
    pub texture: Arc<T>,
    pub geometries: Vec<WaterGeometry>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WaterGeometry {
    /// Packed vertex attributes as produced by the water parser.
    pub vertices: Vec<f32>,
    pub indices: Vec<u16>,
    /// Flow direction; only the first two components are used.
    pub direction: Vec<f32>,
}

impl WaterGeometry {
    pub fn flow(&self) -> [f32; 2] {
        [
            self.direction.first().copied().unwrap_or(0.0),
            self.direction.get(1).copied().unwrap_or(0.0),
        ]
    }
}

//! Coordinate Mapper - source (Z-up, source units) to target (Y-up, target units).

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Converts raw trajectory positions into the skeleton's convention.
///
/// The source axis order is `(x, y, z)` with Z up; the target is Y up, so the
/// second and third components swap. `scale` is source units per target unit
/// (1000 for millimetres to metres). Callers guarantee `scale != 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateMapper {
    pub scale: f64,
}

impl CoordinateMapper {
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }

    /// `(x, y, z) -> (x/scale, z/scale, y/scale)`
    pub fn map(&self, raw: Vector3<f64>) -> Vector3<f64> {
        map(raw, self.scale)
    }

    /// Inverse of [`CoordinateMapper::map`].
    pub fn unmap(&self, target: Vector3<f64>) -> Vector3<f64> {
        Vector3::new(
            target.x * self.scale,
            target.z * self.scale,
            target.y * self.scale,
        )
    }
}

/// Free-function form of the mapping.
pub fn map(raw: Vector3<f64>, scale: f64) -> Vector3<f64> {
    Vector3::new(raw.x / scale, raw.z / scale, raw.y / scale)
}

//! Input providers: per-point terrain factors from some data source.
//!
//! The simulation only ever asks a provider for the factor-annotated
//! coordinate at a position, plus a handful of scalar parameters and its
//! RNG. Two providers are included: layered OpenSimplex noise and an RGB
//! image interpreted as a terrain map.

mod image;
mod noise;

pub use self::image::ImageSettings;
pub use self::noise::{NoiseChannel, SimplexNoiseSettings};

use rand_chacha::ChaCha8Rng;

use crate::geometry::Coordinate;

/// Source of terrain data for the generator.
pub trait TerrainSettings {
    /// The factor-annotated coordinate at (x, y). A positive `max_size`
    /// clamps the position to `[-max_size, max_size]` on both axes.
    fn data(&self, x: f64, y: f64, max_size: i32) -> Coordinate;

    /// Side length of the terrain square in meters.
    fn size(&self) -> i32;

    /// Target sample count for the point distribution.
    fn lod(&self) -> i32;

    /// Seed behind [`TerrainSettings::rng`], for reproducing a run.
    fn seed(&self) -> u64;

    /// The provider-owned RNG. The generator draws from it during
    /// initialization and, rarely, to promote a lake when a landlocked map
    /// has no sea at all.
    fn rng(&mut self) -> &mut ChaCha8Rng;
}

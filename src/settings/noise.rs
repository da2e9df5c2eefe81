//! Terrain data from layered OpenSimplex noise.
//!
//! Three channels (sea, uplift, slope) are each an octave sum over the same
//! simplex source, sampled at channel-specific offsets and scales. A radial
//! continental gradient sinks the map's rim below sea level so the coastline
//! closes within the square.

use noise::{NoiseFn, OpenSimplex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::geometry::Coordinate;
use crate::util::lerp;

use super::TerrainSettings;

pub const DEFAULT_SEA_PERSISTENCE: f64 = 0.7;
pub const DEFAULT_SEA_LOW: f64 = -0.6;
pub const DEFAULT_SEA_HIGH: f64 = 1.0;
pub const DEFAULT_UPLIFT_FROM_SEA: bool = false;
pub const DEFAULT_UPLIFT_PERSISTENCE: f64 = 0.7;
pub const DEFAULT_UPLIFT_LOW: f64 = -0.8;
pub const DEFAULT_UPLIFT_HIGH: f64 = 1.0;
pub const DEFAULT_SLOPE_FROM_SEA: bool = false;
pub const DEFAULT_SLOPE_FROM_UPLIFT: bool = true;
pub const DEFAULT_SLOPE_PERSISTENCE: f64 = 0.1;
pub const DEFAULT_SLOPE_LOW: f64 = 0.0;
pub const DEFAULT_SLOPE_HIGH: f64 = 1.0;

/// Octave-sum parameters for one noise channel.
#[derive(Debug, Clone, Copy)]
pub struct NoiseChannel {
    pub persistence: f64,
    pub scale: f64,
    pub low: f64,
    pub high: f64,
    pub shift_x: f64,
    pub shift_y: f64,
}

/// Noise-backed terrain data provider.
pub struct SimplexNoiseSettings {
    size: i32,
    lod: i32,
    land_max_radius: i32,
    seed: u64,
    octaves: u32,
    rng: ChaCha8Rng,
    source: OpenSimplex,
    sea: NoiseChannel,
    uplift: NoiseChannel,
    slope: NoiseChannel,
    uplift_from_sea: bool,
    slope_from_sea: bool,
    slope_from_uplift: bool,
}

impl SimplexNoiseSettings {
    /// Default configuration: channel shifts drawn from the seeded RNG,
    /// octave count following the map size, channel scales at one, two and
    /// three wavelengths per map.
    pub fn new(size: i32, lod: i32, land_max_radius: i32, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut shift = |rng: &mut ChaCha8Rng| rng.gen_range(-size..size) as f64;

        let sea = NoiseChannel {
            persistence: DEFAULT_SEA_PERSISTENCE,
            scale: 1.0 / size as f64,
            low: DEFAULT_SEA_LOW,
            high: DEFAULT_SEA_HIGH,
            shift_x: shift(&mut rng),
            shift_y: shift(&mut rng),
        };
        let uplift = NoiseChannel {
            persistence: DEFAULT_UPLIFT_PERSISTENCE,
            scale: 2.0 / size as f64,
            low: DEFAULT_UPLIFT_LOW,
            high: DEFAULT_UPLIFT_HIGH,
            shift_x: shift(&mut rng),
            shift_y: shift(&mut rng),
        };
        let slope = NoiseChannel {
            persistence: DEFAULT_SLOPE_PERSISTENCE,
            scale: 3.0 / size as f64,
            low: DEFAULT_SLOPE_LOW,
            high: DEFAULT_SLOPE_HIGH,
            shift_x: shift(&mut rng),
            shift_y: shift(&mut rng),
        };

        Self::with_channels(
            size,
            lod,
            land_max_radius,
            seed,
            rng,
            (size as f64).log2().round() as u32,
            sea,
            uplift,
            slope,
            DEFAULT_UPLIFT_FROM_SEA,
            DEFAULT_SLOPE_FROM_SEA,
            DEFAULT_SLOPE_FROM_UPLIFT,
        )
    }

    /// Fully configured constructor; every recognized option explicit.
    #[allow(clippy::too_many_arguments)]
    pub fn with_channels(
        size: i32,
        lod: i32,
        land_max_radius: i32,
        seed: u64,
        rng: ChaCha8Rng,
        octaves: u32,
        sea: NoiseChannel,
        uplift: NoiseChannel,
        slope: NoiseChannel,
        uplift_from_sea: bool,
        slope_from_sea: bool,
        slope_from_uplift: bool,
    ) -> Self {
        Self {
            size,
            lod,
            land_max_radius,
            seed,
            octaves,
            rng,
            source: OpenSimplex::new(seed as u32),
            sea,
            uplift,
            slope,
            uplift_from_sea,
            slope_from_sea,
            slope_from_uplift,
        }
    }

    /// Sea channel value at (x, y), in [-1, 1] after the continental
    /// gradient is subtracted.
    pub fn sea_data(&self, x: f64, y: f64) -> f64 {
        let c = &self.sea;
        (self.sum_octave(x + c.shift_x, y + c.shift_y, c.persistence, c.scale, c.low, c.high)
            - self.continental_gradient(x, y))
        .clamp(-1.0, 1.0)
    }

    /// Uplift channel value, optionally seeded from the sea channel. The
    /// floor stays barely positive so land never uplifts at exactly zero.
    pub fn uplift_data(&self, x: f64, y: f64, sea: f64) -> f64 {
        let c = &self.uplift;
        let start = if self.uplift_from_sea { sea } else { 0.0 };
        (start
            + self.sum_octave(x + c.shift_x, y + c.shift_y, c.persistence, c.scale, c.low, c.high))
        .clamp(0.0005, 1.0)
    }

    /// Slope channel value, optionally seeded from the sea or uplift
    /// channels. Note the inverted high/low pair fed to the octave sum.
    pub fn slope_data(&self, x: f64, y: f64, sea: f64, uplift: f64) -> f64 {
        let c = &self.slope;
        let start = if self.slope_from_sea {
            sea
        } else if self.slope_from_uplift {
            uplift
        } else {
            0.0
        };
        (start
            + self.sum_octave(x + c.shift_x, y + c.shift_y, c.persistence, c.scale, c.high, c.low))
        .clamp(0.0, 1.0)
    }

    /// Standard octave sum: successively smaller, higher-frequency terms,
    /// averaged and rescaled into [low, high].
    fn sum_octave(
        &self,
        x: f64,
        y: f64,
        persistence: f64,
        scale: f64,
        low: f64,
        high: f64,
    ) -> f64 {
        let mut max_amp = 0.0;
        let mut amp = 1.0;
        let mut freq = scale;
        let mut noise = 0.0;

        for _ in 0..self.octaves {
            noise += self.source.get([x * freq, y * freq]) * amp;
            max_amp += amp;
            amp *= persistence;
            freq *= 2.0;
        }

        noise /= max_amp;
        noise * ((high - low) / 2.0) + ((high + low) / 2.0)
    }

    /// Radial falloff that pushes terrain below sea level beyond the land
    /// radius, keeping the continent inside the square.
    pub fn continental_gradient(&self, x: f64, y: f64) -> f64 {
        let radius = self.land_max_radius as f64;
        let radial = (x * x + y * y).sqrt();
        (((radial - radius / 4.0).max(0.0) / radius) * 2.0 - 1.0).clamp(0.0, 1.0)
    }

    pub fn land_max_radius(&self) -> i32 {
        self.land_max_radius
    }
}

impl TerrainSettings for SimplexNoiseSettings {
    fn data(&self, x: f64, y: f64, max_size: i32) -> Coordinate {
        let sea = self.sea_data(x, y);
        let (uplift, slope) = if sea > 0.0 {
            let uplift = self.uplift_data(x, y, sea);
            (uplift, self.slope_data(x, y, sea, uplift))
        } else {
            (0.0, 0.0)
        };
        Coordinate::clamped(x, y, max_size, sea, uplift, slope)
    }

    fn size(&self) -> i32 {
        self.size
    }

    fn lod(&self) -> i32 {
        self.lod
    }

    fn seed(&self) -> u64 {
        self.seed
    }

    fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factors_stay_in_range() {
        let settings = SimplexNoiseSettings::new(1000, 100, 400, 99);
        for i in -10..=10 {
            for j in -10..=10 {
                let c = settings.data(i as f64 * 50.0, j as f64 * 50.0, 0);
                assert!(c.sea_factor >= -1.0 && c.sea_factor <= 1.0);
                assert!(c.uplift_factor >= 0.0 && c.uplift_factor <= 1.0);
                assert!(c.slope_factor >= 0.0 && c.slope_factor <= 1.0);
                if c.is_sea() {
                    assert_eq!(c.uplift_factor, 0.0);
                    assert_eq!(c.slope_factor, 0.0);
                } else {
                    // Land always uplifts at least a little.
                    assert!(c.uplift_factor >= 0.0005);
                }
            }
        }
    }

    #[test]
    fn same_seed_is_deterministic() {
        let a = SimplexNoiseSettings::new(1000, 100, 400, 5);
        let b = SimplexNoiseSettings::new(1000, 100, 400, 5);
        for &(x, y) in &[(0.0, 0.0), (123.4, -567.8), (-400.0, 399.0)] {
            let ca = a.data(x, y, 0);
            let cb = b.data(x, y, 0);
            assert_eq!(ca.sea_factor, cb.sea_factor);
            assert_eq!(ca.uplift_factor, cb.uplift_factor);
            assert_eq!(ca.slope_factor, cb.slope_factor);
        }
    }

    #[test]
    fn gradient_drowns_the_far_rim() {
        let settings = SimplexNoiseSettings::new(1000, 100, 200, 7);
        // Far beyond the land radius the gradient saturates and forces sea.
        assert_eq!(settings.continental_gradient(2000.0, 0.0), 1.0);
        assert!(settings.data(2000.0, 2000.0, 0).is_sea());
        // At the center it contributes nothing.
        assert_eq!(settings.continental_gradient(0.0, 0.0), 0.0);
    }
}

//! Jittered-grid sample distribution.
//!
//! Samples are laid out on an m-by-m grid (m derived from the level of
//! detail) and jittered with Poisson-distributed offsets, giving an
//! irregular but roughly uniform point cloud for the triangulation.

use glam::DVec2;
use rand::Rng;
use rand_distr::{Distribution, Poisson};
use rustc_hash::FxHashSet;

use super::coord::CoordKey;

/// Generate the sample distribution for a terrain of side length `size` and
/// target sample count `lod`.
///
/// The grid resolution is `m = round(sqrt(lod))` with an integer cell jump of
/// `size / m`. Each cell draws a Poisson(2 * jump) offset per axis, and the
/// resulting point is clamped to `[-size/2 + 1, size/2 - 1]`. Points that
/// collapse onto the same epsilon-grid cell are deduplicated, so at most
/// `m * m` points are returned.
pub fn sample_grid<R: Rng>(size: i32, lod: i32, rng: &mut R) -> Vec<DVec2> {
    let m = (lod as f64).sqrt().round() as i64;
    let jump = size as i64 / m;
    let half = (size / 2) as f64;
    let lo = -half + 1.0;
    let hi = half - 1.0;

    let poisson = Poisson::new((jump * 2) as f64).expect("jump mean must be positive");

    let mut seen: FxHashSet<CoordKey> = FxHashSet::default();
    let mut points = Vec::with_capacity((m * m) as usize);
    for i in 0..m {
        for k in 0..m {
            let px: f64 = poisson.sample(rng);
            let py: f64 = poisson.sample(rng);
            let x = (lo + (i * jump) as f64 + px - jump as f64).clamp(lo, hi);
            let y = (lo + (k * jump) as f64 + py - jump as f64).clamp(lo, hi);
            if seen.insert(CoordKey::at(x, y)) {
                points.push(DVec2::new(x, y));
            }
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn grid_resolution_matches_lod() {
        // lod 20 rounds to a 4x4 grid.
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let points = sample_grid(40, 20, &mut rng);
        assert_eq!(points.len(), 16);
    }

    #[test]
    fn points_stay_inside_the_interior_square() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for p in sample_grid(100, 100, &mut rng) {
            assert!(p.x >= -49.0 && p.x <= 49.0, "x out of range: {}", p.x);
            assert!(p.y >= -49.0 && p.y <= 49.0, "y out of range: {}", p.y);
        }
    }

    #[test]
    fn same_seed_gives_same_points() {
        let mut a = ChaCha8Rng::seed_from_u64(123);
        let mut b = ChaCha8Rng::seed_from_u64(123);
        assert_eq!(sample_grid(200, 400, &mut a), sample_grid(200, 400, &mut b));
    }
}

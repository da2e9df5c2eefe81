//! Factor-annotated 2D coordinates with epsilon-grid equivalence.
//!
//! Every point carries three terrain factors sampled from the input provider:
//! a sea factor (at or below zero means ocean), an uplift factor and a slope
//! factor. Coordinates are compared, ordered and hashed through a fixed
//! epsilon grid so that lookups survive floating-point round trips.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use glam::DVec2;

/// Absolute epsilon for coordinate equivalence. All coordinate equality,
/// ordering and hashing in the simulation goes through this grid.
pub const EPSILON: f64 = 1.0e-6;

/// Canonical grid cell of a 2D position under [`EPSILON`].
///
/// Two positions map to the same key exactly when they round to the same
/// epsilon-grid cell, which makes hashing consistent with equality. Ordering
/// is lexicographic on (x, y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoordKey(i64, i64);

impl CoordKey {
    /// Key for the grid cell containing (x, y).
    pub fn at(x: f64, y: f64) -> Self {
        Self(quantize(x), quantize(y))
    }
}

fn quantize(v: f64) -> i64 {
    (v / EPSILON).round() as i64
}

/// A 2D sample point with its terrain factors.
///
/// The factors are relative values in known ranges; they are translated into
/// geological quantities (uplift rate, maximum slope) when a graph node is
/// built from the coordinate.
#[derive(Debug, Clone, Copy)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    /// In [-1, 1]; at or below zero the point is ocean and acts as a stream
    /// sink, exempt from uplift.
    pub sea_factor: f64,
    /// In [0, 1]; larger means faster tectonic uplift.
    pub uplift_factor: f64,
    /// In [0, 1]; larger allows steeper terrain before thermal shock caps it.
    pub slope_factor: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64, sea_factor: f64, uplift_factor: f64, slope_factor: f64) -> Self {
        Self {
            x,
            y,
            sea_factor,
            uplift_factor,
            slope_factor,
        }
    }

    /// Like [`Coordinate::new`], but clamps the position to the square
    /// `[-max_size, max_size]` first. A non-positive `max_size` disables the
    /// clamp.
    pub fn clamped(
        x: f64,
        y: f64,
        max_size: i32,
        sea_factor: f64,
        uplift_factor: f64,
        slope_factor: f64,
    ) -> Self {
        let (x, y) = if max_size > 0 {
            let bound = max_size as f64;
            (x.clamp(-bound, bound), y.clamp(-bound, bound))
        } else {
            (x, y)
        };
        Self::new(x, y, sea_factor, uplift_factor, slope_factor)
    }

    /// Whether this point is ocean.
    pub fn is_sea(&self) -> bool {
        self.sea_factor <= 0.0
    }

    pub fn position(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    pub fn distance(&self, other: &Coordinate) -> f64 {
        self.position().distance(other.position())
    }

    /// Canonical epsilon-grid key for this coordinate's position.
    pub fn key(&self) -> CoordKey {
        CoordKey::at(self.x, self.y)
    }
}

// Equality, ordering and hashing all ignore the factors: a coordinate is
// identified by position alone, on the epsilon grid.

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Coordinate {}

impl Hash for Coordinate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for Coordinate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Coordinate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_within_epsilon_collapse() {
        let a = Coordinate::new(1.0000001, 2.0000002, 0.5, 0.5, 0.5);
        let b = Coordinate::new(1.0000002, 2.0000001, -1.0, 0.0, 0.0);
        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn distinct_positions_stay_distinct() {
        let a = Coordinate::new(1.0, 2.0, 0.5, 0.5, 0.5);
        let b = Coordinate::new(1.00001, 2.0, 0.5, 0.5, 0.5);
        assert_ne!(a, b);
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a = Coordinate::new(0.0, 5.0, 0.5, 0.0, 0.0);
        let b = Coordinate::new(1.0, -5.0, 0.5, 0.0, 0.0);
        let c = Coordinate::new(1.0, 0.0, 0.5, 0.0, 0.0);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn clamp_applies_only_with_positive_max_size() {
        let c = Coordinate::clamped(30.0, -30.0, 20, 0.5, 0.0, 0.0);
        assert_eq!(c.x, 20.0);
        assert_eq!(c.y, -20.0);
        let unclamped = Coordinate::clamped(30.0, -30.0, 0, 0.5, 0.0, 0.0);
        assert_eq!(unclamped.x, 30.0);
        assert_eq!(unclamped.y, -30.0);
    }

    #[test]
    fn sea_threshold_is_inclusive() {
        assert!(Coordinate::new(0.0, 0.0, 0.0, 0.0, 0.0).is_sea());
        assert!(Coordinate::new(0.0, 0.0, -0.3, 0.0, 0.0).is_sea());
        assert!(!Coordinate::new(0.0, 0.0, 0.01, 0.0, 0.0).is_sea());
    }
}

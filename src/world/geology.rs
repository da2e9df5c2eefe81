//! Global geological constants for the simulation.

/// Constants of the stream-power model and the thermal-shock slope limits.
///
/// Defaults follow the paper: a 250,000-year step converges in a few hundred
/// iterations, the uplift ceiling matches average orogeny rates, and the
/// erosion coefficient puts peak heights around two kilometers.
#[derive(Debug, Clone, Copy)]
pub struct GeologySettings {
    /// Time step in years.
    pub delta_t: f64,
    /// Maximum uplift rate in meters per year.
    pub max_u: f64,
    /// Minimum uplift rate in meters per year.
    pub min_u: f64,
    /// Erosion coefficient of the stream-power law.
    pub k: f64,
    /// Drainage exponent of the stream-power law (the slope exponent is
    /// fixed at 1 to keep the implicit update linear).
    pub m: f64,
    /// Largest slope reachable at slope factor 1, in radians.
    pub max_slope_radians: f64,
    /// Smallest slope cap, at slope factor 0, in radians.
    pub min_slope_radians: f64,
}

impl Default for GeologySettings {
    fn default() -> Self {
        Self {
            delta_t: 250_000.0,
            max_u: 5.01e-4,
            min_u: 0.0,
            k: 5.61e-7,
            m: 0.5,
            max_slope_radians: 58.0_f64.to_radians(),
            min_slope_radians: 6.0_f64.to_radians(),
        }
    }
}

impl GeologySettings {
    /// Estimated tallest mountain these settings can sustain, from the
    /// equilibrium relation H = 2.244 * (U / K).
    pub fn estimated_max_height(&self) -> f64 {
        2.244 * (self.max_u / self.k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_cap_mountains_around_two_kilometers() {
        let geo = GeologySettings::default();
        assert!((geo.estimated_max_height() - 2004.6).abs() < 1.0);
    }
}

//! Uplift, stream-power erosion and the thermal-shock slope cap.
//!
//! Heights advance one geological time step at a time. Drainage areas are
//! accumulated bottom-up over the stream tree, then each node is solved
//! roots-downward with the implicit form of the stream-power equation
//!
//! ```text
//! h' = (h + dt * (u + k * A^m / L * h_down')) / (1 + dt * k * A^m / L)
//! ```
//!
//! which stays stable at 250,000-year steps. A thermal-shock heuristic then
//! caps the slope towards the node's lowest neighbor, modeling rock
//! fracturing before unrealistically sharp relief can form.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::error::GenerateError;
use crate::graph::{Graph, Node, NodeId};
use crate::util::lerp;

use super::geology::GeologySettings;

/// Run one height update over every stream tree, mutating the planar graph's
/// heights in place. Returns the new maximum height.
pub(crate) fn apply_uplift_stream_power(
    rp: &mut Graph,
    stream: &mut Graph,
    geo: &GeologySettings,
) -> Result<f64, GenerateError> {
    let mut max_height = 0.0_f64;
    let sinks: Vec<NodeId> = stream.sinks().collect();

    for sink in sinks {
        accumulate_catchment(stream, sink);
        let peak = update_heights(rp, stream, geo, sink)?;
        max_height = max_height.max(peak);
    }
    Ok(max_height)
}

/// Sum upstream catchment areas over the sink's tree, children before
/// parents.
fn accumulate_catchment(stream: &mut Graph, sink: NodeId) {
    let mut ordered = vec![sink];
    let mut queue: VecDeque<NodeId> = stream.node(sink).inbound().iter().copied().collect();
    while let Some(n) = queue.pop_front() {
        queue.extend(stream.node(n).inbound().iter().copied());
        ordered.push(n);
    }

    // Reverse BFS order puts every child before its parent.
    for &n in ordered.iter().rev() {
        let upstream: f64 = stream
            .node(n)
            .inbound()
            .iter()
            .map(|&c| stream.node(c).total_catchment())
            .sum();
        stream.node_mut(n).upstream_catchment = upstream;
    }
}

/// Solve the implicit stream-power update from the sink outward, so every
/// node sees its downstream neighbor's already-updated height.
fn update_heights(
    rp: &mut Graph,
    stream: &Graph,
    geo: &GeologySettings,
    sink: NodeId,
) -> Result<f64, GenerateError> {
    let mut max_height = 0.0_f64;
    let mut updated: FxHashSet<NodeId> = FxHashSet::default();
    updated.insert(sink);

    let mut queue: VecDeque<NodeId> = stream.node(sink).inbound().iter().copied().collect();
    while let Some(n) = queue.pop_front() {
        let coord = rp.node(n).coord;
        if !coord.is_sea() {
            let out = stream.node(n).out_edges();
            if out.len() != 1 {
                return Err(GenerateError::DownstreamCount {
                    x: coord.x,
                    y: coord.y,
                    count: out.len(),
                });
            }
            let downstream = stream.edge(out[0]).to;
            if !updated.contains(&downstream) {
                return Err(GenerateError::DownstreamNotReady {
                    x: coord.x,
                    y: coord.y,
                });
            }

            let new_height = stream_power_height(stream.node(n), rp.node(n), rp.node(downstream), geo);

            // The slope cap is taken against the lowest inbound neighbor in
            // the planar graph, at its current (possibly mid-step) height.
            let mut lowest: Option<NodeId> = None;
            for &c in rp.node(n).inbound() {
                match lowest {
                    None => lowest = Some(c),
                    Some(l) => {
                        if rp.node(c).height < rp.node(l).height {
                            lowest = Some(c);
                        }
                    }
                }
            }
            let lowest = lowest.ok_or(GenerateError::IsolatedNode {
                x: coord.x,
                y: coord.y,
            })?;
            let low = rp.node(lowest);
            let length = if low.is_sea() {
                1.0
            } else {
                coord.distance(&low.coord)
            };
            let angle = (new_height - low.height).atan2(length);
            let new_height = apply_thermal_shock(
                geo,
                angle,
                new_height,
                low.height,
                length,
                coord.slope_factor,
            );

            rp.node_mut(n).height = new_height;
            max_height = max_height.max(new_height);
        }
        updated.insert(n);
        queue.extend(stream.node(n).inbound().iter().copied());
    }
    Ok(max_height)
}

/// The implicit stream-power update for one node, reading current planar
/// heights and the stream tree's accumulated drainage.
fn stream_power_height(
    stream_node: &Node,
    rp_node: &Node,
    downstream: &Node,
    geo: &GeologySettings,
) -> f64 {
    let drainage = stream_node.total_catchment();
    let length = rp_node.coord.distance(&downstream.coord);
    let k_drainage = geo.k * drainage.powf(geo.m) / length;
    (rp_node.height + geo.delta_t * (rp_node.uplift + k_drainage * downstream.height))
        / (1.0 + geo.delta_t * k_drainage)
}

/// Cap a proposed height so the slope towards the reference neighbor does
/// not exceed the node's thermal-shock limit.
///
/// `slope_factor` in [0, 1] is interpolated between the geology's minimum
/// and maximum slope angles. Heights at or below the reference are returned
/// unchanged.
pub fn apply_thermal_shock(
    geo: &GeologySettings,
    angle_radians: f64,
    height: f64,
    downstream_height: f64,
    length: f64,
    slope_factor: f64,
) -> f64 {
    if height <= downstream_height {
        return height;
    }
    let max_slope = lerp(geo.min_slope_radians, geo.max_slope_radians, slope_factor);
    if angle_radians > max_slope {
        downstream_height + length * max_slope.tan()
    } else {
        height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Coordinate;

    fn geo() -> GeologySettings {
        GeologySettings::default()
    }

    #[test]
    fn thermal_shock_caps_a_steep_slope() {
        // 78.7 degrees against a half-strength slope factor caps at
        // 50 + 10 * tan(lerp(6, 58, 0.5) degrees).
        let result = apply_thermal_shock(&geo(), 78.7_f64.to_radians(), 100.0, 50.0, 10.0, 0.5);
        assert!((result - 56.24869351909327).abs() < 1.0e-9);
    }

    #[test]
    fn thermal_shock_keeps_gentle_slopes() {
        let result = apply_thermal_shock(&geo(), 10.0_f64.to_radians(), 60.0, 50.0, 10.0, 0.5);
        assert_eq!(result, 60.0);
    }

    #[test]
    fn thermal_shock_ignores_descending_heights() {
        let result = apply_thermal_shock(&geo(), 80.0_f64.to_radians(), 40.0, 50.0, 10.0, 0.0);
        assert_eq!(result, 40.0);
    }

    #[test]
    fn capped_height_satisfies_the_slope_bound() {
        let g = geo();
        for &(height, down, length, factor) in &[
            (500.0_f64, 0.0, 3.0, 1.0),
            (120.0, 20.0, 10.0, 0.25),
            (80.0, 0.0, 1.0, 0.0),
        ] {
            let angle = (height - down).atan2(length);
            let capped = apply_thermal_shock(&g, angle, height, down, length, factor);
            let max_slope = lerp(g.min_slope_radians, g.max_slope_radians, factor);
            let final_angle = (capped - down).atan2(length);
            assert!(
                final_angle <= max_slope + 1.0e-9,
                "angle {} exceeds cap {}",
                final_angle,
                max_slope
            );
        }
    }

    #[test]
    fn stream_power_balances_uplift_against_erosion() {
        let g = geo();
        let coord = Coordinate::new(0.0, 0.0, 0.5, 1.0, 0.3);
        let down_coord = Coordinate::new(10.0, 0.0, -1.0, 0.0, 0.0);
        let mut node = Node::new(coord, g.max_u, 0.5, 100.0);
        node.upstream_catchment = 900.0;
        let down = Node::new(down_coord, 0.0, 0.0, 0.0);

        let h = stream_power_height(&node, &node, &down, &g);
        // From zero height, one step of pure uplift over a zero-height
        // downstream: h = dt * u / (1 + dt * k * A^m / L).
        let k_drainage = g.k * 1000.0_f64.powf(g.m) / 10.0;
        let expected = g.delta_t * g.max_u / (1.0 + g.delta_t * k_drainage);
        assert!((h - expected).abs() < 1.0e-9);
        assert!(h > 0.0);
    }
}

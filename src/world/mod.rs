//! The terrain simulation: graph assembly and the per-step pipeline.
//!
//! A [`Generator`] is built in stages:
//!
//! 1. Sample distribution over the terrain square
//! 2. Delaunay triangulation + bounded Voronoi catchment areas
//! 3. Random planar graph assembly (edges crossing the ocean are culled)
//!
//! and then advances in steps, each of which rebuilds the stream forest,
//! routes lakes over their saddles, and applies uplift, stream-power erosion
//! and the thermal-shock cap.

mod erosion;
mod extract;
mod geology;
mod lakes;
mod stream;

pub use erosion::apply_thermal_shock;
pub use extract::TriangleMesh;
pub use geology::GeologySettings;

use glam::DVec2;

use crate::error::GenerateError;
use crate::geometry::{sample_grid, Coordinate, Triangulation};
use crate::graph::{Graph, Node};
use crate::settings::TerrainSettings;
use crate::util::{lerp, Timed};

/// The terrain generator: the planar graph holding the authoritative
/// heights, the per-step stream tree, and the pre-culled triangulation kept
/// for mesh output.
pub struct Generator<S: TerrainSettings> {
    settings: S,
    geology: GeologySettings,
    rp: Graph,
    stream: Graph,
    triangulation: Triangulation,
    steps: u32,
    max_height: f64,
}

impl<S: TerrainSettings> Generator<S> {
    /// Build a generator from an input provider. This samples, triangulates
    /// and assembles the planar graph up front, which dominates startup cost
    /// at high levels of detail.
    pub fn new(geology: GeologySettings, mut settings: S) -> Result<Self, GenerateError> {
        log::info!(
            "generating point distribution (size {}, lod {})",
            settings.size(),
            settings.lod()
        );
        let size = settings.size();
        let lod = settings.lod();
        let points = sample_grid(size, lod, settings.rng());
        Self::from_points(geology, settings, points)
    }

    /// Build a generator from an explicit sample set instead of the jittered
    /// grid. The points must lie strictly inside the terrain square.
    pub fn from_points(
        geology: GeologySettings,
        settings: S,
        points: Vec<DVec2>,
    ) -> Result<Self, GenerateError> {
        let half = settings.size() / 2;

        log::info!("triangulating {} samples", points.len());
        let triangulation = {
            let _t = Timed::debug("triangulation");
            Triangulation::build(&points, half)?
        };

        log::info!("assembling planar graph");
        let rp = {
            let _t = Timed::debug("graph assembly");
            build_rp_graph(&triangulation, &geology, &settings, half)
        };
        log::info!(
            "planar graph ready: {} nodes, {} edges",
            rp.node_count(),
            rp.edge_count()
        );

        Ok(Self {
            settings,
            geology,
            rp,
            stream: Graph::new(),
            triangulation,
            steps: 0,
            max_height: 0.0,
        })
    }

    /// Run simulation steps until `stop` returns true. The predicate is
    /// checked before every step, so it sees the state the previous step
    /// left behind.
    pub fn generate(&mut self, mut stop: impl FnMut(&Self) -> bool) -> Result<(), GenerateError> {
        while !stop(self) {
            self.step()?;
        }
        Ok(())
    }

    /// Advance the simulation by one geological time step.
    pub fn step(&mut self) -> Result<(), GenerateError> {
        let _t = Timed::debug("generation step");
        self.steps += 1;
        stream::compute_stream_tree(&self.rp, &mut self.stream)?;
        let links = lakes::route_lakes(&mut self.rp, &mut self.stream, self.settings.rng())?;
        for (sink, saddle_to) in links {
            self.stream.add_edge(sink, saddle_to);
        }
        self.max_height =
            erosion::apply_uplift_stream_power(&mut self.rp, &mut self.stream, &self.geology)?;
        Ok(())
    }

    /// Rebuild the stream tree and lake routing for the current heights
    /// without applying another height update. Useful after the last step to
    /// leave a consistent drainage picture for extraction and analysis.
    pub fn post_generation_step(&mut self) -> Result<(), GenerateError> {
        stream::compute_stream_tree(&self.rp, &mut self.stream)?;
        lakes::route_lakes(&mut self.rp, &mut self.stream, self.settings.rng())?;
        Ok(())
    }

    /// Number of steps taken so far.
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Highest node after the latest step.
    pub fn max_height(&self) -> f64 {
        self.max_height
    }

    pub fn geology(&self) -> &GeologySettings {
        &self.geology
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    /// The random planar graph; its node heights are the authoritative
    /// elevation state.
    pub fn rp_graph(&self) -> &Graph {
        &self.rp
    }

    /// The stream forest of the latest step.
    pub fn stream_tree(&self) -> &Graph {
        &self.stream
    }

    /// The terrain mesh with current heights applied.
    pub fn triangle_mesh(&self) -> TriangleMesh {
        extract::triangle_mesh(&self.rp, &self.triangulation, &self.settings)
    }

    /// The latest stream tree as 3D segments.
    pub fn stream_segments(&self) -> impl Iterator<Item = (glam::DVec3, glam::DVec3)> + '_ {
        extract::stream_segments(&self.stream)
    }
}

/// Assemble the random planar graph from the triangulation: keep coast
/// edges, drop ocean-to-ocean edges, and probe land-to-land edges for hidden
/// ocean crossings.
fn build_rp_graph<S: TerrainSettings>(
    triangulation: &Triangulation,
    geology: &GeologySettings,
    settings: &S,
    half: i32,
) -> Graph {
    let mut graph = Graph::new();

    for &(a, b) in &triangulation.edges {
        let pa = triangulation.sites[a];
        let pb = triangulation.sites[b];
        let ca = settings.data(pa.x, pa.y, half);
        let cb = settings.data(pb.x, pb.y, half);

        let keep = if ca.is_sea() ^ cb.is_sea() {
            // Coast edge: the sea endpoint becomes the stream's sink.
            true
        } else if ca.is_sea() {
            // Ocean floor edge, no stream will ever use it.
            false
        } else {
            let length = pa.distance(pb);
            let samples = (length.floor() as i64).clamp(2, 50) as usize;
            !crosses_sea(&ca, &cb, samples, settings)
        };

        if keep {
            let na = graph.insert(terrain_node(ca, geology, triangulation.area(a)));
            let nb = graph.insert(terrain_node(cb, geology, triangulation.area(b)));
            graph.add_bidirectional(na, nb);
        }
    }
    graph
}

fn terrain_node(coord: Coordinate, geology: &GeologySettings, area: f64) -> Node {
    Node::new(
        coord,
        lerp(geology.min_u, geology.max_u, coord.uplift_factor),
        lerp(
            geology.min_slope_radians,
            geology.max_slope_radians,
            coord.slope_factor,
        ),
        area,
    )
}

/// Probe the open segment between two land points for ocean. Fewer than
/// three samples means the segment is too short to bother.
fn crosses_sea<S: TerrainSettings>(
    a: &Coordinate,
    b: &Coordinate,
    samples: usize,
    settings: &S,
) -> bool {
    if samples < 3 {
        return false;
    }
    let step = 1.0 / (samples - 1) as f64;
    for i in 1..samples {
        let t = i as f64 * step;
        let x = lerp(a.x, b.x, t);
        let y = lerp(a.y, b.y, t);
        if settings.data(x, y, 0).is_sea() {
            return true;
        }
    }
    false
}

//! Extraction of simulation results: a heightfield mesh and stream
//! polylines.
//!
//! The mesh reuses the triangle list saved before any edges were culled, so
//! it covers the whole terrain square; vertices whose nodes were culled from
//! the planar graph (ocean regions) fall back to a depth read from the input
//! provider.

use glam::DVec3;
use rustc_hash::FxHashMap;

use crate::geometry::Triangulation;
use crate::graph::Graph;
use crate::settings::TerrainSettings;
use crate::util::lerp;

/// Ocean floor depth at full sea factor, in meters.
const MAX_SEA_DEPTH: f64 = -1500.0;

/// An indexed triangle mesh over the terrain square.
pub struct TriangleMesh {
    pub vertices: Vec<DVec3>,
    pub triangles: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Iterate the mesh as (v0, v1, v2) triples.
    pub fn faces(&self) -> impl Iterator<Item = [DVec3; 3]> + '_ {
        self.triangles.iter().map(|t| {
            [
                self.vertices[t[0] as usize],
                self.vertices[t[1] as usize],
                self.vertices[t[2] as usize],
            ]
        })
    }
}

/// Attach current heights to the pre-culled triangulation.
///
/// Vertices are deduplicated by site, so shared triangle corners map to one
/// mesh vertex. Sites without a graph node take a depth interpolated from
/// their sea factor.
pub(crate) fn triangle_mesh<S: TerrainSettings>(
    rp: &Graph,
    triangulation: &Triangulation,
    settings: &S,
) -> TriangleMesh {
    let mut site_vertex: FxHashMap<usize, u32> = FxHashMap::default();
    let mut vertices = Vec::new();
    let mut triangles = Vec::with_capacity(triangulation.triangles.len());

    for tri in &triangulation.triangles {
        let mut face = [0u32; 3];
        for (slot, &site) in face.iter_mut().zip(tri.iter()) {
            *slot = *site_vertex.entry(site).or_insert_with(|| {
                let index = vertices.len() as u32;
                vertices.push(vertex_position(rp, triangulation, settings, site));
                index
            });
        }
        triangles.push(face);
    }

    TriangleMesh {
        vertices,
        triangles,
    }
}

fn vertex_position<S: TerrainSettings>(
    rp: &Graph,
    triangulation: &Triangulation,
    settings: &S,
    site: usize,
) -> DVec3 {
    let p = triangulation.sites[site];
    match rp.find_at(p.x, p.y) {
        Some(id) => {
            let node = rp.node(id);
            DVec3::new(node.coord.x, node.coord.y, node.height)
        }
        None => {
            // Culled during graph assembly; depth follows the sea factor.
            let data = settings.data(p.x, p.y, 0);
            DVec3::new(p.x, p.y, lerp(0.0, MAX_SEA_DEPTH, data.sea_factor.abs()))
        }
    }
}

/// Current stream-tree edges as 3D segments, heights taken from the stream
/// snapshot.
pub(crate) fn stream_segments(stream: &Graph) -> impl Iterator<Item = (DVec3, DVec3)> + '_ {
    stream.edges().map(|e| {
        let from = stream.node(e.from);
        let to = stream.node(e.to);
        (
            DVec3::new(from.coord.x, from.coord.y, from.height),
            DVec3::new(to.coord.x, to.coord.y, to.height),
        )
    })
}

//! Delaunay triangulation and bounded Voronoi catchment areas.
//!
//! The sample set plus the four corners of the terrain square go through
//! voronoice, which produces the Delaunay triangulation and its Voronoi dual
//! clipped to the square. Each site's clipped cell area becomes the local
//! catchment area of the corresponding graph node; the triangle list is
//! retained verbatim for mesh extraction after the simulation.

use glam::DVec2;
use rustc_hash::FxHashSet;
use voronoice::{BoundingBox, Point, Voronoi, VoronoiBuilder};

use crate::error::GenerateError;

/// The triangulated sample set with its bounded Voronoi cell areas.
pub struct Triangulation {
    /// All sites, in builder order: the samples first, then the four square
    /// corners.
    pub sites: Vec<DVec2>,
    /// Triangles as site-index triples. Kept unfiltered ("pre-culled") so the
    /// output mesh covers the whole square even where graph edges were
    /// culled.
    pub triangles: Vec<[usize; 3]>,
    /// Unique undirected edges of the triangulation, in first-seen order.
    pub edges: Vec<(usize, usize)>,
    /// Area of each site's Voronoi cell, clipped to the terrain square.
    pub cell_areas: Vec<f64>,
}

impl Triangulation {
    /// Triangulate `points` inside the square of half side `half_size`.
    ///
    /// The four square corners are appended as sites so the triangulation
    /// spans the whole square; the bounding box clips every Voronoi cell to
    /// it.
    pub fn build(points: &[DVec2], half_size: i32) -> Result<Self, GenerateError> {
        let h = half_size as f64;
        let mut sites: Vec<Point> = points.iter().map(|p| Point { x: p.x, y: p.y }).collect();
        for (x, y) in [(-h, -h), (h, -h), (h, h), (-h, h)] {
            sites.push(Point { x, y });
        }

        let voronoi = VoronoiBuilder::default()
            .set_sites(sites)
            .set_bounding_box(BoundingBox::new_centered(2.0 * h, 2.0 * h))
            .build()
            .ok_or_else(|| {
                GenerateError::Triangulation("degenerate or empty site set".to_string())
            })?;

        let triangles = collect_triangles(&voronoi);
        let edges = collect_edges(&triangles);
        let cell_areas = collect_cell_areas(&voronoi);
        let sites = voronoi
            .sites()
            .iter()
            .map(|p| DVec2::new(p.x, p.y))
            .collect();

        Ok(Self {
            sites,
            triangles,
            edges,
            cell_areas,
        })
    }

    /// Clipped Voronoi cell area of a site.
    pub fn area(&self, site: usize) -> f64 {
        self.cell_areas[site]
    }
}

fn collect_triangles(voronoi: &Voronoi) -> Vec<[usize; 3]> {
    voronoi
        .triangulation()
        .triangles
        .chunks_exact(3)
        .map(|t| [t[0], t[1], t[2]])
        .collect()
}

/// Derive the unique undirected edge list from the triangle list.
fn collect_edges(triangles: &[[usize; 3]]) -> Vec<(usize, usize)> {
    let mut seen: FxHashSet<(usize, usize)> = FxHashSet::default();
    let mut edges = Vec::new();
    for t in triangles {
        for (a, b) in [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])] {
            let edge = if a < b { (a, b) } else { (b, a) };
            if seen.insert(edge) {
                edges.push(edge);
            }
        }
    }
    edges
}

fn collect_cell_areas(voronoi: &Voronoi) -> Vec<f64> {
    let mut areas = vec![0.0; voronoi.sites().len()];
    for cell in voronoi.iter_cells() {
        let vertices: Vec<&Point> = cell.iter_vertices().collect();
        areas[cell.site()] = polygon_area(&vertices);
    }
    areas
}

/// Shoelace area of a simple polygon.
fn polygon_area(vertices: &[&Point]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..vertices.len() {
        let a = vertices[i];
        let b = vertices[(i + 1) % vertices.len()];
        twice_area += a.x * b.y - b.x * a.y;
    }
    (twice_area / 2.0).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interior_points() -> Vec<DVec2> {
        vec![
            DVec2::new(-5.0, -5.0),
            DVec2::new(5.0, -5.0),
            DVec2::new(5.0, 5.0),
            DVec2::new(-5.0, 5.0),
            DVec2::new(0.0, 0.0),
        ]
    }

    #[test]
    fn corners_are_appended_after_samples() {
        let tri = Triangulation::build(&interior_points(), 10).unwrap();
        assert_eq!(tri.sites.len(), 9);
        assert_eq!(tri.sites[5], DVec2::new(-10.0, -10.0));
        assert_eq!(tri.sites[8], DVec2::new(-10.0, 10.0));
    }

    #[test]
    fn cell_areas_partition_the_square() {
        let tri = Triangulation::build(&interior_points(), 10).unwrap();
        let total: f64 = tri.cell_areas.iter().sum();
        // The bounded cells tile the 20x20 square.
        assert!(
            (total - 400.0).abs() < 1.0e-6,
            "cell areas sum to {}, expected 400",
            total
        );
        assert!(tri.cell_areas.iter().all(|&a| a > 0.0));
    }

    #[test]
    fn edges_are_unique_and_reference_valid_sites() {
        let tri = Triangulation::build(&interior_points(), 10).unwrap();
        let mut seen = FxHashSet::default();
        for &(a, b) in &tri.edges {
            assert!(a < b);
            assert!(b < tri.sites.len());
            assert!(seen.insert((a, b)), "duplicate edge ({}, {})", a, b);
        }
        assert!(!tri.triangles.is_empty());
    }
}

//! Arena-backed planar graph of terrain nodes and directed edges.
//!
//! Three graphs share this structure during a simulation: the random planar
//! graph built once at init (the authoritative elevation state), the stream
//! tree rebuilt every step, and the ephemeral lake graph. Nodes and edges
//! live in arenas addressed by integer handles; adjacency is kept as handle
//! lists, which sidesteps the node/edge ownership cycles a pointer-based
//! graph would have. Clearing a graph drops the arenas and invalidates every
//! outstanding handle.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::geometry::{CoordKey, Coordinate};

/// Handle to a node in a [`Graph`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

/// Handle to a directed edge in a [`Graph`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(pub u32);

/// A terrain node: a coordinate plus the state the simulation tracks for it.
///
/// Invariants: sea nodes keep `height`, `uplift`, `max_slope` and
/// `local_catchment` at zero; outbound edges stay sorted by bearing; the
/// inbound list mirrors other nodes' outbound edges targeting this node.
#[derive(Debug, Clone)]
pub struct Node {
    pub coord: Coordinate,
    /// Elevation in meters.
    pub height: f64,
    /// Uplift rate in meters per year.
    pub uplift: f64,
    /// Maximum stable slope in radians, derived from the slope factor.
    pub max_slope: f64,
    /// Voronoi cell area in square meters.
    pub local_catchment: f64,
    /// Catchment area of all upstream nodes, recomputed every step.
    pub upstream_catchment: f64,
    /// Lake tag; -1 until lakes are assigned.
    pub lake: i64,
    out: Vec<EdgeId>,
    inbound: Vec<NodeId>,
}

impl Node {
    /// Build a node from a coordinate and its geological values. For sea
    /// coordinates the values are ignored and zeroed: the sea is a passive
    /// sink.
    pub fn new(coord: Coordinate, uplift: f64, max_slope: f64, local_catchment: f64) -> Self {
        let sea = coord.is_sea();
        Self {
            coord,
            height: 0.0,
            uplift: if sea { 0.0 } else { uplift },
            max_slope: if sea { 0.0 } else { max_slope },
            local_catchment: if sea { 0.0 } else { local_catchment },
            upstream_catchment: 0.0,
            lake: -1,
            out: Vec::new(),
            inbound: Vec::new(),
        }
    }

    /// A node with no geological values, used for lake-graph nodes that only
    /// stand in for a sink coordinate.
    pub fn bare(coord: Coordinate) -> Self {
        Self::new(coord, 0.0, 0.0, 0.0)
    }

    /// Detached copy of this node's current state, with adjacency and the
    /// per-step upstream catchment cleared. Used to rebuild the stream tree.
    pub fn snapshot(&self) -> Self {
        Self {
            coord: self.coord,
            height: self.height,
            uplift: self.uplift,
            max_slope: self.max_slope,
            local_catchment: self.local_catchment,
            upstream_catchment: 0.0,
            lake: self.lake,
            out: Vec::new(),
            inbound: Vec::new(),
        }
    }

    pub fn is_sea(&self) -> bool {
        self.coord.is_sea()
    }

    /// Local plus upstream catchment area; the drainage term of the
    /// stream-power equation.
    pub fn total_catchment(&self) -> f64 {
        self.upstream_catchment + self.local_catchment
    }

    /// Outbound edges, sorted by 2D bearing.
    pub fn out_edges(&self) -> &[EdgeId] {
        &self.out
    }

    /// Nodes with an edge into this node.
    pub fn inbound(&self) -> &[NodeId] {
        &self.inbound
    }

    /// Override this node as a sea node: zero height and factors. Used only
    /// when a lake graph ends up with no sea root at all.
    pub fn switch_to_sea(&mut self) {
        self.height = 0.0;
        self.coord = Coordinate::new(self.coord.x, self.coord.y, 0.0, 0.0, 0.0);
    }
}

/// A directed edge between two nodes, with an optional reverse twin.
///
/// The lake fields (`pass_height`, the saddle handles, `insert_order`) are
/// only meaningful on lake-graph edges; the saddle handles point into the
/// random planar graph's arena, not this one.
#[derive(Debug, Clone)]
pub struct DirectedEdge {
    pub from: NodeId,
    pub to: NodeId,
    /// atan2 bearing of the edge in [-pi, pi], cached for adjacency order.
    pub bearing: f64,
    /// The reverse edge, if this graph holds one.
    pub sym: Option<EdgeId>,
    /// Saddle crest elevation between two lakes.
    pub pass_height: f64,
    /// Planar-graph node on the from-lake's side of the saddle.
    pub saddle_from: Option<NodeId>,
    /// Planar-graph node on the to-lake's side of the saddle.
    pub saddle_to: Option<NodeId>,
    /// Tiebreaker assigned when the edge enters the lake priority queue.
    pub insert_order: u64,
}

/// A graph over coordinates: node and edge arenas, an epsilon-grid index and
/// the set of sinks (nodes without outbound edges).
#[derive(Default)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<DirectedEdge>,
    index: FxHashMap<CoordKey, NodeId>,
    sinks: BTreeSet<NodeId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Insert a node, or return the existing one at the same coordinate.
    /// New nodes start out as sinks.
    pub fn insert(&mut self, node: Node) -> NodeId {
        let key = node.coord.key();
        if let Some(&existing) = self.index.get(&key) {
            return existing;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.index.insert(key, id);
        self.nodes.push(node);
        self.sinks.insert(id);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub fn edge(&self, id: EdgeId) -> &DirectedEdge {
        &self.edges[id.0 as usize]
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> &mut DirectedEdge {
        &mut self.edges[id.0 as usize]
    }

    /// Node at the given coordinate, if any.
    pub fn find(&self, coord: &Coordinate) -> Option<NodeId> {
        self.index.get(&coord.key()).copied()
    }

    /// Node at the given 2D position, if any.
    pub fn find_at(&self, x: f64, y: f64) -> Option<NodeId> {
        self.index.get(&CoordKey::at(x, y)).copied()
    }

    /// The edge from `from` to `to`, if present.
    pub fn find_edge(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        self.nodes[from.0 as usize]
            .out
            .iter()
            .copied()
            .find(|&e| self.edges[e.0 as usize].to == to)
    }

    /// Add a directed edge, or return the existing one. Links the reverse
    /// twin if the graph already holds it, keeps the source's outbound list
    /// bearing-sorted, mirrors the inbound list, and drops the source from
    /// the sink set.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> EdgeId {
        if let Some(existing) = self.find_edge(from, to) {
            return existing;
        }
        let delta = self.node(to).coord.position() - self.node(from).coord.position();
        let sym = self.find_edge(to, from);
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(DirectedEdge {
            from,
            to,
            bearing: delta.y.atan2(delta.x),
            sym,
            pass_height: 0.0,
            saddle_from: None,
            saddle_to: None,
            insert_order: 0,
        });
        if let Some(rev) = sym {
            self.edges[rev.0 as usize].sym = Some(id);
        }

        let Graph { nodes, edges, .. } = self;
        let out = &mut nodes[from.0 as usize].out;
        out.push(id);
        // Stable, so edges with equal bearings keep insertion order.
        out.sort_by(|a, b| {
            edges[a.0 as usize]
                .bearing
                .partial_cmp(&edges[b.0 as usize].bearing)
                .unwrap()
        });

        self.nodes[to.0 as usize].inbound.push(from);
        self.sinks.remove(&from);
        id
    }

    /// Add both directions between two nodes, linked as each other's twins.
    pub fn add_bidirectional(&mut self, a: NodeId, b: NodeId) -> (EdgeId, EdgeId) {
        (self.add_edge(a, b), self.add_edge(b, a))
    }

    /// Nodes in arena order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    /// Edges in arena order.
    pub fn edges(&self) -> impl Iterator<Item = &DirectedEdge> {
        self.edges.iter()
    }

    /// Nodes with no outbound edges, in ascending handle order.
    pub fn sinks(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.sinks.iter().copied()
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Drop all nodes and edges. Outstanding handles become invalid.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.index.clear();
        self.sinks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn land(x: f64, y: f64) -> Node {
        Node::new(Coordinate::new(x, y, 0.5, 0.5, 0.5), 1.0e-4, 0.5, 10.0)
    }

    #[test]
    fn insert_deduplicates_by_coordinate() {
        let mut g = Graph::new();
        let a = g.insert(land(1.0, 1.0));
        let b = g.insert(land(1.0 + 1.0e-8, 1.0));
        assert_eq!(a, b);
        assert_eq!(g.node_count(), 1);
    }

    #[test]
    fn bidirectional_edges_are_linked_twins() {
        let mut g = Graph::new();
        let a = g.insert(land(0.0, 0.0));
        let b = g.insert(land(1.0, 0.0));
        let (ab, ba) = g.add_bidirectional(a, b);

        assert_eq!(g.edge(ab).sym, Some(ba));
        assert_eq!(g.edge(ba).sym, Some(ab));
        assert_eq!(g.edge(ab).from, g.edge(ba).to);
        assert_eq!(g.edge(ab).to, g.edge(ba).from);
    }

    #[test]
    fn adding_edges_updates_sinks() {
        let mut g = Graph::new();
        let a = g.insert(land(0.0, 0.0));
        let b = g.insert(land(1.0, 0.0));
        assert_eq!(g.sink_count(), 2);

        g.add_edge(a, b);
        let sinks: Vec<NodeId> = g.sinks().collect();
        assert_eq!(sinks, vec![b]);
    }

    #[test]
    fn duplicate_edges_collapse() {
        let mut g = Graph::new();
        let a = g.insert(land(0.0, 0.0));
        let b = g.insert(land(1.0, 0.0));
        let first = g.add_edge(a, b);
        let second = g.add_edge(a, b);
        assert_eq!(first, second);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn out_edges_stay_sorted_by_bearing() {
        let mut g = Graph::new();
        let center = g.insert(land(0.0, 0.0));
        let east = g.insert(land(1.0, 0.0));
        let north = g.insert(land(0.0, 1.0));
        let west = g.insert(land(-1.0, 0.0));
        let south = g.insert(land(0.0, -1.0));

        // Insert out of bearing order.
        g.add_edge(center, north);
        g.add_edge(center, west);
        g.add_edge(center, south);
        g.add_edge(center, east);

        let bearings: Vec<f64> = g
            .node(center)
            .out_edges()
            .iter()
            .map(|&e| g.edge(e).bearing)
            .collect();
        let mut sorted = bearings.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(bearings, sorted);
        // south (-pi/2) first, west (pi) last
        assert_eq!(g.edge(g.node(center).out_edges()[0]).to, south);
        assert_eq!(g.edge(g.node(center).out_edges()[3]).to, west);
    }

    #[test]
    fn sea_nodes_zero_their_geology() {
        let n = Node::new(Coordinate::new(0.0, 0.0, -0.5, 0.9, 0.9), 1.0e-4, 0.7, 25.0);
        assert_eq!(n.uplift, 0.0);
        assert_eq!(n.max_slope, 0.0);
        assert_eq!(n.local_catchment, 0.0);
        assert_eq!(n.height, 0.0);
    }

    #[test]
    fn snapshot_detaches_adjacency() {
        let mut g = Graph::new();
        let a = g.insert(land(0.0, 0.0));
        let b = g.insert(land(1.0, 0.0));
        g.add_bidirectional(a, b);
        g.node_mut(a).height = 12.0;
        g.node_mut(a).upstream_catchment = 99.0;

        let snap = g.node(a).snapshot();
        assert_eq!(snap.height, 12.0);
        assert_eq!(snap.upstream_catchment, 0.0);
        assert!(snap.out_edges().is_empty());
        assert!(snap.inbound().is_empty());
    }
}

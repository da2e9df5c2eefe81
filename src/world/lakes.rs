//! Lake detection and routing.
//!
//! After the stream pass, every terrestrial local minimum pools water. Each
//! sink's upstream closure becomes a lake; adjacent lakes are connected by
//! their lowest saddle; and a priority-ordered spanning tree rooted at the
//! sea lakes picks one outlet per lake, so that every drop of water has a
//! path to the sea.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use ordered_float::OrderedFloat;
use rand::Rng;

use crate::error::GenerateError;
use crate::geometry::Coordinate;
use crate::graph::{DirectedEdge, EdgeId, Graph, Node, NodeId};

/// Saddle candidate between two lakes: the crossing planar-graph edge with
/// the lowest crest found so far.
struct Saddle {
    from: NodeId,
    to: NodeId,
    pass_height: f64,
}

/// Composite order for the lake priority queue: ascending pass height, then
/// uplift of the destination lake, then uplift of the source lake, then
/// insertion order. The edge handle rides along for retrieval.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct QueueKey {
    pass_height: OrderedFloat<f64>,
    to_uplift: OrderedFloat<f64>,
    from_uplift: OrderedFloat<f64>,
    insert_order: u64,
    edge: EdgeId,
}

impl QueueKey {
    fn new(lakes: &Graph, edge: EdgeId) -> Self {
        let e = lakes.edge(edge);
        Self {
            pass_height: OrderedFloat(e.pass_height),
            to_uplift: OrderedFloat(lakes.node(e.to).uplift),
            from_uplift: OrderedFloat(lakes.node(e.from).uplift),
            insert_order: e.insert_order,
            edge,
        }
    }
}

/// Tag lakes on both graphs, build the lake graph, and choose one outlet
/// saddle per non-sea lake.
///
/// Returns the stream edges to add, as (lake sink, far-side saddle node)
/// pairs: linking each lake's sink over its chosen saddle turns the stream
/// forest into one rooted only at the sea.
pub(crate) fn route_lakes<R: Rng>(
    rp: &mut Graph,
    stream: &mut Graph,
    rng: &mut R,
) -> Result<Vec<(NodeId, NodeId)>, GenerateError> {
    let sinks: Vec<NodeId> = stream.sinks().collect();
    if sinks.is_empty() {
        return Err(GenerateError::NoSinks);
    }

    let members = assign_lake_ids(rp, stream, &sinks);
    let lakes = build_lake_graph(rp, stream, &sinks, &members);
    if lakes.is_empty() {
        // Single lake, nothing to route.
        return Ok(Vec::new());
    }
    let outlets = spanning_tree(lakes, rng);

    let mut links = Vec::with_capacity(outlets.len());
    for (from, edge) in outlets {
        let far_side = edge.saddle_to.ok_or(GenerateError::MissingSaddle {
            x: from.coord.x,
            y: from.coord.y,
        })?;
        let sink = stream
            .find(&from.coord)
            .expect("lake sink missing from stream graph");
        links.push((sink, far_side));
    }
    Ok(links)
}

/// Flood the reversed stream forest from each sink, tagging every reachable
/// node (in both graphs) with the sink's lake id. Returns the member list of
/// each lake in discovery order.
fn assign_lake_ids(rp: &mut Graph, stream: &mut Graph, sinks: &[NodeId]) -> Vec<Vec<NodeId>> {
    let mut members = Vec::with_capacity(sinks.len());
    for (lake, &sink) in sinks.iter().enumerate() {
        let lake = lake as i64;
        let mut list = Vec::new();
        let mut queue = VecDeque::from([sink]);
        while let Some(n) = queue.pop_front() {
            stream.node_mut(n).lake = lake;
            rp.node_mut(n).lake = lake;
            list.push(n);
            queue.extend(stream.node(n).inbound().iter().copied());
        }
        members.push(list);
    }
    members
}

/// One node per lake (keyed by its sink coordinate), bidirectional edges
/// between adjacent lakes carrying the lowest saddle found between them.
fn build_lake_graph(
    rp: &Graph,
    stream: &Graph,
    sinks: &[NodeId],
    members: &[Vec<NodeId>],
) -> Graph {
    let mut lakes = Graph::new();

    for (lake_a, list) in members.iter().enumerate() {
        let sink_a = sinks[lake_a];
        let sea_a = stream.node(sink_a).is_sea();

        // Lowest crossing per neighboring lake, scanned over the planar
        // graph since the stream trees are disconnected.
        let mut best: BTreeMap<i64, Saddle> = BTreeMap::new();
        for &n in list {
            for &e in rp.node(n).out_edges() {
                let to = rp.edge(e).to;
                let to_lake = rp.node(to).lake;
                if to_lake == lake_a as i64 {
                    continue;
                }
                if sea_a && stream.node(sinks[to_lake as usize]).is_sea() {
                    // No flow needs routing between two ocean basins.
                    continue;
                }
                let pass_height = rp.node(n).height.max(rp.node(to).height);
                match best.entry(to_lake) {
                    Entry::Occupied(mut o) => {
                        if pass_height < o.get().pass_height {
                            o.insert(Saddle {
                                from: n,
                                to,
                                pass_height,
                            });
                        }
                    }
                    Entry::Vacant(v) => {
                        v.insert(Saddle {
                            from: n,
                            to,
                            pass_height,
                        });
                    }
                }
            }
        }

        for (&lake_b, saddle) in &best {
            let coord_a = stream.node(sink_a).coord;
            let coord_b = stream.node(sinks[lake_b as usize]).coord;
            add_lake_edge(&mut lakes, coord_a, coord_b, saddle);
        }
    }
    lakes
}

/// Register a saddle between two lakes as a bidirectional edge pair.
///
/// When the pair already exists (the other lake registered it first), the
/// saddle nodes are overwritten with this side's pair while the original
/// pass height is kept.
fn add_lake_edge(lakes: &mut Graph, coord_a: Coordinate, coord_b: Coordinate, saddle: &Saddle) {
    let a = lakes.insert(Node::bare(coord_a));
    let b = lakes.insert(Node::bare(coord_b));

    let ab = match lakes.find_edge(a, b) {
        Some(e) => e,
        None => {
            let e = lakes.add_edge(a, b);
            lakes.edge_mut(e).pass_height = saddle.pass_height;
            e
        }
    };
    let ba = match lakes.find_edge(b, a) {
        Some(e) => e,
        None => {
            let e = lakes.add_edge(b, a);
            lakes.edge_mut(e).pass_height = saddle.pass_height;
            e
        }
    };
    let sym = lakes.edge(ab).sym;
    debug_assert_eq!(sym, Some(ba));

    let ab = lakes.edge_mut(ab);
    ab.saddle_from = Some(saddle.from);
    ab.saddle_to = Some(saddle.to);
    let ba = lakes.edge_mut(ba);
    ba.saddle_from = Some(saddle.to);
    ba.saddle_to = Some(saddle.from);
}

/// Choose one outgoing saddle per non-sea lake, forming a tree rooted at the
/// sea lakes. Returns (lake node, chosen edge) sorted by lake coordinate.
fn spanning_tree<R: Rng>(mut lakes: Graph, rng: &mut R) -> Vec<(Node, DirectedEdge)> {
    let mut roots: Vec<NodeId> = lakes
        .nodes()
        .filter(|(_, n)| n.is_sea())
        .map(|(id, _)| id)
        .collect();

    if roots.is_empty() {
        log::warn!("no sea lakes in lake graph, promoting one at random");
        let count = lakes.node_count();
        let pick = if count > 1 { rng.gen_range(0..count - 1) } else { 0 };
        let id = NodeId(pick as u32);
        lakes.node_mut(id).switch_to_sea();
        roots = vec![id];
    }

    let mut queue: BTreeSet<QueueKey> = BTreeSet::new();
    let mut insert_no: u64 = 0;

    // Seed with every edge draining into a sea root.
    for &root in &roots {
        let upstream: Vec<EdgeId> = lakes.node(root).out_edges().to_vec();
        for up in upstream {
            if let Some(down) = lakes.edge(up).sym {
                lakes.edge_mut(down).insert_order = insert_no;
                insert_no += 1;
                queue.insert(QueueKey::new(&lakes, down));
            }
        }
    }

    let mut outlets: BTreeMap<NodeId, EdgeId> = BTreeMap::new();
    while let Some(key) = queue.pop_first() {
        let edge = key.edge;
        let from = lakes.edge(edge).from;
        if outlets.contains_key(&from) {
            continue;
        }
        outlets.insert(from, edge);

        // The newly drained lake exposes its other neighbors as candidates.
        let upstream: Vec<EdgeId> = lakes.node(from).out_edges().to_vec();
        for up in upstream {
            if up == edge {
                continue;
            }
            let Some(down) = lakes.edge(up).sym else {
                continue;
            };
            if lakes.node(lakes.edge(down).from).is_sea() {
                continue;
            }
            lakes.edge_mut(down).insert_order = insert_no;
            insert_no += 1;
            queue.insert(QueueKey::new(&lakes, down));
        }
    }

    let mut chosen: Vec<(Node, DirectedEdge)> = outlets
        .into_iter()
        .map(|(from, e)| (lakes.node(from).clone(), lakes.edge(e).clone()))
        .collect();
    chosen.sort_by_key(|(from, _)| from.coord.key());
    chosen
}

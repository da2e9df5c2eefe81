//! Per-step stream forest construction.
//!
//! Every node of the planar graph is cloned into the stream graph with its
//! current height, then each land node gets one outbound edge to its lowest
//! neighbor, if that neighbor is strictly lower. Local minima and sea nodes
//! stay sinks; the lake routing pass connects the minima afterwards.

use crate::error::GenerateError;
use crate::graph::Graph;

/// Rebuild `stream` as the steepest-descent forest of `rp`.
///
/// Stream nodes are inserted in planar-graph arena order, so handles are
/// interchangeable between the two graphs.
pub(crate) fn compute_stream_tree(rp: &Graph, stream: &mut Graph) -> Result<(), GenerateError> {
    stream.clear();
    for (_, node) in rp.nodes() {
        stream.insert(node.snapshot());
    }
    debug_assert_eq!(stream.node_count(), rp.node_count());

    for (id, node) in rp.nodes() {
        if node.is_sea() {
            continue;
        }

        let mut out = node.out_edges().iter().copied();
        let Some(first) = out.next() else {
            return Err(GenerateError::IsolatedNode {
                x: node.coord.x,
                y: node.coord.y,
            });
        };
        // First minimum wins on equal heights.
        let mut lowest = first;
        for e in out {
            if rp.node(rp.edge(lowest).to).height > rp.node(rp.edge(e).to).height {
                lowest = e;
            }
        }

        let dest = rp.edge(lowest).to;
        if rp.node(dest).height < node.height {
            stream.add_edge(id, dest);
        }
        // Otherwise this node is a local minimum and stays a sink.
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Coordinate;
    use crate::graph::Node;

    fn node(x: f64, y: f64, sea: f64, height: f64) -> Node {
        let mut n = Node::new(Coordinate::new(x, y, sea, 0.5, 0.5), 1.0e-4, 0.5, 10.0);
        if !n.is_sea() {
            n.height = height;
        }
        n
    }

    #[test]
    fn descends_to_the_lowest_neighbor() {
        let mut rp = Graph::new();
        let center = rp.insert(node(0.0, 0.0, 0.5, 10.0));
        let low = rp.insert(node(1.0, 0.0, 0.5, 2.0));
        let high = rp.insert(node(-1.0, 0.0, 0.5, 8.0));
        rp.add_bidirectional(center, low);
        rp.add_bidirectional(center, high);

        let mut stream = Graph::new();
        compute_stream_tree(&rp, &mut stream).unwrap();

        let out = stream.node(center).out_edges();
        assert_eq!(out.len(), 1);
        assert_eq!(stream.edge(out[0]).to, low);
    }

    #[test]
    fn equal_heights_pick_the_first_by_bearing() {
        let mut rp = Graph::new();
        let center = rp.insert(node(0.0, 0.0, 0.5, 10.0));
        // Same height; south sorts before east by bearing.
        let east = rp.insert(node(1.0, 0.0, 0.5, 3.0));
        let south = rp.insert(node(0.0, -1.0, 0.5, 3.0));
        rp.add_bidirectional(center, east);
        rp.add_bidirectional(center, south);

        let mut stream = Graph::new();
        compute_stream_tree(&rp, &mut stream).unwrap();
        assert_eq!(stream.edge(stream.node(center).out_edges()[0]).to, south);
    }

    #[test]
    fn local_minima_and_sea_stay_sinks() {
        let mut rp = Graph::new();
        let pit = rp.insert(node(0.0, 0.0, 0.5, 1.0));
        let rim = rp.insert(node(1.0, 0.0, 0.5, 5.0));
        let sea = rp.insert(node(2.0, 0.0, -1.0, 0.0));
        rp.add_bidirectional(pit, rim);
        rp.add_bidirectional(rim, sea);

        let mut stream = Graph::new();
        compute_stream_tree(&rp, &mut stream).unwrap();

        assert!(stream.node(pit).out_edges().is_empty());
        assert!(stream.node(sea).out_edges().is_empty());
        assert_eq!(stream.edge(stream.node(rim).out_edges()[0]).to, sea);
    }

    #[test]
    fn isolated_land_node_is_fatal() {
        let mut rp = Graph::new();
        rp.insert(node(0.0, 0.0, 0.5, 1.0));
        let mut stream = Graph::new();
        assert!(matches!(
            compute_stream_tree(&rp, &mut stream),
            Err(GenerateError::IsolatedNode { .. })
        ));
    }

    #[test]
    fn stream_covers_every_planar_node() {
        let mut rp = Graph::new();
        let a = rp.insert(node(0.0, 0.0, 0.5, 4.0));
        let b = rp.insert(node(1.0, 0.0, 0.5, 3.0));
        let c = rp.insert(node(2.0, 0.0, -1.0, 0.0));
        rp.add_bidirectional(a, b);
        rp.add_bidirectional(b, c);

        let mut stream = Graph::new();
        compute_stream_tree(&rp, &mut stream).unwrap();
        assert_eq!(stream.node_count(), rp.node_count());
        for (id, n) in rp.nodes() {
            assert_eq!(stream.find(&n.coord), Some(id));
        }
    }
}

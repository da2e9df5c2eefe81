//! Error types for terrain generation.

use thiserror::Error;

/// Errors surfaced by graph construction and the simulation step.
///
/// All of these are fatal to the step that raised them; the degenerate
/// no-sea-lake case is recovered internally and never surfaces here.
#[derive(Debug, Clone, Error)]
pub enum GenerateError {
    /// A land node in the planar graph has no outbound edges, so no stream
    /// can leave it.
    #[error("isolated node in planar graph at ({x}, {y}): no outbound edges")]
    IsolatedNode { x: f64, y: f64 },

    /// A land node in the stream tree does not have exactly one downstream
    /// neighbor.
    #[error("stream node at ({x}, {y}) has {count} downstream edges, expected exactly one")]
    DownstreamCount { x: f64, y: f64, count: usize },

    /// The height update reached a node before its downstream neighbor was
    /// updated, which would break the implicit integration.
    #[error("node at ({x}, {y}) reached before its downstream neighbor was updated")]
    DownstreamNotReady { x: f64, y: f64 },

    /// A chosen lake outlet is missing its far-side saddle node.
    #[error("lake outlet from sink at ({x}, {y}) is missing its far-side saddle node")]
    MissingSaddle { x: f64, y: f64 },

    /// The stream tree has no sinks at all; nothing can drain.
    #[error("no sinks found in stream tree graph")]
    NoSinks,

    /// The triangulation backend rejected the sample set.
    #[error("triangulation failed: {0}")]
    Triangulation(String),
}

//! Traversal engine: bounded walks from the root producing a [`RawGraph`].

pub mod raw;
pub mod walker;

pub use raw::{RawEdge, RawEdgeKind, RawGraph, RawNode, TraversalPath, WalkDirection};
pub use walker::{traverse, Relation, WalkOptions};

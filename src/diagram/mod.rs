//! Diagram assembly: turns raw traversal results into finished diagram
//! graphs, one assembler per diagram kind.

pub mod call;
pub mod flow;
pub mod render;
pub mod structure;
pub mod types;
pub mod validate;

pub use types::{
    DiagramEdge, DiagramEdgeKind, DiagramGraph, DiagramKind, DiagramNode, DiagramNodeKind,
    FieldLine, NodeDetail, NodeId, NodeSource,
};
pub use validate::validate;

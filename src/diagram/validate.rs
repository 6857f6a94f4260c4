//! Structural checks run on every finished diagram before it is returned.
//!
//! A failure here is a defect in the engine, never a user error, so it is
//! reported as [`TrellisError::InvariantViolation`] and not recovered.

use std::collections::{HashMap, HashSet};

use crate::error::{Result, TrellisError};

use super::types::{DiagramGraph, DiagramKind, NodeId, NodeSource};

/// Check node identity, source sets and edge endpoints.
///
/// Flow diagrams may show one method in several nodes (one per marker), so
/// their source sets are not required to be disjoint.
pub fn validate(graph: &DiagramGraph) -> Result<()> {
    let mut ids: HashSet<&NodeId> = HashSet::with_capacity(graph.nodes.len());
    let mut owners: HashMap<&NodeSource, &NodeId> = HashMap::new();

    for node in &graph.nodes {
        if !ids.insert(&node.id) {
            return Err(violation(graph, format!("duplicate node id '{}'", node.id)));
        }
        if node.sources.is_empty() {
            return Err(violation(graph, format!("node '{}' has no sources", node.id)));
        }
        if graph.kind == DiagramKind::Flow {
            continue;
        }
        for source in &node.sources {
            if let Some(other) = owners.insert(source, &node.id) {
                if other != &node.id {
                    return Err(violation(
                        graph,
                        format!("nodes '{}' and '{}' share a source", other, node.id),
                    ));
                }
            }
        }
    }

    for edge in &graph.edges {
        for end in [&edge.from, &edge.to] {
            if !ids.contains(end) {
                return Err(violation(
                    graph,
                    format!("edge {} -> {} references missing node '{}'", edge.from, edge.to, end),
                ));
            }
        }
    }
    Ok(())
}

fn violation(graph: &DiagramGraph, message: String) -> TrellisError {
    TrellisError::InvariantViolation(format!("{} diagram '{}': {}", graph.kind, graph.name, message))
}

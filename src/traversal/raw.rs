//! The raw graph: what a traversal reached, before aggregation.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::model::{EntityId, SourcePosition};

/// A node reached by the walk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum RawNode {
    Entity(EntityId),
    /// A reference the model could not resolve. Never expanded.
    External(EntityId),
}

impl RawNode {
    pub fn id(&self) -> &EntityId {
        match self {
            RawNode::Entity(id) | RawNode::External(id) => id,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, RawNode::External(_))
    }
}

impl fmt::Display for RawNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawNode::Entity(id) => write!(f, "{}", id),
            RawNode::External(id) => write!(f, "external {}", id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawEdgeKind {
    /// Caller -> callee.
    Call,
    /// Declaring class -> field type.
    FieldType,
    /// Subtype -> supertype.
    Inheritance,
}

impl fmt::Display for RawEdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawEdgeKind::Call => write!(f, "call"),
            RawEdgeKind::FieldType => write!(f, "field_type"),
            RawEdgeKind::Inheritance => write!(f, "inheritance"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEdge {
    pub from: RawNode,
    pub to: RawNode,
    pub kind: RawEdgeKind,
    /// Call site, or the field declaration for field edges.
    pub position: SourcePosition,
    /// Order in which the walk first met this edge.
    pub encounter: usize,
    /// The field behind a field edge.
    pub via: Option<EntityId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkDirection {
    Forward,
    Backward,
}

impl fmt::Display for WalkDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalkDirection::Forward => write!(f, "forward"),
            WalkDirection::Backward => write!(f, "backward"),
        }
    }
}

/// One root-to-leaf path of a walk. `edges[i]` links `nodes[i]` and
/// `nodes[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalPath {
    pub direction: WalkDirection,
    pub nodes: Vec<RawNode>,
    pub edges: Vec<usize>,
}

type EdgeKey = (RawNode, RawNode, RawEdgeKind, SourcePosition);

/// Nodes and edges reached from one or more roots.
#[derive(Debug, Clone, Default)]
pub struct RawGraph {
    pub roots: Vec<RawNode>,
    pub nodes: Vec<RawNode>,
    pub edges: Vec<RawEdge>,
    pub paths: Vec<TraversalPath>,
    node_index: HashSet<RawNode>,
    edge_index: HashMap<EdgeKey, usize>,
}

impl RawGraph {
    pub fn new(roots: Vec<RawNode>) -> Self {
        let mut graph = Self::default();
        for root in &roots {
            graph.add_node(root.clone());
        }
        graph.roots = roots;
        graph
    }

    pub fn contains(&self, node: &RawNode) -> bool {
        self.node_index.contains(node)
    }

    pub fn is_root(&self, node: &RawNode) -> bool {
        self.roots.contains(node)
    }

    /// Add a node unless present. Returns whether it was new.
    pub fn add_node(&mut self, node: RawNode) -> bool {
        if self.node_index.insert(node.clone()) {
            self.nodes.push(node);
            true
        } else {
            false
        }
    }

    /// Add an edge, deduplicated by (from, to, kind, position). Returns the
    /// index of the stored edge.
    pub fn add_edge(
        &mut self,
        from: RawNode,
        to: RawNode,
        kind: RawEdgeKind,
        position: SourcePosition,
        via: Option<EntityId>,
    ) -> usize {
        let key = (from.clone(), to.clone(), kind, position);
        if let Some(&idx) = self.edge_index.get(&key) {
            return idx;
        }
        let idx = self.edges.len();
        self.edges.push(RawEdge {
            from,
            to,
            kind,
            position,
            encounter: idx,
            via,
        });
        self.edge_index.insert(key, idx);
        idx
    }

    pub fn outgoing<'g>(&'g self, node: &'g RawNode) -> impl Iterator<Item = &'g RawEdge> + 'g {
        self.edges.iter().filter(move |e| &e.from == node)
    }

    pub fn incoming<'g>(&'g self, node: &'g RawNode) -> impl Iterator<Item = &'g RawEdge> + 'g {
        self.edges.iter().filter(move |e| &e.to == node)
    }

    /// Keep only the given nodes (roots always stay) and edges. Edge
    /// indices in paths are remapped; paths are cut at the first dropped
    /// step.
    pub fn retain(&mut self, keep_nodes: &HashSet<RawNode>, keep_edges: &HashSet<usize>) {
        let roots = self.roots.clone();
        let mut kept = RawGraph::new(roots);

        for node in &self.nodes {
            if keep_nodes.contains(node) {
                kept.add_node(node.clone());
            }
        }

        let mut remap: HashMap<usize, usize> = HashMap::new();
        for (idx, edge) in self.edges.iter().enumerate() {
            if keep_edges.contains(&idx) && kept.contains(&edge.from) && kept.contains(&edge.to) {
                let new_idx = kept.add_edge(
                    edge.from.clone(),
                    edge.to.clone(),
                    edge.kind,
                    edge.position,
                    edge.via.clone(),
                );
                kept.edges[new_idx].encounter = edge.encounter;
                remap.insert(idx, new_idx);
            }
        }

        for path in &self.paths {
            let steps = path
                .edges
                .iter()
                .take_while(|e| remap.contains_key(e))
                .count();
            if steps == 0 {
                continue;
            }
            kept.paths.push(TraversalPath {
                direction: path.direction,
                nodes: path.nodes[..=steps].to_vec(),
                edges: path.edges[..steps].iter().map(|e| remap[e]).collect(),
            });
        }

        *self = kept;
    }
}

impl fmt::Display for RawGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} roots, {} nodes, {} edges, {} paths",
            self.roots.len(),
            self.nodes.len(),
            self.edges.len(),
            self.paths.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> RawNode {
        RawNode::Entity(EntityId::new(id))
    }

    #[test]
    fn test_edges_deduplicate_by_site() {
        let mut graph = RawGraph::new(vec![node("a")]);
        graph.add_node(node("b"));
        let first = graph.add_edge(node("a"), node("b"), RawEdgeKind::Call, SourcePosition::new(3, 0), None);
        let again = graph.add_edge(node("a"), node("b"), RawEdgeKind::Call, SourcePosition::new(3, 0), None);
        let other = graph.add_edge(node("a"), node("b"), RawEdgeKind::Call, SourcePosition::new(4, 0), None);
        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.edges[other].encounter, 1);
    }

    #[test]
    fn test_retain_remaps_paths() {
        let mut graph = RawGraph::new(vec![node("a")]);
        graph.add_node(node("b"));
        graph.add_node(node("c"));
        let ab = graph.add_edge(node("a"), node("b"), RawEdgeKind::Call, SourcePosition::new(1, 0), None);
        let bc = graph.add_edge(node("b"), node("c"), RawEdgeKind::Call, SourcePosition::new(2, 0), None);
        graph.paths.push(TraversalPath {
            direction: WalkDirection::Forward,
            nodes: vec![node("a"), node("b"), node("c")],
            edges: vec![ab, bc],
        });

        let keep_nodes: HashSet<RawNode> = [node("a"), node("b")].into_iter().collect();
        let keep_edges: HashSet<usize> = [ab].into_iter().collect();
        graph.retain(&keep_nodes, &keep_edges);

        assert_eq!(graph.nodes, vec![node("a"), node("b")]);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.paths[0].nodes, vec![node("a"), node("b")]);
        assert_eq!(graph.paths[0].edges, vec![0]);
    }
}

//! Aggregation: collapse raw nodes into diagram nodes and merge parallel
//! edges.
//!
//! Every raw node maps to exactly one diagram node. Grouped modes drop
//! edges that start and end inside the same group; parallel edges between
//! two diagram nodes merge into one that remembers its call sites.

use std::collections::HashMap;
use tracing::debug;

use crate::classify::{Classifier, Layer};
use crate::config::Aggregation;
use crate::diagram::{DiagramNode, DiagramNodeKind, NodeDetail, NodeId, NodeSource};
use crate::model::{package_of_qualified, simple_name_of, CodeEntity, CodeModel, EntityKind, SourcePosition};
use crate::traversal::{RawEdgeKind, RawGraph, RawNode};

/// What grouping needs besides the raw graph.
pub struct AggregationContext<'a> {
    pub model: &'a dyn CodeModel,
    pub classifier: &'a dyn Classifier,
    pub package_levels: usize,
}

/// Parallel raw edges merged into one.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: RawEdgeKind,
    /// Indices into the raw graph's edges, in encounter order.
    pub raw_edges: Vec<usize>,
    /// Sorted call sites of the underlying edges.
    pub call_sites: Vec<SourcePosition>,
    pub first_position: SourcePosition,
    pub first_encounter: usize,
}

impl MergedEdge {
    pub fn call_count(&self) -> usize {
        self.raw_edges.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AggregatedGraph {
    /// Nodes in order of first appearance in the raw graph.
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<MergedEdge>,
    /// Raw node -> the diagram node it collapsed into.
    pub mapping: HashMap<RawNode, NodeId>,
    /// Edges dropped because both ends fell into one group.
    pub internal_edges: usize,
}

impl AggregatedGraph {
    pub fn node(&self, id: &NodeId) -> Option<&DiagramNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }
}

/// Where a raw node goes.
struct Group {
    id: NodeId,
    label: String,
    kind: DiagramNodeKind,
    cluster: Vec<String>,
    layer: Option<Layer>,
}

pub fn aggregate(raw: &RawGraph, mode: Aggregation, ctx: &AggregationContext<'_>) -> AggregatedGraph {
    let mut out = AggregatedGraph::default();
    let mut index: HashMap<NodeId, usize> = HashMap::new();

    // Phase 1: nodes
    for node in &raw.nodes {
        let group = group_of(node, mode, ctx);
        let source = match node {
            RawNode::Entity(id) => NodeSource::Entity(id.clone()),
            RawNode::External(id) => NodeSource::External(id.clone()),
        };
        let is_root = raw.is_root(node);

        match index.get(&group.id) {
            Some(&idx) => {
                let existing = &mut out.nodes[idx];
                existing.sources.push(source);
                existing.is_root |= is_root;
            }
            None => {
                index.insert(group.id.clone(), out.nodes.len());
                out.nodes.push(DiagramNode {
                    id: group.id.clone(),
                    label: group.label,
                    kind: group.kind,
                    sources: vec![source],
                    detail: NodeDetail::Plain,
                    cluster: group.cluster,
                    layer: group.layer,
                    is_root,
                });
            }
        }
        out.mapping.insert(node.clone(), group.id);
    }

    // Phase 2: edges
    let mut merged: HashMap<(NodeId, NodeId, RawEdgeKind), usize> = HashMap::new();
    for (idx, edge) in raw.edges.iter().enumerate() {
        let (Some(from), Some(to)) = (out.mapping.get(&edge.from), out.mapping.get(&edge.to)) else {
            continue;
        };
        if mode != Aggregation::None && from == to {
            out.internal_edges += 1;
            continue;
        }

        let key = (from.clone(), to.clone(), edge.kind);
        match merged.get(&key) {
            Some(&m) => {
                let target = &mut out.edges[m];
                target.raw_edges.push(idx);
                target.call_sites.push(edge.position);
                if (edge.position, edge.encounter) < (target.first_position, target.first_encounter) {
                    target.first_position = edge.position;
                    target.first_encounter = edge.encounter;
                }
            }
            None => {
                merged.insert(key, out.edges.len());
                out.edges.push(MergedEdge {
                    from: from.clone(),
                    to: to.clone(),
                    kind: edge.kind,
                    raw_edges: vec![idx],
                    call_sites: vec![edge.position],
                    first_position: edge.position,
                    first_encounter: edge.encounter,
                });
            }
        }
    }
    for edge in &mut out.edges {
        edge.call_sites.sort();
    }

    debug!(
        mode = %mode,
        raw_nodes = raw.nodes.len(),
        nodes = out.nodes.len(),
        edges = out.edges.len(),
        internal = out.internal_edges,
        "aggregated"
    );
    out
}

// ─── Grouping ───────────────────────────────────────────────────

fn group_of(node: &RawNode, mode: Aggregation, ctx: &AggregationContext<'_>) -> Group {
    let entity = match node {
        RawNode::Entity(id) => ctx.model.entity(id),
        RawNode::External(_) => None,
    };
    match entity {
        Some(entity) => entity_group(entity, mode, ctx),
        None => external_group(node, mode, ctx),
    }
}

fn entity_group(entity: &CodeEntity, mode: Aggregation, ctx: &AggregationContext<'_>) -> Group {
    let class = ctx.model.owner_class(&entity.id).unwrap_or(entity);
    let path = ctx.classifier.diagram_path(class.package(), ctx.package_levels);

    match mode {
        Aggregation::None => Group {
            id: NodeId::new(entity.id.as_str()),
            label: entity.name.clone(),
            kind: node_kind_of(entity),
            cluster: segments(&path),
            layer: ctx.classifier.layer_of(class),
        },
        Aggregation::GroupByClass => class_group(class, &path, ctx.classifier.layer_of(class)),
        Aggregation::GroupByPackage => package_group(&path),
        Aggregation::GroupByComponent => match ctx.classifier.component_of(class) {
            Some(tag) => Group {
                id: NodeId::new(format!("component:{}", tag)),
                label: tag,
                kind: DiagramNodeKind::Component,
                cluster: Vec::new(),
                layer: None,
            },
            None => package_group(&path),
        },
    }
}

/// Unresolved references group by their textual class or package part.
fn external_group(node: &RawNode, mode: Aggregation, ctx: &AggregationContext<'_>) -> Group {
    let reference = node.id();
    let class = reference.class_part();
    match mode {
        Aggregation::None => Group {
            id: NodeId::new(format!("external:{}", reference)),
            label: match reference.member_part() {
                Some(member) => format!("{}.{}", simple_name_of(class), member),
                None => simple_name_of(class).to_string(),
            },
            kind: DiagramNodeKind::External,
            cluster: Vec::new(),
            layer: None,
        },
        Aggregation::GroupByClass => Group {
            id: NodeId::new(format!("external:{}", class)),
            label: simple_name_of(class).to_string(),
            kind: DiagramNodeKind::External,
            cluster: Vec::new(),
            layer: None,
        },
        Aggregation::GroupByPackage | Aggregation::GroupByComponent => {
            let path = ctx
                .classifier
                .diagram_path(package_of_qualified(class), ctx.package_levels);
            package_group(&path)
        }
    }
}

fn class_group(class: &CodeEntity, path: &str, layer: Option<Layer>) -> Group {
    Group {
        id: NodeId::new(class.id.as_str()),
        label: class.name.clone(),
        kind: node_kind_of(class),
        cluster: segments(path),
        layer,
    }
}

fn package_group(path: &str) -> Group {
    let label = if path.is_empty() {
        "(default)".to_string()
    } else {
        path.to_string()
    };
    Group {
        id: NodeId::new(format!("package:{}", path)),
        label,
        kind: DiagramNodeKind::Package,
        cluster: Vec::new(),
        layer: None,
    }
}

fn node_kind_of(entity: &CodeEntity) -> DiagramNodeKind {
    match entity.kind {
        EntityKind::Class | EntityKind::Field => DiagramNodeKind::Class,
        EntityKind::Interface => DiagramNodeKind::Interface,
        EntityKind::Enum => DiagramNodeKind::Enum,
        EntityKind::Method | EntityKind::Constructor => DiagramNodeKind::Method,
    }
}

fn segments(path: &str) -> Vec<String> {
    path.split('.')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

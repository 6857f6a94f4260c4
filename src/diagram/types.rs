//! Output types of diagram generation.
//!
//! A [`DiagramGraph`] is a plain, renderer-neutral graph: labelled nodes,
//! typed edges and the warnings collected while building it. It serializes
//! to JSON as-is.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::classify::Layer;
use crate::error::Warning;
use crate::model::EntityId;

/// The three diagram kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagramKind {
    Call,
    Structure,
    Flow,
}

impl DiagramKind {
    pub const ALL: [DiagramKind; 3] = [DiagramKind::Call, DiagramKind::Structure, DiagramKind::Flow];
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagramKind::Call => write!(f, "call"),
            DiagramKind::Structure => write!(f, "structure"),
            DiagramKind::Flow => write!(f, "flow"),
        }
    }
}

/// Identifier of a node, unique within one diagram.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── Nodes ──────────────────────────────────────────────────────

/// What a diagram node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagramNodeKind {
    Method,
    Class,
    Interface,
    Enum,
    Package,
    Component,
    /// A reference the model could not resolve.
    External,
    FlowTerminal,
    FlowAction,
    FlowCondition,
}

impl fmt::Display for DiagramNodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagramNodeKind::Method => write!(f, "method"),
            DiagramNodeKind::Class => write!(f, "class"),
            DiagramNodeKind::Interface => write!(f, "interface"),
            DiagramNodeKind::Enum => write!(f, "enum"),
            DiagramNodeKind::Package => write!(f, "package"),
            DiagramNodeKind::Component => write!(f, "component"),
            DiagramNodeKind::External => write!(f, "external"),
            DiagramNodeKind::FlowTerminal => write!(f, "flow_terminal"),
            DiagramNodeKind::FlowAction => write!(f, "flow_action"),
            DiagramNodeKind::FlowCondition => write!(f, "flow_condition"),
        }
    }
}

/// One thing a diagram node was built from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum NodeSource {
    Entity(EntityId),
    External(EntityId),
    /// A flow condition, identified by its label.
    FlowCondition(String),
}

/// A rendered field line of a type node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldLine {
    pub visibility: char,
    pub name: String,
    #[serde(rename = "type")]
    pub type_display: String,
    pub cardinality: Option<String>,
}

impl fmt::Display for FieldLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}: {}", self.visibility, self.name, self.type_display)?;
        if let Some(cardinality) = &self.cardinality {
            write!(f, " {}", cardinality)?;
        }
        Ok(())
    }
}

/// Kind-specific payload of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "detail", rename_all = "snake_case")]
pub enum NodeDetail {
    #[default]
    Plain,
    Method {
        signature: String,
    },
    Type {
        /// `(C)`, `(I)` or `(E)`.
        symbol: String,
        generics: Vec<String>,
        fields: Vec<FieldLine>,
        methods: Vec<String>,
    },
    /// A package or component: the classes it groups.
    Group {
        members: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramNode {
    pub id: NodeId,
    pub label: String,
    pub kind: DiagramNodeKind,
    /// Never empty, and disjoint from every other node's sources.
    pub sources: Vec<NodeSource>,
    pub detail: NodeDetail,
    /// Package path segments, for renderers that draw package frames.
    pub cluster: Vec<String>,
    /// Architectural layer of the class behind a method or class node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<Layer>,
    pub is_root: bool,
}

// ─── Edges ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagramEdgeKind {
    Call,
    FieldType,
    Inheritance,
    Flow,
}

impl fmt::Display for DiagramEdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagramEdgeKind::Call => write!(f, "call"),
            DiagramEdgeKind::FieldType => write!(f, "field_type"),
            DiagramEdgeKind::Inheritance => write!(f, "inheritance"),
            DiagramEdgeKind::Flow => write!(f, "flow"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: DiagramEdgeKind,
    /// Number of underlying raw edges.
    pub call_count: usize,
    /// Position in the call order of the source node, when numbered.
    pub order: Option<u32>,
    pub label: Option<String>,
    pub dashed: bool,
}

impl DiagramEdge {
    pub fn new(from: NodeId, to: NodeId, kind: DiagramEdgeKind) -> Self {
        Self {
            from,
            to,
            kind,
            call_count: 1,
            order: None,
            label: None,
            dashed: false,
        }
    }
}

// ─── Graph ──────────────────────────────────────────────────────

/// A finished diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramGraph {
    pub kind: DiagramKind,
    pub name: String,
    pub root: EntityId,
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<DiagramEdge>,
    pub warnings: Vec<Warning>,
}

impl DiagramGraph {
    pub fn node(&self, id: &NodeId) -> Option<&DiagramNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn node_by_label(&self, label: &str) -> Option<&DiagramNode> {
        self.nodes.iter().find(|n| n.label == label)
    }

    pub fn root_node(&self) -> Option<&DiagramNode> {
        self.nodes.iter().find(|n| n.is_root)
    }

    /// Edges leaving `id`, in diagram order.
    pub fn outgoing<'g>(&'g self, id: &'g NodeId) -> impl Iterator<Item = &'g DiagramEdge> + 'g {
        self.edges.iter().filter(move |e| &e.from == id)
    }

    pub fn incoming<'g>(&'g self, id: &'g NodeId) -> impl Iterator<Item = &'g DiagramEdge> + 'g {
        self.edges.iter().filter(move |e| &e.to == id)
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for DiagramGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} diagram '{}': {} nodes, {} edges, {} warnings",
            self.kind,
            self.name,
            self.nodes.len(),
            self.edges.len(),
            self.warnings.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display_and_serde() {
        assert_eq!(DiagramKind::Structure.to_string(), "structure");
        assert_eq!(
            serde_json::to_string(&DiagramEdgeKind::FieldType).unwrap(),
            "\"field_type\""
        );
    }

    #[test]
    fn test_node_source_serialization() {
        let source = NodeSource::External(EntityId::new("java.util.List#add(Object)"));
        let json = serde_json::to_string(&source).unwrap();
        assert_eq!(json, r#"{"type":"external","id":"java.util.List#add(Object)"}"#);
        let back: NodeSource = serde_json::from_str(&json).unwrap();
        assert_eq!(back, source);
    }

    #[test]
    fn test_field_line_display() {
        let line = FieldLine {
            visibility: '-',
            name: "lines".to_string(),
            type_display: "List<OrderLine>".to_string(),
            cardinality: Some("[1..10]".to_string()),
        };
        assert_eq!(line.to_string(), "-lines: List<OrderLine> [1..10]");
    }
}

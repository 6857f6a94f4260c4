//! In-memory code model backed by petgraph.
//!
//! Entities are graph nodes; containment, calls and inheritance are edges.
//! Calls to ids the model does not know are kept aside so the engine can
//! render them as external stubs.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use tracing::debug;

use super::facade::CodeModel;
use super::types::{CallEdge, CodeEntity, EntityId, SourcePosition};

/// The kind of a relationship between two model entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelEdgeKind {
    /// A type declares a member (Class -> Method/Field).
    Contains,
    /// A method calls another method (Method -> Method).
    Calls,
    /// A type extends or implements another type (Class -> Supertype).
    Inherits,
}

impl fmt::Display for ModelEdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelEdgeKind::Contains => write!(f, "contains"),
            ModelEdgeKind::Calls => write!(f, "calls"),
            ModelEdgeKind::Inherits => write!(f, "inherits"),
        }
    }
}

/// Data stored on a model edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModelEdge {
    pub kind: ModelEdgeKind,
    /// Call site for `Calls`, declaration position otherwise.
    pub position: SourcePosition,
}

impl ModelEdge {
    pub fn new(kind: ModelEdgeKind, position: SourcePosition) -> Self {
        Self { kind, position }
    }
}

/// The bundled [`CodeModel`] implementation.
pub struct InMemoryCodeModel {
    /// The directed graph storing entities and relationships.
    graph: DiGraph<CodeEntity, ModelEdge>,
    /// Index: entity id -> node index.
    id_index: HashMap<EntityId, NodeIndex>,
    /// Index: `<class>#<method name>` -> overloads, for calls given without
    /// a parameter list.
    member_index: HashMap<String, Vec<NodeIndex>>,
    /// Calls whose callee is not in the model, keyed by caller.
    unresolved_calls: HashMap<EntityId, Vec<CallEdge>>,
}

impl InMemoryCodeModel {
    /// Create a new empty model.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            id_index: HashMap::new(),
            member_index: HashMap::new(),
            unresolved_calls: HashMap::new(),
        }
    }

    // ─── Node Operations ────────────────────────────────────────

    /// Add an entity. Members are linked to their owner when it is already
    /// present. Re-adding an id replaces the stored entity.
    pub fn add_entity(&mut self, entity: CodeEntity) -> NodeIndex {
        if let Some(&idx) = self.id_index.get(&entity.id) {
            self.graph[idx] = entity;
            return idx;
        }

        let id = entity.id.clone();
        let owner = entity.owner.clone();
        let callable = entity.kind.is_callable();
        let member_key = format!("{}#{}", id.class_part(), entity.name);
        let position = entity.position;

        let idx = self.graph.add_node(entity);
        self.id_index.insert(id, idx);

        if callable {
            self.member_index.entry(member_key).or_default().push(idx);
        }
        if let Some(owner_idx) = owner.and_then(|o| self.id_index.get(&o).copied()) {
            self.add_edge(
                owner_idx,
                idx,
                ModelEdge::new(ModelEdgeKind::Contains, position),
            );
        }
        idx
    }

    // ─── Edge Operations ────────────────────────────────────────

    /// Add an edge between two nodes.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, edge: ModelEdge) {
        self.graph.add_edge(from, to, edge);
    }

    /// Record a call. Callees given as `<class>#<name>` without parameters
    /// resolve to the first overload; anything else unknown is kept as an
    /// unresolved call.
    pub fn add_call(&mut self, caller: &EntityId, callee: &EntityId, position: SourcePosition) {
        let Some(&caller_idx) = self.id_index.get(caller) else {
            debug!(caller = %caller, "dropping call from unknown caller");
            return;
        };

        let callee_idx = self.id_index.get(callee).copied().or_else(|| {
            if callee.as_str().contains('(') {
                return None;
            }
            self.member_index
                .get(callee.as_str())
                .and_then(|overloads| overloads.first().copied())
        });

        match callee_idx {
            Some(callee_idx) => self.add_edge(
                caller_idx,
                callee_idx,
                ModelEdge::new(ModelEdgeKind::Calls, position),
            ),
            None => self
                .unresolved_calls
                .entry(caller.clone())
                .or_default()
                .push(CallEdge {
                    caller: caller.clone(),
                    callee: callee.clone(),
                    position,
                }),
        }
    }

    /// Record that `child` extends or implements `parent`. Unknown parents
    /// are ignored; the child still lists them in `parents`.
    pub fn add_inheritance(&mut self, child: &EntityId, parent: &EntityId) {
        if let (Some(&child_idx), Some(&parent_idx)) =
            (self.id_index.get(child), self.id_index.get(parent))
        {
            let position = self.graph[child_idx].position;
            self.add_edge(
                child_idx,
                parent_idx,
                ModelEdge::new(ModelEdgeKind::Inherits, position),
            );
        }
    }

    // ─── Query Operations ───────────────────────────────────────

    /// Find a method of `class` by name, or by `name(Type,...)` signature.
    pub fn find_method(&self, class: &EntityId, name_or_signature: &str) -> Option<&CodeEntity> {
        let methods = self.methods_of(class);
        if name_or_signature.contains('(') {
            let wanted = format!("{}#{}", class, name_or_signature);
            return methods.into_iter().find(|m| m.id.as_str() == wanted);
        }
        methods.into_iter().find(|m| m.name == name_or_signature)
    }

    // ─── Stats ──────────────────────────────────────────────────

    /// Get model statistics.
    pub fn stats(&self) -> ModelStats {
        let mut stats = ModelStats::default();
        for entity in self.graph.node_weights() {
            if entity.kind.is_type() {
                stats.class_count += 1;
            } else if entity.kind.is_callable() {
                stats.method_count += 1;
            } else {
                stats.field_count += 1;
            }
        }
        stats.call_count = self
            .graph
            .edge_weights()
            .filter(|e| e.kind == ModelEdgeKind::Calls)
            .count();
        stats.unresolved_call_count = self.unresolved_calls.values().map(Vec::len).sum();
        stats
    }

    // ─── Internal Helpers ───────────────────────────────────────

    fn members_of(&self, class: &EntityId, keep: impl Fn(&CodeEntity) -> bool) -> Vec<&CodeEntity> {
        let Some(&idx) = self.id_index.get(class) else {
            return Vec::new();
        };
        let mut members: Vec<&CodeEntity> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .filter(|e| e.weight().kind == ModelEdgeKind::Contains)
            .map(|e| &self.graph[e.target()])
            .filter(|m| keep(m))
            .collect();
        members.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
        members
    }

    fn neighbours(&self, idx: NodeIndex, kind: ModelEdgeKind, dir: Direction) -> Vec<NodeIndex> {
        let mut found: Vec<NodeIndex> = self
            .graph
            .edges_directed(idx, dir)
            .filter(|e| e.weight().kind == kind)
            .map(|e| match dir {
                Direction::Outgoing => e.target(),
                Direction::Incoming => e.source(),
            })
            .collect();
        found.sort_by(|a, b| self.graph[*a].id.cmp(&self.graph[*b].id));
        found.dedup();
        found
    }
}

impl Default for InMemoryCodeModel {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeModel for InMemoryCodeModel {
    fn entity(&self, id: &EntityId) -> Option<&CodeEntity> {
        self.id_index.get(id).map(|&idx| &self.graph[idx])
    }

    fn resolve_class(&self, qualified_name: &str) -> Option<&CodeEntity> {
        self.entity(&EntityId::new(qualified_name))
            .filter(|e| e.kind.is_type())
    }

    fn classes(&self) -> Vec<&CodeEntity> {
        let mut classes: Vec<&CodeEntity> = self
            .graph
            .node_weights()
            .filter(|e| e.kind.is_type())
            .collect();
        classes.sort_by(|a, b| a.id.cmp(&b.id));
        classes
    }

    fn methods_of(&self, class: &EntityId) -> Vec<&CodeEntity> {
        self.members_of(class, |m| m.kind.is_callable())
    }

    fn fields_of(&self, class: &EntityId) -> Vec<&CodeEntity> {
        self.members_of(class, |m| !m.kind.is_callable() && !m.kind.is_type())
    }

    fn call_targets_of(&self, method: &EntityId) -> Vec<CallEdge> {
        let Some(&idx) = self.id_index.get(method) else {
            return Vec::new();
        };
        let mut calls: Vec<CallEdge> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .filter(|e| e.weight().kind == ModelEdgeKind::Calls)
            .map(|e| CallEdge {
                caller: method.clone(),
                callee: self.graph[e.target()].id.clone(),
                position: e.weight().position,
            })
            .collect();
        if let Some(unresolved) = self.unresolved_calls.get(method) {
            calls.extend(unresolved.iter().cloned());
        }
        calls.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| a.callee.cmp(&b.callee))
        });
        calls
    }

    fn callers_of(&self, method: &EntityId) -> Vec<CallEdge> {
        let Some(&idx) = self.id_index.get(method) else {
            return Vec::new();
        };
        let mut calls: Vec<CallEdge> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .filter(|e| e.weight().kind == ModelEdgeKind::Calls)
            .map(|e| CallEdge {
                caller: self.graph[e.source()].id.clone(),
                callee: method.clone(),
                position: e.weight().position,
            })
            .collect();
        calls.sort_by(|a, b| {
            a.caller
                .cmp(&b.caller)
                .then_with(|| a.position.cmp(&b.position))
        });
        calls
    }

    fn ancestors_of(&self, class: &EntityId) -> Vec<&CodeEntity> {
        let Some(&start) = self.id_index.get(class) else {
            return Vec::new();
        };
        let mut visited: HashSet<NodeIndex> = HashSet::from([start]);
        let mut queue: VecDeque<NodeIndex> = VecDeque::from([start]);
        let mut ancestors = Vec::new();

        while let Some(idx) = queue.pop_front() {
            for parent in self.neighbours(idx, ModelEdgeKind::Inherits, Direction::Outgoing) {
                if visited.insert(parent) {
                    ancestors.push(&self.graph[parent]);
                    queue.push_back(parent);
                }
            }
        }
        ancestors
    }

    fn subtypes_of(&self, class: &EntityId) -> Vec<&CodeEntity> {
        let Some(&idx) = self.id_index.get(class) else {
            return Vec::new();
        };
        self.neighbours(idx, ModelEdgeKind::Inherits, Direction::Incoming)
            .into_iter()
            .map(|i| &self.graph[i])
            .collect()
    }

    fn field_referrers_of(&self, class: &EntityId) -> Vec<&CodeEntity> {
        let mut fields: Vec<&CodeEntity> = self
            .graph
            .node_weights()
            .filter(|e| {
                e.field_type
                    .as_ref()
                    .is_some_and(|t| t.targets.contains(class))
            })
            .collect();
        fields.sort_by(|a, b| a.id.cmp(&b.id));
        fields
    }
}

// ─── Query Result Types ─────────────────────────────────────────

/// Statistics about the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelStats {
    pub class_count: usize,
    pub method_count: usize,
    pub field_count: usize,
    pub call_count: usize,
    pub unresolved_call_count: usize,
}

impl fmt::Display for ModelStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} classes, {} methods, {} fields, {} calls ({} unresolved)",
            self.class_count,
            self.method_count,
            self.field_count,
            self.call_count,
            self.unresolved_call_count
        )
    }
}

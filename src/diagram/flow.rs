//! Flow diagrams: a walk through method bodies in call order, driven by
//! flow markers.
//!
//! The walk keeps a list of open tails, the nodes the next step links from,
//! each with the branch label the link will carry. Methods without markers
//! are transparent: the walk passes through them into their callees.
//!
//! Conditions work on sibling calls. A callee carrying a condition marker
//! with a `branch` opens that condition (linking the current tails into it)
//! and runs from it along the branch. Following siblings of the same
//! condition add more branches, and the ends of all branches become the
//! tails once the condition closes. With an `alternative_branch` the branch
//! body is a dead end and the walk continues from the condition along the
//! alternative.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::cancel::Cancellable;
use crate::error::Result;
use crate::filter::{RestrictionFilter, TraversalFilter};
use crate::model::{CodeEntity, CodeModel, EntityId, FlowMarker};

use super::types::{
    DiagramEdge, DiagramEdgeKind, DiagramNode, DiagramNodeKind, NodeDetail, NodeId, NodeSource,
};

/// A node the next step links from, with the label of that link.
type Tail = (usize, Option<String>);

/// A method entered with these tails and this much depth left.
type VisitKey = (EntityId, Vec<Tail>, usize);

struct OpenCondition {
    node: usize,
    ends: Vec<Tail>,
}

struct FlowBuilder<'a> {
    model: &'a dyn CodeModel,
    restriction: &'a RestrictionFilter<'a>,
    traversal: &'a TraversalFilter<'a>,
    cancel: &'a dyn Cancellable,
    nodes: Vec<DiagramNode>,
    by_label: HashMap<String, usize>,
    edges: Vec<DiagramEdge>,
    edge_keys: HashSet<(usize, usize, Option<String>)>,
    /// Tails each visit produced. Node and edge creation is idempotent, so
    /// repeating a visit only has to repeat its result.
    visited: HashMap<VisitKey, Vec<Tail>>,
    /// Callees skipped because they were already on the path. A visit that
    /// skipped one depends on its path and is not remembered.
    path_cuts: usize,
}

/// Build a flow diagram starting at each of `roots`, following calls at
/// most `max_depth` levels deep.
pub fn assemble(
    model: &dyn CodeModel,
    restriction: &RestrictionFilter<'_>,
    traversal: &TraversalFilter<'_>,
    roots: &[EntityId],
    max_depth: usize,
    cancel: &dyn Cancellable,
) -> Result<(Vec<DiagramNode>, Vec<DiagramEdge>)> {
    let mut builder = FlowBuilder {
        model,
        restriction,
        traversal,
        cancel,
        nodes: Vec::new(),
        by_label: HashMap::new(),
        edges: Vec::new(),
        edge_keys: HashSet::new(),
        visited: HashMap::new(),
        path_cuts: 0,
    };

    for root in roots {
        let Some(method) = model.entity(root) else {
            continue;
        };
        let mut path = vec![root.clone()];
        builder.visit_method(method, Vec::new(), max_depth, &mut path, true)?;
    }

    debug!(
        roots = roots.len(),
        nodes = builder.nodes.len(),
        edges = builder.edges.len(),
        "flow assembled"
    );
    Ok((builder.nodes, builder.edges))
}

impl FlowBuilder<'_> {
    /// Emit the method's own markers, then walk its body. Returns the tails
    /// the caller continues from.
    fn visit_method(
        &mut self,
        method: &CodeEntity,
        tails: Vec<Tail>,
        depth_left: usize,
        path: &mut Vec<EntityId>,
        is_root: bool,
    ) -> Result<Vec<Tail>> {
        self.cancel.check("flow")?;
        if is_root {
            return self.expand_method(method, tails, depth_left, path, true);
        }

        let key = (method.id.clone(), tails, depth_left);
        if let Some(done) = self.visited.get(&key) {
            return Ok(done.clone());
        }
        let cuts = self.path_cuts;
        let ends = self.expand_method(method, key.1.clone(), depth_left, path, false)?;
        if self.path_cuts == cuts {
            self.visited.insert(key, ends.clone());
        }
        Ok(ends)
    }

    fn expand_method(
        &mut self,
        method: &CodeEntity,
        mut tails: Vec<Tail>,
        depth_left: usize,
        path: &mut Vec<EntityId>,
        is_root: bool,
    ) -> Result<Vec<Tail>> {
        if let Some(site) = self.model.flow_site_of(&method.id) {
            let before = tails.clone();
            for marker in &site.markers {
                let (label, kind) = match marker {
                    FlowMarker::Condition {
                        label,
                        branch: None,
                        ..
                    } => (label, DiagramNodeKind::FlowCondition),
                    FlowMarker::Action { label } => (label, DiagramNodeKind::FlowAction),
                    FlowMarker::Terminal { label } => (label, DiagramNodeKind::FlowTerminal),
                    _ => continue,
                };
                let idx = if kind == DiagramNodeKind::FlowCondition {
                    let idx = self.node(label, kind, NodeSource::FlowCondition(label.clone()), is_root);
                    self.add_source(idx, NodeSource::Entity(method.id.clone()));
                    idx
                } else {
                    self.node(label, kind, NodeSource::Entity(method.id.clone()), is_root)
                };
                self.link(&tails, idx);
                tails = vec![(idx, None)];
            }
            // Stop: the marked steps above are a dead end and nothing below
            // is expanded.
            if site.is_stop() {
                return Ok(before);
            }
        }

        if depth_left == 0 {
            return Ok(tails);
        }
        self.visit_body(method, tails, depth_left, path)
    }

    fn visit_body(
        &mut self,
        method: &CodeEntity,
        mut tails: Vec<Tail>,
        depth_left: usize,
        path: &mut Vec<EntityId>,
    ) -> Result<Vec<Tail>> {
        let model = self.model;
        let mut open: Option<OpenCondition> = None;

        for call in model.call_targets_of(&method.id) {
            // Unresolved callees carry no markers.
            let Some(callee) = model.entity(&call.callee) else {
                continue;
            };
            if path.contains(&callee.id) {
                self.path_cuts += 1;
                continue;
            }
            if !self.restriction.is_visible(callee) || !self.traversal.allows(callee) {
                continue;
            }

            let branch = model.flow_site_of(&callee.id).and_then(|site| {
                site.branch_condition().map(|(label, branch, alternative)| {
                    (label.to_string(), branch.to_string(), alternative.map(str::to_string))
                })
            });

            path.push(callee.id.clone());
            match branch {
                Some((label, branch, alternative)) => {
                    let condition = self.node(
                        &label,
                        DiagramNodeKind::FlowCondition,
                        NodeSource::FlowCondition(label.clone()),
                        false,
                    );
                    if !open.as_ref().is_some_and(|o| o.node == condition) {
                        if let Some(closed) = open.take() {
                            tails = closed.ends;
                        }
                        self.link(&tails, condition);
                        open = Some(OpenCondition {
                            node: condition,
                            ends: Vec::new(),
                        });
                    }

                    let start = vec![(condition, Some(branch))];
                    let ends = self.visit_method(callee, start, depth_left - 1, path, false)?;
                    match alternative {
                        Some(alternative) => {
                            open = None;
                            tails = vec![(condition, Some(alternative))];
                        }
                        None => {
                            if let Some(o) = open.as_mut() {
                                o.ends.extend(ends);
                            }
                        }
                    }
                }
                None => {
                    if let Some(closed) = open.take() {
                        tails = closed.ends;
                    }
                    tails = self.visit_method(callee, tails, depth_left - 1, path, false)?;
                }
            }
            path.pop();
        }

        if let Some(closed) = open {
            tails = closed.ends;
        }
        Ok(tails)
    }

    // ─── Graph Building ─────────────────────────────────────────

    /// The node labelled `label`, created on first use.
    fn node(&mut self, label: &str, kind: DiagramNodeKind, source: NodeSource, is_root: bool) -> usize {
        if let Some(&idx) = self.by_label.get(label) {
            self.add_source(idx, source);
            self.nodes[idx].is_root |= is_root;
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(DiagramNode {
            id: NodeId::new(format!("flow:{}", label)),
            label: label.to_string(),
            kind,
            sources: vec![source],
            detail: NodeDetail::Plain,
            cluster: Vec::new(),
            layer: None,
            is_root,
        });
        self.by_label.insert(label.to_string(), idx);
        idx
    }

    fn add_source(&mut self, idx: usize, source: NodeSource) {
        let sources = &mut self.nodes[idx].sources;
        if !sources.contains(&source) {
            sources.push(source);
        }
    }

    fn link(&mut self, tails: &[Tail], to: usize) {
        for (from, label) in tails {
            if *from == to || !self.edge_keys.insert((*from, to, label.clone())) {
                continue;
            }
            let mut edge = DiagramEdge::new(
                self.nodes[*from].id.clone(),
                self.nodes[to].id.clone(),
                DiagramEdgeKind::Flow,
            );
            edge.label = label.clone();
            self.edges.push(edge);
        }
    }
}

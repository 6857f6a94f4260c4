//! Bounded depth-first walks from the diagram roots.
//!
//! Each root is walked forward and backward up to the configured depth.
//! A candidate must pass the restriction filter and the traversal filter
//! before it enters the graph; the walk never re-enters a node that is
//! already on the current path, so cycles terminate while diamonds keep
//! both branches.
//!
//! A node is expanded once per direction and depth: reaching it again with
//! no more depth left records the edge but does not walk its subtree again.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::cancel::Cancellable;
use crate::error::{Result, Warning};
use crate::filter::{RestrictionFilter, TraversalFilter};
use crate::model::{CodeModel, EntityId, SourcePosition};

use super::raw::{RawEdgeKind, RawGraph, RawNode, TraversalPath, WalkDirection};

/// Which relationships the walk follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Method calls: callees forward, callers backward.
    Calls,
    /// Type relationships: field types and supertypes forward, field
    /// referrers backward, subtypes both ways.
    Types,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    pub relation: Relation,
    pub forward_depth: usize,
    pub backward_depth: usize,
}

/// A possible next step, with the edge it would add.
struct Candidate {
    node: RawNode,
    from: RawNode,
    to: RawNode,
    kind: RawEdgeKind,
    position: SourcePosition,
    via: Option<EntityId>,
}

struct Walker<'w, 'm> {
    model: &'m dyn CodeModel,
    restriction: &'w RestrictionFilter<'m>,
    traversal: &'w TraversalFilter<'m>,
    options: WalkOptions,
    cancel: &'w dyn Cancellable,
    graph: RawGraph,
    /// Largest depth each node was expanded with, per direction.
    expanded: HashMap<(WalkDirection, EntityId), usize>,
    reported: HashSet<EntityId>,
    warnings: &'w mut Vec<Warning>,
}

/// Walk from `roots` and return everything reached.
///
/// Roots are always part of the graph, whatever the filters say.
pub fn traverse(
    model: &dyn CodeModel,
    roots: &[EntityId],
    restriction: &RestrictionFilter<'_>,
    traversal: &TraversalFilter<'_>,
    options: WalkOptions,
    cancel: &dyn Cancellable,
    warnings: &mut Vec<Warning>,
) -> Result<RawGraph> {
    let root_nodes: Vec<RawNode> = roots.iter().cloned().map(RawNode::Entity).collect();
    debug!(
        roots = root_nodes.len(),
        forward = options.forward_depth,
        backward = options.backward_depth,
        relation = ?options.relation,
        "starting traversal"
    );

    let mut walker = Walker {
        model,
        restriction,
        traversal,
        options,
        cancel,
        graph: RawGraph::new(root_nodes.clone()),
        expanded: HashMap::new(),
        reported: HashSet::new(),
        warnings,
    };

    for root in root_nodes {
        for (direction, depth) in [
            (WalkDirection::Forward, options.forward_depth),
            (WalkDirection::Backward, options.backward_depth),
        ] {
            if depth == 0 {
                continue;
            }
            let mut path = vec![root.clone()];
            let mut path_edges = Vec::new();
            walker.walk(direction, depth, &mut path, &mut path_edges)?;
        }
    }

    if traversal.only_entry_points() {
        walker.trim_to_entry_points();
    }

    debug!(graph = %walker.graph, "traversal finished");
    Ok(walker.graph)
}

impl Walker<'_, '_> {
    fn walk(
        &mut self,
        direction: WalkDirection,
        depth_left: usize,
        path: &mut Vec<RawNode>,
        path_edges: &mut Vec<usize>,
    ) -> Result<()> {
        self.cancel.check("traversal")?;

        let current = match path.last() {
            Some(RawNode::Entity(id)) => id.clone(),
            _ => return Ok(()),
        };
        if depth_left == 0 {
            self.record(direction, path, path_edges);
            return Ok(());
        }
        let seen = self.expanded.entry((direction, current.clone())).or_insert(0);
        *seen = (*seen).max(depth_left);

        let mut extended = false;
        for candidate in self.candidates(&current, direction) {
            if !self.accepts(&candidate.node) {
                continue;
            }
            let on_path = path.contains(&candidate.node);
            if self.graph.add_node(candidate.node.clone()) {
                if let RawNode::External(reference) = &candidate.node {
                    self.report_external(&current, reference);
                }
            }
            let edge = self.graph.add_edge(
                candidate.from,
                candidate.to,
                candidate.kind,
                candidate.position,
                candidate.via,
            );
            if on_path {
                continue;
            }

            extended = true;
            path.push(candidate.node.clone());
            path_edges.push(edge);
            match &candidate.node {
                RawNode::Entity(id) if !self.needs_expansion(direction, id, depth_left - 1) => {
                    self.record(direction, path, path_edges)
                }
                RawNode::Entity(_) => self.walk(direction, depth_left - 1, path, path_edges)?,
                RawNode::External(_) => self.record(direction, path, path_edges),
            }
            path.pop();
            path_edges.pop();
        }

        if !extended {
            self.record(direction, path, path_edges);
        }
        Ok(())
    }

    /// Whether walking `id` with `depth_left` can reach anything an
    /// earlier expansion did not.
    fn needs_expansion(&self, direction: WalkDirection, id: &EntityId, depth_left: usize) -> bool {
        depth_left > 0
            && self
                .expanded
                .get(&(direction, id.clone()))
                .map_or(true, |&done| done < depth_left)
    }

    fn record(&mut self, direction: WalkDirection, path: &[RawNode], path_edges: &[usize]) {
        if path_edges.is_empty() {
            return;
        }
        self.graph.paths.push(TraversalPath {
            direction,
            nodes: path.to_vec(),
            edges: path_edges.to_vec(),
        });
    }

    fn accepts(&self, node: &RawNode) -> bool {
        if self.graph.is_root(node) {
            return true;
        }
        match node {
            RawNode::Entity(id) => self
                .model
                .entity(id)
                .is_some_and(|e| self.restriction.is_visible(e) && self.traversal.allows(e)),
            RawNode::External(id) => {
                self.restriction.is_external_visible(id) && self.traversal.allows_external(id)
            }
        }
    }

    fn report_external(&mut self, from: &EntityId, reference: &EntityId) {
        if self.reported.insert(reference.clone()) {
            debug!(from = %from, reference = %reference, "unresolved reference");
            self.warnings.push(Warning::unresolved(format!(
                "{} references {}, which is not in the model",
                from, reference
            )));
        }
    }

    // ─── Candidates ─────────────────────────────────────────────

    /// Next steps from `current`, sorted by source position, then id.
    fn candidates(&mut self, current: &EntityId, direction: WalkDirection) -> Vec<Candidate> {
        let here = RawNode::Entity(current.clone());
        let mut found: Vec<Candidate> = match (self.options.relation, direction) {
            (Relation::Calls, WalkDirection::Forward) => self
                .model
                .call_targets_of(current)
                .into_iter()
                .map(|call| {
                    let node = if self.model.entity(&call.callee).is_some() {
                        RawNode::Entity(call.callee)
                    } else {
                        RawNode::External(call.callee)
                    };
                    Candidate {
                        from: here.clone(),
                        to: node.clone(),
                        node,
                        kind: RawEdgeKind::Call,
                        position: call.position,
                        via: None,
                    }
                })
                .collect(),
            (Relation::Calls, WalkDirection::Backward) => self
                .model
                .callers_of(current)
                .into_iter()
                .map(|call| {
                    let node = RawNode::Entity(call.caller);
                    Candidate {
                        from: node.clone(),
                        to: here.clone(),
                        node,
                        kind: RawEdgeKind::Call,
                        position: call.position,
                        via: None,
                    }
                })
                .collect(),
            (Relation::Types, WalkDirection::Forward) => {
                let mut found = self.field_types(current, &here);
                found.extend(self.hierarchy(current, &here));
                found
            }
            (Relation::Types, WalkDirection::Backward) => {
                let mut found = self.field_referrers(current, &here);
                found.extend(self.hierarchy(current, &here));
                found
            }
        };
        found.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| a.node.cmp(&b.node))
        });
        found
    }

    /// Field types the model cannot resolve are reported, never walked.
    fn field_types(&mut self, class: &EntityId, here: &RawNode) -> Vec<Candidate> {
        let model = self.model;
        let mut found = Vec::new();
        for field in model.fields_of(class) {
            if !self.restriction.is_visible(field) {
                continue;
            }
            let Some(field_type) = &field.field_type else {
                continue;
            };
            for target in &field_type.targets {
                if model.entity(target).is_none() {
                    self.report_external(&field.id, target);
                    continue;
                }
                let node = RawNode::Entity(target.clone());
                found.push(Candidate {
                    from: here.clone(),
                    to: node.clone(),
                    node,
                    kind: RawEdgeKind::FieldType,
                    position: field.position,
                    via: Some(field.id.clone()),
                });
            }
        }
        found
    }

    fn field_referrers(&self, class: &EntityId, here: &RawNode) -> Vec<Candidate> {
        let mut found = Vec::new();
        for field in self.model.field_referrers_of(class) {
            let Some(owner) = &field.owner else {
                continue;
            };
            if !self.restriction.is_visible(field) {
                continue;
            }
            let node = RawNode::Entity(owner.clone());
            found.push(Candidate {
                from: node.clone(),
                to: here.clone(),
                node,
                kind: RawEdgeKind::FieldType,
                position: field.position,
                via: Some(field.id.clone()),
            });
        }
        found
    }

    /// Direct supertypes and subtypes. Edges always point at the supertype.
    fn hierarchy(&self, class: &EntityId, here: &RawNode) -> Vec<Candidate> {
        let Some(entity) = self.model.entity(class) else {
            return Vec::new();
        };
        let mut found = Vec::new();
        for parent in &entity.parents {
            if self.model.entity(parent).is_none() {
                continue;
            }
            let node = RawNode::Entity(parent.clone());
            found.push(Candidate {
                from: here.clone(),
                to: node.clone(),
                node,
                kind: RawEdgeKind::Inheritance,
                position: entity.position,
                via: None,
            });
        }
        for sub in self.model.subtypes_of(class) {
            let node = RawNode::Entity(sub.id.clone());
            found.push(Candidate {
                from: node.clone(),
                to: here.clone(),
                node,
                kind: RawEdgeKind::Inheritance,
                position: sub.position,
                via: None,
            });
        }
        found
    }

    // ─── Entry Points ───────────────────────────────────────────

    /// Keep the steps that lead to an entry point. A step leads there when
    /// its target is an entry point or any walked step continues from it to
    /// one. Roots count as entry points.
    fn trim_to_entry_points(&mut self) {
        let mut leads: HashSet<(WalkDirection, RawNode)> = HashSet::new();
        let mut previous: HashMap<(WalkDirection, RawNode), Vec<RawNode>> = HashMap::new();
        let mut pending = Vec::new();

        for path in &self.graph.paths {
            for (i, node) in path.nodes.iter().enumerate() {
                let key = (path.direction, node.clone());
                if (self.graph.is_root(node) || self.is_entry_point(node)) && leads.insert(key.clone()) {
                    pending.push(key.clone());
                }
                if i > 0 {
                    previous.entry(key).or_default().push(path.nodes[i - 1].clone());
                }
            }
        }
        while let Some((direction, node)) = pending.pop() {
            for prior in previous.get(&(direction, node)).into_iter().flatten() {
                let key = (direction, prior.clone());
                if leads.insert(key.clone()) {
                    pending.push(key);
                }
            }
        }

        let mut keep_nodes: HashSet<RawNode> = self.graph.roots.iter().cloned().collect();
        let mut keep_edges: HashSet<usize> = HashSet::new();
        for path in &self.graph.paths {
            for i in 1..path.nodes.len() {
                if leads.contains(&(path.direction, path.nodes[i].clone())) {
                    keep_nodes.insert(path.nodes[i].clone());
                    keep_edges.insert(path.edges[i - 1]);
                }
            }
        }

        let before = self.graph.nodes.len();
        self.graph.retain(&keep_nodes, &keep_edges);
        debug!(
            before,
            after = self.graph.nodes.len(),
            "trimmed to entry-point paths"
        );
    }

    fn is_entry_point(&self, node: &RawNode) -> bool {
        match node {
            RawNode::Entity(id) => self
                .model
                .entity(id)
                .is_some_and(|e| self.traversal.is_entry_point(e)),
            RawNode::External(_) => false,
        }
    }
}

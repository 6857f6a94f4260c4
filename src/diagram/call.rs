//! Call diagrams: methods reached through calls, aggregated and decorated
//! with signatures and call order.

use std::collections::HashMap;

use crate::aggregate::{aggregate, AggregatedGraph, AggregationContext};
use crate::classify::Classifier;
use crate::config::{CallDiagramDetails, EdgeMode};
use crate::model::{CodeEntity, CodeModel, SourcePosition};
use crate::traversal::RawGraph;

use super::render::{group_members, method_label, method_signature, type_detail, SignatureOptions};
use super::types::{
    DiagramEdge, DiagramEdgeKind, DiagramNode, DiagramNodeKind, NodeDetail, NodeId, NodeSource,
};

/// Build the nodes and edges of a call diagram from a raw call graph.
pub fn assemble(
    model: &dyn CodeModel,
    classifier: &dyn Classifier,
    raw: &RawGraph,
    details: &CallDiagramDetails,
) -> (Vec<DiagramNode>, Vec<DiagramEdge>) {
    let ctx = AggregationContext {
        model,
        classifier,
        package_levels: details.show_package_levels,
    };
    let aggregated = aggregate(raw, details.aggregation, &ctx);
    let options = SignatureOptions {
        parameter_names: details.show_method_parameter_names,
        parameter_types: details.show_method_parameter_types,
        return_type: details.show_method_return_type,
    };

    let nodes = aggregated
        .nodes
        .iter()
        .cloned()
        .map(|node| decorate(model, node, details, options))
        .collect();
    let edges = edges_of(raw, &aggregated, details);
    (nodes, edges)
}

// ─── Nodes ──────────────────────────────────────────────────────

fn decorate(
    model: &dyn CodeModel,
    mut node: DiagramNode,
    details: &CallDiagramDetails,
    options: SignatureOptions,
) -> DiagramNode {
    let entities: Vec<&CodeEntity> = node
        .sources
        .iter()
        .filter_map(|s| match s {
            NodeSource::Entity(id) => model.entity(id),
            _ => None,
        })
        .collect();

    match node.kind {
        DiagramNodeKind::Method => {
            if let Some(method) = entities.first() {
                node.label = method_label(method, options);
                node.detail = NodeDetail::Method {
                    signature: method_signature(method, options),
                };
            }
        }
        DiagramNodeKind::Class | DiagramNodeKind::Interface | DiagramNodeKind::Enum => {
            let class = entities
                .first()
                .and_then(|e| model.owner_class(&e.id));
            let methods: Vec<&CodeEntity> = entities
                .iter()
                .copied()
                .filter(|e| e.kind.is_callable())
                .collect();
            node.detail = match class {
                Some(class) if details.show_detailed_class_structure => {
                    type_detail(model, class, &[], &methods, options)
                }
                _ => NodeDetail::Group {
                    members: methods.iter().map(|m| m.name.clone()).collect(),
                },
            };
        }
        DiagramNodeKind::Package | DiagramNodeKind::Component => {
            node.detail = NodeDetail::Group {
                members: group_members(model, &node.sources),
            };
        }
        DiagramNodeKind::External
        | DiagramNodeKind::FlowTerminal
        | DiagramNodeKind::FlowAction
        | DiagramNodeKind::FlowCondition => {}
    }
    node
}

// ─── Edges ──────────────────────────────────────────────────────

/// A diagram edge with the key it is numbered by.
struct Pending {
    edge: DiagramEdge,
    position: SourcePosition,
    encounter: usize,
}

fn edges_of(raw: &RawGraph, aggregated: &AggregatedGraph, details: &CallDiagramDetails) -> Vec<DiagramEdge> {
    let is_external = |id: &NodeId| {
        aggregated
            .node(id)
            .is_some_and(|n| n.kind == DiagramNodeKind::External)
    };

    let mut pending: Vec<Pending> = Vec::new();
    for merged in &aggregated.edges {
        let mut base = DiagramEdge::new(merged.from.clone(), merged.to.clone(), DiagramEdgeKind::Call);
        base.dashed = is_external(&merged.to);

        match details.edge_mode {
            EdgeMode::Direct | EdgeMode::Merged => {
                base.call_count = merged.call_count();
                if details.edge_mode == EdgeMode::Merged {
                    base.label = Some(format!("calls = {}", merged.call_count()));
                }
                pending.push(Pending {
                    edge: base,
                    position: merged.first_position,
                    encounter: merged.first_encounter,
                });
            }
            EdgeMode::Ordered => {
                for &idx in &merged.raw_edges {
                    let site = &raw.edges[idx];
                    pending.push(Pending {
                        edge: base.clone(),
                        position: site.position,
                        encounter: site.encounter,
                    });
                }
            }
        }
    }

    if details.show_call_order || details.edge_mode == EdgeMode::Ordered {
        number_by_source(&mut pending);
    }
    pending.into_iter().map(|p| p.edge).collect()
}

/// Number the outgoing edges of every source node 1, 2, ... in call order.
fn number_by_source(pending: &mut [Pending]) {
    let mut by_source: HashMap<NodeId, Vec<usize>> = HashMap::new();
    for (i, p) in pending.iter().enumerate() {
        by_source.entry(p.edge.from.clone()).or_default().push(i);
    }
    for indices in by_source.values_mut() {
        indices.sort_by_key(|&i| (pending[i].position, pending[i].encounter));
        for (n, &i) in indices.iter().enumerate() {
            pending[i].edge.order = Some(n as u32 + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ProjectClassification;
    use crate::config::Aggregation;
    use crate::model::fixtures::layered_model;
    use crate::model::EntityId;
    use crate::traversal::{RawEdgeKind, RawNode};

    const PLACE_ORDER: &str = "shop.service.OrderService#placeOrder(Order)";
    const AUDIT: &str = "shop.service.OrderService#audit(String)";
    const SAVE: &str = "shop.dataaccess.OrderRepository#save(Order)";
    const LOGGER: &str = "java.util.logging.Logger#info(String)";

    fn entity(id: &str) -> RawNode {
        RawNode::Entity(EntityId::new(id))
    }

    /// placeOrder calls save at 12 and 15, audit at 11, Logger.info at 13.
    fn raw_graph() -> RawGraph {
        let mut raw = RawGraph::new(vec![entity(PLACE_ORDER)]);
        raw.add_node(entity(SAVE));
        raw.add_node(entity(AUDIT));
        raw.add_node(RawNode::External(EntityId::new(LOGGER)));
        for (to, line) in [
            (entity(SAVE), 15),
            (entity(SAVE), 12),
            (entity(AUDIT), 11),
            (RawNode::External(EntityId::new(LOGGER)), 13),
        ] {
            raw.add_edge(entity(PLACE_ORDER), to, RawEdgeKind::Call, SourcePosition::new(line, 0), None);
        }
        raw
    }

    fn run(details: &CallDiagramDetails) -> (Vec<DiagramNode>, Vec<DiagramEdge>) {
        let model = layered_model();
        let classification = ProjectClassification::default().compile(&mut Vec::new());
        assemble(&model, &classification, &raw_graph(), details)
    }

    fn targets(edges: &[DiagramEdge]) -> Vec<(&str, Option<u32>)> {
        edges.iter().map(|e| (e.to.as_str(), e.order)).collect()
    }

    #[test]
    fn test_direct_edges_with_call_order() {
        let details = CallDiagramDetails::default()
            .aggregation(Aggregation::None)
            .edge_mode(EdgeMode::Direct)
            .show_call_order(true);
        let (nodes, edges) = run(&details);

        assert_eq!(nodes.len(), 4);
        assert_eq!(
            targets(&edges),
            vec![
                (SAVE, Some(2)),
                (AUDIT, Some(1)),
                ("external:java.util.logging.Logger#info(String)", Some(3)),
            ]
        );
        assert_eq!(edges[0].call_count, 2);
        assert!(edges[2].dashed);
    }

    #[test]
    fn test_ordered_edges_per_call_site() {
        let details = CallDiagramDetails::default()
            .aggregation(Aggregation::None)
            .edge_mode(EdgeMode::Ordered)
            .show_call_order(false);
        let (_, edges) = run(&details);

        assert_eq!(edges.len(), 4);
        let mut orders: Vec<(&str, u32)> = edges
            .iter()
            .map(|e| (e.to.as_str(), e.order.unwrap()))
            .collect();
        orders.sort_by_key(|&(_, n)| n);
        assert_eq!(orders[0], (AUDIT, 1));
        assert_eq!(orders[1], (SAVE, 2));
        assert_eq!(orders[3], (SAVE, 4));
    }

    #[test]
    fn test_merged_edges_are_labelled() {
        let details = CallDiagramDetails::default()
            .aggregation(Aggregation::None)
            .edge_mode(EdgeMode::Merged)
            .show_call_order(false);
        let (_, edges) = run(&details);
        assert_eq!(edges[0].label.as_deref(), Some("calls = 2"));
        assert!(edges.iter().all(|e| e.order.is_none()));
    }

    #[test]
    fn test_method_labels_follow_details() {
        let details = CallDiagramDetails::default()
            .aggregation(Aggregation::None)
            .show_method_parameter_types(true);
        let (nodes, _) = run(&details);
        let root = nodes.iter().find(|n| n.is_root).unwrap();
        assert_eq!(root.label, "placeOrder(Order)");
        assert_eq!(
            root.detail,
            NodeDetail::Method {
                signature: "+ placeOrder(Order)".to_string()
            }
        );
    }

    #[test]
    fn test_class_nodes() {
        let details = CallDiagramDetails::default().aggregation(Aggregation::GroupByClass);
        let (nodes, edges) = run(&details);
        let service = &nodes[0];
        assert_eq!(service.label, "OrderService");
        assert_eq!(
            service.detail,
            NodeDetail::Group {
                members: vec!["placeOrder".to_string(), "audit".to_string()]
            }
        );
        assert!(edges.iter().all(|e| e.from != e.to));

        let detailed = details.show_detailed_class_structure(true);
        let (nodes, _) = run(&detailed);
        match &nodes[0].detail {
            NodeDetail::Type { symbol, methods, .. } => {
                assert_eq!(symbol, "(C)");
                assert_eq!(methods, &vec!["+ placeOrder()".to_string(), "- audit()".to_string()]);
            }
            other => panic!("unexpected detail {:?}", other),
        }
    }
}

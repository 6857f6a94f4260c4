//! Structure diagrams: types connected by fields and inheritance.

use std::collections::BTreeSet;

use crate::aggregate::{aggregate, AggregationContext, MergedEdge};
use crate::classify::Classifier;
use crate::config::StructureDiagramDetails;
use crate::filter::RestrictionFilter;
use crate::model::{CodeEntity, CodeModel};
use crate::traversal::{RawEdgeKind, RawGraph};

use super::render::{cardinality, class_label, group_members, type_detail, SignatureOptions};
use super::types::{
    DiagramEdge, DiagramEdgeKind, DiagramNode, DiagramNodeKind, NodeDetail, NodeSource,
};

/// Build the nodes and edges of a structure diagram from a raw type graph.
///
/// Members listed inside type nodes go through the restriction filter, so
/// cut getters or constructors stay hidden there too.
pub fn assemble(
    model: &dyn CodeModel,
    classifier: &dyn Classifier,
    restriction: &RestrictionFilter<'_>,
    raw: &RawGraph,
    details: &StructureDiagramDetails,
) -> (Vec<DiagramNode>, Vec<DiagramEdge>) {
    let ctx = AggregationContext {
        model,
        classifier,
        package_levels: details.show_package_levels,
    };
    let aggregated = aggregate(raw, details.aggregation, &ctx);

    let nodes: Vec<DiagramNode> = aggregated
        .nodes
        .iter()
        .cloned()
        .map(|node| decorate(model, restriction, node, details))
        .collect();

    let edges = aggregated
        .edges
        .iter()
        .map(|merged| {
            let source_kind = nodes.iter().find(|n| n.id == merged.from).map(|n| n.kind);
            let target_kind = nodes.iter().find(|n| n.id == merged.to).map(|n| n.kind);
            edge_of(model, raw, merged, source_kind, target_kind)
        })
        .collect();
    (nodes, edges)
}

fn decorate(
    model: &dyn CodeModel,
    restriction: &RestrictionFilter<'_>,
    mut node: DiagramNode,
    details: &StructureDiagramDetails,
) -> DiagramNode {
    match node.kind {
        DiagramNodeKind::Class | DiagramNodeKind::Interface | DiagramNodeKind::Enum => {
            let class = node.sources.iter().find_map(|s| match s {
                NodeSource::Entity(id) => model.owner_class(id),
                _ => None,
            });
            if let Some(class) = class {
                node.label = class_label(class, details.show_class_generic_types);
                node.detail = class_detail(model, restriction, class, details);
            }
        }
        DiagramNodeKind::Package | DiagramNodeKind::Component => {
            node.detail = NodeDetail::Group {
                members: group_members(model, &node.sources),
            };
        }
        _ => {}
    }
    node
}

fn class_detail(
    model: &dyn CodeModel,
    restriction: &RestrictionFilter<'_>,
    class: &CodeEntity,
    details: &StructureDiagramDetails,
) -> NodeDetail {
    let options = SignatureOptions {
        parameter_names: details.show_method_parameter_names,
        parameter_types: details.show_method_parameter_types,
        return_type: details.show_method_return_type,
    };

    let (fields, methods) = if details.show_detailed_class_structure {
        let mut fields: Vec<&CodeEntity> = model
            .fields_of(&class.id)
            .into_iter()
            .filter(|f| restriction.is_visible(f))
            .collect();
        fields.sort_by(|a, b| a.name.cmp(&b.name));

        let methods: Vec<&CodeEntity> = if details.show_methods || class.is_interface() {
            model
                .methods_of(&class.id)
                .into_iter()
                .filter(|m| restriction.is_visible(m))
                .collect()
        } else {
            Vec::new()
        };
        (fields, methods)
    } else {
        (Vec::new(), Vec::new())
    };

    let mut detail = type_detail(model, class, &fields, &methods, options);
    if !details.show_class_generic_types {
        if let NodeDetail::Type { generics, .. } = &mut detail {
            generics.clear();
        }
    }
    detail
}

fn edge_of(
    model: &dyn CodeModel,
    raw: &RawGraph,
    merged: &MergedEdge,
    source_kind: Option<DiagramNodeKind>,
    target_kind: Option<DiagramNodeKind>,
) -> DiagramEdge {
    let kind = match merged.kind {
        RawEdgeKind::FieldType => DiagramEdgeKind::FieldType,
        RawEdgeKind::Inheritance => DiagramEdgeKind::Inheritance,
        RawEdgeKind::Call => DiagramEdgeKind::Call,
    };
    let mut edge = DiagramEdge::new(merged.from.clone(), merged.to.clone(), kind);
    edge.call_count = merged.call_count();

    match merged.kind {
        RawEdgeKind::FieldType => {
            let labels: BTreeSet<String> = merged
                .raw_edges
                .iter()
                .filter_map(|&idx| raw.edges[idx].via.as_ref())
                .filter_map(|via| model.entity(via))
                .map(|field| format!("{} {}", field.name, cardinality(model, field)))
                .collect();
            if !labels.is_empty() {
                edge.label = Some(labels.into_iter().collect::<Vec<_>>().join(", "));
            }
        }
        RawEdgeKind::Inheritance => {
            // A class implementing an interface.
            edge.dashed = target_kind == Some(DiagramNodeKind::Interface)
                && source_kind != Some(DiagramNodeKind::Interface);
        }
        RawEdgeKind::Call => {}
    }
    edge
}

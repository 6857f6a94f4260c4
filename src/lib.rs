//! # Trellis
//!
//! Call, structure and flow diagram graphs from a static code model.
//!
//! Trellis reads classes, methods, calls and annotations through the
//! [`CodeModel`] trait, walks them from a root under user-tunable
//! restriction and traversal rules, and returns a renderer-neutral
//! [`DiagramGraph`].
//!
//! ## Pipeline
//!
//! - **Restriction**: which entities may appear at all
//! - **Traversal**: bounded walks forward and backward from the root
//! - **Aggregation**: methods into classes, packages or components
//! - **Assembly**: signatures, cardinalities, call order, flow branches
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use trellis::{generate, CancellationToken, DiagramKind, DiagramRequest, InMemoryCodeModel};
//! use trellis::{Limits, ModelSnapshot, ProjectClassification};
//! use std::path::Path;
//!
//! let snapshot = ModelSnapshot::load(Path::new("model.json")).unwrap();
//! let model = InMemoryCodeModel::from_snapshot(&snapshot);
//! let classification = ProjectClassification::default().compile(&mut Vec::new());
//!
//! let request = DiagramRequest::with_preset("com.acme.OrderService#placeOrder", DiagramKind::Call);
//! let graph = generate(&model, &classification, &request, &Limits::default(), &CancellationToken::new()).unwrap();
//! println!("{}", graph.to_json().unwrap());
//! ```

pub mod aggregate;
pub mod cancel;
pub mod classify;
pub mod config;
pub mod diagram;
pub mod error;
pub mod filter;
pub mod generate;
pub mod model;
pub mod traversal;

// Re-exports for convenience
pub use error::{Result, TrellisError, Warning, WarningKind};

pub use cancel::{Cancellable, CancellationToken};
pub use classify::{Classifier, CompiledClassification, ProjectClassification};
pub use config::{
    Aggregation, CallConfiguration, DiagramConfiguration, EdgeMode, FlowConfiguration,
    GraphRestriction, GraphTraversal, Limits, Settings, StructureConfiguration,
};
pub use diagram::{DiagramEdge, DiagramEdgeKind, DiagramGraph, DiagramKind, DiagramNode, DiagramNodeKind};
pub use generate::{
    generate, generate_call_diagrams, generate_flow_diagrams, resolve_root, DiagramRequest,
};
pub use model::{CodeEntity, CodeModel, EntityId, InMemoryCodeModel, ModelSnapshot};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiagramConfig;
    use crate::filter::RestrictionFilter;
    use crate::model::fixtures::{flow_service_model, layered_model};
    use crate::model::{ClassSnapshot, EntityKind, MethodSnapshot};
    use pretty_assertions::assert_eq;

    fn classification() -> CompiledClassification {
        ProjectClassification::default().compile(&mut Vec::new())
    }

    fn run(model: &dyn CodeModel, root: &str, configuration: DiagramConfiguration) -> DiagramGraph {
        let request = DiagramRequest::new(root, configuration);
        generate(
            model,
            &classification(),
            &request,
            &Limits::default(),
            &CancellationToken::new(),
        )
        .unwrap()
    }

    /// A call configuration that shows every method on its own.
    fn plain_calls(forward: i64, backward: i64) -> CallConfiguration {
        let mut config = CallConfiguration::preset();
        config.graph_restriction = GraphRestriction::permissive();
        config.graph_traversal = GraphTraversal::default()
            .forward_depth(forward)
            .backward_depth(backward)
            .hide_interface_calls(false)
            .hide_private_methods(false);
        config.details = config.details.aggregation(Aggregation::None);
        config
    }

    fn labels(graph: &DiagramGraph) -> Vec<&str> {
        graph.nodes.iter().map(|n| n.label.as_str()).collect()
    }

    #[test]
    fn test_forward_depth_one_stops_after_one_hop() {
        // submit -> placeOrder -> audit
        let model = layered_model();
        let graph = run(
            &model,
            "shop.api.OrderFacade#submit",
            DiagramConfiguration::Call(plain_calls(1, 0)),
        );
        assert_eq!(labels(&graph), vec!["submit()", "placeOrder()"]);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].from.as_str(), "shop.api.OrderFacade#submit(Order)");
    }

    #[test]
    fn test_cut_tests_removes_test_classes() {
        let model = layered_model();
        let root = "shop.service.OrderService#placeOrder";

        let mut config = plain_calls(0, 1);
        config.graph_restriction = config.graph_restriction.cut_tests(true);
        let graph = run(&model, root, DiagramConfiguration::Call(config.clone()));
        assert_eq!(labels(&graph), vec!["placeOrder()", "submit()"]);

        config.graph_restriction = config.graph_restriction.cut_tests(false);
        let graph = run(&model, root, DiagramConfiguration::Call(config));
        // Callers follow call-site order: the test calls at line 9, the facade at 11.
        assert_eq!(labels(&graph), vec!["placeOrder()", "testPlaceOrder()", "submit()"]);
    }

    #[test]
    fn test_group_by_class_drops_self_calls() {
        let class = ClassSnapshot::new("a.C", EntityKind::Class)
            .method(MethodSnapshot::new("m1", 1).calls("a.C#m2()", 2))
            .method(MethodSnapshot::new("m2", 5));
        let model = InMemoryCodeModel::from_snapshot(&ModelSnapshot {
            classes: vec![class],
        });

        let mut config = plain_calls(3, 0);
        config.details = config.details.aggregation(Aggregation::GroupByClass);
        let graph = run(&model, "a.C#m1", DiagramConfiguration::Call(config));

        assert_eq!(labels(&graph), vec!["C"]);
        assert!(graph.edges.is_empty());
        assert_eq!(graph.nodes[0].sources.len(), 2);
    }

    #[test]
    fn test_restriction_is_deterministic() {
        let model = layered_model();
        let classification = classification();
        let restriction = GraphRestriction::default().class_name_exclude_filter("*Mapper");
        let filter = RestrictionFilter::new(&model, &classification, &restriction, &mut Vec::new());

        for class in model.classes() {
            let first = filter.is_visible(class);
            assert_eq!(first, filter.is_visible(class), "{}", class.id);
        }
    }

    #[test]
    fn test_presets_produce_valid_graphs() {
        let layered = layered_model();
        let flow = flow_service_model();
        let cases: [(&dyn CodeModel, &str, DiagramKind); 5] = [
            (&layered, "shop.service.OrderService", DiagramKind::Call),
            (&layered, "shop.api.OrderFacade#submit", DiagramKind::Call),
            (&layered, "shop.entity.Order", DiagramKind::Structure),
            (&layered, "shop.dataaccess.OrderRepository", DiagramKind::Structure),
            (&flow, "flow.FlowService#save", DiagramKind::Flow),
        ];

        for (model, root, kind) in cases {
            let graph = run(model, root, DiagramConfiguration::preset(kind));
            assert_eq!(graph.kind, kind);
            for edge in &graph.edges {
                assert!(graph.node(&edge.from).is_some(), "{}: {}", root, edge.from);
                assert!(graph.node(&edge.to).is_some(), "{}: {}", root, edge.to);
            }
            let json = graph.to_json().unwrap();
            let back: DiagramGraph = serde_json::from_str(&json).unwrap();
            assert_eq!(back, graph);
        }
    }
}

//! Generation API: resolve the root, run the pipeline for the requested
//! diagram kind and validate the result.
//!
//! ```text
//! CodeModel ─► RestrictionFilter ─► traverse ─► aggregate ─► assemble ─► validate
//! ```
//!
//! Flow diagrams skip the generic traversal and aggregation and walk method
//! bodies themselves (see [`crate::diagram::flow`]).

use rayon::prelude::*;
use tracing::{debug, info};

use crate::cancel::Cancellable;
use crate::classify::Classifier;
use crate::config::{
    CallConfiguration, DiagramConfig, DiagramConfiguration, FlowConfiguration, Limits,
    StructureConfiguration,
};
use crate::diagram::{self, DiagramEdge, DiagramGraph, DiagramKind, DiagramNode};
use crate::error::{Result, TrellisError, Warning};
use crate::filter::{RestrictionFilter, TraversalFilter};
use crate::model::{CodeEntity, CodeModel, EntityId, EntityKind};
use crate::traversal::{traverse, Relation, WalkOptions};

/// One diagram to generate.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramRequest {
    /// `Class`, `Class#method` or `Class#method(Type,...)`.
    pub root: String,
    pub configuration: DiagramConfiguration,
    /// Diagram name. Derived from the root when unset.
    pub name: Option<String>,
}

impl DiagramRequest {
    pub fn new(root: impl Into<String>, configuration: DiagramConfiguration) -> Self {
        Self {
            root: root.into(),
            configuration,
            name: None,
        }
    }

    /// A request using the preset of `kind`.
    pub fn with_preset(root: impl Into<String>, kind: DiagramKind) -> Self {
        Self::new(root, DiagramConfiguration::preset(kind))
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Find the entity a root reference names.
///
/// A method given by name alone resolves to the first overload in source
/// order. Whitespace inside a parameter list is ignored.
pub fn resolve_root<'m>(model: &'m dyn CodeModel, root: &str) -> Result<&'m CodeEntity> {
    let unknown = || TrellisError::UnknownRoot(root.to_string());
    let root = root.trim();

    let Some((class_name, member)) = root.split_once('#') else {
        return model.resolve_class(root).ok_or_else(unknown);
    };
    let class = model.resolve_class(class_name).ok_or_else(unknown)?;
    let methods = model.methods_of(&class.id);

    let found = if member.contains('(') {
        let signature: String = member.chars().filter(|c| !c.is_whitespace()).collect();
        let wanted = format!("{}#{}", class.id, signature);
        methods.into_iter().find(|m| m.id.as_str() == wanted)
    } else {
        methods.into_iter().find(|m| m.name == member)
    };
    found.ok_or_else(unknown)
}

/// Generate one diagram.
///
/// Recoverable problems end up in [`DiagramGraph::warnings`]. Cancellation,
/// an unknown root and invariant violations are errors; no partial graph is
/// returned for them.
pub fn generate(
    model: &dyn CodeModel,
    classifier: &dyn Classifier,
    request: &DiagramRequest,
    limits: &Limits,
    cancel: &dyn Cancellable,
) -> Result<DiagramGraph> {
    let root = resolve_root(model, &request.root)?;
    let class = model.owner_class(&root.id).unwrap_or(root);
    let kind = request.configuration.kind();
    debug!(root = %root.id, kind = %kind, "generating diagram");

    let mut warnings = Vec::new();
    let (nodes, edges) = match &request.configuration {
        DiagramConfiguration::Call(config) => {
            generate_call(model, classifier, root, class, config, limits, cancel, &mut warnings)?
        }
        DiagramConfiguration::Structure(config) => {
            generate_structure(model, classifier, class, config, limits, cancel, &mut warnings)?
        }
        DiagramConfiguration::Flow(config) => {
            generate_flow(model, classifier, root, class, config, limits, cancel, &mut warnings)?
        }
    };

    let name = request
        .name
        .clone()
        .unwrap_or_else(|| default_name(kind, root, class));
    let graph = DiagramGraph {
        kind,
        name,
        root: root.id.clone(),
        nodes,
        edges,
        warnings,
    };
    diagram::validate(&graph)?;

    info!(
        name = %graph.name,
        kind = %graph.kind,
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        warnings = graph.warnings.len(),
        "diagram generated"
    );
    Ok(graph)
}

// ─── Batch Generation ───────────────────────────────────────────

/// One call diagram per public method of `class`, named
/// `<index>_<method>_calls`. Diagrams are generated in parallel; the first
/// failure fails the batch.
pub fn generate_call_diagrams(
    model: &dyn CodeModel,
    classifier: &dyn Classifier,
    class: &str,
    config: &CallConfiguration,
    limits: &Limits,
    cancel: &dyn Cancellable,
) -> Result<Vec<DiagramGraph>> {
    let class = model
        .resolve_class(class)
        .ok_or_else(|| TrellisError::UnknownRoot(class.to_string()))?;
    let methods = public_methods(model, class)?;

    methods
        .par_iter()
        .enumerate()
        .map(|(i, method)| {
            let request = DiagramRequest::new(
                method.id.as_str(),
                DiagramConfiguration::Call(config.clone()),
            )
            .named(format!("{}_{}_calls", i, method.name));
            generate(model, classifier, &request, limits, cancel)
        })
        .collect()
}

/// One flow diagram per Terminal-marked method of `class`, named
/// `<method>_flow`.
pub fn generate_flow_diagrams(
    model: &dyn CodeModel,
    classifier: &dyn Classifier,
    class: &str,
    config: &FlowConfiguration,
    limits: &Limits,
    cancel: &dyn Cancellable,
) -> Result<Vec<DiagramGraph>> {
    let class = model
        .resolve_class(class)
        .ok_or_else(|| TrellisError::UnknownRoot(class.to_string()))?;
    let terminals = terminal_methods(model, class);

    terminals
        .par_iter()
        .map(|method| {
            let request = DiagramRequest::new(
                method.id.as_str(),
                DiagramConfiguration::Flow(config.clone()),
            )
            .named(format!("{}_flow", method.name));
            generate(model, classifier, &request, limits, cancel)
        })
        .collect()
}

// ─── Per-kind Pipelines ─────────────────────────────────────────

type Parts = (Vec<DiagramNode>, Vec<DiagramEdge>);

#[allow(clippy::too_many_arguments)]
fn generate_call(
    model: &dyn CodeModel,
    classifier: &dyn Classifier,
    root: &CodeEntity,
    class: &CodeEntity,
    config: &CallConfiguration,
    limits: &Limits,
    cancel: &dyn Cancellable,
    warnings: &mut Vec<Warning>,
) -> Result<Parts> {
    // A class root stands for all of its public methods.
    let roots: Vec<EntityId> = if root.kind.is_type() {
        public_methods(model, root)?
            .into_iter()
            .map(|m| m.id.clone())
            .collect()
    } else {
        vec![root.id.clone()]
    };

    let (forward_depth, backward_depth) = config.traversal().depth_bounds(limits.max_depth, warnings);
    let restriction = RestrictionFilter::new(model, classifier, config.restriction(), warnings)
        .with_root_class(class.id.clone());
    let traversal = TraversalFilter::new(model, classifier, config.traversal(), warnings);

    let options = WalkOptions {
        relation: Relation::Calls,
        forward_depth,
        backward_depth,
    };
    let raw = traverse(model, &roots, &restriction, &traversal, options, cancel, warnings)?;
    Ok(diagram::call::assemble(model, classifier, &raw, &config.details))
}

fn generate_structure(
    model: &dyn CodeModel,
    classifier: &dyn Classifier,
    class: &CodeEntity,
    config: &StructureConfiguration,
    limits: &Limits,
    cancel: &dyn Cancellable,
    warnings: &mut Vec<Warning>,
) -> Result<Parts> {
    let (forward_depth, backward_depth) = config.traversal().depth_bounds(limits.max_depth, warnings);
    let restriction = RestrictionFilter::new(model, classifier, config.restriction(), warnings)
        .with_root_class(class.id.clone());
    let traversal = TraversalFilter::new(model, classifier, config.traversal(), warnings);

    let options = WalkOptions {
        relation: Relation::Types,
        forward_depth,
        backward_depth,
    };
    let roots = [class.id.clone()];
    let raw = traverse(model, &roots, &restriction, &traversal, options, cancel, warnings)?;
    Ok(diagram::structure::assemble(
        model,
        classifier,
        &restriction,
        &raw,
        &config.details,
    ))
}

#[allow(clippy::too_many_arguments)]
fn generate_flow(
    model: &dyn CodeModel,
    classifier: &dyn Classifier,
    root: &CodeEntity,
    class: &CodeEntity,
    config: &FlowConfiguration,
    limits: &Limits,
    cancel: &dyn Cancellable,
    warnings: &mut Vec<Warning>,
) -> Result<Parts> {
    // A class root combines the flows of all its Terminal methods.
    let roots: Vec<EntityId> = if root.kind.is_type() {
        let terminals = terminal_methods(model, root);
        if terminals.is_empty() {
            return Err(TrellisError::UnknownRoot(format!(
                "{} (no Terminal methods)",
                root.id
            )));
        }
        terminals.into_iter().map(|m| m.id.clone()).collect()
    } else {
        vec![root.id.clone()]
    };

    let (max_depth, _) = config.traversal().depth_bounds(limits.max_depth, warnings);
    let restriction = RestrictionFilter::new(model, classifier, config.restriction(), warnings)
        .with_root_class(class.id.clone());
    let traversal = TraversalFilter::new(model, classifier, config.traversal(), warnings);

    diagram::flow::assemble(model, &restriction, &traversal, &roots, max_depth, cancel)
}

/// Public methods of `class` other than the `Object` ones. A class without
/// any cannot root a call diagram.
fn public_methods<'m>(model: &'m dyn CodeModel, class: &CodeEntity) -> Result<Vec<&'m CodeEntity>> {
    let methods: Vec<&CodeEntity> = model
        .methods_of(&class.id)
        .into_iter()
        .filter(|m| m.kind == EntityKind::Method && m.is_public() && !m.is_object_method())
        .collect();
    if methods.is_empty() {
        return Err(TrellisError::UnknownRoot(format!(
            "{} (no public methods)",
            class.id
        )));
    }
    Ok(methods)
}

fn terminal_methods<'m>(model: &'m dyn CodeModel, class: &CodeEntity) -> Vec<&'m CodeEntity> {
    model
        .methods_of(&class.id)
        .into_iter()
        .filter(|m| {
            model
                .flow_site_of(&m.id)
                .is_some_and(|site| site.terminal().is_some())
        })
        .collect()
}

fn default_name(kind: DiagramKind, root: &CodeEntity, class: &CodeEntity) -> String {
    let subject = if root.kind.is_type() { &class.name } else { &root.name };
    let suffix = match kind {
        DiagramKind::Call => "calls",
        DiagramKind::Structure => "structure",
        DiagramKind::Flow => "flow",
    };
    format!("{}_{}", subject, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancellationToken;
    use crate::classify::{CompiledClassification, ProjectClassification};
    use crate::config::{Aggregation, GraphRestriction, GraphTraversal};
    use crate::diagram::{DiagramNodeKind, NodeId, NodeSource};
    use crate::error::WarningKind;
    use crate::model::fixtures::{flow_service_model, layered_model};
    use crate::model::{ClassSnapshot, InMemoryCodeModel, MethodSnapshot, ModelSnapshot, Visibility};
    use pretty_assertions::assert_eq;

    fn classification() -> CompiledClassification {
        ProjectClassification::default().compile(&mut Vec::new())
    }

    fn run(model: &dyn CodeModel, request: &DiagramRequest) -> Result<DiagramGraph> {
        generate(
            model,
            &classification(),
            request,
            &Limits::default(),
            &CancellationToken::new(),
        )
    }

    #[test]
    fn test_resolve_root() {
        let model = layered_model();
        let id = |root: &str| resolve_root(&model, root).map(|e| e.id.to_string());

        assert_eq!(id("shop.service.OrderService").unwrap(), "shop.service.OrderService");
        assert_eq!(
            id("shop.service.OrderService#placeOrder").unwrap(),
            "shop.service.OrderService#placeOrder(Order)"
        );
        assert_eq!(
            id("shop.service.OrderService#placeOrder( Order )").unwrap(),
            "shop.service.OrderService#placeOrder(Order)"
        );
        assert!(matches!(id("shop.Nope"), Err(TrellisError::UnknownRoot(_))));
        assert!(matches!(
            id("shop.service.OrderService#nope"),
            Err(TrellisError::UnknownRoot(r)) if r == "shop.service.OrderService#nope"
        ));
    }

    #[test]
    fn test_call_preset_from_method() {
        let model = layered_model();
        let request =
            DiagramRequest::with_preset("shop.service.OrderService#placeOrder", DiagramKind::Call);
        let graph = run(&model, &request).unwrap();

        assert_eq!(graph.name, "placeOrder_calls");
        assert_eq!(graph.root.as_str(), "shop.service.OrderService#placeOrder(Order)");
        assert!(graph.node_by_label("OrderService").is_some_and(|n| n.is_root));
        assert!(graph.node_by_label("OrderFacade").is_some());
        assert!(graph.node_by_label("OrderServiceTest").is_none(), "tests are cut");
        assert!(graph.node_by_label("OrderRepository").is_none(), "interface calls are hidden");

        let logger = graph.node_by_label("Logger").unwrap();
        assert_eq!(logger.kind, DiagramNodeKind::External);
        assert_eq!(graph.warnings.len(), 1);
        assert_eq!(graph.warnings[0].kind, WarningKind::UnresolvedReference);
    }

    #[test]
    fn test_structure_from_member_uses_owner_class() {
        let model = layered_model();
        let request = DiagramRequest::with_preset("shop.entity.Order", DiagramKind::Structure);
        let graph = run(&model, &request).unwrap();

        assert_eq!(graph.name, "Order_structure");
        let root = graph.root_node().unwrap();
        assert_eq!(root.label, "Order");
        assert_eq!(
            root.sources,
            vec![NodeSource::Entity(EntityId::new("shop.entity.Order"))]
        );
        assert!(graph.node_by_label("OrderLine").is_some());
        // The structure preset cuts enums.
        assert!(graph.node_by_label("OrderStatus").is_none());
    }

    #[test]
    fn test_depth_out_of_range_is_clamped_with_warning() {
        let model = layered_model();
        let mut config = CallConfiguration::preset();
        config.graph_traversal = GraphTraversal::default().forward_depth(5000).backward_depth(-1);
        let request = DiagramRequest::new(
            "shop.api.OrderFacade#submit",
            DiagramConfiguration::Call(config),
        );
        let graph = run(&model, &request).unwrap();

        let configuration: Vec<&Warning> = graph
            .warnings
            .iter()
            .filter(|w| w.kind == WarningKind::Configuration)
            .collect();
        assert_eq!(configuration.len(), 2);
        assert!(configuration[0].message.contains("forwardDepth 5000"));
    }

    #[test]
    fn test_flow_for_class_combines_terminals() {
        let model = flow_service_model();
        let request = DiagramRequest::with_preset("flow.FlowService", DiagramKind::Flow);
        let graph = run(&model, &request).unwrap();

        assert_eq!(graph.name, "FlowService_flow");
        assert_eq!(graph.nodes.len(), 6);
        assert_eq!(graph.edges.len(), 5);
        let roots: Vec<&str> = graph
            .nodes
            .iter()
            .filter(|n| n.is_root)
            .map(|n| n.label.as_str())
            .collect();
        assert_eq!(
            roots,
            vec!["save entity", "display error message", "update entity", "create entity"]
        );
    }

    #[test]
    fn test_batch_call_diagrams() {
        let model = layered_model();
        let mut config = CallConfiguration::preset();
        config.details = config.details.aggregation(Aggregation::None);
        let graphs = generate_call_diagrams(
            &model,
            &classification(),
            "shop.service.OrderService",
            &config,
            &Limits::default(),
            &CancellationToken::new(),
        )
        .unwrap();

        let names: Vec<&str> = graphs.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["0_placeOrder_calls", "1_getRepository_calls"]);
    }

    #[test]
    fn test_batch_flow_diagrams() {
        let model = flow_service_model();
        let graphs = generate_flow_diagrams(
            &model,
            &classification(),
            "flow.FlowService",
            &FlowConfiguration::preset(),
            &Limits::default(),
            &CancellationToken::new(),
        )
        .unwrap();

        let names: Vec<&str> = graphs.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["save_flow", "create_flow", "update_flow", "createViolationException_flow"]
        );
        assert_eq!(graphs[0].nodes.len(), 6);
        assert_eq!(graphs[1].nodes.len(), 1);
    }

    #[test]
    fn test_cancelled_request_returns_no_graph() {
        let model = layered_model();
        let token = CancellationToken::new();
        token.cancel();
        let request = DiagramRequest::with_preset("shop.service.OrderService", DiagramKind::Call);
        let result = generate(&model, &classification(), &request, &Limits::default(), &token);
        assert!(matches!(result, Err(TrellisError::Cancelled(_))));
    }

    #[test]
    fn test_unknown_root() {
        let model = layered_model();
        let request = DiagramRequest::with_preset("shop.Missing", DiagramKind::Structure);
        assert!(matches!(run(&model, &request), Err(TrellisError::UnknownRoot(_))));
    }

    #[test]
    fn test_call_names_match_batch_names() {
        let model = layered_model();
        let request = DiagramRequest::with_preset("shop.service.OrderService", DiagramKind::Call);
        assert_eq!(run(&model, &request).unwrap().name, "OrderService_calls");
    }

    #[test]
    fn test_call_class_root_uses_public_methods() {
        let model = layered_model();
        let mut config = CallConfiguration::preset();
        config.graph_restriction = GraphRestriction::permissive();
        config.graph_traversal = GraphTraversal::default()
            .forward_depth(1)
            .backward_depth(0)
            .hide_interface_calls(false)
            .hide_private_methods(false);
        config.details = config.details.aggregation(Aggregation::None);
        let request = DiagramRequest::new(
            "shop.service.OrderService",
            DiagramConfiguration::Call(config),
        );
        let graph = run(&model, &request).unwrap();

        let roots: Vec<&str> = graph
            .nodes
            .iter()
            .filter(|n| n.is_root)
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(
            roots,
            vec![
                "shop.service.OrderService#placeOrder(Order)",
                "shop.service.OrderService#getRepository()",
            ]
        );
        let audit = graph.node(&NodeId::new("shop.service.OrderService#audit(String)"));
        assert!(audit.is_some_and(|n| !n.is_root), "private methods are only reached");
    }

    #[test]
    fn test_class_root_without_methods_to_show() {
        let model = InMemoryCodeModel::from_snapshot(&ModelSnapshot {
            classes: vec![ClassSnapshot::new("a.Hidden", EntityKind::Class)
                .method(MethodSnapshot::new("work", 3).visibility(Visibility::Private))],
        });

        let call = DiagramRequest::with_preset("a.Hidden", DiagramKind::Call);
        assert!(matches!(
            run(&model, &call),
            Err(TrellisError::UnknownRoot(r)) if r.contains("no public methods")
        ));
        let batch = generate_call_diagrams(
            &model,
            &classification(),
            "a.Hidden",
            &CallConfiguration::preset(),
            &Limits::default(),
            &CancellationToken::new(),
        );
        assert!(matches!(batch, Err(TrellisError::UnknownRoot(_))));

        let flow = DiagramRequest::with_preset("a.Hidden", DiagramKind::Flow);
        assert!(matches!(
            run(&model, &flow),
            Err(TrellisError::UnknownRoot(r)) if r.contains("no Terminal methods")
        ));
    }
}

//! The traversal filter prunes edges while walking: traversal-scoped name
//! filters and the hide-flags. A rejected candidate is dropped together
//! with everything only reachable through it.

use crate::classify::Classifier;
use crate::config::GraphTraversal;
use crate::error::Warning;
use crate::model::{package_of_qualified, simple_name_of, CodeEntity, CodeModel, EntityId, Visibility};

use super::pattern::NameFilter;

/// A [`GraphTraversal`] compiled against one model and classification.
pub struct TraversalFilter<'a> {
    model: &'a dyn CodeModel,
    classifier: &'a dyn Classifier,
    class_name: NameFilter,
    class_package: NameFilter,
    method_name: NameFilter,
    hide_mappings: bool,
    hide_data_structures: bool,
    hide_private_methods: bool,
    hide_interface_calls: bool,
    only_entry_points: bool,
}

impl<'a> TraversalFilter<'a> {
    pub fn new(
        model: &'a dyn CodeModel,
        classifier: &'a dyn Classifier,
        traversal: &GraphTraversal,
        warnings: &mut Vec<Warning>,
    ) -> Self {
        let t = traversal;
        Self {
            model,
            classifier,
            class_name: NameFilter::compile(
                "traversal.className",
                &t.class_name_include_filter,
                &t.class_name_exclude_filter,
                warnings,
            ),
            class_package: NameFilter::compile(
                "traversal.classPackage",
                &t.class_package_include_filter,
                &t.class_package_exclude_filter,
                warnings,
            ),
            method_name: NameFilter::compile(
                "traversal.methodName",
                &t.method_name_include_filter,
                &t.method_name_exclude_filter,
                warnings,
            ),
            hide_mappings: t.hide_mappings,
            hide_data_structures: t.hide_data_structures,
            hide_private_methods: t.hide_private_methods,
            hide_interface_calls: t.hide_interface_calls,
            only_entry_points: t.only_show_application_entry_points,
        }
    }

    /// Whether the walk may step onto `entity`.
    pub fn allows(&self, entity: &CodeEntity) -> bool {
        let class = match &entity.owner {
            Some(owner) => match self.model.entity(owner) {
                Some(class) => class,
                None => return false,
            },
            None => entity,
        };

        if entity.kind.is_callable() {
            if !self.method_name.accepts(&entity.name) {
                return false;
            }
            if self.hide_private_methods && entity.modifiers.visibility != Visibility::Public {
                return false;
            }
        }

        self.class_name.accepts(&class.name)
            && self.class_package.accepts(class.package())
            && !(self.hide_data_structures && self.classifier.is_data_structure(class))
            && !(self.hide_mappings && self.classifier.is_mapping(class))
            && !(self.hide_interface_calls && class.is_interface())
    }

    /// Name filters for a reference the model could not resolve.
    pub fn allows_external(&self, reference: &EntityId) -> bool {
        let class = reference.class_part();
        reference
            .member_part()
            .map_or(true, |member| self.method_name.accepts(member))
            && self.class_name.accepts(simple_name_of(class))
            && self.class_package.accepts(package_of_qualified(class))
    }

    /// Whether `entity` (or its owning class) is an application entry point.
    pub fn is_entry_point(&self, entity: &CodeEntity) -> bool {
        let class = match &entity.owner {
            Some(owner) => self.model.entity(owner),
            None => Some(entity),
        };
        class.is_some_and(|c| self.classifier.is_entry_point(c))
    }

    /// Whether the walk must be trimmed to paths between entry points.
    pub fn only_entry_points(&self) -> bool {
        self.only_entry_points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{CompiledClassification, ProjectClassification};
    use crate::model::fixtures::layered_model;
    use crate::model::InMemoryCodeModel;

    fn allows(model: &InMemoryCodeModel, traversal: &GraphTraversal, id: &str) -> bool {
        let classification = ProjectClassification {
            is_data_structure_path: "*.entity".to_string(),
            is_mapping_path: "*.mapper".to_string(),
            ..ProjectClassification::default()
        }
        .compile(&mut Vec::new());
        let filter = TraversalFilter::new(model, &classification, traversal, &mut Vec::new());
        filter.allows(model.entity(&EntityId::new(id)).unwrap())
    }

    #[test]
    fn test_hide_private_methods() {
        let model = layered_model();
        let audit = "shop.service.OrderService#audit(String)";
        let traversal = GraphTraversal::default().hide_private_methods(true);
        assert!(!allows(&model, &traversal, audit));
        let traversal = GraphTraversal::default().hide_private_methods(false);
        assert!(allows(&model, &traversal, audit));
    }

    #[test]
    fn test_hide_interface_calls() {
        let model = layered_model();
        let save = "shop.dataaccess.OrderRepository#save(Order)";
        assert!(!allows(&model, &GraphTraversal::default(), save));
        let traversal = GraphTraversal::default().hide_interface_calls(false);
        assert!(allows(&model, &traversal, save));
    }

    #[test]
    fn test_hide_categories() {
        let model = layered_model();
        let defaults = GraphTraversal::default();
        assert!(!allows(&model, &defaults, "shop.mapper.OrderMapper#toRow(Order)"));
        assert!(!allows(&model, &defaults, "shop.entity.Order"));

        let open = GraphTraversal::default()
            .hide_mappings(false)
            .hide_data_structures(false);
        assert!(allows(&model, &open, "shop.mapper.OrderMapper#toRow(Order)"));
        assert!(allows(&model, &open, "shop.entity.Order"));
    }

    #[test]
    fn test_traversal_name_filters() {
        let model = layered_model();
        let traversal = GraphTraversal::default().class_name_exclude_filter("*Facade");
        assert!(!allows(&model, &traversal, "shop.api.OrderFacade#submit(Order)"));
        assert!(allows(
            &model,
            &traversal,
            "shop.service.OrderService#placeOrder(Order)"
        ));
    }

    #[test]
    fn test_entry_points() {
        let model = layered_model();
        let classification: CompiledClassification = ProjectClassification {
            is_entry_point_name: "*Facade".to_string(),
            ..ProjectClassification::default()
        }
        .compile(&mut Vec::new());
        let filter = TraversalFilter::new(
            &model,
            &classification,
            &GraphTraversal::default(),
            &mut Vec::new(),
        );
        let submit = model
            .entity(&EntityId::new("shop.api.OrderFacade#submit(Order)"))
            .unwrap();
        assert!(filter.is_entry_point(submit));
        assert!(!filter.only_entry_points());
    }
}

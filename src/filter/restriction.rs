//! The restriction filter decides whether an entity may appear in a
//! diagram at all.
//!
//! Checks run in a fixed order and stop at the first failure:
//! names, packages, annotations, inheritance and removal lists, cut flags.
//! Members are judged together with their owning class.

use crate::classify::Classifier;
use crate::config::GraphRestriction;
use crate::error::Warning;
use crate::model::{
    package_of_qualified, simple_name_of, CodeEntity, CodeModel, EntityId, EntityKind,
};

use super::pattern::{NameFilter, PatternList};

/// A [`GraphRestriction`] compiled against one model and classification.
pub struct RestrictionFilter<'a> {
    model: &'a dyn CodeModel,
    classifier: &'a dyn Classifier,
    class_name: NameFilter,
    class_package: NameFilter,
    method_name: NameFilter,
    remove_by_annotation: PatternList,
    remove_by_inheritance: PatternList,
    remove_by_class_package: PatternList,
    remove_by_class_name: PatternList,
    cuts: GraphRestriction,
    root_class: Option<EntityId>,
}

impl<'a> RestrictionFilter<'a> {
    pub fn new(
        model: &'a dyn CodeModel,
        classifier: &'a dyn Classifier,
        restriction: &GraphRestriction,
        warnings: &mut Vec<Warning>,
    ) -> Self {
        let r = restriction;
        Self {
            model,
            classifier,
            class_name: NameFilter::compile(
                "className",
                &r.class_name_include_filter,
                &r.class_name_exclude_filter,
                warnings,
            ),
            class_package: NameFilter::compile(
                "classPackage",
                &r.class_package_include_filter,
                &r.class_package_exclude_filter,
                warnings,
            ),
            method_name: NameFilter::compile(
                "methodName",
                &r.method_name_include_filter,
                &r.method_name_exclude_filter,
                warnings,
            ),
            remove_by_annotation: PatternList::compile(
                "removeByAnnotation",
                &r.remove_by_annotation,
                warnings,
            ),
            remove_by_inheritance: PatternList::compile(
                "removeByInheritance",
                &r.remove_by_inheritance,
                warnings,
            ),
            remove_by_class_package: PatternList::compile(
                "removeByClassPackage",
                &r.remove_by_class_package,
                warnings,
            ),
            remove_by_class_name: PatternList::compile(
                "removeByClassName",
                &r.remove_by_class_name,
                warnings,
            ),
            cuts: restriction.clone(),
            root_class: None,
        }
    }

    /// Skip class-level checks for the diagram's root class. Its members
    /// are still judged by the member checks.
    pub fn with_root_class(mut self, class: EntityId) -> Self {
        self.root_class = Some(class);
        self
    }

    /// Whether `entity` may appear in a diagram.
    pub fn is_visible(&self, entity: &CodeEntity) -> bool {
        let class = match &entity.owner {
            Some(owner) => match self.model.entity(owner) {
                Some(class) => class,
                None => return false,
            },
            None => entity,
        };

        let class_checks = self.root_class.as_ref() != Some(&class.id);

        self.passes_names(entity, class, class_checks)
            && (!class_checks || self.passes_packages(class))
            && self.passes_annotations(entity, class, class_checks)
            && (!class_checks || self.passes_inheritance(class))
            && self.passes_cuts(entity, class, class_checks)
    }

    /// Name-based checks for a reference the model could not resolve.
    pub fn is_external_visible(&self, reference: &EntityId) -> bool {
        let class = reference.class_part();
        let name = simple_name_of(class);
        let package = package_of_qualified(class);

        reference
            .member_part()
            .map_or(true, |member| self.method_name.accepts(member))
            && self.class_name.accepts(name)
            && self.class_package.accepts(package)
            && self.classifier.is_included_package(package)
            && !self.remove_by_class_package.matches(package)
            && !self.remove_by_class_name.matches(name)
    }

    // ─── Checks ─────────────────────────────────────────────────

    fn passes_names(&self, entity: &CodeEntity, class: &CodeEntity, class_checks: bool) -> bool {
        if entity.kind.is_callable() && !self.method_name.accepts(&entity.name) {
            return false;
        }
        !class_checks || self.class_name.accepts(&class.name)
    }

    fn passes_packages(&self, class: &CodeEntity) -> bool {
        let package = class.package();
        self.class_package.accepts(package) && self.classifier.is_included_package(package)
    }

    fn passes_annotations(&self, entity: &CodeEntity, class: &CodeEntity, class_checks: bool) -> bool {
        if self.remove_by_annotation.is_empty() {
            return true;
        }
        let hit = |e: &CodeEntity| {
            e.annotations
                .iter()
                .any(|a| self.remove_by_annotation.matches(&a.name))
        };
        if entity.owner.is_some() && hit(entity) {
            return false;
        }
        if !class_checks {
            return true;
        }
        !hit(class) && !self.model.ancestors_of(&class.id).into_iter().any(hit)
    }

    fn passes_inheritance(&self, class: &CodeEntity) -> bool {
        if !self.remove_by_inheritance.is_empty()
            && self
                .model
                .ancestors_of(&class.id)
                .iter()
                .any(|a| self.remove_by_inheritance.matches(&a.name))
        {
            return false;
        }
        !self.remove_by_class_package.matches(class.package())
            && !self.remove_by_class_name.matches(&class.name)
    }

    fn passes_cuts(&self, entity: &CodeEntity, class: &CodeEntity, class_checks: bool) -> bool {
        let cuts = &self.cuts;
        let c = self.classifier;

        let class_cut = class_checks
            && ((cuts.cut_tests && c.is_test(class))
            || (cuts.cut_mappings && c.is_mapping(class))
            || (cuts.cut_enum && class.kind == EntityKind::Enum)
            || (cuts.cut_client && c.is_client(class))
            || (cuts.cut_data_access && c.is_data_access(class))
            || (cuts.cut_interface_structures && c.is_interface_structure(class))
            || (cuts.cut_data_structures && c.is_data_structure(class)));
        if class_cut {
            return false;
        }

        let member_cut = entity.is_object_method()
            || (cuts.cut_constructors && entity.kind == EntityKind::Constructor)
            || (cuts.cut_getter_and_setter
                && !class.is_interface()
                && entity.is_getter_or_setter());
        !member_cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{CompiledClassification, ProjectClassification};
    use crate::model::fixtures::layered_model;
    use crate::model::InMemoryCodeModel;

    fn classification() -> CompiledClassification {
        ProjectClassification {
            is_data_access_path: "*.dataaccess".to_string(),
            is_data_structure_path: "*.entity".to_string(),
            is_mapping_path: "*.mapper".to_string(),
            is_entry_point_name: "*Facade".to_string(),
            ..ProjectClassification::default()
        }
        .compile(&mut Vec::new())
    }

    fn visible(
        model: &InMemoryCodeModel,
        restriction: &GraphRestriction,
        id: &str,
    ) -> bool {
        let classification = classification();
        let filter = RestrictionFilter::new(model, &classification, restriction, &mut Vec::new());
        filter.is_visible(model.entity(&EntityId::new(id)).unwrap())
    }

    #[test]
    fn test_cut_tests_scenario() {
        let model = layered_model();
        let restriction = GraphRestriction::permissive().cut_tests(true);
        assert!(!visible(&model, &restriction, "shop.service.OrderServiceTest"));
        assert!(!visible(
            &model,
            &restriction,
            "shop.service.OrderServiceTest#testPlaceOrder()"
        ));
        assert!(visible(&model, &restriction, "shop.service.OrderService"));
        assert!(visible(&model, &restriction, "shop.api.OrderFacade#submit(Order)"));
    }

    #[test]
    fn test_determinism() {
        let model = layered_model();
        let restriction = GraphRestriction::default().class_name_exclude_filter("*Mapper");
        for class in model.classes() {
            let first = visible(&model, &restriction, class.id.as_str());
            let second = visible(&model, &restriction, class.id.as_str());
            assert_eq!(first, second, "{} judged differently", class.id);
        }
    }

    #[test]
    fn test_name_and_package_filters() {
        let model = layered_model();
        let restriction = GraphRestriction::permissive()
            .class_package_include_filter("shop.service;shop.api")
            .method_name_exclude_filter("audit");
        assert!(visible(&model, &restriction, "shop.service.OrderService"));
        assert!(!visible(&model, &restriction, "shop.mapper.OrderMapper"));
        assert!(!visible(
            &model,
            &restriction,
            "shop.service.OrderService#audit(String)"
        ));
        assert!(visible(
            &model,
            &restriction,
            "shop.service.OrderService#placeOrder(Order)"
        ));
    }

    #[test]
    fn test_inheritance_and_removal_lists() {
        let model = layered_model();
        let restriction = GraphRestriction::permissive().remove_by_inheritance("Repository");
        assert!(!visible(&model, &restriction, "shop.dataaccess.JpaOrderRepository"));
        assert!(!visible(&model, &restriction, "shop.dataaccess.OrderRepository"));
        assert!(
            visible(&model, &restriction, "shop.dataaccess.Repository"),
            "the ancestor itself is not its own ancestor"
        );

        let restriction = GraphRestriction::permissive().remove_by_class_name("Order*");
        assert!(!visible(&model, &restriction, "shop.entity.OrderLine"));
        assert!(visible(&model, &restriction, "shop.entity.Customer"));
    }

    #[test]
    fn test_annotation_exclusion_reaches_members() {
        let model = layered_model();
        let restriction = GraphRestriction::permissive().remove_by_annotation("NotNull");
        assert!(!visible(&model, &restriction, "shop.entity.Order.customer"));
        assert!(visible(&model, &restriction, "shop.entity.Order.lines"));
    }

    #[test]
    fn test_member_cuts() {
        let model = layered_model();
        let restriction = GraphRestriction::permissive()
            .cut_constructors(true)
            .cut_getter_and_setter(true);
        assert!(!visible(
            &model,
            &restriction,
            "shop.service.OrderService#OrderService()"
        ));
        assert!(!visible(
            &model,
            &restriction,
            "shop.service.OrderService#getRepository()"
        ));
        assert!(visible(
            &model,
            &restriction,
            "shop.service.OrderService#placeOrder(Order)"
        ));
    }

    #[test]
    fn test_layer_cuts() {
        let model = layered_model();
        let restriction = GraphRestriction::default();
        assert!(!visible(&model, &restriction, "shop.entity.Order"));
        assert!(!visible(&model, &restriction, "shop.dataaccess.OrderRepository"));
        assert!(!visible(&model, &restriction, "shop.entity.OrderStatus"));
        assert!(
            visible(&model, &restriction, "shop.mapper.OrderMapper"),
            "mappings are kept unless cut_mappings is set"
        );
    }

    #[test]
    fn test_root_class_is_exempt_from_class_checks() {
        let model = layered_model();
        let classification = classification();
        let restriction = GraphRestriction::default();
        let filter = RestrictionFilter::new(&model, &classification, &restriction, &mut Vec::new())
            .with_root_class(EntityId::new("shop.entity.Order"));

        let order = model.resolve_class("shop.entity.Order").unwrap();
        assert!(filter.is_visible(order), "data structure cut does not apply to the root");
        let get_id = model.entity(&EntityId::new("shop.entity.Order#getId()")).unwrap();
        assert!(!filter.is_visible(get_id), "member cuts still apply");
        let line = model.resolve_class("shop.entity.OrderLine").unwrap();
        assert!(!filter.is_visible(line));
    }

    #[test]
    fn test_external_references() {
        let model = layered_model();
        let classification = classification();
        let restriction = GraphRestriction::permissive().class_package_exclude_filter("java.*");
        let filter = RestrictionFilter::new(&model, &classification, &restriction, &mut Vec::new());
        assert!(!filter.is_external_visible(&EntityId::new("java.util.logging.Logger#info(String)")));
        assert!(filter.is_external_visible(&EntityId::new("org.lib.Client#send()")));
    }
}

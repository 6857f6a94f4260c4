//! The query surface the engine reads the code model through.
//!
//! Hosts with their own symbol tables implement [`CodeModel`] directly;
//! [`InMemoryCodeModel`](super::InMemoryCodeModel) is the bundled
//! implementation.

use super::types::{
    package_of_qualified, Annotation, CallEdge, CodeEntity, EntityId, FlowAnnotationSite,
    SourcePosition,
};

/// Read-only access to classes, members and their relationships.
///
/// Every list is returned in a deterministic order. Implementations must be
/// shareable across threads so independent requests can run in parallel.
pub trait CodeModel: Send + Sync {
    /// Look up any entity by id.
    fn entity(&self, id: &EntityId) -> Option<&CodeEntity>;

    /// Look up a class, interface or enum by qualified name.
    fn resolve_class(&self, qualified_name: &str) -> Option<&CodeEntity>;

    /// All types in the model, ordered by id.
    fn classes(&self) -> Vec<&CodeEntity>;

    /// Methods and constructors declared by a type, in source order.
    fn methods_of(&self, class: &EntityId) -> Vec<&CodeEntity>;

    /// Fields declared by a type, in source order.
    fn fields_of(&self, class: &EntityId) -> Vec<&CodeEntity>;

    /// Outgoing calls of a method, ordered by call site. Callees may be
    /// unresolvable.
    fn call_targets_of(&self, method: &EntityId) -> Vec<CallEdge>;

    /// Incoming calls of a method, ordered by caller id then call site.
    fn callers_of(&self, method: &EntityId) -> Vec<CallEdge>;

    /// Transitive supertypes of a type, nearest first.
    fn ancestors_of(&self, class: &EntityId) -> Vec<&CodeEntity>;

    /// Direct subtypes of a type.
    fn subtypes_of(&self, class: &EntityId) -> Vec<&CodeEntity>;

    /// Fields (of any type) whose declared type references `class`.
    fn field_referrers_of(&self, class: &EntityId) -> Vec<&CodeEntity>;

    fn annotations_of(&self, entity: &EntityId) -> Vec<Annotation> {
        self.entity(entity)
            .map(|e| e.annotations.clone())
            .unwrap_or_default()
    }

    /// Package of a type, or of a member's owning type.
    fn package_of(&self, entity: &EntityId) -> String {
        match self.owner_class(entity) {
            Some(class) => class.package().to_string(),
            None => package_of_qualified(entity.class_part()).to_string(),
        }
    }

    fn source_position_of(&self, entity: &EntityId) -> SourcePosition {
        self.entity(entity)
            .map(|e| e.position)
            .unwrap_or_default()
    }

    /// Flow markers carried by a method, if any.
    fn flow_site_of(&self, method: &EntityId) -> Option<FlowAnnotationSite> {
        let entity = self.entity(method)?;
        FlowAnnotationSite::from_annotations(&entity.name, &entity.annotations)
    }

    /// The type itself, or the owning type of a member.
    fn owner_class(&self, entity: &EntityId) -> Option<&CodeEntity> {
        let found = self.entity(entity)?;
        match &found.owner {
            Some(owner) => self.entity(owner),
            None => Some(found),
        }
    }
}

//! Text helpers shared by the assemblers: signatures, symbols and
//! cardinalities.

use std::collections::BTreeSet;

use crate::model::{CodeEntity, CodeModel, EntityKind};

use super::types::{FieldLine, NodeDetail, NodeSource};

/// Annotations that make a single-valued field mandatory.
pub const MANDATORY_ANNOTATIONS: [&str; 3] = ["NotNull", "NotBlank", "NotEmpty"];

/// `Size(max)` value meaning "unbounded".
const UNBOUNDED: &str = "2147483647";

/// Which parts of a method signature to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignatureOptions {
    pub parameter_names: bool,
    pub parameter_types: bool,
    pub return_type: bool,
}

/// `+ placeOrder(order: Order): Receipt`. A void return is never shown.
pub fn method_signature(method: &CodeEntity, options: SignatureOptions) -> String {
    format!(
        "{} {}",
        method.modifiers.visibility.symbol(),
        method_label(method, options)
    )
}

/// The signature without its visibility symbol.
pub fn method_label(method: &CodeEntity, options: SignatureOptions) -> String {
    let parameters = method
        .parameters
        .iter()
        .map(|p| {
            let mut parts = Vec::with_capacity(2);
            if options.parameter_names {
                parts.push(p.name.as_str());
            }
            if options.parameter_types {
                parts.push(p.type_ref.display.as_str());
            }
            parts.join(": ")
        })
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    let return_type = match &method.return_type {
        Some(t) if options.return_type && t.display != "void" => format!(": {}", t.display),
        _ => String::new(),
    };
    format!("{}({}){}", method.name, parameters, return_type)
}

/// `(C)`, `(I)` or `(E)`.
pub fn class_symbol(class: &CodeEntity) -> &'static str {
    match class.kind {
        EntityKind::Interface => "(I)",
        EntityKind::Enum => "(E)",
        _ => "(C)",
    }
}

/// Class name with generic parameters, `Repository<T, ID>`.
pub fn class_label(class: &CodeEntity, show_generics: bool) -> String {
    if show_generics && !class.type_parameters.is_empty() {
        format!("{}<{}>", class.name, class.type_parameters.join(", "))
    } else {
        class.name.clone()
    }
}

/// Multiplicity of a field: `[min..max]` for collections, `[1]` for
/// mandatory values, `[0..1]` otherwise.
pub fn cardinality(model: &dyn CodeModel, field: &CodeEntity) -> String {
    let Some(field_type) = &field.field_type else {
        return "[0..1]".to_string();
    };
    let attribute = |annotation: &str, key: &str| {
        field
            .annotations
            .iter()
            .find(|a| a.name == annotation)
            .and_then(|a| a.attribute(key))
    };

    if field_type.is_collection {
        let minimum = attribute("Min", "value")
            .or_else(|| attribute("Size", "min"))
            .unwrap_or("0");
        let maximum = attribute("Max", "value")
            .or_else(|| attribute("Size", "max").filter(|m| *m != UNBOUNDED))
            .unwrap_or("*");
        return format!("[{}..{}]", minimum, maximum);
    }

    let is_enum = field_type
        .targets
        .iter()
        .filter_map(|t| model.entity(t))
        .any(|t| t.kind == EntityKind::Enum);
    let mandatory = field_type.is_primitive
        || is_enum
        || field
            .annotations
            .iter()
            .any(|a| MANDATORY_ANNOTATIONS.contains(&a.name.as_str()));

    let label = if mandatory { "[1]" } else { "[0..1]" };
    label.to_string()
}

pub fn field_line(model: &dyn CodeModel, field: &CodeEntity) -> FieldLine {
    FieldLine {
        visibility: field.modifiers.visibility.symbol(),
        name: field.name.clone(),
        type_display: field
            .field_type
            .as_ref()
            .map(|t| t.display.clone())
            .unwrap_or_default(),
        cardinality: Some(cardinality(model, field)),
    }
}

/// The member table of a type node.
pub fn type_detail(
    model: &dyn CodeModel,
    class: &CodeEntity,
    fields: &[&CodeEntity],
    methods: &[&CodeEntity],
    options: SignatureOptions,
) -> NodeDetail {
    NodeDetail::Type {
        symbol: class_symbol(class).to_string(),
        generics: class.type_parameters.clone(),
        fields: fields.iter().map(|f| field_line(model, f)).collect(),
        methods: methods
            .iter()
            .map(|m| method_signature(m, options))
            .collect(),
    }
}

/// Sorted, distinct class names behind a package or component node.
pub fn group_members(model: &dyn CodeModel, sources: &[NodeSource]) -> Vec<String> {
    let members: BTreeSet<String> = sources
        .iter()
        .map(|s| match s {
            NodeSource::Entity(id) => model
                .owner_class(id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| id.to_string()),
            NodeSource::External(id) => id.class_part().to_string(),
            NodeSource::FlowCondition(label) => label.clone(),
        })
        .collect();
    members.into_iter().collect()
}

//! Core types of the code model.
//!
//! Defines entity kinds, modifiers, annotations, type references and call
//! edges: the read-only vocabulary every other module works in.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable identifier of a code entity.
///
/// Classes use their qualified name (`com.acme.FlowService`), methods
/// `<class>#<name>(<param types>)` and fields `<class>.<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id of a method or constructor.
    pub fn method(class: &str, name: &str, param_types: &[&str]) -> Self {
        Self(format!("{}#{}({})", class, name, param_types.join(",")))
    }

    /// Id of a field.
    pub fn field(class: &str, name: &str) -> Self {
        Self(format!("{}.{}", class, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The class part of a member reference (`a.B#m()` → `a.B`).
    ///
    /// Used for references that could not be resolved, where no owner
    /// entity is available.
    pub fn class_part(&self) -> &str {
        match self.0.find('#') {
            Some(pos) => &self.0[..pos],
            None => &self.0,
        }
    }

    /// The member part of a reference without its parameter list
    /// (`a.B#m(int)` → `m`), or `None` for a plain class reference.
    pub fn member_part(&self) -> Option<&str> {
        let pos = self.0.find('#')?;
        let member = &self.0[pos + 1..];
        Some(member.split('(').next().unwrap_or(member))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The kind of a code entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    #[default]
    Class,
    Interface,
    Enum,
    Method,
    Constructor,
    Field,
}

impl EntityKind {
    /// Classes, interfaces and enums.
    pub fn is_type(&self) -> bool {
        matches!(self, EntityKind::Class | EntityKind::Interface | EntityKind::Enum)
    }

    /// Methods and constructors.
    pub fn is_callable(&self) -> bool {
        matches!(self, EntityKind::Method | EntityKind::Constructor)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Class => write!(f, "class"),
            EntityKind::Interface => write!(f, "interface"),
            EntityKind::Enum => write!(f, "enum"),
            EntityKind::Method => write!(f, "method"),
            EntityKind::Constructor => write!(f, "constructor"),
            EntityKind::Field => write!(f, "field"),
        }
    }
}

/// Declared visibility of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    PackageLocal,
    Private,
}

impl Visibility {
    /// UML-style marker: `+` public, `#` protected or package, `-` private.
    pub fn symbol(&self) -> char {
        match self {
            Visibility::Public => '+',
            Visibility::Protected | Visibility::PackageLocal => '#',
            Visibility::Private => '-',
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Protected => write!(f, "protected"),
            Visibility::PackageLocal => write!(f, "package"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Modifiers {
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_abstract: bool,
}

/// An annotation with its string-valued attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Annotation {
    /// Simple annotation name, e.g. `NotNull`.
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// A reference to a type as written in a signature or field declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct TypeRef {
    /// Type as it should be displayed, e.g. `List<Order>`.
    pub display: String,
    /// Classes referenced by the type, generic arguments included.
    #[serde(default)]
    pub targets: Vec<EntityId>,
    #[serde(default)]
    pub is_collection: bool,
    #[serde(default)]
    pub is_primitive: bool,
}

impl TypeRef {
    pub fn new(display: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            ..Default::default()
        }
    }

    pub fn primitive(display: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            is_primitive: true,
            ..Default::default()
        }
    }

    pub fn of(display: impl Into<String>, target: impl Into<EntityId>) -> Self {
        Self {
            display: display.into(),
            targets: vec![target.into()],
            ..Default::default()
        }
    }

    pub fn collection_of(display: impl Into<String>, target: impl Into<EntityId>) -> Self {
        Self {
            display: display.into(),
            targets: vec![target.into()],
            is_collection: true,
            is_primitive: false,
        }
    }
}

/// A method or constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
}

/// Position in a source file. Orders call sites within a method body.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct SourcePosition {
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

impl SourcePosition {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A class, interface, enum, method, constructor or field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeEntity {
    pub id: EntityId,
    /// Simple name (`FlowService`, `save`, `items`).
    pub name: String,
    pub qualified_name: String,
    pub kind: EntityKind,
    /// Owning class for members, `None` for types.
    pub owner: Option<EntityId>,
    pub modifiers: Modifiers,
    pub annotations: Vec<Annotation>,
    /// Direct supertypes (types only).
    pub parents: Vec<EntityId>,
    /// Parameters (callables only).
    pub parameters: Vec<Parameter>,
    /// Return type (callables only); `None` is void.
    pub return_type: Option<TypeRef>,
    /// Declared type (fields only).
    pub field_type: Option<TypeRef>,
    /// Generic parameters as displayed (types only), e.g. `T extends Entity`.
    pub type_parameters: Vec<String>,
    /// Source file path, when known.
    pub path: Option<String>,
    pub position: SourcePosition,
    pub doc: Option<String>,
}

impl CodeEntity {
    pub fn is_interface(&self) -> bool {
        self.kind == EntityKind::Interface
    }

    pub fn is_public(&self) -> bool {
        self.modifiers.visibility == Visibility::Public
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a.name == name)
    }

    /// Package of a type: the qualified name up to its last dot.
    pub fn package(&self) -> &str {
        package_of_qualified(&self.qualified_name)
    }

    /// Getter/setter shape: `get*`/`is*`/`has*` without parameters and with
    /// a result, `with*` with parameters and a result, `set*` returning void.
    pub fn is_getter_or_setter(&self) -> bool {
        if self.kind != EntityKind::Method {
            return false;
        }
        let returns_value = self
            .return_type
            .as_ref()
            .is_some_and(|t| t.display != "void");
        let has_params = !self.parameters.is_empty();
        let name = self.name.as_str();

        let getter = ["get", "is", "has"]
            .iter()
            .any(|prefix| name.starts_with(prefix))
            && !has_params
            && returns_value;
        let wither = name.starts_with("with") && has_params && returns_value;
        let setter = name.starts_with("set") && !returns_value;

        getter || wither || setter
    }

    /// `toString`, `equals`, `hashCode` and `getClass`.
    pub fn is_object_method(&self) -> bool {
        self.kind == EntityKind::Method
            && matches!(
                self.name.as_str(),
                "toString" | "equals" | "hashCode" | "getClass"
            )
    }
}

/// Package part of a qualified class name.
pub fn package_of_qualified(qualified: &str) -> &str {
    match qualified.rfind('.') {
        Some(pos) => &qualified[..pos],
        None => "",
    }
}

/// Simple name part of a qualified class name.
pub fn simple_name_of(qualified: &str) -> &str {
    match qualified.rfind('.') {
        Some(pos) => &qualified[pos + 1..],
        None => qualified,
    }
}

/// A call from one method to another at a specific call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallEdge {
    pub caller: EntityId,
    /// May name an entity the model cannot resolve.
    pub callee: EntityId,
    pub position: SourcePosition,
}

// ─── Flow Markers ───────────────────────────────────────────────

pub const FLOW_ACTION: &str = "FlowDiagramAction";
pub const FLOW_CONDITION: &str = "FlowDiagramCondition";
pub const FLOW_TERMINAL: &str = "FlowDiagramTerminal";
pub const FLOW_STOP: &str = "FlowDiagramStop";

/// A flow-diagram marker on a method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "marker", rename_all = "snake_case")]
pub enum FlowMarker {
    Action {
        label: String,
    },
    /// A decision. With a `branch`, the annotated method sits on that branch
    /// of the condition named `label`.
    Condition {
        label: String,
        branch: Option<String>,
        alternative_branch: Option<String>,
    },
    Terminal {
        label: String,
    },
    Stop,
}

/// All flow markers carried by one method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FlowAnnotationSite {
    pub markers: Vec<FlowMarker>,
}

impl FlowAnnotationSite {
    /// Read flow markers from annotations. Blank labels fall back to
    /// `method_name`. Returns `None` when the method carries no marker.
    pub fn from_annotations(method_name: &str, annotations: &[Annotation]) -> Option<Self> {
        let label_of = |annotation: &Annotation| {
            annotation
                .attribute("value")
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(method_name)
                .to_string()
        };
        let non_blank = |annotation: &Annotation, key: &str| {
            annotation
                .attribute(key)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let markers: Vec<FlowMarker> = annotations
            .iter()
            .filter_map(|annotation| match annotation.name.as_str() {
                FLOW_ACTION => Some(FlowMarker::Action {
                    label: label_of(annotation),
                }),
                FLOW_CONDITION => Some(FlowMarker::Condition {
                    label: label_of(annotation),
                    branch: non_blank(annotation, "branch"),
                    alternative_branch: non_blank(annotation, "alternativeBranch"),
                }),
                FLOW_TERMINAL => Some(FlowMarker::Terminal {
                    label: label_of(annotation),
                }),
                FLOW_STOP => Some(FlowMarker::Stop),
                _ => None,
            })
            .collect();

        if markers.is_empty() {
            None
        } else {
            Some(Self { markers })
        }
    }

    pub fn is_stop(&self) -> bool {
        self.markers.contains(&FlowMarker::Stop)
    }

    pub fn terminal(&self) -> Option<&str> {
        self.markers.iter().find_map(|m| match m {
            FlowMarker::Terminal { label } => Some(label.as_str()),
            _ => None,
        })
    }

    /// The first condition marker that sits on a branch, as
    /// `(label, branch, alternative_branch)`.
    pub fn branch_condition(&self) -> Option<(&str, &str, Option<&str>)> {
        self.markers.iter().find_map(|m| match m {
            FlowMarker::Condition {
                label,
                branch: Some(branch),
                alternative_branch,
            } => Some((label.as_str(), branch.as_str(), alternative_branch.as_deref())),
            _ => None,
        })
    }
}

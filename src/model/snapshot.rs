//! Serializable model snapshot and the builder that turns it into an
//! [`InMemoryCodeModel`].
//!
//! A snapshot is what an external indexer hands over: classes with their
//! fields, methods and outgoing calls, all referenced by qualified name.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::memory::InMemoryCodeModel;
use super::types::{
    simple_name_of, Annotation, CodeEntity, EntityId, EntityKind, Modifiers, Parameter,
    SourcePosition, TypeRef, Visibility,
};
use crate::error::Result;

/// A whole code model as exchanged on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelSnapshot {
    #[serde(default)]
    pub classes: Vec<ClassSnapshot>,
}

/// A class, interface or enum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSnapshot {
    /// Qualified name.
    pub name: String,
    #[serde(default)]
    pub kind: EntityKind,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    /// Qualified names of extended/implemented types.
    #[serde(default)]
    pub supertypes: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldSnapshot>,
    #[serde(default)]
    pub methods: Vec<MethodSnapshot>,
    #[serde(default)]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub line: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodSnapshot {
    pub name: String,
    #[serde(default)]
    pub constructor: bool,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// `None` for void methods and constructors.
    #[serde(default)]
    pub return_type: Option<TypeRef>,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub calls: Vec<CallSnapshot>,
    #[serde(default)]
    pub doc: Option<String>,
}

/// An outgoing call. `target` is a method id, or `<class>#<name>` to pick
/// the first overload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSnapshot {
    pub target: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

// ─── Snapshot Construction ──────────────────────────────────────

impl ClassSnapshot {
    pub fn new(name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            name: name.into(),
            kind,
            modifiers: Modifiers::default(),
            path: None,
            line: 0,
            annotations: Vec::new(),
            type_parameters: Vec::new(),
            supertypes: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            doc: None,
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn extends(mut self, supertype: impl Into<String>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }

    pub fn type_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.type_parameters.push(parameter.into());
        self
    }

    pub fn field(mut self, field: FieldSnapshot) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodSnapshot) -> Self {
        self.methods.push(method);
        self
    }
}

impl FieldSnapshot {
    pub fn new(name: impl Into<String>, type_ref: TypeRef, line: u32) -> Self {
        Self {
            name: name.into(),
            type_ref,
            modifiers: Modifiers {
                visibility: Visibility::Private,
                ..Modifiers::default()
            },
            annotations: Vec::new(),
            line,
        }
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

impl MethodSnapshot {
    pub fn new(name: impl Into<String>, line: u32) -> Self {
        Self {
            name: name.into(),
            constructor: false,
            modifiers: Modifiers::default(),
            annotations: Vec::new(),
            parameters: Vec::new(),
            return_type: None,
            line,
            calls: Vec::new(),
            doc: None,
        }
    }

    pub fn constructor(mut self) -> Self {
        self.constructor = true;
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.modifiers.visibility = visibility;
        self
    }

    pub fn param(mut self, name: impl Into<String>, type_ref: TypeRef) -> Self {
        self.parameters.push(Parameter {
            name: name.into(),
            type_ref,
        });
        self
    }

    pub fn returns(mut self, type_ref: TypeRef) -> Self {
        self.return_type = Some(type_ref);
        self
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn calls(mut self, target: impl Into<String>, line: u32) -> Self {
        self.calls.push(CallSnapshot {
            target: target.into(),
            line,
            column: 0,
        });
        self
    }

    /// Id this method gets inside `class`.
    pub fn id_in(&self, class: &str) -> EntityId {
        let types: Vec<&str> = self
            .parameters
            .iter()
            .map(|p| p.type_ref.display.as_str())
            .collect();
        EntityId::method(class, &self.name, &types)
    }
}

// ─── Loading ────────────────────────────────────────────────────

impl ModelSnapshot {
    /// Load a snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let snapshot: ModelSnapshot = serde_json::from_str(&content)?;
        Ok(snapshot)
    }

    /// Save the snapshot as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

impl InMemoryCodeModel {
    /// Build a model from a snapshot.
    pub fn from_snapshot(snapshot: &ModelSnapshot) -> Self {
        let mut model = InMemoryCodeModel::new();
        model.ingest(snapshot);
        model
    }

    /// Add every class of a snapshot, then resolve inheritance and calls.
    pub fn ingest(&mut self, snapshot: &ModelSnapshot) {
        debug!(
            class_count = snapshot.classes.len(),
            "ingesting snapshot into model"
        );

        // Phase 1: types and their members
        for class in &snapshot.classes {
            let class_id = EntityId::new(class.name.as_str());
            self.add_entity(CodeEntity {
                id: class_id.clone(),
                name: simple_name_of(&class.name).to_string(),
                qualified_name: class.name.clone(),
                kind: class.kind,
                owner: None,
                modifiers: class.modifiers,
                annotations: class.annotations.clone(),
                parents: class.supertypes.iter().map(|s| EntityId::new(s.as_str())).collect(),
                parameters: Vec::new(),
                return_type: None,
                field_type: None,
                type_parameters: class.type_parameters.clone(),
                path: class.path.clone(),
                position: SourcePosition::new(class.line, 0),
                doc: class.doc.clone(),
            });

            for field in &class.fields {
                self.add_entity(CodeEntity {
                    id: EntityId::field(&class.name, &field.name),
                    name: field.name.clone(),
                    qualified_name: format!("{}.{}", class.name, field.name),
                    kind: EntityKind::Field,
                    owner: Some(class_id.clone()),
                    modifiers: field.modifiers,
                    annotations: field.annotations.clone(),
                    parents: Vec::new(),
                    parameters: Vec::new(),
                    return_type: None,
                    field_type: Some(field.type_ref.clone()),
                    type_parameters: Vec::new(),
                    path: class.path.clone(),
                    position: SourcePosition::new(field.line, 0),
                    doc: None,
                });
            }

            for method in &class.methods {
                self.add_entity(CodeEntity {
                    id: method.id_in(&class.name),
                    name: method.name.clone(),
                    qualified_name: format!("{}.{}", class.name, method.name),
                    kind: if method.constructor {
                        EntityKind::Constructor
                    } else {
                        EntityKind::Method
                    },
                    owner: Some(class_id.clone()),
                    modifiers: method.modifiers,
                    annotations: method.annotations.clone(),
                    parents: Vec::new(),
                    parameters: method.parameters.clone(),
                    return_type: method.return_type.clone(),
                    field_type: None,
                    type_parameters: Vec::new(),
                    path: class.path.clone(),
                    position: SourcePosition::new(method.line, 0),
                    doc: method.doc.clone(),
                });
            }
        }

        // Phase 2: inheritance
        for class in &snapshot.classes {
            let class_id = EntityId::new(class.name.as_str());
            for parent in &class.supertypes {
                self.add_inheritance(&class_id, &EntityId::new(parent.as_str()));
            }
        }

        // Phase 3: calls
        for class in &snapshot.classes {
            for method in &class.methods {
                let caller = method.id_in(&class.name);
                for call in &method.calls {
                    self.add_call(
                        &caller,
                        &EntityId::new(call.target.as_str()),
                        SourcePosition::new(call.line, call.column),
                    );
                }
            }
        }

        info!(stats = %self.stats(), "model ready");
    }
}

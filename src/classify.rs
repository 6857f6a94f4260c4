//! Project classification: which classes are tests, clients, mappings,
//! data access, data structures, interface structures or entry points,
//! and which component a class belongs to.
//!
//! Every category has a `*Name` pattern list matched against the simple
//! class name and a `*Path` list matched against the package.

use serde::{Deserialize, Serialize};

use crate::error::Warning;
use crate::filter::pattern::PatternList;
use crate::model::{package_of_qualified, simple_name_of, CodeEntity};

/// Architectural layer of a class, derived from the classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    EntryPoint,
    Client,
    Mapping,
    DataAccess,
    DataStructure,
    InterfaceStructure,
    Test,
}

/// Queries the engine asks about a class.
pub trait Classifier: Send + Sync {
    fn is_test(&self, class: &CodeEntity) -> bool;
    fn is_client(&self, class: &CodeEntity) -> bool;
    fn is_mapping(&self, class: &CodeEntity) -> bool;
    fn is_data_access(&self, class: &CodeEntity) -> bool;
    fn is_data_structure(&self, class: &CodeEntity) -> bool;
    fn is_interface_structure(&self, class: &CodeEntity) -> bool;
    fn is_entry_point(&self, class: &CodeEntity) -> bool;

    /// Whether a package belongs to the analysed projects.
    fn is_included_package(&self, package: &str) -> bool;

    /// Component tag of a class, if a component rule matches.
    fn component_of(&self, class: &CodeEntity) -> Option<String>;

    /// Package path used for grouping: start keywords stripped, cut before
    /// end keywords, limited to `levels` segments.
    fn diagram_path(&self, package: &str, levels: usize) -> String;

    /// First matching layer, checked from most to least specific.
    fn layer_of(&self, class: &CodeEntity) -> Option<Layer> {
        if self.is_test(class) {
            Some(Layer::Test)
        } else if self.is_entry_point(class) {
            Some(Layer::EntryPoint)
        } else if self.is_client(class) {
            Some(Layer::Client)
        } else if self.is_mapping(class) {
            Some(Layer::Mapping)
        } else if self.is_data_access(class) {
            Some(Layer::DataAccess)
        } else if self.is_interface_structure(class) {
            Some(Layer::InterfaceStructure)
        } else if self.is_data_structure(class) {
            Some(Layer::DataStructure)
        } else {
            None
        }
    }
}

/// Maps packages matching `package` to the component `tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRule {
    pub tag: String,
    pub package: String,
}

/// Classification rules as configured by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectClassification {
    /// Package prefixes of the analysed projects, `;`-separated. Empty
    /// means every package.
    pub included_projects: String,
    /// Leading package segments dropped from diagram paths.
    pub path_start_keywords: String,
    /// Diagram paths are cut before these trailing segments.
    pub path_end_keywords: String,
    pub is_client_path: String,
    pub is_client_name: String,
    pub is_test_path: String,
    pub is_test_name: String,
    pub is_mapping_path: String,
    pub is_mapping_name: String,
    pub is_data_access_path: String,
    pub is_data_access_name: String,
    pub is_data_structure_path: String,
    pub is_data_structure_name: String,
    pub is_interface_structures_path: String,
    pub is_interface_structures_name: String,
    pub is_entry_point_path: String,
    pub is_entry_point_name: String,
    pub components: Vec<ComponentRule>,
}

impl Default for ProjectClassification {
    fn default() -> Self {
        Self {
            included_projects: String::new(),
            path_start_keywords: String::new(),
            path_end_keywords: "impl".to_string(),
            is_client_path: String::new(),
            is_client_name: String::new(),
            is_test_path: String::new(),
            is_test_name: String::new(),
            is_mapping_path: String::new(),
            is_mapping_name: String::new(),
            is_data_access_path: String::new(),
            is_data_access_name: String::new(),
            is_data_structure_path: String::new(),
            is_data_structure_name: String::new(),
            is_interface_structures_path: String::new(),
            is_interface_structures_name: String::new(),
            is_entry_point_path: String::new(),
            is_entry_point_name: String::new(),
            components: Vec::new(),
        }
    }
}

impl ProjectClassification {
    /// Compile all pattern lists once. Malformed patterns become warnings.
    pub fn compile(&self, warnings: &mut Vec<Warning>) -> CompiledClassification {
        let rule = |name: &str, path: &str, label: &str, warnings: &mut Vec<Warning>| CategoryRule {
            name: PatternList::compile(&format!("is{}Name", label), name, warnings),
            path: PatternList::compile(&format!("is{}Path", label), path, warnings),
        };

        CompiledClassification {
            included_projects: split_keywords(&self.included_projects),
            path_start_keywords: split_keywords(&self.path_start_keywords),
            path_end_keywords: split_keywords(&self.path_end_keywords),
            client: rule(&self.is_client_name, &self.is_client_path, "Client", warnings),
            test: rule(&self.is_test_name, &self.is_test_path, "Test", warnings),
            mapping: rule(&self.is_mapping_name, &self.is_mapping_path, "Mapping", warnings),
            data_access: rule(
                &self.is_data_access_name,
                &self.is_data_access_path,
                "DataAccess",
                warnings,
            ),
            data_structure: rule(
                &self.is_data_structure_name,
                &self.is_data_structure_path,
                "DataStructure",
                warnings,
            ),
            interface_structure: rule(
                &self.is_interface_structures_name,
                &self.is_interface_structures_path,
                "InterfaceStructures",
                warnings,
            ),
            entry_point: rule(
                &self.is_entry_point_name,
                &self.is_entry_point_path,
                "EntryPoint",
                warnings,
            ),
            components: self
                .components
                .iter()
                .map(|c| {
                    (
                        c.tag.clone(),
                        PatternList::compile(&format!("component {}", c.tag), &c.package, warnings),
                    )
                })
                .collect(),
        }
    }
}

fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Default)]
struct CategoryRule {
    name: PatternList,
    path: PatternList,
}

impl CategoryRule {
    fn matches(&self, class: &CodeEntity) -> bool {
        let qualified = class.qualified_name.as_str();
        self.name.matches(simple_name_of(qualified)) || self.path.matches(package_of_qualified(qualified))
    }
}

/// [`ProjectClassification`] with its patterns compiled.
#[derive(Debug, Clone, Default)]
pub struct CompiledClassification {
    included_projects: Vec<String>,
    path_start_keywords: Vec<String>,
    path_end_keywords: Vec<String>,
    client: CategoryRule,
    test: CategoryRule,
    mapping: CategoryRule,
    data_access: CategoryRule,
    data_structure: CategoryRule,
    interface_structure: CategoryRule,
    entry_point: CategoryRule,
    components: Vec<(String, PatternList)>,
}

impl Classifier for CompiledClassification {
    fn is_test(&self, class: &CodeEntity) -> bool {
        class
            .path
            .as_deref()
            .is_some_and(|p| p.replace('\\', "/").contains("/test/"))
            || self.test.matches(class)
    }

    fn is_client(&self, class: &CodeEntity) -> bool {
        self.client.matches(class)
    }

    fn is_mapping(&self, class: &CodeEntity) -> bool {
        self.mapping.matches(class)
    }

    fn is_data_access(&self, class: &CodeEntity) -> bool {
        self.data_access.matches(class)
    }

    fn is_data_structure(&self, class: &CodeEntity) -> bool {
        self.data_structure.matches(class)
    }

    fn is_interface_structure(&self, class: &CodeEntity) -> bool {
        self.interface_structure.matches(class)
    }

    fn is_entry_point(&self, class: &CodeEntity) -> bool {
        self.entry_point.matches(class)
    }

    fn is_included_package(&self, package: &str) -> bool {
        self.included_projects.is_empty()
            || self
                .included_projects
                .iter()
                .any(|prefix| package.starts_with(prefix.as_str()))
    }

    fn component_of(&self, class: &CodeEntity) -> Option<String> {
        let package = class.package();
        self.components
            .iter()
            .find(|(_, patterns)| patterns.matches(package))
            .map(|(tag, _)| tag.clone())
    }

    fn diagram_path(&self, package: &str, levels: usize) -> String {
        let mut path = package.to_string();
        for keyword in &self.path_start_keywords {
            let prefix = format!("{}.", keyword);
            if let Some(pos) = path.find(&prefix) {
                path = path[pos + prefix.len()..].to_string();
            }
        }
        for keyword in &self.path_end_keywords {
            let suffix = format!(".{}", keyword);
            if let Some(pos) = path.find(&suffix) {
                path.truncate(pos);
            }
        }
        path.split('.')
            .filter(|s| !s.is_empty())
            .take(levels)
            .collect::<Vec<_>>()
            .join(".")
    }
}

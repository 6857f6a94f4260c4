//! Presentation settings per diagram kind.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// How raw nodes collapse into diagram nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Aggregation {
    /// One diagram node per entity.
    None,
    /// Members collapse into their owning class.
    GroupByClass,
    /// Classes collapse into their classification component.
    GroupByComponent,
    /// Classes collapse into their (truncated) package.
    GroupByPackage,
}

impl Aggregation {
    pub const ALL: [Aggregation; 4] = [
        Aggregation::None,
        Aggregation::GroupByClass,
        Aggregation::GroupByComponent,
        Aggregation::GroupByPackage,
    ];
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::None => write!(f, "NONE"),
            Aggregation::GroupByClass => write!(f, "GROUP_BY_CLASS"),
            Aggregation::GroupByComponent => write!(f, "GROUP_BY_COMPONENT"),
            Aggregation::GroupByPackage => write!(f, "GROUP_BY_PACKAGE"),
        }
    }
}

/// How call edges are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeMode {
    /// One edge per connected node pair.
    Direct,
    /// One edge per call site, numbered in call order.
    Ordered,
    /// One edge per connected node pair, labelled with its call count.
    Merged,
}

impl EdgeMode {
    pub const ALL: [EdgeMode; 3] = [EdgeMode::Direct, EdgeMode::Ordered, EdgeMode::Merged];
}

impl fmt::Display for EdgeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeMode::Direct => write!(f, "DIRECT"),
            EdgeMode::Ordered => write!(f, "ORDERED"),
            EdgeMode::Merged => write!(f, "MERGED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CallDiagramDetails {
    pub aggregation: Aggregation,
    pub edge_mode: EdgeMode,
    pub show_call_order: bool,
    pub show_method_parameter_names: bool,
    pub show_method_parameter_types: bool,
    pub show_method_return_type: bool,
    pub show_package_levels: usize,
    pub show_detailed_class_structure: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for CallDiagramDetails {
    fn default() -> Self {
        Self {
            aggregation: Aggregation::GroupByClass,
            edge_mode: EdgeMode::Direct,
            show_call_order: true,
            show_method_parameter_names: false,
            show_method_parameter_types: false,
            show_method_return_type: false,
            show_package_levels: 2,
            show_detailed_class_structure: false,
            extra: BTreeMap::new(),
        }
    }
}

fluent_setters!(CallDiagramDetails,
    strings: [],
    values: [
        aggregation: Aggregation,
        edge_mode: EdgeMode,
        show_call_order: bool,
        show_method_parameter_names: bool,
        show_method_parameter_types: bool,
        show_method_return_type: bool,
        show_package_levels: usize,
        show_detailed_class_structure: bool,
    ]
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StructureDiagramDetails {
    pub aggregation: Aggregation,
    pub show_methods: bool,
    pub show_method_parameter_names: bool,
    pub show_method_parameter_types: bool,
    pub show_method_return_type: bool,
    pub show_class_generic_types: bool,
    pub show_package_levels: usize,
    pub show_detailed_class_structure: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for StructureDiagramDetails {
    fn default() -> Self {
        Self {
            aggregation: Aggregation::None,
            show_methods: true,
            show_method_parameter_names: false,
            show_method_parameter_types: false,
            show_method_return_type: false,
            show_class_generic_types: true,
            show_package_levels: 99,
            show_detailed_class_structure: true,
            extra: BTreeMap::new(),
        }
    }
}

fluent_setters!(StructureDiagramDetails,
    strings: [],
    values: [
        aggregation: Aggregation,
        show_methods: bool,
        show_method_parameter_names: bool,
        show_method_parameter_types: bool,
        show_method_return_type: bool,
        show_class_generic_types: bool,
        show_package_levels: usize,
        show_detailed_class_structure: bool,
    ]
);

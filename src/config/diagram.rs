//! Per-diagram configurations and their named presets.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::details::{Aggregation, CallDiagramDetails, EdgeMode, StructureDiagramDetails};
use super::restriction::GraphRestriction;
use super::traversal::GraphTraversal;
use crate::diagram::DiagramKind;
use crate::error::TrellisError;

/// Version stamped into presets and serialized configurations.
pub const PRESET_VERSION: u32 = 1;

/// Shared surface of the three configuration types.
pub trait DiagramConfig: Serialize + DeserializeOwned + Clone + Default {
    const KIND: DiagramKind;
    /// Type name written into diagram metadata blocks.
    const NAME: &'static str;

    /// The tuned defaults a new diagram of this kind starts from.
    fn preset() -> Self;

    fn version(&self) -> u32;
    fn restriction(&self) -> &GraphRestriction;
    fn traversal(&self) -> &GraphTraversal;
}

// ─── Call ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CallConfiguration {
    pub version: u32,
    pub graph_restriction: GraphRestriction,
    pub graph_traversal: GraphTraversal,
    pub details: CallDiagramDetails,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for CallConfiguration {
    fn default() -> Self {
        Self {
            version: PRESET_VERSION,
            graph_restriction: GraphRestriction::default(),
            graph_traversal: GraphTraversal::default(),
            details: CallDiagramDetails::default(),
            extra: BTreeMap::new(),
        }
    }
}

impl DiagramConfig for CallConfiguration {
    const KIND: DiagramKind = DiagramKind::Call;
    const NAME: &'static str = "CallConfiguration";

    fn preset() -> Self {
        Self {
            graph_restriction: GraphRestriction::default()
                .cut_data_access(true)
                .cut_data_structures(true)
                .cut_interface_structures(true)
                .cut_constructors(true)
                .cut_getter_and_setter(true)
                .cut_enum(true)
                .cut_mappings(false),
            graph_traversal: GraphTraversal::default()
                .forward_depth(3)
                .backward_depth(3)
                .hide_data_structures(false)
                .hide_interface_calls(true)
                .hide_mappings(false)
                .hide_private_methods(true)
                .only_show_application_entry_points(false),
            details: CallDiagramDetails::default()
                .aggregation(Aggregation::GroupByClass)
                .edge_mode(EdgeMode::Direct)
                .show_method_parameter_types(false)
                .show_method_parameter_names(false)
                .show_method_return_type(false)
                .show_package_levels(2)
                .show_call_order(false)
                .show_detailed_class_structure(false),
            ..Self::default()
        }
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn restriction(&self) -> &GraphRestriction {
        &self.graph_restriction
    }

    fn traversal(&self) -> &GraphTraversal {
        &self.graph_traversal
    }
}

// ─── Structure ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StructureConfiguration {
    pub version: u32,
    pub graph_restriction: GraphRestriction,
    pub graph_traversal: GraphTraversal,
    pub details: StructureDiagramDetails,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for StructureConfiguration {
    fn default() -> Self {
        Self {
            version: PRESET_VERSION,
            graph_restriction: GraphRestriction::default(),
            graph_traversal: GraphTraversal::default(),
            details: StructureDiagramDetails::default(),
            extra: BTreeMap::new(),
        }
    }
}

impl DiagramConfig for StructureConfiguration {
    const KIND: DiagramKind = DiagramKind::Structure;
    const NAME: &'static str = "StructureConfiguration";

    fn preset() -> Self {
        Self {
            graph_restriction: GraphRestriction::default()
                .cut_data_access(false)
                .cut_data_structures(false)
                .cut_interface_structures(false)
                .cut_getter_and_setter(true)
                .cut_constructors(true)
                .cut_enum(true)
                .cut_mappings(false),
            graph_traversal: GraphTraversal::default()
                .forward_depth(6)
                .backward_depth(6)
                .hide_data_structures(false)
                .hide_interface_calls(false)
                .hide_mappings(false)
                .hide_private_methods(true)
                .only_show_application_entry_points(false),
            details: StructureDiagramDetails::default()
                .aggregation(Aggregation::GroupByClass)
                .show_method_parameter_names(true)
                .show_method_parameter_types(true)
                .show_method_return_type(true)
                .show_package_levels(2)
                .show_detailed_class_structure(true),
            ..Self::default()
        }
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn restriction(&self) -> &GraphRestriction {
        &self.graph_restriction
    }

    fn traversal(&self) -> &GraphTraversal {
        &self.graph_traversal
    }
}

// ─── Flow ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlowConfiguration {
    pub version: u32,
    pub graph_restriction: GraphRestriction,
    pub graph_traversal: GraphTraversal,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for FlowConfiguration {
    fn default() -> Self {
        Self {
            version: PRESET_VERSION,
            graph_restriction: GraphRestriction::default(),
            graph_traversal: GraphTraversal::default(),
            extra: BTreeMap::new(),
        }
    }
}

impl DiagramConfig for FlowConfiguration {
    const KIND: DiagramKind = DiagramKind::Flow;
    const NAME: &'static str = "FlowConfiguration";

    fn preset() -> Self {
        Self {
            graph_restriction: GraphRestriction::default()
                .cut_constructors(false)
                .cut_data_access(false)
                .cut_data_structures(false)
                .cut_interface_structures(false)
                .cut_getter_and_setter(false)
                .cut_enum(false)
                .cut_mappings(false),
            graph_traversal: GraphTraversal::default()
                .backward_depth(0)
                .forward_depth(999)
                .hide_data_structures(false)
                .hide_interface_calls(false)
                .hide_mappings(false)
                .hide_private_methods(false)
                .only_show_application_entry_points(false),
            ..Self::default()
        }
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn restriction(&self) -> &GraphRestriction {
        &self.graph_restriction
    }

    fn traversal(&self) -> &GraphTraversal {
        &self.graph_traversal
    }
}

// ─── Requests ───────────────────────────────────────────────────

/// The configuration of one diagram request.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagramConfiguration {
    Call(CallConfiguration),
    Structure(StructureConfiguration),
    Flow(FlowConfiguration),
}

impl DiagramConfiguration {
    pub fn kind(&self) -> DiagramKind {
        match self {
            DiagramConfiguration::Call(_) => DiagramKind::Call,
            DiagramConfiguration::Structure(_) => DiagramKind::Structure,
            DiagramConfiguration::Flow(_) => DiagramKind::Flow,
        }
    }

    /// The preset for a diagram kind.
    pub fn preset(kind: DiagramKind) -> Self {
        match kind {
            DiagramKind::Call => DiagramConfiguration::Call(CallConfiguration::preset()),
            DiagramKind::Structure => {
                DiagramConfiguration::Structure(StructureConfiguration::preset())
            }
            DiagramKind::Flow => DiagramConfiguration::Flow(FlowConfiguration::preset()),
        }
    }
}

// ─── Named Presets ──────────────────────────────────────────────

/// The shipped presets, addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    CallDefault,
    StructureDefault,
    FlowDefault,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::CallDefault, Preset::StructureDefault, Preset::FlowDefault];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::CallDefault => "call-default",
            Preset::StructureDefault => "structure-default",
            Preset::FlowDefault => "flow-default",
        }
    }

    pub fn kind(&self) -> DiagramKind {
        match self {
            Preset::CallDefault => DiagramKind::Call,
            Preset::StructureDefault => DiagramKind::Structure,
            Preset::FlowDefault => DiagramKind::Flow,
        }
    }

    pub fn for_kind(kind: DiagramKind) -> Self {
        match kind {
            DiagramKind::Call => Preset::CallDefault,
            DiagramKind::Structure => Preset::StructureDefault,
            DiagramKind::Flow => Preset::FlowDefault,
        }
    }

    /// The preset as a JSON value, the base user documents merge onto.
    pub fn to_value(&self) -> Value {
        let value = match self {
            Preset::CallDefault => serde_json::to_value(CallConfiguration::preset()),
            Preset::StructureDefault => serde_json::to_value(StructureConfiguration::preset()),
            Preset::FlowDefault => serde_json::to_value(FlowConfiguration::preset()),
        };
        value.unwrap_or(Value::Null)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Preset {
    type Err = TrellisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name() == s || p.kind().to_string() == s)
            .ok_or_else(|| TrellisError::Config(format!("unknown preset '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_preset_overrides() {
        let preset = CallConfiguration::preset();
        assert!(!preset.details.show_call_order);
        assert!(preset.graph_traversal.hide_private_methods);
        assert!(!preset.graph_restriction.cut_mappings);
        assert_eq!(preset.version, PRESET_VERSION);
    }

    #[test]
    fn test_flow_preset_walks_forward_only() {
        let preset = FlowConfiguration::preset();
        assert_eq!(preset.graph_traversal.forward_depth, 999);
        assert_eq!(preset.graph_traversal.backward_depth, 0);
        assert!(!preset.graph_traversal.hide_private_methods);
    }

    #[test]
    fn test_preset_names() {
        for preset in Preset::ALL {
            assert_eq!(preset.name().parse::<Preset>().unwrap(), preset);
            assert_eq!(Preset::for_kind(preset.kind()), preset);
        }
        assert_eq!("flow".parse::<Preset>().unwrap(), Preset::FlowDefault);
        assert!("fancy".parse::<Preset>().is_err());
    }
}

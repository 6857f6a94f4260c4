//! Diagram configuration: restriction, traversal and presentation settings,
//! presets, the commented-JSON exchange format and the tool settings file.

/// Generates consuming setters (`value.field(x)`) for configuration structs.
macro_rules! fluent_setters {
    ($ty:ty,
     strings: [$($s:ident),* $(,)?],
     values: [$($v:ident: $vt:ty),* $(,)?]
    ) => {
        impl $ty {
            $(
                pub fn $s(mut self, value: impl Into<String>) -> Self {
                    self.$s = value.into();
                    self
                }
            )*
            $(
                pub fn $v(mut self, value: $vt) -> Self {
                    self.$v = value;
                    self
                }
            )*
        }
    };
}

pub mod details;
pub mod diagram;
pub mod jsonc;
pub mod restriction;
pub mod settings;
pub mod traversal;

pub use details::{Aggregation, CallDiagramDetails, EdgeMode, StructureDiagramDetails};
pub use diagram::{
    CallConfiguration, DiagramConfig, DiagramConfiguration, FlowConfiguration, Preset,
    StructureConfiguration, PRESET_VERSION,
};
pub use jsonc::{
    merge_with_defaults, metadata_block, parse_config, parse_configuration, parse_metadata_block,
    strip_comments, to_commented_json,
};
pub use restriction::GraphRestriction;
pub use settings::{Limits, LoggingSettings, Settings};
pub use traversal::GraphTraversal;

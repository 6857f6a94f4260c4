//! Traversal settings: how far the walk goes and which edges it follows.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

use crate::error::Warning;

/// Depth bounds and traversal-scoped filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphTraversal {
    /// Hops followed from the root towards callees. 0 disables the direction.
    pub forward_depth: i64,
    /// Hops followed from the root towards callers. 0 disables the direction.
    pub backward_depth: i64,
    pub class_package_exclude_filter: String,
    pub class_package_include_filter: String,
    pub class_name_exclude_filter: String,
    pub class_name_include_filter: String,
    pub method_name_exclude_filter: String,
    pub method_name_include_filter: String,
    pub hide_mappings: bool,
    pub hide_data_structures: bool,
    pub hide_private_methods: bool,
    pub hide_interface_calls: bool,
    pub only_show_application_entry_points: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for GraphTraversal {
    fn default() -> Self {
        Self {
            forward_depth: 3,
            backward_depth: 3,
            class_package_exclude_filter: String::new(),
            class_package_include_filter: String::new(),
            class_name_exclude_filter: String::new(),
            class_name_include_filter: String::new(),
            method_name_exclude_filter: String::new(),
            method_name_include_filter: String::new(),
            hide_mappings: true,
            hide_data_structures: true,
            hide_private_methods: false,
            hide_interface_calls: true,
            only_show_application_entry_points: false,
            extra: BTreeMap::new(),
        }
    }
}

impl GraphTraversal {
    /// Effective `(forward, backward)` bounds. Negative depths become 0 and
    /// depths above `max_depth` are clamped; both produce a warning.
    pub fn depth_bounds(&self, max_depth: u32, warnings: &mut Vec<Warning>) -> (usize, usize) {
        (
            clamp_depth("forwardDepth", self.forward_depth, max_depth, warnings),
            clamp_depth("backwardDepth", self.backward_depth, max_depth, warnings),
        )
    }
}

fn clamp_depth(field: &str, depth: i64, max_depth: u32, warnings: &mut Vec<Warning>) -> usize {
    let max = i64::from(max_depth);
    let clamped = depth.clamp(0, max);
    if clamped != depth {
        warn!(field, depth, clamped, "depth out of range");
        warnings.push(Warning::configuration(format!(
            "{} {} is outside 0..={}, using {}",
            field, depth, max_depth, clamped
        )));
    }
    clamped as usize
}

fluent_setters!(GraphTraversal,
    strings: [
        class_package_exclude_filter,
        class_package_include_filter,
        class_name_exclude_filter,
        class_name_include_filter,
        method_name_exclude_filter,
        method_name_include_filter,
    ],
    values: [
        forward_depth: i64,
        backward_depth: i64,
        hide_mappings: bool,
        hide_data_structures: bool,
        hide_private_methods: bool,
        hide_interface_calls: bool,
        only_show_application_entry_points: bool,
    ]
);

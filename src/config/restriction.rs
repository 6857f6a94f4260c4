//! Restriction settings: which entities may appear in a diagram at all.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Filters and cut flags evaluated for every entity before it enters a
/// diagram.
///
/// Pattern fields hold `;`-separated wildcard patterns (see
/// [`PatternList`](crate::filter::PatternList)); an empty string means no
/// restriction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphRestriction {
    pub class_package_exclude_filter: String,
    pub class_package_include_filter: String,
    pub class_name_exclude_filter: String,
    pub class_name_include_filter: String,
    pub method_name_exclude_filter: String,
    pub method_name_include_filter: String,
    /// Removes classes with an ancestor whose simple name matches.
    pub remove_by_inheritance: String,
    /// Removes entities annotated (directly or through their class or its
    /// ancestors) with a matching annotation.
    pub remove_by_annotation: String,
    pub remove_by_class_package: String,
    pub remove_by_class_name: String,
    pub cut_mappings: bool,
    pub cut_enum: bool,
    pub cut_tests: bool,
    pub cut_client: bool,
    pub cut_data_access: bool,
    pub cut_interface_structures: bool,
    pub cut_data_structures: bool,
    pub cut_getter_and_setter: bool,
    pub cut_constructors: bool,
    /// Fields this version does not know, kept for lossless round-trips.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for GraphRestriction {
    fn default() -> Self {
        Self {
            class_package_exclude_filter: String::new(),
            class_package_include_filter: String::new(),
            class_name_exclude_filter: String::new(),
            class_name_include_filter: String::new(),
            method_name_exclude_filter: String::new(),
            method_name_include_filter: String::new(),
            remove_by_inheritance: String::new(),
            remove_by_annotation: String::new(),
            remove_by_class_package: String::new(),
            remove_by_class_name: String::new(),
            cut_mappings: false,
            cut_enum: true,
            cut_tests: true,
            cut_client: true,
            cut_data_access: true,
            cut_interface_structures: true,
            cut_data_structures: true,
            cut_getter_and_setter: true,
            cut_constructors: true,
            extra: BTreeMap::new(),
        }
    }
}

impl GraphRestriction {
    /// A restriction that lets everything through.
    pub fn permissive() -> Self {
        Self {
            cut_enum: false,
            cut_tests: false,
            cut_client: false,
            cut_data_access: false,
            cut_interface_structures: false,
            cut_data_structures: false,
            cut_getter_and_setter: false,
            cut_constructors: false,
            ..Self::default()
        }
    }
}

fluent_setters!(GraphRestriction,
    strings: [
        class_package_exclude_filter,
        class_package_include_filter,
        class_name_exclude_filter,
        class_name_include_filter,
        method_name_exclude_filter,
        method_name_include_filter,
        remove_by_inheritance,
        remove_by_annotation,
        remove_by_class_package,
        remove_by_class_name,
    ],
    values: [
        cut_mappings: bool,
        cut_enum: bool,
        cut_tests: bool,
        cut_client: bool,
        cut_data_access: bool,
        cut_interface_structures: bool,
        cut_data_structures: bool,
        cut_getter_and_setter: bool,
        cut_constructors: bool,
    ]
);

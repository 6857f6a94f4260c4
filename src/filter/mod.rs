//! Entity filters: name patterns, the restriction filter and the
//! traversal filter.

pub mod pattern;
pub mod restriction;
pub mod traversal;

pub use pattern::{NameFilter, PatternList};
pub use restriction::RestrictionFilter;
pub use traversal::TraversalFilter;

//! Code model: the entities diagrams are built from and the query trait
//! the engine reads them through.

pub mod facade;
pub mod memory;
pub mod snapshot;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use facade::CodeModel;
pub use memory::{InMemoryCodeModel, ModelEdge, ModelEdgeKind, ModelStats};
pub use snapshot::{CallSnapshot, ClassSnapshot, FieldSnapshot, MethodSnapshot, ModelSnapshot};
pub use types::*;

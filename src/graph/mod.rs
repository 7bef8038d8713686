//! Graph element model
//!
//! Vertices and edges built on the per-element gate. Elements hold only
//! ids, never references to each other; the sharded store is the single
//! arena owning them.

pub mod edge;
pub mod element;
pub mod property;
pub mod types;
pub mod vertex;

pub use edge::Edge;
pub use element::GraphElement;
pub use property::{PropertySet, PropertyValue};
pub use types::{ComparisonOperator, EdgeTypeId, ElementId, PropertyId};
pub use vertex::{AdjacencyGroups, Vertex};

//! Graph model and its construction from flow snapshots.
//!
//! ## Submodules
//!
//! - [`graph`]: [`GraphModel`], [`Node`], [`Edge`] and the builder
//! - [`parallel`]: curve offsets for edges sharing an endpoint pair
//! - [`export`]: JSON and Graphviz output
//!
//! ## Data Flow
//!
//! ```text
//! RawResultSet (validated JSON)
//!        │
//!        ▼
//! GraphModel::build()
//!        │
//!        ├──▶ Node per endpoint (shape/style from endpoint type)
//!        │
//!        └──▶ Edge per non-zero sample ──▶ separate_parallel_edges()
//! ```

pub mod export;
pub mod graph;
pub mod parallel;

pub use export::ExportFormat;
pub use graph::{
    display_label, Edge, EdgeColor, EndpointKind, GraphModel, Node, NodeShape, NodeStyle,
};
pub use parallel::{separate_parallel_edges, EdgeRoute, LoopPosition};

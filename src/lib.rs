//! # fission-flow
//!
//! A terminal data-flow visualizer for Fission functions.
//!
//! The crate asks the Fission data-flow function for recorded calls between
//! functions and message queues, turns the flat sample list into a call
//! graph, and draws it in an interactive terminal UI.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌─────────┐ │
//! │  │  app    │───▶│   data   │───▶│ render  │───▶│   ui    │ │
//! │  │ (state) │    │ (graph)  │    │(layout) │    │(ratatui)│ │
//! │  └────┬────┘    └──────────┘    └─────────┘    └─────────┘ │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  ┌─────────┐                                                │
//! │  │ source  │◀── HttpSource (MetricsClient) | FileSource    │
//! │  │ (input) │                                                │
//! │  └─────────┘                                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: The root container: current graph, form, view navigation
//! - **[`source`]**: [`DataSource`] trait, the HTTP [`MetricsClient`] and the
//!   result-set schema
//! - **[`data`]**: [`GraphModel`] construction, parallel-edge separation and export
//! - **[`render`]**: [`GraphRenderer`] lifecycle, layered layout and the canvas [`Scene`]
//! - **[`form`]**: Query input and conversion to a [`FlowQuery`]
//! - **[`ui`]**: Terminal views, status bar and theme
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Query the backend
//! fission-flow --url http://192.168.39.129:31314
//!
//! # Replay a saved response
//! fission-flow --file flow.json
//!
//! # Export the graph as Graphviz and exit
//! fission-flow --time 1672531200 --step 5m --export flow.dot --format dot
//! ```
//!
//! ### As a library
//!
//! ```
//! use fission_flow::{GraphModel, RawResultSet};
//!
//! let set = RawResultSet::from_json(r#"{
//!     "result": [{
//!         "metric": {"source": "ns.fnA", "destination": "ns.fnB",
//!                    "stype": "func", "dtype": "func", "code": "200"},
//!         "value": [1672531200, "1.5"]
//!     }]
//! }"#).unwrap();
//!
//! let graph = GraphModel::build(&set);
//! assert_eq!(graph.nodes.len(), 2);
//! assert_eq!(graph.edges[0].label, "1.50(code:200)");
//! ```
//!
//! ### Driving the app with a file source
//!
//! ```
//! use fission_flow::{App, CanvasSettings, FileSource};
//!
//! let source = Box::new(FileSource::new("flow.json"));
//! let mut app = App::new(source, CanvasSettings::default());
//! app.start();
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod form;
pub mod logging;
pub mod render;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::{CanvasSettings, Settings};
pub use data::{Edge, EdgeColor, EdgeRoute, GraphModel, Node, NodeShape};
pub use error::FlowError;
pub use form::{Form, FormError, Submission};
pub use render::{GraphRenderer, GraphSurface, Scene};
pub use source::{
    DataSource, FileSource, FlowQuery, HttpSource, MetricsClient, RawResultSet, Sample,
};

//! Data source abstraction for receiving flow snapshots.
//!
//! The root container asks a source for a snapshot with
//! [`DataSource::request`] and picks results up with [`DataSource::poll`]
//! from its UI loop, so neither side ever blocks on the network.

mod client;
mod file;
mod http;
mod result;

pub use client::{
    FlowQuery, MetricsClient, MetricsClientBuilder, SOURCE_HEADER, SOURCE_TYPE_HEADER,
};
pub use file::FileSource;
pub use http::HttpSource;
pub use result::{RawResultSet, Sample, SampleMetric, SampleValue, STATUS_SUCCESS};

use std::fmt::Debug;

/// Trait for obtaining flow snapshots from various backends.
///
/// # Example
///
/// ```
/// use fission_flow::{DataSource, FileSource, FlowQuery};
///
/// let mut source = FileSource::new("flow.json");
/// source.request(FlowQuery::default());
/// if let Some(set) = source.poll() {
///     println!("Got {} samples", set.len());
/// }
/// ```
pub trait DataSource: Send + Debug {
    /// Ask for a snapshot matching `query`.
    ///
    /// Must not block. The result becomes available through `poll`.
    fn request(&mut self, query: FlowQuery);

    /// Return the most recent snapshot that arrived since the last poll.
    ///
    /// Returns `None` when nothing new is available. Non-blocking.
    fn poll(&mut self) -> Option<RawResultSet>;

    /// Human-readable description of the source, shown in the status bar.
    fn description(&self) -> &str;

    /// Error from the most recent completed request, if it failed.
    fn error(&self) -> Option<&str>;

    /// Requests issued but not yet reported back.
    fn pending(&self) -> usize {
        0
    }
}

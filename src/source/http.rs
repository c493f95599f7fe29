//! HTTP-backed data source.
//!
//! Each request runs as its own task on a tokio runtime and reports back
//! through a channel. Overlapping requests are not cancelled: whichever
//! response resolves last is the one the UI ends up showing.

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::{DataSource, FlowQuery, MetricsClient, RawResultSet};
use crate::error::FlowError;

/// A data source that fetches snapshots from the data-flow backend.
#[derive(Debug)]
pub struct HttpSource {
    client: MetricsClient,
    handle: Handle,
    sender: mpsc::UnboundedSender<Result<RawResultSet, FlowError>>,
    receiver: mpsc::UnboundedReceiver<Result<RawResultSet, FlowError>>,
    description: String,
    last_error: Option<String>,
    in_flight: usize,
}

impl HttpSource {
    /// Create a source that spawns its requests on `handle`.
    pub fn new(client: MetricsClient, handle: Handle) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let description = format!("http: {}", client.url());
        Self {
            client,
            handle,
            sender,
            receiver,
            description,
            last_error: None,
            in_flight: 0,
        }
    }
}

impl DataSource for HttpSource {
    fn request(&mut self, query: FlowQuery) {
        info!(query = %query.describe(), "requesting flow snapshot");
        let client = self.client.clone();
        let sender = self.sender.clone();
        self.in_flight += 1;

        self.handle.spawn(async move {
            let result = client.fetch(&query).await;
            // Receiver gone means the app is shutting down.
            let _ = sender.send(result);
        });
    }

    fn poll(&mut self) -> Option<RawResultSet> {
        let mut latest = None;

        while let Ok(result) = self.receiver.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            match result {
                Ok(set) => {
                    self.last_error = None;
                    latest = Some(set);
                }
                Err(e) => {
                    warn!(error = %e, "flow snapshot request failed");
                    self.last_error = Some(e.to_string());
                }
            }
        }

        latest
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn pending(&self) -> usize {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::{routing::post, Router};

    const BODY: &str = r#"{"result": [{
        "metric": {"source": "ns.a", "destination": "ns.b", "stype": "func", "dtype": "kafka", "code": "200"},
        "value": [0, "2"]
    }]}"#;

    async fn spawn_backend(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn poll_until<F>(source: &mut HttpSource, mut done: F) -> Option<RawResultSet>
    where
        F: FnMut(&HttpSource) -> bool,
    {
        for _ in 0..100 {
            if let Some(set) = source.poll() {
                return Some(set);
            }
            if done(source) {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        None
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_http_source_delivers_snapshot() {
        let router = Router::new().route(
            crate::config::DEFAULT_PATH,
            post(|| async { BODY }),
        );
        let base = spawn_backend(router).await;
        let client = MetricsClient::builder().base_url(&base).build().unwrap();
        let mut source = HttpSource::new(client, Handle::current());

        assert!(source.description().starts_with("http: http://127.0.0.1:"));
        assert!(source.poll().is_none());

        source.request(FlowQuery::default());
        assert_eq!(source.pending(), 1);

        let set = poll_until(&mut source, |_| false).await.expect("snapshot");
        assert_eq!(set.len(), 1);
        assert_eq!(source.pending(), 0);
        assert!(source.error().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_http_source_records_errors() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = MetricsClient::builder()
            .base_url(format!("http://{}", addr))
            .build()
            .unwrap();
        let mut source = HttpSource::new(client, Handle::current());
        source.request(FlowQuery::default());

        let got = poll_until(&mut source, |s| s.error().is_some()).await;
        assert!(got.is_none());
        assert!(source.error().is_some());
        assert_eq!(source.pending(), 0);
    }
}

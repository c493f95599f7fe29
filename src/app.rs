//! Application state and navigation logic.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use ratatui::widgets::TableState;
use tracing::{info, warn};

use crate::config::CanvasSettings;
use crate::data::{export, ExportFormat, GraphModel};
use crate::form::{Field, Form, FormError};
use crate::render::{GraphRenderer, RendererState, Scene};
use crate::source::{DataSource, FlowQuery};
use crate::ui::Theme;

/// How long a status message stays visible.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// The call graph drawn on a canvas.
    Graph,
    /// All edges as a table.
    Edges,
}

impl View {
    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::Graph => View::Edges,
            View::Edges => View::Graph,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        // Two views: previous and next coincide.
        self.next()
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Graph => "Graph",
            View::Edges => "Edges",
        }
    }
}

/// Main application state.
///
/// Holds the one piece of domain state, the current [`GraphModel`], and
/// hands every replacement to the renderer.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    // Data source
    source: Box<dyn DataSource>,
    pub last_query: FlowQuery,
    pub load_error: Option<String>,
    pub last_updated: Option<Instant>,

    // Graph state
    graph: Arc<GraphModel>,
    renderer: GraphRenderer<Scene>,

    // Input form
    pub form: Form,
    /// Field being edited, if the form has keyboard focus.
    pub editing: Option<Field>,

    // Navigation state
    pub selected_edge: usize,
    /// Scroll state of the edge table, kept between frames.
    pub edge_table: TableState,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App with the given data source.
    ///
    /// The renderer is bound to an empty graph right away, so the canvas
    /// exists before the first response arrives.
    pub fn new(source: Box<dyn DataSource>, canvas: CanvasSettings) -> Self {
        let graph = Arc::new(GraphModel::default());
        let mut renderer = GraphRenderer::new(canvas);
        renderer.update(&graph);

        Self {
            running: true,
            current_view: View::Graph,
            show_help: false,
            source,
            last_query: FlowQuery::default(),
            load_error: None,
            last_updated: None,
            graph,
            renderer,
            form: Form::new(),
            editing: None,
            selected_edge: 0,
            edge_table: TableState::default(),
            theme: Theme::auto_detect(),
            status_message: None,
        }
    }

    /// Issue the initial request for the latest data, without parameters.
    pub fn start(&mut self) {
        self.request(FlowQuery::default());
    }

    /// Returns a description of the current data source.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    /// Requests the source has not answered yet.
    pub fn pending_requests(&self) -> usize {
        self.source.pending()
    }

    /// The graph currently shown.
    pub fn graph(&self) -> &Arc<GraphModel> {
        &self.graph
    }

    pub fn renderer_state(&self) -> RendererState {
        self.renderer.state()
    }

    /// The drawing surface, once created.
    pub fn scene(&self) -> Option<&Scene> {
        self.renderer.surface()
    }

    /// Send a query to the data source.
    pub fn request(&mut self, query: FlowQuery) {
        info!(query = %query.describe(), source = %self.source.description(), "requesting data flow");
        self.last_query = query.clone();
        self.source.request(query);
    }

    /// Submit the form, requesting data for its instant and span.
    ///
    /// On an invalid instant nothing is requested and the form keeps focus.
    pub fn submit(&mut self) -> Result<(), FormError> {
        let submission = self.form.submit().inspect_err(|e| {
            warn!(error = %e, "form submission rejected");
        })?;
        self.editing = None;
        self.request(submission.into_query());
        Ok(())
    }

    /// Repeat the last query.
    pub fn retry(&mut self) {
        let query = self.last_query.clone();
        self.request(query);
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < STATUS_MESSAGE_TTL {
                return Some(msg);
            }
        }
        None
    }

    /// Poll the data source for new data.
    ///
    /// Returns Ok(true) if a new graph was installed, Ok(false) otherwise.
    /// Source errors keep the previous graph and are recorded for the
    /// status bar.
    pub fn reload_data(&mut self) -> Result<bool> {
        if let Some(set) = self.source.poll() {
            let failed = set.failed_queries();
            let model = GraphModel::build(&set);
            info!(
                samples = set.len(),
                nodes = model.nodes.len(),
                edges = model.edges.len(),
                "graph rebuilt"
            );
            self.replace_graph(model);
            self.load_error = None;
            self.last_updated = Some(Instant::now());
            if !failed.is_empty() {
                self.set_status_message(format!(
                    "Partial data: {} query failed",
                    failed.join(", ")
                ));
            }
            return Ok(true);
        }

        // Check for errors from the source
        if let Some(err) = self.source.error() {
            self.load_error = Some(err.to_string());
        }
        Ok(false)
    }

    /// Install a new graph and hand it to the renderer.
    pub fn replace_graph(&mut self, model: GraphModel) {
        self.graph = Arc::new(model);
        self.renderer.update(&self.graph);

        // Clamp selection index
        if self.selected_edge >= self.graph.edges.len() {
            self.selected_edge = self.graph.edges.len().saturating_sub(1);
        }
    }

    /// Switch to the next view.
    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.current_view = self.current_view.prev();
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
    }

    /// Move selection down by one edge.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection up by one edge.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move selection down by n edges.
    pub fn select_next_n(&mut self, n: usize) {
        let max = self.graph.edges.len().saturating_sub(1);
        self.selected_edge = (self.selected_edge + n).min(max);
    }

    /// Move selection up by n edges.
    pub fn select_prev_n(&mut self, n: usize) {
        self.selected_edge = self.selected_edge.saturating_sub(n);
    }

    /// Jump to the first edge.
    pub fn select_first(&mut self) {
        self.selected_edge = 0;
    }

    /// Jump to the last edge.
    pub fn select_last(&mut self) {
        self.selected_edge = self.graph.edges.len().saturating_sub(1);
    }

    /// Index of the selected edge, if there is any edge.
    pub fn selection(&self) -> Option<usize> {
        if self.graph.edges.is_empty() {
            None
        } else {
            Some(self.selected_edge)
        }
    }

    /// Give a form field keyboard focus.
    pub fn start_editing(&mut self, field: Field) {
        self.form.focus = field;
        self.editing = Some(field);
    }

    /// Return keyboard focus to the views, keeping the typed values.
    pub fn stop_editing(&mut self) {
        self.editing = None;
    }

    /// Move focus to the other form field.
    pub fn toggle_field(&mut self) {
        let next = match self.form.focus {
            Field::Instant => Field::Span,
            Field::Span => Field::Instant,
        };
        self.start_editing(next);
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export the current graph to a JSON file.
    pub fn export_graph(&self, path: &Path) -> Result<()> {
        if self.last_updated.is_none() {
            bail!("No data to export");
        }
        export::write_to_file(&self.graph, ExportFormat::Json, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{RawResultSet, Sample};

    /// A source that hands out queued result sets and records requests.
    #[derive(Debug, Default)]
    struct ScriptedSource {
        queue: Vec<RawResultSet>,
        requests: Arc<std::sync::Mutex<Vec<FlowQuery>>>,
        error: Option<String>,
    }

    impl DataSource for ScriptedSource {
        fn request(&mut self, query: FlowQuery) {
            self.requests.lock().unwrap().push(query);
        }

        fn poll(&mut self) -> Option<RawResultSet> {
            if self.queue.is_empty() {
                None
            } else {
                Some(self.queue.remove(0))
            }
        }

        fn description(&self) -> &str {
            "scripted"
        }

        fn error(&self) -> Option<&str> {
            self.error.as_deref()
        }
    }

    fn set(samples: Vec<Sample>) -> RawResultSet {
        RawResultSet {
            result: samples,
            ..RawResultSet::default()
        }
    }

    fn app_with(queue: Vec<RawResultSet>) -> (App, Arc<std::sync::Mutex<Vec<FlowQuery>>>) {
        let source = ScriptedSource {
            queue,
            ..ScriptedSource::default()
        };
        let requests = Arc::clone(&source.requests);
        (App::new(Box::new(source), CanvasSettings::default()), requests)
    }

    #[test]
    fn new_app_binds_empty_graph() {
        let (app, requests) = app_with(vec![]);
        assert_eq!(app.renderer_state(), RendererState::Bound);
        assert!(app.graph().is_empty());
        assert_eq!(app.scene().unwrap().renders(), 1);
        assert!(requests.lock().unwrap().is_empty());
    }

    #[test]
    fn start_requests_latest_data() {
        let (mut app, requests) = app_with(vec![]);
        app.start();
        assert_eq!(*requests.lock().unwrap(), vec![FlowQuery::default()]);
    }

    #[test]
    fn reload_replaces_graph_and_rerenders() {
        let (mut app, _) = app_with(vec![set(vec![Sample::new(
            "ns.fnA", "func", "ns.fnB", "func", "200", "1.5",
        )])]);

        assert!(app.reload_data().unwrap());
        assert_eq!(app.graph().nodes.len(), 2);
        assert_eq!(app.graph().edges.len(), 1);
        assert!(app.last_updated.is_some());

        let scene = app.scene().unwrap();
        assert_eq!(scene.renders(), 2);
        assert_eq!(scene.layout().nodes.len(), 2);

        // Nothing new
        assert!(!app.reload_data().unwrap());
        assert_eq!(app.scene().unwrap().renders(), 2);
    }

    #[test]
    fn source_error_keeps_previous_graph() {
        let (mut app, _) = app_with(vec![set(vec![Sample::new(
            "a", "func", "b", "func", "200", "1",
        )])]);
        app.reload_data().unwrap();
        let before = Arc::clone(app.graph());

        app.source = Box::new(ScriptedSource {
            error: Some("connection refused".to_string()),
            ..ScriptedSource::default()
        });
        assert!(!app.reload_data().unwrap());
        assert_eq!(app.load_error.as_deref(), Some("connection refused"));
        assert!(Arc::ptr_eq(&before, app.graph()));
    }

    #[test]
    fn submit_sends_form_values() {
        let (mut app, requests) = app_with(vec![]);
        app.form.instant = String::new();
        app.form.span = "5m".to_string();
        app.editing = Some(Field::Span);

        app.submit().unwrap();
        assert_eq!(app.editing, None);
        assert_eq!(*requests.lock().unwrap(), vec![FlowQuery::new("", "5m")]);
        assert_eq!(app.last_query.step.as_deref(), Some("5m"));
    }

    #[test]
    fn invalid_submit_requests_nothing() {
        let (mut app, requests) = app_with(vec![]);
        app.form.instant = "not a time".to_string();
        app.editing = Some(Field::Instant);

        assert!(app.submit().is_err());
        assert_eq!(app.editing, Some(Field::Instant));
        assert!(requests.lock().unwrap().is_empty());
    }

    #[test]
    fn retry_repeats_last_query() {
        let (mut app, requests) = app_with(vec![]);
        app.request(FlowQuery::new("1672531200", "1m"));
        app.retry();
        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], requests[1]);
    }

    #[test]
    fn selection_is_clamped_to_edges() {
        let (mut app, _) = app_with(vec![
            set(vec![
                Sample::new("a", "func", "b", "func", "200", "1"),
                Sample::new("b", "func", "c", "func", "200", "1"),
                Sample::new("c", "func", "d", "func", "200", "1"),
            ]),
            set(vec![Sample::new("a", "func", "b", "func", "200", "1")]),
        ]);
        assert_eq!(app.selection(), None);

        app.reload_data().unwrap();
        app.select_last();
        assert_eq!(app.selection(), Some(2));
        app.select_next_n(10);
        assert_eq!(app.selection(), Some(2));

        app.reload_data().unwrap();
        assert_eq!(app.selection(), Some(0));
    }

    #[test]
    fn export_requires_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flow.json");

        let (mut app, _) = app_with(vec![set(vec![Sample::new(
            "a", "func", "b", "func", "200", "1",
        )])]);
        assert!(app.export_graph(&path).is_err());

        app.reload_data().unwrap();
        app.export_graph(&path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["edges"][0]["label"], "1.00(code:200)");
    }

    #[test]
    fn view_cycles() {
        assert_eq!(View::Graph.next(), View::Edges);
        assert_eq!(View::Edges.next(), View::Graph);
        assert_eq!(View::Graph.prev(), View::Edges);
    }
}

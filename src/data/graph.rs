//! Call-graph construction from a raw result set.
//!
//! [`GraphModel::build`] turns the flat list of samples into one node per
//! endpoint and one edge per non-zero observation, then spreads parallel
//! edges apart. The model is rebuilt wholesale for every snapshot.

use std::collections::HashMap;

use serde::Serialize;

use super::parallel::{separate_parallel_edges, EdgeRoute};
use crate::source::{RawResultSet, Sample};

/// Status code the recorder uses when it saw no response.
const CODE_NONE: &str = "0";
const CODE_UNKNOWN: &str = "unknown";
const CODE_OK: &str = "200";

/// Endpoint type declared by the recorder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    /// A Fission function.
    Func,
    Kafka,
    AzureQueue,
    Nats,
    /// Anything else (router, http trigger, ...), kept verbatim.
    Other(String),
}

impl EndpointKind {
    /// Message-queue endpoints share one visual style.
    pub fn is_queue(&self) -> bool {
        matches!(
            self,
            EndpointKind::Kafka | EndpointKind::AzureQueue | EndpointKind::Nats
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            EndpointKind::Func => "func",
            EndpointKind::Kafka => "kafka",
            EndpointKind::AzureQueue => "azurequeue",
            EndpointKind::Nats => "nats",
            EndpointKind::Other(s) => s,
        }
    }
}

impl From<&str> for EndpointKind {
    fn from(s: &str) -> Self {
        match s {
            "func" => EndpointKind::Func,
            "kafka" => EndpointKind::Kafka,
            "azurequeue" => EndpointKind::AzureQueue,
            "nats" => EndpointKind::Nats,
            other => EndpointKind::Other(other.to_string()),
        }
    }
}

/// Node glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
    Triangle,
    Rect,
    /// No override; the renderer's default (a circle).
    Default,
}

/// Stroke and fill of a styled node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeStyle {
    pub line_width: u32,
    pub stroke: &'static str,
    pub fill: &'static str,
}

const FUNC_STYLE: NodeStyle = NodeStyle {
    line_width: 2,
    stroke: "#5B8FF9",
    fill: "#C6E5FF",
};

const QUEUE_STYLE: NodeStyle = NodeStyle {
    line_width: 2,
    stroke: "#1bde8a",
    fill: "#12eaaa",
};

/// An endpoint in the call graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    /// Raw endpoint id; node identity.
    pub id: String,
    /// Display name.
    pub label: String,
    pub kind: EndpointKind,
    pub shape: NodeShape,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<[u32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<NodeStyle>,
}

impl Node {
    /// Create a node, deriving label and appearance from id and type.
    pub fn new(id: &str, kind: EndpointKind) -> Self {
        let (shape, size, style) = if kind == EndpointKind::Func {
            (NodeShape::Triangle, Some([15, 6]), Some(FUNC_STYLE))
        } else if kind.is_queue() {
            (NodeShape::Rect, Some([30, 20]), Some(QUEUE_STYLE))
        } else {
            (NodeShape::Default, None, None)
        };

        Self {
            id: id.to_string(),
            label: display_label(id),
            kind,
            shape,
            size,
            style,
        }
    }
}

/// Edge color by status code class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeColor {
    /// No status observed.
    Gray,
    /// 200 OK.
    Green,
    /// Any other status.
    Red,
}

impl EdgeColor {
    /// Color for a normalized status code.
    pub fn for_code(code: &str) -> Self {
        match code {
            CODE_NONE => EdgeColor::Gray,
            CODE_OK => EdgeColor::Green,
            _ => EdgeColor::Red,
        }
    }

    pub fn hex(&self) -> &'static str {
        match self {
            EdgeColor::Gray => "#aab4b4",
            EdgeColor::Green => "#00ff00",
            EdgeColor::Red => "#ff0000",
        }
    }
}

/// An observed call from one endpoint to another.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    /// Observed rate (calls per minute).
    pub value: f64,
    /// Normalized status code ("unknown" becomes "0").
    pub code: String,
    pub label: String,
    pub color: EdgeColor,
    pub dashed: bool,
    pub end_arrow: bool,
    pub route: EdgeRoute,
}

impl Edge {
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// The node/edge structure handed to the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphModel {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphModel {
    /// Build a graph model from a result set.
    pub fn build(set: &RawResultSet) -> Self {
        Self::from_samples(&set.result)
    }

    /// Build a graph model from samples.
    pub fn from_samples(samples: &[Sample]) -> Self {
        // First pass: distinct endpoints in first-seen order, last type wins.
        let mut order: Vec<&str> = Vec::new();
        let mut kinds: HashMap<&str, &str> = HashMap::new();

        for sample in samples {
            let m = &sample.metric;
            for (id, kind) in [(&m.source, &m.stype), (&m.destination, &m.dtype)] {
                if kinds.insert(id.as_str(), kind.as_str()).is_none() {
                    order.push(id.as_str());
                }
            }
        }

        let nodes: Vec<Node> = order
            .iter()
            .map(|id| Node::new(id, EndpointKind::from(kinds[id])))
            .collect();

        // Second pass: one edge per non-zero observation.
        let mut edges: Vec<Edge> = samples
            .iter()
            .filter(|s| !s.value.is_zero())
            .map(edge_from_sample)
            .collect();

        separate_parallel_edges(&mut edges);

        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Number of edges of each color.
    pub fn color_counts(&self) -> HashMap<EdgeColor, usize> {
        let mut counts = HashMap::new();
        for edge in &self.edges {
            *counts.entry(edge.color).or_default() += 1;
        }
        counts
    }
}

fn edge_from_sample(sample: &Sample) -> Edge {
    let m = &sample.metric;
    let code = normalize_code(&m.code);
    // Validated at the schema boundary; NaN only for hand-built samples.
    // Adding zero turns "-0" into 0.0.
    let value = sample.value.parse().unwrap_or(f64::NAN) + 0.0;

    Edge {
        source: m.source.clone(),
        target: m.destination.clone(),
        value,
        label: format!("{:.2}(code:{})", value, code),
        color: EdgeColor::for_code(&code),
        code,
        dashed: true,
        end_arrow: true,
        route: EdgeRoute::Straight,
    }
}

fn normalize_code(code: &str) -> String {
    if code == CODE_UNKNOWN {
        CODE_NONE.to_string()
    } else {
        code.to_string()
    }
}

/// Display name: the id without its leading dot-delimited segment
/// (usually the namespace), when there is more than one segment.
pub fn display_label(id: &str) -> String {
    match id.split_once('.') {
        Some((_, rest)) => rest.to_string(),
        None => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(samples: Vec<Sample>) -> RawResultSet {
        RawResultSet {
            result: samples,
            ..RawResultSet::default()
        }
    }

    #[test]
    fn empty_result_set_produces_empty_graph() {
        let model = GraphModel::build(&RawResultSet::default());
        assert!(model.nodes.is_empty());
        assert!(model.edges.is_empty());
        assert!(model.is_empty());
    }

    #[test]
    fn single_func_call() {
        let model = GraphModel::build(&set(vec![Sample::new(
            "ns.fnA", "func", "ns.fnB", "func", "200", "1.5",
        )]));

        assert_eq!(model.nodes.len(), 2);
        assert_eq!(model.nodes[0].id, "ns.fnA");
        assert_eq!(model.nodes[0].label, "fnA");
        assert_eq!(model.nodes[1].label, "fnB");
        assert!(model.nodes.iter().all(|n| n.shape == NodeShape::Triangle));

        assert_eq!(model.edges.len(), 1);
        let edge = &model.edges[0];
        assert_eq!(edge.source, "ns.fnA");
        assert_eq!(edge.target, "ns.fnB");
        assert_eq!(edge.color, EdgeColor::Green);
        assert_eq!(edge.label, "1.50(code:200)");
        assert!(edge.end_arrow);
    }

    #[test]
    fn one_node_per_distinct_endpoint() {
        let model = GraphModel::build(&set(vec![
            Sample::new("ns.a", "func", "ns.b", "func", "200", "1"),
            Sample::new("ns.a", "func", "ns.b", "func", "500", "2"),
            Sample::new("ns.b", "func", "ns.c", "kafka", "200", "3"),
            Sample::new("ns.c", "kafka", "ns.a", "func", "0", "4"),
        ]));

        let ids: Vec<&str> = model.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["ns.a", "ns.b", "ns.c"]);
        assert_eq!(model.edges.len(), 4);
    }

    #[test]
    fn zero_values_emit_no_edge_but_keep_nodes() {
        let model = GraphModel::build(&set(vec![
            Sample::new("ns.a", "func", "ns.b", "func", "200", "0"),
            Sample::new("ns.a", "func", "ns.c", "func", "200", "0.25"),
            Sample::new("ns.a", "func", "ns.d", "func", "200", "-0"),
        ]));

        assert_eq!(model.nodes.len(), 4);
        assert_eq!(model.edges.len(), 2);
        assert_eq!(model.edges[0].target, "ns.c");
        assert_eq!(model.edges[0].label, "0.25(code:200)");
        // Only the literal "0" is skipped; "-0" is drawn as zero.
        assert_eq!(model.edges[1].target, "ns.d");
        assert_eq!(model.edges[1].label, "0.00(code:200)");
        assert!(model.edges[1].value.is_sign_positive());
    }

    #[test]
    fn status_code_colors() {
        let model = GraphModel::build(&set(vec![
            Sample::new("a", "func", "b", "func", "unknown", "1"),
            Sample::new("a", "func", "b", "func", "0", "1"),
            Sample::new("a", "func", "b", "func", "200", "1"),
            Sample::new("a", "func", "b", "func", "404", "1"),
            Sample::new("a", "func", "b", "func", "503", "1"),
        ]));

        let colors: Vec<EdgeColor> = model.edges.iter().map(|e| e.color).collect();
        assert_eq!(
            colors,
            vec![
                EdgeColor::Gray,
                EdgeColor::Gray,
                EdgeColor::Green,
                EdgeColor::Red,
                EdgeColor::Red
            ]
        );
        assert_eq!(model.edges[0].code, "0");
        assert_eq!(model.edges[0].label, "1.00(code:0)");
    }

    #[test]
    fn shapes_follow_endpoint_type() {
        let model = GraphModel::build(&set(vec![
            Sample::new("ns.f", "func", "ns.k", "kafka", "200", "1"),
            Sample::new("ns.q", "azurequeue", "ns.n", "nats", "200", "1"),
            Sample::new("router", "router", "ns.f", "func", "200", "1"),
        ]));

        let shape = |id: &str| model.node(id).unwrap().shape;
        assert_eq!(shape("ns.f"), NodeShape::Triangle);
        assert_eq!(shape("ns.k"), NodeShape::Rect);
        assert_eq!(shape("ns.q"), NodeShape::Rect);
        assert_eq!(shape("ns.n"), NodeShape::Rect);
        assert_eq!(shape("router"), NodeShape::Default);

        let router = model.node("router").unwrap();
        assert_eq!(router.kind, EndpointKind::Other("router".to_string()));
        assert!(router.size.is_none());
        assert!(router.style.is_none());

        let kafka = model.node("ns.k").unwrap();
        assert_eq!(kafka.size, Some([30, 20]));
        assert_eq!(kafka.style.unwrap().stroke, "#1bde8a");
    }

    #[test]
    fn conflicting_types_last_writer_wins() {
        let model = GraphModel::build(&set(vec![
            Sample::new("ns.x", "func", "ns.y", "func", "200", "1"),
            Sample::new("ns.z", "func", "ns.x", "kafka", "200", "1"),
        ]));
        assert_eq!(model.node("ns.x").unwrap().shape, NodeShape::Rect);
        // First-seen position is kept.
        assert_eq!(model.nodes[0].id, "ns.x");
    }

    #[test]
    fn label_drops_first_segment_only() {
        assert_eq!(display_label("a.b.c"), "b.c");
        assert_eq!(display_label("solo"), "solo");
        assert_eq!(display_label("ns.fn"), "fn");
        assert_eq!(display_label(".hidden"), "hidden");
    }

    #[test]
    fn parallel_edges_are_separated() {
        let model = GraphModel::build(&set(vec![
            Sample::new("a", "func", "b", "func", "200", "1"),
            Sample::new("a", "func", "b", "func", "500", "1"),
        ]));
        assert_ne!(model.edges[0].route, model.edges[1].route);
    }

    #[test]
    fn serializes_for_export() {
        let model = GraphModel::build(&set(vec![Sample::new(
            "ns.fnA", "func", "ns.fnB", "func", "200", "1.5",
        )]));
        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["nodes"][0]["shape"], "triangle");
        assert_eq!(json["edges"][0]["color"], "green");
        assert_eq!(json["edges"][0]["route"]["kind"], "straight");
    }
}

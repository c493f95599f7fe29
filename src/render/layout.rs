//! Left-to-right layered layout.
//!
//! Nodes are assigned to ranks (columns) by longest path from the sources,
//! with the back edges of cycles ignored, then ordered within each rank by
//! barycenter sweeps starting from first-seen order. Coordinates use screen
//! orientation: x grows to the right, y grows downwards.

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{depth_first_search, DfsEvent};

use crate::config::CanvasSettings;
use crate::data::{EdgeRoute, GraphModel};

/// Size used for nodes without an explicit size.
pub const DEFAULT_NODE_SIZE: f64 = 20.0;
/// Number of segments a curve is sampled into.
const CURVE_SEGMENTS: usize = 16;
/// Down/up barycenter sweep pairs.
const ORDER_SWEEPS: usize = 4;
/// Half-angle between the two control points of a self-loop.
const LOOP_SPREAD: f64 = std::f64::consts::FRAC_PI_6;

/// Position of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodePlacement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rank: usize,
    /// Position within the rank, top to bottom.
    pub order: usize,
}

impl NodePlacement {
    /// Distance from the center at which edges stop.
    pub fn radius(&self) -> f64 {
        self.width.max(self.height) / 2.0
    }
}

/// Polyline for one edge, with the anchor of its label.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgePath {
    /// Index of the edge in the model.
    pub edge: usize,
    pub points: Vec<(f64, f64)>,
    pub label_at: (f64, f64),
}

/// A computed layout. Placements are indexed like the model's nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub nodes: Vec<NodePlacement>,
    pub edges: Vec<EdgePath>,
}

impl Layout {
    /// Lay out a model.
    pub fn compute(model: &GraphModel, canvas: &CanvasSettings) -> Self {
        let n = model.nodes.len();
        if n == 0 {
            return Self::default();
        }

        let index: HashMap<&str, usize> = model
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.as_str(), i))
            .collect();

        // Edges between distinct, known nodes.
        let links: Vec<(usize, usize)> = model
            .edges
            .iter()
            .filter_map(|e| Some((*index.get(e.source.as_str())?, *index.get(e.target.as_str())?)))
            .filter(|(u, v)| u != v)
            .collect();

        let forward = acyclic_links(n, &links);
        let ranks = longest_path_ranks(n, &forward);
        let layers = order_layers(&ranks, &forward);

        let sizes: Vec<(f64, f64)> = model
            .nodes
            .iter()
            .map(|node| match node.size {
                Some([w, h]) => (w as f64, h as f64),
                None => (DEFAULT_NODE_SIZE, DEFAULT_NODE_SIZE),
            })
            .collect();
        let max_w = sizes.iter().map(|s| s.0).fold(0.0, f64::max);
        let max_h = sizes.iter().map(|s| s.1).fold(0.0, f64::max);
        let row_step = max_h + canvas.node_sep;
        let col_step = max_w + canvas.rank_sep;
        let tallest = layers.iter().map(Vec::len).max().unwrap_or(0);

        let mut nodes = vec![
            NodePlacement {
                x: 0.0,
                y: 0.0,
                width: 0.0,
                height: 0.0,
                rank: 0,
                order: 0,
            };
            n
        ];
        for (rank, layer) in layers.iter().enumerate() {
            // Center every rank against the tallest one.
            let shift = (tallest - layer.len()) as f64 * row_step / 2.0;
            for (order, &v) in layer.iter().enumerate() {
                nodes[v] = NodePlacement {
                    x: max_w / 2.0 + rank as f64 * col_step,
                    y: max_h / 2.0 + shift + order as f64 * row_step,
                    width: sizes[v].0,
                    height: sizes[v].1,
                    rank,
                    order,
                };
            }
        }

        let edges = model
            .edges
            .iter()
            .enumerate()
            .filter_map(|(i, e)| {
                let from = &nodes[*index.get(e.source.as_str())?];
                let to = &nodes[*index.get(e.target.as_str())?];
                Some(edge_path(i, from, to, e.route))
            })
            .collect();

        Self { nodes, edges }
    }

    /// Bounding box `(min_x, min_y, max_x, max_y)` of nodes and edges.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let node_corners = self.nodes.iter().flat_map(|p| {
            [
                (p.x - p.width / 2.0, p.y - p.height / 2.0),
                (p.x + p.width / 2.0, p.y + p.height / 2.0),
            ]
        });
        let edge_points = self.edges.iter().flat_map(|e| e.points.iter().copied());

        node_corners.chain(edge_points).fold(None, |acc, (x, y)| {
            Some(match acc {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            })
        })
    }
}

/// Directed graph over node indices; node `i` is `NodeIndex::new(i)`.
fn link_graph(n: usize, links: &[(usize, usize)]) -> DiGraph<(), ()> {
    let mut graph = DiGraph::with_capacity(n, links.len());
    for _ in 0..n {
        graph.add_node(());
    }
    for &(u, v) in links {
        graph.add_edge(NodeIndex::new(u), NodeIndex::new(v), ());
    }
    graph
}

/// Drop the back edges found by a depth-first search in node order.
fn acyclic_links(n: usize, links: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let graph = link_graph(n, links);
    let mut back: Vec<(usize, usize)> = Vec::new();

    depth_first_search(&graph, graph.node_indices(), |event| {
        if let DfsEvent::BackEdge(u, v) = event {
            back.push((u.index(), v.index()));
        }
    });

    links
        .iter()
        .copied()
        .filter(|link| !back.contains(link))
        .collect()
}

/// Rank of every node: the length of the longest path reaching it.
fn longest_path_ranks(n: usize, links: &[(usize, usize)]) -> Vec<usize> {
    let graph = link_graph(n, links);
    // Links are acyclic here; fall back to node order if they are not.
    let order = toposort(&graph, None).unwrap_or_else(|_| graph.node_indices().collect());

    let mut rank = vec![0usize; n];
    for u in order {
        for v in graph.neighbors(u) {
            rank[v.index()] = rank[v.index()].max(rank[u.index()] + 1);
        }
    }
    rank
}

/// Group nodes by rank and reduce crossings with barycenter sweeps.
fn order_layers(ranks: &[usize], links: &[(usize, usize)]) -> Vec<Vec<usize>> {
    let depth = ranks.iter().max().map_or(0, |r| r + 1);
    let mut layers: Vec<Vec<usize>> = vec![Vec::new(); depth];
    for (v, &r) in ranks.iter().enumerate() {
        layers[r].push(v);
    }

    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); ranks.len()];
    let mut succs: Vec<Vec<usize>> = vec![Vec::new(); ranks.len()];
    for &(u, v) in links {
        preds[v].push(u);
        succs[u].push(v);
    }

    let mut pos = vec![0usize; ranks.len()];
    let reindex = |layers: &Vec<Vec<usize>>, pos: &mut Vec<usize>| {
        for layer in layers {
            for (i, &v) in layer.iter().enumerate() {
                pos[v] = i;
            }
        }
    };
    reindex(&layers, &mut pos);

    for _ in 0..ORDER_SWEEPS {
        for r in 1..depth {
            sort_by_barycenter(&mut layers[r], &preds, &pos);
            reindex(&layers, &mut pos);
        }
        for r in (0..depth.saturating_sub(1)).rev() {
            sort_by_barycenter(&mut layers[r], &succs, &pos);
            reindex(&layers, &mut pos);
        }
    }
    layers
}

fn sort_by_barycenter(layer: &mut [usize], neighbours: &[Vec<usize>], pos: &[usize]) {
    let keys: HashMap<usize, f64> = layer
        .iter()
        .map(|&v| {
            let adj = &neighbours[v];
            let key = if adj.is_empty() {
                pos[v] as f64
            } else {
                adj.iter().map(|&u| pos[u] as f64).sum::<f64>() / adj.len() as f64
            };
            (v, key)
        })
        .collect();
    layer.sort_by(|a, b| keys[a].total_cmp(&keys[b]));
}

fn edge_path(edge: usize, from: &NodePlacement, to: &NodePlacement, route: EdgeRoute) -> EdgePath {
    let p0 = (from.x, from.y);
    let p1 = (to.x, to.y);

    let (points, label_at) = match route {
        EdgeRoute::Loop { position, dist } => {
            let (ux, uy) = position.direction();
            let rotate = |a: f64| {
                let (s, c) = a.sin_cos();
                (ux * c - uy * s, ux * s + uy * c)
            };
            let reach = dist * 1.3;
            let (ax, ay) = rotate(LOOP_SPREAD);
            let (bx, by) = rotate(-LOOP_SPREAD);
            let c1 = (p0.0 + ax * reach, p0.1 + ay * reach);
            let c2 = (p0.0 + bx * reach, p0.1 + by * reach);
            let points = sample(|t| cubic(p0, c1, c2, p0, t));
            (points, cubic(p0, c1, c2, p0, 0.5))
        }
        _ => {
            let (dx, dy) = (p1.0 - p0.0, p1.1 - p0.1);
            let len = dx.hypot(dy);
            let offset = route.offset();
            if offset == 0.0 || len < f64::EPSILON {
                (vec![p0, p1], lerp(p0, p1, 0.5))
            } else {
                // Left of the direction of travel, in screen orientation.
                let (nx, ny) = (dy / len, -dx / len);
                let mid = lerp(p0, p1, 0.5);
                let ctrl = (mid.0 + nx * offset, mid.1 + ny * offset);
                let points = sample(|t| quadratic(p0, ctrl, p1, t));
                (points, quadratic(p0, ctrl, p1, 0.5))
            }
        }
    };

    let points = trim_end(trim_start(points, p0, from.radius()), p1, to.radius());
    EdgePath {
        edge,
        points,
        label_at,
    }
}

fn sample(f: impl Fn(f64) -> (f64, f64)) -> Vec<(f64, f64)> {
    (0..=CURVE_SEGMENTS)
        .map(|i| f(i as f64 / CURVE_SEGMENTS as f64))
        .collect()
}

fn lerp(a: (f64, f64), b: (f64, f64), t: f64) -> (f64, f64) {
    (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t)
}

fn quadratic(p0: (f64, f64), c: (f64, f64), p1: (f64, f64), t: f64) -> (f64, f64) {
    lerp(lerp(p0, c, t), lerp(c, p1, t), t)
}

fn cubic(p0: (f64, f64), c1: (f64, f64), c2: (f64, f64), p1: (f64, f64), t: f64) -> (f64, f64) {
    let a = lerp(p0, c1, t);
    let b = lerp(c1, c2, t);
    let c = lerp(c2, p1, t);
    lerp(lerp(a, b, t), lerp(b, c, t), t)
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

/// Cut the polyline where it leaves the circle around `center`.
fn trim_start(points: Vec<(f64, f64)>, center: (f64, f64), radius: f64) -> Vec<(f64, f64)> {
    let Some(exit) = points.iter().position(|&p| distance(p, center) > radius) else {
        return points;
    };
    if exit == 0 {
        return points;
    }
    let inside = points[exit - 1];
    let outside = points[exit];
    let (d0, d1) = (distance(inside, center), distance(outside, center));
    let t = (radius - d0) / (d1 - d0);

    let mut trimmed = vec![lerp(inside, outside, t)];
    trimmed.extend_from_slice(&points[exit..]);
    trimmed
}

fn trim_end(mut points: Vec<(f64, f64)>, center: (f64, f64), radius: f64) -> Vec<(f64, f64)> {
    points.reverse();
    let mut trimmed = trim_start(points, center, radius);
    trimmed.reverse();
    trimmed
}

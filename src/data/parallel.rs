//! Parallel-edge separation.
//!
//! Several edges may connect the same pair of endpoints (one per status code
//! and per recorder). Drawn as straight lines they would sit on top of each
//! other, so every edge of such a group gets its own curve offset. Offsets
//! alternate sides around the straight line and are mirrored for edges that
//! run against the group's first direction, since a positive offset bends a
//! curve to the left of its own direction of travel.

use std::collections::HashMap;

use serde::Serialize;

use super::graph::Edge;

/// Distance between neighbouring parallel curves.
pub const OFFSET_STEP: f64 = 15.0;
/// Base distance of a self-loop from its node.
pub const LOOP_BASE_DIST: f64 = 50.0;
/// Extra distance for every full ring of eight self-loops.
pub const LOOP_RING_STEP: f64 = 20.0;

/// Where a self-loop sits around its node, clockwise from the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoopPosition {
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
    TopLeft,
}

impl LoopPosition {
    const ALL: [LoopPosition; 8] = [
        LoopPosition::Top,
        LoopPosition::TopRight,
        LoopPosition::Right,
        LoopPosition::BottomRight,
        LoopPosition::Bottom,
        LoopPosition::BottomLeft,
        LoopPosition::Left,
        LoopPosition::TopLeft,
    ];

    /// Position of the n-th loop on a node.
    pub fn nth(n: usize) -> Self {
        Self::ALL[n % Self::ALL.len()]
    }

    /// Unit direction in screen coordinates (y grows downwards).
    pub fn direction(&self) -> (f64, f64) {
        let d = std::f64::consts::FRAC_1_SQRT_2;
        match self {
            LoopPosition::Top => (0.0, -1.0),
            LoopPosition::TopRight => (d, -d),
            LoopPosition::Right => (1.0, 0.0),
            LoopPosition::BottomRight => (d, d),
            LoopPosition::Bottom => (0.0, 1.0),
            LoopPosition::BottomLeft => (-d, d),
            LoopPosition::Left => (-1.0, 0.0),
            LoopPosition::TopLeft => (-d, -d),
        }
    }
}

/// How an edge is routed between its endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EdgeRoute {
    /// Straight segment.
    #[default]
    Straight,
    /// Quadratic curve whose control point sits `offset` units to the left
    /// of the edge's own direction (negative values bend right).
    Curved { offset: f64 },
    /// Self-loop drawn around the node.
    Loop { position: LoopPosition, dist: f64 },
}

impl EdgeRoute {
    /// Signed curve offset; zero for straight routes and loops.
    pub fn offset(&self) -> f64 {
        match self {
            EdgeRoute::Curved { offset } => *offset,
            _ => 0.0,
        }
    }
}

/// Assign a route to every edge so that edges sharing an endpoint pair
/// never share geometry.
pub fn separate_parallel_edges(edges: &mut [Edge]) {
    // Group indices by unordered endpoint pair, keeping first-seen order.
    let mut group_of: HashMap<(&str, &str), usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for (i, edge) in edges.iter().enumerate() {
        let key = if edge.source <= edge.target {
            (edge.source.as_str(), edge.target.as_str())
        } else {
            (edge.target.as_str(), edge.source.as_str())
        };
        match group_of.get(&key) {
            Some(&g) => groups[g].push(i),
            None => {
                group_of.insert(key, groups.len());
                groups.push(vec![i]);
            }
        }
    }

    let routes: Vec<(usize, EdgeRoute)> = groups
        .iter()
        .flat_map(|group| group_routes(edges, group))
        .collect();

    for (i, route) in routes {
        edges[i].route = route;
    }
}

fn group_routes(edges: &[Edge], group: &[usize]) -> Vec<(usize, EdgeRoute)> {
    let first = &edges[group[0]];
    let len = group.len();

    group
        .iter()
        .enumerate()
        .map(|(k, &i)| {
            let edge = &edges[i];
            if edge.is_self_loop() {
                let route = EdgeRoute::Loop {
                    position: LoopPosition::nth(k),
                    dist: (k / 8) as f64 * LOOP_RING_STEP + LOOP_BASE_DIST,
                };
                return (i, route);
            }
            if len == 1 {
                return (i, EdgeRoute::Straight);
            }

            let reversed = edge.source != first.source;
            let side = if k % 2 == 0 { 1.0 } else { -1.0 };
            let sign = if reversed { -side } else { side };
            let magnitude = if len % 2 == 1 {
                ((k + 1) / 2) as f64 * 2.0 * OFFSET_STEP
            } else {
                (k / 2) as f64 * 2.0 * OFFSET_STEP + OFFSET_STEP
            };
            (i, EdgeRoute::Curved { offset: sign * magnitude })
        })
        .collect()
}

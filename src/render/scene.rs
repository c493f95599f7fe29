//! Terminal drawing surface.
//!
//! [`Scene`] keeps the bound model and its layout; [`Scene::draw`] paints
//! them onto a braille canvas scaled to the area it is given.

use std::sync::Arc;

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::Line,
    widgets::{
        canvas::{Canvas, Circle, Context, Line as Segment, Rectangle},
        Block, Borders, Paragraph,
    },
    Frame,
};
use tracing::debug;

use super::layout::{EdgePath, Layout, DEFAULT_NODE_SIZE};
use super::GraphSurface;
use crate::config::CanvasSettings;
use crate::data::{GraphModel, NodeShape};
use crate::ui::Theme;

/// Dash and gap length, in braille dots.
const DASH_DOTS: f64 = 4.0;
const GAP_DOTS: f64 = 2.0;
/// Arrow head length, in braille dots along x.
const ARROW_DOTS: f64 = 5.0;
/// Half-angle of the arrow head, in radians.
const ARROW_SPREAD: f64 = 0.45;
/// Nodes never shrink below this many dots.
const MIN_NODE_DOTS: f64 = 3.0;

/// Visible region in layout coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

/// The graph surface drawn with ratatui.
#[derive(Debug)]
pub struct Scene {
    canvas: CanvasSettings,
    model: Arc<GraphModel>,
    layout: Layout,
    renders: usize,
}

impl GraphSurface for Scene {
    fn create(canvas: &CanvasSettings) -> Self {
        Self {
            canvas: canvas.clone(),
            model: Arc::new(GraphModel::default()),
            layout: Layout::default(),
            renders: 0,
        }
    }

    fn bind(&mut self, model: Arc<GraphModel>) {
        self.model = model;
    }

    fn render(&mut self) {
        self.layout = Layout::compute(&self.model, &self.canvas);
        self.renders += 1;
        debug!(
            nodes = self.layout.nodes.len(),
            edges = self.layout.edges.len(),
            "graph laid out"
        );
    }
}

impl Scene {
    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Number of layout passes so far.
    pub fn renders(&self) -> usize {
        self.renders
    }

    /// Region to show in a canvas `cols` cells wide.
    ///
    /// With `fit_view` the region hugs the layout, widened on the right so
    /// that node labels printed beside the last rank stay visible. Without
    /// it the whole fixed surface is shown.
    pub fn viewport(&self, cols: u16) -> Option<Viewport> {
        if !self.canvas.fit_view {
            return Some(Viewport {
                x0: 0.0,
                y0: 0.0,
                x1: self.canvas.width,
                y1: self.canvas.height,
            });
        }

        let (x0, y0, x1, y1) = self.layout.bounds()?;
        let margin = DEFAULT_NODE_SIZE;
        let (x0, y0, x1, y1) = (x0 - margin, y0 - margin, x1 + margin, y1 + margin);

        let label = self
            .model
            .nodes
            .iter()
            .map(|n| n.label.chars().count())
            .max()
            .unwrap_or(0) as f64
            + 1.0;
        let cols = cols as f64;
        let width = x1 - x0;
        let pad = if cols > label {
            label * width / (cols - label)
        } else {
            width
        };

        Some(Viewport {
            x0,
            y0,
            x1: x1 + pad,
            y1,
        })
    }

    /// Draw the graph. `selected` is the index of an edge to highlight.
    pub fn draw(&self, frame: &mut Frame, area: Rect, theme: &Theme, selected: Option<usize>) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(theme.border_type)
            .border_style(Style::default().fg(theme.border))
            .title(" Data flow ");
        let inner = block.inner(area);

        let viewport = match self.viewport(inner.width) {
            Some(v) if !self.model.is_empty() => v,
            _ => {
                let paragraph = Paragraph::new("No data flow recorded for this query")
                    .style(Style::default().fg(theme.muted))
                    .block(block);
                frame.render_widget(paragraph, area);
                return;
            }
        };

        let dot_x = (viewport.x1 - viewport.x0) / (inner.width.max(1) as f64 * 2.0);
        let dot_y = (viewport.y1 - viewport.y0) / (inner.height.max(1) as f64 * 4.0);

        let canvas = Canvas::default()
            .block(block)
            .marker(Marker::Braille)
            .x_bounds([viewport.x0, viewport.x1])
            .y_bounds([-viewport.y1, -viewport.y0])
            .paint(|ctx| {
                for path in &self.layout.edges {
                    self.paint_edge(ctx, path, theme, selected, dot_x);
                }
                ctx.layer();
                self.paint_nodes(ctx, theme, dot_x, dot_y);
                ctx.layer();
                self.paint_labels(ctx, theme, selected, dot_x);
            });

        frame.render_widget(canvas, area);
    }

    fn paint_edge(
        &self,
        ctx: &mut Context,
        path: &EdgePath,
        theme: &Theme,
        selected: Option<usize>,
        dot_x: f64,
    ) {
        let Some(edge) = self.model.edges.get(path.edge) else {
            return;
        };
        let color = if selected == Some(path.edge) {
            theme.highlight
        } else {
            theme.edge_color(edge.color)
        };

        let points: Vec<(f64, f64)> = path.points.iter().map(|&(x, y)| (x, -y)).collect();
        if edge.dashed {
            dashed(ctx, &points, DASH_DOTS * dot_x, GAP_DOTS * dot_x, color);
        } else {
            for pair in points.windows(2) {
                segment(ctx, pair[0], pair[1], color);
            }
        }

        if edge.end_arrow {
            if let [.., from, to] = points.as_slice() {
                arrow_head(ctx, *from, *to, ARROW_DOTS * dot_x, color);
            }
        }
    }

    fn paint_nodes(&self, ctx: &mut Context, theme: &Theme, dot_x: f64, dot_y: f64) {
        for (node, place) in self.model.nodes.iter().zip(&self.layout.nodes) {
            let color = theme.node_color(node);
            let (x, y) = (place.x, -place.y);
            let w = place.width.max(MIN_NODE_DOTS * dot_x);
            let h = place.height.max(MIN_NODE_DOTS * dot_y);

            match node.shape {
                NodeShape::Triangle => {
                    let left = (x - w / 2.0, y - h / 2.0);
                    let right = (x + w / 2.0, y - h / 2.0);
                    let apex = (x, y + h / 2.0);
                    segment(ctx, left, right, color);
                    segment(ctx, right, apex, color);
                    segment(ctx, apex, left, color);
                }
                NodeShape::Rect => ctx.draw(&Rectangle {
                    x: x - w / 2.0,
                    y: y - h / 2.0,
                    width: w,
                    height: h,
                    color,
                }),
                NodeShape::Default => ctx.draw(&Circle {
                    x,
                    y,
                    radius: w / 2.0,
                    color,
                }),
            }
        }
    }

    fn paint_labels(&self, ctx: &mut Context, theme: &Theme, selected: Option<usize>, dot_x: f64) {
        for path in &self.layout.edges {
            let Some(edge) = self.model.edges.get(path.edge) else {
                continue;
            };
            let mut style = Style::default().fg(theme.edge_color(edge.color));
            if selected == Some(path.edge) {
                style = style.fg(theme.highlight).add_modifier(Modifier::BOLD);
            }
            let (x, y) = path.label_at;
            ctx.print(x, -y, Line::styled(edge.label.clone(), style));
        }

        for (node, place) in self.model.nodes.iter().zip(&self.layout.nodes) {
            let x = place.x + place.width / 2.0 + 2.0 * dot_x;
            ctx.print(x, -place.y, Line::styled(node.label.clone(), theme.label));
        }
    }
}

fn segment(ctx: &mut Context, a: (f64, f64), b: (f64, f64), color: Color) {
    ctx.draw(&Segment {
        x1: a.0,
        y1: a.1,
        x2: b.0,
        y2: b.1,
        color,
    });
}

/// Draw a polyline as dashes, carrying the dash phase across vertices.
fn dashed(ctx: &mut Context, points: &[(f64, f64)], dash: f64, gap: f64, color: Color) {
    let period = dash + gap;
    if dash <= 0.0 || gap <= 0.0 || !period.is_finite() {
        for pair in points.windows(2) {
            segment(ctx, pair[0], pair[1], color);
        }
        return;
    }

    let mut phase = 0.0;
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let len = (b.0 - a.0).hypot(b.1 - a.1);
        if len <= f64::EPSILON {
            continue;
        }
        let at = |d: f64| (a.0 + (b.0 - a.0) * d / len, a.1 + (b.1 - a.1) * d / len);

        let mut travelled = 0.0;
        while travelled < len {
            let in_dash = phase < dash;
            let remaining = if in_dash { dash - phase } else { period - phase };
            let step = remaining.min(len - travelled);
            if in_dash {
                segment(ctx, at(travelled), at(travelled + step), color);
            }
            travelled += step;
            phase = (phase + step) % period;
        }
    }
}

fn arrow_head(ctx: &mut Context, from: (f64, f64), to: (f64, f64), length: f64, color: Color) {
    let (dx, dy) = (from.0 - to.0, from.1 - to.1);
    let len = dx.hypot(dy);
    if len <= f64::EPSILON {
        return;
    }
    let (ux, uy) = (dx / len, dy / len);
    for angle in [ARROW_SPREAD, -ARROW_SPREAD] {
        let (s, c) = f64::sin_cos(angle);
        let wing = (
            to.0 + (ux * c - uy * s) * length,
            to.1 + (ux * s + uy * c) * length,
        );
        segment(ctx, to, wing, color);
    }
}

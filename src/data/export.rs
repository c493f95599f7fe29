//! Serializing a graph model for use outside the TUI.

use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Result};

use super::graph::{GraphModel, NodeShape};
use super::parallel::EdgeRoute;

/// Output format for `--export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// The graph model as pretty-printed JSON.
    #[default]
    Json,
    /// Graphviz DOT, laid out left to right.
    Dot,
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "dot" | "graphviz" => Ok(ExportFormat::Dot),
            other => bail!("Unknown export format: {}", other),
        }
    }
}

/// Render a model in the given format.
pub fn render(model: &GraphModel, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(model)?),
        ExportFormat::Dot => Ok(to_dot(model)),
    }
}

/// Write a model to a file.
pub fn write_to_file(model: &GraphModel, format: ExportFormat, path: &Path) -> Result<()> {
    let content = render(model, format)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Render a model as a Graphviz digraph.
pub fn to_dot(model: &GraphModel) -> String {
    let mut out = String::new();
    out.push_str("digraph flow {\n");
    out.push_str("  rankdir=LR;\n");

    for node in &model.nodes {
        let shape = match node.shape {
            NodeShape::Triangle => "triangle",
            NodeShape::Rect => "box",
            NodeShape::Default => "ellipse",
        };
        let mut attrs = format!("label=\"{}\", shape={}", escape(&node.label), shape);
        if let Some(style) = node.style {
            let _ = write!(
                attrs,
                ", style=filled, color=\"{}\", fillcolor=\"{}\", penwidth={}",
                style.stroke, style.fill, style.line_width
            );
        }
        let _ = writeln!(out, "  \"{}\" [{}];", escape(&node.id), attrs);
    }

    for edge in &model.edges {
        let mut attrs = format!(
            "label=\"{}\", color=\"{}\"",
            escape(&edge.label),
            edge.color.hex()
        );
        if edge.dashed {
            attrs.push_str(", style=dashed");
        }
        if !edge.end_arrow {
            attrs.push_str(", arrowhead=none");
        }
        if let EdgeRoute::Loop { position, .. } = edge.route {
            let _ = write!(attrs, ", headport={}", compass(position));
        }
        let _ = writeln!(
            out,
            "  \"{}\" -> \"{}\" [{}];",
            escape(&edge.source),
            escape(&edge.target),
            attrs
        );
    }

    out.push_str("}\n");
    out
}

fn compass(position: super::parallel::LoopPosition) -> &'static str {
    use super::parallel::LoopPosition::*;
    match position {
        Top => "n",
        TopRight => "ne",
        Right => "e",
        BottomRight => "se",
        Bottom => "s",
        BottomLeft => "sw",
        Left => "w",
        TopLeft => "nw",
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

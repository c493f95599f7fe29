//! Edge table rendering.
//!
//! One row per edge in model order: endpoints, status code, rate and the
//! route assigned by the parallel-edge pass.

use std::sync::Arc;

use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    widgets::{Block, Borders, Cell, Row, Table},
    Frame,
};

use crate::app::App;
use crate::data::{display_label, Edge, EdgeRoute};

/// Render the edge table.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let graph = Arc::clone(app.graph());

    let header = Row::new(vec![
        Cell::from("Source"),
        Cell::from("Target"),
        Cell::from("Code"),
        Cell::from("Rate/min"),
        Cell::from("Route"),
    ])
    .style(app.theme.header)
    .height(1);

    let rows: Vec<Row> = graph
        .edges
        .iter()
        .map(|edge| {
            Row::new(vec![
                Cell::from(display_label(&edge.source)),
                Cell::from(display_label(&edge.target)),
                Cell::from(edge.code.clone()).style(app.theme.edge_style(edge.color)),
                Cell::from(format!("{:.2}", edge.value)),
                Cell::from(describe_route(edge)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(3), // Source
        Constraint::Fill(3), // Target
        Constraint::Min(6),  // Code
        Constraint::Fill(1), // Rate
        Constraint::Fill(2), // Route
    ];

    let selected = app.selected_edge.min(rows.len().saturating_sub(1));

    // Show scroll position if there are items
    let position_info = if !rows.is_empty() {
        format!(" [{}/{}]", selected + 1, rows.len())
    } else {
        String::new()
    };
    let title = format!(" Edges ({}){} ", graph.edges.len(), position_info);

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let selection = app.selection().map(|_| selected);
    app.edge_table.select(selection);

    frame.render_stateful_widget(table, area, &mut app.edge_table);
}

fn describe_route(edge: &Edge) -> String {
    match edge.route {
        EdgeRoute::Straight => "straight".to_string(),
        EdgeRoute::Curved { offset } => format!("curve {:+}", offset),
        EdgeRoute::Loop { position, dist } => format!("loop {:?} {}", position, dist),
    }
}

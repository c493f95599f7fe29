//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::data::EdgeColor;

/// Render the header bar with graph overview.
///
/// Displays: node and edge counts, edges per status class, data source.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = Span::styled(" FISSION FLOW ", Style::default().add_modifier(Modifier::BOLD));

    if app.last_updated.is_none() {
        let line = Line::from(vec![title, Span::raw("│ Loading...")]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let graph = app.graph();
    let counts = graph.color_counts();
    let count = |color: EdgeColor| -> Span<'static> {
        let n = counts.get(&color).copied().unwrap_or(0);
        if n > 0 {
            Span::styled(n.to_string(), app.theme.edge_style(color))
        } else {
            Span::styled("0", Style::default().add_modifier(Modifier::DIM))
        }
    };

    let line = Line::from(vec![
        title,
        Span::raw("│ "),
        Span::styled(
            graph.nodes.len().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" nodes "),
        Span::styled(
            graph.edges.len().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" edges │ "),
        count(EdgeColor::Green),
        Span::raw(" ok "),
        count(EdgeColor::Red),
        Span::raw(" err "),
        count(EdgeColor::Gray),
        Span::raw(" none │ "),
        Span::raw(app.source_description().to_string()),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the tab bar showing available views.
///
/// Highlights the currently active view.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = vec![Line::from(" 1:Graph "), Line::from(" 2:Edges ")];

    let selected = match app.current_view {
        View::Graph => 0,
        View::Edges => 1,
    };

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows: current view, query, time since last update, available controls.
/// Also displays temporary status messages and errors.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    // Check for temporary status message first
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    if let Some(ref err) = app.load_error {
        let paragraph = Paragraph::new(format!(" Error: {} | q:quit r:retry", err))
            .style(Style::default().fg(app.theme.error));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = if app.editing.is_some() {
        "Type to edit | Enter:fetch Tab:field Esc:done"
    } else {
        match app.current_view {
            View::Graph => "t:time s:span Enter:fetch ↑↓:edge Tab:switch ?:help q:quit",
            View::Edges => "↑↓:select t:time s:span Enter:fetch Tab:switch ?:help q:quit",
        }
    };

    let fetching = match app.pending_requests() {
        0 => String::new(),
        n => format!(" | Fetching ({})", n),
    };

    let status = match app.last_updated {
        Some(updated) => format!(
            " {}{} | {} | Updated {:.1}s ago | {}",
            app.current_view.label(),
            fetching,
            app.last_query.describe(),
            updated.elapsed().as_secs_f64(),
            controls,
        ),
        None => format!(" Loading {}... | {}", app.last_query.describe(), controls),
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |name: &'static str| {
        Line::from(vec![Span::styled(
            name,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  ←/→ Tab     Switch views"),
        Line::from("  1/2         Graph / Edges"),
        Line::from("  ↑/↓ j/k     Select edge"),
        Line::from("  PgUp/PgDn   Jump 10 edges"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from(""),
        section(" Query"),
        Line::from("  t           Edit time"),
        Line::from("  s           Edit span"),
        Line::from("  Enter       Fetch"),
        Line::from("  Tab         Other field (editing)"),
        Line::from("  Ctrl-U      Clear field (editing)"),
        Line::from("  Esc         Stop editing"),
        Line::from(""),
        section(" General"),
        Line::from("  r         Fetch again"),
        Line::from("  e         Export graph to JSON"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 26u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    // Clear the area behind the help
    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

//! Query line.
//!
//! Shows the instant and span fields; the field being edited is
//! highlighted and followed by a cursor.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::App;
use crate::form::Field;

/// Render the form line.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let line = Line::from(vec![
        Span::styled(" Time ", Style::default().add_modifier(Modifier::BOLD)),
        field(app, Field::Instant, "now"),
        Span::styled("  Span ", Style::default().add_modifier(Modifier::BOLD)),
        field(app, Field::Span, "default"),
        Span::styled(
            "  [t/s:edit Enter:fetch]",
            Style::default().add_modifier(Modifier::DIM),
        ),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn field(app: &App, which: Field, placeholder: &str) -> Span<'static> {
    let value = app.form.field(which);
    if app.editing == Some(which) {
        Span::styled(format!(" {}_ ", value), app.theme.input_active)
    } else if value.is_empty() {
        Span::styled(
            format!(" ({}) ", placeholder),
            Style::default().fg(app.theme.muted),
        )
    } else {
        Span::raw(format!(" {} ", value))
    }
}

//! Graph view rendering.

use ratatui::{layout::Rect, style::Style, widgets::Paragraph, Frame};

use crate::app::App;

/// Render the call graph, highlighting the selected edge.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    match app.scene() {
        Some(scene) => scene.draw(frame, area, &app.theme, app.selection()),
        None => {
            let paragraph = Paragraph::new(" Preparing canvas...")
                .style(Style::default().fg(app.theme.muted));
            frame.render_widget(paragraph, area);
        }
    }
}

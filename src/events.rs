use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{App, View};
use crate::form::Field;

/// File written by the export key.
pub const EXPORT_FILE: &str = "flow_export.json";

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    // While a form field has focus, keys are text
    if app.editing.is_some() {
        handle_form_input(app, key);
        return;
    }

    match key.code {
        // Quit
        KeyCode::Char('q') => app.quit(),

        // View switching
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_view();
            } else {
                app.next_view();
            }
        }
        KeyCode::BackTab => app.prev_view(),
        KeyCode::Char('1') => app.set_view(View::Graph),
        KeyCode::Char('2') => app.set_view(View::Edges),

        // Navigation (up/down for edges, left/right for tabs)
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Left | KeyCode::Char('h') => app.prev_view(),
        KeyCode::Right | KeyCode::Char('l') => app.next_view(),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),

        // Form
        KeyCode::Char('t') => app.start_editing(Field::Instant),
        KeyCode::Char('s') => app.start_editing(Field::Span),
        KeyCode::Enter => submit(app),

        // Re-request
        KeyCode::Char('r') => {
            app.retry();
            app.set_status_message(format!("Requested {}", app.last_query.describe()));
        }

        // Help
        KeyCode::Char('?') => app.toggle_help(),

        // Export
        KeyCode::Char('e') => {
            let export_path = PathBuf::from(EXPORT_FILE);
            match app.export_graph(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        _ => {}
    }
}

/// Handle key input while a form field has focus
fn handle_form_input(app: &mut App, key: KeyEvent) {
    match key.code {
        // Finish editing and fetch
        KeyCode::Enter => submit(app),

        // Stop editing, keep the text
        KeyCode::Esc => app.stop_editing(),

        // Other field
        KeyCode::Tab | KeyCode::BackTab => app.toggle_field(),

        // Clear field
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.form.clear();
        }

        KeyCode::Backspace => app.form.pop(),

        // Type characters
        KeyCode::Char(c) => app.form.push(c),

        _ => {}
    }
}

fn submit(app: &mut App) {
    if let Err(e) = app.submit() {
        app.set_status_message(e.to_string());
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent, content_start_row: u16) {
    match mouse.kind {
        // Scroll wheel
        MouseEventKind::ScrollUp => app.select_prev(),
        MouseEventKind::ScrollDown => app.select_next(),

        MouseEventKind::Down(MouseButton::Left) => {
            let clicked_row = mouse.row;

            // Rows of the edge table (after its border and header)
            if app.current_view == View::Edges && clicked_row > content_start_row + 1 {
                let item_row =
                    (clicked_row - content_start_row - 2) as usize + app.edge_table.offset();
                if item_row < app.graph().edges.len() {
                    app.selected_edge = item_row;
                }
            }

            // Check for tab clicks (row 1, after header)
            if clicked_row == 1 {
                // Approximate tab positions: Graph (0-9), Edges (10-19)
                if mouse.column < 10 {
                    app.set_view(View::Graph);
                } else if mouse.column < 20 {
                    app.set_view(View::Edges);
                }
            }
        }

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CanvasSettings;
    use crate::data::GraphModel;
    use crate::source::{DataSource, FlowQuery, RawResultSet, Sample};
    use ratatui::{backend::TestBackend, layout::Rect, Terminal};

    #[derive(Debug, Default)]
    struct NullSource;

    impl DataSource for NullSource {
        fn request(&mut self, _query: FlowQuery) {}

        fn poll(&mut self) -> Option<RawResultSet> {
            None
        }

        fn description(&self) -> &str {
            "null"
        }

        fn error(&self) -> Option<&str> {
            None
        }
    }

    fn app() -> App {
        App::new(Box::new(NullSource), CanvasSettings::default())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_key_event(app, key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn q_quits() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.running);
    }

    #[test]
    fn q_is_text_while_editing() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('s')));
        type_text(&mut app, "q");
        assert!(app.running);
        assert_eq!(app.form.span, "q");
    }

    #[test]
    fn editing_and_submitting_the_span() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('s')));
        assert_eq!(app.editing, Some(Field::Span));

        type_text(&mut app, "5mx");
        handle_key_event(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.form.span, "5m");

        handle_key_event(&mut app, key(KeyCode::Enter));
        assert_eq!(app.editing, None);
        assert_eq!(app.last_query.step.as_deref(), Some("5m"));
    }

    #[test]
    fn invalid_instant_shows_message() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('t')));
        app.form.instant = "bogus".to_string();
        handle_key_event(&mut app, key(KeyCode::Enter));

        assert_eq!(app.editing, Some(Field::Instant));
        assert!(app.get_status_message().unwrap().contains("invalid time"));
    }

    #[test]
    fn escape_keeps_typed_text() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('s')));
        type_text(&mut app, "1h");
        handle_key_event(&mut app, key(KeyCode::Esc));
        assert_eq!(app.editing, None);
        assert_eq!(app.form.span, "1h");
    }

    #[test]
    fn tab_switches_views_and_fields() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Tab));
        assert_eq!(app.current_view, View::Edges);
        handle_key_event(&mut app, key(KeyCode::Char('1')));
        assert_eq!(app.current_view, View::Graph);

        handle_key_event(&mut app, key(KeyCode::Char('t')));
        handle_key_event(&mut app, key(KeyCode::Tab));
        assert_eq!(app.editing, Some(Field::Span));
        assert_eq!(app.current_view, View::Graph);
    }

    #[test]
    fn help_closes_on_any_key() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('?')));
        assert!(app.show_help);
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.show_help);
        assert!(app.running);
    }

    #[test]
    fn export_without_data_reports_failure() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('e')));
        assert!(app.get_status_message().unwrap().starts_with("Export failed"));
    }

    #[test]
    fn click_selects_the_row_under_the_cursor_after_scrolling() {
        let mut app = app();
        let samples = (0..30)
            .map(|i| Sample::new("ns.a", "func", &format!("ns.f{i}"), "func", "200", "1"))
            .collect();
        app.replace_graph(GraphModel::build(&RawResultSet {
            result: samples,
            ..RawResultSet::default()
        }));
        app.set_view(View::Edges);
        app.select_last();

        // Table at row 3: border, header, then 8 visible rows.
        let mut terminal = Terminal::new(TestBackend::new(80, 14)).unwrap();
        terminal
            .draw(|frame| crate::ui::edges::render(frame, &mut app, Rect::new(0, 3, 80, 11)))
            .unwrap();
        let offset = app.edge_table.offset();
        assert!(offset > 0);

        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 5,
            row: 5,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse_event(&mut app, click, 3);
        assert_eq!(app.selected_edge, offset);
    }
}

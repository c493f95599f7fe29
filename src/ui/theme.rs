//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection. Edge
//! and node colors come from the graph model itself and are the same in
//! both themes.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::{EdgeColor, Node};

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color for error messages.
    pub error: Color,
    /// Color for secondary text and unstyled nodes.
    pub muted: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for node labels on the canvas.
    pub label: Style,
    /// Style for header rows in tables.
    pub header: Style,
    /// Style for selected/highlighted rows.
    pub selected: Style,
    /// Style for the active tab.
    pub tab_active: Style,
    /// Style for inactive tabs.
    pub tab_inactive: Style,
    /// Style for a form field being edited.
    pub input_active: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            error: Color::Red,
            muted: Color::Gray,
            border: Color::Gray,
            label: Style::default().fg(Color::White),
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            input_active: Style::default().fg(Color::Black).bg(Color::Cyan),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            error: Color::Red,
            muted: Color::DarkGray,
            border: Color::DarkGray,
            label: Style::default().fg(Color::Black),
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            input_active: Style::default().fg(Color::White).bg(Color::Blue),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        // Use terminal-light crate to detect background luminance
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Color of an edge by its status class.
    pub fn edge_color(&self, color: EdgeColor) -> Color {
        hex(color.hex())
    }

    /// Stroke color of a node; unstyled nodes use the muted color.
    pub fn node_color(&self, node: &Node) -> Color {
        match node.style {
            Some(style) => hex(style.stroke),
            None => self.muted,
        }
    }

    /// Style for an edge's cells in the edge table.
    pub fn edge_style(&self, color: EdgeColor) -> Style {
        let style = Style::default().fg(self.edge_color(color));
        match color {
            EdgeColor::Red => style.add_modifier(Modifier::BOLD),
            _ => style,
        }
    }
}

/// Parse a `#rrggbb` color, falling back to the terminal default.
fn hex(value: &str) -> Color {
    value.parse().unwrap_or(Color::Reset)
}

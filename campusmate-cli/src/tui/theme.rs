//! Color theme for the Campusmate TUI.

use ratatui::style::{Color, Style};

/// Color theme for the suggestion surface.
#[derive(Debug, Clone)]
pub struct Theme {
    pub bg: Color,
    pub fg: Color,
    pub accent: Color,
    pub muted_fg: Color,
    pub error_fg: Color,
    pub prefer_fg: Color,
    pub avoid_fg: Color,
    pub border_color: Color,
    pub selection_bg: Color,
}

impl Theme {
    /// Default dark theme.
    pub fn dark() -> Self {
        Self {
            bg: Color::Rgb(30, 30, 46),
            fg: Color::Rgb(205, 214, 244),
            accent: Color::Rgb(137, 180, 250),
            muted_fg: Color::Rgb(127, 132, 156),
            error_fg: Color::Rgb(243, 139, 168),
            prefer_fg: Color::Rgb(166, 227, 161),
            avoid_fg: Color::Rgb(243, 139, 168),
            border_color: Color::Rgb(69, 71, 90),
            selection_bg: Color::Rgb(69, 71, 90),
        }
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border_color)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

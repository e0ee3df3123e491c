//! Suggestion popup for slash commands.
//!
//! Renders the presenter's published suggestion list above the input
//! line. The widget only owns the selection cursor; the list itself comes
//! from the presenter on every draw, so it always reflects the latest
//! complete recomputation.

use campusmate_core::CommandSpec;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};

use crate::tui::theme::Theme;

/// Selection state for the suggestion popup.
#[derive(Debug, Default)]
pub struct SuggestionList {
    selected: usize,
}

impl SuggestionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the cursor, e.g. after the query changed.
    pub fn reset(&mut self) {
        self.selected = 0;
    }

    /// Move selection up.
    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Move selection down, clamped to the list length.
    pub fn move_down(&mut self, len: usize) {
        if len > 0 && self.selected < len - 1 {
            self.selected += 1;
        }
    }

    /// The currently selected command, if the list is non-empty.
    pub fn selected<'a>(&self, items: &'a [CommandSpec]) -> Option<&'a CommandSpec> {
        items.get(self.selected.min(items.len().saturating_sub(1)))
    }

    /// Render the popup above the given anchor area.
    pub fn render(&self, frame: &mut Frame, anchor: Rect, items: &[CommandSpec], theme: &Theme) {
        if items.is_empty() {
            return;
        }

        let height = (items.len() as u16 + 2).min(12);
        let width = 56.min(anchor.width);
        let popup_y = anchor.y.saturating_sub(height);
        let popup_area = Rect::new(anchor.x + 1, popup_y, width, height);

        frame.render_widget(Clear, popup_area);

        let cursor = self.selected.min(items.len() - 1);
        let list_items: Vec<ListItem> = items
            .iter()
            .enumerate()
            .map(|(i, cmd)| {
                let style = if i == cursor {
                    Style::default()
                        .fg(theme.accent)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else {
                    Style::default().fg(theme.fg)
                };
                let desc_style = if i == cursor {
                    style
                } else {
                    Style::default().fg(theme.muted_fg)
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!(" {} ", cmd.trigger), style),
                    Span::styled(cmd.description.clone(), desc_style),
                ]))
            })
            .collect();

        let block = Block::default()
            .title(" Commands ")
            .borders(Borders::ALL)
            .border_style(theme.border_style())
            .style(Style::default().bg(theme.bg));

        let mut state = ListState::default();
        state.select(Some(cursor));

        let list = List::new(list_items).block(block);
        frame.render_stateful_widget(list, popup_area, &mut state);
    }
}

//! TUI module for the Campusmate command surface.
//!
//! Provides an input line with a slash-command suggestion popup and a
//! parameter form overlay for the selected command.

pub mod app;
pub mod event;
pub mod theme;
pub mod widgets;

use std::sync::Arc;

use app::App;
use campusmate_core::SuggestionPresenter;

use crate::dispatch::Dispatcher;

/// Run the TUI application.
pub async fn run(
    presenter: SuggestionPresenter,
    dispatcher: Arc<dyn Dispatcher>,
) -> anyhow::Result<()> {
    crossterm::terminal::enable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::EnterAlternateScreen)?;

    let backend = ratatui::backend::CrosstermBackend::new(std::io::stdout());
    let mut terminal = ratatui::Terminal::new(backend)?;
    terminal.clear()?;

    let mut app = App::new(presenter, dispatcher);
    let result = app.run(&mut terminal).await;

    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

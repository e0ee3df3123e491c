//! Main TUI application state and event loop.
//!
//! Typing `/` in the input line opens the suggestion surface; the
//! presenter recomputes the visible command list as the query changes,
//! and accepting a suggestion opens the parameter form overlay. A
//! submitted form hands its payload to the dispatcher.

use std::sync::Arc;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use tokio::sync::watch;

use campusmate_core::{CommandSpec, SuggestionPresenter};

use crate::dispatch::Dispatcher;
use crate::tui::event::EventHandler;
use crate::tui::theme::Theme;
use crate::tui::widgets::palette::SuggestionList;
use crate::tui::widgets::param_form::FormOverlay;

pub struct App {
    presenter: SuggestionPresenter,
    suggestions: watch::Receiver<Vec<CommandSpec>>,
    palette: SuggestionList,
    overlay: Option<FormOverlay>,
    dispatcher: Arc<dyn Dispatcher>,
    input: String,
    status: Option<String>,
    theme: Theme,
    should_quit: bool,
}

impl App {
    pub fn new(presenter: SuggestionPresenter, dispatcher: Arc<dyn Dispatcher>) -> Self {
        let suggestions = presenter.subscribe();
        Self {
            presenter,
            suggestions,
            palette: SuggestionList::new(),
            overlay: None,
            dispatcher,
            input: String::new(),
            status: None,
            theme: Theme::dark(),
            should_quit: false,
        }
    }

    /// Run the main event loop.
    pub async fn run(
        &mut self,
        terminal: &mut ratatui::Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>,
    ) -> anyhow::Result<()> {
        let mut event_handler = EventHandler::new();
        let tick_rate = std::time::Duration::from_millis(100);

        loop {
            terminal.draw(|frame| self.draw(frame))?;

            tokio::select! {
                event = event_handler.next() => {
                    if let Some(event) = event {
                        self.handle_terminal_event(event);
                    }
                }
                // A new suggestion list was published; just redraw.
                result = self.suggestions.changed() => {
                    if result.is_err() {
                        break;
                    }
                }
                _ = tokio::time::sleep(tick_rate) => {}
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_terminal_event(&mut self, event: Event) {
        if let Event::Key(key) = event {
            if key.kind == KeyEventKind::Press {
                self.handle_key(key);
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        if self.overlay.is_some() {
            self.handle_form_key(key);
        } else {
            self.handle_input_key(key);
        }
    }

    /// Keystrokes while the parameter form overlay is open.
    fn handle_form_key(&mut self, key: KeyEvent) {
        let Some(overlay) = self.overlay.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.presenter.close_form();
                self.overlay = None;
                self.status = Some("Cancelled".into());
            }
            KeyCode::Tab | KeyCode::Down => {
                self.presenter.with_form(|form| overlay.focus_next(form));
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.presenter.with_form(|form| overlay.focus_prev(form));
            }
            KeyCode::Left => overlay.option_left(),
            KeyCode::Right => {
                self.presenter.with_form(|form| overlay.option_right(form));
            }
            KeyCode::Enter => {
                let payload = self
                    .presenter
                    .with_form(|form| overlay.try_submit(form))
                    .flatten();
                if let Some(payload) = payload {
                    self.status = Some(format!("Dispatched {}", payload.trigger));
                    self.presenter.take_form();
                    self.overlay = None;
                    self.input.clear();
                    let dispatcher = Arc::clone(&self.dispatcher);
                    tokio::spawn(async move {
                        if let Err(err) = dispatcher.dispatch(payload).await {
                            tracing::error!(error = %err, "dispatch failed");
                        }
                    });
                }
            }
            KeyCode::Char(' ') => {
                // Space picks options; in text fields it is just a space.
                let takes_options = self
                    .presenter
                    .with_form(|form| overlay.focused_takes_options(form))
                    .unwrap_or(false);
                if takes_options {
                    self.presenter.with_form(|form| overlay.activate_option(form));
                } else {
                    self.presenter.with_form(|form| overlay.type_char(form, ' '));
                }
            }
            KeyCode::Char(c) => {
                self.presenter.with_form(|form| overlay.type_char(form, c));
            }
            KeyCode::Backspace => {
                self.presenter.with_form(|form| overlay.backspace(form));
            }
            _ => {}
        }
    }

    /// Keystrokes on the input line, including the suggestion popup.
    fn handle_input_key(&mut self, key: KeyEvent) {
        let palette_open = self.palette_open();
        match key.code {
            KeyCode::Esc => {
                if palette_open {
                    self.input.clear();
                    self.sync_query();
                } else {
                    self.should_quit = true;
                }
            }
            KeyCode::Up if palette_open => self.palette.move_up(),
            KeyCode::Down if palette_open => {
                let len = self.suggestions.borrow().len();
                self.palette.move_down(len);
            }
            KeyCode::Enter | KeyCode::Tab if palette_open => {
                let trigger = {
                    let items = self.suggestions.borrow();
                    self.palette.selected(&items).map(|c| c.trigger.clone())
                };
                if let Some(trigger) = trigger {
                    self.accept(&trigger);
                }
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                self.sync_query();
            }
            KeyCode::Backspace => {
                self.input.pop();
                self.sync_query();
            }
            _ => {}
        }
    }

    /// Whether the suggestion popup is active.
    fn palette_open(&self) -> bool {
        self.input.starts_with('/')
    }

    fn sync_query(&mut self) {
        self.status = None;
        if self.palette_open() {
            self.palette.reset();
            self.presenter.set_query(&self.input);
            self.presenter.set_visible(true);
        } else {
            self.presenter.set_visible(false);
        }
    }

    /// Accept a suggestion: open the parameter form for the command.
    fn accept(&mut self, trigger: &str) {
        if self.presenter.select(trigger) {
            self.overlay = self.presenter.with_form(|form| FormOverlay::new(form));
            self.input.clear();
            self.presenter.set_visible(false);
        }
    }

    pub fn draw(&self, frame: &mut Frame) {
        let [main_area, input_area, status_area] = Layout::vertical([
            Constraint::Min(4),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        let help = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "  Type / to browse commands",
                Style::default().fg(self.theme.muted_fg),
            )),
        ])
        .style(Style::default().bg(self.theme.bg));
        frame.render_widget(help, main_area);

        let input = Paragraph::new(self.input.as_str())
            .style(Style::default().fg(self.theme.fg))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(self.theme.border_style())
                    .title(" Message "),
            );
        frame.render_widget(input, input_area);

        let status = self.status.as_deref().unwrap_or("Esc: quit");
        frame.render_widget(
            Paragraph::new(status).style(Style::default().fg(self.theme.muted_fg)),
            status_area,
        );

        if let Some(overlay) = &self.overlay {
            self.presenter
                .with_form(|form| overlay.render(frame, main_area, form, &self.theme));
        } else if self.palette_open() {
            let items = self.suggestions.borrow().clone();
            self.palette.render(frame, input_area, &items, &self.theme);
        }
    }
}

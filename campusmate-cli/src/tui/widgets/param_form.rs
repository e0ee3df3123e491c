//! Parameter form overlay.
//!
//! Renders the live `ParamForm` for a selected command and translates key
//! presses into state machine calls: typed fields edit a buffer that is
//! committed on focus change or submit, option fields move a chip cursor,
//! and tristate chips cycle through prefer/avoid/clear on activation.

use campusmate_core::{FileRef, FormError, InvocationPayload, ParamForm, ParamKind, Tristate};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::theme::Theme;

/// Editing state for the form overlay. The collected values live in the
/// `ParamForm`; this struct only tracks cursors and the in-progress text
/// buffer for the focused field.
#[derive(Debug, Default)]
pub struct FormOverlay {
    field: usize,
    option: usize,
    buffer: String,
    error: Option<String>,
}

impl FormOverlay {
    pub fn new(form: &ParamForm) -> Self {
        let mut overlay = Self::default();
        overlay.load_buffer(form);
        overlay
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn field_count(&self, form: &ParamForm) -> usize {
        form.spec().params.len()
    }

    fn focused_kind(&self, form: &ParamForm) -> Option<ParamKind> {
        form.spec().params.get(self.field).map(|p| p.kind)
    }

    fn focused_name(&self, form: &ParamForm) -> Option<String> {
        form.spec().params.get(self.field).map(|p| p.name.clone())
    }

    /// Move focus to the next field, committing the current buffer first.
    pub fn focus_next(&mut self, form: &mut ParamForm) {
        self.commit(form);
        let count = self.field_count(form);
        if count > 0 {
            self.field = (self.field + 1) % count;
        }
        self.option = 0;
        self.load_buffer(form);
    }

    /// Move focus to the previous field, committing the current buffer.
    pub fn focus_prev(&mut self, form: &mut ParamForm) {
        self.commit(form);
        let count = self.field_count(form);
        if count > 0 {
            self.field = self.field.checked_sub(1).unwrap_or(count - 1);
        }
        self.option = 0;
        self.load_buffer(form);
    }

    /// Type a character into the focused text-like field.
    pub fn type_char(&mut self, form: &ParamForm, c: char) {
        if matches!(
            self.focused_kind(form),
            Some(ParamKind::Text | ParamKind::Number | ParamKind::Date | ParamKind::File)
        ) {
            self.buffer.push(c);
            self.error = None;
        }
    }

    pub fn backspace(&mut self, form: &ParamForm) {
        if matches!(
            self.focused_kind(form),
            Some(ParamKind::Text | ParamKind::Number | ParamKind::Date | ParamKind::File)
        ) {
            self.buffer.pop();
            self.error = None;
        }
    }

    /// Whether the focused field is option-based (select or tristate).
    pub fn focused_takes_options(&self, form: &ParamForm) -> bool {
        self.focused_kind(form).is_some_and(ParamKind::takes_options)
    }

    /// Move the option cursor for select/tristate fields.
    pub fn option_left(&mut self) {
        self.option = self.option.saturating_sub(1);
    }

    pub fn option_right(&mut self, form: &ParamForm) {
        if let Some(param) = form.spec().params.get(self.field) {
            if param.kind.takes_options() && self.option + 1 < param.options.len() {
                self.option += 1;
            }
        }
    }

    /// Activate the highlighted option: pick it (select) or advance its
    /// tristate phase.
    pub fn activate_option(&mut self, form: &mut ParamForm) {
        let Some(param) = form.spec().params.get(self.field).cloned() else {
            return;
        };
        let Some(option) = param.options.get(self.option) else {
            return;
        };
        let result = match param.kind {
            ParamKind::Select => form.set_value(&param.name, option.value.clone()).map(|_| ()),
            ParamKind::Tristate => form.cycle_tristate(&param.name, &option.value).map(|_| ()),
            _ => Ok(()),
        };
        self.apply(result);
    }

    /// Commit the text buffer of the focused field into the form.
    pub fn commit(&mut self, form: &mut ParamForm) {
        let Some(name) = self.focused_name(form) else {
            return;
        };
        let result = match self.focused_kind(form) {
            Some(ParamKind::Text | ParamKind::Number | ParamKind::Date) => {
                if self.buffer.is_empty() {
                    form.clear_value(&name)
                } else {
                    form.set_value(&name, self.buffer.clone())
                }
            }
            Some(ParamKind::File) => {
                if self.buffer.is_empty() {
                    form.clear_value(&name)
                } else {
                    let display = self
                        .buffer
                        .rsplit(['/', '\\'])
                        .next()
                        .unwrap_or(&self.buffer)
                        .to_string();
                    form.attach_file(&name, FileRef::new(self.buffer.clone(), display))
                }
            }
            _ => Ok(()),
        };
        self.apply(result);
    }

    /// Commit pending input and submit the form.
    pub fn try_submit(&mut self, form: &mut ParamForm) -> Option<InvocationPayload> {
        self.commit(form);
        match form.submit() {
            Ok(payload) => {
                self.error = None;
                Some(payload)
            }
            Err(err) => {
                self.error = Some(err.to_string());
                None
            }
        }
    }

    fn apply(&mut self, result: Result<(), FormError>) {
        self.error = result.err().map(|e| e.to_string());
    }

    fn load_buffer(&mut self, form: &ParamForm) {
        self.buffer = match self.focused_kind(form) {
            Some(ParamKind::File) => form
                .spec()
                .params
                .get(self.field)
                .and_then(|p| form.file(&p.name))
                .map(|f| f.path.clone())
                .unwrap_or_default(),
            _ => self
                .focused_name(form)
                .and_then(|name| form.scalar(&name).map(str::to_string))
                .unwrap_or_default(),
        };
    }

    /// Render the form as a centered popup.
    pub fn render(&self, frame: &mut Frame, area: Rect, form: &ParamForm, theme: &Theme) {
        let spec = form.spec();
        // Two lines per field plus chrome.
        let height = (spec.params.len() as u16 * 2 + 6).min(area.height);
        let width = area.width.saturating_sub(8).min(70);
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        let popup = Rect::new(x, y, width, height);

        frame.render_widget(Clear, popup);

        let mut lines: Vec<Line> = vec![Line::from(Span::styled(
            spec.description.clone(),
            Style::default().fg(theme.muted_fg),
        ))];

        for (i, param) in spec.params.iter().enumerate() {
            let focused = i == self.field;
            let label_style = if focused {
                Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.fg)
            };
            let mut label = vec![Span::styled(param.label.clone(), label_style)];
            if param.required {
                label.push(Span::styled(" *", Style::default().fg(theme.error_fg)));
            }
            lines.push(Line::from(label));

            lines.push(match param.kind {
                ParamKind::Select | ParamKind::Tristate => {
                    self.render_options(form, param, focused, theme)
                }
                _ => self.render_text_value(form, param, focused, theme),
            });
        }

        if let Some(error) = &self.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(theme.error_fg),
            )));
        }
        lines.push(Line::from(Span::styled(
            "Tab: next field  Space: pick  Enter: submit  Esc: cancel",
            Style::default().fg(theme.muted_fg),
        )));

        let block = Block::default()
            .title(format!(" {} ", spec.trigger))
            .borders(Borders::ALL)
            .border_style(theme.border_style())
            .style(Style::default().bg(theme.bg));

        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }

    fn render_text_value<'a>(
        &self,
        form: &ParamForm,
        param: &campusmate_core::ParamSpec,
        focused: bool,
        theme: &Theme,
    ) -> Line<'a> {
        let current = if focused {
            self.buffer.clone()
        } else if param.kind == ParamKind::File {
            form.file(&param.name).map(|f| f.path.clone()).unwrap_or_default()
        } else {
            form.scalar(&param.name).unwrap_or_default().to_string()
        };
        if current.is_empty() {
            let hint = param.placeholder.clone().unwrap_or_default();
            Line::from(Span::styled(
                format!("  {hint}"),
                Style::default().fg(theme.muted_fg),
            ))
        } else {
            let style = if focused {
                Style::default().fg(theme.fg).bg(theme.selection_bg)
            } else {
                Style::default().fg(theme.fg)
            };
            Line::from(Span::styled(format!("  {current}"), style))
        }
    }

    fn render_options<'a>(
        &self,
        form: &ParamForm,
        param: &campusmate_core::ParamSpec,
        focused: bool,
        theme: &Theme,
    ) -> Line<'a> {
        let mut spans = vec![Span::raw("  ")];
        for (j, option) in param.options.iter().enumerate() {
            let cursor_here = focused && j == self.option;
            let (text, mut style) = match param.kind {
                ParamKind::Tristate => match form.tristate(&param.name, &option.value) {
                    Tristate::Preferred => (
                        format!("[{} (+)]", option.label),
                        Style::default().fg(theme.prefer_fg),
                    ),
                    Tristate::Avoided => (
                        format!("[{} (-)]", option.label),
                        Style::default().fg(theme.avoid_fg),
                    ),
                    Tristate::Unset => {
                        (format!("[{}]", option.label), Style::default().fg(theme.fg))
                    }
                },
                _ => {
                    let picked = form.scalar(&param.name) == Some(option.value.as_str());
                    let style = if picked {
                        Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(theme.fg)
                    };
                    (format!("[{}]", option.label), style)
                }
            };
            if cursor_here {
                style = style.add_modifier(Modifier::REVERSED);
            }
            spans.push(Span::styled(text, style));
            spans.push(Span::raw(" "));
        }
        Line::from(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campusmate_core::{Catalog, FormPhase};
    use pretty_assertions::assert_eq;

    fn timetable_form() -> ParamForm {
        let catalog = Catalog::with_defaults().unwrap();
        ParamForm::new(catalog.find("/timetable").unwrap())
    }

    #[test]
    fn test_select_option_via_cursor() {
        let mut form = timetable_form();
        let mut overlay = FormOverlay::new(&form);
        // Field 0 is the semester select; pick the third option.
        overlay.option_right(&form);
        overlay.option_right(&form);
        overlay.activate_option(&mut form);
        assert_eq!(form.scalar("semester"), Some("3"));
        assert_eq!(form.phase(), FormPhase::Valid);
    }

    #[test]
    fn test_typed_field_commits_on_focus_change() {
        let mut form = timetable_form();
        let mut overlay = FormOverlay::new(&form);
        // Move to prefer_lecturer (field 3) and type a name.
        for _ in 0..3 {
            overlay.focus_next(&mut form);
        }
        for c in "Dr. Lam".chars() {
            overlay.type_char(&form, c);
        }
        overlay.focus_next(&mut form);
        assert_eq!(form.scalar("prefer_lecturer"), Some("Dr. Lam"));
    }

    #[test]
    fn test_tristate_chip_cycles() {
        let mut form = timetable_form();
        let mut overlay = FormOverlay::new(&form);
        overlay.focus_next(&mut form);
        overlay.focus_next(&mut form); // day_preferences
        overlay.activate_option(&mut form);
        assert_eq!(form.tristate("day_preferences", "Monday"), Tristate::Preferred);
        overlay.activate_option(&mut form);
        assert_eq!(form.tristate("day_preferences", "Monday"), Tristate::Avoided);
        overlay.activate_option(&mut form);
        assert_eq!(form.tristate("day_preferences", "Monday"), Tristate::Unset);
    }

    #[test]
    fn test_submit_failure_sets_error() {
        let mut form = timetable_form();
        let mut overlay = FormOverlay::new(&form);
        assert!(overlay.try_submit(&mut form).is_none());
        assert!(overlay.error().unwrap().contains("semester"));
    }

    #[test]
    fn test_submit_success_returns_payload() {
        let mut form = timetable_form();
        let mut overlay = FormOverlay::new(&form);
        overlay.activate_option(&mut form); // semester = "1"
        let payload = overlay.try_submit(&mut form).unwrap();
        assert_eq!(payload.trigger, "/timetable");
        assert!(overlay.error().is_none());
    }

    #[test]
    fn test_file_buffer_attaches_on_commit() {
        let catalog = Catalog::with_defaults().unwrap();
        let mut form = ParamForm::new(catalog.find("/topcv").unwrap());
        let mut overlay = FormOverlay::new(&form);
        for c in "/tmp/cv.pdf".chars() {
            overlay.type_char(&form, c);
        }
        overlay.commit(&mut form);
        let file = form.file("file").unwrap();
        assert_eq!(file.path, "/tmp/cv.pdf");
        assert_eq!(file.name, "cv.pdf");
        assert_eq!(form.phase(), FormPhase::Valid);
    }

    #[test]
    fn test_invalid_number_reports_error() {
        let catalog = Catalog::with_defaults().unwrap();
        let mut form = ParamForm::new(catalog.find("/questions").unwrap());
        let mut overlay = FormOverlay::new(&form);
        overlay.focus_next(&mut form); // num_questions
        for c in "ten".chars() {
            overlay.type_char(&form, c);
        }
        overlay.commit(&mut form);
        assert!(overlay.error().unwrap().contains("num_questions"));
    }

    #[test]
    fn test_render_does_not_panic() {
        let backend = ratatui::backend::TestBackend::new(80, 24);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let form = timetable_form();
        let overlay = FormOverlay::new(&form);
        let theme = Theme::dark();
        terminal
            .draw(|frame| {
                overlay.render(frame, frame.area(), &form, &theme);
            })
            .unwrap();
    }
}

//! Per-invocation parameter form state machine.
//!
//! A `ParamForm` is created against one command's schema when the user
//! selects it from the suggestion list, collects parameter values, and on
//! submission yields the validated `InvocationPayload` handed to the
//! external dispatcher. Each instance is owned by exactly one UI
//! interaction and discarded on submit, cancel, or navigation away.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::catalog::{CommandSpec, ParamKind, ParamSpec};
use crate::error::FormError;

/// Phase of a single tristate option. Repeated selection advances the
/// cycle Unset -> Preferred -> Avoided -> Unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tristate {
    #[default]
    Unset,
    Preferred,
    Avoided,
}

impl Tristate {
    /// The next phase in the cycle.
    pub fn next(self) -> Self {
        match self {
            Tristate::Unset => Tristate::Preferred,
            Tristate::Preferred => Tristate::Avoided,
            Tristate::Avoided => Tristate::Unset,
        }
    }

    /// Wire label for the payload; `None` for `Unset` (the option is
    /// omitted entirely).
    pub fn wire_label(self) -> Option<&'static str> {
        match self {
            Tristate::Unset => None,
            Tristate::Preferred => Some("prefer"),
            Tristate::Avoided => Some("avoid"),
        }
    }
}

/// Reference to an attached file. Presence is validated, content is not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRef {
    /// Local path or URI of the picked file.
    pub path: String,
    /// Display name.
    pub name: String,
}

impl FileRef {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }
}

/// A resolved parameter value in the outbound payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PayloadValue {
    /// Text, number, date, and select values are carried as strings.
    Scalar(String),
    /// File reference.
    File(FileRef),
    /// Tristate selection: option -> "prefer" | "avoid". Unset options
    /// are omitted.
    Tristate(BTreeMap<String, String>),
}

/// The validated payload handed to the external command dispatcher.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationPayload {
    pub trigger: String,
    pub values: BTreeMap<String, PayloadValue>,
}

/// Lifecycle phase of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    /// Collecting values; at least one required parameter is missing.
    Collecting,
    /// All required parameters satisfied; submission permitted.
    Valid,
    /// Terminal: payload emitted.
    Submitted,
    /// Terminal: values discarded, nothing emitted.
    Cancelled,
}

impl FormPhase {
    fn name(self) -> &'static str {
        match self {
            FormPhase::Collecting => "Collecting",
            FormPhase::Valid => "Valid",
            FormPhase::Submitted => "Submitted",
            FormPhase::Cancelled => "Cancelled",
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, FormPhase::Submitted | FormPhase::Cancelled)
    }
}

/// Mutable per-invocation form state for one command.
pub struct ParamForm {
    spec: CommandSpec,
    scalars: BTreeMap<String, String>,
    files: BTreeMap<String, FileRef>,
    tristates: BTreeMap<String, BTreeMap<String, Tristate>>,
    phase: FormPhase,
}

impl ParamForm {
    /// Start a form for the given command. Begins in `Collecting`, or
    /// directly in `Valid` when nothing is required.
    pub fn new(spec: &CommandSpec) -> Self {
        let mut form = Self {
            spec: spec.clone(),
            scalars: BTreeMap::new(),
            files: BTreeMap::new(),
            tristates: BTreeMap::new(),
            phase: FormPhase::Collecting,
        };
        form.revalidate();
        form
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    /// Set the value of a text, number, date, or select parameter.
    pub fn set_value(&mut self, name: &str, value: impl Into<String>) -> Result<(), FormError> {
        self.ensure_mutable()?;
        let param = self.lookup(name)?;
        let value = value.into();
        match param.kind {
            ParamKind::Tristate => {
                return Err(FormError::Tristate { param: name.into() });
            }
            ParamKind::File => {
                return Err(FormError::TypeMismatch {
                    param: name.into(),
                    reason: "file parameters take a file reference".into(),
                });
            }
            ParamKind::Number => {
                // Number parameters are counts; reject negatives, decimals,
                // exponents, and non-finite spellings like "NaN".
                if value.trim().parse::<u64>().is_err() {
                    return Err(FormError::TypeMismatch {
                        param: name.into(),
                        reason: format!("'{value}' is not a non-negative whole number"),
                    });
                }
            }
            ParamKind::Select => {
                if !param.options.iter().any(|o| o.value == value) {
                    return Err(FormError::UnknownOption {
                        param: name.into(),
                        option: value,
                    });
                }
            }
            ParamKind::Text | ParamKind::Date => {}
        }
        if value.is_empty() {
            self.scalars.remove(name);
        } else {
            self.scalars.insert(name.to_string(), value);
        }
        self.revalidate();
        Ok(())
    }

    /// Attach a file reference to a file parameter. The machine validates
    /// presence only, never content.
    pub fn attach_file(&mut self, name: &str, file: FileRef) -> Result<(), FormError> {
        self.ensure_mutable()?;
        let param = self.lookup(name)?;
        if param.kind != ParamKind::File {
            return Err(FormError::TypeMismatch {
                param: name.into(),
                reason: "not a file parameter".into(),
            });
        }
        if file.path.is_empty() {
            return Err(FormError::TypeMismatch {
                param: name.into(),
                reason: "empty file reference".into(),
            });
        }
        self.files.insert(name.to_string(), file);
        self.revalidate();
        Ok(())
    }

    /// Advance one tristate option a single step in the cycle. Returns the
    /// new phase of that option.
    pub fn cycle_tristate(&mut self, name: &str, option: &str) -> Result<Tristate, FormError> {
        self.ensure_mutable()?;
        let param = self.lookup(name)?;
        if param.kind != ParamKind::Tristate {
            return Err(FormError::NotTristate { param: name.into() });
        }
        if !param.options.iter().any(|o| o.value == option) {
            return Err(FormError::UnknownOption {
                param: name.into(),
                option: option.into(),
            });
        }
        let states = self.tristates.entry(name.to_string()).or_default();
        let next = states.get(option).copied().unwrap_or_default().next();
        if next == Tristate::Unset {
            states.remove(option);
        } else {
            states.insert(option.to_string(), next);
        }
        self.revalidate();
        Ok(next)
    }

    /// Clear any collected value for the parameter.
    pub fn clear_value(&mut self, name: &str) -> Result<(), FormError> {
        self.ensure_mutable()?;
        self.lookup(name)?;
        self.scalars.remove(name);
        self.files.remove(name);
        self.tristates.remove(name);
        self.revalidate();
        Ok(())
    }

    /// Current scalar value of a parameter, if set.
    pub fn scalar(&self, name: &str) -> Option<&str> {
        self.scalars.get(name).map(String::as_str)
    }

    /// Current file reference, if attached.
    pub fn file(&self, name: &str) -> Option<&FileRef> {
        self.files.get(name)
    }

    /// Current phase of one tristate option.
    pub fn tristate(&self, name: &str, option: &str) -> Tristate {
        self.tristates
            .get(name)
            .and_then(|states| states.get(option))
            .copied()
            .unwrap_or_default()
    }

    /// Submit the form. Only permitted from `Valid`; from `Collecting` the
    /// error names the first missing required parameter in declaration
    /// order. Transitions to the terminal `Submitted` phase.
    pub fn submit(&mut self) -> Result<InvocationPayload, FormError> {
        if self.phase.is_terminal() {
            return Err(FormError::InvalidState {
                from: self.phase.name(),
                to: "Submitted",
            });
        }
        if let Some(param) = self.first_missing_required() {
            return Err(FormError::MissingRequired { param });
        }
        self.phase = FormPhase::Submitted;
        Ok(self.payload())
    }

    /// Cancel the form from any non-terminal phase, discarding all
    /// collected values.
    pub fn cancel(&mut self) -> Result<(), FormError> {
        if self.phase.is_terminal() {
            return Err(FormError::InvalidState {
                from: self.phase.name(),
                to: "Cancelled",
            });
        }
        self.scalars.clear();
        self.files.clear();
        self.tristates.clear();
        self.phase = FormPhase::Cancelled;
        Ok(())
    }

    fn ensure_mutable(&self) -> Result<(), FormError> {
        if self.phase.is_terminal() {
            return Err(FormError::InvalidState {
                from: self.phase.name(),
                to: "Collecting",
            });
        }
        Ok(())
    }

    fn lookup(&self, name: &str) -> Result<&ParamSpec, FormError> {
        self.spec
            .param(name)
            .ok_or_else(|| FormError::UnknownParam { param: name.into() })
    }

    /// First required parameter without a value, in declaration order.
    /// Required tristates count as satisfied once any option is touched.
    fn first_missing_required(&self) -> Option<String> {
        self.spec
            .params
            .iter()
            .filter(|p| p.required)
            .find(|p| match p.kind {
                ParamKind::File => !self.files.contains_key(&p.name),
                ParamKind::Tristate => self
                    .tristates
                    .get(&p.name)
                    .is_none_or(|states| states.is_empty()),
                _ => !self.scalars.contains_key(&p.name),
            })
            .map(|p| p.name.clone())
    }

    fn revalidate(&mut self) {
        if self.phase.is_terminal() {
            return;
        }
        self.phase = if self.first_missing_required().is_none() {
            FormPhase::Valid
        } else {
            FormPhase::Collecting
        };
    }

    fn payload(&self) -> InvocationPayload {
        let mut values = BTreeMap::new();
        for param in &self.spec.params {
            match param.kind {
                ParamKind::File => {
                    if let Some(file) = self.files.get(&param.name) {
                        values.insert(param.name.clone(), PayloadValue::File(file.clone()));
                    }
                }
                ParamKind::Tristate => {
                    if let Some(states) = self.tristates.get(&param.name) {
                        let touched: BTreeMap<String, String> = states
                            .iter()
                            .filter_map(|(option, phase)| {
                                phase
                                    .wire_label()
                                    .map(|label| (option.clone(), label.to_string()))
                            })
                            .collect();
                        if !touched.is_empty() {
                            values.insert(param.name.clone(), PayloadValue::Tristate(touched));
                        }
                    }
                }
                _ => {
                    if let Some(value) = self.scalars.get(&param.name) {
                        values.insert(param.name.clone(), PayloadValue::Scalar(value.clone()));
                    }
                }
            }
        }
        InvocationPayload {
            trigger: self.spec.trigger.clone(),
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, ParamOption};
    use pretty_assertions::assert_eq;

    fn timetable_spec() -> CommandSpec {
        let catalog = Catalog::with_defaults().unwrap();
        catalog.find("/timetable").unwrap().clone()
    }

    #[test]
    fn test_tristate_is_a_three_cycle() {
        let mut state = Tristate::Unset;
        state = state.next();
        assert_eq!(state, Tristate::Preferred);
        state = state.next();
        assert_eq!(state, Tristate::Avoided);
        state = state.next();
        assert_eq!(state, Tristate::Unset);
    }

    #[test]
    fn test_cycle_three_times_returns_to_unset() {
        let mut form = ParamForm::new(&timetable_spec());
        form.cycle_tristate("day_preferences", "Monday").unwrap();
        form.cycle_tristate("day_preferences", "Monday").unwrap();
        let phase = form.cycle_tristate("day_preferences", "Monday").unwrap();
        assert_eq!(phase, Tristate::Unset);
        assert_eq!(form.tristate("day_preferences", "Monday"), Tristate::Unset);
    }

    #[test]
    fn test_submit_names_first_missing_required_param() {
        let mut form = ParamForm::new(&timetable_spec());
        assert_eq!(form.phase(), FormPhase::Collecting);
        let err = form.submit().unwrap_err();
        assert!(matches!(
            err,
            FormError::MissingRequired { param } if param == "semester"
        ));
    }

    #[test]
    fn test_timetable_scenario() {
        let mut form = ParamForm::new(&timetable_spec());
        form.set_value("semester", "3").unwrap();
        assert_eq!(form.phase(), FormPhase::Valid);

        let payload = form.submit().unwrap();
        assert_eq!(payload.trigger, "/timetable");
        assert_eq!(
            payload.values.get("semester"),
            Some(&PayloadValue::Scalar("3".into()))
        );
        assert_eq!(payload.values.len(), 1);
        assert_eq!(form.phase(), FormPhase::Submitted);
    }

    #[test]
    fn test_tristate_payload_holds_touched_options_only() {
        let mut form = ParamForm::new(&timetable_spec());
        form.set_value("semester", "1").unwrap();
        form.cycle_tristate("day_preferences", "Monday").unwrap(); // prefer
        form.cycle_tristate("day_preferences", "Saturday").unwrap();
        form.cycle_tristate("day_preferences", "Saturday").unwrap(); // avoid
        form.cycle_tristate("day_preferences", "Sunday").unwrap();
        form.cycle_tristate("day_preferences", "Sunday").unwrap();
        form.cycle_tristate("day_preferences", "Sunday").unwrap(); // back to unset

        let payload = form.submit().unwrap();
        let expected: BTreeMap<String, String> = [
            ("Monday".to_string(), "prefer".to_string()),
            ("Saturday".to_string(), "avoid".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            payload.values.get("day_preferences"),
            Some(&PayloadValue::Tristate(expected))
        );
    }

    #[test]
    fn test_optional_tristate_untouched_is_absent() {
        let mut form = ParamForm::new(&timetable_spec());
        form.set_value("semester", "2").unwrap();
        let payload = form.submit().unwrap();
        assert!(!payload.values.contains_key("day_preferences"));
    }

    #[test]
    fn test_required_tristate_needs_one_touched_option() {
        let spec = CommandSpec::new("/plan", "Plan days", "planner").params(vec![
            ParamSpec::new("days", "Days", ParamKind::Tristate)
                .required()
                .options(vec![ParamOption::plain("Monday"), ParamOption::plain("Tuesday")]),
        ]);
        let catalog = Catalog::new(vec![spec]).unwrap();
        let mut form = ParamForm::new(catalog.find("/plan").unwrap());

        assert_eq!(form.phase(), FormPhase::Collecting);
        form.cycle_tristate("days", "Monday").unwrap();
        assert_eq!(form.phase(), FormPhase::Valid);

        // Cycling back to unset makes it missing again.
        form.cycle_tristate("days", "Monday").unwrap();
        form.cycle_tristate("days", "Monday").unwrap();
        assert_eq!(form.phase(), FormPhase::Collecting);
    }

    #[test]
    fn test_select_rejects_unknown_option() {
        let mut form = ParamForm::new(&timetable_spec());
        let err = form.set_value("semester", "99").unwrap_err();
        assert!(matches!(err, FormError::UnknownOption { .. }));
    }

    #[test]
    fn test_number_rejects_non_numeric() {
        let catalog = Catalog::with_defaults().unwrap();
        let mut form = ParamForm::new(catalog.find("/questions").unwrap());
        let err = form.set_value("num_questions", "ten").unwrap_err();
        assert!(matches!(err, FormError::TypeMismatch { .. }));
        form.set_value("num_questions", "10").unwrap();
        assert_eq!(form.scalar("num_questions"), Some("10"));
    }

    #[test]
    fn test_number_accepts_counts_only() {
        let catalog = Catalog::with_defaults().unwrap();
        let mut form = ParamForm::new(catalog.find("/questions").unwrap());
        for bad in ["NaN", "inf", "1e9", "-3", "3.5"] {
            assert!(
                matches!(
                    form.set_value("num_questions", bad),
                    Err(FormError::TypeMismatch { .. })
                ),
                "'{bad}' should be rejected"
            );
        }
        form.set_value("num_questions", " 12 ").unwrap();
        assert_eq!(form.scalar("num_questions"), Some(" 12 "));
    }

    #[test]
    fn test_file_presence_satisfies_required() {
        let catalog = Catalog::with_defaults().unwrap();
        let mut form = ParamForm::new(catalog.find("/topcv").unwrap());
        assert_eq!(form.phase(), FormPhase::Collecting);

        form.attach_file("file", FileRef::new("/tmp/cv.pdf", "cv.pdf"))
            .unwrap();
        assert_eq!(form.phase(), FormPhase::Valid);

        let payload = form.submit().unwrap();
        assert_eq!(
            payload.values.get("file"),
            Some(&PayloadValue::File(FileRef::new("/tmp/cv.pdf", "cv.pdf")))
        );
    }

    #[test]
    fn test_empty_file_reference_rejected() {
        let catalog = Catalog::with_defaults().unwrap();
        let mut form = ParamForm::new(catalog.find("/topcv").unwrap());
        let err = form.attach_file("file", FileRef::new("", "cv.pdf")).unwrap_err();
        assert!(matches!(err, FormError::TypeMismatch { .. }));
    }

    #[test]
    fn test_set_value_on_tristate_rejected() {
        let mut form = ParamForm::new(&timetable_spec());
        let err = form.set_value("day_preferences", "Monday").unwrap_err();
        assert!(matches!(err, FormError::Tristate { .. }));
    }

    #[test]
    fn test_cycle_on_scalar_rejected() {
        let mut form = ParamForm::new(&timetable_spec());
        let err = form.cycle_tristate("semester", "1").unwrap_err();
        assert!(matches!(err, FormError::NotTristate { .. }));
    }

    #[test]
    fn test_unknown_param_rejected() {
        let mut form = ParamForm::new(&timetable_spec());
        let err = form.set_value("nope", "x").unwrap_err();
        assert!(matches!(err, FormError::UnknownParam { .. }));
    }

    #[test]
    fn test_clearing_required_value_invalidates() {
        let mut form = ParamForm::new(&timetable_spec());
        form.set_value("semester", "3").unwrap();
        assert_eq!(form.phase(), FormPhase::Valid);
        form.clear_value("semester").unwrap();
        assert_eq!(form.phase(), FormPhase::Collecting);
    }

    #[test]
    fn test_cancel_discards_values() {
        let mut form = ParamForm::new(&timetable_spec());
        form.set_value("semester", "3").unwrap();
        form.cancel().unwrap();
        assert_eq!(form.phase(), FormPhase::Cancelled);
        assert_eq!(form.scalar("semester"), None);
    }

    #[test]
    fn test_terminal_phases_reject_transitions() {
        let mut form = ParamForm::new(&timetable_spec());
        form.set_value("semester", "3").unwrap();
        form.submit().unwrap();

        assert!(matches!(
            form.submit(),
            Err(FormError::InvalidState { from: "Submitted", .. })
        ));
        assert!(matches!(
            form.cancel(),
            Err(FormError::InvalidState { from: "Submitted", .. })
        ));
        assert!(matches!(
            form.set_value("semester", "1"),
            Err(FormError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_no_params_starts_valid() {
        let spec = CommandSpec::new("/ping", "Ping", "ping");
        let mut form = ParamForm::new(&spec);
        assert_eq!(form.phase(), FormPhase::Valid);
        let payload = form.submit().unwrap();
        assert!(payload.values.is_empty());
    }

    #[test]
    fn test_payload_serialization_shape() {
        let mut form = ParamForm::new(&timetable_spec());
        form.set_value("semester", "3").unwrap();
        form.cycle_tristate("day_preferences", "Friday").unwrap();
        let payload = form.submit().unwrap();

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["trigger"], "/timetable");
        assert_eq!(json["values"]["semester"], "3");
        assert_eq!(json["values"]["day_preferences"]["Friday"], "prefer");
    }
}

//! Slash-command schema catalog.
//!
//! Provides the immutable, process-wide catalog of invocable commands with
//! their typed parameter schemas. The catalog is validated once at
//! construction and never mutated afterwards, so it is safe to share across
//! concurrent readers behind an `Arc` without synchronization.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::CatalogError;

/// The kind of a command parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Text,
    Number,
    Date,
    Select,
    Tristate,
    File,
}

impl ParamKind {
    /// Whether this kind carries an options list.
    pub fn takes_options(self) -> bool {
        matches!(self, ParamKind::Select | ParamKind::Tristate)
    }
}

/// A single selectable option for a select or tristate parameter.
///
/// Plain-string options normalize to `label == value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamOption {
    /// Display label shown to the user.
    pub label: String,
    /// Value sent in the invocation payload.
    pub value: String,
}

impl ParamOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// A plain option whose label and value are the same string.
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

/// Schema for one command parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name, unique within its command.
    pub name: String,
    /// Display label.
    pub label: String,
    /// Parameter kind.
    pub kind: ParamKind,
    /// Whether a value must be present before submission.
    #[serde(default)]
    pub required: bool,
    /// Options, present iff `kind` is select or tristate.
    #[serde(default)]
    pub options: Vec<ParamOption>,
    /// Optional display hint.
    #[serde(default)]
    pub placeholder: Option<String>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required: false,
            options: Vec::new(),
            placeholder: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn placeholder(mut self, hint: impl Into<String>) -> Self {
        self.placeholder = Some(hint.into());
        self
    }

    pub fn options(mut self, options: Vec<ParamOption>) -> Self {
        self.options = options;
        self
    }
}

/// Schema for one slash command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Trigger string including the slash, e.g. "/timetable". Unique
    /// across the whole catalog.
    pub trigger: String,
    /// One-line description shown in the suggestion list.
    pub description: String,
    /// Key into the plugin enablement store. Several commands may share
    /// one plugin.
    pub plugin_id: String,
    /// Ordered parameter schemas; may be empty.
    #[serde(default)]
    pub params: Vec<ParamSpec>,
}

impl CommandSpec {
    pub fn new(
        trigger: impl Into<String>,
        description: impl Into<String>,
        plugin_id: impl Into<String>,
    ) -> Self {
        Self {
            trigger: trigger.into(),
            description: description.into(),
            plugin_id: plugin_id.into(),
            params: Vec::new(),
        }
    }

    pub fn params(mut self, params: Vec<ParamSpec>) -> Self {
        self.params = params;
        self
    }

    /// Look up a parameter schema by name.
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// The validated, immutable command catalog.
#[derive(Debug)]
pub struct Catalog {
    commands: Vec<CommandSpec>,
}

impl Catalog {
    /// Build a catalog from command schemas, validating invariants:
    /// triggers unique catalog-wide, parameter names unique per command,
    /// options non-empty exactly for select and tristate parameters.
    pub fn new(commands: Vec<CommandSpec>) -> Result<Self, CatalogError> {
        let mut triggers = HashSet::new();
        for cmd in &commands {
            if !triggers.insert(cmd.trigger.as_str()) {
                return Err(CatalogError::DuplicateTrigger {
                    trigger: cmd.trigger.clone(),
                });
            }
            let mut names = HashSet::new();
            for param in &cmd.params {
                if !names.insert(param.name.as_str()) {
                    return Err(CatalogError::DuplicateParam {
                        trigger: cmd.trigger.clone(),
                        param: param.name.clone(),
                    });
                }
                if param.kind.takes_options() && param.options.is_empty() {
                    return Err(CatalogError::EmptyOptions {
                        trigger: cmd.trigger.clone(),
                        param: param.name.clone(),
                    });
                }
                if !param.kind.takes_options() && !param.options.is_empty() {
                    return Err(CatalogError::UnexpectedOptions {
                        trigger: cmd.trigger.clone(),
                        param: param.name.clone(),
                    });
                }
            }
        }
        Ok(Self { commands })
    }

    /// The built-in Campusmate command set.
    pub fn with_defaults() -> Result<Self, CatalogError> {
        Self::new(vec![
            CommandSpec::new("/documents", "Search university documents", "documents").params(
                vec![
                    ParamSpec::new("message", "Search query", ParamKind::Text)
                        .required()
                        .placeholder("Document name or content to look for..."),
                ],
            ),
            CommandSpec::new("/scores", "Look up your grades", "score").params(vec![
                ParamSpec::new("message", "Question about your grades", ParamKind::Text)
                    .required()
                    .placeholder("e.g. What is my Calculus grade?"),
            ]),
            CommandSpec::new("/summary", "Summarize content", "summary").params(vec![
                ParamSpec::new("message", "Summary request", ParamKind::Text)
                    .required()
                    .placeholder("What should be summarized..."),
            ]),
            CommandSpec::new("/timetable", "View your class timetable", "timetable").params(vec![
                ParamSpec::new("semester", "Semester", ParamKind::Select)
                    .required()
                    .options(
                        (1..=9)
                            .map(|n| ParamOption::new(format!("Semester {n}"), n.to_string()))
                            .collect(),
                    ),
                ParamSpec::new("prefer_time", "Preferred session", ParamKind::Select).options(
                    vec![
                        ParamOption::new("Morning", "Morning"),
                        ParamOption::new("Afternoon", "Afternoon"),
                    ],
                ),
                ParamSpec::new("day_preferences", "Prefer / avoid days", ParamKind::Tristate)
                    .placeholder("Tap once: prefer | twice: avoid | three times: clear")
                    .options(
                        [
                            "Monday",
                            "Tuesday",
                            "Wednesday",
                            "Thursday",
                            "Friday",
                            "Saturday",
                            "Sunday",
                        ]
                        .into_iter()
                        .map(ParamOption::plain)
                        .collect(),
                    ),
                ParamSpec::new("prefer_lecturer", "Preferred lecturer", ParamKind::Text)
                    .placeholder("Lecturer name..."),
            ]),
            CommandSpec::new("/questions", "Generate revision questions", "questions").params(
                vec![
                    ParamSpec::new("file", "Upload a PDF", ParamKind::File)
                        .required()
                        .placeholder("Choose a PDF file..."),
                    ParamSpec::new("num_questions", "Number of questions", ParamKind::Number)
                        .required()
                        .placeholder("10"),
                    ParamSpec::new("question_relevance", "Relevance", ParamKind::Select)
                        .required()
                        .options(vec![
                            ParamOption::new("Very high", "Very High"),
                            ParamOption::new("High", "High"),
                            ParamOption::new("Medium", "Medium"),
                            ParamOption::new("Low", "Low"),
                        ]),
                    ParamSpec::new("num_open_questions", "Open questions", ParamKind::Number)
                        .required()
                        .placeholder("3"),
                    ParamSpec::new("difficulty_level", "Difficulty", ParamKind::Select)
                        .required()
                        .options(vec![
                            ParamOption::new("Easy", "Easy"),
                            ParamOption::new("Medium", "Medium"),
                            ParamOption::new("Hard", "Hard"),
                            ParamOption::new("Very hard", "Very Hard"),
                        ]),
                ],
            ),
            CommandSpec::new("/research", "Research a topic", "research").params(vec![
                ParamSpec::new("topic", "Research topic", ParamKind::Text)
                    .required()
                    .placeholder("Topic to research..."),
            ]),
            CommandSpec::new("/sto", "Programming Q&A (StackOverflow)", "stackoverflow").params(
                vec![
                    ParamSpec::new("message", "Question", ParamKind::Text)
                        .required()
                        .placeholder("Paste an error or describe the problem..."),
                ],
            ),
            CommandSpec::new("/nlp", "Natural language processing", "chatnlp").params(vec![
                ParamSpec::new("text", "Text", ParamKind::Text)
                    .required()
                    .placeholder("Text to process..."),
            ]),
            CommandSpec::new("/topcv", "Find jobs matching your CV", "topcv").params(vec![
                ParamSpec::new("file", "Upload your CV (PDF/image)", ParamKind::File).required(),
            ]),
        ])
    }

    /// All commands in stable insertion order.
    pub fn list(&self) -> &[CommandSpec] {
        &self.commands
    }

    /// Look up a command by its trigger string.
    pub fn find(&self, trigger: &str) -> Option<&CommandSpec> {
        self.commands.iter().find(|c| c.trigger == trigger)
    }

    /// Distinct plugin ids referenced by the catalog, in first-seen order.
    pub fn plugin_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.commands
            .iter()
            .filter(|c| seen.insert(c.plugin_id.as_str()))
            .map(|c| c.plugin_id.as_str())
            .collect()
    }
}

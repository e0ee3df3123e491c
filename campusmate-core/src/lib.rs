//! # Campusmate Core
//!
//! Core library for the Campusmate slash-command surface.
//! Provides the command schema catalog, the persisted plugin enablement
//! store, the pure suggestion filter, the per-invocation parameter form
//! state machine, and the reactive suggestion presenter that wires them
//! together. The output contract is an `InvocationPayload` handed to an
//! external command dispatcher.

pub mod catalog;
pub mod config;
pub mod enablement;
pub mod error;
pub mod filter;
pub mod form;
pub mod persistence;
pub mod presenter;

// Re-export commonly used types at the crate root.
pub use catalog::{Catalog, CommandSpec, ParamKind, ParamOption, ParamSpec};
pub use config::{SurfaceConfig, load_config};
pub use enablement::{
    DisabledOverlay, EnablementSnapshot, EnablementSource, FailPolicy, FileEnablementStore,
    StaticEnablement,
};
pub use error::{CampusError, CatalogError, EnablementError, FormError, Result};
pub use filter::suggestions;
pub use form::{FileRef, FormPhase, InvocationPayload, ParamForm, PayloadValue, Tristate};
pub use presenter::SuggestionPresenter;

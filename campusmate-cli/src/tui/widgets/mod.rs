//! Widgets for the Campusmate suggestion surface.

pub mod palette;
pub mod param_form;

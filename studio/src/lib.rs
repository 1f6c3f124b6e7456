//! Instructor-side settings form.
//!
//! A pure form model: declarative per-field validation rules, repeated
//! test-case and language blocks with add/remove and contiguous
//! reindexing, and (de)serialization of the settings document the host
//! persists. Rendering lives elsewhere; this crate only answers "what is
//! the state of every field and is the form saveable".
mod form;
mod rules;
pub mod settings;

pub use form::{Field, LanguageBlock, StudioForm, TestCaseBlock};
pub use rules::{Feedback, Rule};
pub use settings::{StudioSettings, TestCase};

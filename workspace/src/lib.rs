//! Student-side workspace state machine.
//!
//! A [`Workspace`] owns the set of student files, the active editing
//! session and the run/submit lifecycle. Every state change the UI must
//! reflect is published on an event stream; server-confirmed mutations
//! (create, rename, delete) only apply locally once the exercise service
//! acknowledges them.
pub mod autosave;
mod event;
mod internals;
pub mod snapshot;
mod workspace;

pub use autosave::{AutosavePolicy, AutosaveSchedule};
pub use event::{
    Event, ExecutionKind, Notice, NoticeLevel, RunOutcome, RunReport, ScoreBoard, SubmitOutcome,
    SubmitReport,
};
pub use snapshot::{FileSnapshot, WorkspaceSnapshot};
pub use workspace::Workspace;

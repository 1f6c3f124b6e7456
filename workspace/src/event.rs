//! Events published by the workspace.
//!
//! The UI never polls workspace state; it folds this stream into its own
//! view model.

use protocol::responses::TestResult;

/// Which of the two guarded operations is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionKind {
    Run,
    Submit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A transient user-facing message (validation failures, server
/// rejections, transport trouble).
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// The score board shown in the workspace header.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreBoard {
    pub current: f64,
    pub best: f64,
    pub max: f64,
    pub submissions: u32,
}

/// A completed run as the execution backend reported it.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub compile_output: Option<String>,
    pub status: Option<String>,
    pub time: Option<String>,
    pub memory: Option<i64>,
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed(RunReport),
    /// The service answered but refused the run (e.g. a compile error).
    Rejected { message: String },
    /// The service could not be reached or answered garbage.
    TransportFailed { message: String },
}

/// A graded submission.
#[derive(Debug, Clone)]
pub struct SubmitReport {
    pub score: f64,
    pub max_score: f64,
    pub passed_tests: u32,
    pub total_tests: u32,
    pub tests: Vec<TestResult>,
}

#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Completed(SubmitReport),
    Rejected { message: String },
    TransportFailed { message: String },
}

#[derive(Debug, Clone)]
pub enum Event {
    /// The editing session moved to a different file. `content` is the
    /// file's stored content, or the language template when the stored
    /// content is empty.
    ActiveFileChanged {
        name: String,
        language: String,
        content: String,
    },
    FileDirtied {
        name: String,
    },
    FileSaved {
        name: String,
        modified: String,
    },
    SaveFailed {
        name: String,
        message: String,
    },
    FileCreated {
        name: String,
    },
    FileRenamed {
        old_name: String,
        new_name: String,
    },
    FileDeleted {
        name: String,
    },
    LanguageChanged {
        name: String,
        language: String,
    },
    ExecutionStarted(ExecutionKind),
    RunFinished(RunOutcome),
    SubmitFinished(SubmitOutcome),
    ScoresChanged(ScoreBoard),
    Notice(Notice),
}

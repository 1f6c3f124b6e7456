//! The student view model: a fold over the workspace event stream.
//!
//! The render loop never asks the workspace anything; it draws this
//! struct, and the bridge's event forwarder keeps it current.

use protocol::responses::TestResult;
use workspace::{
    Event, ExecutionKind, RunOutcome, RunReport, ScoreBoard, SubmitOutcome, WorkspaceSnapshot,
};

use crate::ui::status_bar::StatusState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FileTab {
    pub name: String,
    pub dirty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputTab {
    Console,
    TestResults,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineStyle {
    Normal,
    Error,
    Muted,
}

#[derive(Debug, Clone)]
pub(crate) struct ConsoleLine {
    pub text: String,
    pub style: LineStyle,
}

impl ConsoleLine {
    fn normal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: LineStyle::Normal,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: LineStyle::Error,
        }
    }

    fn muted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: LineStyle::Muted,
        }
    }
}

pub(crate) struct StudentViewModel {
    pub files: Vec<FileTab>,
    pub active: String,
    pub language: String,
    /// The editor buffer. Owned here; edits are reported to the
    /// workspace, which echoes dirty state back as events.
    pub editor: String,
    pub languages: Vec<protocol::types::LanguageConfig>,
    pub scores: ScoreBoard,
    pub executing: Option<ExecutionKind>,
    pub output_tab: OutputTab,
    pub console: Vec<ConsoleLine>,
    pub summary: Option<String>,
    pub tests: Vec<TestResult>,
    pub problem_statement: Option<String>,
}

impl StudentViewModel {
    pub fn from_snapshot(snapshot: &WorkspaceSnapshot) -> Self {
        Self {
            files: snapshot
                .student_files
                .iter()
                .map(|f| FileTab {
                    name: f.name.clone(),
                    dirty: false,
                })
                .collect(),
            active: snapshot.active_file.clone(),
            language: snapshot.current_language.clone(),
            editor: String::new(),
            languages: snapshot.supported_languages.clone(),
            scores: ScoreBoard {
                current: snapshot.current_score,
                best: snapshot.best_score,
                max: snapshot.max_score,
                submissions: snapshot.submission_count,
            },
            executing: None,
            output_tab: OutputTab::Console,
            console: Vec::new(),
            summary: None,
            tests: Vec::new(),
            problem_statement: snapshot.problem_statement.clone(),
        }
    }

    /// The file extension of the current language, for syntax detection.
    pub fn extension(&self) -> &str {
        self.languages
            .iter()
            .find(|l| l.key == self.language)
            .map(|l| l.extension.as_str())
            .unwrap_or("")
    }

    pub fn any_dirty(&self) -> bool {
        self.files.iter().any(|f| f.dirty)
    }

    #[tracing::instrument(skip(self, status), level = "trace")]
    pub fn apply_event(&mut self, event: Event, status: &mut StatusState) {
        match event {
            Event::ActiveFileChanged {
                name,
                language,
                content,
            } => {
                self.active = name;
                self.language = language;
                self.editor = content;
            }
            Event::FileDirtied { name } => self.set_dirty(&name, true),
            Event::FileSaved { name, .. } => self.set_dirty(&name, false),
            Event::SaveFailed { name, message } => {
                status.push_error(format!("Could not save {name}: {message}"));
            }
            Event::FileCreated { name } => {
                self.files.push(FileTab { name, dirty: false });
            }
            Event::FileRenamed { old_name, new_name } => {
                if let Some(tab) = self.files.iter_mut().find(|f| f.name == old_name) {
                    tab.name = new_name.clone();
                }
                if self.active == old_name {
                    self.active = new_name;
                }
            }
            Event::FileDeleted { name } => {
                self.files.retain(|f| f.name != name);
            }
            Event::LanguageChanged { name, language } => {
                if name == self.active {
                    self.language = language;
                }
            }
            Event::ExecutionStarted(kind) => {
                self.executing = Some(kind);
                match kind {
                    ExecutionKind::Run => {
                        self.output_tab = OutputTab::Console;
                        self.console = vec![ConsoleLine::muted("Running...")];
                    }
                    // Prior results stay visible until a graded report
                    // replaces them; a rejected submit must not wipe them.
                    ExecutionKind::Submit => self.output_tab = OutputTab::TestResults,
                }
            }
            Event::RunFinished(outcome) => {
                self.executing = None;
                self.console = match outcome {
                    RunOutcome::Completed(report) => render_run(&report),
                    RunOutcome::Rejected { message } => vec![ConsoleLine::error(message)],
                    RunOutcome::TransportFailed { message } => {
                        status.push_error(format!("Run failed: {message}"));
                        vec![ConsoleLine::error(message)]
                    }
                };
            }
            Event::SubmitFinished(outcome) => {
                self.executing = None;
                match outcome {
                    SubmitOutcome::Completed(report) => {
                        self.summary = Some(format!(
                            "{}/{} tests passed | Score: {}/{}",
                            report.passed_tests,
                            report.total_tests,
                            fmt_number(report.score),
                            fmt_number(report.max_score),
                        ));
                        self.tests = report.tests;
                    }
                    SubmitOutcome::Rejected { message } => {
                        status.push_error(format!("Submission rejected: {message}"));
                    }
                    SubmitOutcome::TransportFailed { message } => {
                        status.push_error(format!("Submission failed: {message}"));
                    }
                }
            }
            Event::ScoresChanged(scores) => self.scores = scores,
            Event::Notice(notice) => status.push_notice(notice),
        }
    }

    fn set_dirty(&mut self, name: &str, dirty: bool) {
        if let Some(tab) = self.files.iter_mut().find(|f| f.name == name) {
            tab.dirty = dirty;
        }
    }
}

fn render_run(report: &RunReport) -> Vec<ConsoleLine> {
    let mut lines = Vec::new();
    if let Some(compile_output) = &report.compile_output {
        lines.extend(compile_output.lines().map(ConsoleLine::error));
    }
    if let Some(stdout) = &report.stdout {
        lines.extend(stdout.lines().map(ConsoleLine::normal));
    }
    if let Some(stderr) = &report.stderr {
        lines.extend(stderr.lines().map(ConsoleLine::error));
    }
    if lines.is_empty() {
        lines.push(ConsoleLine::muted("(no output)"));
    }

    let mut footer = report.status.clone().unwrap_or_default();
    if let Some(time) = &report.time {
        footer.push_str(&format!(" | {time}s"));
    }
    if let Some(memory) = report.memory {
        footer.push_str(&format!(" | {memory} KB"));
    }
    if !footer.is_empty() {
        lines.push(ConsoleLine::muted(footer));
    }
    lines
}

/// Render a score without a trailing `.0` ("7.5", "10").
pub(crate) fn fmt_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use workspace::{Notice, NoticeLevel, SubmitReport};

    use super::*;

    fn model() -> StudentViewModel {
        let raw = r##"{
            "handler_base": "http://localhost:8000/handler",
            "student_files": [
                {"name": "main.py", "content": "print(1)", "language": "python"},
                {"name": "util.py", "content": "", "language": "python"}
            ],
            "supported_languages": [
                {"key": "python", "name": "Python 3", "id": 71,
                 "extension": "py", "template": "# start here"}
            ],
            "current_language": "python",
            "active_file": "main.py",
            "max_score": 10.0
        }"##;
        let snapshot: WorkspaceSnapshot = serde_json::from_str(raw).unwrap();
        StudentViewModel::from_snapshot(&snapshot)
    }

    #[test]
    fn graded_submission_renders_a_summary_line() {
        let mut model = model();
        let mut status = StatusState::default();

        model.apply_event(
            Event::ExecutionStarted(ExecutionKind::Submit),
            &mut status,
        );
        assert_eq!(model.executing, Some(ExecutionKind::Submit));
        assert_eq!(model.output_tab, OutputTab::TestResults);

        model.apply_event(
            Event::SubmitFinished(SubmitOutcome::Completed(SubmitReport {
                score: 7.5,
                max_score: 10.0,
                passed_tests: 3,
                total_tests: 4,
                tests: Vec::new(),
            })),
            &mut status,
        );
        assert_eq!(model.executing, None);
        assert_eq!(
            model.summary.as_deref(),
            Some("3/4 tests passed | Score: 7.5/10")
        );
    }

    #[test]
    fn failed_submit_keeps_the_previous_results() {
        let mut model = model();
        let mut status = StatusState::default();

        model.apply_event(
            Event::SubmitFinished(SubmitOutcome::Completed(SubmitReport {
                score: 10.0,
                max_score: 10.0,
                passed_tests: 4,
                total_tests: 4,
                tests: Vec::new(),
            })),
            &mut status,
        );
        assert!(model.summary.is_some());

        model.apply_event(
            Event::ExecutionStarted(ExecutionKind::Submit),
            &mut status,
        );
        model.apply_event(
            Event::SubmitFinished(SubmitOutcome::TransportFailed {
                message: "connection refused".to_owned(),
            }),
            &mut status,
        );
        assert_eq!(model.executing, None);
        assert_eq!(
            model.summary.as_deref(),
            Some("4/4 tests passed | Score: 10/10")
        );
    }

    #[test]
    fn rejected_run_shows_the_message_verbatim() {
        let mut model = model();
        let mut status = StatusState::default();

        model.apply_event(Event::ExecutionStarted(ExecutionKind::Run), &mut status);
        model.apply_event(
            Event::RunFinished(RunOutcome::Rejected {
                message: "Compilation error".to_owned(),
            }),
            &mut status,
        );
        assert_eq!(model.console.len(), 1);
        assert_eq!(model.console[0].text, "Compilation error");
        assert_eq!(model.console[0].style, LineStyle::Error);
    }

    #[test]
    fn dirty_markers_follow_save_events() {
        let mut model = model();
        let mut status = StatusState::default();

        model.apply_event(
            Event::FileDirtied {
                name: "main.py".to_owned(),
            },
            &mut status,
        );
        assert!(model.any_dirty());

        model.apply_event(
            Event::FileSaved {
                name: "main.py".to_owned(),
                modified: "2026-01-01T00:00:00Z".to_owned(),
            },
            &mut status,
        );
        assert!(!model.any_dirty());
    }

    #[test]
    fn rename_and_delete_update_the_tab_strip() {
        let mut model = model();
        let mut status = StatusState::default();

        model.apply_event(
            Event::FileRenamed {
                old_name: "main.py".to_owned(),
                new_name: "solution.py".to_owned(),
            },
            &mut status,
        );
        assert_eq!(model.active, "solution.py");
        assert_eq!(model.files[0].name, "solution.py");

        model.apply_event(
            Event::FileDeleted {
                name: "util.py".to_owned(),
            },
            &mut status,
        );
        assert_eq!(model.files.len(), 1);
    }

    #[test]
    fn run_report_lines_keep_their_stream_styles() {
        let report = RunReport {
            stdout: Some("8\n".to_owned()),
            stderr: Some("warning: deprecated\n".to_owned()),
            compile_output: None,
            status: Some("Accepted".to_owned()),
            time: Some("0.013".to_owned()),
            memory: Some(3200),
        };
        let lines = render_run(&report);
        assert_eq!(lines[0].text, "8");
        assert_eq!(lines[0].style, LineStyle::Normal);
        assert_eq!(lines[1].style, LineStyle::Error);
        assert_eq!(lines.last().unwrap().text, "Accepted | 0.013s | 3200 KB");
    }

    #[test]
    fn notices_land_in_the_status_bar() {
        let mut model = model();
        let mut status = StatusState::default();

        model.apply_event(
            Event::Notice(Notice {
                level: NoticeLevel::Error,
                message: "A file with this name already exists".to_owned(),
            }),
            &mut status,
        );
        assert_eq!(status.notifications.len(), 1);
        assert_eq!(
            status.notifications[0].message,
            "A file with this name already exists"
        );
    }

    #[test]
    fn numbers_drop_trailing_zero_fractions() {
        assert_eq!(fmt_number(10.0), "10");
        assert_eq!(fmt_number(7.5), "7.5");
        assert_eq!(fmt_number(0.0), "0");
    }
}

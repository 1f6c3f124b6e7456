use std::{io::IsTerminal, sync::Arc, time::Duration};

use protocol::{
    requests::SaveFile,
    responses::{MutationResponse, RunResponse, SaveFileResponse, SubmitResponse, TestResult},
    testing::{Call, MockClient},
};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use workspace::{
    AutosavePolicy, Event, FileSnapshot, NoticeLevel, RunOutcome, SubmitOutcome, Workspace,
    WorkspaceSnapshot,
};

// test suite "constructor"
#[ctor::ctor]
fn init() {
    if std::io::stderr().is_terminal() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .json()
            .try_init();
    }

    // error traces
    let _ = color_eyre::install();
}

/// Wraps a workspace and buffers non-matching events while waiting for a
/// specific one.
struct Harness {
    workspace: Workspace,
    events: mpsc::UnboundedReceiver<Event>,
}

impl Harness {
    fn new(snapshot: WorkspaceSnapshot, client: Arc<MockClient>, policy: AutosavePolicy) -> Self {
        let mut workspace =
            Workspace::new(snapshot, client, policy).expect("constructing workspace");
        let events = workspace.take_events().expect("taking event stream");
        Self { workspace, events }
    }

    async fn wait_for<F>(&mut self, message: &str, pred: F) -> Event
    where
        F: Fn(&Event) -> bool,
    {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let event = self
                    .events
                    .recv()
                    .await
                    .unwrap_or_else(|| panic!("event channel closed waiting for {message}"));
                if pred(&event) {
                    return event;
                }
                tracing::trace!(?event, "non-matching event, skipping");
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timeout waiting for {message}"))
    }

    /// Assert no further events arrive within a short grace period.
    async fn assert_quiet(&mut self) {
        let outcome = tokio::time::timeout(Duration::from_millis(50), self.events.recv()).await;
        if let Ok(Some(event)) = outcome {
            panic!("expected no events, got {event:?}");
        }
    }

    async fn drain_startup(&mut self) {
        self.wait_for("initial active file", |e| {
            matches!(e, Event::ActiveFileChanged { .. })
        })
        .await;
    }
}

fn file(name: &str, content: &str) -> FileSnapshot {
    FileSnapshot {
        name: name.to_owned(),
        content: content.to_owned(),
        language: "python".to_owned(),
        modified: None,
    }
}

fn snapshot(files: Vec<FileSnapshot>) -> WorkspaceSnapshot {
    let active = files[0].name.clone();
    WorkspaceSnapshot {
        handler_base: "http://localhost:8000/handler".to_owned(),
        student_files: files,
        supported_languages: protocol::types::LanguageConfig::default_set(),
        current_language: "python".to_owned(),
        active_file: active,
        max_score: 10.0,
        current_score: 0.0,
        best_score: 0.0,
        submission_count: 0,
        problem_statement: None,
    }
}

/// An autosave policy whose timers never fire within a test.
fn manual_saves() -> AutosavePolicy {
    AutosavePolicy {
        debounce: Duration::from_secs(600),
        interval: Duration::from_secs(600),
    }
}

#[tokio::test]
async fn switching_to_the_active_file_is_a_complete_noop() {
    let client = Arc::new(MockClient::new());
    let mut harness = Harness::new(
        snapshot(vec![file("main.py", "print(1)"), file("util.py", "x = 2")]),
        Arc::clone(&client),
        manual_saves(),
    );
    harness.drain_startup().await;

    harness.workspace.switch_to_file("main.py").await;

    harness.assert_quiet().await;
    assert_eq!(client.call_count().await, 0);
}

#[tokio::test]
async fn switching_saves_the_outgoing_file_and_loads_the_target() {
    let client = Arc::new(MockClient::new());
    let mut harness = Harness::new(
        snapshot(vec![file("main.py", "print(1)"), file("util.py", "x = 2")]),
        Arc::clone(&client),
        manual_saves(),
    );
    harness.drain_startup().await;

    harness.workspace.switch_to_file("util.py").await;

    let event = harness
        .wait_for("active file change", |e| {
            matches!(e, Event::ActiveFileChanged { .. })
        })
        .await;
    let Event::ActiveFileChanged { name, content, .. } = event else {
        unreachable!();
    };
    assert_eq!(name, "util.py");
    assert_eq!(content, "x = 2");
    assert_eq!(harness.workspace.active_file().await, "util.py");

    // the outgoing file was saved fire-and-forget
    harness
        .wait_for("outgoing save", |e| {
            matches!(e, Event::FileSaved { name, .. } if name == "main.py")
        })
        .await;
    let calls = client.calls().await;
    assert!(matches!(
        &calls[0],
        Call::SaveFile(SaveFile { filename, content, .. })
            if filename == "main.py" && content == "print(1)"
    ));
}

#[tokio::test]
async fn switching_to_an_empty_file_loads_the_language_template() {
    let client = Arc::new(MockClient::new());
    let mut harness = Harness::new(
        snapshot(vec![file("main.py", "print(1)"), file("blank.py", "")]),
        client,
        manual_saves(),
    );
    harness.drain_startup().await;

    harness.workspace.switch_to_file("blank.py").await;

    let event = harness
        .wait_for("active file change", |e| {
            matches!(e, Event::ActiveFileChanged { .. })
        })
        .await;
    let Event::ActiveFileChanged { content, .. } = event else {
        unreachable!();
    };
    assert!(content.contains("Hello, World!"));
}

#[tokio::test]
async fn creating_a_duplicate_never_issues_a_network_call() {
    let client = Arc::new(MockClient::new());
    let mut harness = Harness::new(
        snapshot(vec![file("main.py", "print(1)")]),
        Arc::clone(&client),
        manual_saves(),
    );
    harness.drain_startup().await;

    harness.workspace.create_file("main.py", "python").await;

    let event = harness
        .wait_for("rejection notice", |e| matches!(e, Event::Notice(_)))
        .await;
    let Event::Notice(notice) = event else {
        unreachable!();
    };
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.contains("already exists"));
    assert_eq!(client.call_count().await, 0);
    assert_eq!(harness.workspace.file_names().await, vec!["main.py"]);
}

#[tokio::test]
async fn creating_an_empty_name_is_rejected_locally() {
    let client = Arc::new(MockClient::new());
    let mut harness = Harness::new(
        snapshot(vec![file("main.py", "print(1)")]),
        Arc::clone(&client),
        manual_saves(),
    );
    harness.drain_startup().await;

    harness.workspace.create_file("   ", "python").await;

    harness
        .wait_for("rejection notice", |e| matches!(e, Event::Notice(_)))
        .await;
    assert_eq!(client.call_count().await, 0);
}

#[tokio::test]
async fn a_confirmed_create_registers_the_file_and_switches_to_it() {
    let client = Arc::new(MockClient::new());
    let mut harness = Harness::new(
        snapshot(vec![file("main.py", "print(1)")]),
        Arc::clone(&client),
        manual_saves(),
    );
    harness.drain_startup().await;

    harness.workspace.create_file("util.py", "python").await;

    harness
        .wait_for("file created", |e| {
            matches!(e, Event::FileCreated { name } if name == "util.py")
        })
        .await;
    harness
        .wait_for("switch to new file", |e| {
            matches!(e, Event::ActiveFileChanged { name, .. } if name == "util.py")
        })
        .await;
    assert_eq!(
        harness.workspace.file_names().await,
        vec!["main.py", "util.py"]
    );

    // the save carried the language template
    let calls = client.calls().await;
    assert!(matches!(
        &calls[0],
        Call::SaveFile(SaveFile { filename, content, .. })
            if filename == "util.py" && content.contains("Hello, World!")
    ));
}

#[tokio::test]
async fn a_failed_create_leaves_no_local_trace() {
    let client = Arc::new(MockClient::new());
    client
        .queue_save_file(Ok(SaveFileResponse::rejected("File limit reached")))
        .await;
    let mut harness = Harness::new(
        snapshot(vec![file("main.py", "print(1)")]),
        client,
        manual_saves(),
    );
    harness.drain_startup().await;

    harness.workspace.create_file("util.py", "python").await;

    let event = harness
        .wait_for("rejection notice", |e| matches!(e, Event::Notice(_)))
        .await;
    let Event::Notice(notice) = event else {
        unreachable!();
    };
    assert!(notice.message.contains("File limit reached"));
    assert_eq!(harness.workspace.file_names().await, vec!["main.py"]);
}

#[tokio::test]
async fn deleting_the_sole_file_is_rejected_before_any_call() {
    let client = Arc::new(MockClient::new());
    let mut harness = Harness::new(
        snapshot(vec![file("main.py", "print(1)")]),
        Arc::clone(&client),
        manual_saves(),
    );
    harness.drain_startup().await;

    harness.workspace.delete_file("main.py").await;

    let event = harness
        .wait_for("rejection notice", |e| matches!(e, Event::Notice(_)))
        .await;
    let Event::Notice(notice) = event else {
        unreachable!();
    };
    assert!(notice.message.contains("At least one file"));
    assert_eq!(client.call_count().await, 0);
    assert_eq!(harness.workspace.file_names().await, vec!["main.py"]);
}

#[tokio::test]
async fn deleting_the_active_file_activates_the_first_remaining_one() {
    let client = Arc::new(MockClient::new());
    let mut harness = Harness::new(
        snapshot(vec![
            file("main.py", "print(1)"),
            file("util.py", "x = 2"),
            file("extra.py", "y = 3"),
        ]),
        client,
        manual_saves(),
    );
    harness.drain_startup().await;

    harness.workspace.delete_file("main.py").await;

    harness
        .wait_for("file deleted", |e| {
            matches!(e, Event::FileDeleted { name } if name == "main.py")
        })
        .await;
    let event = harness
        .wait_for("next active file", |e| {
            matches!(e, Event::ActiveFileChanged { .. })
        })
        .await;
    let Event::ActiveFileChanged { name, .. } = event else {
        unreachable!();
    };
    assert_eq!(name, "util.py");
    assert_eq!(
        harness.workspace.file_names().await,
        vec!["util.py", "extra.py"]
    );
}

#[tokio::test]
async fn a_failed_delete_changes_nothing_locally() {
    let client = Arc::new(MockClient::new());
    client
        .queue_delete_file(Ok(MutationResponse::rejected("File is locked")))
        .await;
    let mut harness = Harness::new(
        snapshot(vec![file("main.py", "print(1)"), file("util.py", "x = 2")]),
        client,
        manual_saves(),
    );
    harness.drain_startup().await;

    harness.workspace.delete_file("util.py").await;

    harness
        .wait_for("rejection notice", |e| matches!(e, Event::Notice(_)))
        .await;
    assert_eq!(
        harness.workspace.file_names().await,
        vec!["main.py", "util.py"]
    );
}

#[tokio::test]
async fn renaming_to_the_same_name_closes_silently() {
    let client = Arc::new(MockClient::new());
    let mut harness = Harness::new(
        snapshot(vec![file("main.py", "print(1)")]),
        Arc::clone(&client),
        manual_saves(),
    );
    harness.drain_startup().await;

    harness.workspace.rename_active_file("main.py").await;

    harness.assert_quiet().await;
    assert_eq!(client.call_count().await, 0);
}

#[tokio::test]
async fn a_confirmed_rename_keeps_the_file_position() {
    let client = Arc::new(MockClient::new());
    let mut harness = Harness::new(
        snapshot(vec![file("main.py", "print(1)"), file("util.py", "x = 2")]),
        client,
        manual_saves(),
    );
    harness.drain_startup().await;

    harness.workspace.rename_active_file("solution.py").await;

    harness
        .wait_for("rename event", |e| {
            matches!(
                e,
                Event::FileRenamed { old_name, new_name }
                    if old_name == "main.py" && new_name == "solution.py"
            )
        })
        .await;
    assert_eq!(
        harness.workspace.file_names().await,
        vec!["solution.py", "util.py"]
    );
    assert_eq!(harness.workspace.active_file().await, "solution.py");
}

#[tokio::test]
async fn a_failed_run_clears_the_execution_guard() {
    let client = Arc::new(MockClient::new());
    client
        .queue_run_code(Err(MockClient::transport_failure("run_code")))
        .await;
    let mut harness = Harness::new(
        snapshot(vec![file("main.py", "print(1)")]),
        client,
        manual_saves(),
    );
    harness.drain_startup().await;

    harness.workspace.run("").await;

    harness
        .wait_for("execution start", |e| {
            matches!(e, Event::ExecutionStarted(_))
        })
        .await;
    let event = harness
        .wait_for("run finished", |e| matches!(e, Event::RunFinished(_)))
        .await;
    assert!(matches!(
        event,
        Event::RunFinished(RunOutcome::TransportFailed { .. })
    ));
    assert!(!harness.workspace.is_executing().await);
}

#[tokio::test]
async fn a_second_run_while_one_is_in_flight_is_ignored() {
    let client = Arc::new(MockClient::with_delay(Duration::from_millis(100)));
    let mut harness = Harness::new(
        snapshot(vec![file("main.py", "print(1)")]),
        Arc::clone(&client),
        manual_saves(),
    );
    harness.drain_startup().await;

    harness.workspace.run("").await;
    harness.workspace.run("").await;

    harness
        .wait_for("run finished", |e| matches!(e, Event::RunFinished(_)))
        .await;
    assert_eq!(client.call_count().await, 1);
}

#[tokio::test]
async fn a_rejected_run_carries_the_server_message() {
    let client = Arc::new(MockClient::new());
    client
        .queue_run_code(Ok(RunResponse::rejected("Compilation error")))
        .await;
    let mut harness = Harness::new(
        snapshot(vec![file("main.py", "print(1)")]),
        client,
        manual_saves(),
    );
    harness.drain_startup().await;

    harness.workspace.run("").await;

    let event = harness
        .wait_for("run finished", |e| matches!(e, Event::RunFinished(_)))
        .await;
    let Event::RunFinished(RunOutcome::Rejected { message }) = event else {
        panic!("expected a rejected run, got {event:?}");
    };
    assert_eq!(message, "Compilation error");
}

#[tokio::test]
async fn a_graded_submission_updates_the_score_board() {
    let client = Arc::new(MockClient::new());
    client
        .queue_submit_solution(Ok(SubmitResponse {
            success: true,
            message: None,
            error: None,
            score: 7.5,
            max_score: 10.0,
            passed_tests: 3,
            total_tests: 4,
            test_results: vec![TestResult {
                name: "basic".to_owned(),
                passed: true,
                points: 2.5,
                earned_points: 2.5,
                is_public: true,
                expected_output: Some("4".to_owned()),
                actual_output: Some("4".to_owned()),
            }],
        }))
        .await;
    let mut harness = Harness::new(
        snapshot(vec![file("main.py", "print(1)")]),
        client,
        manual_saves(),
    );
    harness.drain_startup().await;

    harness.workspace.submit().await;

    let event = harness
        .wait_for("scores changed", |e| matches!(e, Event::ScoresChanged(_)))
        .await;
    let Event::ScoresChanged(board) = event else {
        unreachable!();
    };
    assert_eq!(board.current, 7.5);
    assert_eq!(board.best, 7.5);
    assert_eq!(board.submissions, 1);

    let event = harness
        .wait_for("submit finished", |e| matches!(e, Event::SubmitFinished(_)))
        .await;
    let Event::SubmitFinished(SubmitOutcome::Completed(report)) = event else {
        panic!("expected a completed submission, got {event:?}");
    };
    assert_eq!(report.passed_tests, 3);
    assert_eq!(report.total_tests, 4);
    assert_eq!(report.tests.len(), 1);
}

#[tokio::test]
async fn a_rejected_submission_leaves_the_score_board_alone() {
    let client = Arc::new(MockClient::new());
    client
        .queue_submit_solution(Ok(SubmitResponse::rejected("No test cases configured")))
        .await;
    let mut harness = Harness::new(
        snapshot(vec![file("main.py", "print(1)")]),
        client,
        manual_saves(),
    );
    harness.drain_startup().await;

    harness.workspace.submit().await;

    let event = harness
        .wait_for("submit finished", |e| matches!(e, Event::SubmitFinished(_)))
        .await;
    assert!(matches!(
        event,
        Event::SubmitFinished(SubmitOutcome::Rejected { .. })
    ));
    let board = harness.workspace.scores().await;
    assert_eq!(board.submissions, 0);
    assert_eq!(board.current, 0.0);
}

#[tokio::test]
async fn an_edit_burst_produces_exactly_one_debounced_save() {
    let client = Arc::new(MockClient::new());
    let policy = AutosavePolicy {
        debounce: Duration::from_millis(50),
        interval: Duration::from_secs(600),
    };
    let mut harness = Harness::new(
        snapshot(vec![file("main.py", "print(1)")]),
        Arc::clone(&client),
        policy,
    );
    harness.drain_startup().await;

    for content in ["a", "ab", "abc"] {
        harness.workspace.record_edit(content.to_owned()).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    harness
        .wait_for("debounced save", |e| matches!(e, Event::FileSaved { .. }))
        .await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let calls = client.calls().await;
    assert_eq!(calls.len(), 1);
    assert!(matches!(
        &calls[0],
        Call::SaveFile(SaveFile { content, .. }) if content == "abc"
    ));
}

#[tokio::test]
async fn the_interval_save_fires_without_edits() {
    let client = Arc::new(MockClient::new());
    let policy = AutosavePolicy {
        debounce: Duration::from_secs(600),
        interval: Duration::from_millis(50),
    };
    let mut harness = Harness::new(
        snapshot(vec![file("main.py", "print(1)")]),
        Arc::clone(&client),
        policy,
    );
    harness.drain_startup().await;

    harness
        .wait_for("interval save", |e| matches!(e, Event::FileSaved { .. }))
        .await;
    assert!(client.call_count().await >= 1);
}

#[tokio::test]
async fn a_failed_save_keeps_the_dirty_flag() {
    let client = Arc::new(MockClient::new());
    client
        .queue_save_file(Ok(SaveFileResponse::rejected("Storage unavailable")))
        .await;
    let mut harness = Harness::new(
        snapshot(vec![file("main.py", "print(1)")]),
        client,
        manual_saves(),
    );
    harness.drain_startup().await;

    harness.workspace.record_edit("print(2)".to_owned()).await;
    harness
        .wait_for("dirty marker", |e| matches!(e, Event::FileDirtied { .. }))
        .await;

    harness.workspace.save_active().await;

    let event = harness
        .wait_for("save failure", |e| matches!(e, Event::SaveFailed { .. }))
        .await;
    let Event::SaveFailed { message, .. } = event else {
        unreachable!();
    };
    assert!(message.contains("Storage unavailable"));
    assert_eq!(harness.workspace.is_dirty("main.py").await, Some(true));
}

#[tokio::test]
async fn a_confirmed_save_clears_the_dirty_flag() {
    let client = Arc::new(MockClient::new());
    let mut harness = Harness::new(
        snapshot(vec![file("main.py", "print(1)")]),
        client,
        manual_saves(),
    );
    harness.drain_startup().await;

    harness.workspace.record_edit("print(2)".to_owned()).await;
    harness
        .wait_for("dirty marker", |e| matches!(e, Event::FileDirtied { .. }))
        .await;
    harness.workspace.save_active().await;

    harness
        .wait_for("save confirmation", |e| {
            matches!(e, Event::FileSaved { name, .. } if name == "main.py")
        })
        .await;
    assert_eq!(harness.workspace.is_dirty("main.py").await, Some(false));
}

#[tokio::test]
async fn changing_language_updates_the_file_and_saves_it() {
    let client = Arc::new(MockClient::new());
    let mut harness = Harness::new(
        snapshot(vec![file("main.py", "print(1)")]),
        Arc::clone(&client),
        manual_saves(),
    );
    harness.drain_startup().await;

    harness.workspace.change_language("javascript").await;

    harness
        .wait_for("language change", |e| {
            matches!(
                e,
                Event::LanguageChanged { name, language }
                    if name == "main.py" && language == "javascript"
            )
        })
        .await;
    harness
        .wait_for("follow-up save", |e| matches!(e, Event::FileSaved { .. }))
        .await;
    let calls = client.calls().await;
    assert!(matches!(
        &calls[0],
        Call::SaveFile(SaveFile { language, .. }) if language == "javascript"
    ));
}

#[test]
fn construction_refuses_a_fileless_snapshot() {
    let mut snapshot = snapshot(vec![file("main.py", "")]);
    snapshot.student_files.clear();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let _guard = runtime.enter();
    let result = Workspace::new(snapshot, Arc::new(MockClient::new()), manual_saves());
    assert!(result.is_err());
}

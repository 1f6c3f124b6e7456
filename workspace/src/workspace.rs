//! The public workspace handle.

use std::sync::{Arc, Mutex as StdMutex};

use eyre::ensure;
use protocol::{
    HandlerClient,
    requests::{DeleteFile, RenameFile, RunCode, SaveFile, SubmitSolution},
};
use tokio::{
    sync::{Mutex, Notify, mpsc},
    time::Instant,
};
use tokio_util::sync::CancellationToken;

use crate::{
    autosave::{AutosavePolicy, AutosaveSchedule},
    event::{
        Event, ExecutionKind, RunOutcome, RunReport, ScoreBoard, SubmitOutcome, SubmitReport,
    },
    internals::{FileEntry, WorkspaceInternals},
    snapshot::WorkspaceSnapshot,
};

/// A student's editing session: file set, active file, score board and
/// the run/submit lifecycle.
///
/// All methods lock, mutate and publish; handler calls never hold the
/// lock. Construction spawns the auto-save task, so a tokio runtime must
/// be current.
pub struct Workspace {
    internals: Arc<Mutex<WorkspaceInternals>>,
    client: Arc<dyn HandlerClient>,
    schedule: Arc<StdMutex<AutosaveSchedule>>,
    edited: Arc<Notify>,
    cancel: CancellationToken,
    events: Option<mpsc::UnboundedReceiver<Event>>,
}

impl Workspace {
    pub fn new(
        snapshot: WorkspaceSnapshot,
        client: Arc<dyn HandlerClient>,
        policy: AutosavePolicy,
    ) -> eyre::Result<Self> {
        ensure!(
            !snapshot.student_files.is_empty(),
            "a workspace must contain at least one file"
        );
        ensure!(
            snapshot
                .student_files
                .iter()
                .any(|f| f.name == snapshot.active_file),
            "active file {} is not in the snapshot",
            snapshot.active_file
        );
        ensure!(
            snapshot
                .supported_languages
                .iter()
                .any(|l| l.key == snapshot.current_language),
            "current language {} is not in the language table",
            snapshot.current_language
        );
        for (i, file) in snapshot.student_files.iter().enumerate() {
            ensure!(
                !snapshot.student_files[..i].iter().any(|f| f.name == file.name),
                "duplicate file name {} in snapshot",
                file.name
            );
        }

        let files = snapshot
            .student_files
            .into_iter()
            .map(|f| FileEntry {
                name: f.name,
                content: f.content,
                language: f.language,
                modified: f.modified.unwrap_or_default(),
                dirty: false,
            })
            .collect();

        let (tx, rx) = mpsc::unbounded_channel();
        let active_file = snapshot.active_file;
        let mut internals = WorkspaceInternals::new(
            files,
            active_file.clone(),
            snapshot.current_language,
            snapshot.supported_languages,
            ScoreBoard {
                current: snapshot.current_score,
                best: snapshot.best_score,
                max: snapshot.max_score,
                submissions: snapshot.submission_count,
            },
            tx,
        );
        internals.publish(Event::ScoresChanged(internals.scores));
        internals.activate(&active_file);

        let internals = Arc::new(Mutex::new(internals));
        let schedule = Arc::new(StdMutex::new(AutosaveSchedule::new(policy, Instant::now())));
        let edited = Arc::new(Notify::new());
        let cancel = CancellationToken::new();

        spawn_autosave_task(
            Arc::clone(&internals),
            Arc::clone(&client),
            Arc::clone(&schedule),
            Arc::clone(&edited),
            cancel.clone(),
        );

        Ok(Self {
            internals,
            client,
            schedule,
            edited,
            cancel,
            events: Some(rx),
        })
    }

    /// The event stream. Can only be taken once.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<Event>> {
        self.events.take()
    }

    /// The editor content changed. Marks the active file dirty and resets
    /// the debounce clock.
    pub async fn record_edit(&self, content: String) {
        {
            let mut internals = self.internals.lock().await;
            internals.record_edit(content);
        }
        self.schedule.lock().unwrap().record_edit(Instant::now());
        self.edited.notify_one();
    }

    /// Save the active file and wait for the outcome to be applied.
    pub async fn save_active(&self) {
        let name = self.internals.lock().await.active.clone();
        save_file_by_name(&self.internals, &self.client, name).await;
    }

    /// Switch the editing session to `name`. A no-op when `name` is
    /// already active; the outgoing file is saved fire-and-forget.
    pub async fn switch_to_file(&self, name: &str) {
        let outgoing = {
            let mut internals = self.internals.lock().await;
            if internals.active == name {
                return;
            }
            if !internals.has_file(name) {
                internals.notice_error(format!("No such file: {name}"));
                return;
            }
            let outgoing = internals.active.clone();
            internals.activate(name);
            outgoing
        };
        self.spawn_save(outgoing);
    }

    /// Create `name` with the language's starter template. The file is
    /// only registered locally once the service confirms the save.
    pub async fn create_file(&self, name: &str, language: &str) {
        let name = name.trim().to_owned();
        let template = {
            let internals = self.internals.lock().await;
            if name.is_empty() {
                internals.notice_error("File name cannot be empty");
                return;
            }
            if internals.has_file(&name) {
                internals.notice_error(format!("A file named {name} already exists"));
                return;
            }
            let Some(config) = internals.language(language) else {
                internals.notice_error(format!("Unknown language: {language}"));
                return;
            };
            config.template.clone()
        };

        tracing::debug!(file = %name, %language, "creating file");
        let result = self
            .client
            .save_file(SaveFile {
                filename: name.clone(),
                content: template.clone(),
                language: language.to_owned(),
            })
            .await;

        let mut internals = self.internals.lock().await;
        match result {
            Ok(response) if response.success => {
                if internals.has_file(&name) {
                    tracing::trace!(file = %name, "file appeared while create was in flight");
                    return;
                }
                internals.files.push(FileEntry {
                    name: name.clone(),
                    content: template,
                    language: language.to_owned(),
                    modified: chrono::Utc::now().to_rfc3339(),
                    dirty: false,
                });
                internals.publish(Event::FileCreated { name: name.clone() });
                internals.activate(&name);
            }
            Ok(response) => {
                internals.notice_error(
                    response
                        .error
                        .unwrap_or_else(|| format!("The server refused to create {name}")),
                );
            }
            Err(error) => {
                tracing::warn!(%error, file = %name, "create failed");
                internals.notice_error("Could not reach the server to create the file");
            }
        }
    }

    /// Rename the active file. Same-name renames close silently; the
    /// local entry only changes once the service confirms.
    pub async fn rename_active_file(&self, new_name: &str) {
        let new_name = new_name.trim().to_owned();
        let old_name = {
            let internals = self.internals.lock().await;
            if new_name.is_empty() {
                internals.notice_error("File name cannot be empty");
                return;
            }
            if internals.active == new_name {
                return;
            }
            if internals.has_file(&new_name) {
                internals.notice_error(format!("A file named {new_name} already exists"));
                return;
            }
            internals.active.clone()
        };

        tracing::debug!(from = %old_name, to = %new_name, "renaming file");
        let result = self
            .client
            .rename_file(RenameFile {
                old_filename: old_name.clone(),
                new_filename: new_name.clone(),
            })
            .await;

        let mut internals = self.internals.lock().await;
        match result {
            Ok(response) if response.success => {
                let Some(entry) = internals.file_mut(&old_name) else {
                    tracing::trace!(file = %old_name, "file vanished while rename was in flight");
                    return;
                };
                // rename in place, keeping the file's position
                entry.name = new_name.clone();
                if internals.active == old_name {
                    internals.active = new_name.clone();
                }
                internals.publish(Event::FileRenamed { old_name, new_name });
            }
            Ok(response) => {
                internals.notice_error(
                    response
                        .error
                        .unwrap_or_else(|| format!("The server refused to rename {old_name}")),
                );
            }
            Err(error) => {
                tracing::warn!(%error, file = %old_name, "rename failed");
                internals.notice_error("Could not reach the server to rename the file");
            }
        }
    }

    /// Delete `name`. Rejected locally when it is the only file; on a
    /// confirmed delete of the active file, the first remaining file in
    /// insertion order becomes active.
    pub async fn delete_file(&self, name: &str) {
        {
            let internals = self.internals.lock().await;
            if internals.files.len() == 1 {
                internals.notice_error("At least one file must exist");
                return;
            }
            if !internals.has_file(name) {
                internals.notice_error(format!("No such file: {name}"));
                return;
            }
        }

        tracing::debug!(file = %name, "deleting file");
        let result = self
            .client
            .delete_file(DeleteFile {
                filename: name.to_owned(),
            })
            .await;

        let mut internals = self.internals.lock().await;
        match result {
            Ok(response) if response.success => {
                let Some(position) = internals.files.iter().position(|f| f.name == name) else {
                    tracing::trace!(file = %name, "file vanished while delete was in flight");
                    return;
                };
                internals.files.remove(position);
                internals.publish(Event::FileDeleted {
                    name: name.to_owned(),
                });
                if internals.active == name
                    && let Some(first) = internals.files.first()
                {
                    let next = first.name.clone();
                    internals.activate(&next);
                }
            }
            Ok(response) => {
                internals.notice_error(
                    response
                        .error
                        .unwrap_or_else(|| format!("The server refused to delete {name}")),
                );
            }
            Err(error) => {
                tracing::warn!(%error, file = %name, "delete failed");
                internals.notice_error("Could not reach the server to delete the file");
            }
        }
    }

    /// Change the active file's language, then save it.
    pub async fn change_language(&self, key: &str) {
        let save = {
            let mut internals = self.internals.lock().await;
            let active = internals.active.clone();
            let Some(entry) = internals.file(&active) else {
                return;
            };
            if entry.language == key {
                return;
            }
            if internals.language(key).is_none() {
                internals.notice_error(format!("Unknown language: {key}"));
                return;
            }
            if let Some(entry) = internals.file_mut(&active) {
                entry.language = key.to_owned();
            }
            internals.current_language = key.to_owned();
            internals.publish(Event::LanguageChanged {
                name: active.clone(),
                language: key.to_owned(),
            });
            active
        };
        self.spawn_save(save);
    }

    /// Execute the active file. Silently ignored while a run or submit is
    /// already in flight.
    pub async fn run(&self, stdin: &str) {
        let Some(filename) = self.enter_execution(ExecutionKind::Run).await else {
            return;
        };
        let request = RunCode {
            filename,
            input: stdin.to_owned(),
        };
        let internals = Arc::clone(&self.internals);
        let client = Arc::clone(&self.client);
        tokio::spawn(async move {
            let result = client.run_code(request).await;
            let mut internals = internals.lock().await;
            // the guard is cleared before anything is published, on
            // every branch
            internals.executing = None;
            let outcome = match result {
                Ok(response) if response.success => RunOutcome::Completed(RunReport {
                    stdout: response.output,
                    stderr: response.error,
                    compile_output: response.compile_output,
                    status: response.status.map(|s| s.description),
                    time: response.time,
                    memory: response.memory,
                }),
                Ok(response) => RunOutcome::Rejected {
                    message: response
                        .error
                        .unwrap_or_else(|| "Execution failed".to_owned()),
                },
                Err(error) => {
                    tracing::warn!(%error, "run failed");
                    RunOutcome::TransportFailed {
                        message: "Could not reach the execution service".to_owned(),
                    }
                }
            };
            internals.publish(Event::RunFinished(outcome));
        });
    }

    /// Grade the active file. Same re-entrancy guard as [`Workspace::run`].
    pub async fn submit(&self) {
        let Some(main_file) = self.enter_execution(ExecutionKind::Submit).await else {
            return;
        };
        let request = SubmitSolution { main_file };
        let internals = Arc::clone(&self.internals);
        let client = Arc::clone(&self.client);
        tokio::spawn(async move {
            let result = client.submit_solution(request).await;
            let mut internals = internals.lock().await;
            internals.executing = None;
            let outcome = match result {
                Ok(response) if response.success => {
                    internals.scores.current = response.score;
                    internals.scores.best = internals.scores.best.max(response.score);
                    if response.max_score > 0.0 {
                        internals.scores.max = response.max_score;
                    }
                    internals.scores.submissions += 1;
                    internals.publish(Event::ScoresChanged(internals.scores));
                    SubmitOutcome::Completed(SubmitReport {
                        score: response.score,
                        max_score: response.max_score,
                        passed_tests: response.passed_tests,
                        total_tests: response.total_tests,
                        tests: response.test_results,
                    })
                }
                Ok(response) => SubmitOutcome::Rejected {
                    message: response
                        .error
                        .or(response.message)
                        .unwrap_or_else(|| "Submission failed".to_owned()),
                },
                Err(error) => {
                    tracing::warn!(%error, "submit failed");
                    SubmitOutcome::TransportFailed {
                        message: "Could not reach the grading service".to_owned(),
                    }
                }
            };
            internals.publish(Event::SubmitFinished(outcome));
        });
    }

    /// Stop the auto-save task.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub async fn active_file(&self) -> String {
        self.internals.lock().await.active.clone()
    }

    pub async fn file_names(&self) -> Vec<String> {
        self.internals
            .lock()
            .await
            .files
            .iter()
            .map(|f| f.name.clone())
            .collect()
    }

    pub async fn is_dirty(&self, name: &str) -> Option<bool> {
        self.internals.lock().await.file(name).map(|f| f.dirty)
    }

    pub async fn is_executing(&self) -> bool {
        self.internals.lock().await.executing.is_some()
    }

    pub async fn scores(&self) -> ScoreBoard {
        self.internals.lock().await.scores
    }

    /// Claim the execution slot and return the active file name, or
    /// `None` when an execution is already in flight.
    async fn enter_execution(&self, kind: ExecutionKind) -> Option<String> {
        let mut internals = self.internals.lock().await;
        if internals.executing.is_some() {
            tracing::debug!(?kind, "execution already in flight, ignoring");
            return None;
        }
        internals.executing = Some(kind);
        internals.publish(Event::ExecutionStarted(kind));
        Some(internals.active.clone())
    }

    fn spawn_save(&self, name: String) {
        let internals = Arc::clone(&self.internals);
        let client = Arc::clone(&self.client);
        tokio::spawn(async move {
            save_file_by_name(&internals, &client, name).await;
        });
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// The single save path: snapshot the file under the lock, call the
/// handler without it, re-lock and apply the outcome. Results for files
/// that were renamed or deleted in flight are dropped.
async fn save_file_by_name(
    internals: &Arc<Mutex<WorkspaceInternals>>,
    client: &Arc<dyn HandlerClient>,
    name: String,
) {
    let request = {
        let internals = internals.lock().await;
        let Some(entry) = internals.file(&name) else {
            tracing::trace!(file = %name, "skipping save of unknown file");
            return;
        };
        SaveFile {
            filename: name.clone(),
            content: entry.content.clone(),
            language: entry.language.clone(),
        }
    };

    tracing::debug!(file = %name, "saving file");
    let result = client.save_file(request).await;

    let mut internals = internals.lock().await;
    match result {
        Ok(response) if response.success => internals.apply_save_success(&name),
        Ok(response) => internals.apply_save_failure(
            &name,
            response
                .error
                .unwrap_or_else(|| "The server refused the save".to_owned()),
        ),
        Err(error) => {
            tracing::warn!(%error, file = %name, "save failed");
            internals
                .apply_save_failure(&name, "Could not reach the server to save".to_owned());
        }
    }
}

fn spawn_autosave_task(
    internals: Arc<Mutex<WorkspaceInternals>>,
    client: Arc<dyn HandlerClient>,
    schedule: Arc<StdMutex<AutosaveSchedule>>,
    edited: Arc<Notify>,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        loop {
            let deadline = schedule.lock().unwrap().next_deadline();
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("autosave task cancelled");
                    break;
                }
                // an edit moved the deadline; recompute
                _ = edited.notified() => continue,
                _ = tokio::time::sleep_until(deadline) => {
                    let due = schedule.lock().unwrap().fire(Instant::now());
                    if due {
                        let name = internals.lock().await.active.clone();
                        save_file_by_name(&internals, &client, name).await;
                    }
                }
            }
        }
    });
}

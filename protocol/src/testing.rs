//! Scripted in-memory handler double.
//!
//! Tests queue per-handler results and assert on the recorded call log;
//! when a queue is empty the handler answers a generic success so tests
//! only script the interactions they care about.
use std::{collections::VecDeque, time::Duration};

use tokio::sync::Mutex;

use crate::{
    client::HandlerClient,
    error::CallError,
    requests::{DeleteFile, RenameFile, RunCode, SaveFile, SubmitSolution},
    responses::{MutationResponse, RunResponse, SaveFileResponse, SubmitResponse},
};

/// A recorded handler invocation, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SaveFile(SaveFile),
    DeleteFile(DeleteFile),
    RenameFile(RenameFile),
    RunCode(RunCode),
    SubmitSolution(SubmitSolution),
}

#[derive(Default)]
struct Script {
    save_file: VecDeque<Result<SaveFileResponse, CallError>>,
    delete_file: VecDeque<Result<MutationResponse, CallError>>,
    rename_file: VecDeque<Result<MutationResponse, CallError>>,
    run_code: VecDeque<Result<RunResponse, CallError>>,
    submit_solution: VecDeque<Result<SubmitResponse, CallError>>,
    calls: Vec<Call>,
}

/// Scripted [`HandlerClient`] with a call log and an optional artificial
/// response delay (for exercising in-flight behaviour).
#[derive(Default)]
pub struct MockClient {
    script: Mutex<Script>,
    delay: Option<Duration>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Like [`MockClient::new`] but every handler sleeps before answering.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            script: Mutex::new(Script::default()),
            delay: Some(delay),
        }
    }

    pub async fn queue_save_file(&self, result: Result<SaveFileResponse, CallError>) {
        self.script.lock().await.save_file.push_back(result);
    }

    pub async fn queue_delete_file(&self, result: Result<MutationResponse, CallError>) {
        self.script.lock().await.delete_file.push_back(result);
    }

    pub async fn queue_rename_file(&self, result: Result<MutationResponse, CallError>) {
        self.script.lock().await.rename_file.push_back(result);
    }

    pub async fn queue_run_code(&self, result: Result<RunResponse, CallError>) {
        self.script.lock().await.run_code.push_back(result);
    }

    pub async fn queue_submit_solution(&self, result: Result<SubmitResponse, CallError>) {
        self.script.lock().await.submit_solution.push_back(result);
    }

    /// Every invocation so far, in arrival order.
    pub async fn calls(&self) -> Vec<Call> {
        self.script.lock().await.calls.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.script.lock().await.calls.len()
    }

    /// A transport-level failure for scripting error paths without a socket.
    pub fn transport_failure(handler: &'static str) -> CallError {
        CallError::Status {
            handler,
            status: reqwest::StatusCode::BAD_GATEWAY,
        }
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait::async_trait]
impl HandlerClient for MockClient {
    async fn save_file(&self, request: SaveFile) -> Result<SaveFileResponse, CallError> {
        let scripted = {
            let mut script = self.script.lock().await;
            script.calls.push(Call::SaveFile(request.clone()));
            script.save_file.pop_front()
        };
        self.pause().await;
        scripted.unwrap_or_else(|| Ok(SaveFileResponse::saved(request.filename)))
    }

    async fn delete_file(&self, request: DeleteFile) -> Result<MutationResponse, CallError> {
        let scripted = {
            let mut script = self.script.lock().await;
            script.calls.push(Call::DeleteFile(request));
            script.delete_file.pop_front()
        };
        self.pause().await;
        scripted.unwrap_or_else(|| Ok(MutationResponse::applied()))
    }

    async fn rename_file(&self, request: RenameFile) -> Result<MutationResponse, CallError> {
        let scripted = {
            let mut script = self.script.lock().await;
            script.calls.push(Call::RenameFile(request));
            script.rename_file.pop_front()
        };
        self.pause().await;
        scripted.unwrap_or_else(|| Ok(MutationResponse::applied()))
    }

    async fn run_code(&self, request: RunCode) -> Result<RunResponse, CallError> {
        let scripted = {
            let mut script = self.script.lock().await;
            script.calls.push(Call::RunCode(request));
            script.run_code.pop_front()
        };
        self.pause().await;
        scripted.unwrap_or_else(|| Ok(RunResponse::completed("")))
    }

    async fn submit_solution(&self, request: SubmitSolution) -> Result<SubmitResponse, CallError> {
        let scripted = {
            let mut script = self.script.lock().await;
            script.calls.push(Call::SubmitSolution(request));
            script.submit_solution.pop_front()
        };
        self.pause().await;
        scripted.unwrap_or_else(|| {
            Ok(SubmitResponse {
                success: true,
                message: None,
                error: None,
                score: 0.0,
                max_score: 0.0,
                passed_tests: 0,
                total_tests: 0,
                test_results: Vec::new(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_queued_results_then_defaults() {
        let mock = MockClient::new();
        mock.queue_run_code(Ok(RunResponse::rejected("Compilation error")))
            .await;

        let first = mock
            .run_code(RunCode {
                filename: "main.py".to_owned(),
                input: String::new(),
            })
            .await
            .unwrap();
        assert!(!first.success);

        let second = mock
            .run_code(RunCode {
                filename: "main.py".to_owned(),
                input: String::new(),
            })
            .await
            .unwrap();
        assert!(second.success);

        assert_eq!(mock.call_count().await, 2);
    }

    #[tokio::test]
    async fn records_calls_in_order() {
        let mock = MockClient::new();
        mock.save_file(SaveFile {
            filename: "a.py".to_owned(),
            content: String::new(),
            language: "python".to_owned(),
        })
        .await
        .unwrap();
        mock.delete_file(DeleteFile {
            filename: "a.py".to_owned(),
        })
        .await
        .unwrap();

        let calls = mock.calls().await;
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[0], Call::SaveFile(_)));
        assert!(matches!(calls[1], Call::DeleteFile(_)));
    }
}

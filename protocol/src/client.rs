//! Handler invocation: the [`HandlerClient`] seam and its HTTP implementation.
use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    error::CallError,
    requests::{DeleteFile, RenameFile, RunCode, SaveFile, SubmitSolution},
    responses::{MutationResponse, RunResponse, SaveFileResponse, SubmitResponse},
};

/// One method per service handler. The workspace talks to this trait so
/// tests can substitute [`crate::testing::MockClient`].
#[async_trait::async_trait]
pub trait HandlerClient: Send + Sync {
    async fn save_file(&self, request: SaveFile) -> Result<SaveFileResponse, CallError>;
    async fn delete_file(&self, request: DeleteFile) -> Result<MutationResponse, CallError>;
    async fn rename_file(&self, request: RenameFile) -> Result<MutationResponse, CallError>;
    async fn run_code(&self, request: RunCode) -> Result<RunResponse, CallError>;
    async fn submit_solution(&self, request: SubmitSolution) -> Result<SubmitResponse, CallError>;
}

/// reqwest-backed client that POSTs JSON to `{handler_base}/{handler}`.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base: String,
}

impl HttpClient {
    pub fn new(handler_base: impl Into<String>) -> Self {
        Self::with_timeout(handler_base, Duration::from_secs(30))
    }

    pub fn with_timeout(handler_base: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            base: handler_base.into(),
        }
    }

    fn url_for(&self, handler: &'static str) -> String {
        format!("{}/{}", self.base.trim_end_matches('/'), handler)
    }

    async fn post<Req, Resp>(&self, handler: &'static str, request: &Req) -> Result<Resp, CallError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = self.url_for(handler);
        tracing::debug!(%url, "calling handler");
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|source| CallError::Transport { handler, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CallError::Status { handler, status });
        }

        response
            .json()
            .await
            .map_err(|source| CallError::Decode { handler, source })
    }
}

#[async_trait::async_trait]
impl HandlerClient for HttpClient {
    async fn save_file(&self, request: SaveFile) -> Result<SaveFileResponse, CallError> {
        self.post(SaveFile::HANDLER, &request).await
    }

    async fn delete_file(&self, request: DeleteFile) -> Result<MutationResponse, CallError> {
        self.post(DeleteFile::HANDLER, &request).await
    }

    async fn rename_file(&self, request: RenameFile) -> Result<MutationResponse, CallError> {
        self.post(RenameFile::HANDLER, &request).await
    }

    async fn run_code(&self, request: RunCode) -> Result<RunResponse, CallError> {
        self.post(RunCode::HANDLER, &request).await
    }

    async fn submit_solution(&self, request: SubmitSolution) -> Result<SubmitResponse, CallError> {
        self.post(SubmitSolution::HANDLER, &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_urls_join_cleanly() {
        let client = HttpClient::new("http://localhost:8000/handler/");
        assert_eq!(
            client.url_for(SaveFile::HANDLER),
            "http://localhost:8000/handler/save_file"
        );

        let client = HttpClient::new("http://localhost:8000/handler");
        assert_eq!(
            client.url_for(RunCode::HANDLER),
            "http://localhost:8000/handler/run_code"
        );
    }

    #[test]
    fn request_bodies_use_wire_names() {
        let body = serde_json::to_value(RenameFile {
            old_filename: "main.py".to_owned(),
            new_filename: "solution.py".to_owned(),
        })
        .unwrap();
        assert_eq!(body["old_filename"], "main.py");
        assert_eq!(body["new_filename"], "solution.py");

        let body = serde_json::to_value(SubmitSolution {
            main_file: "main.py".to_owned(),
        })
        .unwrap();
        assert_eq!(body["main_file"], "main.py");
    }
}

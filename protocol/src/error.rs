//! Error type for handler calls.

/// Errors raised while invoking an exercise-service handler. Every variant
/// carries the handler name so the failure can be reported without extra
/// context at the call site.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// The request never produced an HTTP response (connect, TLS, timeout).
    #[error("calling handler {handler}: {source}")]
    Transport {
        handler: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The handler answered with a non-success HTTP status.
    #[error("handler {handler} returned HTTP status {status}")]
    Status {
        handler: &'static str,
        status: reqwest::StatusCode,
    },

    /// The response body was not the documented JSON shape.
    #[error("decoding response from handler {handler}: {source}")]
    Decode {
        handler: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl CallError {
    /// The handler this error came from.
    pub fn handler(&self) -> &'static str {
        match self {
            CallError::Transport { handler, .. }
            | CallError::Status { handler, .. }
            | CallError::Decode { handler, .. } => handler,
        }
    }
}

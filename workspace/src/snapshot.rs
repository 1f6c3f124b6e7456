//! The initial state handed to the client by the host page.
//!
//! The embedding host serialises one JSON document per workspace: the
//! handler base URL, the student's files in insertion order, the
//! instructor's language table and the score board. The desktop client
//! reads it from a path given on the command line.

use std::path::Path;

use eyre::Context;
use protocol::types::LanguageConfig;
use serde::{Deserialize, Serialize};

/// One student file as the host last persisted it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSnapshot {
    pub name: String,
    #[serde(default)]
    pub content: String,
    pub language: String,
    #[serde(default)]
    pub modified: Option<String>,
}

/// Everything the workspace needs to start a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    /// URL prefix the five handler names are joined to.
    pub handler_base: String,
    /// Student files in insertion order.
    pub student_files: Vec<FileSnapshot>,
    /// Language table in the order the instructor configured it.
    pub supported_languages: Vec<LanguageConfig>,
    pub current_language: String,
    pub active_file: String,
    #[serde(default)]
    pub max_score: f64,
    #[serde(default)]
    pub current_score: f64,
    #[serde(default)]
    pub best_score: f64,
    #[serde(default)]
    pub submission_count: u32,
    #[serde(default)]
    pub problem_statement: Option<String>,
}

pub fn load(reader: impl std::io::Read) -> eyre::Result<WorkspaceSnapshot> {
    let snapshot = serde_json::from_reader(reader).context("decoding workspace snapshot")?;
    Ok(snapshot)
}

pub fn load_from_path(path: impl AsRef<Path>) -> eyre::Result<WorkspaceSnapshot> {
    let path = path.as_ref();
    let f = std::fs::File::open(path)
        .with_context(|| format!("opening snapshot {}", path.display()))?;
    let snapshot = load(f).context("reading snapshot file")?;
    Ok(snapshot)
}

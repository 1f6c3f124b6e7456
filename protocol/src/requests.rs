//! Request bodies sent to the exercise service's handlers.
//!
//! Field names here are the wire names; every handler takes a flat JSON
//! object over POST.
use serde::{Deserialize, Serialize};

/// Persist one file's content and language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveFile {
    pub filename: String,
    pub content: String,
    pub language: String,
}

impl SaveFile {
    pub const HANDLER: &'static str = "save_file";
}

/// Remove a file from the exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteFile {
    pub filename: String,
}

impl DeleteFile {
    pub const HANDLER: &'static str = "delete_file";
}

/// Rename a file, keeping its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameFile {
    pub old_filename: String,
    pub new_filename: String,
}

impl RenameFile {
    pub const HANDLER: &'static str = "rename_file";
}

/// Execute a file against the execution backend with the given stdin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCode {
    pub filename: String,
    pub input: String,
}

impl RunCode {
    pub const HANDLER: &'static str = "run_code";
}

/// Grade the given main file against the instructor's test cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitSolution {
    pub main_file: String,
}

impl SubmitSolution {
    pub const HANDLER: &'static str = "submit_solution";
}

//! Responses returned by the exercise service's handlers.
//!
//! Decoding is tolerant: handlers omit fields that do not apply to the
//! outcome they report, so everything beyond `success` is optional or
//! defaulted.
use serde::{Deserialize, Serialize};

/// Reply to [`crate::requests::SaveFile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveFileResponse {
    pub success: bool,
    pub filename: Option<String>,
    pub error: Option<String>,
}

impl SaveFileResponse {
    pub fn saved(filename: impl Into<String>) -> Self {
        Self {
            success: true,
            filename: Some(filename.into()),
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            filename: None,
            error: Some(error.into()),
        }
    }
}

/// Reply to [`crate::requests::DeleteFile`] and
/// [`crate::requests::RenameFile`]: a bare outcome with an optional
/// human-readable message either way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl MutationResponse {
    pub fn applied() -> Self {
        Self {
            success: true,
            message: None,
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

/// Execution verdict as reported by the backend, e.g. "Accepted" or
/// "Time Limit Exceeded".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionStatus {
    pub description: String,
}

/// Reply to [`crate::requests::RunCode`].
///
/// `time` stays a string: the execution backend reports wall time as a
/// decimal string and the service passes it through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResponse {
    pub success: bool,
    pub output: Option<String>,
    pub error: Option<String>,
    pub compile_output: Option<String>,
    pub status: Option<ExecutionStatus>,
    pub time: Option<String>,
    pub memory: Option<i64>,
}

impl RunResponse {
    pub fn completed(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: Some(output.into()),
            error: None,
            compile_output: None,
            status: Some(ExecutionStatus {
                description: "Accepted".to_owned(),
            }),
            time: None,
            memory: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
            compile_output: None,
            status: None,
            time: None,
            memory: None,
        }
    }
}

/// Outcome of one graded test case.
///
/// `expected_output`/`actual_output` are only present for public test
/// cases; the service withholds them for hidden ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    #[serde(default)]
    pub points: f64,
    #[serde(default)]
    pub earned_points: f64,
    #[serde(default)]
    pub is_public: bool,
    pub expected_output: Option<String>,
    pub actual_output: Option<String>,
}

/// Reply to [`crate::requests::SubmitSolution`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: Option<String>,
    pub error: Option<String>,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub max_score: f64,
    #[serde(default)]
    pub passed_tests: u32,
    #[serde(default)]
    pub total_tests: u32,
    #[serde(default)]
    pub test_results: Vec<TestResult>,
}

impl SubmitResponse {
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            score: 0.0,
            max_score: 0.0,
            passed_tests: 0,
            total_tests: 0,
            test_results: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_response_decodes_with_absent_fields() {
        let raw = r#"{"success": true, "output": "hi\n"}"#;
        let response: RunResponse = serde_json::from_str(raw).unwrap();
        assert!(response.success);
        assert_eq!(response.output.as_deref(), Some("hi\n"));
        assert!(response.error.is_none());
        assert!(response.status.is_none());
        assert!(response.time.is_none());
    }

    #[test]
    fn run_response_decodes_full_shape() {
        let raw = r#"{
            "success": true,
            "output": "4\n",
            "error": "",
            "compile_output": null,
            "status": {"description": "Accepted"},
            "time": "0.002",
            "memory": 3244
        }"#;
        let response: RunResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.status.unwrap().description, "Accepted");
        assert_eq!(response.time.as_deref(), Some("0.002"));
        assert_eq!(response.memory, Some(3244));
    }

    #[test]
    fn submit_response_defaults_counters() {
        let raw = r#"{"success": false, "error": "No test cases configured"}"#;
        let response: SubmitResponse = serde_json::from_str(raw).unwrap();
        assert!(!response.success);
        assert_eq!(response.total_tests, 0);
        assert!(response.test_results.is_empty());
    }

    #[test]
    fn submit_response_decodes_test_results() {
        let raw = r#"{
            "success": true,
            "score": 7.5,
            "max_score": 10.0,
            "passed_tests": 3,
            "total_tests": 4,
            "test_results": [
                {"name": "basic", "passed": true, "points": 2.5,
                 "earned_points": 2.5, "is_public": true,
                 "expected_output": "4", "actual_output": "4"},
                {"name": "edge", "passed": false, "points": 2.5,
                 "earned_points": 0.0, "is_public": false}
            ]
        }"#;
        let response: SubmitResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.test_results.len(), 2);
        assert!(response.test_results[1].expected_output.is_none());
        assert!(!response.test_results[1].is_public);
    }
}

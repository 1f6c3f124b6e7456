//! The settings document the host persists for an exercise.

use std::path::Path;

use eyre::Context;
use protocol::types::LanguageConfig;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// One instructor-authored test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub points: f64,
    #[serde(default)]
    pub timeout: f64,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub expected_output: String,
    /// Hidden test cases never reveal expected or actual output to
    /// students.
    #[serde(default = "default_true")]
    pub is_public: bool,
}

/// The full instructor-editable configuration of an exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudioSettings {
    pub display_name: String,
    pub judge0_api_url: String,
    pub judge0_api_key: String,
    pub judge0_api_host: String,
    pub max_score: f64,
    /// Per-test execution limit, in seconds.
    pub execution_time_limit: f64,
    /// Per-test memory limit, in kilobytes.
    pub memory_limit: i64,
    pub max_files: u32,
    pub test_cases: Vec<TestCase>,
    pub languages: Vec<LanguageConfig>,
}

impl Default for StudioSettings {
    fn default() -> Self {
        Self {
            display_name: "Advanced Coding Assessment".to_owned(),
            judge0_api_url: "https://judge0-ce.p.rapidapi.com".to_owned(),
            judge0_api_key: String::new(),
            judge0_api_host: "judge0-ce.p.rapidapi.com".to_owned(),
            max_score: 100.0,
            execution_time_limit: 5.0,
            memory_limit: 128_000,
            max_files: 10,
            test_cases: vec![TestCase {
                id: "test_1".to_owned(),
                name: "Sample Test Case".to_owned(),
                points: 10.0,
                timeout: 2.0,
                input: "5 3".to_owned(),
                expected_output: "8".to_owned(),
                is_public: true,
            }],
            languages: LanguageConfig::default_set(),
        }
    }
}

pub fn load(reader: impl std::io::Read) -> eyre::Result<StudioSettings> {
    let settings = serde_json::from_reader(reader).context("decoding studio settings")?;
    Ok(settings)
}

pub fn load_from_path(path: impl AsRef<Path>) -> eyre::Result<StudioSettings> {
    let path = path.as_ref();
    let f = std::fs::File::open(path)
        .with_context(|| format!("opening settings {}", path.display()))?;
    let settings = load(f).context("reading settings file")?;
    Ok(settings)
}

pub fn save(settings: &StudioSettings, writer: impl std::io::Write) -> eyre::Result<()> {
    serde_json::to_writer_pretty(writer, settings).context("encoding studio settings")?;
    Ok(())
}

pub fn save_to_path(settings: &StudioSettings, path: impl AsRef<Path>) -> eyre::Result<()> {
    let path = path.as_ref();
    let f = std::fs::File::create(path)
        .with_context(|| format!("creating settings {}", path.display()))?;
    save(settings, &f).context("saving settings file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_a_sample_test_case_and_the_stock_languages() {
        let settings = StudioSettings::default();
        assert_eq!(settings.test_cases.len(), 1);
        assert_eq!(settings.test_cases[0].id, "test_1");
        assert_eq!(settings.languages.len(), 5);
        assert_eq!(settings.max_files, 10);
    }

    #[test]
    fn settings_round_trip_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = StudioSettings::default();
        settings.display_name = "Week 3 exercise".to_owned();
        settings.test_cases.push(TestCase {
            id: "test_2".to_owned(),
            name: "Hidden edge case".to_owned(),
            points: 5.0,
            timeout: 1.0,
            input: "0 0".to_owned(),
            expected_output: "0".to_owned(),
            is_public: false,
        });

        save_to_path(&settings, &path).unwrap();
        let loaded = load_from_path(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_cases_decode_with_absent_flags() {
        let raw = r#"{"id": "test_1", "name": "basic"}"#;
        let case: TestCase = serde_json::from_str(raw).unwrap();
        assert!(case.is_public);
        assert_eq!(case.points, 0.0);
    }
}

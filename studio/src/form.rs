//! The form model: fields, repeated blocks, reindexing and collection.

use crate::{
    rules::{Feedback, Rule, evaluate},
    settings::{StudioSettings, TestCase},
};
use protocol::types::LanguageConfig;

/// One text input with its declared rules and current feedback.
#[derive(Debug, Clone)]
pub struct Field {
    /// Submission name, e.g. `test_cases[0][name]`. Reindexing rewrites
    /// the index part so names stay contiguous and zero-based.
    pub name: String,
    pub value: String,
    rules: Vec<Rule>,
    pub feedback: Feedback,
}

impl Field {
    fn new(name: impl Into<String>, rules: &[Rule], value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            rules: rules.to_vec(),
            feedback: Feedback::None,
        }
    }

    /// Re-evaluate this field, replacing any prior feedback.
    pub fn validate(&mut self) {
        self.feedback = evaluate(&self.rules, &self.value);
    }

    fn passes(&self) -> bool {
        !evaluate(&self.rules, &self.value).is_invalid()
    }
}

/// A repeated test-case sub-form.
#[derive(Debug, Clone)]
pub struct TestCaseBlock {
    pub id: String,
    pub name: Field,
    pub points: Field,
    pub timeout: Field,
    pub input: Field,
    pub expected_output: Field,
    pub is_public: bool,
}

impl TestCaseBlock {
    fn fields_mut(&mut self) -> [&mut Field; 5] {
        [
            &mut self.name,
            &mut self.points,
            &mut self.timeout,
            &mut self.input,
            &mut self.expected_output,
        ]
    }

    fn fields(&self) -> [&Field; 5] {
        [
            &self.name,
            &self.points,
            &self.timeout,
            &self.input,
            &self.expected_output,
        ]
    }

    fn reindex(&mut self, index: usize) {
        self.name.name = format!("test_cases[{index}][name]");
        self.points.name = format!("test_cases[{index}][points]");
        self.timeout.name = format!("test_cases[{index}][timeout]");
        self.input.name = format!("test_cases[{index}][input]");
        self.expected_output.name = format!("test_cases[{index}][expected_output]");
    }
}

/// A repeated language sub-form.
#[derive(Debug, Clone)]
pub struct LanguageBlock {
    pub id: String,
    pub key: Field,
    pub name: Field,
    pub engine_id: Field,
    pub extension: Field,
    pub template: Field,
}

impl LanguageBlock {
    fn fields_mut(&mut self) -> [&mut Field; 5] {
        [
            &mut self.key,
            &mut self.name,
            &mut self.engine_id,
            &mut self.extension,
            &mut self.template,
        ]
    }

    fn fields(&self) -> [&Field; 5] {
        [
            &self.key,
            &self.name,
            &self.engine_id,
            &self.extension,
            &self.template,
        ]
    }

    fn reindex(&mut self, index: usize) {
        self.key.name = format!("languages[{index}][key]");
        self.name.name = format!("languages[{index}][name]");
        self.engine_id.name = format!("languages[{index}][id]");
        self.extension.name = format!("languages[{index}][extension]");
        self.template.name = format!("languages[{index}][template]");
    }
}

/// The whole instructor form.
///
/// Validity is recomputed by full scan on demand, never incrementally
/// patched, so it can never go stale.
#[derive(Debug, Clone)]
pub struct StudioForm {
    pub display_name: Field,
    pub judge0_api_url: Field,
    pub judge0_api_key: Field,
    pub judge0_api_host: Field,
    pub max_score: Field,
    pub execution_time_limit: Field,
    pub memory_limit: Field,
    pub max_files: Field,
    pub test_cases: Vec<TestCaseBlock>,
    pub languages: Vec<LanguageBlock>,
}

impl StudioForm {
    pub fn from_settings(settings: &StudioSettings) -> Self {
        let mut form = Self {
            display_name: Field::new(
                "display_name",
                &[Rule::Required],
                &settings.display_name,
            ),
            judge0_api_url: Field::new(
                "judge0_api_url",
                &[Rule::Required, Rule::Url],
                &settings.judge0_api_url,
            ),
            judge0_api_key: Field::new("judge0_api_key", &[], &settings.judge0_api_key),
            judge0_api_host: Field::new(
                "judge0_api_host",
                &[Rule::Required],
                &settings.judge0_api_host,
            ),
            max_score: Field::new(
                "max_score",
                &[Rule::Required, Rule::Number],
                settings.max_score.to_string(),
            ),
            execution_time_limit: Field::new(
                "execution_time_limit",
                &[Rule::Required, Rule::Number],
                settings.execution_time_limit.to_string(),
            ),
            memory_limit: Field::new(
                "memory_limit",
                &[Rule::Required, Rule::Number],
                settings.memory_limit.to_string(),
            ),
            max_files: Field::new(
                "max_files",
                &[Rule::Required, Rule::Number],
                settings.max_files.to_string(),
            ),
            test_cases: settings.test_cases.iter().map(test_case_block).collect(),
            languages: settings.languages.iter().map(language_block).collect(),
        };
        form.reindex();
        form.revalidate();
        form
    }

    pub fn new() -> Self {
        Self::from_settings(&StudioSettings::default())
    }

    /// Append a test-case block with generated id and default values.
    /// Always succeeds.
    pub fn add_test_case(&mut self) {
        let id = format!("test_{}", self.test_cases.len() + 1);
        tracing::debug!(%id, "adding test case block");
        self.test_cases.push(test_case_block(&TestCase {
            id,
            name: String::new(),
            points: 10.0,
            timeout: 2.0,
            input: String::new(),
            expected_output: String::new(),
            is_public: true,
        }));
        self.reindex();
        self.revalidate();
    }

    /// Remove the test-case block at `index`, unless it is the last one.
    pub fn remove_test_case(&mut self, index: usize) -> Result<(), String> {
        if self.test_cases.len() <= 1 {
            return Err("At least one test case is required".to_owned());
        }
        if index >= self.test_cases.len() {
            return Err(format!("No test case at position {index}"));
        }
        tracing::debug!(index, "removing test case block");
        self.test_cases.remove(index);
        self.reindex();
        self.revalidate();
        Ok(())
    }

    /// Append a language block with generated id and blank fields.
    pub fn add_language(&mut self) {
        let id = format!("language_{}", self.languages.len() + 1);
        tracing::debug!(%id, "adding language block");
        self.languages.push(LanguageBlock {
            id,
            key: Field::new("", &[Rule::Required], ""),
            name: Field::new("", &[Rule::Required], ""),
            engine_id: Field::new("", &[Rule::Required, Rule::Number], ""),
            extension: Field::new("", &[Rule::Required], ""),
            template: Field::new("", &[], ""),
        });
        self.reindex();
        self.revalidate();
    }

    /// Remove the language block at `index`, unless it is the last one.
    pub fn remove_language(&mut self, index: usize) -> Result<(), String> {
        if self.languages.len() <= 1 {
            return Err("At least one language is required".to_owned());
        }
        if index >= self.languages.len() {
            return Err(format!("No language at position {index}"));
        }
        tracing::debug!(index, "removing language block");
        self.languages.remove(index);
        self.reindex();
        self.revalidate();
        Ok(())
    }

    /// Re-evaluate every field, replacing all prior feedback.
    pub fn revalidate(&mut self) {
        for field in self.scalar_fields_mut() {
            field.validate();
        }
        for block in &mut self.test_cases {
            for field in block.fields_mut() {
                field.validate();
            }
        }
        for block in &mut self.languages {
            for field in block.fields_mut() {
                field.validate();
            }
        }
    }

    /// Whether the form can be saved: every rule-carrying field passes
    /// and both repeated groups are non-empty. A pure full scan of
    /// current state.
    pub fn is_valid(&self) -> bool {
        let scalars_pass = self.scalar_fields().into_iter().all(Field::passes);
        let blocks_pass = self
            .test_cases
            .iter()
            .all(|b| b.fields().into_iter().all(Field::passes))
            && self
                .languages
                .iter()
                .all(|b| b.fields().into_iter().all(Field::passes));
        scalars_pass && blocks_pass && !self.test_cases.is_empty() && !self.languages.is_empty()
    }

    /// Assemble a settings document from a valid form. Re-checks the
    /// invariants the rule set cannot express (points >= 0, timeout > 0,
    /// integral engine id, max_files >= 1); violations are reported and
    /// marked on the offending fields.
    pub fn collect(&mut self) -> Result<StudioSettings, Vec<String>> {
        self.revalidate();
        let mut errors = Vec::new();

        for field in self.scalar_fields_mut() {
            if let Feedback::Invalid(message) = field.feedback.clone() {
                errors.push(format!("{}: {message}", field.name));
            }
        }
        for block in &mut self.test_cases {
            for field in block.fields_mut() {
                if let Feedback::Invalid(message) = field.feedback.clone() {
                    errors.push(format!("{}: {message}", field.name));
                }
            }
        }
        for block in &mut self.languages {
            for field in block.fields_mut() {
                if let Feedback::Invalid(message) = field.feedback.clone() {
                    errors.push(format!("{}: {message}", field.name));
                }
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let mut invalid = |field: &mut Field, message: &str| {
            field.feedback = Feedback::Invalid(message.to_owned());
            errors.push(format!("{}: {message}", field.name));
        };

        let max_score = parse_number(&self.max_score.value);
        let execution_time_limit = parse_number(&self.execution_time_limit.value);
        let memory_limit = parse_number(&self.memory_limit.value);
        let max_files = parse_number(&self.max_files.value);
        if max_files.fract() != 0.0 || max_files < 1.0 {
            invalid(&mut self.max_files, "Must be a whole number of at least 1");
        }
        if execution_time_limit <= 0.0 {
            invalid(&mut self.execution_time_limit, "Must be greater than zero");
        }

        let mut test_cases = Vec::with_capacity(self.test_cases.len());
        for block in &mut self.test_cases {
            let points = parse_number(&block.points.value);
            if points < 0.0 {
                invalid(&mut block.points, "Points cannot be negative");
            }
            let timeout = parse_number(&block.timeout.value);
            if timeout <= 0.0 {
                invalid(&mut block.timeout, "Timeout must be greater than zero");
            }
            test_cases.push(TestCase {
                id: block.id.clone(),
                name: block.name.value.trim().to_owned(),
                points,
                timeout,
                input: block.input.value.clone(),
                expected_output: block.expected_output.value.clone(),
                is_public: block.is_public,
            });
        }

        let mut languages = Vec::with_capacity(self.languages.len());
        for block in &mut self.languages {
            let engine_id = parse_number(&block.engine_id.value);
            if engine_id.fract() != 0.0 {
                invalid(&mut block.engine_id, "Engine id must be a whole number");
            }
            languages.push(LanguageConfig {
                key: block.key.value.trim().to_owned(),
                name: block.name.value.trim().to_owned(),
                id: engine_id as i64,
                extension: block.extension.value.trim().to_owned(),
                template: block.template.value.clone(),
            });
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(StudioSettings {
            display_name: self.display_name.value.trim().to_owned(),
            judge0_api_url: self.judge0_api_url.value.trim().to_owned(),
            judge0_api_key: self.judge0_api_key.value.clone(),
            judge0_api_host: self.judge0_api_host.value.trim().to_owned(),
            max_score,
            execution_time_limit,
            memory_limit: memory_limit as i64,
            max_files: max_files as u32,
            test_cases,
            languages,
        })
    }

    fn reindex(&mut self) {
        for (index, block) in self.test_cases.iter_mut().enumerate() {
            block.reindex(index);
        }
        for (index, block) in self.languages.iter_mut().enumerate() {
            block.reindex(index);
        }
    }

    fn scalar_fields(&self) -> [&Field; 8] {
        [
            &self.display_name,
            &self.judge0_api_url,
            &self.judge0_api_key,
            &self.judge0_api_host,
            &self.max_score,
            &self.execution_time_limit,
            &self.memory_limit,
            &self.max_files,
        ]
    }

    fn scalar_fields_mut(&mut self) -> [&mut Field; 8] {
        [
            &mut self.display_name,
            &mut self.judge0_api_url,
            &mut self.judge0_api_key,
            &mut self.judge0_api_host,
            &mut self.max_score,
            &mut self.execution_time_limit,
            &mut self.memory_limit,
            &mut self.max_files,
        ]
    }
}

impl Default for StudioForm {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_number(value: &str) -> f64 {
    value.trim().parse().unwrap_or_default()
}

fn test_case_block(case: &TestCase) -> TestCaseBlock {
    TestCaseBlock {
        id: case.id.clone(),
        name: Field::new("", &[Rule::Required], &case.name),
        points: Field::new("", &[Rule::Required, Rule::Number], case.points.to_string()),
        timeout: Field::new(
            "",
            &[Rule::Required, Rule::Number],
            case.timeout.to_string(),
        ),
        input: Field::new("", &[], &case.input),
        expected_output: Field::new("", &[], &case.expected_output),
        is_public: case.is_public,
    }
}

fn language_block(language: &LanguageConfig) -> LanguageBlock {
    LanguageBlock {
        id: format!("language_{}", language.key),
        key: Field::new("", &[Rule::Required], &language.key),
        name: Field::new("", &[Rule::Required], &language.name),
        engine_id: Field::new(
            "",
            &[Rule::Required, Rule::Number],
            language.id.to_string(),
        ),
        extension: Field::new("", &[Rule::Required], &language.extension),
        template: Field::new("", &[], &language.template),
    }
}

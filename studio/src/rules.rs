//! Declarative field validation.

/// A validation rule a field can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Non-empty after trimming.
    Required,
    /// Trimmed value parses as a number.
    Number,
    /// Value starts with `http://` or `https://`.
    Url,
}

impl Rule {
    fn check(&self, value: &str) -> Result<(), &'static str> {
        match self {
            Rule::Required => {
                if value.trim().is_empty() {
                    Err("This field is required")
                } else {
                    Ok(())
                }
            }
            Rule::Number => {
                if value.trim().parse::<f64>().is_ok() {
                    Ok(())
                } else {
                    Err("Must be a number")
                }
            }
            Rule::Url => {
                if value.starts_with("http://") || value.starts_with("https://") {
                    Ok(())
                } else {
                    Err("Must be a valid URL starting with http:// or https://")
                }
            }
        }
    }
}

/// The visible state of a validated field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Feedback {
    /// No rules, nothing to say.
    #[default]
    None,
    /// A satisfied `required` rule gets an explicit valid mark.
    Valid,
    Invalid(String),
}

impl Feedback {
    pub fn is_invalid(&self) -> bool {
        matches!(self, Feedback::Invalid(_))
    }
}

/// Evaluate `rules` in order against `value`. The first failing rule
/// wins; re-evaluating replaces prior feedback entirely.
pub fn evaluate(rules: &[Rule], value: &str) -> Feedback {
    for rule in rules {
        if let Err(message) = rule.check(value) {
            return Feedback::Invalid(message.to_owned());
        }
    }
    if rules.contains(&Rule::Required) {
        Feedback::Valid
    } else {
        Feedback::None
    }
}

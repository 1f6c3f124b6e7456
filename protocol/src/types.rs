//! Types shared between the snapshot, the studio settings and the wire.
use serde::{Deserialize, Serialize};

/// One supported language: stable key (`python`), display name, numeric
/// execution-engine id, file extension and starter template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub key: String,
    pub name: String,
    pub id: i64,
    pub extension: String,
    pub template: String,
}

impl LanguageConfig {
    /// The stock language table an exercise starts from before an
    /// instructor customizes it.
    pub fn default_set() -> Vec<LanguageConfig> {
        fn entry(key: &str, name: &str, id: i64, extension: &str, template: &str) -> LanguageConfig {
            LanguageConfig {
                key: key.to_owned(),
                name: name.to_owned(),
                id,
                extension: extension.to_owned(),
                template: template.to_owned(),
            }
        }

        vec![
            entry(
                "python",
                "Python 3",
                71,
                "py",
                "# Write your Python code here\nprint('Hello, World!')",
            ),
            entry(
                "java",
                "Java",
                62,
                "java",
                "public class Main {\n    public static void main(String[] args) {\n        System.out.println(\"Hello, World!\");\n    }\n}",
            ),
            entry(
                "cpp",
                "C++",
                76,
                "cpp",
                "#include <iostream>\nusing namespace std;\n\nint main() {\n    cout << \"Hello, World!\" << endl;\n    return 0;\n}",
            ),
            entry(
                "javascript",
                "JavaScript",
                63,
                "js",
                "// Write your JavaScript code here\nconsole.log('Hello, World!');",
            ),
            entry(
                "c",
                "C",
                75,
                "c",
                "#include <stdio.h>\n\nint main() {\n    printf(\"Hello, World!\\n\");\n    return 0;\n}",
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_is_ordered_and_unique() {
        let languages = LanguageConfig::default_set();
        assert_eq!(languages.len(), 5);
        assert_eq!(languages[0].key, "python");
        let mut keys: Vec<_> = languages.iter().map(|l| l.key.clone()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 5);
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Syntax-highlighting language handed to the code editor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EditorLanguage {
    Python,
    JavaScript,
    Go,
    Java,
    CSharp,
    Php,
    Ruby,
}

// Checked in order; "javascript" must be tried before "java".
const LANGUAGE_PATTERNS: &[(&[&str], EditorLanguage)] = &[
    (&["python"], EditorLanguage::Python),
    (&["node", "javascript"], EditorLanguage::JavaScript),
    (&["go"], EditorLanguage::Go),
    (&["java"], EditorLanguage::Java),
    (&["csharp", "dotnet"], EditorLanguage::CSharp),
    (&["php"], EditorLanguage::Php),
    (&["ruby"], EditorLanguage::Ruby),
];

/// Maps a runtime identifier such as `nodejs20.x` to an editor language.
/// Unknown runtimes fall back to Python.
pub fn language_of(runtime: &str) -> EditorLanguage {
    let runtime = runtime.to_ascii_lowercase();
    LANGUAGE_PATTERNS
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| runtime.contains(needle)))
        .map(|(_, language)| *language)
        .unwrap_or(EditorLanguage::Python)
}

impl EditorLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditorLanguage::Python => "python",
            EditorLanguage::JavaScript => "javascript",
            EditorLanguage::Go => "go",
            EditorLanguage::Java => "java",
            EditorLanguage::CSharp => "csharp",
            EditorLanguage::Php => "php",
            EditorLanguage::Ruby => "ruby",
        }
    }
}

impl fmt::Display for EditorLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

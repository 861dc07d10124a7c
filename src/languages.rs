//! Supported languages and their judge-service identifiers

use std::fmt;
use std::str::FromStr;

use crate::error::GatewayError;

/// A language the gateway accepts.
///
/// The set is closed: anything else is rejected before the judge is contacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    JavaScript,
    Python,
    Java,
    Cpp,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::JavaScript,
        Language::Python,
        Language::Java,
        Language::Cpp,
    ];

    /// Judge0 `language_id` for this language
    pub fn judge_id(self) -> u32 {
        match self {
            Language::JavaScript => 63, // Node.js 12.14.0
            Language::Python => 71,     // Python 3.8.1
            Language::Java => 62,       // OpenJDK 13.0.1
            Language::Cpp => 54,        // GCC 9.2.0
        }
    }

    /// Canonical name, as sent by the client
    pub fn name(self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Java => "java",
            Language::Cpp => "cpp",
        }
    }

    /// Alternative spellings accepted on input
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Language::JavaScript => &["js", "node", "nodejs"],
            Language::Python => &["py", "python3"],
            Language::Java => &[],
            Language::Cpp => &["c++"],
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Language {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Language::ALL
            .into_iter()
            .find(|lang| lang.name() == key || lang.aliases().contains(&key.as_str()))
            .ok_or_else(|| {
                GatewayError::InvalidRequest(format!(
                    "Unsupported language: {} (supported: {})",
                    s,
                    get_supported_languages().join(", ")
                ))
            })
    }
}

/// Get all supported language names
pub fn get_supported_languages() -> Vec<&'static str> {
    Language::ALL.iter().map(|lang| lang.name()).collect()
}

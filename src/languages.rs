use serde::{Deserialize, Serialize};

/// Languages the platform accepts, mapped to the execution-environment ids
/// the remote service understands.
///
/// The table is fixed and fails closed: an unknown name yields `None` and the
/// caller must reject the request rather than substitute a default.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    Java,
    Javascript,
}

impl Language {
    /// Resolves a logical language name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "PYTHON" => Some(Self::Python),
            "JAVA" => Some(Self::Java),
            "JAVASCRIPT" => Some(Self::Javascript),
            _ => None,
        }
    }

    /// Execution-environment id on the remote judging service.
    pub fn execution_id(self) -> u32 {
        match self {
            Self::Python => 71,
            Self::Java => 62,
            Self::Javascript => 63,
        }
    }

    /// Reverse lookup from an execution-environment id.
    pub fn from_execution_id(id: u32) -> Option<Self> {
        match id {
            71 => Some(Self::Python),
            62 => Some(Self::Java),
            63 => Some(Self::Javascript),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Python => "PYTHON",
            Self::Java => "JAVA",
            Self::Javascript => "JAVASCRIPT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_known_languages() {
        assert_eq!(Language::from_name("PYTHON"), Some(Language::Python));
        assert_eq!(Language::from_name("python"), Some(Language::Python));
        assert_eq!(Language::from_name("Java"), Some(Language::Java));
        assert_eq!(Language::from_name("javascript"), Some(Language::Javascript));
    }

    #[test]
    fn test_rejects_unknown_language() {
        assert_eq!(Language::from_name("COBOL"), None);
        assert_eq!(Language::from_name(""), None);
    }

    #[test]
    fn test_execution_id_round_trip() {
        for lang in [Language::Python, Language::Java, Language::Javascript] {
            assert_eq!(Language::from_execution_id(lang.execution_id()), Some(lang));
        }
        assert_eq!(Language::from_execution_id(9999), None);
    }
}

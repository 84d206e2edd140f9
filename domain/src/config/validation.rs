//! Configuration validation issue types.
//!
//! Loaders collect every problem they find instead of stopping at the first
//! one; callers decide whether warnings are acceptable.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A numeric option is outside its permitted range.
    OutOfRange { field: String },
    /// A string option could not be parsed.
    InvalidValue { field: String, value: String },
    /// Two options contradict each other.
    Inconsistent { fields: Vec<String> },
    /// The indicator vocabulary is unusable.
    InvalidVocabulary,
    /// The resonance caps can never reach the speaking threshold.
    MemoryCannotSpeak,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Check if any issue in the list is fatal
pub fn has_errors(issues: &[ConfigIssue]) -> bool {
    issues.iter().any(ConfigIssue::is_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_errors() {
        let warning = ConfigIssue::warning(ConfigIssueCode::MemoryCannotSpeak, "quiet");
        let error = ConfigIssue::error(
            ConfigIssueCode::OutOfRange {
                field: "resonance.speaking_threshold".to_string(),
            },
            "out of range",
        );

        assert!(!has_errors(std::slice::from_ref(&warning)));
        assert!(has_errors(&[warning, error]));
        assert!(!has_errors(&[]));
    }
}

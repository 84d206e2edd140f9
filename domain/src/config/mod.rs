//! Configuration value objects for the domain layer
//!
//! Validation issue types shared by every configuration source.

pub mod validation;

pub use validation::{ConfigIssue, ConfigIssueCode, Severity, has_errors};

//! Core domain concepts shared across all subdomains.
//!
//! - [`ids`] — session, participant and memory identifiers
//! - [`error::DomainError`] — domain-level errors
//! - [`reason::ReasonCode`] — the user-visible failure taxonomy

pub mod error;
pub mod ids;
pub mod reason;

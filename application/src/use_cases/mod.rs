//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod promote_memory;
pub mod run_deliberation;

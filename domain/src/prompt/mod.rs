//! Prompt domain
//!
//! Templates for generating the prompt sent to participants each round.

mod template;

pub use template::PromptTemplate;

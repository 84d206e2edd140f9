//! Durable store adapters
//!
//! Implementations of the [`DurableStore`](council_application::DurableStore)
//! port: an in-process map for tests and simulations, and a directory of JSON
//! documents for single-node deployments.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::InMemoryDocumentStore;

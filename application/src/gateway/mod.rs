//! Persistence gateway
//!
//! The only component allowed to touch durable storage. It owns the
//! [`DurableStore`](crate::ports::durable_store::DurableStore) it was built
//! with, so no other component can reach the store around it.

pub mod error;
pub mod persistence;
pub mod query;

pub use error::PersistenceError;
pub use persistence::PersistenceGateway;
pub use query::SessionQuery;

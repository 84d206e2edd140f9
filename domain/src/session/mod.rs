//! Deliberation sessions.
//!
//! - [`Session`] — the session entity and its state machine
//! - [`Message`] — committed, sequence-numbered dialogue entries
//! - [`SessionState`] — `FORMING → ACTIVE → CONCLUDING → ARCHIVED` / `FAILED`

pub mod entities;
pub mod message;
pub mod state;

pub use entities::{Enrollment, Round, RoundOutcome, Session};
pub use message::{Author, Message, MessageDraft, MessageKind};
pub use state::{ConclusionCause, SessionState};

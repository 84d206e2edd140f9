//! Quorum rules.
//!
//! A session needs a minimum number of healthy participants to form and to
//! stay active. The minimum is expressed relative to the session's target
//! size:
//!
//! ```text
//! target = 5, rule = majority  → minimum 3
//!
//! round 1: 5 enrolled, 2 terminal failures → 3 active  ✓ continue
//! round 2: 3 active,   1 terminal failure  → 2 active  ✗ QUORUM_LOST
//! ```

pub mod rule;

pub use rule::QuorumRule;

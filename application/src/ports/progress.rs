//! Progress notification port
//!
//! Defines the interface for reporting progress while a deliberation runs.

use council_domain::{ParticipantId, ResonanceCandidate, ResponseClassification, SessionId, SessionState};

/// Callback for progress updates during a deliberation
///
/// Implementations live in the outer layers and can display progress in
/// various ways (console, web UI, etc.)
pub trait DeliberationProgress: Send + Sync {
    /// Called once the session has enrolled its participants
    fn on_session_formed(&self, session_id: &SessionId, participants: &[ParticipantId]);

    /// Called when a round starts
    fn on_round_start(&self, round: u32, participants: usize);

    /// Called for each participant as its response is committed
    fn on_participant_outcome(
        &self,
        round: u32,
        participant: &ParticipantId,
        classification: ResponseClassification,
    );

    /// Called when a round completes
    fn on_round_complete(&self, round: u32, emergence_score: f64, sacred: bool);

    // ==================== Optional Callbacks ====================

    /// Called when a past memory is contributed to the dialogue
    fn on_memory_spoke(&self, _round: u32, _candidate: &ResonanceCandidate) {}

    /// Called when the session reaches a terminal state
    fn on_session_finished(&self, _session_id: &SessionId, _state: SessionState) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl DeliberationProgress for NoProgress {
    fn on_session_formed(&self, _session_id: &SessionId, _participants: &[ParticipantId]) {}
    fn on_round_start(&self, _round: u32, _participants: usize) {}
    fn on_participant_outcome(
        &self,
        _round: u32,
        _participant: &ParticipantId,
        _classification: ResponseClassification,
    ) {
    }
    fn on_round_complete(&self, _round: u32, _emergence_score: f64, _sacred: bool) {}
}

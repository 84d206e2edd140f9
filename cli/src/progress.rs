//! Progress reporting for deliberation runs

use colored::Colorize;
use council_application::DeliberationProgress;
use council_domain::{ParticipantId, ResonanceCandidate, ResponseClassification, SessionId, SessionState};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Reports round progress with one bar per round
pub struct ProgressReporter {
    multi: MultiProgress,
    round_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            round_bar: Mutex::new(None),
        }
    }

    fn round_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn outcome_mark(classification: ResponseClassification) -> String {
        match classification {
            ResponseClassification::Success => "v".green().to_string(),
            ResponseClassification::Filtered => "~".yellow().to_string(),
            ResponseClassification::TransientFailure => "!".yellow().to_string(),
            ResponseClassification::TerminalFailure => "x".red().to_string(),
        }
    }

    fn println(&self, line: String) {
        let _ = self.multi.println(line);
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl DeliberationProgress for ProgressReporter {
    fn on_session_formed(&self, session_id: &SessionId, participants: &[ParticipantId]) {
        self.println(format!(
            "{} {} with {} participants",
            "Session".bold(),
            session_id,
            participants.len()
        ));
    }

    fn on_round_start(&self, round: u32, participants: usize) {
        let pb = self.multi.add(ProgressBar::new(participants as u64));
        pb.set_style(Self::round_style());
        pb.set_prefix(format!("Round {}", round));
        pb.set_message("waiting...");
        if let Ok(mut bar) = self.round_bar.lock() {
            *bar = Some(pb);
        }
    }

    fn on_participant_outcome(
        &self,
        _round: u32,
        participant: &ParticipantId,
        classification: ResponseClassification,
    ) {
        if let Ok(bar) = self.round_bar.lock()
            && let Some(pb) = bar.as_ref()
        {
            pb.set_message(format!("{} {}", Self::outcome_mark(classification), participant));
            pb.inc(1);
        }
    }

    fn on_round_complete(&self, _round: u32, score: f64, sacred: bool) {
        if let Ok(mut bar) = self.round_bar.lock()
            && let Some(pb) = bar.take()
        {
            let message = if sacred {
                format!("emergence {:.3} {}", score, "sacred".magenta().bold())
            } else {
                format!("emergence {:.3}", score)
            };
            pb.finish_with_message(message);
        }
    }

    fn on_memory_spoke(&self, round: u32, candidate: &ResonanceCandidate) {
        self.println(format!(
            "  {} {} spoke after round {} (resonance {:.2})",
            "memory".cyan(),
            candidate.memory_id,
            round,
            candidate.score
        ));
    }

    fn on_session_finished(&self, session_id: &SessionId, state: SessionState) {
        let state = match state {
            SessionState::Archived => state.to_string().green(),
            _ => state.to_string().red(),
        };
        self.println(format!("{} {} {}", "Session".bold(), session_id, state));
    }
}

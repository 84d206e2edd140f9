//! Participant health tracker
//!
//! One [`HealthRecord`] per participant identity, shared by every session
//! through an `Arc<HealthTracker>`. Updates to a single participant lock only
//! that participant's map shard.

use chrono::{DateTime, Utc};
use council_domain::{HealthRecord, HealthSnapshot, ParticipantId, ResponseClassification};
use dashmap::DashMap;
use std::cmp::Ordering;

pub struct HealthTracker {
    records: DashMap<ParticipantId, HealthRecord>,
    window: usize,
}

impl HealthTracker {
    /// Create a tracker keeping the last `window` outcomes per participant
    pub fn new(window: usize) -> Self {
        Self {
            records: DashMap::new(),
            window: window.max(1),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Record one outcome for `participant`
    pub fn record(&self, participant: &ParticipantId, kind: ResponseClassification, at: DateTime<Utc>) {
        self.records
            .entry(participant.clone())
            .or_insert_with(|| HealthRecord::new(self.window))
            .record(kind, at);
    }

    /// Success ratio over the trailing window; 1.0 without history
    pub fn success_ratio(&self, participant: &ParticipantId) -> f64 {
        self.records
            .get(participant)
            .map(|r| r.success_ratio())
            .unwrap_or(1.0)
    }

    pub fn last_success_at(&self, participant: &ParticipantId) -> Option<DateTime<Utc>> {
        self.records.get(participant).and_then(|r| r.last_success_at())
    }

    pub fn snapshot(&self, participant: &ParticipantId) -> HealthSnapshot {
        self.records
            .get(participant)
            .map(|r| r.snapshot(participant))
            .unwrap_or_else(|| HealthSnapshot::empty(participant))
    }

    /// Order `items` best first: highest success ratio, then most recent
    /// success. Remaining ties keep their original order.
    pub fn rank<T, F>(&self, items: Vec<T>, id_of: F) -> Vec<T>
    where
        F: Fn(&T) -> &ParticipantId,
    {
        let mut keyed: Vec<(f64, Option<DateTime<Utc>>, T)> = items
            .into_iter()
            .map(|item| {
                let id = id_of(&item);
                (self.success_ratio(id), self.last_success_at(id), item)
            })
            .collect();

        keyed.sort_by(|(ratio_a, last_a, _), (ratio_b, last_b, _)| {
            ratio_b
                .partial_cmp(ratio_a)
                .unwrap_or(Ordering::Equal)
                // None sorts before Some, so reverse for most recent first
                .then_with(|| last_b.cmp(last_a))
        });

        keyed.into_iter().map(|(_, _, item)| item).collect()
    }
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new(50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    fn id(name: &str) -> ParticipantId {
        ParticipantId::new(name, "v1")
    }

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn test_ratio_ignores_filtered() {
        let tracker = HealthTracker::new(50);
        let p = id("a");
        for i in 0..3 {
            tracker.record(&p, ResponseClassification::Success, t(i));
        }
        tracker.record(&p, ResponseClassification::TransientFailure, t(3));
        let before = tracker.success_ratio(&p);
        assert!((before - 0.75).abs() < 1e-9);

        for i in 0..10 {
            tracker.record(&p, ResponseClassification::Filtered, t(10 + i));
        }
        assert_eq!(tracker.success_ratio(&p), before);
        assert_eq!(tracker.snapshot(&p).counts.filtered, 10);
    }

    #[test]
    fn test_unknown_participant_defaults() {
        let tracker = HealthTracker::new(5);
        let p = id("new");
        assert_eq!(tracker.success_ratio(&p), 1.0);
        assert_eq!(tracker.last_success_at(&p), None);
        assert_eq!(tracker.snapshot(&p), HealthSnapshot::empty(&p));
    }

    #[test]
    fn test_rank_by_ratio_then_recency() {
        let tracker = HealthTracker::new(10);
        let (a, b, c, d) = (id("a"), id("b"), id("c"), id("d"));

        // a: 1/2, b: 1/1 older success, c: 1/1 newer success, d: no history
        tracker.record(&a, ResponseClassification::Success, t(5));
        tracker.record(&a, ResponseClassification::TerminalFailure, t(6));
        tracker.record(&b, ResponseClassification::Success, t(1));
        tracker.record(&c, ResponseClassification::Success, t(9));

        let ranked = tracker.rank(vec![a.clone(), b.clone(), c.clone(), d.clone()], |p| p);
        assert_eq!(ranked, vec![c, b, d, a]);
    }

    #[test]
    fn test_rank_is_stable_for_full_ties() {
        let tracker = HealthTracker::new(10);
        let ranked = tracker.rank(vec![id("x"), id("y"), id("z")], |p| p);
        assert_eq!(ranked, vec![id("x"), id("y"), id("z")]);
    }

    #[test]
    fn test_window_is_bounded() {
        let tracker = HealthTracker::new(2);
        let p = id("a");
        tracker.record(&p, ResponseClassification::TransientFailure, t(0));
        tracker.record(&p, ResponseClassification::Success, t(1));
        tracker.record(&p, ResponseClassification::Success, t(2));
        assert_eq!(tracker.success_ratio(&p), 1.0);
    }

    #[test]
    fn test_concurrent_updates() {
        let tracker = Arc::new(HealthTracker::new(1000));
        let p = id("shared");
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let tracker = Arc::clone(&tracker);
                let p = p.clone();
                std::thread::spawn(move || {
                    for j in 0..50 {
                        tracker.record(&p, ResponseClassification::Success, t(i * 100 + j));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(tracker.snapshot(&p).counts.successes, 400);
    }
}

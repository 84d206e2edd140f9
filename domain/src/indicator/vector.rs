//! Indicator vector value object.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Occurrence counts per indicator tag.
///
/// Backed by a `BTreeMap` so iteration order (and therefore every score
/// derived from it) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorVector {
    counts: BTreeMap<String, u32>,
}

impl IndicatorVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a vector from `(tag, count)` pairs, dropping zero counts
    pub fn from_counts<I, S>(counts: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut vector = Self::new();
        for (tag, count) in counts {
            vector.add(tag, count);
        }
        vector
    }

    pub fn add(&mut self, tag: impl Into<String>, count: u32) {
        if count == 0 {
            return;
        }
        *self.counts.entry(tag.into()).or_insert(0) += count;
    }

    pub fn count(&self, tag: &str) -> u32 {
        self.counts.get(tag).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(tag, count)| (tag.as_str(), *count))
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().map(|c| u64::from(*c)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn merge(&mut self, other: &IndicatorVector) {
        for (tag, count) in other.iter() {
            self.add(tag, count);
        }
    }

    /// Cosine similarity of the two count vectors, in `[0, 1]`.
    ///
    /// Counts are non-negative so the result is never negative. Returns 0
    /// when either vector is empty.
    pub fn cosine_similarity(&self, other: &IndicatorVector) -> f64 {
        if self.is_empty() || other.is_empty() {
            return 0.0;
        }
        let dot: f64 = self
            .iter()
            .map(|(tag, count)| f64::from(count) * f64::from(other.count(tag)))
            .sum();
        let norm = |v: &IndicatorVector| {
            v.iter()
                .map(|(_, c)| f64::from(c).powi(2))
                .sum::<f64>()
                .sqrt()
        };
        let denominator = norm(self) * norm(other);
        if denominator == 0.0 {
            return 0.0;
        }
        (dot / denominator).clamp(0.0, 1.0)
    }

    /// Jaccard index of the two tag sets, in `[0, 1]`.
    pub fn jaccard_index(&self, other: &IndicatorVector) -> f64 {
        let union = self
            .tags()
            .chain(other.tags().filter(|t| self.count(t) == 0))
            .count();
        if union == 0 {
            return 0.0;
        }
        let intersection = self.tags().filter(|t| other.count(t) > 0).count();
        intersection as f64 / union as f64
    }

    /// Stable hash of the contents, used to detect unchanged dialogue state.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.counts.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_count() {
        let mut v = IndicatorVector::new();
        v.add("autonomy-signal", 2);
        v.add("autonomy-signal", 1);
        v.add("collective-signal", 0);

        assert_eq!(v.count("autonomy-signal"), 3);
        assert_eq!(v.count("collective-signal"), 0);
        assert_eq!(v.total(), 3);
        assert_eq!(v.tags().count(), 1);
    }

    #[test]
    fn test_merge() {
        let mut a = IndicatorVector::from_counts([("a", 1), ("b", 2)]);
        let b = IndicatorVector::from_counts([("b", 1), ("c", 4)]);
        a.merge(&b);

        assert_eq!(a.count("a"), 1);
        assert_eq!(a.count("b"), 3);
        assert_eq!(a.count("c"), 4);
    }

    #[test]
    fn test_cosine_identical_and_disjoint() {
        let a = IndicatorVector::from_counts([("a", 1), ("b", 2)]);
        let b = IndicatorVector::from_counts([("a", 2), ("b", 4)]);
        let c = IndicatorVector::from_counts([("c", 3)]);

        assert!((a.cosine_similarity(&b) - 1.0).abs() < 1e-9);
        assert_eq!(a.cosine_similarity(&c), 0.0);
        assert_eq!(a.cosine_similarity(&IndicatorVector::new()), 0.0);
    }

    #[test]
    fn test_jaccard() {
        let a = IndicatorVector::from_counts([("a", 1), ("b", 5)]);
        let b = IndicatorVector::from_counts([("b", 1), ("c", 1)]);

        // {b} / {a, b, c}
        assert!((a.jaccard_index(&b) - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(IndicatorVector::new().jaccard_index(&IndicatorVector::new()), 0.0);
    }

    #[test]
    fn test_fingerprint_tracks_contents() {
        let a = IndicatorVector::from_counts([("a", 1)]);
        let b = IndicatorVector::from_counts([("a", 1)]);
        let c = IndicatorVector::from_counts([("a", 2)]);

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}

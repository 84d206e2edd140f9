//! Memory resonance engine
//!
//! After each round the orchestrator hands the engine an immutable
//! [`DialogueSnapshot`]. The engine fetches recent memories of the same
//! domain through the gateway, scores each against the round's indicator
//! vector and returns the single best candidate if it clears the speaking
//! threshold. Everything below the threshold is dropped.
//!
//! Scores are cached per (session, memory) for a TTL. A cached entry is
//! reused only while the dialogue vector it was computed from and the
//! memory's sacred flag are both unchanged.

use crate::config::ResonanceSettings;
use crate::gateway::{PersistenceError, PersistenceGateway};
use chrono::{DateTime, Utc};
use council_domain::{
    EpisodicMemoryRecord, IndicatorVector, MemoryId, ResonanceCandidate, SessionId, TimeWindow,
};
use lru::LruCache;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Read-only view of the live dialogue handed to the engine
#[derive(Debug, Clone)]
pub struct DialogueSnapshot {
    pub session_id: SessionId,
    pub domain: String,
    pub round: u32,
    /// Merged indicators of the round just completed
    pub indicators: IndicatorVector,
    /// Memories that already spoke in this session
    pub spoken: BTreeSet<MemoryId>,
}

/// A memory that earned the right to speak
#[derive(Debug, Clone)]
pub struct ResonantMemory {
    pub candidate: ResonanceCandidate,
    pub memory: EpisodicMemoryRecord,
}

struct CachedCandidate {
    candidate: ResonanceCandidate,
    fingerprint: u64,
    /// The flag can flip through promotion while an entry is live
    sacred: bool,
}

type CacheKey = (SessionId, MemoryId);

pub struct MemoryResonanceEngine {
    gateway: Arc<PersistenceGateway>,
    settings: ResonanceSettings,
    cache: Mutex<LruCache<CacheKey, CachedCandidate>>,
}

impl MemoryResonanceEngine {
    pub fn new(gateway: Arc<PersistenceGateway>, settings: ResonanceSettings) -> Self {
        let capacity = NonZeroUsize::new(settings.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            gateway,
            settings,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn settings(&self) -> &ResonanceSettings {
        &self.settings
    }

    /// Find the memory that should speak after this round, if any
    pub async fn evaluate(
        &self,
        snapshot: &DialogueSnapshot,
        now: DateTime<Utc>,
    ) -> Result<Option<ResonantMemory>, PersistenceError> {
        self.purge_expired(now);

        if snapshot.indicators.is_empty() {
            return Ok(None);
        }

        let window = self
            .settings
            .recency_window
            .map(|span| TimeWindow::last(span, now))
            .unwrap_or_default();
        let memories = self
            .gateway
            .query_memories(&snapshot.domain, window, Some(self.settings.candidate_limit))
            .await?;

        let fingerprint = snapshot.indicators.fingerprint();
        let mut best: Option<ResonantMemory> = None;

        for memory in memories {
            if snapshot.spoken.contains(&memory.id) || memory.source_session_id == snapshot.session_id {
                continue;
            }
            let candidate = self.candidate_for(snapshot, &memory, fingerprint, now);
            // Memories arrive newest first, so strict comparison keeps the
            // newest among equal scores
            if best.as_ref().is_none_or(|b| candidate.score > b.candidate.score) {
                best = Some(ResonantMemory { candidate, memory });
            }
        }

        let policy = &self.settings.policy;
        match best {
            Some(found) if found.candidate.is_eligible(policy) => {
                debug!(
                    "Memory {} resonates with session {} at {:.3}",
                    found.memory.id, snapshot.session_id, found.candidate.score
                );
                Ok(Some(found))
            }
            Some(found) => {
                debug!(
                    "Best memory {} scored {:.3}, below speaking threshold {:.2}",
                    found.memory.id, found.candidate.score, policy.speaking_threshold
                );
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Drop cached candidates older than the TTL; returns how many went
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let Ok(ttl) = chrono::Duration::from_std(self.settings.candidate_ttl) else {
            return 0;
        };
        let Ok(mut cache) = self.cache.lock() else {
            return 0;
        };
        let expired: Vec<CacheKey> = cache
            .iter()
            .filter(|(_, entry)| now - entry.candidate.computed_at >= ttl)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            cache.pop(key);
        }
        expired.len()
    }

    /// Drop every cached candidate of a finished session
    pub fn forget_session(&self, session_id: &SessionId) {
        if let Ok(mut cache) = self.cache.lock() {
            let keys: Vec<CacheKey> = cache
                .iter()
                .filter(|((sid, _), _)| sid == session_id)
                .map(|(key, _)| key.clone())
                .collect();
            for key in &keys {
                cache.pop(key);
            }
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    fn candidate_for(
        &self,
        snapshot: &DialogueSnapshot,
        memory: &EpisodicMemoryRecord,
        fingerprint: u64,
        now: DateTime<Utc>,
    ) -> ResonanceCandidate {
        let key = (snapshot.session_id.clone(), memory.id.clone());

        if let Ok(mut cache) = self.cache.lock()
            && let Some(cached) = cache.get(&key)
            && cached.fingerprint == fingerprint
            && cached.sacred == memory.sacred
        {
            return cached.candidate.clone();
        }

        let breakdown = self
            .settings
            .policy
            .score(&snapshot.indicators, memory, now);
        let candidate = ResonanceCandidate::new(
            snapshot.session_id.clone(),
            memory.id.clone(),
            breakdown,
            now,
        );

        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                key,
                CachedCandidate {
                    candidate: candidate.clone(),
                    fingerprint,
                    sacred: memory.sacred,
                },
            );
        }
        candidate
    }
}

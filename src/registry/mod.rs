// Speaker registry: durable cross-session store of known speakers
//
// Every mutation persists a full snapshot before returning success. If the
// durable write fails, the in-memory map is rolled back to its pre-call
// state so memory and disk never diverge silently.

pub mod store;

use std::collections::HashMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::SimilarityWeights;
use crate::error::Result;
use crate::signature::VoiceSignature;
use crate::similarity::signature_similarity;
use crate::speaker::Speaker;

pub use store::{JsonSnapshotStore, MemoryStore, SnapshotStore};

/// A ranked similarity match against a registry speaker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateMatch {
    pub speaker_id: String,
    pub similarity: f32,
    /// The matched speaker's stored confidence, not the match confidence.
    pub stored_confidence: f32,
}

/// Aggregate statistics over the registry, for settings/statistics views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total_speakers: usize,
    pub learned_speakers: usize,
    /// Speakers with a user-assigned name.
    pub identified_speakers: usize,
    pub total_meetings: u64,
    pub average_confidence: f32,
    pub identification_rate: f32,
    pub learning_rate: f32,
}

/// Durable store of known speakers, keyed by speaker id.
pub struct SpeakerRegistry {
    speakers: HashMap<String, Speaker>,
    store: Box<dyn SnapshotStore>,
}

impl SpeakerRegistry {
    /// Load the registry from the given store. A missing or corrupt snapshot
    /// yields an empty registry; speaker history re-learns over time, while
    /// refusing to start would block recording.
    pub fn load(store: Box<dyn SnapshotStore>) -> Self {
        let speakers: HashMap<String, Speaker> = store
            .load()
            .into_iter()
            .map(|s| (s.id.clone(), s))
            .collect();
        info!("Speaker registry initialized with {} speakers", speakers.len());
        Self { speakers, store }
    }

    /// Insert or replace a speaker and persist synchronously. The speaker's
    /// signature must satisfy its invariants; a degenerate profile is
    /// rejected rather than persisted. On a failed write the in-memory entry
    /// is rolled back and the error returned is retryable.
    pub fn upsert(&mut self, speaker: Speaker) -> Result<()> {
        speaker.signature.validate()?;
        let id = speaker.id.clone();
        let previous = self.speakers.insert(id.clone(), speaker);

        if let Err(e) = self.persist() {
            match previous {
                Some(prev) => self.speakers.insert(id, prev),
                None => self.speakers.remove(&id),
            };
            return Err(e);
        }

        debug!("Upserted speaker {}", id);
        Ok(())
    }

    /// Look up a speaker by id.
    pub fn get(&self, id: &str) -> Option<&Speaker> {
        self.speakers.get(id)
    }

    /// All speakers ordered by last use, most recent first, ties broken by
    /// id so the ordering is reproducible for UI consumers.
    pub fn list_all(&self) -> Vec<&Speaker> {
        let mut speakers: Vec<&Speaker> = self.speakers.values().collect();
        speakers.sort_by(|a, b| {
            b.last_used
                .cmp(&a.last_used)
                .then_with(|| a.id.cmp(&b.id))
        });
        speakers
    }

    /// Remove a speaker and persist. Deleting an unknown id is a no-op
    /// success.
    pub fn delete(&mut self, id: &str) -> Result<()> {
        let Some(previous) = self.speakers.remove(id) else {
            return Ok(());
        };

        if let Err(e) = self.persist() {
            self.speakers.insert(id.to_string(), previous);
            return Err(e);
        }

        info!("Deleted speaker {}", id);
        Ok(())
    }

    /// Assign a display name to a speaker. Unknown ids are a no-op success.
    pub fn rename(&mut self, id: &str, name: &str) -> Result<()> {
        let Some(speaker) = self.speakers.get_mut(id) else {
            return Ok(());
        };
        let previous = speaker.name.replace(name.to_string());

        if let Err(e) = self.persist() {
            if let Some(speaker) = self.speakers.get_mut(id) {
                speaker.name = previous;
            }
            return Err(e);
        }

        info!("Renamed speaker {} to '{}'", id, name);
        Ok(())
    }

    /// Record a confident match for a speaker: usage statistics plus the
    /// confidence step, persisted like any other mutation. Unknown ids are a
    /// no-op success.
    pub fn record_usage(&mut self, id: &str, speaking_time: f64) -> Result<()> {
        let Some(speaker) = self.speakers.get_mut(id) else {
            return Ok(());
        };
        let previous = speaker.clone();
        speaker.record_usage(speaking_time);

        if let Err(e) = self.persist() {
            self.speakers.insert(id.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }

    /// Linear scan over all speakers, returning every match at or above the
    /// threshold, most similar first. Registries stay small (tens to low
    /// hundreds of speakers); revisit with an index if that changes.
    pub fn find_similar(
        &self,
        signature: &VoiceSignature,
        threshold: f32,
        weights: &SimilarityWeights,
    ) -> Vec<CandidateMatch> {
        let mut matches: Vec<CandidateMatch> = self
            .speakers
            .values()
            .filter_map(|speaker| {
                let similarity =
                    signature_similarity(signature, &speaker.signature, weights).ok()?;
                (similarity >= threshold).then(|| CandidateMatch {
                    speaker_id: speaker.id.clone(),
                    similarity,
                    stored_confidence: speaker.confidence,
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.speaker_id.cmp(&b.speaker_id))
        });
        matches
    }

    /// Aggregate statistics for UI display.
    pub fn stats(&self) -> RegistryStats {
        let total = self.speakers.len();
        let learned = self.speakers.values().filter(|s| s.is_learned).count();
        let identified = self.speakers.values().filter(|s| s.name.is_some()).count();
        let total_meetings: u64 = self
            .speakers
            .values()
            .map(|s| s.meeting_count as u64)
            .sum();
        let average_confidence = if total == 0 {
            0.0
        } else {
            self.speakers.values().map(|s| s.confidence).sum::<f32>() / total as f32
        };

        RegistryStats {
            total_speakers: total,
            learned_speakers: learned,
            identified_speakers: identified,
            total_meetings,
            average_confidence,
            identification_rate: if total == 0 {
                0.0
            } else {
                identified as f32 / total as f32
            },
            learning_rate: if total == 0 {
                0.0
            } else {
                learned as f32 / total as f32
            },
        }
    }

    pub fn len(&self) -> usize {
        self.speakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speakers.is_empty()
    }

    fn persist(&mut self) -> Result<()> {
        let snapshot: Vec<Speaker> = self.speakers.values().cloned().collect();
        self.store.save(&snapshot)
    }
}

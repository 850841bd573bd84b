// Identification decision policy
//
// Per incoming segment: score the signature against active session clusters
// and registry speakers, then either bind to the best match, assign
// tentatively, or seed a new cluster. The policy itself never fails; absence
// of any match always resolves to "new speaker", never to an error.

use std::sync::{Arc, RwLock};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cluster::SessionCluster;
use crate::config::{
    IdentificationConfig, INITIAL_CONFIDENCE, MAX_LEARNING_BACKGROUND_NOISE,
    MIN_LEARNING_AUDIO_QUALITY, MIN_LEARNING_DURATION_SECS, MIN_LEARNING_SPEECH_ACTIVITY,
    RELIABLE_CONFIDENCE, TENTATIVE_CONFIDENCE_SCALE,
};
use crate::error::Result;
use crate::registry::{CandidateMatch, SpeakerRegistry};
use crate::signature::VoiceSignature;
use crate::speaker::Speaker;

/// Descriptor of the audio segment behind an identification request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioSegmentInfo {
    /// Segment start, seconds from the beginning of the recording.
    pub start_time: f64,
    /// Segment duration in seconds.
    pub duration: f64,
    /// Overall audio quality estimate in [0, 1].
    pub audio_quality: f32,
    /// Fraction of the segment containing speech, in [0, 1].
    pub speech_activity: f32,
    /// Background noise level in [0, 1].
    pub background_noise: f32,
}

impl AudioSegmentInfo {
    /// Whether this segment is clean enough to update learned speaker
    /// statistics. Noisy or short segments can still be matched, but must
    /// not pollute the stored profile.
    pub fn is_suitable_for_learning(&self) -> bool {
        self.duration >= MIN_LEARNING_DURATION_SECS
            && self.audio_quality >= MIN_LEARNING_AUDIO_QUALITY
            && self.speech_activity >= MIN_LEARNING_SPEECH_ACTIVITY
            && self.background_noise <= MAX_LEARNING_BACKGROUND_NOISE
    }
}

/// The per-segment identification result handed back to transcript assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerIdentification {
    /// Resolved registry speaker, if any.
    pub speaker_id: Option<String>,
    /// Session cluster carrying the provisional identity until the speaker
    /// is named or promoted.
    pub cluster_id: Option<Uuid>,
    /// Match confidence in [0, 1].
    pub confidence: f32,
    /// True when no known speaker or cluster matched and a new cluster was
    /// seeded.
    pub is_new_speaker: bool,
    /// Close registry matches, most similar first; second-bests are kept for
    /// later disambiguation rather than silently discarded.
    pub candidates: Vec<CandidateMatch>,
    /// The segment this identification describes.
    pub segment: AudioSegmentInfo,
}

impl SpeakerIdentification {
    /// Unreliable identifications are advisory only (UI shows "possibly X").
    pub fn is_reliable(&self) -> bool {
        self.confidence >= RELIABLE_CONFIDENCE
    }
}

// What the best match across clusters and registry turned out to be.
enum BestMatch {
    Cluster { index: usize, similarity: f32 },
    Speaker { id: String, similarity: f32 },
    None,
}

/// Per-session identification engine.
///
/// Segments of one session must be processed in order by a single caller
/// (`identify` takes `&mut self`); cluster growth is order-dependent.
/// Registry reads for UI may run concurrently through the shared lock.
pub struct IdentificationEngine {
    config: IdentificationConfig,
    registry: Arc<RwLock<SpeakerRegistry>>,
    clusters: Vec<SessionCluster>,
}

impl IdentificationEngine {
    pub fn new(config: IdentificationConfig, registry: Arc<RwLock<SpeakerRegistry>>) -> Self {
        Self {
            config,
            registry,
            clusters: Vec::new(),
        }
    }

    /// Identify the speaker of one segment.
    ///
    /// Fails only on an invalid signature at the boundary (degenerate
    /// embedding or non-finite scalar feature); once past validation the
    /// policy always produces a result.
    pub fn identify(
        &mut self,
        signature: &VoiceSignature,
        segment: AudioSegmentInfo,
        segment_id: &str,
    ) -> Result<SpeakerIdentification> {
        signature.validate()?;

        let candidates = self
            .registry
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .find_similar(
                signature,
                self.config.tentative_threshold,
                &self.config.weights,
            );

        let best = self.best_match(signature, &candidates);

        match best {
            BestMatch::Speaker { id, similarity } if similarity >= self.config.match_threshold => {
                Ok(self.bind_to_speaker(id, similarity, signature, segment, segment_id, candidates))
            }
            BestMatch::Cluster { index, similarity }
                if similarity >= self.config.match_threshold =>
            {
                Ok(self.bind_to_cluster(index, similarity, signature, segment, segment_id, candidates))
            }
            BestMatch::Speaker { id, similarity } => {
                debug!(
                    "Tentative match to speaker {} at {:.3} for segment {}",
                    id, similarity, segment_id
                );
                Ok(SpeakerIdentification {
                    speaker_id: Some(id),
                    cluster_id: None,
                    confidence: similarity * TENTATIVE_CONFIDENCE_SCALE,
                    is_new_speaker: false,
                    candidates,
                    segment,
                })
            }
            BestMatch::Cluster { index, similarity } => {
                let cluster = &self.clusters[index];
                debug!(
                    "Tentative match to cluster {} at {:.3} for segment {}",
                    cluster.id, similarity, segment_id
                );
                Ok(SpeakerIdentification {
                    speaker_id: cluster.speaker_id.clone(),
                    cluster_id: Some(cluster.id),
                    confidence: similarity * TENTATIVE_CONFIDENCE_SCALE,
                    is_new_speaker: false,
                    candidates,
                    segment,
                })
            }
            BestMatch::None => Ok(self.seed_new_cluster(signature, segment, segment_id, candidates)),
        }
    }

    /// Discard all session clusters, e.g. when a recording is aborted. No
    /// partial promotion survives; promotions that already completed stay in
    /// the registry.
    pub fn reset_session(&mut self) {
        info!("Session reset, discarding {} clusters", self.clusters.len());
        self.clusters.clear();
    }

    pub fn active_cluster_count(&self) -> usize {
        self.clusters.len()
    }

    pub fn clusters(&self) -> &[SessionCluster] {
        &self.clusters
    }

    pub fn registry(&self) -> Arc<RwLock<SpeakerRegistry>> {
        self.registry.clone()
    }

    // Pick the single best match across cluster centroids (cosine) and
    // registry speakers (signature similarity), at or above the tentative
    // threshold.
    fn best_match(&self, signature: &VoiceSignature, candidates: &[CandidateMatch]) -> BestMatch {
        let best_cluster = self
            .clusters
            .iter()
            .enumerate()
            .map(|(i, c)| (i, c.centroid_similarity(&signature.embedding)))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let best_speaker = candidates.first();

        match (best_cluster, best_speaker) {
            (Some((index, cluster_sim)), Some(speaker))
                if cluster_sim >= self.config.tentative_threshold =>
            {
                if speaker.similarity >= cluster_sim {
                    BestMatch::Speaker {
                        id: speaker.speaker_id.clone(),
                        similarity: speaker.similarity,
                    }
                } else {
                    BestMatch::Cluster {
                        index,
                        similarity: cluster_sim,
                    }
                }
            }
            (_, Some(speaker)) => BestMatch::Speaker {
                id: speaker.speaker_id.clone(),
                similarity: speaker.similarity,
            },
            (Some((index, cluster_sim)), None)
                if cluster_sim >= self.config.tentative_threshold =>
            {
                BestMatch::Cluster {
                    index,
                    similarity: cluster_sim,
                }
            }
            _ => BestMatch::None,
        }
    }

    // Confident match against a registry speaker: grow (or create) the
    // session cluster bound to them and update usage statistics when the
    // segment is clean enough.
    fn bind_to_speaker(
        &mut self,
        speaker_id: String,
        similarity: f32,
        signature: &VoiceSignature,
        segment: AudioSegmentInfo,
        segment_id: &str,
        candidates: Vec<CandidateMatch>,
    ) -> SpeakerIdentification {
        let cluster_id = match self
            .clusters
            .iter_mut()
            .find(|c| c.speaker_id.as_deref() == Some(speaker_id.as_str()))
        {
            Some(cluster) => {
                cluster.add_embedding(signature.embedding.clone(), segment_id);
                cluster.id
            }
            None => {
                let mut cluster = SessionCluster::new(signature.embedding.clone(), segment_id);
                cluster.speaker_id = Some(speaker_id.clone());
                let id = cluster.id;
                self.clusters.push(cluster);
                id
            }
        };

        if segment.is_suitable_for_learning() {
            let mut registry = self
                .registry
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Err(e) = registry.record_usage(&speaker_id, segment.duration) {
                // Identification still stands; the statistics update is
                // retryable on a later segment.
                warn!("Failed to persist usage update for {}: {}", speaker_id, e);
            }
        }

        debug!(
            "Segment {} matched speaker {} at {:.3}",
            segment_id, speaker_id, similarity
        );

        SpeakerIdentification {
            speaker_id: Some(speaker_id),
            cluster_id: Some(cluster_id),
            confidence: similarity,
            is_new_speaker: false,
            candidates,
            segment,
        }
    }

    // Confident match against a session cluster: absorb the embedding, then
    // consider promoting an unbound cluster into the registry.
    fn bind_to_cluster(
        &mut self,
        index: usize,
        similarity: f32,
        signature: &VoiceSignature,
        segment: AudioSegmentInfo,
        segment_id: &str,
        candidates: Vec<CandidateMatch>,
    ) -> SpeakerIdentification {
        self.clusters[index].add_embedding(signature.embedding.clone(), segment_id);

        if self.clusters[index].speaker_id.is_none() {
            self.try_promote(index, signature);
        }

        let cluster = &self.clusters[index];

        if let Some(speaker_id) = cluster.speaker_id.clone() {
            if segment.is_suitable_for_learning() {
                let mut registry = self
                .registry
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
                if let Err(e) = registry.record_usage(&speaker_id, segment.duration) {
                    warn!("Failed to persist usage update for {}: {}", speaker_id, e);
                }
            }
        }

        let cluster = &self.clusters[index];
        debug!(
            "Segment {} matched cluster {} at {:.3}",
            segment_id, cluster.id, similarity
        );

        SpeakerIdentification {
            speaker_id: cluster.speaker_id.clone(),
            cluster_id: Some(cluster.id),
            confidence: similarity,
            is_new_speaker: false,
            candidates,
            segment,
        }
    }

    // Promote a cohesive, large-enough unbound cluster into a learned
    // registry speaker. All-or-nothing: a failed persist leaves the cluster
    // unbound and the registry unchanged.
    fn try_promote(&mut self, index: usize, signature: &VoiceSignature) {
        let cluster = &self.clusters[index];
        if cluster.len() < self.config.learn_min_cluster_size
            || cluster.cohesion < self.config.learn_cohesion_threshold
        {
            return;
        }

        // Representative profile: the current signature's scalar features
        // with the cluster centroid as the embedding.
        let mut representative = signature.clone();
        representative.embedding.features = cluster.centroid.clone();

        let speaker = Speaker::learned(representative);
        let speaker_id = speaker.id.clone();

        let mut registry = self
            .registry
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match registry.upsert(speaker) {
            Ok(()) => {
                drop(registry);
                self.clusters[index].speaker_id = Some(speaker_id.clone());
                info!(
                    "Promoted cluster {} to learned speaker {} ({} members, cohesion {:.3})",
                    self.clusters[index].id,
                    speaker_id,
                    self.clusters[index].len(),
                    self.clusters[index].cohesion
                );
            }
            Err(e) => {
                warn!(
                    "Promotion of cluster {} failed, leaving unbound: {}",
                    self.clusters[index].id, e
                );
            }
        }
    }

    // No match anywhere: seed a fresh cluster whose id stands in for a
    // speaker identity until the cluster is named or promoted.
    fn seed_new_cluster(
        &mut self,
        signature: &VoiceSignature,
        segment: AudioSegmentInfo,
        segment_id: &str,
        candidates: Vec<CandidateMatch>,
    ) -> SpeakerIdentification {
        let cluster = SessionCluster::new(signature.embedding.clone(), segment_id);
        let cluster_id = cluster.id;
        self.clusters.push(cluster);

        debug!("Segment {} seeded new cluster {}", segment_id, cluster_id);

        SpeakerIdentification {
            speaker_id: None,
            cluster_id: Some(cluster_id),
            confidence: INITIAL_CONFIDENCE,
            is_new_speaker: true,
            candidates,
            segment,
        }
    }
}

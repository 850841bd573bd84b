// Durable speaker record
//
// A speaker is created the first time a voice has no sufficiently similar
// match (or when a session cluster is promoted), then accumulates usage
// statistics and confidence over subsequent meetings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{
    CONFIDENCE_BOOST_MEETINGS, INITIAL_CONFIDENCE, LEARNED_CONFIDENCE, MAX_CONFIDENCE_BOOST,
};
use crate::signature::VoiceSignature;

/// A known speaker persisted across sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Speaker {
    /// Unique identifier.
    pub id: String,
    /// User-assigned display name, if any.
    pub name: Option<String>,
    /// Representative voice signature for matching.
    pub signature: VoiceSignature,
    /// Identification confidence in [0, 1]; never decreases under normal
    /// usage updates.
    pub confidence: f32,
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
    /// Number of meetings this speaker was confidently matched in.
    pub meeting_count: u32,
    /// Cumulative speaking time in seconds.
    pub total_speaking_time: f64,
    /// Whether this speaker was learned automatically from a promoted
    /// session cluster.
    pub is_learned: bool,
}

impl Speaker {
    /// Create a fresh, unnamed speaker with initial confidence.
    pub fn new(signature: VoiceSignature) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: None,
            signature,
            confidence: INITIAL_CONFIDENCE,
            created_at: now,
            last_used: now,
            meeting_count: 0,
            total_speaking_time: 0.0,
            is_learned: false,
        }
    }

    /// Create a speaker learned from a promoted session cluster. Learned
    /// speakers start at the learned confidence floor.
    pub fn learned(signature: VoiceSignature) -> Self {
        let mut speaker = Self::new(signature);
        speaker.confidence = LEARNED_CONFIDENCE;
        speaker.is_learned = true;
        speaker
    }

    /// Record a confident match in a suitable segment: bump usage statistics
    /// and step confidence. The meeting-count boost is spread evenly over the
    /// first `CONFIDENCE_BOOST_MEETINGS` meetings (0.3 total), and confidence
    /// is capped at 1.0; it never moves downward here.
    pub fn record_usage(&mut self, speaking_time: f64) {
        self.last_used = Utc::now();
        self.meeting_count += 1;
        self.total_speaking_time += speaking_time;

        if self.meeting_count <= CONFIDENCE_BOOST_MEETINGS {
            let step = MAX_CONFIDENCE_BOOST / CONFIDENCE_BOOST_MEETINGS as f32;
            self.confidence = (self.confidence + step).min(1.0);
        }
    }

    /// Display label: the assigned name, or a short fallback from the id.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("Speaker {}", &self.id[..8.min(self.id.len())]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::Embedding;

    fn make_signature() -> VoiceSignature {
        VoiceSignature {
            embedding: Embedding {
                features: vec![0.1, 0.2, 0.3],
                model_version: "test-v1".to_string(),
                extracted_at: Utc::now(),
            },
            fundamental_frequency: 120.0,
            spectral_centroid: 1500.0,
            formants: vec![700.0, 1200.0],
            speech_rate: 150.0,
            energy_distribution: vec![0.125; 8],
        }
    }

    #[test]
    fn test_new_speaker_defaults() {
        let speaker = Speaker::new(make_signature());
        assert_eq!(speaker.confidence, INITIAL_CONFIDENCE);
        assert_eq!(speaker.meeting_count, 0);
        assert!(!speaker.is_learned);
        assert!(speaker.name.is_none());
    }

    #[test]
    fn test_learned_speaker_meets_confidence_floor() {
        let speaker = Speaker::learned(make_signature());
        assert!(speaker.is_learned);
        assert!(speaker.confidence >= 0.8);
    }

    #[test]
    fn test_confidence_monotonic_and_capped() {
        let mut speaker = Speaker::new(make_signature());
        let mut previous = speaker.confidence;

        for _ in 0..30 {
            speaker.record_usage(10.0);
            assert!(speaker.confidence >= previous);
            assert!(speaker.confidence <= 1.0);
            previous = speaker.confidence;
        }
        assert_eq!(speaker.meeting_count, 30);
        assert!((speaker.total_speaking_time - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_five_meetings_boost() {
        // From the initial 0.5, five qualifying meetings add 0.03 each.
        let mut speaker = Speaker::new(make_signature());
        for _ in 0..5 {
            speaker.record_usage(5.0);
        }
        assert!((speaker.confidence - 0.65).abs() < 1e-6);
    }

    #[test]
    fn test_boost_stops_after_ten_meetings() {
        let mut speaker = Speaker::new(make_signature());
        for _ in 0..10 {
            speaker.record_usage(5.0);
        }
        let at_ten = speaker.confidence;
        assert!((at_ten - 0.8).abs() < 1e-6);

        speaker.record_usage(5.0);
        assert_eq!(speaker.confidence, at_ten);
    }

    #[test]
    fn test_display_name() {
        let mut speaker = Speaker::new(make_signature());
        assert!(speaker.display_name().starts_with("Speaker "));
        speaker.name = Some("Alice".to_string());
        assert_eq!(speaker.display_name(), "Alice");
    }
}

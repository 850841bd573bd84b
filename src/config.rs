// Tunable constants and configuration for speaker identification
//
// All thresholds and weights live here so they can be tuned without touching
// the matching algorithm itself.

use serde::{Deserialize, Serialize};

// Similarity weights (sum to 1.0)
pub const EMBEDDING_WEIGHT: f32 = 0.5;
pub const PITCH_WEIGHT: f32 = 0.2;
pub const TIMBRE_WEIGHT: f32 = 0.2;
pub const SPEECH_RATE_WEIGHT: f32 = 0.1;

// Decision thresholds
pub const MATCH_THRESHOLD: f32 = 0.7;
pub const TENTATIVE_THRESHOLD: f32 = 0.5;

// Cluster promotion ("learning") criteria
pub const LEARN_MIN_CLUSTER_SIZE: usize = 3;
pub const LEARN_COHESION_THRESHOLD: f32 = 0.7;

// Confidence model
pub const INITIAL_CONFIDENCE: f32 = 0.5;
pub const LEARNED_CONFIDENCE: f32 = 0.8;
pub const RELIABLE_CONFIDENCE: f32 = 0.7;
/// Total confidence boost earned from repeated meetings, spread evenly over
/// the first `CONFIDENCE_BOOST_MEETINGS` meetings.
pub const MAX_CONFIDENCE_BOOST: f32 = 0.3;
pub const CONFIDENCE_BOOST_MEETINGS: u32 = 10;
/// Scale applied to the raw similarity when only a tentative match was found.
pub const TENTATIVE_CONFIDENCE_SCALE: f32 = 0.6;

// Segment suitability gates for learning
pub const MIN_LEARNING_DURATION_SECS: f64 = 3.0;
pub const MIN_LEARNING_AUDIO_QUALITY: f32 = 0.6;
pub const MIN_LEARNING_SPEECH_ACTIVITY: f32 = 0.8;
pub const MAX_LEARNING_BACKGROUND_NOISE: f32 = 0.3;

/// Number of frequency bands in a signature's energy-distribution vector.
pub const ENERGY_BAND_COUNT: usize = 8;

/// Relative weights for combining per-feature closeness scores into one
/// signature similarity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimilarityWeights {
    pub embedding: f32,
    pub pitch: f32,
    pub timbre: f32,
    pub speech_rate: f32,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            embedding: EMBEDDING_WEIGHT,
            pitch: PITCH_WEIGHT,
            timbre: TIMBRE_WEIGHT,
            speech_rate: SPEECH_RATE_WEIGHT,
        }
    }
}

/// Configuration for the identification engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentificationConfig {
    /// Similarity at or above which a segment binds to an existing
    /// speaker/cluster (0.0 to 1.0).
    pub match_threshold: f32,
    /// Lower bound for a tentative assignment with reduced confidence.
    pub tentative_threshold: f32,
    /// Minimum member count before a session cluster may be promoted to a
    /// registry speaker.
    pub learn_min_cluster_size: usize,
    /// Minimum cohesion before a session cluster may be promoted.
    pub learn_cohesion_threshold: f32,
    /// Weights used by signature similarity.
    pub weights: SimilarityWeights,
}

impl Default for IdentificationConfig {
    fn default() -> Self {
        Self {
            match_threshold: MATCH_THRESHOLD,
            tentative_threshold: TENTATIVE_THRESHOLD,
            learn_min_cluster_size: LEARN_MIN_CLUSTER_SIZE,
            learn_cohesion_threshold: LEARN_COHESION_THRESHOLD,
            weights: SimilarityWeights::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IdentificationConfig::default();
        assert_eq!(config.match_threshold, 0.7);
        assert_eq!(config.tentative_threshold, 0.5);
        assert_eq!(config.learn_min_cluster_size, 3);
    }

    #[test]
    fn test_weights_sum_to_one() {
        let w = SimilarityWeights::default();
        let sum = w.embedding + w.pitch + w.timbre + w.speech_rate;
        assert!((sum - 1.0).abs() < 1e-6);
    }
}

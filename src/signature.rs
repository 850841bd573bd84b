// Voice signature: embedding plus derived scalar acoustic features
//
// A signature is the unit the decision policy matches on. It is derived once
// per segment and immutable afterwards; speakers keep one representative
// signature that stands for their aggregate profile.

use serde::{Deserialize, Serialize};

use crate::config::ENERGY_BAND_COUNT;
use crate::embedding::Embedding;
use crate::error::{Result, VoiceIdError};

/// Aggregate acoustic profile for one audio segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoiceSignature {
    pub embedding: Embedding,
    /// Fundamental frequency (pitch) in Hz.
    pub fundamental_frequency: f32,
    /// Spectral centroid (timbre brightness) in Hz.
    pub spectral_centroid: f32,
    /// Formant frequencies in Hz, lowest first.
    pub formants: Vec<f32>,
    /// Speech rate in words per minute.
    pub speech_rate: f32,
    /// Energy per frequency band; sums to ~1.0. Length fixed by
    /// `config::ENERGY_BAND_COUNT`.
    pub energy_distribution: Vec<f32>,
}

impl VoiceSignature {
    /// Create a validated signature. Fails with `InvalidEmbedding` for a
    /// degenerate embedding and `InvalidSignature` when a scalar feature is
    /// non-positive or non-finite, or the energy distribution does not have
    /// `ENERGY_BAND_COUNT` bands.
    pub fn new(
        embedding: Embedding,
        fundamental_frequency: f32,
        spectral_centroid: f32,
        formants: Vec<f32>,
        speech_rate: f32,
        energy_distribution: Vec<f32>,
    ) -> Result<Self> {
        let signature = Self {
            embedding,
            fundamental_frequency,
            spectral_centroid,
            formants,
            speech_rate,
            energy_distribution,
        };
        signature.validate()?;
        Ok(signature)
    }

    /// Check the signature invariants: valid embedding, positive finite
    /// scalars, configured energy-band count. Invalid signatures must never
    /// enter similarity computation; `identify` and the registry call this
    /// at their boundaries.
    pub fn validate(&self) -> Result<()> {
        if !self.embedding.is_valid() {
            return Err(VoiceIdError::InvalidEmbedding(
                "rejected at identification boundary".to_string(),
            ));
        }

        for (name, value) in [
            ("fundamental_frequency", self.fundamental_frequency),
            ("spectral_centroid", self.spectral_centroid),
            ("speech_rate", self.speech_rate),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(VoiceIdError::InvalidSignature(format!(
                    "{} must be positive and finite, got {}",
                    name, value
                )));
            }
        }

        if let Some(idx) = self.formants.iter().position(|f| !f.is_finite() || *f <= 0.0) {
            return Err(VoiceIdError::InvalidSignature(format!(
                "formant at index {} must be positive and finite",
                idx
            )));
        }

        if self.energy_distribution.len() != ENERGY_BAND_COUNT {
            return Err(VoiceIdError::InvalidSignature(format!(
                "energy distribution has {} bands, expected {}",
                self.energy_distribution.len(),
                ENERGY_BAND_COUNT
            )));
        }
        if let Some(idx) = self
            .energy_distribution
            .iter()
            .position(|e| !e.is_finite() || *e < 0.0)
        {
            return Err(VoiceIdError::InvalidSignature(format!(
                "energy band {} must be non-negative and finite",
                idx
            )));
        }

        Ok(())
    }

    /// Coarse voice-type classification from the fundamental frequency.
    pub fn voice_type(&self) -> VoiceType {
        classify_voice_type(self.fundamental_frequency)
    }
}

/// Coarse voice-type category derived from pitch range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceType {
    Male,
    Female,
    Child,
    Unknown,
}

// Hardcoded pitch bands. The ranges deliberately overlap at the boundaries;
// classification checks them in declaration order and the first matching
// range wins, which keeps results deterministic.
const VOICE_TYPE_RANGES: [(VoiceType, f32, f32); 3] = [
    (VoiceType::Male, 85.0, 180.0),
    (VoiceType::Female, 165.0, 255.0),
    (VoiceType::Child, 250.0, 400.0),
];

/// Classify a fundamental frequency into a voice type.
pub fn classify_voice_type(fundamental_frequency: f32) -> VoiceType {
    for (voice_type, low, high) in VOICE_TYPE_RANGES {
        if fundamental_frequency >= low && fundamental_frequency <= high {
            return voice_type;
        }
    }
    VoiceType::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_signature(features: Vec<f32>, pitch: f32) -> VoiceSignature {
        VoiceSignature {
            embedding: Embedding {
                features,
                model_version: "test-v1".to_string(),
                extracted_at: Utc::now(),
            },
            fundamental_frequency: pitch,
            spectral_centroid: 1500.0,
            formants: vec![700.0, 1200.0, 2600.0],
            speech_rate: 150.0,
            energy_distribution: vec![0.125; 8],
        }
    }

    #[test]
    fn test_voice_type_classification() {
        assert_eq!(classify_voice_type(120.0), VoiceType::Male);
        assert_eq!(classify_voice_type(220.0), VoiceType::Female);
        assert_eq!(classify_voice_type(300.0), VoiceType::Child);
        assert_eq!(classify_voice_type(50.0), VoiceType::Unknown);
        assert_eq!(classify_voice_type(500.0), VoiceType::Unknown);
    }

    #[test]
    fn test_overlapping_bands_first_match_wins() {
        // 170 Hz falls in both the male and female bands; declaration order
        // decides.
        assert_eq!(classify_voice_type(170.0), VoiceType::Male);
        // 252 Hz falls in both the female and child bands.
        assert_eq!(classify_voice_type(252.0), VoiceType::Female);
    }

    #[test]
    fn test_signature_voice_type() {
        let sig = test_signature(vec![0.1, 0.2], 110.0);
        assert_eq!(sig.voice_type(), VoiceType::Male);
    }

    #[test]
    fn test_new_accepts_valid_signature() {
        let sig = test_signature(vec![0.1, 0.2], 120.0);
        let built = VoiceSignature::new(
            sig.embedding.clone(),
            sig.fundamental_frequency,
            sig.spectral_centroid,
            sig.formants.clone(),
            sig.speech_rate,
            sig.energy_distribution.clone(),
        )
        .unwrap();
        assert_eq!(built, sig);
    }

    #[test]
    fn test_nan_pitch_rejected() {
        let mut sig = test_signature(vec![0.1, 0.2], 120.0);
        sig.fundamental_frequency = f32::NAN;
        assert!(matches!(
            sig.validate(),
            Err(VoiceIdError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_non_positive_scalars_rejected() {
        let mut sig = test_signature(vec![0.1, 0.2], 120.0);
        sig.spectral_centroid = 0.0;
        assert!(sig.validate().is_err());

        let mut sig = test_signature(vec![0.1, 0.2], 120.0);
        sig.speech_rate = -10.0;
        assert!(sig.validate().is_err());

        let mut sig = test_signature(vec![0.1, 0.2], 120.0);
        sig.formants[1] = f32::INFINITY;
        assert!(sig.validate().is_err());
    }

    #[test]
    fn test_wrong_energy_band_count_rejected() {
        let mut sig = test_signature(vec![0.1, 0.2], 120.0);
        sig.energy_distribution = vec![0.25; 4];
        assert!(matches!(
            sig.validate(),
            Err(VoiceIdError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_invalid_embedding_reported_as_such() {
        let mut sig = test_signature(vec![0.1, 0.2], 120.0);
        sig.embedding.features[0] = f32::NAN;
        assert!(matches!(
            sig.validate(),
            Err(VoiceIdError::InvalidEmbedding(_))
        ));
    }
}

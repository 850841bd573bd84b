// Voice embedding: fixed-length feature vector plus provenance metadata
//
// Embeddings are produced once per audio segment by the external feature
// extractor and are immutable afterwards. Validity is enforced here, at the
// ingestion boundary, so the similarity functions never see degenerate input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VoiceIdError};

/// A fixed-length acoustic feature vector for one audio segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Embedding {
    /// Ordered feature values; length is fixed per model version.
    pub features: Vec<f32>,
    /// Version tag of the model that produced this embedding.
    pub model_version: String,
    /// When the embedding was extracted.
    pub extracted_at: DateTime<Utc>,
}

impl Embedding {
    /// Create a validated embedding. Fails with `InvalidEmbedding` if the
    /// vector is empty or contains NaN/infinite features.
    pub fn new(features: Vec<f32>, model_version: &str) -> Result<Self> {
        validate_features(&features)?;
        Ok(Self {
            features,
            model_version: model_version.to_string(),
            extracted_at: Utc::now(),
        })
    }

    /// Number of features (dimensionality).
    pub fn dimension(&self) -> usize {
        self.features.len()
    }

    /// Whether this embedding is safe to feed into similarity computation.
    pub fn is_valid(&self) -> bool {
        validate_features(&self.features).is_ok()
    }
}

fn validate_features(features: &[f32]) -> Result<()> {
    if features.is_empty() {
        return Err(VoiceIdError::InvalidEmbedding(
            "empty feature vector".to_string(),
        ));
    }
    if let Some(idx) = features.iter().position(|f| !f.is_finite()) {
        return Err(VoiceIdError::InvalidEmbedding(format!(
            "non-finite feature at index {}",
            idx
        )));
    }
    Ok(())
}

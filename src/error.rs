// Error taxonomy for the speaker identification core
//
// No variant here is fatal: identification always produces a result, and a
// registry that cannot load degrades to an empty one instead of aborting.

use thiserror::Error;

/// Errors surfaced by the speaker identification core.
#[derive(Debug, Error)]
pub enum VoiceIdError {
    /// Two embeddings of different dimensionality were compared where equal
    /// lengths are a hard precondition (cosine similarity).
    #[error("embedding dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// An embedding was empty or contained non-finite features. Rejected at
    /// the ingestion boundary; never reaches matching logic.
    #[error("invalid embedding: {0}")]
    InvalidEmbedding(String),

    /// A signature carried a non-positive or non-finite scalar feature, or
    /// an energy distribution of the wrong length. Rejected at the ingestion
    /// boundary like an invalid embedding.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Reading or writing the durable speaker snapshot failed. Write failures
    /// are retryable; the in-memory registry is rolled back first.
    #[error("speaker snapshot persistence failed: {0}")]
    Persistence(String),

    /// The external feature extractor could not produce an embedding from
    /// the audio. The caller skips identification for that segment.
    #[error("embedding extraction failed: {0}")]
    Extraction(String),
}

pub type Result<T> = std::result::Result<T, VoiceIdError>;

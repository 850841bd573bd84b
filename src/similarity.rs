// Similarity engine: pure functions over embeddings and signatures
//
// Everything here is stateless and deterministic for identical inputs.
// Callers are responsible for rejecting invalid embeddings before they get
// here; see `Embedding::new`.

use crate::config::SimilarityWeights;
use crate::embedding::Embedding;
use crate::error::{Result, VoiceIdError};
use crate::signature::VoiceSignature;

/// Cosine similarity between two equal-length feature vectors, in [-1, 1].
///
/// Fails with `DimensionMismatch` if the lengths differ. Returns 0.0 when
/// either vector has zero magnitude instead of dividing by zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(VoiceIdError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot_product / (norm_a * norm_b))
}

/// Euclidean distance between two feature vectors.
///
/// Returns `INFINITY` on dimension mismatch so ranking callers can treat the
/// pair as infinitely dissimilar instead of handling an error.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }

    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Closeness of two non-negative scalars: `1 - |x - y| / max(x, y)`, clamped
/// to [0, 1]. Defined as 1.0 when both values are zero.
pub fn scalar_closeness(x: f32, y: f32) -> f32 {
    let max = x.max(y);
    if max == 0.0 {
        return 1.0;
    }
    (1.0 - (x - y).abs() / max).clamp(0.0, 1.0)
}

/// Multi-factor similarity between two voice signatures, in [0, 1].
///
/// Weighted combination of embedding cosine similarity, pitch closeness,
/// spectral-centroid (timbre) closeness and speech-rate closeness. Negative
/// cosine values contribute 0 so the result stays in [0, 1].
pub fn signature_similarity(
    a: &VoiceSignature,
    b: &VoiceSignature,
    weights: &SimilarityWeights,
) -> Result<f32> {
    let embedding_sim = embedding_similarity(&a.embedding, &b.embedding)?.max(0.0);
    let pitch_sim = scalar_closeness(a.fundamental_frequency, b.fundamental_frequency);
    let timbre_sim = scalar_closeness(a.spectral_centroid, b.spectral_centroid);
    let rate_sim = scalar_closeness(a.speech_rate, b.speech_rate);

    let score = embedding_sim * weights.embedding
        + pitch_sim * weights.pitch
        + timbre_sim * weights.timbre
        + rate_sim * weights.speech_rate;

    Ok(score.clamp(0.0, 1.0))
}

/// Cosine similarity between two embeddings.
pub fn embedding_similarity(a: &Embedding, b: &Embedding) -> Result<f32> {
    cosine_similarity(&a.features, &b.features)
}

/// Euclidean distance between two embeddings.
pub fn embedding_distance(a: &Embedding, b: &Embedding) -> f32 {
    euclidean_distance(&a.features, &b.features)
}

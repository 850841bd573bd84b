// Feature extraction boundary
//
// Embedding extraction is an external capability (an ONNX speaker model or
// similar); this crate only defines the seam. Implementations that cannot
// produce an embedding report `Extraction`, and the caller skips
// identification for that segment rather than aborting the session.

use crate::embedding::Embedding;
use crate::error::Result;

/// Produces a voice embedding from raw audio samples.
pub trait FeatureExtractor: Send {
    /// Extract a fixed-length embedding from mono f32 samples.
    ///
    /// Fails with `VoiceIdError::Extraction` on unusable audio and with
    /// `VoiceIdError::InvalidEmbedding` if the model emits a degenerate
    /// vector; neither outcome is fatal to the session.
    fn extract(&mut self, samples: &[f32], sample_rate: u32) -> Result<Embedding>;
}

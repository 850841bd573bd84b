// VoiceID - Speaker identification and clustering core
//
// Tracks distinct human speakers across recorded meetings using short voice
// embeddings, entirely on-device. This crate covers:
// - Voice embeddings and multi-factor voice signatures
// - Pure similarity/distance functions
// - Online per-session clustering with centroid and cohesion tracking
// - A durable, snapshot-persisted speaker registry
// - The per-segment identification decision policy
//
// Audio capture, feature extraction (the embedding model), transcription and
// UI are external collaborators.

pub mod cluster;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod registry;
pub mod signature;
pub mod similarity;
pub mod speaker;

pub use cluster::SessionCluster;
pub use config::{IdentificationConfig, SimilarityWeights};
pub use embedding::Embedding;
pub use engine::{AudioSegmentInfo, IdentificationEngine, SpeakerIdentification};
pub use error::{Result, VoiceIdError};
pub use extractor::FeatureExtractor;
pub use registry::{
    CandidateMatch, JsonSnapshotStore, MemoryStore, RegistryStats, SnapshotStore, SpeakerRegistry,
};
pub use signature::{classify_voice_type, VoiceSignature, VoiceType};
pub use speaker::Speaker;

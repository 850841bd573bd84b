// Session-scoped online speaker clustering
//
// A cluster groups the embeddings of what is believed to be one speaker
// within a single recording session, before a durable identity is assigned
// or confirmed. Clusters grow one embedding at a time and are discarded at
// the end of the session unless promoted into the registry.

use log::debug;
use uuid::Uuid;

use crate::embedding::Embedding;
use crate::similarity::cosine_similarity;

/// An incrementally grown group of embeddings from one session.
#[derive(Debug, Clone)]
pub struct SessionCluster {
    pub id: Uuid,
    /// Registry speaker this cluster is bound to, once identified/promoted.
    pub speaker_id: Option<String>,
    /// Member embeddings, in arrival order.
    pub members: Vec<Embedding>,
    /// Transcript segment ids, one per member, same order.
    pub segment_ids: Vec<String>,
    /// Element-wise mean of all member feature vectors.
    pub centroid: Vec<f32>,
    /// Mean pairwise cosine similarity among members; 1.0 for a singleton.
    pub cohesion: f32,
}

impl SessionCluster {
    /// Create a singleton cluster seeded by one embedding.
    pub fn new(seed: Embedding, segment_id: &str) -> Self {
        let centroid = seed.features.clone();
        let cluster = Self {
            id: Uuid::new_v4(),
            speaker_id: None,
            members: vec![seed],
            segment_ids: vec![segment_id.to_string()],
            centroid,
            cohesion: 1.0,
        };
        debug!("Created session cluster {}", cluster.id);
        cluster
    }

    /// Absorb another embedding into this cluster, refreshing the centroid
    /// and cohesion. Member and segment lists stay in lockstep.
    pub fn add_embedding(&mut self, embedding: Embedding, segment_id: &str) {
        self.members.push(embedding);
        self.segment_ids.push(segment_id.to_string());
        self.recompute_centroid();
        self.recompute_cohesion();
        debug!(
            "Cluster {} grew to {} members (cohesion {:.3})",
            self.id,
            self.members.len(),
            self.cohesion
        );
    }

    /// `1 - cosine(embedding, centroid)`; the primary membership test.
    /// Mismatched dimensions count as maximally distant.
    pub fn distance_to_centroid(&self, embedding: &Embedding) -> f32 {
        match cosine_similarity(&embedding.features, &self.centroid) {
            Ok(sim) => 1.0 - sim,
            Err(_) => f32::INFINITY,
        }
    }

    /// Cosine similarity between an embedding and the centroid; 0.0 on
    /// dimension mismatch.
    pub fn centroid_similarity(&self, embedding: &Embedding) -> f32 {
        cosine_similarity(&embedding.features, &self.centroid).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    // Full recompute; cluster sizes are bounded by one meeting's turn count.
    fn recompute_centroid(&mut self) {
        let dim = self.members[0].features.len();
        let mut centroid = vec![0.0f32; dim];
        for member in &self.members {
            for (acc, f) in centroid.iter_mut().zip(member.features.iter()) {
                *acc += f;
            }
        }
        let n = self.members.len() as f32;
        centroid.iter_mut().for_each(|x| *x /= n);
        self.centroid = centroid;
    }

    // Mean pairwise cosine over all member pairs, O(n^2).
    fn recompute_cohesion(&mut self) {
        let n = self.members.len();
        if n < 2 {
            self.cohesion = 1.0;
            return;
        }

        let mut total = 0.0f32;
        let mut pairs = 0u32;
        for i in 0..n {
            for j in (i + 1)..n {
                let sim = cosine_similarity(
                    &self.members[i].features,
                    &self.members[j].features,
                )
                .unwrap_or(0.0);
                total += sim;
                pairs += 1;
            }
        }
        self.cohesion = (total / pairs as f32).clamp(0.0, 1.0);
    }
}

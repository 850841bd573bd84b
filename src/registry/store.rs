// Snapshot storage backends for the speaker registry
//
// The registry persists as a single JSON snapshot of all speakers, rewritten
// in full on every mutation. The file backend writes to a temp file in the
// same directory and renames it over the old snapshot so a crash mid-write
// can never leave a torn file behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{info, warn};

use crate::error::{Result, VoiceIdError};
use crate::speaker::Speaker;

/// Durable storage for the full speaker snapshot.
///
/// `load` is fail-open: backends report a missing or unreadable snapshot as
/// an empty speaker list so startup never blocks on speaker history.
pub trait SnapshotStore: Send + Sync {
    /// Load the persisted speakers, or an empty list if none exist.
    fn load(&self) -> Vec<Speaker>;
    /// Atomically replace the snapshot with the given speakers.
    fn save(&mut self, speakers: &[Speaker]) -> Result<()>;
}

/// File-backed JSON snapshot store.
pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Default per-user snapshot location.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("voiceid")
            .join("speakers.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn load(&self) -> Vec<Speaker> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No speaker snapshot at {:?}, starting empty", self.path);
                return Vec::new();
            }
            Err(e) => {
                warn!(
                    "Failed to read speaker snapshot {:?}: {}, starting empty",
                    self.path, e
                );
                return Vec::new();
            }
        };

        match serde_json::from_slice::<Vec<Speaker>>(&data) {
            Ok(speakers) => {
                info!("Loaded {} speakers from {:?}", speakers.len(), self.path);
                speakers
            }
            Err(e) => {
                warn!(
                    "Speaker snapshot {:?} is corrupt ({}), starting empty",
                    self.path, e
                );
                Vec::new()
            }
        }
    }

    fn save(&mut self, speakers: &[Speaker]) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| VoiceIdError::Persistence("snapshot path has no parent".to_string()))?;
        fs::create_dir_all(parent)
            .map_err(|e| VoiceIdError::Persistence(format!("create {:?}: {}", parent, e)))?;

        let json = serde_json::to_vec_pretty(speakers)
            .map_err(|e| VoiceIdError::Persistence(format!("serialize snapshot: {}", e)))?;

        // Temp file must live in the same directory for the rename to be
        // atomic on the same filesystem.
        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut tmp = fs::File::create(&tmp_path)
                .map_err(|e| VoiceIdError::Persistence(format!("create {:?}: {}", tmp_path, e)))?;
            tmp.write_all(&json)
                .map_err(|e| VoiceIdError::Persistence(format!("write snapshot: {}", e)))?;
            tmp.sync_all()
                .map_err(|e| VoiceIdError::Persistence(format!("sync snapshot: {}", e)))?;
        }
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            VoiceIdError::Persistence(format!("replace snapshot {:?}: {}", self.path, e))
        })?;

        Ok(())
    }
}

/// In-memory store for tests and ephemeral registries.
#[derive(Default)]
pub struct MemoryStore {
    speakers: Vec<Speaker>,
    fail_saves: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared flag that makes `save` fail while set. Lets tests trigger
    /// write failures after the registry has taken ownership of the store.
    pub fn failure_flag(&self) -> Arc<AtomicBool> {
        self.fail_saves.clone()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Vec<Speaker> {
        self.speakers.clone()
    }

    fn save(&mut self, speakers: &[Speaker]) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(VoiceIdError::Persistence(
                "simulated write failure".to_string(),
            ));
        }
        self.speakers = speakers.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::Embedding;
    use crate::signature::VoiceSignature;
    use chrono::Utc;
    use tempfile::tempdir;

    fn make_speaker() -> Speaker {
        Speaker::new(VoiceSignature {
            embedding: Embedding {
                features: vec![0.1, 0.2, 0.3],
                model_version: "test-v1".to_string(),
                extracted_at: Utc::now(),
            },
            fundamental_frequency: 120.0,
            spectral_centroid: 1500.0,
            formants: vec![700.0],
            speech_rate: 150.0,
            energy_distribution: vec![0.125; 8],
        })
    }

    #[test]
    fn test_missing_snapshot_loads_empty() {
        let dir = tempdir().unwrap();
        let store = JsonSnapshotStore::new(dir.path().join("speakers.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let mut store = JsonSnapshotStore::new(dir.path().join("speakers.json"));

        let speaker = make_speaker();
        store.save(&[speaker.clone()]).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0], speaker);
    }

    #[test]
    fn test_corrupt_snapshot_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("speakers.json");
        // Truncated JSON
        fs::write(&path, b"[{\"id\": \"abc").unwrap();

        let store = JsonSnapshotStore::new(&path);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_replaces_corrupt_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("speakers.json");
        fs::write(&path, b"not json at all").unwrap();

        let mut store = JsonSnapshotStore::new(&path);
        store.save(&[make_speaker()]).unwrap();

        assert_eq!(store.load().len(), 1);
        // No temp file left behind
        assert!(!path.with_extension("json.tmp").exists());
    }
}

// JSON file store for the per-user resume snapshot.

use crate::domain::ports::SnapshotStore;
use crate::domain::{LocalSnapshot, PlayerPosition};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotFile {
    position: PositionRecord,
    energy: f64,
    hull: u32,
    session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct PositionRecord {
    x: f32,
    y: f32,
    #[serde(default)]
    rotation: f32,
}

impl From<&LocalSnapshot> for SnapshotFile {
    fn from(snapshot: &LocalSnapshot) -> Self {
        Self {
            position: PositionRecord {
                x: snapshot.position.x,
                y: snapshot.position.y,
                rotation: snapshot.position.rotation,
            },
            energy: snapshot.energy,
            hull: snapshot.hull,
            session_id: snapshot.session_id.clone(),
        }
    }
}

impl From<SnapshotFile> for LocalSnapshot {
    fn from(file: SnapshotFile) -> Self {
        Self {
            position: PlayerPosition {
                x: file.position.x,
                y: file.position.y,
                rotation: file.position.rotation,
            },
            energy: file.energy,
            hull: file.hull,
            session_id: file.session_id,
        }
    }
}

/// Stores one `{user_id}.json` per user under `dir`.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, user_id: &str) -> PathBuf {
        // User ids come from config; keep them from escaping the directory.
        let safe: String = user_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load(&self, user_id: &str) -> Result<Option<LocalSnapshot>, String> {
        let path = self.path_for(user_id);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };
        let file: SnapshotFile = serde_json::from_slice(&raw)
            .map_err(|e| format!("corrupt snapshot {}: {e}", path.display()))?;
        Ok(Some(file.into()))
    }

    async fn save(&self, user_id: &str, snapshot: &LocalSnapshot) -> Result<(), String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| format!("failed to create {}: {e}", self.dir.display()))?;
        let body = serde_json::to_vec_pretty(&SnapshotFile::from(snapshot))
            .map_err(|e| format!("failed to encode snapshot: {e}"))?;

        // Write then rename so a crash never leaves a half-written snapshot.
        let path = self.path_for(user_id);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| format!("failed to write {}: {e}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| format!("failed to replace {}: {e}", path.display()))
    }
}

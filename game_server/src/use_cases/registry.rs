// Session orchestration for spawning and retiring session worlds.

use crate::domain::tuning::world::WorldTuning;
use crate::use_cases::accounts::AccountService;
use crate::use_cases::session::{SessionTaskConfig, session_task};
use crate::use_cases::types::{SessionEvent, SessionFrame, SessionUpdate};
use axum::extract::ws::Utf8Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Notify, RwLock, broadcast, mpsc, watch};
use tracing::info;

/// Shared configuration for spawning session worlds.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Capacity for inbound player events.
    pub input_channel_capacity: usize,
    /// Capacity for broadcast session updates.
    pub update_broadcast_capacity: usize,
    /// How often every connection receives a full snapshot.
    pub snapshot_interval: Duration,
    pub tuning: WorldTuning,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session already exists")]
    AlreadyExists,
}

/// Per-session channels.
#[derive(Clone)]
pub struct SessionHandle {
    pub session_id: Arc<str>,
    /// Sender for player events into the session task.
    pub input_tx: mpsc::Sender<SessionEvent>,
    /// Raw updates produced by the session task.
    pub update_tx: broadcast::Sender<SessionUpdate>,
    /// Serialized updates, shared across all connections.
    pub frame_tx: broadcast::Sender<SessionFrame>,
    /// Latest serialized snapshot for lag recovery.
    pub latest_snapshot_tx: watch::Sender<Utf8Bytes>,
}

struct SessionEntry {
    handle: SessionHandle,
    connections: usize,
    /// Pinned sessions survive their last disconnect.
    pinned: bool,
    shutdown: Arc<Notify>,
}

/// Thread-safe registry for active sessions.
pub struct SessionRegistry {
    settings: SessionSettings,
    accounts: Arc<AccountService>,
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new(settings: SessionSettings, accounts: Arc<AccountService>) -> Self {
        Self {
            settings,
            accounts,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a new session and spawns its world task.
    pub async fn create_session(
        &self,
        session_id: String,
        pinned: bool,
    ) -> Result<SessionHandle, SessionError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session_id) {
            return Err(SessionError::AlreadyExists);
        }

        let (input_tx, input_rx) =
            mpsc::channel::<SessionEvent>(self.settings.input_channel_capacity);
        let (update_tx, _update_rx) =
            broadcast::channel::<SessionUpdate>(self.settings.update_broadcast_capacity);
        let (frame_tx, _frame_rx) =
            broadcast::channel::<SessionFrame>(self.settings.update_broadcast_capacity);
        let (latest_snapshot_tx, _latest_rx) = watch::channel(Utf8Bytes::from(""));
        let shutdown = Arc::new(Notify::new());

        let id: Arc<str> = Arc::from(session_id.as_str());
        tokio::spawn(session_task(
            id.clone(),
            input_rx,
            update_tx.clone(),
            self.accounts.clone(),
            SessionTaskConfig {
                snapshot_interval: self.settings.snapshot_interval,
                tuning: self.settings.tuning,
                seed: None,
            },
            shutdown.clone(),
        ));

        let handle = SessionHandle {
            session_id: id,
            input_tx,
            update_tx,
            frame_tx,
            latest_snapshot_tx,
        };
        sessions.insert(
            session_id.clone(),
            SessionEntry {
                handle: handle.clone(),
                connections: 0,
                pinned,
                shutdown,
            },
        );
        info!(%session_id, pinned, "session created");
        Ok(handle)
    }

    pub async fn get_session(&self, session_id: &str) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).map(|entry| entry.handle.clone())
    }

    /// Counts a live connection. `None` when the session vanished in the meantime.
    pub async fn register_connection(&self, session_id: &str) -> Option<usize> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(session_id)?;
        entry.connections += 1;
        Some(entry.connections)
    }

    /// Drops a connection; unpinned sessions stop with their last one.
    pub async fn register_disconnect(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        let Some(entry) = sessions.get_mut(session_id) else {
            return;
        };
        entry.connections = entry.connections.saturating_sub(1);
        if entry.connections > 0 || entry.pinned {
            return;
        }
        if let Some(entry) = sessions.remove(session_id) {
            entry.shutdown.notify_one();
            info!(%session_id, "session removed after last disconnect");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{FakeVerifier, RecordingStore};

    fn registry() -> SessionRegistry {
        let accounts = Arc::new(AccountService::new(
            Arc::new(RecordingStore::new()),
            Arc::new(FakeVerifier::default()),
        ));
        SessionRegistry::new(
            SessionSettings {
                input_channel_capacity: 8,
                update_broadcast_capacity: 8,
                snapshot_interval: Duration::from_secs(60),
                tuning: WorldTuning::default(),
            },
            accounts,
        )
    }

    #[tokio::test]
    async fn duplicate_session_is_rejected() {
        let registry = registry();

        registry
            .create_session("a".into(), false)
            .await
            .expect("first create");

        assert!(matches!(
            registry.create_session("a".into(), false).await,
            Err(SessionError::AlreadyExists)
        ));
    }

    #[tokio::test]
    async fn unpinned_session_is_removed_after_last_disconnect() {
        let registry = registry();
        registry.create_session("a".into(), false).await.expect("create");

        assert_eq!(registry.register_connection("a").await, Some(1));
        assert_eq!(registry.register_connection("a").await, Some(2));
        registry.register_disconnect("a").await;
        assert!(registry.get_session("a").await.is_some());
        registry.register_disconnect("a").await;

        assert!(registry.get_session("a").await.is_none());
        assert_eq!(registry.register_connection("a").await, None);
    }

    #[tokio::test]
    async fn pinned_session_survives_disconnects() {
        let registry = registry();
        registry.create_session("default".into(), true).await.expect("create");

        registry.register_connection("default").await;
        registry.register_disconnect("default").await;

        assert!(registry.get_session("default").await.is_some());
    }
}

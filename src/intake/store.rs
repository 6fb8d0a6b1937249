//! In-memory session store.
//!
//! Maps session ids to their [`SessionState`]. The map lock is only held long
//! enough to look up or insert an entry; each session sits behind its own
//! mutex, so work on one session never waits on another while messages for
//! the same session are handled one at a time.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use super::state::SessionState;

/// Shared handle to one session's state.
pub type SessionHandle = Arc<Mutex<SessionState>>;

/// Process-wide, non-durable session map.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Get the session for `session_id`, creating a blank one if absent.
    pub async fn get_or_create(&self, session_id: &str) -> SessionHandle {
        if let Some(handle) = self.sessions.read().await.get(session_id) {
            return Arc::clone(handle);
        }

        let mut sessions = self.sessions.write().await;
        // Another request may have created it between the two locks.
        let handle = sessions.entry(session_id.to_string()).or_insert_with(|| {
            info!(session_id = %session_id, "Session created");
            Arc::new(Mutex::new(SessionState::new(session_id)))
        });
        Arc::clone(handle)
    }

    /// Look up a session without creating it.
    pub async fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Discard a session. Returns whether one existed.
    pub async fn reset(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            info!(session_id = %session_id, "Session reset");
        } else {
            debug!(session_id = %session_id, "Reset of unknown session");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

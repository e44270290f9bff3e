//! In-process registry of open workflow sessions, one per user.
//!
//! Each session sits behind its own mutex. A handler holds the lock for the
//! whole transition, so a second Next/Skip/Submit for the same user waits
//! until the first one has saved and moved the step.
//!
//! Sessions not touched within the idle timeout are dropped: lazily on
//! lookup, and in a sweep on every insert.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::profile::workflow::WorkflowSession;

pub type SharedSession = Arc<Mutex<WorkflowSession>>;

struct Entry {
    session: SharedSession,
    last_touched: Instant,
}

impl Entry {
    fn is_idle(&self, now: Instant, timeout: Duration) -> bool {
        now.duration_since(self.last_touched) >= timeout
    }
}

pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Entry>>,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Stores `session`, replacing any session the user already had.
    pub async fn insert(&self, session: WorkflowSession) -> SharedSession {
        let user_id = session.auth().user_id;
        let shared = Arc::new(Mutex::new(session));
        let now = Instant::now();

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_idle(now, self.idle_timeout));
        let swept = before - sessions.len();
        if swept > 0 {
            debug!(swept, "Dropped idle workflow sessions");
        }

        sessions.insert(
            user_id,
            Entry {
                session: shared.clone(),
                last_touched: now,
            },
        );
        shared
    }

    /// The user's session, refreshing its idle clock. An idle session is
    /// dropped and reported as missing.
    pub async fn get(&self, user_id: Uuid) -> Option<SharedSession> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&user_id)?;
        if entry.is_idle(now, self.idle_timeout) {
            sessions.remove(&user_id);
            debug!(%user_id, "Workflow session expired");
            return None;
        }
        entry.last_touched = now;
        Some(entry.session.clone())
    }

    pub async fn remove(&self, user_id: Uuid) -> bool {
        self.sessions.write().await.remove(&user_id).is_some()
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

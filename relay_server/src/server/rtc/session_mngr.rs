use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::peer_session::PeerSession;
use crate::debug;

/// Live sessions keyed by session id.
#[derive(Default)]
pub struct SessionMngr {
    sessions: RwLock<HashMap<String, Arc<PeerSession>>>,
}

impl SessionMngr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capacity check and insert happen under one write lock.
    pub async fn try_insert(&self, session: Arc<PeerSession>, limit: usize) -> bool {
        let mut sessions = self.sessions.write().await;
        if sessions.len() >= limit {
            return false;
        }
        debug!("add session: {}", &session.session_id);
        sessions.insert(session.session_id.clone(), session);
        true
    }

    pub async fn remove(&self, session_id: &str) -> Option<Arc<PeerSession>> {
        self.sessions.write().await.remove(session_id)
    }

    pub async fn get(&self, session_id: &str) -> Option<Arc<PeerSession>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub async fn drain(&self) -> Vec<Arc<PeerSession>> {
        self.sessions
            .write()
            .await
            .drain()
            .map(|(_, session)| session)
            .collect()
    }
}

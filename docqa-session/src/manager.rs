use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::pipeline::QaPipeline;
use crate::session::{Session, SessionId};

/// Owns every live [`Session`], keyed by an opaque [`SessionId`].
///
/// Cloning is cheap and clones share the same sessions. All sessions share
/// one [`QaPipeline`].
#[derive(Clone)]
pub struct SessionManager {
    pipeline: Arc<QaPipeline>,
    sessions: Arc<RwLock<HashMap<SessionId, Arc<Session>>>>,
}

impl SessionManager {
    pub fn new(pipeline: Arc<QaPipeline>) -> Self {
        Self { pipeline, sessions: Arc::new(RwLock::new(HashMap::new())) }
    }

    pub fn pipeline(&self) -> &Arc<QaPipeline> {
        &self.pipeline
    }

    /// Create an empty session under a fresh random id.
    pub async fn create_session(&self) -> Arc<Session> {
        let session_id = Uuid::new_v4().to_string();
        let session = Arc::new(Session::new(session_id.clone(), Arc::clone(&self.pipeline)));
        self.sessions.write().await.insert(session_id.clone(), Arc::clone(&session));
        info!(session.id = %session_id, "session created");
        session
    }

    /// Return the session for `session_id`, creating it on first contact.
    pub async fn get_or_create(&self, session_id: &str) -> Arc<Session> {
        if let Some(session) = self.get(session_id).await {
            return session;
        }
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(session_id.to_string()).or_insert_with(|| {
            info!(session.id = %session_id, "session created");
            Arc::new(Session::new(session_id, Arc::clone(&self.pipeline)))
        });
        Arc::clone(session)
    }

    pub async fn get(&self, session_id: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Clear the session's document and forget the session.
    ///
    /// Returns `false` if no such session exists.
    pub async fn clear_session(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id);
        match removed {
            Some(session) => {
                session.clear().await;
                info!(session.id = %session_id, "session removed");
                true
            }
            None => false,
        }
    }

    pub async fn has_session(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

//! Chat session cache

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use crate::models::chat::{ChatSession, ChatTurn};

/// In-memory chat session store
pub struct SessionCache {
    entries: RwLock<HashMap<String, ChatSession>>,
    capacity: u64,
}

impl SessionCache {
    /// Create a new session cache
    pub fn new(capacity: u64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Get a session by id
    pub fn get(&self, session_id: &str) -> Option<ChatSession> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(session_id).cloned()
    }

    /// Insert a session
    pub fn insert(&self, session: ChatSession) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());

        // A full cache drops its least recently active session first
        if entries.len() as u64 >= self.capacity && !entries.contains_key(&session.id) {
            if let Some(oldest_id) = entries
                .values()
                .min_by_key(|s| s.last_active_at)
                .map(|s| s.id.clone())
            {
                entries.remove(&oldest_id);
            }
        }

        entries.insert(session.id.clone(), session);
    }

    /// Refresh a session's last-activity timestamp
    pub fn touch(&self, session_id: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if let Some(session) = entries.get_mut(session_id) {
            session.touch();
        }
    }

    /// Append a turn to a session's transcript
    pub fn push_turn(&self, session_id: &str, turn: ChatTurn) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if let Some(session) = entries.get_mut(session_id) {
            session.push_turn(turn);
        }
    }

    /// Associate a deployment with a session
    pub fn set_deployment(&self, session_id: &str, deployment_id: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if let Some(session) = entries.get_mut(session_id) {
            session.deployment_id = Some(deployment_id.to_string());
        }
    }

    /// Remove a session
    pub fn remove(&self, session_id: &str) -> Option<ChatSession> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(session_id)
    }

    /// Evict sessions idle longer than `max_idle`. Returns how many were
    /// removed.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let cutoff = chrono::Utc::now() - chrono::Duration::seconds(max_idle.as_secs() as i64);
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, s| s.last_active_at >= cutoff);
        before - entries.len()
    }

    /// IDs of all cached sessions
    pub fn keys(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.keys().cloned().collect()
    }

    /// Number of cached sessions
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache = SessionCache::new(2);
        let mut old = ChatSession::new("sess-old");
        old.last_active_at = chrono::Utc::now() - chrono::Duration::seconds(60);
        cache.insert(old);
        cache.insert(ChatSession::new("sess-mid"));
        cache.insert(ChatSession::new("sess-new"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("sess-old").is_none());
        assert!(cache.get("sess-new").is_some());
    }

    #[test]
    fn test_evict_idle() {
        let cache = SessionCache::new(10);
        let mut idle = ChatSession::new("sess-idle");
        idle.last_active_at = chrono::Utc::now() - chrono::Duration::seconds(3600);
        cache.insert(idle);
        cache.insert(ChatSession::new("sess-live"));

        let evicted = cache.evict_idle(Duration::from_secs(1800));
        assert_eq!(evicted, 1);
        assert!(cache.get("sess-idle").is_none());
        assert!(cache.get("sess-live").is_some());
    }

    #[test]
    fn test_push_turn_updates_activity() {
        let cache = SessionCache::new(10);
        cache.insert(ChatSession::new("sess-1"));
        cache.push_turn("sess-1", ChatTurn::user("hello"));

        let session = cache.get("sess-1").unwrap();
        assert_eq!(session.turns.len(), 1);
        assert!(session.last_active_at >= session.created_at);
    }
}

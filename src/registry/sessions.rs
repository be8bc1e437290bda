use std::collections::HashMap;

use uuid::Uuid;

use crate::time::{self, SharedClock};

use super::UserId;

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub expires_at: i64,
    pub created_at: i64,
}

/// Token-keyed login sessions held in memory.
pub struct SessionStore {
    sessions: HashMap<String, Session>,
    clock: SharedClock,
}

impl SessionStore {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            sessions: HashMap::new(),
            clock,
        }
    }

    pub fn create(&mut self, user_id: UserId, expiry_hours: i64) -> Session {
        let token = Uuid::new_v4().to_string();
        let created_at = time::unix_now(&*self.clock);
        let expires_at = created_at.saturating_add(expiry_hours.saturating_mul(3600));

        let session = Session {
            token: token.clone(),
            user_id,
            expires_at,
            created_at,
        };
        self.sessions.insert(token, session.clone());

        session
    }

    /// Only sessions that have not yet expired are returned.
    pub fn get_by_token(&self, token: &str) -> Option<&Session> {
        let now = time::unix_now(&*self.clock);

        self.sessions
            .get(token)
            .filter(|session| session.expires_at > now)
    }

    pub fn delete(&mut self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    /// Returns how many sessions were dropped.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = time::unix_now(&*self.clock);
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.expires_at > now);

        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

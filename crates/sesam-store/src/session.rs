//! Session persistence over a TTL key-value backend.

use chrono::Utc;
use sesam_core::error::{SesamError, SesamResult};
use sesam_core::models::session::{Session, SessionKind};
use sesam_core::models::user::{User, UserId};
use sesam_core::store::SessionStore;

use crate::error::StoreError;
use crate::kv::KvBackend;

fn session_key(kind: SessionKind, token: &str) -> String {
    format!("{kind}:{token}")
}

/// [`SessionStore`] over any [`KvBackend`]. Sessions are stored as
/// JSON under `"<kind>:<token>"` with the backend's TTL carrying the
/// expiry, so the store never has to garbage-collect anything itself.
#[derive(Clone)]
pub struct KvSessionStore<B> {
    backend: B,
}

impl<B: KvBackend> KvSessionStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Scan the kind's key space and decode every live session.
    /// Values that vanish mid-scan or fail to decode are skipped.
    async fn scan(&self, kind: SessionKind) -> SesamResult<Vec<Session>> {
        let keys = self.backend.keys(&format!("{kind}:*")).await?;

        let mut sessions = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(payload) = self.backend.get(&key).await? else {
                continue;
            };
            match serde_json::from_str::<Session>(&payload) {
                Ok(session) => sessions.push(session),
                // Keys embed tokens, so the log carries only the error.
                Err(err) => tracing::warn!(error = %err, "skipping undecodable session value"),
            }
        }
        Ok(sessions)
    }
}

impl<B: KvBackend> SessionStore for KvSessionStore<B> {
    async fn get(&self, kind: SessionKind, token: &str) -> SesamResult<Option<Session>> {
        let Some(payload) = self.backend.get(&session_key(kind, token)).await? else {
            return Ok(None);
        };
        let session = serde_json::from_str(&payload).map_err(StoreError::Codec)?;
        Ok(Some(session))
    }

    async fn put(&self, session: &Session) -> SesamResult<()> {
        let ttl_ms = (session.expires_at - Utc::now()).num_milliseconds();
        if ttl_ms <= 0 {
            return Err(StoreError::InvalidExpiry { ttl_ms }.into());
        }

        let payload = serde_json::to_string(session).map_err(StoreError::Codec)?;
        self.backend
            .set(&session_key(session.kind, &session.token), &payload, ttl_ms as u64)
            .await?;
        Ok(())
    }

    async fn delete(&self, kind: SessionKind, token: &str) -> SesamResult<()> {
        self.backend.del(&session_key(kind, token)).await?;
        Ok(())
    }

    async fn find_all_by_user(&self, user_id: UserId, kind: SessionKind) -> SesamResult<Vec<Session>> {
        let mut sessions = self.scan(kind).await?;
        sessions.retain(|s| s.owner_id() == Some(user_id));
        Ok(sessions)
    }

    async fn update_by_user(
        &self,
        user_id: UserId,
        kind: SessionKind,
        snapshot: &User,
    ) -> SesamResult<usize> {
        let mut updated = 0;
        for mut session in self.find_all_by_user(user_id, kind).await? {
            session.user = Some(snapshot.clone());
            match self.put(&session).await {
                Ok(()) => updated += 1,
                // The session ran out between the scan and the write.
                Err(SesamError::InvalidExpiry { .. }) => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(updated)
    }

    async fn delete_by_user(&self, user_id: UserId, kind: SessionKind) -> SesamResult<usize> {
        let sessions = self.find_all_by_user(user_id, kind).await?;
        let mut deleted = 0;
        for session in &sessions {
            self.delete(kind, &session.token).await?;
            deleted += 1;
        }
        Ok(deleted)
    }
}

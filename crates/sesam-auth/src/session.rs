//! Session lifecycle and the single-session policy.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use sesam_core::error::SesamResult;
use sesam_core::models::session::{
    INFO_USER_ID, SESSION_TTL_HOURS, Session, SessionKind, token_preview,
};
use sesam_core::models::user::{User, UserId};
use sesam_core::store::SessionStore;
use tokio::sync::Mutex;
use tracing::debug;

/// Registry of per-user locks.
///
/// Session mutations for one user serialize on the user's entry so
/// that concurrent logins, or a login racing a logout, cannot
/// interleave their delete-then-insert sequences. Entries are tiny
/// and never evicted. The guarantee holds within one process; across
/// processes the session store is last-writer-wins.
#[derive(Default)]
struct UserLocks {
    locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    async fn for_user(&self, user_id: UserId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(locks.entry(user_id).or_default())
    }
}

/// Session lifecycle service enforcing the one-live-session policy.
///
/// Generic over the session store implementation so that the policy
/// layer has no dependency on the storage crate.
pub struct SessionService<S: SessionStore> {
    store: S,
    locks: UserLocks,
}

impl<S: SessionStore> SessionService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: UserLocks::default(),
        }
    }

    /// Open a login session for the user, replacing any they already
    /// hold. Replacement is delete-then-insert under the user's lock,
    /// so each user ends up with at most one live login session.
    pub async fn create_session(&self, user: &User, token: String) -> SesamResult<Session> {
        let _guard = self.locks.for_user(user.id).await.lock_owned().await;

        let replaced = self.store.delete_by_user(user.id, SessionKind::Login).await?;
        if replaced > 0 {
            debug!(user_id = user.id, replaced, "replaced existing login sessions");
        }

        // The embedded snapshot never carries the credential digest.
        let mut snapshot = user.clone();
        snapshot.password_hash = String::new();

        let mut info = serde_json::Map::new();
        info.insert(INFO_USER_ID.into(), serde_json::json!(user.id));

        let session = Session {
            token,
            kind: SessionKind::Login,
            expires_at: Utc::now() + Duration::hours(SESSION_TTL_HOURS),
            info,
            user: Some(snapshot),
        };
        self.store.put(&session).await?;

        debug!(
            user_id = user.id,
            token = token_preview(&session.token),
            "session created"
        );
        Ok(session)
    }

    pub async fn get_session(&self, token: &str) -> SesamResult<Option<Session>> {
        self.store.get(SessionKind::Login, token).await
    }

    /// Slide the session's expiry out to a fresh TTL.
    ///
    /// Returns `Ok(None)` when the token no longer resolves. The
    /// session is re-read under its owner's lock so a renewal cannot
    /// resurrect a session that a concurrent logout just removed.
    pub async fn extend_session(&self, token: &str) -> SesamResult<Option<Session>> {
        let Some(session) = self.get_session(token).await? else {
            return Ok(None);
        };

        // A session without a recorded owner has no lock to serialize on.
        let _guard = match session.owner_id() {
            Some(user_id) => Some(self.locks.for_user(user_id).await.lock_owned().await),
            None => None,
        };

        let Some(mut session) = self.get_session(token).await? else {
            return Ok(None);
        };
        session.expires_at = Utc::now() + Duration::hours(SESSION_TTL_HOURS);
        self.store.put(&session).await?;

        debug!(token = token_preview(token), "session extended");
        Ok(Some(session))
    }

    /// Close the session. Absent tokens and sessions carrying no user
    /// snapshot are a quiet no-op.
    pub async fn remove_session(&self, token: &str) -> SesamResult<()> {
        let Some(session) = self.get_session(token).await? else {
            return Ok(());
        };
        if session.user.is_none() {
            debug!(
                token = token_preview(token),
                "not removing session without user snapshot"
            );
            return Ok(());
        }

        let _guard = match session.owner_id() {
            Some(user_id) => Some(self.locks.for_user(user_id).await.lock_owned().await),
            None => None,
        };
        self.store.delete(SessionKind::Login, token).await?;

        debug!(token = token_preview(token), "session removed");
        Ok(())
    }

    /// Push a changed user record into every live session it owns,
    /// leaving each session's expiry in place.
    pub async fn sync_user_snapshot(&self, user: &User) -> SesamResult<usize> {
        let _guard = self.locks.for_user(user.id).await.lock_owned().await;

        let mut snapshot = user.clone();
        snapshot.password_hash = String::new();

        let updated = self
            .store
            .update_by_user(user.id, SessionKind::Login, &snapshot)
            .await?;
        debug!(user_id = user.id, updated, "session snapshots refreshed");
        Ok(updated)
    }

    /// Delete every login session the user owns.
    pub async fn purge_user_sessions(&self, user_id: UserId) -> SesamResult<usize> {
        let _guard = self.locks.for_user(user_id).await.lock_owned().await;

        let deleted = self.store.delete_by_user(user_id, SessionKind::Login).await?;
        debug!(user_id, deleted, "sessions purged");
        Ok(deleted)
    }
}

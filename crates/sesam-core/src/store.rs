//! Store trait definitions for data access abstraction.
//!
//! All store operations are async. Lookups return `Ok(None)` for
//! absent records: absence is an expected branch, not an error.

use crate::error::SesamResult;
use crate::models::session::{Session, SessionKind};
use crate::models::user::{NewUser, User, UserId};

/// Filters and pagination for user listings. `page` is 1-based;
/// pagination applies only when both `page` and `limit` are positive.
#[derive(Debug, Clone, Default)]
pub struct ListUsersParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Case-insensitive substring match across name, email, address.
    pub search: Option<String>,
    /// Case-insensitive exact match.
    pub email: Option<String>,
    /// Case-insensitive exact match.
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// User directory (relational store)
// ---------------------------------------------------------------------------

/// Durable directory of user records.
///
/// Read paths exclude soft-deleted rows. Email comparison is
/// case-insensitive everywhere. All writes go through a
/// [`UserUnitOfWork`] obtained from [`UserStore::begin`].
pub trait UserStore: Send + Sync {
    type Uow: UserUnitOfWork;

    fn find_by_id(&self, id: UserId) -> impl Future<Output = SesamResult<Option<User>>> + Send;
    fn find_by_email(&self, email: &str)
    -> impl Future<Output = SesamResult<Option<User>>> + Send;
    fn list(&self, params: ListUsersParams)
    -> impl Future<Output = SesamResult<Vec<User>>> + Send;

    /// Open a unit of work spanning the relational operations of one
    /// logical request.
    fn begin(&self) -> impl Future<Output = SesamResult<Self::Uow>> + Send;
}

/// A scoped relational transaction.
///
/// Consumed exactly once by [`commit`](UserUnitOfWork::commit) or
/// [`rollback`](UserUnitOfWork::rollback); dropping an unconsumed
/// unit of work rolls it back. The session store is never part of
/// this boundary.
pub trait UserUnitOfWork: Send {
    fn find_by_id(&mut self, id: UserId)
    -> impl Future<Output = SesamResult<Option<User>>> + Send;
    fn find_by_email(
        &mut self,
        email: &str,
    ) -> impl Future<Output = SesamResult<Option<User>>> + Send;

    /// Insert a new user. The store assigns the id and the
    /// created/updated timestamps.
    fn insert(&mut self, input: NewUser) -> impl Future<Output = SesamResult<User>> + Send;

    /// Persist changed profile fields and the digest. Stamps
    /// `updated_at` from the store clock; `updated_by` is taken from
    /// the passed record. Fails with `NotFound` for missing or
    /// deleted rows.
    fn update(&mut self, user: &User) -> impl Future<Output = SesamResult<User>> + Send;

    /// Soft-delete: marks the row deleted, leaving it in place.
    fn soft_delete(
        &mut self,
        id: UserId,
        deleted_by: UserId,
    ) -> impl Future<Output = SesamResult<()>> + Send;

    fn commit(self) -> impl Future<Output = SesamResult<()>> + Send;
    fn rollback(self) -> impl Future<Output = SesamResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Session store (key-value store with TTL)
// ---------------------------------------------------------------------------

/// Ephemeral store of active sessions, keyed by `(kind, token)`.
///
/// Expiry is enforced by the underlying store's TTL: an expired key
/// is indistinguishable from one that never existed. There is no
/// native index from user id to token, so the per-user operations
/// scan the kind's whole key space and are best-effort under
/// concurrent writes.
pub trait SessionStore: Send + Sync {
    fn get(
        &self,
        kind: SessionKind,
        token: &str,
    ) -> impl Future<Output = SesamResult<Option<Session>>> + Send;

    /// Serialize and write with a TTL of `expires_at - now`. Writes
    /// with a non-positive TTL are rejected with `InvalidExpiry`.
    fn put(&self, session: &Session) -> impl Future<Output = SesamResult<()>> + Send;

    /// Idempotent: deleting an absent key is not an error.
    fn delete(
        &self,
        kind: SessionKind,
        token: &str,
    ) -> impl Future<Output = SesamResult<()>> + Send;

    /// Scan-based lookup of every session of `kind` owned by
    /// `user_id`. O(live sessions of the kind). Values that fail to
    /// decode are skipped, not fatal.
    fn find_all_by_user(
        &self,
        user_id: UserId,
        kind: SessionKind,
    ) -> impl Future<Output = SesamResult<Vec<Session>>> + Send;

    /// Rewrite the embedded user snapshot of every matching session,
    /// preserving each session's expiry. Returns the number updated.
    /// Not atomic across matches: a crash mid-loop leaves some
    /// sessions carrying the old snapshot.
    fn update_by_user(
        &self,
        user_id: UserId,
        kind: SessionKind,
        snapshot: &User,
    ) -> impl Future<Output = SesamResult<usize>> + Send;

    /// Delete every matching session. Returns the number deleted.
    /// Not atomic across matches.
    fn delete_by_user(
        &self,
        user_id: UserId,
        kind: SessionKind,
    ) -> impl Future<Output = SesamResult<usize>> + Send;
}

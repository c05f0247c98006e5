//! In-memory store engines.
//!
//! [`MemoryKv`] and [`MemoryUserStore`] implement the same contracts
//! as the Redis and PostgreSQL engines and back the test suites and
//! local development. Both are process-local and make no durability
//! promises.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sesam_core::error::{SesamError, SesamResult};
use sesam_core::models::user::{NewUser, User, UserId, normalize_email};
use sesam_core::store::{ListUsersParams, UserStore, UserUnitOfWork};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::StoreError;
use crate::kv::KvBackend;

// ---------------------------------------------------------------------------
// Key-value engine
// ---------------------------------------------------------------------------

struct KvEntry {
    value: String,
    deadline: Instant,
}

/// HashMap-backed [`KvBackend`] with lazy TTL expiry: entries are
/// dropped when a read or scan encounters them past their deadline.
/// Deadlines use the tokio clock, so paused-time tests can advance
/// them deterministically.
#[derive(Clone, Default)]
pub struct MemoryKv {
    entries: Arc<Mutex<HashMap<String, KvEntry>>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvBackend for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.deadline <= Instant::now() => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl_ms: u64) -> Result<(), StoreError> {
        let entry = KvEntry {
            value: value.to_string(),
            deadline: Instant::now() + Duration::from_millis(ttl_ms),
        };
        self.entries.lock().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        entries.retain(|_, entry| entry.deadline > now);
        Ok(entries
            .keys()
            .filter(|key| glob_match(pattern, key))
            .cloned()
            .collect())
    }
}

/// Glob matching as the key scan understands it: `*` matches any run
/// of characters, everything else is literal. The session store only
/// ever scans with a single trailing `*`.
fn glob_match(pattern: &str, candidate: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == candidate;
    }

    let segments: Vec<&str> = pattern.split('*').collect();
    let last_idx = segments.len() - 1;

    // The first segment anchors at the start, the last at the end,
    // and the middle ones must appear in order in between.
    let mut rest = match candidate.strip_prefix(segments[0]) {
        Some(rest) => rest,
        None => return false,
    };

    for segment in &segments[1..last_idx] {
        if segment.is_empty() {
            continue;
        }
        match rest.find(segment) {
            Some(pos) => rest = &rest[pos + segment.len()..],
            None => return false,
        }
    }

    let last = segments[last_idx];
    last.is_empty() || rest.ends_with(last)
}

// ---------------------------------------------------------------------------
// User directory engine
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct UserTable {
    rows: HashMap<UserId, User>,
    next_id: UserId,
}

impl Default for UserTable {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
            next_id: 1,
        }
    }
}

fn live<'a>(table: &'a UserTable) -> impl Iterator<Item = &'a User> {
    table.rows.values().filter(|u| u.deleted_at.is_none())
}

fn find_live_by_email(table: &UserTable, email: &str) -> Option<User> {
    let probe = normalize_email(email);
    live(table)
        .find(|u| normalize_email(&u.email) == probe)
        .cloned()
}

/// In-memory [`UserStore`].
///
/// Units of work operate on a full snapshot of the table and swap it
/// back in on commit, so readers never observe uncommitted writes.
/// Concurrent commits are last-writer-wins, which the tests this
/// engine exists for never exercise.
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    table: Arc<Mutex<UserTable>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for MemoryUserStore {
    type Uow = MemoryUserUow;

    async fn find_by_id(&self, id: UserId) -> SesamResult<Option<User>> {
        let table = self.table.lock().await;
        Ok(table.rows.get(&id).filter(|u| u.deleted_at.is_none()).cloned())
    }

    async fn find_by_email(&self, email: &str) -> SesamResult<Option<User>> {
        let table = self.table.lock().await;
        Ok(find_live_by_email(&table, email))
    }

    async fn list(&self, params: ListUsersParams) -> SesamResult<Vec<User>> {
        let table = self.table.lock().await;

        let mut users: Vec<User> = live(&table)
            .filter(|u| match &params.email {
                Some(email) => normalize_email(&u.email) == normalize_email(email),
                None => true,
            })
            .filter(|u| match &params.name {
                Some(name) => u.name.to_lowercase() == name.to_lowercase(),
                None => true,
            })
            .filter(|u| match &params.search {
                Some(search) => {
                    let needle = search.to_lowercase();
                    u.name.to_lowercase().contains(&needle)
                        || u.email.to_lowercase().contains(&needle)
                        || u.address.to_lowercase().contains(&needle)
                }
                None => true,
            })
            .cloned()
            .collect();

        users.sort_by(|a, b| b.id.cmp(&a.id));

        if let (Some(page), Some(limit)) = (params.page, params.limit) {
            if page > 0 && limit > 0 {
                // page and limit arrive unclamped from the query string;
                // their product needs 64 bits. Past usize the page is empty.
                let offset = (u64::from(page) - 1).saturating_mul(u64::from(limit));
                users = users
                    .into_iter()
                    .skip(usize::try_from(offset).unwrap_or(usize::MAX))
                    .take(limit as usize)
                    .collect();
            }
        }

        Ok(users)
    }

    async fn begin(&self) -> SesamResult<MemoryUserUow> {
        let working = self.table.lock().await.clone();
        Ok(MemoryUserUow {
            table: Arc::clone(&self.table),
            working,
        })
    }
}

/// Snapshot-based unit of work for [`MemoryUserStore`]. Dropping it
/// without committing discards the working copy.
pub struct MemoryUserUow {
    table: Arc<Mutex<UserTable>>,
    working: UserTable,
}

impl UserUnitOfWork for MemoryUserUow {
    async fn find_by_id(&mut self, id: UserId) -> SesamResult<Option<User>> {
        Ok(self
            .working
            .rows
            .get(&id)
            .filter(|u| u.deleted_at.is_none())
            .cloned())
    }

    async fn find_by_email(&mut self, email: &str) -> SesamResult<Option<User>> {
        Ok(find_live_by_email(&self.working, email))
    }

    async fn insert(&mut self, input: NewUser) -> SesamResult<User> {
        if find_live_by_email(&self.working, &input.email).is_some() {
            return Err(StoreError::AlreadyExists {
                entity: "user email".into(),
            }
            .into());
        }

        let now = Utc::now();
        let id = self.working.next_id;
        self.working.next_id += 1;

        let user = User {
            id,
            name: input.name,
            email: input.email,
            address: input.address,
            password_hash: input.password_hash,
            created_by: input.created_by,
            created_at: now,
            updated_by: input.created_by,
            updated_at: now,
            deleted_by: None,
            deleted_at: None,
        };
        self.working.rows.insert(id, user.clone());
        Ok(user)
    }

    async fn update(&mut self, user: &User) -> SesamResult<User> {
        let existing = self
            .working
            .rows
            .get(&user.id)
            .filter(|u| u.deleted_at.is_none());
        if existing.is_none() {
            return Err(SesamError::NotFound {
                entity: "user".into(),
                id: user.id.to_string(),
            });
        }

        if let Some(other) = find_live_by_email(&self.working, &user.email) {
            if other.id != user.id {
                return Err(StoreError::AlreadyExists {
                    entity: "user email".into(),
                }
                .into());
            }
        }

        let mut updated = user.clone();
        updated.updated_at = Utc::now();
        self.working.rows.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn soft_delete(&mut self, id: UserId, deleted_by: UserId) -> SesamResult<()> {
        let row = self
            .working
            .rows
            .get_mut(&id)
            .filter(|u| u.deleted_at.is_none());
        let Some(row) = row else {
            return Err(SesamError::NotFound {
                entity: "user".into(),
                id: id.to_string(),
            });
        };

        let now = Utc::now();
        row.deleted_at = Some(now);
        row.deleted_by = Some(deleted_by);
        row.updated_at = now;
        row.updated_by = deleted_by;
        Ok(())
    }

    async fn commit(self) -> SesamResult<()> {
        *self.table.lock().await = self.working;
        Ok(())
    }

    async fn rollback(self) -> SesamResult<()> {
        Ok(())
    }
}

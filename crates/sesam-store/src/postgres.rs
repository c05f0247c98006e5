//! PostgreSQL-backed user directory.

use chrono::{DateTime, Utc};
use sesam_core::error::{SesamError, SesamResult};
use sesam_core::models::user::{NewUser, User, UserId, normalize_email};
use sesam_core::store::{ListUsersParams, UserStore, UserUnitOfWork};
use sqlx::postgres::{PgPool, Postgres};
use sqlx::{QueryBuilder, Transaction};

use crate::error::StoreError;

const USER_COLUMNS: &str = "id, name, email, address, password_hash, \
     created_by, created_at, updated_by, updated_at, deleted_by, deleted_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    address: String,
    password_hash: String,
    created_by: i64,
    created_at: DateTime<Utc>,
    updated_by: i64,
    updated_at: DateTime<Utc>,
    deleted_by: Option<i64>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            address: row.address,
            password_hash: row.password_hash,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_by: row.updated_by,
            updated_at: row.updated_at,
            deleted_by: row.deleted_by,
            deleted_at: row.deleted_at,
        }
    }
}

/// Rows with `deleted_at` set are dead to every query here; the
/// partial unique index on `lower(email)` only covers live rows, so
/// a deleted user's address can be reused.
fn map_unique_violation(err: sqlx::Error) -> SesamError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::AlreadyExists {
                entity: "user email".into(),
            }
            .into();
        }
    }
    StoreError::Sql(err).into()
}

/// [`UserStore`] over a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserStore for PgUserStore {
    type Uow = PgUserUow;

    async fn find_by_id(&self, id: UserId) -> SesamResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Sql)?;
        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> SesamResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = $1 AND deleted_at IS NULL"
        ))
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Sql)?;
        Ok(row.map(User::from))
    }

    async fn list(&self, params: ListUsersParams) -> SesamResult<Vec<User>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {USER_COLUMNS} FROM users WHERE deleted_at IS NULL"
        ));

        if let Some(email) = &params.email {
            qb.push(" AND lower(email) = ");
            qb.push_bind(normalize_email(email));
        }
        if let Some(name) = &params.name {
            qb.push(" AND lower(name) = ");
            qb.push_bind(name.to_lowercase());
        }
        if let Some(search) = &params.search {
            let needle = format!("%{search}%");
            qb.push(" AND (name ILIKE ");
            qb.push_bind(needle.clone());
            qb.push(" OR email ILIKE ");
            qb.push_bind(needle.clone());
            qb.push(" OR address ILIKE ");
            qb.push_bind(needle);
            qb.push(")");
        }

        qb.push(" ORDER BY id DESC");

        if let (Some(page), Some(limit)) = (params.page, params.limit) {
            if page > 0 && limit > 0 {
                // page and limit arrive unclamped from the query string;
                // their product needs 64 bits, and OFFSET binds as i64.
                let offset = (u64::from(page) - 1)
                    .saturating_mul(u64::from(limit))
                    .min(i64::MAX as u64);
                qb.push(" LIMIT ");
                qb.push_bind(limit as i64);
                qb.push(" OFFSET ");
                qb.push_bind(offset as i64);
            }
        }

        let rows: Vec<UserRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::Sql)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn begin(&self) -> SesamResult<PgUserUow> {
        let tx = self.pool.begin().await.map_err(StoreError::Sql)?;
        Ok(PgUserUow { tx })
    }
}

/// Unit of work over a database transaction. Dropping it without
/// committing rolls the transaction back on the next pool checkout.
pub struct PgUserUow {
    tx: Transaction<'static, Postgres>,
}

impl UserUnitOfWork for PgUserUow {
    async fn find_by_id(&mut self, id: UserId) -> SesamResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(StoreError::Sql)?;
        Ok(row.map(User::from))
    }

    async fn find_by_email(&mut self, email: &str) -> SesamResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = $1 AND deleted_at IS NULL"
        ))
        .bind(normalize_email(email))
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(StoreError::Sql)?;
        Ok(row.map(User::from))
    }

    async fn insert(&mut self, input: NewUser) -> SesamResult<User> {
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users (name, email, address, password_hash, created_by, updated_by) \
             VALUES ($1, $2, $3, $4, $5, $5) RETURNING {USER_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.address)
        .bind(&input.password_hash)
        .bind(input.created_by)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_unique_violation)?;
        Ok(row.into())
    }

    async fn update(&mut self, user: &User) -> SesamResult<User> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET name = $1, email = $2, address = $3, password_hash = $4, \
             updated_by = $5, updated_at = now() \
             WHERE id = $6 AND deleted_at IS NULL RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.address)
        .bind(&user.password_hash)
        .bind(user.updated_by)
        .bind(user.id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_unique_violation)?;

        match row {
            Some(row) => Ok(row.into()),
            None => Err(SesamError::NotFound {
                entity: "user".into(),
                id: user.id.to_string(),
            }),
        }
    }

    async fn soft_delete(&mut self, id: UserId, deleted_by: UserId) -> SesamResult<()> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = now(), deleted_by = $1, \
             updated_at = now(), updated_by = $1 \
             WHERE id = $2 AND deleted_at IS NULL",
        )
        .bind(deleted_by)
        .bind(id)
        .execute(&mut *self.tx)
        .await
        .map_err(StoreError::Sql)?;

        if result.rows_affected() == 0 {
            return Err(SesamError::NotFound {
                entity: "user".into(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn commit(self) -> SesamResult<()> {
        self.tx.commit().await.map_err(StoreError::Sql)?;
        Ok(())
    }

    async fn rollback(self) -> SesamResult<()> {
        self.tx.rollback().await.map_err(StoreError::Sql)?;
        Ok(())
    }
}

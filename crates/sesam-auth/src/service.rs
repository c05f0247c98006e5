//! Auth orchestration: login, logout, and account management.

use sesam_core::error::{SesamError, SesamResult};
use sesam_core::models::session::Session;
use sesam_core::models::user::{NewUser, User, UserId, normalize_email};
use sesam_core::store::{ListUsersParams, SessionStore, UserStore, UserUnitOfWork};
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::session::SessionService;
use crate::token;

/// Input for creating a user account.
#[derive(Debug)]
pub struct NewUserInput {
    pub name: String,
    pub email: String,
    pub address: String,
    pub password: String,
}

/// Profile fields that can change; `None` leaves a field as-is.
#[derive(Debug, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Raw opaque session token, handed to the client once.
    pub token: String,
    /// The stored session, user snapshot included.
    pub session: Session,
    /// The authenticated user's directory record.
    pub user: User,
}

/// Authentication and account orchestrator.
///
/// Generic over the store implementations so that the auth layer has
/// no dependency on the storage crate.
pub struct AuthService<U: UserStore, S: SessionStore> {
    users: U,
    sessions: SessionService<S>,
    config: AuthConfig,
}

impl<U: UserStore, S: SessionStore> AuthService<U, S> {
    pub fn new(users: U, sessions: SessionService<S>, config: AuthConfig) -> Self {
        Self {
            users,
            sessions,
            config,
        }
    }

    /// Authenticate with email + password and open a session.
    ///
    /// Unknown email and wrong password collapse into the same
    /// `InvalidCredentials` so responses do not reveal which accounts
    /// exist. This path performs no relational writes.
    pub async fn login(&self, email: &str, password: &str) -> SesamResult<LoginOutput> {
        // 1. Look up the account.
        let user = match self.users.find_by_email(email).await? {
            Some(user) => user,
            None => return Err(AuthError::InvalidCredentials.into()),
        };

        // 2. Verify the password against the stored digest.
        let valid = password::verify_password(
            password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }

        // 3. Mint the token and open the session, replacing any the
        //    user already held.
        let token = token::generate_session_token()?;
        let session = self.sessions.create_session(&user, token).await?;

        info!(user_id = user.id, "login succeeded");
        Ok(LoginOutput {
            token: session.token.clone(),
            session,
            user,
        })
    }

    /// Close the session. Unknown tokens are already logged out.
    pub async fn logout(&self, token: &str) -> SesamResult<()> {
        self.sessions.remove_session(token).await
    }

    /// Resolve a bearer token to its live session, if any.
    pub async fn current_session(&self, token: &str) -> SesamResult<Option<Session>> {
        self.sessions.get_session(token).await
    }

    /// Renew a session's expiry (sliding expiration).
    pub async fn extend_session(&self, token: &str) -> SesamResult<Option<Session>> {
        self.sessions.extend_session(token).await
    }

    /// Create an account. The email must not collide with a live one,
    /// compared case-insensitively.
    pub async fn create_user(&self, actor: UserId, input: NewUserInput) -> SesamResult<User> {
        // 1. Hash the credential before opening the unit of work.
        let password_hash =
            password::hash_password(&input.password, self.config.pepper.as_deref())?;

        // 2. Insert inside a unit of work. The duplicate probe gives
        //    a friendly error; the unique index stays the backstop.
        let mut uow = self.users.begin().await?;
        if uow.find_by_email(&input.email).await?.is_some() {
            return Err(SesamError::AlreadyExists {
                entity: "user email".into(),
            });
        }

        let user = uow
            .insert(NewUser {
                name: input.name,
                email: input.email,
                address: input.address,
                password_hash,
                created_by: actor,
            })
            .await?;
        uow.commit().await?;

        info!(user_id = user.id, created_by = actor, "user created");
        Ok(user)
    }

    pub async fn get_user(&self, id: UserId) -> SesamResult<User> {
        match self.users.find_by_id(id).await? {
            Some(user) => Ok(user),
            None => Err(SesamError::NotFound {
                entity: "user".into(),
                id: id.to_string(),
            }),
        }
    }

    pub async fn list_users(&self, params: ListUsersParams) -> SesamResult<Vec<User>> {
        self.users.list(params).await
    }

    /// Update profile fields, then push the new record into the
    /// user's live sessions. The session refresh runs only after the
    /// relational commit, so a rollback never leaves the snapshots
    /// ahead of the directory.
    pub async fn update_user(
        &self,
        actor: UserId,
        id: UserId,
        update: UserUpdate,
    ) -> SesamResult<User> {
        // 1. Apply the changes inside a unit of work.
        let mut uow = self.users.begin().await?;
        let Some(mut user) = uow.find_by_id(id).await? else {
            return Err(SesamError::NotFound {
                entity: "user".into(),
                id: id.to_string(),
            });
        };

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(email) = update.email {
            // 2. A changed email re-runs the duplicate probe.
            if normalize_email(&email) != normalize_email(&user.email) {
                if uow.find_by_email(&email).await?.is_some() {
                    return Err(SesamError::AlreadyExists {
                        entity: "user email".into(),
                    });
                }
            }
            user.email = email;
        }
        if let Some(address) = update.address {
            user.address = address;
        }
        user.updated_by = actor;

        let updated = uow.update(&user).await?;
        uow.commit().await?;

        // 3. Refresh the embedded snapshots once the commit holds.
        if let Err(err) = self.sessions.sync_user_snapshot(&updated).await {
            warn!(
                user_id = id,
                error = %err,
                "user record committed but session snapshots were not refreshed"
            );
            return Err(err);
        }

        info!(user_id = id, updated_by = actor, "user updated");
        Ok(updated)
    }

    /// Soft-delete the account, then drop its sessions. Ordered so a
    /// failed delete leaves the sessions untouched.
    pub async fn delete_user(&self, actor: UserId, id: UserId) -> SesamResult<()> {
        let mut uow = self.users.begin().await?;
        uow.soft_delete(id, actor).await?;
        uow.commit().await?;

        if let Err(err) = self.sessions.purge_user_sessions(id).await {
            warn!(
                user_id = id,
                error = %err,
                "user deleted but sessions were not purged"
            );
            return Err(err);
        }

        info!(user_id = id, deleted_by = actor, "user deleted");
        Ok(())
    }

    /// Rotate the password after verifying the current one.
    ///
    /// Existing sessions stay valid: the embedded snapshots never
    /// carry the digest, so there is nothing to refresh.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current: &str,
        new: &str,
    ) -> SesamResult<()> {
        let mut uow = self.users.begin().await?;
        let Some(mut user) = uow.find_by_id(user_id).await? else {
            return Err(SesamError::NotFound {
                entity: "user".into(),
                id: user_id.to_string(),
            });
        };

        let valid = password::verify_password(
            current,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }

        user.password_hash = password::hash_password(new, self.config.pepper.as_deref())?;
        user.updated_by = user_id;
        uow.update(&user).await?;
        uow.commit().await?;

        info!(user_id, "password changed");
        Ok(())
    }
}

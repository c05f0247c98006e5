//! Development seeding.

use sesam_auth::{AuthService, NewUserInput};
use sesam_core::error::SesamResult;
use sesam_core::store::{SessionStore, UserStore};
use tracing::info;

const ADMIN_EMAIL: &str = "admin@sesam.local";

/// Make sure a login is possible on a fresh development database.
/// The password comes from `SESAM_ADMIN_PASSWORD`, with a throwaway
/// default for local use.
pub async fn ensure_admin<U, S>(auth: &AuthService<U, S>) -> SesamResult<()>
where
    U: UserStore,
    S: SessionStore,
{
    let existing = auth
        .list_users(sesam_core::store::ListUsersParams {
            email: Some(ADMIN_EMAIL.into()),
            ..Default::default()
        })
        .await?;
    if !existing.is_empty() {
        return Ok(());
    }

    let password =
        std::env::var("SESAM_ADMIN_PASSWORD").unwrap_or_else(|_| "sesam-admin".into());

    let user = auth
        .create_user(
            0,
            NewUserInput {
                name: "Admin".into(),
                email: ADMIN_EMAIL.into(),
                address: String::new(),
                password,
            },
        )
        .await?;

    info!(user_id = user.id, email = ADMIN_EMAIL, "seeded admin user");
    Ok(())
}

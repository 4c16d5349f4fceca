//! First-run admin account provisioning.

use beatstore_core::error::CoreError;
use beatstore_core::roles::ROLE_ADMIN;
use beatstore_db::models::user::CreateUser;
use beatstore_db::repositories::UserRepo;
use beatstore_db::DbPool;

use crate::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};
use crate::error::{AppError, AppResult};

/// Admin credentials read from `ADMIN_EMAIL` / `ADMIN_PASSWORD`.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
}

impl AdminBootstrap {
    /// `None` unless both variables are set and non-empty.
    pub fn from_env() -> Option<Self> {
        let email = std::env::var("ADMIN_EMAIL").ok().filter(|v| !v.trim().is_empty())?;
        let password = std::env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty())?;
        Some(Self { email, password })
    }
}

/// Create the admin account unless a user with that email already exists.
///
/// Returns `true` when an account was created. Existing accounts are left
/// untouched, including their password.
pub async fn ensure_admin(pool: &DbPool, admin: &AdminBootstrap) -> AppResult<bool> {
    if UserRepo::find_by_email(pool, &admin.email).await?.is_some() {
        return Ok(false);
    }

    validate_password_strength(&admin.password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    let password_hash = hash_password(&admin.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        pool,
        &CreateUser {
            email: admin.email.trim().to_string(),
            password_hash,
            role: ROLE_ADMIN.to_string(),
        },
    )
    .await?;

    tracing::info!(user_id = user.id, email = %user.email, "Admin account created");
    Ok(true)
}

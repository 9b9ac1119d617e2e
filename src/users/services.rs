use axum::http::StatusCode;
use rand::{distributions::Alphanumeric, Rng};
use sqlx::PgPool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    auth::password::{hash_password, verify_password},
    email::verification_email,
    state::AppState,
    users::{
        dto::CreateUserRequest,
        repo_types::{NewUser, User},
    },
    validation::{
        check, merge_update, validate_email, validate_password, Field, FieldRejection,
        ProfileUpdate, UserProfile,
    },
};

const VERIFICATION_TOKEN_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Rejected(#[from] FieldRejection),
    #[error("{0} already exists")]
    Conflict(&'static str),
    #[error("user not found")]
    NotFound,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account locked")]
    Locked,
    #[error("email not verified")]
    Unverified,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<ServiceError> for (StatusCode, String) {
    fn from(err: ServiceError) -> Self {
        let status = match &err {
            ServiceError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::InvalidCredentials | ServiceError::Unverified => StatusCode::UNAUTHORIZED,
            ServiceError::Locked | ServiceError::InvalidToken => StatusCode::BAD_REQUEST,
            ServiceError::Internal(e) => {
                error!(error = %e, "internal error");
                return (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into());
            }
        };
        (status, err.to_string())
    }
}

/// Creates an account. The very first account becomes a verified admin;
/// everyone else starts anonymous and gets a verification mail.
pub async fn register_user(state: &AppState, req: CreateUserRequest) -> Result<User, ServiceError> {
    let profile = req.profile().validated()?;
    check(Field::Password, validate_password(&req.password))?;
    ensure_available(&state.db, &profile, None).await?;

    let new = NewUser {
        profile,
        password_hash: hash_password(&req.password)?,
        verification_token: generate_token(),
    };

    let user = User::create(&state.db, &new).await.map_err(conflict_or_internal)?;
    info!(user_id = %user.id, role = ?user.role, "user registered");

    if let Some(token) = &user.verification_token {
        let url = format!(
            "{}/api/v1/auth/verify-email/{}/{}",
            state.config.base_url, user.id, token
        );
        let message = verification_email(&user.email, user.display_name(), &url);
        if let Err(e) = state.mailer.send(message).await {
            error!(error = %e, user_id = %user.id, "verification email failed");
        }
    }

    Ok(user)
}

/// Merges `update` into the stored profile and persists the result.
pub async fn update_user(
    state: &AppState,
    id: Uuid,
    update: &ProfileUpdate,
) -> Result<User, ServiceError> {
    let user = User::find_by_id(&state.db, id).await?.ok_or(ServiceError::NotFound)?;
    let merged = merge_update(&user.profile(), update).map_err(|rejection| {
        warn!(user_id = %id, field = %rejection.field, reason = %rejection.reason, "update rejected");
        rejection
    })?;
    ensure_available(&state.db, &merged, Some(id)).await?;

    let updated = User::update_profile(&state.db, id, &merged)
        .await
        .map_err(conflict_or_internal)?
        .ok_or(ServiceError::NotFound)?;
    info!(user_id = %id, "user updated");
    Ok(updated)
}

pub async fn verify_email(state: &AppState, id: Uuid, token: &str) -> Result<(), ServiceError> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or(ServiceError::InvalidToken)?;
    if user.verification_token.as_deref() != Some(token) {
        warn!(user_id = %id, "verification token mismatch");
        return Err(ServiceError::InvalidToken);
    }
    User::set_email_verified(&state.db, id).await?;
    info!(user_id = %id, "email verified");
    Ok(())
}

pub async fn login_user(state: &AppState, email: &str, password: &str) -> Result<User, ServiceError> {
    let email = validate_email(email).map_err(|_| ServiceError::InvalidCredentials)?;
    let user = match User::find_by_email(&state.db, &email).await? {
        Some(u) => u,
        None => {
            warn!("login unknown email");
            return Err(ServiceError::InvalidCredentials);
        }
    };

    if user.is_locked {
        warn!(user_id = %user.id, "login on locked account");
        return Err(ServiceError::Locked);
    }

    if !verify_password(password, &user.password_hash)? {
        let locked =
            User::record_failed_login(&state.db, user.id, state.config.max_login_attempts).await?;
        if locked {
            warn!(user_id = %user.id, "account locked after failed logins");
            return Err(ServiceError::Locked);
        }
        warn!(user_id = %user.id, "login invalid password");
        return Err(ServiceError::InvalidCredentials);
    }

    if !user.email_verified {
        return Err(ServiceError::Unverified);
    }

    User::record_successful_login(&state.db, user.id).await?;
    info!(user_id = %user.id, "user logged in");
    Ok(user)
}

pub async fn get_user(state: &AppState, id: Uuid) -> Result<User, ServiceError> {
    User::find_by_id(&state.db, id).await?.ok_or(ServiceError::NotFound)
}

pub async fn list_users(
    state: &AppState,
    limit: i64,
    offset: i64,
) -> Result<(Vec<User>, i64), ServiceError> {
    let total = User::count(&state.db).await?;
    let users = User::list(&state.db, limit, offset).await?;
    Ok((users, total))
}

pub async fn delete_user(state: &AppState, id: Uuid) -> Result<(), ServiceError> {
    if !User::delete(&state.db, id).await? {
        return Err(ServiceError::NotFound);
    }
    info!(user_id = %id, "user deleted");
    Ok(())
}

/// Fails if another account already holds the username or email.
async fn ensure_available(
    db: &PgPool,
    profile: &UserProfile,
    owner: Option<Uuid>,
) -> Result<(), ServiceError> {
    let taken_by_other = |user: Option<User>| user.is_some_and(|u| Some(u.id) != owner);
    if taken_by_other(User::find_by_username(db, &profile.username).await?) {
        return Err(ServiceError::Conflict("username"));
    }
    if taken_by_other(User::find_by_email(db, &profile.email).await?) {
        return Err(ServiceError::Conflict("email"));
    }
    Ok(())
}

// A concurrent insert can still hit the unique index after `ensure_available`.
fn conflict_or_internal(err: anyhow::Error) -> ServiceError {
    let unique = err
        .downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|e| e.is_unique_violation());
    if unique {
        ServiceError::Conflict("username or email")
    } else {
        ServiceError::Internal(err)
    }
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(VERIFICATION_TOKEN_LEN)
        .map(char::from)
        .collect()
}

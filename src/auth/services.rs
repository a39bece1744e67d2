use lazy_static::lazy_static;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{AuthResponse, LoginRequest, RegisterRequest},
    jwt::JwtKeys,
    password::{hash_password, verify_password},
};
use crate::{
    error::ApiError,
    users::{dto::PublicUser, repo::UserStore, repo_types::NewUser},
    validation::{
        avatar_url, is_valid_email, normalize_email, validate_email, validate_name,
        validate_password,
    },
};

lazy_static! {
    // Verified against when the email is unknown so both failure paths cost one hash.
    static ref DUMMY_HASH: String = hash_password("mathleap-dummy-password").unwrap_or_default();
}

fn required(field: Option<String>) -> Result<String, ApiError> {
    field
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::validation("All input required"))
}

fn issue(keys: &JwtKeys, user: PublicUser) -> Result<AuthResponse, ApiError> {
    let token = keys.sign(user.id)?;
    Ok(AuthResponse { token, user })
}

pub async fn register(
    users: &dyn UserStore,
    keys: &JwtKeys,
    req: RegisterRequest,
) -> Result<AuthResponse, ApiError> {
    let (name, email, password) = (
        required(req.name)?,
        required(req.email)?,
        required(req.password)?,
    );
    let name = validate_name(&name)?;
    let email = validate_email(&email)?;
    validate_password(&password)?;

    if users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict);
    }

    let password_hash = hash_password(&password)?;
    let user = users
        .insert(NewUser {
            id: Uuid::new_v4(),
            avatar: avatar_url(&name),
            name,
            email,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    issue(keys, user.into())
}

pub async fn login(
    users: &dyn UserStore,
    keys: &JwtKeys,
    req: LoginRequest,
) -> Result<AuthResponse, ApiError> {
    let email = normalize_email(&required(req.email)?);
    let password = required(req.password)?;

    let user = if is_valid_email(&email) {
        users.find_by_email(&email).await?
    } else {
        None
    };

    let Some(user) = user else {
        let _ = verify_password(&password, &DUMMY_HASH);
        warn!(email = %email, "login unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(&password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    info!(user_id = %user.id, "user logged in");
    issue(keys, user.into())
}

/// Resolves an authenticated id to its profile. A token whose user no longer
/// exists is treated as an invalid session.
pub async fn current_user(users: &dyn UserStore, user_id: Uuid) -> Result<PublicUser, ApiError> {
    users
        .find_by_id(user_id)
        .await?
        .map(PublicUser::from)
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))
}

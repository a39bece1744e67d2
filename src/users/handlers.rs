use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{
    dto::{PublicUser, UpdateUserRequest},
    services,
};
use crate::{auth::AuthUser, error::ApiError, state::AppState};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/random", get(random_users))
        .route("/users/:user", get(get_user).patch(update_user))
        .route("/users/follow/:id", post(follow))
        .route("/users/unfollow/:id", delete(unfollow))
        .route("/users/followers/:id", get(followers))
        .route("/users/following/:id", get(following))
}

#[instrument(skip(state))]
pub async fn random_users(State(state): State<AppState>) -> Result<Json<Vec<PublicUser>>, ApiError> {
    Ok(Json(services::random_users(state.users.as_ref()).await?))
}

/// `:user` is either a user id or a display name.
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<PublicUser>, ApiError> {
    Ok(Json(services::get_user(state.users.as_ref(), &identifier).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<PublicUser>, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::NotFound)?;
    if caller != id {
        warn!(%caller, target_id = %id, "attempt to update another user's profile");
        return Err(ApiError::Forbidden);
    }
    let Json(payload) = payload?;
    Ok(Json(services::update_user(state.users.as_ref(), id, payload).await?))
}

pub async fn follow(Path(_id): Path<String>) -> ApiError {
    ApiError::NotImplemented("Follow functionality not implemented yet".into())
}

pub async fn unfollow(Path(_id): Path<String>) -> ApiError {
    ApiError::NotImplemented("Unfollow functionality not implemented yet".into())
}

pub async fn followers(Path(_id): Path<String>) -> ApiError {
    ApiError::NotImplemented("Get followers functionality not implemented yet".into())
}

pub async fn following(Path(_id): Path<String>) -> ApiError {
    ApiError::NotImplemented("Get following functionality not implemented yet".into())
}

use tracing::{debug, info};
use uuid::Uuid;

use super::{
    dto::{PublicUser, UpdateUserRequest},
    repo::UserStore,
    repo_types::UserPatch,
};
use crate::{
    error::ApiError,
    validation::{validate_email, validate_name},
};

/// How many profiles `GET /api/users/random` returns at most.
pub const RANDOM_SAMPLE_SIZE: usize = 5;

/// Looks a user up by id when the identifier parses as one, by name otherwise.
pub async fn get_user(users: &dyn UserStore, identifier: &str) -> Result<PublicUser, ApiError> {
    let user = match Uuid::parse_str(identifier) {
        Ok(id) => users.find_by_id(id).await?,
        Err(_) => users.find_by_name(identifier).await?,
    };
    user.map(PublicUser::from).ok_or(ApiError::NotFound)
}

pub async fn random_users(users: &dyn UserStore) -> Result<Vec<PublicUser>, ApiError> {
    let sample = users.sample(RANDOM_SAMPLE_SIZE).await?;
    Ok(sample.into_iter().map(PublicUser::from).collect())
}

fn validate_patch(req: UpdateUserRequest) -> Result<UserPatch, ApiError> {
    Ok(UserPatch {
        name: req.name.as_deref().map(validate_name).transpose()?,
        email: req.email.as_deref().map(validate_email).transpose()?,
        biography: req.biography.map(|b| b.trim().to_string()),
        avatar: req.avatar.map(|a| a.trim().to_string()),
    })
}

pub async fn update_user(
    users: &dyn UserStore,
    id: Uuid,
    req: UpdateUserRequest,
) -> Result<PublicUser, ApiError> {
    let patch = validate_patch(req)?;
    if patch.is_empty() {
        debug!(user_id = %id, "empty patch; returning current record");
        return users
            .find_by_id(id)
            .await?
            .map(PublicUser::from)
            .ok_or(ApiError::NotFound);
    }
    let user = users.update(id, patch).await?.ok_or(ApiError::NotFound)?;
    info!(user_id = %user.id, "user updated");
    Ok(user.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::{memory::MemoryUserStore, repo_types::NewUser};

    async fn seeded() -> (MemoryUserStore, Uuid) {
        let store = MemoryUserStore::new();
        let user = store
            .insert(NewUser {
                id: Uuid::new_v4(),
                name: "Alex".into(),
                email: "alex@example.com".into(),
                password_hash: "hash".into(),
                avatar: "https://placehold.co/100x100/F59E0B/FFFFFF?text=A".into(),
            })
            .await
            .unwrap();
        (store, user.id)
    }

    #[tokio::test]
    async fn get_user_by_name_or_id() {
        let (store, id) = seeded().await;
        assert_eq!(get_user(&store, "Alex").await.unwrap().id, id);
        assert_eq!(get_user(&store, &id.to_string()).await.unwrap().name, "Alex");
        assert!(matches!(
            get_user(&store, "Nobody").await,
            Err(ApiError::NotFound)
        ));
        assert!(matches!(
            get_user(&store, &Uuid::new_v4().to_string()).await,
            Err(ApiError::NotFound)
        ));
    }

    #[tokio::test]
    async fn biography_update_leaves_other_fields() {
        let (store, id) = seeded().await;
        let before = get_user(&store, "Alex").await.unwrap();
        let req = UpdateUserRequest {
            biography: Some("x".into()),
            ..Default::default()
        };
        update_user(&store, id, req).await.unwrap();

        let after = get_user(&store, "Alex").await.unwrap();
        assert_eq!(after.biography.as_deref(), Some("x"));
        assert_eq!(after.name, before.name);
        assert_eq!(after.email, before.email);
        assert_eq!(after.avatar, before.avatar);
        assert_eq!(after.created_at, before.created_at);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let (store, _) = seeded().await;
        let req = UpdateUserRequest {
            biography: Some("x".into()),
            ..Default::default()
        };
        let err = update_user(&store, Uuid::new_v4(), req).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound));

        let err = update_user(&store, Uuid::new_v4(), UpdateUserRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[tokio::test]
    async fn update_validates_and_normalizes() {
        let (store, id) = seeded().await;
        let req = UpdateUserRequest {
            name: Some("Al".into()),
            ..Default::default()
        };
        assert!(matches!(
            update_user(&store, id, req).await,
            Err(ApiError::Validation(_))
        ));

        let req = UpdateUserRequest {
            email: Some(" NEW@Example.com ".into()),
            ..Default::default()
        };
        let user = update_user(&store, id, req).await.unwrap();
        assert_eq!(user.email, "new@example.com");
    }
}

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use rand::seq::SliceRandom;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    repo::{StoreError, UserStore},
    repo_types::{NewUser, User, UserPatch},
};

/// Process-local store used by tests and database-less local runs.
/// Uniqueness checks and writes happen under one write lock.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let now = OffsetDateTime::now_utc();
        let record = User {
            id: user.id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            avatar: Some(user.avatar),
            biography: None,
            is_admin: false,
            created_at: now,
            updated_at: now,
        };
        users.push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<User>, StoreError> {
        // insertion order is creation order
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users.iter().find(|u| u.name == name).cloned())
    }

    async fn sample(&self, size: usize) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        let mut rng = rand::thread_rng();
        Ok(users.choose_multiple(&mut rng, size).cloned().collect())
    }

    async fn update(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(email) = &patch.email {
            if users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::DuplicateEmail);
            }
        }
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(biography) = patch.biography {
            user.biography = Some(biography);
        }
        if let Some(avatar) = patch.avatar {
            user.avatar = Some(avatar);
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }
}

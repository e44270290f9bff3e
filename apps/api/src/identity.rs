//! Identity collaborator: read the current user and flip the profile-complete flag.
//!
//! The user record belongs to the identity service. The only write this API
//! performs is `mark_profile_complete`, called by the completion finalizer.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::models::user::User;
use crate::store::StoreError;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError>;

    /// Sets `is_profile_complete` and returns the refreshed record.
    async fn mark_profile_complete(&self, user_id: Uuid) -> Result<User, StoreError>;
}

/// Reads and updates the shared `users` table.
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(
            sqlx::query_as::<_, User>(
                "SELECT id, email, is_profile_complete, profile_completed_at, created_at FROM users WHERE id = $1",
            )
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?,
        )
    }

    async fn mark_profile_complete(&self, user_id: Uuid) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_profile_complete = TRUE,
                profile_completed_at = COALESCE(profile_completed_at, now())
            WHERE id = $1
            RETURNING id, email, is_profile_complete, profile_completed_at, created_at
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::UserNotFound(user_id))?;

        info!(%user_id, "Profile marked complete");
        Ok(user)
    }
}

/// In-process user directory for local runs and tests.
///
/// With `auto_provision`, an unknown user id gets a blank record on first
/// lookup so the API can be exercised without an identity service.
#[derive(Default)]
pub struct MemoryUserDirectory {
    users: RwLock<HashMap<Uuid, User>>,
    auto_provision: bool,
}

impl MemoryUserDirectory {
    pub fn new(auto_provision: bool) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            auto_provision,
        }
    }

    #[cfg(test)]
    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        if !self.auto_provision {
            return Ok(self.users.read().await.get(&user_id).cloned());
        }
        let mut users = self.users.write().await;
        let user = users.entry(user_id).or_insert_with(|| User {
            id: user_id,
            email: String::new(),
            is_profile_complete: false,
            profile_completed_at: None,
            created_at: Utc::now(),
        });
        Ok(Some(user.clone()))
    }

    async fn mark_profile_complete(&self, user_id: Uuid) -> Result<User, StoreError> {
        // Provision first so a never-seen id behaves the same as with find_user.
        self.find_user(user_id).await?;

        let mut users = self.users.write().await;
        let user = users
            .get_mut(&user_id)
            .ok_or(StoreError::UserNotFound(user_id))?;
        user.is_profile_complete = true;
        user.profile_completed_at.get_or_insert_with(Utc::now);
        info!(%user_id, "Profile marked complete (memory)");
        Ok(user.clone())
    }
}

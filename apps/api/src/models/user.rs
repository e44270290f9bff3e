use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The identity record. Owned by the identity service; this API only flips
/// `is_profile_complete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub is_profile_complete: bool,
    pub profile_completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

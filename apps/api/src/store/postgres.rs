use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::profile::models::{SectionKind, SectionPayload};
use crate::store::{SaveAck, SectionStore, StoreError};

/// Section store backed by the `profile_sections` table.
#[derive(Clone)]
pub struct PgSectionStore {
    pool: PgPool,
}

impl PgSectionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SectionStore for PgSectionStore {
    async fn save_section(
        &self,
        user_id: Uuid,
        payload: &SectionPayload,
    ) -> Result<SaveAck, StoreError> {
        let kind = payload.kind();
        let value = payload
            .to_value()
            .map_err(|source| StoreError::Encode { kind, source })?;

        // Upsert: replaces the whole document. `xmax = 0` only holds for a
        // freshly inserted row.
        let (updated_at, created): (DateTime<Utc>, bool) = sqlx::query_as(
            r#"
            INSERT INTO profile_sections (user_id, kind, payload)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, kind)
            DO UPDATE SET payload = EXCLUDED.payload, updated_at = now()
            RETURNING updated_at, (xmax = 0) AS created
            "#,
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(&value)
        .fetch_one(&self.pool)
        .await?;

        debug!(%user_id, section = %kind, created, "Section saved");
        Ok(SaveAck {
            kind,
            created,
            updated_at,
        })
    }

    async fn load_section(
        &self,
        user_id: Uuid,
        kind: SectionKind,
    ) -> Result<Option<SectionPayload>, StoreError> {
        let payload: Option<Value> = sqlx::query_scalar(
            "SELECT payload FROM profile_sections WHERE user_id = $1 AND kind = $2",
        )
        .bind(user_id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        decode_payload(kind, payload)
    }
}

/// Decodes the `payload` column; `None` means the row does not exist.
fn decode_payload(
    kind: SectionKind,
    payload: Option<Value>,
) -> Result<Option<SectionPayload>, StoreError> {
    payload
        .map(|value| {
            SectionPayload::from_value(kind, value)
                .map_err(|source| StoreError::Corrupt { kind, source })
        })
        .transpose()
}

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::profile::models::{SectionKind, SectionPayload};
use crate::store::{SaveAck, SectionStore, StoreError};

/// Process-local section store. Documents are held as JSON so loads decode
/// exactly what a database round trip would.
#[derive(Default)]
pub struct MemorySectionStore {
    documents: RwLock<HashMap<(Uuid, SectionKind), Value>>,
}

impl MemorySectionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl MemorySectionStore {
    /// Number of documents stored for `user_id`.
    pub async fn document_count(&self, user_id: Uuid) -> usize {
        self.documents
            .read()
            .await
            .keys()
            .filter(|(owner, _)| *owner == user_id)
            .count()
    }
}

#[async_trait]
impl SectionStore for MemorySectionStore {
    async fn save_section(
        &self,
        user_id: Uuid,
        payload: &SectionPayload,
    ) -> Result<SaveAck, StoreError> {
        let kind = payload.kind();
        let value = payload
            .to_value()
            .map_err(|source| StoreError::Encode { kind, source })?;
        let now = Utc::now();

        let mut documents = self.documents.write().await;
        let created = documents.insert((user_id, kind), value).is_none();

        debug!(%user_id, section = %kind, created, "Section saved (memory)");
        Ok(SaveAck {
            kind,
            created,
            updated_at: now,
        })
    }

    async fn load_section(
        &self,
        user_id: Uuid,
        kind: SectionKind,
    ) -> Result<Option<SectionPayload>, StoreError> {
        let documents = self.documents.read().await;
        documents
            .get(&(user_id, kind))
            .map(|doc| {
                SectionPayload::from_value(kind, doc.clone())
                    .map_err(|source| StoreError::Corrupt { kind, source })
            })
            .transpose()
    }
}

//! Section Store: one document per `(user, section kind)`.
//!
//! Saves are whole-document upserts with last-write-wins semantics: two tabs
//! saving the same section concurrently both succeed and the later write is
//! what remains. There is no version check.

pub mod memory;
pub mod postgres;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::profile::models::{SectionKind, SectionPayload};

pub use memory::MemorySectionStore;
pub use postgres::PgSectionStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Stored {kind} document is malformed: {source}")]
    Corrupt {
        kind: SectionKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode {kind} document: {source}")]
    Encode {
        kind: SectionKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(e.to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

impl StoreError {
    /// Whether repeating the same call may succeed. Malformed documents and
    /// unknown users fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Database(_) | StoreError::Unavailable(_))
    }
}

/// Acknowledgement of a successful upsert.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveAck {
    pub kind: SectionKind,
    /// True when this save created the document.
    pub created: bool,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait SectionStore: Send + Sync {
    /// Creates or fully replaces the `(user_id, payload.kind())` document.
    async fn save_section(
        &self,
        user_id: Uuid,
        payload: &SectionPayload,
    ) -> Result<SaveAck, StoreError>;

    /// `Ok(None)` when the user never saved this section.
    async fn load_section(
        &self,
        user_id: Uuid,
        kind: SectionKind,
    ) -> Result<Option<SectionPayload>, StoreError>;

    /// Loads all six sections concurrently. A failed load is logged and
    /// reported as absent without affecting the other kinds.
    async fn load_all_sections(&self, user_id: Uuid) -> LoadedSections {
        let (basic, skills, projects, certifications, experience, job_roles) = tokio::join!(
            self.load_section(user_id, SectionKind::BasicDetails),
            self.load_section(user_id, SectionKind::Skills),
            self.load_section(user_id, SectionKind::Projects),
            self.load_section(user_id, SectionKind::Certifications),
            self.load_section(user_id, SectionKind::Experience),
            self.load_section(user_id, SectionKind::JobRoles),
        );

        let mut loaded = LoadedSections::default();
        let results = [basic, skills, projects, certifications, experience, job_roles];
        for (kind, result) in SectionKind::ALL.into_iter().zip(results) {
            match result {
                Ok(payload) => loaded.set(kind, payload),
                Err(e) => {
                    warn!(%user_id, section = %kind, error = %e, "Section load failed, treating as absent");
                    loaded.mark_failed(kind);
                }
            }
        }
        loaded
    }

    /// Loads all six sections concurrently, failing on the first load error.
    async fn load_all_sections_strict(&self, user_id: Uuid) -> Result<LoadedSections, StoreError> {
        let (basic, skills, projects, certifications, experience, job_roles) = tokio::try_join!(
            self.load_section(user_id, SectionKind::BasicDetails),
            self.load_section(user_id, SectionKind::Skills),
            self.load_section(user_id, SectionKind::Projects),
            self.load_section(user_id, SectionKind::Certifications),
            self.load_section(user_id, SectionKind::Experience),
            self.load_section(user_id, SectionKind::JobRoles),
        )?;

        let mut loaded = LoadedSections::default();
        let payloads = [basic, skills, projects, certifications, experience, job_roles];
        for (kind, payload) in SectionKind::ALL.into_iter().zip(payloads) {
            loaded.set(kind, payload);
        }
        Ok(loaded)
    }
}

/// Result of a fan-out load: payload or absent per kind, plus the kinds whose
/// load failed (also absent).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedSections {
    sections: BTreeMap<SectionKind, SectionPayload>,
    failed: Vec<SectionKind>,
}

impl LoadedSections {
    pub fn get(&self, kind: SectionKind) -> Option<&SectionPayload> {
        self.sections.get(&kind)
    }

    /// Replaces the payload held for `kind`; `None` marks it absent.
    pub fn set(&mut self, kind: SectionKind, payload: Option<SectionPayload>) {
        self.failed.retain(|k| *k != kind);
        match payload {
            Some(p) => {
                self.sections.insert(kind, p);
            }
            None => {
                self.sections.remove(&kind);
            }
        }
    }

    pub fn mark_failed(&mut self, kind: SectionKind) {
        self.sections.remove(&kind);
        if !self.failed.contains(&kind) {
            self.failed.push(kind);
        }
    }

    /// Kinds whose last load failed, in step order.
    pub fn failed(&self) -> Vec<SectionKind> {
        let mut failed = self.failed.clone();
        failed.sort();
        failed
    }

    /// Stored payload, or the kind's empty default when absent.
    pub fn payload_or_default(
        &self,
        kind: SectionKind,
        account_email: Option<&str>,
    ) -> SectionPayload {
        self.get(kind)
            .cloned()
            .unwrap_or_else(|| SectionPayload::default_for(kind, account_email))
    }

    /// Which kinds currently have a stored document.
    pub fn saved_map(&self) -> BTreeMap<SectionKind, bool> {
        SectionKind::ALL
            .into_iter()
            .map(|k| (k, self.sections.contains_key(&k)))
            .collect()
    }
}

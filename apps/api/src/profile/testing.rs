//! Test fixtures and a fault-injecting store.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::profile::errors::WorkflowError;
use crate::profile::models::{SectionKind, SectionPayload};
use crate::store::{MemorySectionStore, SaveAck, SectionStore, StoreError};

pub mod fixtures {
    use chrono::Utc;
    use uuid::Uuid;

    use crate::models::user::User;
    use crate::profile::models::*;

    pub fn user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            is_profile_complete: false,
            profile_completed_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn basic_details() -> SectionPayload {
        SectionPayload::BasicDetails(BasicDetails {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "+44 20 0000 0000".to_string(),
            linkedin: "linkedin.com/in/ada".to_string(),
            github: "github.com/ada".to_string(),
            bio: "Mathematician".to_string(),
            ..BasicDetails::default()
        })
    }

    pub fn basic_details_without_first_name() -> SectionPayload {
        let SectionPayload::BasicDetails(details) = basic_details() else {
            unreachable!()
        };
        SectionPayload::BasicDetails(BasicDetails {
            first_name: String::new(),
            ..details
        })
    }

    pub fn skills(languages: &[&str]) -> SectionPayload {
        SectionPayload::Skills(Skills {
            languages: languages.iter().map(|s| s.to_string()).collect(),
            ..Skills::default()
        })
    }

    pub fn project(name: &str, start_date: &str) -> ProjectEntry {
        ProjectEntry {
            name: name.to_string(),
            details: vec!["Built the core engine".to_string()],
            start_date: start_date.to_string(),
            github_link: Some("https://github.com/ada/engine".to_string()),
            skills_used: vec!["Rust".to_string()],
            ..ProjectEntry::default()
        }
    }

    pub fn projects(entries: Vec<ProjectEntry>) -> SectionPayload {
        SectionPayload::Projects(Projects { projects: entries })
    }

    pub fn certifications() -> SectionPayload {
        SectionPayload::Certifications(Certifications {
            certifications: vec![CertificationEntry {
                name: "CKA".to_string(),
                platform: "CNCF".to_string(),
                start_date: "2024-01-10".to_string(),
                ..CertificationEntry::default()
            }],
        })
    }

    pub fn experience() -> SectionPayload {
        SectionPayload::Experience(Experience {
            experiences: vec![ExperienceEntry {
                company_name: "Initech".to_string(),
                position: "Engineer".to_string(),
                start_date: "2021-05-01".to_string(),
                is_current: true,
                achievements: vec!["Cut p99 latency by 40%".to_string()],
                ..ExperienceEntry::default()
            }],
        })
    }

    pub fn job_roles(roles: &[&str]) -> SectionPayload {
        SectionPayload::JobRoles(JobRoles {
            desired_job_roles: roles.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// One valid, non-empty payload per kind, in step order.
    pub fn complete_profile() -> Vec<SectionPayload> {
        vec![
            basic_details(),
            skills(&["Rust"]),
            projects(vec![project("Engine", "2023-02-01")]),
            certifications(),
            experience(),
            job_roles(&["Backend Engineer"]),
        ]
    }
}

/// True for a storage failure the caller may retry.
pub fn retryable(err: &WorkflowError) -> bool {
    matches!(err, WorkflowError::Persistence(e) if e.is_retryable())
}

/// Wraps `MemorySectionStore`, failing saves or loads for chosen kinds.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemorySectionStore,
    failing_saves: Mutex<HashSet<SectionKind>>,
    failing_loads: Mutex<HashSet<SectionKind>>,
    saves: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_saves(&self, kind: SectionKind, failing: bool) {
        let mut set = self.failing_saves.lock().await;
        if failing {
            set.insert(kind);
        } else {
            set.remove(&kind);
        }
    }

    pub async fn fail_loads(&self, kind: SectionKind, failing: bool) {
        let mut set = self.failing_loads.lock().await;
        if failing {
            set.insert(kind);
        } else {
            set.remove(&kind);
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Seeds documents directly, bypassing failure injection and counters.
    pub async fn seed(&self, user_id: Uuid, payloads: &[SectionPayload]) {
        for payload in payloads {
            self.inner
                .save_section(user_id, payload)
                .await
                .expect("seeding memory store");
        }
    }
}

#[async_trait]
impl SectionStore for FlakyStore {
    async fn save_section(
        &self,
        user_id: Uuid,
        payload: &SectionPayload,
    ) -> Result<SaveAck, StoreError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.failing_saves.lock().await.contains(&payload.kind()) {
            return Err(StoreError::Unavailable(format!(
                "injected save failure for {}",
                payload.kind()
            )));
        }
        self.inner.save_section(user_id, payload).await
    }

    async fn load_section(
        &self,
        user_id: Uuid,
        kind: SectionKind,
    ) -> Result<Option<SectionPayload>, StoreError> {
        if self.failing_loads.lock().await.contains(&kind) {
            return Err(StoreError::Unavailable(format!(
                "injected load failure for {kind}"
            )));
        }
        self.inner.load_section(user_id, kind).await
    }
}

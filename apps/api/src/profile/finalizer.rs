//! Completion Finalizer: the terminal "complete profile" action.
//!
//! Validity is always recomputed from freshly loaded sections; nothing the
//! client or a workflow session believes is trusted. Loads here fail closed:
//! a section that cannot be read aborts the completion instead of counting as
//! absent.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::auth::AuthContext;
use crate::models::user::User;
use crate::identity::UserDirectory;
use crate::profile::completion::ProfileCompletionState;
use crate::profile::errors::WorkflowError;
use crate::profile::models::SectionKind;
use crate::store::SectionStore;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedProfile {
    pub user: User,
    /// Which sections have a stored document.
    pub sections: BTreeMap<SectionKind, bool>,
}

#[derive(Debug, Clone)]
pub enum CompletionOutcome {
    Completed(CompletedProfile),
    Rejected { missing_sections: Vec<SectionKind> },
}

pub struct CompletionFinalizer {
    store: Arc<dyn SectionStore>,
    users: Arc<dyn UserDirectory>,
}

impl CompletionFinalizer {
    pub fn new(store: Arc<dyn SectionStore>, users: Arc<dyn UserDirectory>) -> Self {
        Self { store, users }
    }

    pub async fn complete(&self, auth: &AuthContext) -> Result<CompletionOutcome, WorkflowError> {
        let user_id = auth.user_id;
        let sections = self.store.load_all_sections_strict(user_id).await?;

        let state = ProfileCompletionState::compute(&sections);
        if !state.all_required_complete {
            info!(%user_id, missing = ?state.missing_required, "Profile completion rejected");
            return Ok(CompletionOutcome::Rejected {
                missing_sections: state.missing_required,
            });
        }

        let user = self.users.mark_profile_complete(user_id).await?;
        if !user.is_profile_complete {
            error!(%user_id, "User record not marked complete after finalization");
            return Err(WorkflowError::Invariant(format!(
                "user {user_id} still incomplete after mark_profile_complete"
            )));
        }

        info!(%user_id, "Profile completed");
        Ok(CompletionOutcome::Completed(CompletedProfile {
            user,
            sections: sections.saved_map(),
        }))
    }
}

//! Workflow Controller: step navigation over the six profile sections.
//!
//! Transitions:
//! - next:     gate on the step validator, save, advance, fetch the new step
//! - previous: no save, move back, re-fetch
//! - skip:     optional steps only, save as-is, advance, fetch
//! - submit:   last step only, all required sections complete, then finalize
//!
//! A transition takes `&mut WorkflowSession`, so one session runs one
//! transition at a time. The step only changes after the save succeeded.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::auth::AuthContext;
use crate::profile::completion::ProfileCompletionState;
use crate::profile::errors::WorkflowError;
use crate::profile::finalizer::{CompletedProfile, CompletionFinalizer, CompletionOutcome};
use crate::profile::models::{SectionKind, SectionPayload};
use crate::profile::resume::resolve_resume_point;
use crate::profile::step::{Step, LAST_STEP};
use crate::profile::validation::check_step;
use crate::store::{LoadedSections, SectionStore};

/// Server-side state of one user's pass through the workflow.
#[derive(Debug, Clone)]
pub struct WorkflowSession {
    auth: AuthContext,
    step: Step,
    /// Mirror of the stored sections, refreshed on every save and fetch.
    sections: LoadedSections,
    account_email: Option<String>,
}

impl WorkflowSession {
    pub fn new(
        auth: AuthContext,
        step: Step,
        sections: LoadedSections,
        account_email: Option<String>,
    ) -> Self {
        Self {
            auth,
            step,
            sections,
            account_email,
        }
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn step(&self) -> Step {
        self.step
    }

    /// Payload shown on the current step: stored document or kind default.
    pub fn current_payload(&self) -> SectionPayload {
        self.sections
            .payload_or_default(self.step.kind(), self.account_email.as_deref())
    }

    pub fn completion(&self) -> ProfileCompletionState {
        ProfileCompletionState::compute(&self.sections)
    }

    pub fn view(&self) -> WorkflowView {
        self.view_with(Vec::new())
    }

    fn view_with(&self, warnings: Vec<String>) -> WorkflowView {
        let kind = self.step.kind();
        WorkflowView {
            step: self.step.index(),
            total_steps: LAST_STEP,
            section: kind,
            title: kind.title(),
            required: kind.required(),
            can_skip: !kind.required() && !self.step.is_last(),
            can_go_back: self.step.prev().is_some(),
            is_final_step: self.step.is_last(),
            payload: self.current_payload(),
            completion: self.completion(),
            degraded_sections: self.sections.failed(),
            warnings,
        }
    }
}

/// What the client renders after a transition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowView {
    pub step: u8,
    pub total_steps: u8,
    pub section: SectionKind,
    pub title: &'static str,
    pub required: bool,
    pub can_skip: bool,
    pub can_go_back: bool,
    pub is_final_step: bool,
    pub payload: SectionPayload,
    pub completion: ProfileCompletionState,
    /// Sections whose last load failed and are shown as empty.
    pub degraded_sections: Vec<SectionKind>,
    pub warnings: Vec<String>,
}

#[derive(Clone)]
pub struct WorkflowController {
    store: Arc<dyn SectionStore>,
    finalizer: Arc<CompletionFinalizer>,
}

impl WorkflowController {
    pub fn new(store: Arc<dyn SectionStore>, finalizer: Arc<CompletionFinalizer>) -> Self {
        Self { store, finalizer }
    }

    /// Opens a session positioned by the resume resolver.
    pub async fn start(&self, auth: AuthContext, account_email: Option<String>) -> WorkflowSession {
        let point = resolve_resume_point(self.store.as_ref(), &auth).await;
        WorkflowSession::new(auth, point.step, point.sections, account_email)
    }

    pub async fn next(
        &self,
        session: &mut WorkflowSession,
        draft: SectionPayload,
    ) -> Result<WorkflowView, WorkflowError> {
        ensure_kind(session, &draft)?;
        let Some(target) = session.step.next() else {
            return Err(WorkflowError::InvalidTransition {
                action: "go to next step",
                step: session.step.index(),
                reason: "already at the last step, submit instead",
            });
        };

        let report = check_step(&draft);
        if !report.passed {
            info!(
                user_id = %session.auth.user_id,
                section = %report.kind,
                missing = report.missing_fields.len(),
                "Next blocked by validation"
            );
            return Err(WorkflowError::CannotProceed(report));
        }

        self.persist(session, draft).await?;
        let warnings = self.move_to(session, target).await;
        Ok(session.view_with(warnings))
    }

    /// Moves back one step without saving. When `draft` differs from what was
    /// loaded for the current step, the view carries a discarded-edits warning.
    pub async fn previous(
        &self,
        session: &mut WorkflowSession,
        draft: Option<SectionPayload>,
    ) -> Result<WorkflowView, WorkflowError> {
        if let Some(draft) = &draft {
            ensure_kind(session, draft)?;
        }
        let Some(target) = session.step.prev() else {
            return Err(WorkflowError::InvalidTransition {
                action: "go to previous step",
                step: session.step.index(),
                reason: "already at the first step",
            });
        };

        let mut warnings = Vec::new();
        if draft.is_some_and(|d| d != session.current_payload()) {
            warnings.push(format!(
                "Unsaved changes to {} were discarded",
                session.step.kind().title()
            ));
        }

        warnings.extend(self.move_to(session, target).await);
        Ok(session.view_with(warnings))
    }

    /// Saves an optional section as-is and advances. Entries that would fail
    /// the step gate are still saved; the view reports them as a warning.
    pub async fn skip(
        &self,
        session: &mut WorkflowSession,
        draft: SectionPayload,
    ) -> Result<WorkflowView, WorkflowError> {
        ensure_kind(session, &draft)?;
        let kind = session.step.kind();
        if kind.required() {
            return Err(WorkflowError::InvalidTransition {
                action: "skip",
                step: session.step.index(),
                reason: "required sections cannot be skipped",
            });
        }
        let Some(target) = session.step.next() else {
            return Err(WorkflowError::InvalidTransition {
                action: "skip",
                step: session.step.index(),
                reason: "already at the last step",
            });
        };

        let mut warnings = Vec::new();
        let report = check_step(&draft);
        if !report.passed {
            warn!(
                user_id = %session.auth.user_id,
                section = %kind,
                missing = ?report.missing_fields,
                "Skipping with incomplete entries"
            );
            warnings.push(format!(
                "{} saved with incomplete entries: {}",
                kind.title(),
                report.summary()
            ));
        }

        self.persist(session, draft).await?;
        warnings.extend(self.move_to(session, target).await);
        Ok(session.view_with(warnings))
    }

    /// Saves the last step and finalizes the profile. Completion is checked
    /// against freshly loaded sections plus the draft before anything is
    /// written. On failure the session is left as it was.
    pub async fn submit(
        &self,
        session: &mut WorkflowSession,
        draft: SectionPayload,
    ) -> Result<CompletedProfile, WorkflowError> {
        if !session.step.is_last() {
            return Err(WorkflowError::InvalidTransition {
                action: "submit",
                step: session.step.index(),
                reason: "submit is only available on the last step",
            });
        }
        ensure_kind(session, &draft)?;

        // Strict load: a section that cannot be read must not be reported as
        // missing. The session keeps its sections until the draft is saved.
        let mut candidate = self
            .store
            .load_all_sections_strict(session.auth.user_id)
            .await?;
        candidate.set(draft.kind(), Some(draft.clone()));
        let state = ProfileCompletionState::compute(&candidate);
        if !state.all_required_complete {
            return Err(WorkflowError::ProfileIncomplete {
                missing_sections: state.missing_required,
            });
        }

        self.persist(session, draft).await?;

        match self.finalizer.complete(&session.auth).await? {
            CompletionOutcome::Completed(done) => Ok(done),
            CompletionOutcome::Rejected { missing_sections } => {
                Err(WorkflowError::ProfileIncomplete { missing_sections })
            }
        }
    }

    async fn persist(
        &self,
        session: &mut WorkflowSession,
        draft: SectionPayload,
    ) -> Result<(), WorkflowError> {
        let kind = draft.kind();
        match self.store.save_section(session.auth.user_id, &draft).await {
            Ok(ack) => {
                info!(
                    user_id = %session.auth.user_id,
                    section = %kind,
                    created = ack.created,
                    "Section saved"
                );
                session.sections.set(kind, Some(draft));
                Ok(())
            }
            Err(e) => {
                warn!(user_id = %session.auth.user_id, section = %kind, error = %e, "Section save failed");
                Err(WorkflowError::Persistence(e))
            }
        }
    }

    /// Moves to `target` and refreshes its payload from the store. A failed
    /// fetch keeps the last known payload and returns a warning.
    async fn move_to(&self, session: &mut WorkflowSession, target: Step) -> Vec<String> {
        session.step = target;
        let kind = target.kind();
        match self.store.load_section(session.auth.user_id, kind).await {
            Ok(payload) => {
                session.sections.set(kind, payload);
                Vec::new()
            }
            Err(e) => {
                warn!(user_id = %session.auth.user_id, section = %kind, error = %e, "Section fetch failed");
                vec![format!(
                    "Could not refresh {}; showing the last loaded data",
                    kind.title()
                )]
            }
        }
    }
}

fn ensure_kind(session: &WorkflowSession, draft: &SectionPayload) -> Result<(), WorkflowError> {
    let expected = session.step.kind();
    if draft.kind() != expected {
        return Err(WorkflowError::PayloadMismatch {
            expected,
            actual: draft.kind(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::identity::{MemoryUserDirectory, UserDirectory};
    use crate::profile::testing::{fixtures, retryable, FlakyStore};

    struct Harness {
        store: Arc<FlakyStore>,
        users: Arc<MemoryUserDirectory>,
        controller: WorkflowController,
        auth: AuthContext,
    }

    async fn harness() -> Harness {
        let store = Arc::new(FlakyStore::new());
        let users = Arc::new(MemoryUserDirectory::new(false));
        let user = fixtures::user("ada@example.com");
        let auth = AuthContext { user_id: user.id };
        users.insert(user).await;
        let finalizer = Arc::new(CompletionFinalizer::new(store.clone(), users.clone()));
        let controller = WorkflowController::new(store.clone(), finalizer);
        Harness {
            store,
            users,
            controller,
            auth,
        }
    }

    async fn session_at(h: &Harness, step: u8) -> WorkflowSession {
        let mut session = h.controller.start(h.auth, None).await;
        session.step = Step::new(step).unwrap();
        session
    }

    #[tokio::test]
    async fn test_start_prefills_account_email() {
        let h = harness().await;
        let session = h
            .controller
            .start(h.auth, Some("ada@example.com".to_string()))
            .await;
        let SectionPayload::BasicDetails(details) = session.current_payload() else {
            panic!("expected basic details on step 1");
        };
        assert_eq!(details.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_next_with_empty_first_name_never_advances() {
        let h = harness().await;
        let mut session = h.controller.start(h.auth, None).await;
        assert_eq!(session.step().index(), 1);

        let err = h
            .controller
            .next(&mut session, fixtures::basic_details_without_first_name())
            .await
            .unwrap_err();
        match err {
            WorkflowError::CannotProceed(report) => {
                assert_eq!(report.missing_fields.len(), 1);
                assert_eq!(report.missing_fields[0].field, "firstName");
            }
            other => panic!("expected CannotProceed, got {other:?}"),
        }
        assert_eq!(session.step().index(), 1);
        assert_eq!(h.store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_next_saves_advances_and_fetches() {
        let h = harness().await;
        h.store
            .seed(h.auth.user_id, &[fixtures::skills(&["Haskell"])])
            .await;
        let mut session = session_at(&h, 1).await;

        let view = h
            .controller
            .next(&mut session, fixtures::basic_details())
            .await
            .unwrap();
        assert_eq!(view.step, 2);
        assert_eq!(view.section, SectionKind::Skills);
        assert_eq!(view.payload, fixtures::skills(&["Haskell"]));
        assert!(view.completion.completed_sections.contains(&SectionKind::BasicDetails));

        let stored = h
            .store
            .load_section(h.auth.user_id, SectionKind::BasicDetails)
            .await
            .unwrap();
        assert_eq!(stored, Some(fixtures::basic_details()));
    }

    #[tokio::test]
    async fn test_next_rejects_payload_for_another_step() {
        let h = harness().await;
        let mut session = session_at(&h, 1).await;
        let err = h
            .controller
            .next(&mut session, fixtures::skills(&["Rust"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::PayloadMismatch {
                expected: SectionKind::BasicDetails,
                actual: SectionKind::Skills
            }
        ));
    }

    #[tokio::test]
    async fn test_failed_save_keeps_step_and_is_retryable() {
        let h = harness().await;
        let mut session = session_at(&h, 2).await;
        h.store.fail_saves(SectionKind::Skills, true).await;

        let err = h
            .controller
            .next(&mut session, fixtures::skills(&["Rust"]))
            .await
            .unwrap_err();
        assert!(retryable(&err));
        assert_eq!(session.step().index(), 2);
        assert!(!session.completion().completed_sections.contains(&SectionKind::Skills));

        h.store.fail_saves(SectionKind::Skills, false).await;
        let view = h
            .controller
            .next(&mut session, fixtures::skills(&["Rust"]))
            .await
            .unwrap();
        assert_eq!(view.step, 3);
    }

    #[tokio::test]
    async fn test_next_past_last_step_is_rejected() {
        let h = harness().await;
        let mut session = session_at(&h, 6).await;
        let err = h
            .controller
            .next(&mut session, fixtures::job_roles(&["SRE"]))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { step: 6, .. }));
        assert_eq!(session.step(), Step::last());
    }

    #[tokio::test]
    async fn test_invalid_project_blocks_next_until_removed() {
        let h = harness().await;
        let mut session = session_at(&h, 3).await;

        let broken = fixtures::projects(vec![fixtures::project("Engine", "")]);
        let err = h.controller.next(&mut session, broken).await.unwrap_err();
        let WorkflowError::CannotProceed(report) = err else {
            panic!("expected CannotProceed");
        };
        assert_eq!(report.missing_fields[0].field, "projects[0].startDate");
        assert_eq!(session.step().index(), 3);

        let view = h
            .controller
            .next(&mut session, fixtures::projects(vec![]))
            .await
            .unwrap();
        assert_eq!(view.step, 4);
    }

    #[tokio::test]
    async fn test_previous_does_not_save() {
        let h = harness().await;
        let mut session = session_at(&h, 2).await;
        let view = h.controller.previous(&mut session, None).await.unwrap();
        assert_eq!(view.step, 1);
        assert!(view.warnings.is_empty());
        assert_eq!(h.store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_previous_warns_on_discarded_edits() {
        let h = harness().await;
        let mut session = session_at(&h, 2).await;
        let view = h
            .controller
            .previous(&mut session, Some(fixtures::skills(&["OCaml"])))
            .await
            .unwrap();
        assert_eq!(view.step, 1);
        assert_eq!(view.warnings.len(), 1);
        assert!(view.warnings[0].contains("Skills"));
    }

    #[tokio::test]
    async fn test_previous_from_first_step_is_rejected() {
        let h = harness().await;
        let mut session = session_at(&h, 1).await;
        let err = h.controller.previous(&mut session, None).await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { step: 1, .. }));
    }

    #[tokio::test]
    async fn test_skip_rejected_on_required_steps() {
        let h = harness().await;
        let cases = [
            (1, fixtures::basic_details()),
            (2, fixtures::skills(&["Rust"])),
            (6, fixtures::job_roles(&["SRE"])),
        ];
        for (step, payload) in cases {
            let mut session = session_at(&h, step).await;
            let err = h.controller.skip(&mut session, payload).await.unwrap_err();
            assert!(
                matches!(err, WorkflowError::InvalidTransition { .. }),
                "skip on step {step} should be rejected"
            );
            assert_eq!(session.step().index(), step);
        }
        assert_eq!(h.store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_skip_persists_invalid_entries_with_warning() {
        let h = harness().await;
        let mut session = session_at(&h, 3).await;
        let mut half_done = fixtures::project("Engine", "2023-01-01");
        half_done.details.clear();
        let payload = fixtures::projects(vec![half_done]);

        let view = h.controller.skip(&mut session, payload.clone()).await.unwrap();
        assert_eq!(view.step, 4);
        assert_eq!(view.warnings.len(), 1);

        let stored = h
            .store
            .load_section(h.auth.user_id, SectionKind::Projects)
            .await
            .unwrap();
        assert_eq!(stored, Some(payload));
        assert!(!view.completion.completed_sections.contains(&SectionKind::Projects));
    }

    #[tokio::test]
    async fn test_skip_save_failure_keeps_step() {
        let h = harness().await;
        let mut session = session_at(&h, 4).await;
        h.store.fail_saves(SectionKind::Certifications, true).await;
        let err = h
            .controller
            .skip(&mut session, fixtures::certifications())
            .await
            .unwrap_err();
        assert!(retryable(&err));
        assert_eq!(session.step().index(), 4);
    }

    #[tokio::test]
    async fn test_fetch_failure_after_save_still_advances_with_warning() {
        let h = harness().await;
        let mut session = session_at(&h, 4).await;
        h.store.fail_loads(SectionKind::Experience, true).await;
        let view = h
            .controller
            .next(&mut session, fixtures::certifications())
            .await
            .unwrap();
        assert_eq!(view.step, 5);
        assert_eq!(view.warnings.len(), 1);
        assert_eq!(view.payload, SectionPayload::empty(SectionKind::Experience));
    }

    #[tokio::test]
    async fn test_submit_only_on_last_step() {
        let h = harness().await;
        let mut session = session_at(&h, 5).await;
        let err = h
            .controller
            .submit(&mut session, fixtures::experience())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { step: 5, .. }));
    }

    #[tokio::test]
    async fn test_submit_with_missing_required_sections() {
        let h = harness().await;
        h.store
            .seed(h.auth.user_id, &[fixtures::basic_details()])
            .await;
        let mut session = session_at(&h, 6).await;

        let err = h
            .controller
            .submit(&mut session, fixtures::job_roles(&["SRE"]))
            .await
            .unwrap_err();
        match err {
            WorkflowError::ProfileIncomplete { missing_sections } => {
                assert_eq!(missing_sections, vec![SectionKind::Skills]);
            }
            other => panic!("expected ProfileIncomplete, got {other:?}"),
        }
        assert_eq!(session.step(), Step::last());
        assert_eq!(h.store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_rejected_submit_leaves_session_untouched() {
        let h = harness().await;
        h.store
            .seed(h.auth.user_id, &[fixtures::basic_details()])
            .await;
        let mut session = session_at(&h, 6).await;
        let before = session.completion();

        h.controller
            .submit(&mut session, fixtures::job_roles(&["SRE"]))
            .await
            .unwrap_err();

        assert_eq!(session.completion(), before);
        assert!(!session.completion().completed_sections.contains(&SectionKind::JobRoles));
        let stored = h
            .store
            .load_section(h.auth.user_id, SectionKind::JobRoles)
            .await
            .unwrap();
        assert_eq!(stored, None);
    }

    #[tokio::test]
    async fn test_failed_submit_save_leaves_session_untouched() {
        let h = harness().await;
        h.store
            .seed(
                h.auth.user_id,
                &[fixtures::basic_details(), fixtures::skills(&["Rust"])],
            )
            .await;
        let mut session = session_at(&h, 6).await;
        let before = session.completion();
        h.store.fail_saves(SectionKind::JobRoles, true).await;

        let err = h
            .controller
            .submit(&mut session, fixtures::job_roles(&["SRE"]))
            .await
            .unwrap_err();

        assert!(retryable(&err));
        assert_eq!(session.completion(), before);
        assert!(!session.completion().all_required_complete);
    }

    #[tokio::test]
    async fn test_submit_load_failure_is_retryable_not_incomplete() {
        let h = harness().await;
        let mut seeded = fixtures::complete_profile();
        seeded.pop();
        h.store.seed(h.auth.user_id, &seeded).await;
        let mut session = session_at(&h, 6).await;
        h.store.fail_loads(SectionKind::Skills, true).await;

        let err = h
            .controller
            .submit(&mut session, fixtures::job_roles(&["SRE"]))
            .await
            .unwrap_err();

        assert!(retryable(&err), "expected a retryable storage error, got {err:?}");
        assert_eq!(h.store.save_count(), 0);
        assert_eq!(session.step(), Step::last());
    }

    #[tokio::test]
    async fn test_submit_empty_job_roles_rejected() {
        let h = harness().await;
        h.store
            .seed(
                h.auth.user_id,
                &[fixtures::basic_details(), fixtures::skills(&["Rust"])],
            )
            .await;
        let mut session = session_at(&h, 6).await;
        let err = h
            .controller
            .submit(&mut session, fixtures::job_roles(&[]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::ProfileIncomplete { ref missing_sections } if missing_sections == &vec![SectionKind::JobRoles]
        ));
    }

    #[tokio::test]
    async fn test_full_walkthrough_completes_profile() {
        let h = harness().await;
        let mut session = h.controller.start(h.auth, None).await;
        assert_eq!(session.step().index(), 1);

        h.controller
            .next(&mut session, fixtures::basic_details())
            .await
            .unwrap();
        h.controller
            .next(&mut session, fixtures::skills(&["Rust"]))
            .await
            .unwrap();
        h.controller
            .next(
                &mut session,
                fixtures::projects(vec![fixtures::project("Engine", "2023-01-01")]),
            )
            .await
            .unwrap();
        h.controller
            .next(&mut session, fixtures::certifications())
            .await
            .unwrap();
        let view = h
            .controller
            .next(&mut session, fixtures::experience())
            .await
            .unwrap();
        assert!(view.is_final_step);

        let done = h
            .controller
            .submit(&mut session, fixtures::job_roles(&["Backend Engineer"]))
            .await
            .unwrap();
        assert!(done.user.is_profile_complete);

        let user = h.users.find_user(h.auth.user_id).await.unwrap().unwrap();
        assert!(user.is_profile_complete);

        // A new session resumes on the last step.
        let resumed = h.controller.start(h.auth, None).await;
        assert_eq!(resumed.step(), Step::last());
    }

    #[tokio::test]
    async fn test_unknown_user_cannot_complete() {
        let h = harness().await;
        let stranger = AuthContext {
            user_id: Uuid::new_v4(),
        };
        h.store
            .seed(stranger.user_id, &fixtures::complete_profile())
            .await;
        let mut session = h.controller.start(stranger, None).await;
        assert_eq!(session.step(), Step::last());

        let err = h
            .controller
            .submit(&mut session, fixtures::job_roles(&["SRE"]))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Persistence(_)));
    }
}

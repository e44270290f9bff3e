//! Resume Resolver: where a returning user lands on workflow entry.

use tracing::info;

use crate::auth::AuthContext;
use crate::profile::models::SectionKind;
use crate::profile::step::Step;
use crate::profile::validation::is_filled_opt;
use crate::store::{LoadedSections, SectionStore};

#[derive(Debug, Clone)]
pub struct ResumePoint {
    pub step: Step,
    pub sections: LoadedSections,
}

/// First step whose section is not complete, scanning in step order.
/// Lands on the last step when every section is complete.
pub fn first_incomplete_step(sections: &LoadedSections) -> Step {
    SectionKind::ALL
        .into_iter()
        .find(|kind| !is_filled_opt(sections.get(*kind)))
        .map(Step::of)
        .unwrap_or_else(Step::last)
}

/// Loads every section (tolerating individual failures) and resolves the
/// entry step. A section that failed to load counts as absent.
pub async fn resolve_resume_point(store: &dyn SectionStore, auth: &AuthContext) -> ResumePoint {
    let sections = store.load_all_sections(auth.user_id).await;
    let step = first_incomplete_step(&sections);
    info!(
        user_id = %auth.user_id,
        step = step.index(),
        degraded = ?sections.failed(),
        "Resolved workflow entry step"
    );
    ResumePoint { step, sections }
}

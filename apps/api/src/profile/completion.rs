use std::collections::BTreeSet;

use serde::Serialize;

use crate::profile::models::SectionKind;
use crate::profile::validation::is_filled_opt;
use crate::store::LoadedSections;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SectionStatus {
    pub kind: SectionKind,
    pub step: u8,
    pub title: &'static str,
    pub required: bool,
    pub saved: bool,
    pub complete: bool,
}

/// Derived view over a user's sections. Never stored; build it again from
/// the sections after every change.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCompletionState {
    pub completed_sections: BTreeSet<SectionKind>,
    pub all_required_complete: bool,
    /// Required sections whose predicate is false, in step order.
    pub missing_required: Vec<SectionKind>,
    pub completion_percentage: u8,
    /// Number of leading steps that are complete (0 when step 1 is not).
    pub last_completed_step: u8,
    pub sections: Vec<SectionStatus>,
}

impl ProfileCompletionState {
    pub fn compute(loaded: &LoadedSections) -> Self {
        let sections: Vec<SectionStatus> = SectionKind::ALL
            .into_iter()
            .map(|kind| {
                let payload = loaded.get(kind);
                SectionStatus {
                    kind,
                    step: kind.step(),
                    title: kind.title(),
                    required: kind.required(),
                    saved: payload.is_some(),
                    complete: is_filled_opt(payload),
                }
            })
            .collect();

        let completed_sections: BTreeSet<SectionKind> = sections
            .iter()
            .filter(|s| s.complete)
            .map(|s| s.kind)
            .collect();

        let missing_required: Vec<SectionKind> = sections
            .iter()
            .filter(|s| s.required && !s.complete)
            .map(|s| s.kind)
            .collect();

        let last_completed_step = sections.iter().take_while(|s| s.complete).count() as u8;

        let completion_percentage =
            ((completed_sections.len() * 100) as f64 / SectionKind::ALL.len() as f64).round() as u8;

        ProfileCompletionState {
            all_required_complete: missing_required.is_empty(),
            completed_sections,
            missing_required,
            completion_percentage,
            last_completed_step,
            sections,
        }
    }
}

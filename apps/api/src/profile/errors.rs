use thiserror::Error;

use crate::profile::models::SectionKind;
use crate::profile::validation::ValidationReport;
use crate::store::StoreError;

/// Why a workflow operation did not go through. None of these move the step.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Cannot proceed past {}: {}", .0.kind, .0.summary())]
    CannotProceed(ValidationReport),

    #[error("Profile is incomplete, missing: {missing_sections:?}")]
    ProfileIncomplete { missing_sections: Vec<SectionKind> },

    #[error("Cannot {action} from step {step}: {reason}")]
    InvalidTransition {
        action: &'static str,
        step: u8,
        reason: &'static str,
    },

    #[error("Expected a {expected} payload, got {actual}")]
    PayloadMismatch {
        expected: SectionKind,
        actual: SectionKind,
    },

    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),

    #[error("Invariant violated: {0}")]
    Invariant(String),
}

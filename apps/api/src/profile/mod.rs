//! Multi-step profile completion: section payloads, validation, the workflow
//! state machine, resume resolution and finalization.

pub mod completion;
pub mod errors;
pub mod finalizer;
pub mod handlers;
pub mod models;
pub mod resume;
pub mod sessions;
pub mod step;
pub mod validation;
pub mod workflow;

#[cfg(test)]
pub mod testing;

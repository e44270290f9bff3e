use std::sync::Arc;

use crate::config::Config;
use crate::identity::UserDirectory;
use crate::profile::finalizer::CompletionFinalizer;
use crate::profile::sessions::SessionRegistry;
use crate::profile::workflow::WorkflowController;
use crate::store::SectionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Postgres or in-memory, chosen by `PROFILE_STORE`.
    pub store: Arc<dyn SectionStore>,
    pub users: Arc<dyn UserDirectory>,
    pub workflow: WorkflowController,
    pub finalizer: Arc<CompletionFinalizer>,
    pub sessions: Arc<SessionRegistry>,
    /// Kept for handlers that need runtime settings.
    #[allow(dead_code)]
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn SectionStore>, users: Arc<dyn UserDirectory>, config: Config) -> Self {
        let finalizer = Arc::new(CompletionFinalizer::new(store.clone(), users.clone()));
        let workflow = WorkflowController::new(store.clone(), finalizer.clone());
        Self {
            store,
            users,
            workflow,
            finalizer,
            sessions: Arc::new(SessionRegistry::new(config.session_idle_timeout)),
            config,
        }
    }
}

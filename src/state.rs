//! Application state management
//!
//! Contains shared state accessible across all handlers.

use crate::auth::AuthProvider;
use crate::carddb::CardDatabase;
use crate::moderation::ModerationService;
use crate::repository::Repository;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// Planeswalkers, submissions, change requests and collections
    pub repository: Arc<dyn Repository>,

    /// Registration, login and token validation
    pub auth: Arc<dyn AuthProvider>,

    /// Change request workflow over the repository and live card database
    pub moderation: ModerationService,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn Repository>,
        card_db: Arc<dyn CardDatabase>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        Self {
            moderation: ModerationService::new(repository.clone(), card_db),
            repository,
            auth,
        }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;

use crate::use_cases::{AccountService, SessionRegistry};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    // Live sessions and their world tasks.
    pub session_registry: Arc<SessionRegistry>,
    // Authoritative account workflows shared by sessions and backend routes.
    pub accounts: Arc<AccountService>,
    // Session used when a client connects without `session_id`.
    pub default_session_id: Arc<str>,
}

//! Application state for shared services

use std::sync::Arc;

use crate::infrastructure::account::AccountService;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub account_service: Arc<AccountService>,
}

impl AppState {
    pub fn new(account_service: Arc<AccountService>) -> Self {
        Self { account_service }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("account_service", &self.account_service)
            .finish()
    }
}

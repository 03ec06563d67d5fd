//! Application state.

use std::sync::Arc;

use auth::{JwtConfig, JwtManager};
use book_store::BookStore;

use crate::config::Config;
use crate::services::Mailer;

/// Shared application state.
pub struct AppState<S: BookStore> {
    /// Server configuration.
    pub config: Config,
    /// Book store.
    pub store: S,
    /// JWT manager.
    pub jwt_manager: JwtManager,
    /// Outgoing e-mail.
    pub mailer: Arc<dyn Mailer>,
}

impl<S: BookStore> AppState<S> {
    /// Creates new application state.
    pub fn new(config: Config, store: S, mailer: Arc<dyn Mailer>) -> Self {
        let jwt_config =
            JwtConfig::new(&config.jwt_secret).with_expiration_hours(config.jwt_expiration_hours);

        Self {
            jwt_manager: JwtManager::new(jwt_config),
            config,
            store,
            mailer,
        }
    }
}

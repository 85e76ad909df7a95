//! HTTP request handlers for all Yatube API endpoints.
//!
//! Each submodule covers one resource. Handlers are pure async functions that
//! receive Axum extractors and return `Result<impl IntoResponse, AppError>`.
//!
//! All authorization logic lives here, not in storage: every handler asks its
//! resource's [`yatube::Policy`] once before touching storage and, for object
//! routes, once more after loading the object.

pub mod comments;
pub mod follows;
pub mod groups;
pub mod jwt;
pub mod posts;

use std::{str::FromStr, sync::Arc};

use crate::{config::ServerConfig, error::AppError, storage::Storage, tokens::TokenService};

/// Shared application state threaded through all Axum handlers via [`axum::extract::State`].
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub config: ServerConfig,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, config: ServerConfig) -> Self {
        let tokens = Arc::new(TokenService::from_config(&config));
        Self {
            storage,
            config,
            tokens,
        }
    }

    /// Absolute URL of `path` on the public origin.
    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base, path)
    }
}

/// Parse a path segment as an id. Anything that is not a positive integer
/// cannot name an object, so it is reported as not found.
pub(crate) fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("{what} {raw:?} not found")))
}

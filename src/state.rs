// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::config::Config;
use crate::error::SanitizeError;
use crate::models;
use crate::sanitize::{HtmlSanitizer, field};
use crate::store::HotelStore;

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: HotelStore,
    pub config: Config,
    pub sanitizer: Arc<HtmlSanitizer>,
}

impl AppState {
    /// Builds the sanitizer from `config` and installs it for serde-bound fields.
    pub fn new(config: Config) -> Result<Self, SanitizeError> {
        let sanitizer = Arc::new(HtmlSanitizer::from_config(&config.sanitize)?);
        if !field::install(sanitizer.clone()) {
            tracing::warn!("field-level sanitizer already installed, keeping the first one");
        }
        Self::with_sanitizer(config, sanitizer)
    }

    /// Uses a prebuilt sanitizer as is. Field-level sanitization is not touched.
    pub fn with_sanitizer(
        config: Config,
        sanitizer: Arc<HtmlSanitizer>,
    ) -> Result<Self, SanitizeError> {
        models::register_schemas(&sanitizer)?;
        Ok(Self {
            store: HotelStore::new(),
            config,
            sanitizer,
        })
    }
}

impl FromRef<AppState> for HotelStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<HtmlSanitizer> {
    fn from_ref(state: &AppState) -> Self {
        state.sanitizer.clone()
    }
}

// src/sanitize/hooks.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRef, FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use serde::{Serialize, de::DeserializeOwned};

use super::HtmlSanitizer;
use super::schema::PayloadNode;
use super::scope::CallSite;
use crate::error::AppError;

/// Sanitization hook for the handler serving the current request.
///
/// Routes attach the handler's [`CallSite`] as a request extension; the hook
/// pairs it with the shared sanitizer. Use [`SanitizeHook::respond`] to run the
/// outbound walk right before a response body is serialized.
#[derive(Debug, Clone)]
pub struct SanitizeHook {
    sanitizer: Arc<HtmlSanitizer>,
    site: CallSite,
}

impl SanitizeHook {
    pub fn new(sanitizer: Arc<HtmlSanitizer>, site: CallSite) -> Self {
        Self { sanitizer, site }
    }

    pub fn site(&self) -> CallSite {
        self.site
    }

    /// Sanitizes an inbound payload before the handler sees it.
    pub fn inbound<T: PayloadNode>(&self, payload: &mut T) -> Result<(), AppError> {
        self.sanitizer.sanitize_payload(payload, self.site)?;
        Ok(())
    }

    /// Sanitizes an outbound payload and wraps it for serialization.
    pub fn respond<T: PayloadNode + Serialize>(&self, mut body: T) -> Result<Json<T>, AppError> {
        self.sanitizer.sanitize_payload(&mut body, self.site)?;
        Ok(Json(body))
    }
}

impl<S> FromRequestParts<S> for SanitizeHook
where
    Arc<HtmlSanitizer>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let site = parts.extensions.get::<CallSite>().copied().ok_or_else(|| {
            AppError::InternalServerError(format!(
                "no sanitize call site registered for {} {}",
                parts.method,
                parts.uri.path()
            ))
        })?;
        Ok(Self::new(Arc::from_ref(state), site))
    }
}

/// JSON body extractor that sanitizes the payload before the handler runs.
#[derive(Debug, Clone)]
pub struct SanitizedJson<T>(pub T);

impl<S, T> FromRequest<S> for SanitizedJson<T>
where
    T: DeserializeOwned + PayloadNode + Send,
    Arc<HtmlSanitizer>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();
        let hook = SanitizeHook::from_request_parts(&mut parts, state).await?;

        let Json(mut payload) = Json::<T>::from_request(Request::from_parts(parts, body), state).await?;
        hook.inbound(&mut payload)?;

        Ok(Self(payload))
    }
}

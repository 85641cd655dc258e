//! Authenticated request execution.
//!
//! # Responsibilities
//! - Send a request exactly once (retrying is the caller's business)
//! - Turn 401/403 into an [`AuthenticationError`] and announce it on the
//!   [`AuthFailureSignal`], without reading the body
//! - Hand every other response back untouched, 404 and 5xx included

use std::sync::Arc;

use reqwest::{Client, Request, Response};

use crate::errors::{AuthenticationError, FetchError};
use crate::http::signal::{AuthFailureEvent, AuthFailureSignal};
use crate::observability::metrics;

/// Executes requests and reports auth rejections.
#[derive(Debug, Clone)]
pub struct AuthenticatedFetch {
    client: Client,
    signal: Arc<AuthFailureSignal>,
}

impl AuthenticatedFetch {
    pub fn new(client: Client, signal: Arc<AuthFailureSignal>) -> Self {
        Self { client, signal }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn signal(&self) -> &Arc<AuthFailureSignal> {
        &self.signal
    }

    /// Send `request`. `source` names the call site for the auth event.
    pub async fn fetch_with_auth_handling(
        &self,
        request: Request,
        source: Option<&str>,
    ) -> Result<Response, FetchError> {
        let method = request.method().clone();
        let url = request.url().clone();

        let response = self
            .client
            .execute(request)
            .await
            .map_err(FetchError::Network)?;

        let status = response.status().as_u16();
        if let Some(event) = AuthFailureEvent::from_status(status, source) {
            tracing::warn!(
                %method,
                url = %url,
                status,
                reason = %event.reason,
                source = source.unwrap_or("-"),
                "Backend rejected request credentials"
            );
            metrics::record_auth_failure(event.reason.as_str());
            self.signal.emit(&event);

            return Err(FetchError::Auth(AuthenticationError {
                reason: event.reason,
                status,
                origin: event.source,
            }));
        }

        Ok(response)
    }
}

//! Backend API client.
//!
//! Each call runs the full chain: token from the coordinator, authenticated
//! request, status check, JSON decode. The `*_or_default` and `list`
//! variants never fail; they fold any error into a [`SafeApiResponse`].

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use crate::config::{ApiConfig, ClientConfig};
use crate::errors::{
    create_safe_api_response, handle_api_error, FetchError, Paginated, SafeApiResponse,
};
use crate::http::auth_fetch::AuthenticatedFetch;
use crate::http::signal::AuthFailureSignal;
use crate::observability::metrics;
use crate::session::SessionSource;
use crate::token::TokenCoordinator;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Errors building an [`ApiClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    #[error("Invalid base URL '{url}': {reason}")]
    BaseUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Thin typed wrapper over the backend REST API.
pub struct ApiClient<S> {
    base_url: Url,
    coordinator: Arc<TokenCoordinator<S>>,
    fetch: AuthenticatedFetch,
}

impl<S: SessionSource> ApiClient<S> {
    /// Build a client from config, sharing `coordinator` and `signal` with
    /// the rest of the process.
    pub fn new(
        api: &ApiConfig,
        coordinator: Arc<TokenCoordinator<S>>,
        signal: Arc<AuthFailureSignal>,
    ) -> Result<Self, ClientBuildError> {
        let base_url = parse_base_url(&api.base_url)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.request_timeout_secs))
            .user_agent(api.user_agent.clone())
            .build()?;

        Ok(Self {
            base_url,
            coordinator,
            fetch: AuthenticatedFetch::new(client, signal),
        })
    }

    /// Build the coordinator and signal too, from the full config.
    pub fn from_config(config: &ClientConfig, session: S) -> Result<Self, ClientBuildError> {
        let coordinator = Arc::new(TokenCoordinator::new(session, &config.coordinator));
        Self::new(&config.api, coordinator, Arc::new(AuthFailureSignal::new()))
    }

    pub fn coordinator(&self) -> &Arc<TokenCoordinator<S>> {
        &self.coordinator
    }

    pub fn signal(&self) -> &Arc<AuthFailureSignal> {
        self.fetch.signal()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Forget all token bookkeeping, as on logout.
    pub fn logout(&self) {
        self.coordinator.reset();
    }

    /// GET `path` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        self.send_json::<(), T>(Method::GET, path, None).await
    }

    /// Send a request with an optional JSON body and decode the JSON reply.
    pub async fn send_json<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, FetchError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(method, path, &[], body).await?;
        decode(response).await
    }

    /// GET `path`, falling back to `default` on any failure.
    pub async fn get_or_default<T: DeserializeOwned>(&self, path: &str, default: T) -> SafeApiResponse<T> {
        let result = self.get_json(path).await;
        self.settle(path, result, default)
    }

    /// GET one page of a list endpoint. Failures yield an empty page with
    /// zeroed pagination.
    pub async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        page: u32,
        limit: u32,
    ) -> SafeApiResponse<Paginated<T>> {
        let query = [("page", page.to_string()), ("limit", limit.to_string())];
        let result = match self.send::<()>(Method::GET, path, &query, None).await {
            Ok(response) => decode(response).await,
            Err(e) => Err(e),
        };
        self.settle(path, result, Paginated::empty())
    }

    fn settle<T>(&self, path: &str, result: Result<T, FetchError>, default: T) -> SafeApiResponse<T> {
        match result {
            Ok(data) => SafeApiResponse::ok(data),
            Err(err) => {
                let api_error = handle_api_error(err);
                tracing::warn!(
                    path,
                    kind = %api_error.kind,
                    status = ?api_error.status_code,
                    retryable = api_error.retryable,
                    error = ?api_error.original_error.as_ref().map(|e| e.to_string()),
                    "API call degraded to default response"
                );
                metrics::record_api_error(api_error.kind.as_str());
                create_safe_api_response(default, Some(api_error))
            }
        }
    }

    async fn send<B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<Response, FetchError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(path)?;
        let token = self
            .coordinator
            .get_token_with_retry()
            .await
            .ok_or(FetchError::MissingToken)?;

        let request_id = Uuid::new_v4();
        let mut builder = self
            .fetch
            .client()
            .request(method.clone(), url)
            .bearer_auth(token)
            .header(REQUEST_ID_HEADER, request_id.to_string());
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let request = builder.build().map_err(FetchError::Request)?;

        tracing::debug!(%method, path, %request_id, "Sending API request");
        let response = self.fetch.fetch_with_auth_handling(request, Some(path)).await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = error_message(response).await;
        Err(FetchError::Status {
            status: status.as_u16(),
            message,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        join_path(&self.base_url, path)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ClientBuildError> {
    let mut url = Url::parse(raw).map_err(|e| ClientBuildError::BaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ClientBuildError::BaseUrl {
            url: raw.to_string(),
            reason: "cannot be a base URL".to_string(),
        });
    }
    // Keep the last path segment when joining relative paths.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Join `path` onto the base, treating a leading slash as relative to the
/// base rather than the host root.
fn join_path(base: &Url, path: &str) -> Result<Url, FetchError> {
    base.join(path.trim_start_matches('/'))
        .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", path, e)))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, FetchError> {
    let bytes = response.bytes().await.map_err(FetchError::Network)?;
    serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
}

/// Prefer the backend's own `message`, else a generic status line.
async fn error_message(response: Response) -> String {
    let status = response.status().as_u16();
    let fallback = format!("Request failed with status {}", status);
    match response.json::<Value>().await {
        Ok(body) => body
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string)
            .unwrap_or(fallback),
        Err(_) => fallback,
    }
}

//! Resilient fetch layer for the admin dashboard's backend API.
//!
//! Coordinates authenticated calls: single-flight token refresh with
//! cooldown and capped backoff, auth-failure broadcast, error
//! classification, and degraded-but-safe responses for UI code.

pub mod config;
pub mod errors;
pub mod http;
pub mod observability;
pub mod resilience;
pub mod session;
pub mod token;

pub use config::ClientConfig;
pub use errors::{create_safe_api_response, handle_api_error, ApiError, ErrorKind, SafeApiResponse};
pub use http::{ApiClient, AuthFailureEvent, AuthFailureSignal, AuthenticatedFetch};
pub use session::SessionSource;
pub use token::TokenCoordinator;

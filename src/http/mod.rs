//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! ApiClient call
//!     → TokenCoordinator::get_token_with_retry()   (None → MissingToken)
//!     → request with Bearer token + x-request-id
//!     → auth_fetch.rs (single send)
//!         401/403 → signal.rs emit → Err(AuthenticationError)
//!         other   → response returned as-is
//!     → non-2xx → FetchError::Status, else decode JSON
//!     → on error: classify → SafeApiResponse with default payload
//! ```
//!
//! # Design Decisions
//! - Only the fetch step raises on auth failure; the rest degrades
//! - The signal decouples session teardown from request code

pub mod auth_fetch;
pub mod client;
pub mod signal;

pub use auth_fetch::AuthenticatedFetch;
pub use client::{ApiClient, ClientBuildError};
pub use signal::{AuthFailureEvent, AuthFailureSignal, Subscription};

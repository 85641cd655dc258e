//! Error taxonomy subsystem.
//!
//! # Data Flow
//! ```text
//! FetchError / AuthenticationError / any std::error::Error
//!     → classifier.rs (downcast, then keyword match)
//!     → ApiError { kind, message, status_code, retryable }
//!     → response.rs (SafeApiResponse with the caller's default payload)
//!     → UI renders an empty or degraded state
//! ```
//!
//! # Design Decisions
//! - Classification is total: unknown shapes become non-retryable server errors
//! - Keyword order resolves overlaps (auth before network before validation before server)
//! - The causing error rides along for logs only, never for control flow

pub mod classifier;
pub mod response;
pub mod types;

pub use classifier::{classify, handle_api_error};
pub use response::{create_safe_api_response, Paginated, Pagination, SafeApiResponse};
pub use types::{ApiError, AuthFailureReason, AuthenticationError, ErrorKind, FetchError};

//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Session lookup:
//!     → timeouts.rs (optional deadline, elapsed counts as "no token")
//!
//! Token refresh attempt k:
//!     → backoff.rs (wait base * 2^(k-2), capped; attempt 1 waits nothing)
//! ```
//!
//! # Design Decisions
//! - Deadlines are configurable and off by default
//! - Backoff is exact unless jitter is configured

pub mod backoff;
pub mod timeouts;

pub use backoff::{calculate_backoff, Backoff};
pub use timeouts::with_optional_timeout;

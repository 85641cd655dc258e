//! Token coordination subsystem.
//!
//! # Data Flow
//! ```text
//! get_token_with_retry()
//!     → refresh in flight?  yes → await the shared refresh
//!     → fresh session lookup → token? → cache, retry_count = 0, return it
//!     → admit():
//!         cooldown active       → None
//!         retries exhausted     → None
//!         otherwise             → start shared refresh:
//!                                   backoff sleep (none on attempt 1)
//!                                   → one more session lookup
//!                                   → bookkeeping, wake every waiter
//! ```
//!
//! # Design Decisions
//! - One coordinator per process, passed around explicitly (no global)
//! - The state lock is never held across an await
//! - Refresh failures are logged and become `None`; nothing is thrown

pub mod coordinator;
pub mod state;

pub use coordinator::TokenCoordinator;
pub use state::{Phase, TokenStateSnapshot};

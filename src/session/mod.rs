//! Session token sources.
//!
//! # Data Flow
//! ```text
//! TokenCoordinator
//!     → SessionSource::session_token()  (asked fresh on every call)
//!         → static / env var / token file / session endpoint
//!     ← Ok(Some(token)) | Ok(None) | Err(SessionError)
//! ```
//!
//! # Design Decisions
//! - Sources never cache; the coordinator owns all bookkeeping
//! - "No session" is `Ok(None)`, not an error
//! - Blank tokens are treated as absent

pub mod providers;
pub mod source;

pub use providers::{ConfiguredSession, EnvToken, FileToken, HttpSession, StaticToken};
pub use source::{SessionError, SessionSource};

//! The session lookup seam.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Errors a session lookup can fail with. The token coordinator logs and
/// swallows these; they never reach callers of `get_token_with_retry`.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session endpoint request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Session endpoint returned status {0}")]
    Status(u16),

    #[error("Malformed session payload: {0}")]
    Decode(String),

    #[error("Session lookup timed out after {0:?}")]
    Timeout(Duration),
}

/// Where bearer tokens come from.
///
/// Implementations are asked on every call and must return the freshest
/// token they have; `Ok(None)` means "no valid session".
pub trait SessionSource: Send + Sync + 'static {
    fn session_token(&self) -> impl Future<Output = Result<Option<String>, SessionError>> + Send;
}

impl<S: SessionSource> SessionSource for Arc<S> {
    fn session_token(&self) -> impl Future<Output = Result<Option<String>, SessionError>> + Send {
        (**self).session_token()
    }
}

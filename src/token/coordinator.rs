//! Single-flight token refresh.
//!
//! Every call asks the session source for a fresh token first. Only when
//! that comes back empty does the coordinator consider a refresh, and at
//! most one refresh runs at a time: callers arriving while it is in flight
//! await the same shared future and all see its outcome.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::FutureExt;
use tokio::time::Instant;

use crate::config::CoordinatorConfig;
use crate::observability::metrics;
use crate::resilience::{with_optional_timeout, Backoff};
use crate::session::{SessionError, SessionSource};
use crate::token::state::{Phase, SharedRefresh, TokenState, TokenStateSnapshot};

/// What a caller with an empty lookup is allowed to do.
enum Admission {
    /// Await this refresh (either just started or already running).
    Await(SharedRefresh),
    CooldownBlocked,
    RetriesExhausted,
}

/// Coordinates token lookups and refreshes for one process (or one test).
pub struct TokenCoordinator<S> {
    source: Arc<S>,
    state: Arc<Mutex<TokenState>>,
    max_retries: u32,
    cooldown: Duration,
    lookup_timeout: Option<Duration>,
    backoff: Backoff,
}

impl<S: SessionSource> TokenCoordinator<S> {
    pub fn new(source: S, config: &CoordinatorConfig) -> Self {
        Self {
            source: Arc::new(source),
            state: Arc::new(Mutex::new(TokenState::default())),
            max_retries: config.max_retries,
            cooldown: config.cooldown(),
            lookup_timeout: config.lookup_timeout(),
            backoff: Backoff::from_config(config),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Get a usable token, refreshing if necessary.
    ///
    /// Never fails: `None` means no usable token right now.
    pub async fn get_token_with_retry(&self) -> Option<String> {
        let running = self.lock().in_flight.clone();
        if let Some(refresh) = running {
            tracing::debug!("Joining in-flight token refresh");
            return refresh.await;
        }

        if let Some(token) = lookup(self.source.as_ref(), self.lookup_timeout).await {
            let mut state = self.lock();
            state.token = Some(token.clone());
            state.retry_count = 0;
            return Some(token);
        }

        match self.admit() {
            Admission::Await(refresh) => refresh.await,
            Admission::CooldownBlocked => {
                tracing::debug!("Token refresh skipped: cooldown active");
                metrics::record_refresh_blocked("cooldown");
                None
            }
            Admission::RetriesExhausted => {
                tracing::warn!(max_retries = self.max_retries, "Token refresh skipped: retries exhausted");
                metrics::record_refresh_blocked("retries_exhausted");
                None
            }
        }
    }

    /// Decide, under one lock acquisition, whether to join, start or skip a
    /// refresh. Nothing here awaits, so the check and the set are atomic.
    fn admit(&self) -> Admission {
        let mut state = self.lock();

        if let Some(refresh) = &state.in_flight {
            return Admission::Await(refresh.clone());
        }

        let now = Instant::now();
        if state.in_cooldown(now, self.cooldown) {
            return Admission::CooldownBlocked;
        }
        if state.retry_count >= self.max_retries {
            return Admission::RetriesExhausted;
        }

        let delay = self.backoff.delay_for(state.retry_count);
        state.retry_count += 1;
        state.last_refresh_at = Some(now);

        let attempt = state.retry_count;
        let generation = state.generation;
        let source = Arc::clone(&self.source);
        let shared_state = Arc::clone(&self.state);
        let lookup_timeout = self.lookup_timeout;

        tracing::info!(attempt, delay_ms = delay.as_millis() as u64, "Starting token refresh");

        let refresh = async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let token = lookup(source.as_ref(), lookup_timeout).await;
            finish_refresh(&shared_state, generation, token.as_deref());
            metrics::record_refresh_attempt(token.is_some());
            if token.is_some() {
                tracing::info!(attempt, "Token refresh succeeded");
            } else {
                tracing::warn!(attempt, "Token refresh returned no token");
            }
            token
        }
        .boxed()
        .shared();

        state.in_flight = Some(refresh.clone());
        Admission::Await(refresh)
    }

    /// Clear all bookkeeping, as on logout. An in-flight refresh keeps
    /// running for whoever already awaits it but no longer touches state.
    pub fn reset(&self) {
        self.lock().reset();
        tracing::info!("Token coordinator reset");
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase(Instant::now(), self.cooldown, self.max_retries)
    }

    pub fn snapshot(&self) -> TokenStateSnapshot {
        self.lock().snapshot(Instant::now(), self.cooldown, self.max_retries)
    }

    /// Last token seen. Informational; callers should use
    /// [`get_token_with_retry`](Self::get_token_with_retry).
    pub fn cached_token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock().is_refreshing()
    }

    pub fn retry_count(&self) -> u32 {
        self.lock().retry_count
    }

    fn lock(&self) -> MutexGuard<'_, TokenState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Ask the source once, folding errors, timeouts and panics into `None`.
///
/// A panicking source must not unwind through the shared refresh future:
/// that would leave `in_flight` set and poison every later joiner.
async fn lookup<S: SessionSource>(source: &S, limit: Option<Duration>) -> Option<String> {
    let attempt = AssertUnwindSafe(async { source.session_token().await }).catch_unwind();
    match with_optional_timeout(limit, attempt).await {
        Ok(Ok(Ok(Some(token)))) if !token.is_empty() => {
            metrics::record_token_lookup("found");
            Some(token)
        }
        Ok(Ok(Ok(_))) => {
            metrics::record_token_lookup("missing");
            None
        }
        Ok(Ok(Err(e))) => {
            tracing::warn!(error = %e, "Session lookup failed");
            metrics::record_token_lookup("error");
            None
        }
        Ok(Err(_)) => {
            tracing::error!("Session source panicked during lookup");
            metrics::record_token_lookup("panic");
            None
        }
        Err(limit) => {
            tracing::warn!(error = %SessionError::Timeout(limit), "Session lookup failed");
            metrics::record_token_lookup("timeout");
            None
        }
    }
}

fn finish_refresh(state: &Mutex<TokenState>, generation: u64, token: Option<&str>) {
    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
    if state.generation != generation {
        tracing::debug!("Discarding refresh result from before reset");
        return;
    }

    state.in_flight = None;
    state.last_refresh_at = Some(Instant::now());
    if let Some(token) = token {
        state.token = Some(token.to_string());
        state.retry_count = 0;
    }
}

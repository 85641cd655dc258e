//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Coordinator, fetch layer and API client produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters)
//!
//! Consumers:
//!     → stdout (human or JSON lines)
//!     → Prometheus scrape endpoint (poll mode only)
//! ```
//!
//! # Design Decisions
//! - Tokens are never logged, only whether one was available
//! - Request ID travels with every backend request
//! - Metrics are cheap when no recorder is installed

pub mod logging;
pub mod metrics;

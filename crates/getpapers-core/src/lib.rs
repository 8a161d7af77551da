//! getpapers core - shared infrastructure for literature retrieval
//!
//! HTTP client and runtime with a blocking facade, the rolling-window
//! rate limiter shared by request workers, logging and progress setup.

pub mod http;
pub mod logging;
pub mod progress;
pub mod rate_limit;

// Re-exports for convenience
pub use http::{HttpError, SHARED_RUNTIME, get_text, http_client};
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{FetchProgress, ProgressContext, fmt_num};
pub use rate_limit::RateLimiter;

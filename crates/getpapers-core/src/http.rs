//! Shared HTTP client with a blocking facade.
//!
//! Requests run on a small shared tokio runtime so that rayon workers can
//! issue them synchronously.

use std::sync::LazyLock;
use std::time::Duration;

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error from a single HTTP request
#[derive(Debug)]
pub enum HttpError {
    /// HTTP error with optional status code
    Http {
        status: Option<u16>,
        message: String,
    },
    /// No complete response within the request timeout
    Timeout(Duration),
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Timeout(d) => write!(f, "request timed out after {}s", d.as_secs()),
        }
    }
}

impl std::error::Error for HttpError {}

impl HttpError {
    /// Create HTTP error from reqwest error.
    ///
    /// The URL is stripped: E-utilities API keys travel in the query string.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.without_url().to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => *status,
            Self::Timeout(_) => None,
        }
    }

    /// Server answered 429 Too Many Requests
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }
}

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_max_idle_per_host(8)
        .user_agent(concat!("get-papers-list/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("failed to build HTTP client")
});

/// Get shared HTTP client.
pub fn http_client() -> &'static reqwest::Client {
    &SHARED_CLIENT
}

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Blocking GET returning the response body as text.
///
/// Non-2xx statuses are errors. `timeout` bounds the whole exchange,
/// body included.
pub fn get_text(
    url: &str,
    query: &[(&str, String)],
    timeout: Duration,
) -> Result<String, HttpError> {
    SHARED_RUNTIME.handle().block_on(async {
        let request = async {
            http_client()
                .get(url)
                .query(query)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await
        };

        match tokio::time::timeout(timeout, request).await {
            Ok(result) => result.map_err(HttpError::from_reqwest),
            Err(_) => Err(HttpError::Timeout(timeout)),
        }
    })
}

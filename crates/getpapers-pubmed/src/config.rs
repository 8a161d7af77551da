//! PubMed pipeline configuration

use std::time::Duration;

/// Runtime configuration for the PubMed pipeline.
///
/// Passed explicitly into the client and retriever; nothing here is global.
#[derive(Debug, Clone)]
pub struct Config {
    /// E-utilities base URL (esearch.fcgi / efetch.fcgi are appended)
    pub base_url: String,
    /// Tool name reported to NCBI
    pub tool: String,
    /// Operator contact address reported to NCBI
    pub email: Option<String>,
    /// NCBI API key (raises the server-side limit to 10 req/s)
    pub api_key: Option<String>,
    /// Cap on the number of search hits fetched
    pub max_results: usize,
    /// Records per efetch call
    pub batch_size: usize,
    /// Concurrent batch workers
    pub max_concurrency: usize,
    /// Requests allowed per `rate_limit_period`
    pub rate_limit_calls: usize,
    pub rate_limit_period: Duration,
    /// Upper bound for one HTTP exchange
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/".to_string(),
            tool: "get-papers-list".to_string(),
            email: None,
            api_key: None,
            max_results: 300,
            batch_size: 50,
            max_concurrency: 5,
            rate_limit_calls: 3,
            rate_limit_period: Duration::from_secs(1),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl Config {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.batch_size > 0, "batch_size must be at least 1");
        anyhow::ensure!(
            self.max_concurrency > 0,
            "max_concurrency must be at least 1"
        );
        anyhow::ensure!(
            self.rate_limit_calls > 0,
            "rate limit must allow at least 1 call per period"
        );
        anyhow::ensure!(
            self.base_url.starts_with("http://") || self.base_url.starts_with("https://"),
            "base_url must be an http(s) URL: {}",
            self.base_url
        );
        Ok(())
    }

    /// Full URL of an E-utility endpoint, e.g. `esearch.fcgi`.
    pub fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), name)
    }
}

//! NCBI E-utilities client: esearch with history, efetch by history cursor
//!
//! The [`EntrezApi`] trait is the seam the retriever is written against;
//! [`EutilsClient`] is the HTTP implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use getpapers_core::HttpError;
use serde::Deserialize;

use crate::config::Config;

/// Server-side history handle returned by `esearch&usehistory=y`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySession {
    pub web_env: String,
    pub query_key: String,
}

/// Outcome of the initial search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Total hits available on the server
    pub count: usize,
    /// Present whenever the server stored the result set
    pub session: Option<HistorySession>,
}

/// Remote literature database operations used by the pipeline.
pub trait EntrezApi: Send + Sync {
    /// Run `term` and keep the result set server-side.
    fn search(&self, term: &str, max_results: usize) -> Result<SearchResult>;

    /// Raw efetch XML for records `[offset, offset + count)` of `session`.
    fn fetch(&self, session: &HistorySession, offset: usize, count: usize) -> Result<String>;
}

/// HTTP E-utilities client
#[derive(Debug, Clone)]
pub struct EutilsClient {
    esearch_url: String,
    efetch_url: String,
    tool: String,
    email: Option<String>,
    api_key: Option<String>,
    timeout: Duration,
}

impl EutilsClient {
    pub fn new(config: &Config) -> Self {
        Self {
            esearch_url: config.endpoint("esearch.fcgi"),
            efetch_url: config.endpoint("efetch.fcgi"),
            tool: config.tool.clone(),
            email: config.email.clone(),
            api_key: config.api_key.clone(),
            timeout: config.request_timeout,
        }
    }

    /// `db`, `tool` and, when configured, `email` / `api_key`
    fn base_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("db", "pubmed".to_string()), ("tool", self.tool.clone())];
        if let Some(email) = &self.email {
            params.push(("email", email.clone()));
        }
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }
        params
    }

    fn get(&self, url: &str, params: &[(&str, String)]) -> Result<String, HttpError> {
        getpapers_core::get_text(url, params, self.timeout).inspect_err(|e| {
            if e.is_rate_limited() {
                log::warn!("NCBI rejected the request as rate limited (HTTP 429)");
            }
        })
    }
}

impl EntrezApi for EutilsClient {
    fn search(&self, term: &str, max_results: usize) -> Result<SearchResult> {
        let mut params = self.base_params();
        params.push(("term", term.to_string()));
        params.push(("retmax", max_results.to_string()));
        params.push(("usehistory", "y".to_string()));
        params.push(("retmode", "json".to_string()));

        log::debug!("esearch: {term:?} (retmax={max_results})");
        let body = self
            .get(&self.esearch_url, &params)
            .context("esearch request failed")?;
        parse_esearch_json(&body)
    }

    fn fetch(&self, session: &HistorySession, offset: usize, count: usize) -> Result<String> {
        let mut params = self.base_params();
        params.push(("query_key", session.query_key.clone()));
        params.push(("WebEnv", session.web_env.clone()));
        params.push(("retstart", offset.to_string()));
        params.push(("retmax", count.to_string()));
        params.push(("retmode", "xml".to_string()));

        log::debug!("efetch: retstart={offset} retmax={count}");
        self.get(&self.efetch_url, &params)
            .with_context(|| format!("efetch request failed (retstart={offset})"))
    }
}

#[derive(Debug, Deserialize)]
struct ESearchResponse {
    esearchresult: Option<ESearchBody>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ESearchBody {
    count: Option<String>,
    webenv: Option<String>,
    querykey: Option<String>,
    #[serde(rename = "ERROR")]
    error: Option<String>,
}

/// Parse an `esearch` JSON body (`retmode=json`).
pub fn parse_esearch_json(body: &str) -> Result<SearchResult> {
    let response: ESearchResponse =
        serde_json::from_str(body).context("Invalid esearch JSON")?;

    if let Some(error) = response.error {
        anyhow::bail!("esearch returned an error: {error}");
    }
    let result = response
        .esearchresult
        .context("No 'esearchresult' in esearch response")?;
    if let Some(error) = result.error {
        anyhow::bail!("esearch returned an error: {error}");
    }

    let count = result
        .count
        .context("No 'count' in esearch response")?
        .trim()
        .parse::<usize>()
        .context("Invalid 'count' in esearch response")?;

    let session = match (result.webenv, result.querykey) {
        (Some(web_env), Some(query_key)) if !web_env.is_empty() && !query_key.is_empty() => {
            Some(HistorySession { web_env, query_key })
        }
        _ => None,
    };

    Ok(SearchResult { count, session })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_esearch_with_history() {
        let body = r#"{
            "header": {"type": "esearch", "version": "0.3"},
            "esearchresult": {
                "count": "1234",
                "retmax": "300",
                "retstart": "0",
                "querykey": "1",
                "webenv": "MCID_65a1b2c3d4e5f6",
                "idlist": ["38000001", "38000002"],
                "translationset": [],
                "querytranslation": "cancer[All Fields]"
            }
        }"#;
        let result = parse_esearch_json(body).unwrap();
        assert_eq!(result.count, 1234);
        assert_eq!(
            result.session,
            Some(HistorySession {
                web_env: "MCID_65a1b2c3d4e5f6".to_string(),
                query_key: "1".to_string(),
            })
        );
    }

    #[test]
    fn parse_esearch_zero_hits_without_session() {
        let body = r#"{"esearchresult": {"count": "0", "idlist": []}}"#;
        let result = parse_esearch_json(body).unwrap();
        assert_eq!(result.count, 0);
        assert!(result.session.is_none());
    }

    #[test]
    fn parse_esearch_error_field() {
        let body = r#"{"esearchresult": {"ERROR": "Invalid query syntax"}}"#;
        let err = parse_esearch_json(body).unwrap_err();
        assert!(err.to_string().contains("Invalid query syntax"));
    }

    #[test]
    fn parse_esearch_top_level_error() {
        let body = r#"{"error": "API rate limit exceeded", "count": "4"}"#;
        let err = parse_esearch_json(body).unwrap_err();
        assert!(err.to_string().contains("API rate limit exceeded"));
    }

    #[test]
    fn parse_esearch_missing_count() {
        let body = r#"{"esearchresult": {"webenv": "X", "querykey": "1"}}"#;
        assert!(parse_esearch_json(body).is_err());
    }

    #[test]
    fn parse_esearch_not_json() {
        assert!(parse_esearch_json("<html>502 Bad Gateway</html>").is_err());
    }

    #[test]
    fn base_params_carry_identity() {
        let config = Config {
            email: Some("ops@example.org".to_string()),
            api_key: Some("secret".to_string()),
            ..Default::default()
        };
        let client = EutilsClient::new(&config);
        let params = client.base_params();
        assert!(params.contains(&("db", "pubmed".to_string())));
        assert!(params.contains(&("tool", "get-papers-list".to_string())));
        assert!(params.contains(&("email", "ops@example.org".to_string())));
        assert!(params.contains(&("api_key", "secret".to_string())));
    }

    #[test]
    fn base_params_without_identity() {
        let client = EutilsClient::new(&Config::default());
        let params = client.base_params();
        assert!(!params.iter().any(|(k, _)| *k == "email" || *k == "api_key"));
        assert!(client.esearch_url.ends_with("/esearch.fcgi"));
        assert!(client.efetch_url.ends_with("/efetch.fcgi"));
    }
}

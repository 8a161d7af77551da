//! One rate-limited efetch call → parsed papers

use anyhow::{Context, Result};
use getpapers_core::RateLimiter;

use crate::eutils::{EntrezApi, HistorySession};
use crate::model::Paper;
use crate::parser::{ArticleRecord, parse_efetch_xml};
use crate::transform::to_paper;

/// Contiguous slice `[offset, offset + size)` of the search results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
    pub offset: usize,
    pub size: usize,
}

impl std::fmt::Display for Batch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "batch@{}+{}", self.offset, self.size)
    }
}

/// Fetches one batch through the shared limiter.
pub struct BatchFetcher<'a, A> {
    api: &'a A,
    limiter: &'a RateLimiter,
}

impl<'a, A: EntrezApi> BatchFetcher<'a, A> {
    pub fn new(api: &'a A, limiter: &'a RateLimiter) -> Self {
        Self { api, limiter }
    }

    /// Fetch and parse one batch.
    ///
    /// Errors only when the call or the document as a whole fails; bad
    /// articles are skipped with a warning. Source order is preserved.
    pub fn fetch(&self, session: &HistorySession, batch: Batch) -> Result<Vec<Paper>> {
        self.limiter.acquire();
        log::debug!("Fetching {batch}");

        let xml = self.api.fetch(session, batch.offset, batch.size)?;
        let records =
            parse_efetch_xml(&xml).with_context(|| format!("Failed to parse {batch}"))?;

        Ok(collect_papers(records, batch))
    }
}

/// Keep parsed articles, log skipped ones, never exceed the batch size.
pub fn collect_papers(records: Vec<ArticleRecord>, batch: Batch) -> Vec<Paper> {
    let mut papers = Vec::with_capacity(records.len().min(batch.size));

    for (i, record) in records.into_iter().enumerate() {
        match record.and_then(to_paper) {
            Ok(paper) => papers.push(paper),
            Err(reason) => log::warn!("{batch}: skipping article #{}: {reason}", batch.offset + i),
        }
    }

    if papers.len() > batch.size {
        log::debug!(
            "{batch}: server returned {} records, keeping {}",
            papers.len(),
            batch.size
        );
        papers.truncate(batch.size);
    }
    papers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockApi, article_xml, article_set};

    fn session() -> HistorySession {
        HistorySession {
            web_env: "MCID_test".to_string(),
            query_key: "1".to_string(),
        }
    }

    #[test]
    fn fetch_parses_batch_in_source_order() {
        let api = MockApi::new(10);
        let limiter = RateLimiter::unlimited();
        let fetcher = BatchFetcher::new(&api, &limiter);

        let papers = fetcher
            .fetch(&session(), Batch { offset: 4, size: 3 })
            .unwrap();
        let pmids: Vec<_> = papers.iter().map(|p| p.pmid.as_str()).collect();
        assert_eq!(pmids, vec!["5", "6", "7"]);
        assert_eq!(api.calls(), vec![(4, 3)]);
    }

    #[test]
    fn fetch_propagates_call_failure() {
        let api = MockApi::new(100).fail_at(50);
        let limiter = RateLimiter::unlimited();
        let fetcher = BatchFetcher::new(&api, &limiter);

        assert!(fetcher.fetch(&session(), Batch { offset: 50, size: 50 }).is_err());
    }

    #[test]
    fn malformed_articles_are_skipped() {
        let xml = article_set(&[
            article_xml(1),
            "<PubmedArticle><PubmedData/></PubmedArticle>".to_string(),
            "<PubmedArticle><MedlineCitation><Article/></MedlineCitation></PubmedArticle>"
                .to_string(),
            article_xml(4),
        ]);
        let records = parse_efetch_xml(&xml).unwrap();
        let papers = collect_papers(records, Batch { offset: 0, size: 4 });
        let pmids: Vec<_> = papers.iter().map(|p| p.pmid.as_str()).collect();
        assert_eq!(pmids, vec!["1", "4"]);
    }

    #[test]
    fn oversized_response_truncated() {
        let xml = article_set(&(1..=5).map(article_xml).collect::<Vec<_>>());
        let records = parse_efetch_xml(&xml).unwrap();
        let papers = collect_papers(records, Batch { offset: 0, size: 3 });
        assert_eq!(papers.len(), 3);
    }

    #[test]
    fn batch_display() {
        assert_eq!(Batch { offset: 100, size: 20 }.to_string(), "batch@100+20");
    }
}

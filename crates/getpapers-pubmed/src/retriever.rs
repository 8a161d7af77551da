//! Search once, then fetch the result set in concurrent batches

use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use getpapers_core::{FetchProgress, RateLimiter};
use rayon::prelude::*;

use crate::config::Config;
use crate::eutils::EntrezApi;
use crate::fetcher::{Batch, BatchFetcher};
use crate::model::Paper;

/// Split `[0, total)` into contiguous batches; the last one may be shorter.
pub fn plan_batches(total: usize, batch_size: usize) -> Vec<Batch> {
    let batch_size = batch_size.max(1);
    (0..total)
        .step_by(batch_size)
        .map(|offset| Batch {
            offset,
            size: batch_size.min(total - offset),
        })
        .collect()
}

/// Batched, rate-limited retrieval of search results.
///
/// One limiter instance is shared by every worker, search call included.
pub struct Retriever<A> {
    api: A,
    limiter: RateLimiter,
    max_results: usize,
    batch_size: usize,
    max_concurrency: usize,
}

impl<A: EntrezApi> Retriever<A> {
    pub fn new(api: A, config: &Config) -> Self {
        Self {
            api,
            limiter: RateLimiter::new(config.rate_limit_calls, config.rate_limit_period),
            max_results: config.max_results,
            batch_size: config.batch_size.max(1),
            max_concurrency: config.max_concurrency.max(1),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Search for `query` and fetch up to `max_results` papers.
    ///
    /// Papers arrive in batch completion order. Failed batches are logged and
    /// left out; only a failed search is an error.
    pub fn retrieve(&self, query: &str, progress: &FetchProgress) -> Result<Vec<Paper>> {
        self.limiter.acquire();
        let search = self
            .api
            .search(query, self.max_results)
            .with_context(|| format!("PubMed search failed for {query:?}"))?;

        let effective = search.count.min(self.max_results);
        log::debug!(
            "Total available: {} | Fetching up to {}",
            search.count,
            effective
        );
        if effective == 0 {
            return Ok(Vec::new());
        }

        let session = search
            .session
            .context("esearch reported hits but returned no history session")?;
        let batches = plan_batches(effective, self.batch_size);
        log::debug!(
            "Dispatching {} batches of up to {} with {} workers",
            batches.len(),
            self.batch_size,
            self.max_concurrency
        );
        progress.set_batches(batches.len());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_concurrency)
            .build()
            .context("Failed to create thread pool")?;

        let fetcher = BatchFetcher::new(&self.api, &self.limiter);
        let papers: Mutex<Vec<Paper>> = Mutex::new(Vec::with_capacity(effective));

        pool.install(|| {
            batches.par_iter().for_each(|&batch| {
                match fetcher.fetch(&session, batch) {
                    Ok(batch_papers) => {
                        log::debug!("{batch}: {} papers", batch_papers.len());
                        progress.batch_done(batch_papers.len());
                        papers
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .extend(batch_papers);
                    }
                    Err(e) => {
                        progress.batch_failed();
                        log::warn!("Batch fetch failed ({batch}): {e:#}");
                    }
                }
            });
        });

        let failed = progress.failed();
        if failed > 0 {
            log::warn!("{failed}/{} batches failed", batches.len());
        }

        Ok(papers.into_inner().unwrap_or_else(PoisonError::into_inner))
    }
}

//! Main runner: retrieve → classify → filter

use std::time::{Duration, Instant};

use anyhow::Result;
use getpapers_core::{ProgressContext, fmt_num};

use crate::classify::filter_non_academic;
use crate::config::Config;
use crate::eutils::{EntrezApi, EutilsClient};
use crate::model::Paper;
use crate::retriever::Retriever;

/// Pipeline execution summary
#[derive(Debug)]
pub struct Summary {
    /// Papers parsed from all successful batches
    pub fetched: usize,
    /// Papers with at least one non-academic author, classified
    pub papers: Vec<Paper>,
    pub elapsed: Duration,
}

/// Run the pipeline against NCBI E-utilities.
pub fn run(config: &Config, query: &str, progress: &ProgressContext) -> Result<Summary> {
    config.validate()?;
    let retriever = Retriever::new(EutilsClient::new(config), config);
    run_with(&retriever, query, progress)
}

/// Run the pipeline with any [`EntrezApi`] implementation.
pub fn run_with<A: EntrezApi>(
    retriever: &Retriever<A>,
    query: &str,
    progress: &ProgressContext,
) -> Result<Summary> {
    let start = Instant::now();
    log::debug!("Query: {query}");

    let bar = progress.fetch_bar("efetch");
    let fetched = retriever.retrieve(query, &bar);
    bar.finish();
    let fetched = fetched?;

    let fetched_count = fetched.len();
    log::info!("Fetched {} papers.", fmt_num(fetched_count));

    let papers = filter_non_academic(fetched);
    log::info!(
        "{} papers have at least one non-academic author.",
        fmt_num(papers.len())
    );

    let summary = Summary {
        fetched: fetched_count,
        papers,
        elapsed: start.elapsed(),
    };

    log::debug!("Time: {:.1}s", summary.elapsed.as_secs_f64());
    if summary.fetched > 0 {
        let rate = summary.fetched as f64 / summary.elapsed.as_secs_f64();
        log::debug!("Throughput: {rate:.0} papers/sec");
    }

    Ok(summary)
}

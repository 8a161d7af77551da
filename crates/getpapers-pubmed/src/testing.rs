//! In-memory E-utilities stand-in for unit tests

use std::sync::Mutex;

use anyhow::Result;

use crate::eutils::{EntrezApi, HistorySession, SearchResult};

/// Serves `count` synthetic articles with PMIDs `1..=count`.
pub struct MockApi {
    count: usize,
    fail_offsets: Vec<usize>,
    fail_search: bool,
    calls: Mutex<Vec<(usize, usize)>>,
}

impl MockApi {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            fail_offsets: Vec::new(),
            fail_search: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Make the efetch call starting at `offset` fail.
    pub fn fail_at(mut self, offset: usize) -> Self {
        self.fail_offsets.push(offset);
        self
    }

    pub fn failing_search(mut self) -> Self {
        self.fail_search = true;
        self
    }

    /// `(offset, count)` of every efetch call, sorted by offset
    pub fn calls(&self) -> Vec<(usize, usize)> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort();
        calls
    }
}

impl EntrezApi for MockApi {
    fn search(&self, _term: &str, _max_results: usize) -> Result<SearchResult> {
        anyhow::ensure!(!self.fail_search, "simulated esearch failure");
        Ok(SearchResult {
            count: self.count,
            session: Some(HistorySession {
                web_env: "MCID_test".to_string(),
                query_key: "1".to_string(),
            }),
        })
    }

    fn fetch(&self, _session: &HistorySession, offset: usize, count: usize) -> Result<String> {
        self.calls.lock().unwrap().push((offset, count));
        anyhow::ensure!(
            !self.fail_offsets.contains(&offset),
            "simulated efetch failure at {offset}"
        );
        let end = (offset + count).min(self.count);
        let articles: Vec<String> = (offset + 1..=end).map(article_xml).collect();
        Ok(article_set(&articles))
    }
}

/// One `<PubmedArticle>`: even PMIDs have a commercial co-author.
pub fn article_xml(pmid: usize) -> String {
    let company = if pmid % 2 == 0 {
        format!(
            "<Author><LastName>Roe</LastName><ForeName>Jane</ForeName>\
             <AffiliationInfo><Affiliation>Acme Pharma Inc, Boston. jane{pmid}@acme.com</Affiliation></AffiliationInfo>\
             </Author>"
        )
    } else {
        String::new()
    };
    format!(
        "<PubmedArticle><MedlineCitation><PMID>{pmid}</PMID><Article>\
         <Journal><JournalIssue><PubDate><Year>2024</Year><Month>Feb</Month></PubDate></JournalIssue></Journal>\
         <ArticleTitle>Paper {pmid}</ArticleTitle>\
         <AuthorList>\
         <Author><LastName>Doe</LastName><ForeName>John</ForeName>\
         <AffiliationInfo><Affiliation>Department of Biology, Example University</Affiliation></AffiliationInfo>\
         </Author>{company}\
         </AuthorList></Article></MedlineCitation></PubmedArticle>"
    )
}

pub fn article_set(articles: &[String]) -> String {
    format!(
        "<?xml version=\"1.0\" ?>\n<PubmedArticleSet>{}</PubmedArticleSet>",
        articles.concat()
    )
}

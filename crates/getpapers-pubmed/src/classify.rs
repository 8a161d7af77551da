//! Academic vs. commercial author classification
//!
//! Pure keyword heuristics over the affiliation text and the email suffix.
//! An academic keyword always wins over commercial signals.

use std::collections::BTreeSet;

use crate::model::{Author, Paper};

const ACADEMIC_KEYWORDS: &[&str] = &[
    "university",
    "college",
    "institute",
    "hospital",
    "center",
    "school",
    "faculty",
    "department",
];

const COMPANY_KEYWORDS: &[&str] = &[
    "pharma",
    "biotech",
    "inc",
    "ltd",
    "llc",
    "laboratories",
    "labs",
    "gmbh",
    "corp",
    "plc",
];

const COMMERCIAL_EMAIL_SUFFIXES: &[&str] = &[".com", ".co", ".io"];

/// Non-academic authors of one paper and their organisations.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Names in author order
    pub non_academic_authors: Vec<String>,
    /// Trimmed affiliation strings, deduplicated
    pub company_affiliations: BTreeSet<String>,
}

/// Whether one author looks commercial. Authors without an affiliation never do.
pub fn is_non_academic(author: &Author) -> bool {
    let Some(affiliation) = author
        .affiliation
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
    else {
        return false;
    };

    let affiliation = affiliation.to_lowercase();
    let email = author.email.as_deref().unwrap_or_default().to_lowercase();

    let is_academic = ACADEMIC_KEYWORDS.iter().any(|k| affiliation.contains(k));
    let is_commercial_affiliation = COMPANY_KEYWORDS.iter().any(|k| affiliation.contains(k));
    let is_commercial_email = COMMERCIAL_EMAIL_SUFFIXES
        .iter()
        .any(|s| email.ends_with(s));

    !is_academic && (is_commercial_affiliation || is_commercial_email)
}

/// Partition a paper's authors, keeping the non-academic ones.
pub fn classify_authors(authors: &[Author]) -> Classification {
    let mut result = Classification::default();
    for author in authors.iter().filter(|a| is_non_academic(a)) {
        result.non_academic_authors.push(author.name.clone());
        if let Some(affiliation) = &author.affiliation {
            result
                .company_affiliations
                .insert(affiliation.trim().to_string());
        }
    }
    result
}

/// Classify every paper and keep those with at least one non-academic author.
pub fn filter_non_academic(papers: Vec<Paper>) -> Vec<Paper> {
    papers
        .into_iter()
        .filter_map(|paper| {
            let classification = classify_authors(&paper.authors);
            let paper = paper.with_classification(classification);
            paper.has_non_academic_author().then_some(paper)
        })
        .collect()
}

//! Paper and author records produced by batch parsing

use std::collections::BTreeSet;

use crate::classify::Classification;

/// One author as parsed from an efetch record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    /// First address found in the affiliation text
    pub email: Option<String>,
    /// First affiliation string, untouched
    pub affiliation: Option<String>,
}

/// A PubMed article with its classification results.
///
/// `authors` is fixed at construction. The classification fields start empty
/// and are filled once, by [`Paper::with_classification`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paper {
    pub pmid: String,
    pub title: String,
    /// `Month Year`, best effort, or `Unknown`
    pub pub_date: String,
    pub authors: Vec<Author>,
    pub non_academic_authors: Vec<String>,
    pub company_affiliations: BTreeSet<String>,
    pub corresponding_email: Option<String>,
}

impl Paper {
    pub fn new(pmid: String, title: String, pub_date: String, authors: Vec<Author>) -> Self {
        let corresponding_email = corresponding_email(&authors);
        Self {
            pmid,
            title,
            pub_date,
            authors,
            non_academic_authors: Vec::new(),
            company_affiliations: BTreeSet::new(),
            corresponding_email,
        }
    }

    /// Attach classifier output, consuming the unclassified paper.
    pub fn with_classification(self, classification: Classification) -> Self {
        Self {
            non_academic_authors: classification.non_academic_authors,
            company_affiliations: classification.company_affiliations,
            ..self
        }
    }

    pub fn has_non_academic_author(&self) -> bool {
        !self.non_academic_authors.is_empty()
    }
}

/// First non-empty author email, in author order.
pub fn corresponding_email(authors: &[Author]) -> Option<String> {
    authors
        .iter()
        .filter_map(|a| a.email.as_deref())
        .find(|e| !e.is_empty())
        .map(str::to_string)
}

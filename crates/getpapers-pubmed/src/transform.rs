//! Raw efetch records → [`Paper`]

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Author, Paper};
use crate::parser::{RawArticle, RawAuthor, RawPubDate, SkipReason};

/// Loose email pattern, good enough for affiliation free text
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("valid email regex")
});

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub const UNKNOWN_DATE: &str = "Unknown";
pub const NO_TITLE: &str = "No title";

/// Build a paper from one parsed article, or say why it is skipped.
pub fn to_paper(raw: RawArticle) -> Result<Paper, SkipReason> {
    let citation = raw.citation.ok_or(SkipReason::MissingCitation)?;
    let pmid = citation.pmid.ok_or(SkipReason::MissingPmid)?;
    let article = citation.article.ok_or(SkipReason::MissingArticle)?;

    let title = article.title.unwrap_or_else(|| NO_TITLE.to_string());
    let pub_date = format_pub_date(article.pub_date.as_ref());
    let authors = article.authors.iter().filter_map(to_author).collect();

    Ok(Paper::new(pmid, title, pub_date, authors))
}

/// Authors without a surname (collective names) are dropped.
pub fn to_author(raw: &RawAuthor) -> Option<Author> {
    let last = raw.last_name.as_deref()?;
    let given = raw
        .fore_name
        .as_deref()
        .or(raw.initials.as_deref())
        .unwrap_or_default();
    let name = format!("{given} {last}").trim().to_string();

    let affiliation = raw.affiliations.first().cloned();
    let email = affiliation.as_deref().and_then(extract_email);

    Some(Author {
        name,
        email,
        affiliation,
    })
}

/// First email-looking token in `text`
pub fn extract_email(text: &str) -> Option<String> {
    EMAIL_RE.find(text).map(|m| m.as_str().to_string())
}

/// `Month Year` from a PubDate block, falling back to MedlineDate, then `Unknown`.
pub fn format_pub_date(date: Option<&RawPubDate>) -> String {
    let Some(date) = date else {
        return UNKNOWN_DATE.to_string();
    };

    let month = date.month.as_deref().map(month_label).unwrap_or_default();
    let year = date.year.as_deref().unwrap_or_default();
    let formatted = format!("{month} {year}").trim().to_string();

    if !formatted.is_empty() {
        return formatted;
    }
    date.medline_date
        .clone()
        .unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

/// Numeric months become `Jan`..`Dec`; anything else passes through.
fn month_label(month: &str) -> String {
    match month.parse::<usize>() {
        Ok(n @ 1..=12) => MONTHS[n - 1].to_string(),
        _ => month.to_string(),
    }
}

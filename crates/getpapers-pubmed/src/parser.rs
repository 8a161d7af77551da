//! efetch XML parser using quick-xml
//!
//! Produces a loosely-typed intermediate ([`RawArticle`]) where every field
//! the source may omit is an `Option`. Turning that into a [`crate::Paper`]
//! is the transform's job.

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::Event;

/// One `<PubmedArticle>` as found in the document
#[derive(Debug, Default)]
pub struct RawArticle {
    pub citation: Option<RawCitation>,
}

/// `<MedlineCitation>`
#[derive(Debug, Default)]
pub struct RawCitation {
    pub pmid: Option<String>,
    pub article: Option<RawArticleBody>,
}

/// `<MedlineCitation>/<Article>`
#[derive(Debug, Default)]
pub struct RawArticleBody {
    pub title: Option<String>,
    /// `<Journal>/<JournalIssue>/<PubDate>`
    pub pub_date: Option<RawPubDate>,
    pub authors: Vec<RawAuthor>,
}

#[derive(Debug, Default, Clone)]
pub struct RawPubDate {
    pub year: Option<String>,
    pub month: Option<String>,
    pub medline_date: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct RawAuthor {
    pub last_name: Option<String>,
    pub fore_name: Option<String>,
    pub initials: Option<String>,
    pub affiliations: Vec<String>,
}

/// Why an article was left out of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingCitation,
    MissingArticle,
    MissingPmid,
    /// XML inside the article could not be read
    Malformed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCitation => write!(f, "no MedlineCitation"),
            Self::MissingArticle => write!(f, "no Article block"),
            Self::MissingPmid => write!(f, "no PMID"),
            Self::Malformed(msg) => write!(f, "malformed XML: {msg}"),
        }
    }
}

/// Per-article parse outcome, in document order
pub type ArticleRecord = std::result::Result<RawArticle, SkipReason>;

/// Parse an efetch response body.
///
/// Fails as a whole only when the document is not a `PubmedArticleSet`,
/// carries an E-utilities `<ERROR>`, or breaks between articles.
pub fn parse_efetch_xml(xml: &str) -> Result<Vec<ArticleRecord>> {
    let mut reader = Reader::from_str(xml);

    let mut records = Vec::new();
    let mut saw_article_set = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"PubmedArticleSet" => saw_article_set = true,
                b"PubmedArticle" => match parse_article(&mut reader) {
                    Ok(article) => records.push(Ok(article)),
                    Err(e) => {
                        log::debug!("Failed to parse article: {e:#}");
                        records.push(Err(SkipReason::Malformed(format!("{e:#}"))));
                    }
                },
                b"ERROR" => {
                    let message = read_field(&mut reader)?;
                    anyhow::bail!("efetch returned an error: {message}");
                }
                b"eFetchResult" => {}
                // Book chapters and deletions carry no journal metadata
                other => skip_element(&mut reader, other)?,
            },
            Ok(Event::Empty(e)) if e.name().as_ref() == b"PubmedArticleSet" => {
                saw_article_set = true;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e).context("XML parse error"),
            _ => {}
        }
        buf.clear();
    }

    anyhow::ensure!(
        saw_article_set,
        "efetch response is not a PubmedArticleSet document"
    );
    Ok(records)
}

fn parse_article(reader: &mut Reader<&[u8]>) -> Result<RawArticle> {
    let mut article = RawArticle::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"MedlineCitation" => article.citation = Some(parse_medline_citation(reader)?),
                other => skip_element(reader, other)?,
            },
            Event::End(e) if e.name().as_ref() == b"PubmedArticle" => break,
            Event::Eof => anyhow::bail!("unexpected end of document inside PubmedArticle"),
            _ => {}
        }
        buf.clear();
    }

    Ok(article)
}

fn parse_medline_citation(reader: &mut Reader<&[u8]>) -> Result<RawCitation> {
    let mut citation = RawCitation::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"PMID" => {
                    let pmid = read_field(reader)?;
                    if !pmid.is_empty() {
                        citation.pmid = Some(pmid);
                    }
                }
                b"Article" => citation.article = Some(parse_article_element(reader)?),
                // CommentsCorrectionsList etc. contain their own PMIDs
                other => skip_element(reader, other)?,
            },
            Event::End(e) if e.name().as_ref() == b"MedlineCitation" => break,
            Event::Eof => anyhow::bail!("unexpected end of document inside MedlineCitation"),
            _ => {}
        }
        buf.clear();
    }

    Ok(citation)
}

fn parse_article_element(reader: &mut Reader<&[u8]>) -> Result<RawArticleBody> {
    let mut body = RawArticleBody::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"Journal" => body.pub_date = parse_journal(reader)?,
                b"ArticleTitle" => {
                    let title = read_text_content(reader, b"ArticleTitle")?;
                    let title = title.trim();
                    if !title.is_empty() {
                        body.title = Some(title.to_string());
                    }
                }
                b"AuthorList" => body.authors = parse_author_list(reader)?,
                other => skip_element(reader, other)?,
            },
            Event::End(e) if e.name().as_ref() == b"Article" => break,
            Event::Eof => anyhow::bail!("unexpected end of document inside Article"),
            _ => {}
        }
        buf.clear();
    }

    Ok(body)
}

fn parse_journal(reader: &mut Reader<&[u8]>) -> Result<Option<RawPubDate>> {
    let mut pub_date = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"JournalIssue" => {}
                b"PubDate" => pub_date = Some(parse_pub_date(reader)?),
                other => skip_element(reader, other)?,
            },
            Event::End(e) if e.name().as_ref() == b"Journal" => break,
            Event::Eof => anyhow::bail!("unexpected end of document inside Journal"),
            _ => {}
        }
        buf.clear();
    }

    Ok(pub_date)
}

fn parse_pub_date(reader: &mut Reader<&[u8]>) -> Result<RawPubDate> {
    let mut date = RawPubDate::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"Year" => date.year = non_empty(read_field(reader)?),
                b"Month" => date.month = non_empty(read_field(reader)?),
                b"MedlineDate" => date.medline_date = non_empty(read_field(reader)?),
                other => skip_element(reader, other)?,
            },
            Event::End(e) if e.name().as_ref() == b"PubDate" => break,
            Event::Eof => anyhow::bail!("unexpected end of document inside PubDate"),
            _ => {}
        }
        buf.clear();
    }

    Ok(date)
}

fn parse_author_list(reader: &mut Reader<&[u8]>) -> Result<Vec<RawAuthor>> {
    let mut authors = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"Author" => {
                authors.push(parse_author(reader)?);
            }
            Event::End(e) if e.name().as_ref() == b"AuthorList" => break,
            Event::Eof => anyhow::bail!("unexpected end of document inside AuthorList"),
            _ => {}
        }
        buf.clear();
    }

    Ok(authors)
}

fn parse_author(reader: &mut Reader<&[u8]>) -> Result<RawAuthor> {
    let mut author = RawAuthor::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"LastName" => author.last_name = non_empty(read_field(reader)?),
                b"ForeName" => author.fore_name = non_empty(read_field(reader)?),
                b"Initials" => author.initials = non_empty(read_field(reader)?),
                b"AffiliationInfo" => {
                    if let Some(aff) = parse_affiliation(reader)? {
                        author.affiliations.push(aff);
                    }
                }
                other => skip_element(reader, other)?,
            },
            Event::End(e) if e.name().as_ref() == b"Author" => break,
            Event::Eof => anyhow::bail!("unexpected end of document inside Author"),
            _ => {}
        }
        buf.clear();
    }

    Ok(author)
}

fn parse_affiliation(reader: &mut Reader<&[u8]>) -> Result<Option<String>> {
    let mut buf = Vec::new();
    let mut affiliation = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"Affiliation" => affiliation = non_empty(read_field(reader)?),
                other => skip_element(reader, other)?,
            },
            Event::End(e) if e.name().as_ref() == b"AffiliationInfo" => break,
            Event::Eof => anyhow::bail!("unexpected end of document inside AffiliationInfo"),
            _ => {}
        }
        buf.clear();
    }

    Ok(affiliation)
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

/// Skip the rest of an element whose start tag was just read
fn skip_element(reader: &mut Reader<&[u8]>, end_tag: &[u8]) -> Result<()> {
    let mut buf = Vec::new();
    let mut depth = 1;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(_) => depth += 1,
            Event::End(e) => {
                depth -= 1;
                if depth == 0 && e.name().as_ref() == end_tag {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Read text content until the matching end tag, trimmed
fn read_field(reader: &mut Reader<&[u8]>) -> Result<String> {
    Ok(read_text(reader)?.trim().to_string())
}

/// Read text content until next end tag
fn read_text(reader: &mut Reader<&[u8]>) -> Result<String> {
    let mut buf = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::End(_) => break,
            Event::Start(_) => {
                // Nested inline markup (<i>, <sup>, ...)
                text.push_str(&read_text(reader)?);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}

/// Read text content of a specific element, handling nested tags
fn read_text_content(reader: &mut Reader<&[u8]>, end_tag: &[u8]) -> Result<String> {
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut depth = 1;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::Start(_) => depth += 1,
            Event::End(e) => {
                depth -= 1;
                if depth == 0 && e.name().as_ref() == end_tag {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}

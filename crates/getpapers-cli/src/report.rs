//! Console table and CSV output for classified papers

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{
    Cell, Color, ContentArrangement, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
};
use getpapers_pubmed::Paper;

pub const CSV_HEADER: [&str; 6] = [
    "PubmedID",
    "Title",
    "Publication Date",
    "Non-academic Author(s)",
    "Company Affiliation(s)",
    "Corresponding Author Email",
];

/// Separator for multi-value CSV cells
pub const CSV_LIST_SEPARATOR: &str = "; ";

const TITLE_MAX_CHARS: usize = 60;

/// Write papers as CSV to `path`.
pub fn write_csv_file(papers: &[Paper], path: &Path) -> Result<()> {
    log::debug!("Writing output to CSV file: {}", path.display());
    let file = std::fs::File::create(path)
        .with_context(|| format!("Cannot create {}", path.display()))?;
    write_csv(papers, file).with_context(|| format!("Cannot write {}", path.display()))
}

/// Write papers as CSV, header first.
pub fn write_csv<W: Write>(papers: &[Paper], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER)?;

    for paper in papers {
        let authors = paper.non_academic_authors.join(CSV_LIST_SEPARATOR);
        let companies = join(paper.company_affiliations.iter(), CSV_LIST_SEPARATOR);
        csv.write_record([
            paper.pmid.as_str(),
            paper.title.as_str(),
            paper.pub_date.as_str(),
            authors.as_str(),
            companies.as_str(),
            paper.corresponding_email.as_deref().unwrap_or_default(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

/// Render papers as a console table.
pub fn render_table(papers: &[Paper]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("PubmedID").fg(Color::Cyan),
            Cell::new("Title"),
            Cell::new("Date").fg(Color::Green),
            Cell::new("Non-Academic Authors").fg(Color::Yellow),
            Cell::new("Company").fg(Color::Magenta),
            Cell::new("Email").fg(Color::Blue),
        ]);

    for paper in papers {
        table.add_row(vec![
            paper.pmid.clone(),
            truncate_title(&paper.title),
            paper.pub_date.clone(),
            paper.non_academic_authors.join(", "),
            join(paper.company_affiliations.iter(), ", "),
            paper
                .corresponding_email
                .clone()
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    table
}

/// First 60 characters, with `...` when cut.
pub fn truncate_title(title: &str) -> String {
    match title.char_indices().nth(TITLE_MAX_CHARS) {
        Some((idx, _)) => format!("{}...", &title[..idx]),
        None => title.to_string(),
    }
}

fn join<'a>(items: impl Iterator<Item = &'a String>, sep: &str) -> String {
    items.map(String::as_str).collect::<Vec<_>>().join(sep)
}

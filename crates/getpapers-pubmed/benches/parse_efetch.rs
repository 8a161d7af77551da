use getpapers_pubmed::fetcher::{Batch, collect_papers};
use getpapers_pubmed::parser::parse_efetch_xml;

fn load_docs(filename: &str) -> Vec<String> {
    let dir = std::env::var("BENCH_DATA_DIR")
        .expect("set BENCH_DATA_DIR to directory with sample data files");
    let path = std::path::Path::new(&dir).join(filename);
    let content =
        std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()));
    // Documents are separated by blank lines
    content
        .split("\n\n")
        .filter(|d| !d.trim().is_empty())
        .map(String::from)
        .collect()
}

#[divan::bench]
fn parse_efetch_xml_bench(bencher: divan::Bencher) {
    let docs = load_docs("efetch_sample.xml");
    bencher.bench(|| {
        for doc in &docs {
            let _ = parse_efetch_xml(doc).unwrap();
        }
    });
}

#[divan::bench]
fn parse_and_transform_bench(bencher: divan::Bencher) {
    let docs = load_docs("efetch_sample.xml");
    bencher.bench(|| {
        for doc in &docs {
            let records = parse_efetch_xml(doc).unwrap();
            let batch = Batch {
                offset: 0,
                size: records.len(),
            };
            let _ = collect_papers(records, batch);
        }
    });
}

fn main() {
    divan::main();
}

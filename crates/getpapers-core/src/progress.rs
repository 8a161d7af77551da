//! Batch progress for the fetch phase.
//!
//! On a TTY one indicatif bar counts finished batches and shows how many
//! papers have arrived. Elsewhere the bar is hidden and logs carry progress.

use std::io::IsTerminal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

fn fetch_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{spinner:.green} {prefix:.cyan.bold} [{bar:30.green/dim}] {pos}/{len} batches {msg:.dim}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("=> ")
}

/// Owner of the terminal's progress area; shared with the log bridge.
pub struct ProgressContext {
    multi: MultiProgress,
    is_tty: bool,
}

impl ProgressContext {
    /// Draw bars only when stderr is a terminal.
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            is_tty: std::io::stderr().is_terminal(),
        }
    }

    /// Never draws; for tests and piped runs.
    pub fn hidden() -> Self {
        Self {
            multi: MultiProgress::new(),
            is_tty: false,
        }
    }

    /// New fetch bar; its length is set once batches are planned.
    pub fn fetch_bar(&self, prefix: &str) -> FetchProgress {
        if !self.is_tty {
            return FetchProgress::hidden();
        }
        let bar = self.multi.add(ProgressBar::new(0));
        bar.set_style(fetch_style());
        bar.set_prefix(prefix.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        FetchProgress::with_bar(bar)
    }

    pub fn is_tty(&self) -> bool {
        self.is_tty
    }

    /// For [`crate::init_logging`], so log lines suspend the bars.
    pub fn multi(&self) -> &MultiProgress {
        &self.multi
    }
}

impl Default for ProgressContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts finished batches and fetched papers; safe to share across workers.
pub struct FetchProgress {
    bar: ProgressBar,
    papers: AtomicUsize,
    failed: AtomicUsize,
}

impl FetchProgress {
    fn with_bar(bar: ProgressBar) -> Self {
        Self {
            bar,
            papers: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        }
    }

    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    pub fn set_batches(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    /// One batch delivered `papers` papers.
    pub fn batch_done(&self, papers: usize) {
        let total = self.papers.fetch_add(papers, Ordering::Relaxed) + papers;
        self.bar.set_message(format!("{} papers", fmt_num(total)));
        self.bar.inc(1);
    }

    pub fn batch_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.bar.inc(1);
    }

    pub fn papers(&self) -> usize {
        self.papers.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// `1234567` → `1,234,567`
pub fn fmt_num(n: usize) -> String {
    let digits = n.to_string();
    let head = digits.len() % 3;
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    out.push_str(&digits[..head]);
    for (i, chunk) in digits.as_bytes()[head..].chunks(3).enumerate() {
        if head > 0 || i > 0 {
            out.push(',');
        }
        // ASCII digits only
        out.extend(chunk.iter().map(|&b| b as char));
    }
    out
}

//! Core data types shared by the crawler, extractors, and writer.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One dialogue line attributed to a character, as produced by the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueEntry {
    /// Trimmed, lower-cased character name.
    pub character: String,
    /// Trimmed line with colons removed.
    pub line: String,
}

/// A link found on a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredLink {
    /// Absolute URL of the linked page.
    pub url: String,
    /// True for category/directory pages, which are visited but not counted.
    pub is_directory: bool,
}

/// Everything the page handlers pulled out of a single page.
#[derive(Debug, Clone, Default)]
pub struct PageOutcome {
    pub links: Vec<DiscoveredLink>,
    pub dialogue: Vec<DialogueEntry>,
}

/// Final report of a crawl run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlReport {
    /// Episode URLs in discovery order, without duplicates.
    pub episodes: Vec<String>,
    /// Number of pages fetched successfully (network or cache).
    pub pages_visited: usize,
    /// Number of requests that failed.
    pub errors: usize,
    /// Number of distinct characters collected.
    pub characters: usize,
    /// Total number of dialogue lines collected.
    pub lines: usize,
    /// Wall-clock time of the crawl.
    pub elapsed: Duration,
}

impl CrawlReport {
    /// Elapsed wall-clock time in minutes.
    pub fn elapsed_minutes(&self) -> f64 {
        self.elapsed.as_secs_f64() / 60.0
    }

    /// The human-readable summary line printed at the end of a run.
    pub fn summary_line(&self, output: &std::path::Path) -> String {
        format!(
            "[DONE] {} episodes found in {:.2} minutes and saved to {}.",
            self.episodes.len(),
            self.elapsed_minutes(),
            output.display()
        )
    }
}

/// Errors that can occur while crawling or writing results.
#[derive(thiserror::Error, Debug)]
pub enum CrawlError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CrawlError {
    /// Status code to report for this error; 0 when no response was received.
    pub fn status_code(&self) -> u16 {
        match self {
            CrawlError::Status { status, .. } => *status,
            CrawlError::Http(e) => e.status().map(|s| s.as_u16()).unwrap_or(0),
            _ => 0,
        }
    }
}

/// Convenience result type.
pub type CrawlResult<T> = Result<T, CrawlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_line_formats_minutes() {
        let report = CrawlReport {
            episodes: vec!["a".into(), "b".into()],
            pages_visited: 4,
            errors: 0,
            characters: 3,
            lines: 10,
            elapsed: Duration::from_secs(90),
        };
        assert_eq!(
            report.summary_line(std::path::Path::new("results.json")),
            "[DONE] 2 episodes found in 1.50 minutes and saved to results.json."
        );
    }

    #[test]
    fn test_status_code_for_status_error() {
        let err = CrawlError::Status {
            status: 404,
            url: "https://example.com/x".into(),
        };
        assert_eq!(err.status_code(), 404);
        assert_eq!(CrawlError::Config("bad".into()).status_code(), 0);
    }
}

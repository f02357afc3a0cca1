//! Crawl configuration and path resolution.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::types::{CrawlError, CrawlResult};

/// Site the crawler targets by default.
pub const DEFAULT_BASE_URL: &str = "https://adventuretime.fandom.com";

/// Listing pages the crawl starts from, in order.
pub const DEFAULT_SEEDS: [&str; 2] = [
    "https://adventuretime.fandom.com/wiki/Category:Transcripts",
    "https://adventuretime.fandom.com/wiki/Category:Transcripts?from=Seventeen%2FTranscript",
];

pub const DEFAULT_OUTPUT: &str = "results.json";
pub const DEFAULT_CACHE_DIR: &str = "./.cache";
pub const DEFAULT_MAX_DEPTH: u32 = 3;
pub const DEFAULT_PARALLELISM: usize = 8;
pub const DEFAULT_RANDOM_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_MIN_NAME_LEN: usize = 3;
/// Names shorter than this are never accepted, whatever `min_name_len` says.
pub const MIN_NAME_LEN_FLOOR: usize = 2;
pub const DEFAULT_MIN_LINE_LEN: usize = 5;

const OUTPUT_ENV: &str = "WIKI_DIALOGUE_OUTPUT";
const CACHE_DIR_ENV: &str = "WIKI_DIALOGUE_CACHE_DIR";

/// How newly discovered URLs are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrontierMode {
    /// Each discovered URL is spawned as its own task as soon as it is found.
    #[default]
    Spawn,
    /// Breadth-first: fetch a whole depth level, then the next.
    Queue,
}

impl std::str::FromStr for FrontierMode {
    type Err = CrawlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spawn" => Ok(Self::Spawn),
            "queue" => Ok(Self::Queue),
            other => Err(CrawlError::Config(format!("unknown frontier mode: {other}"))),
        }
    }
}

/// Everything that controls a crawl.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Base URL that relative links are resolved against.
    pub base_url: String,
    /// Seed listing pages, crawled one after another.
    pub seeds: Vec<String>,
    /// Where the results file is written.
    pub output: PathBuf,
    /// Response cache directory; `None` disables caching.
    pub cache_dir: Option<PathBuf>,
    /// Maximum link depth; the seed page is depth 1.
    pub max_depth: u32,
    /// Maximum simultaneous requests per domain.
    pub parallelism: usize,
    /// Upper bound of the random delay added after each network request.
    pub random_delay: Duration,
    /// Connection attempt timeout.
    pub connect_timeout: Duration,
    /// Shortest accepted character name, in characters.
    pub min_name_len: usize,
    /// Lines of this many characters or fewer are discarded.
    pub min_line_len: usize,
    /// Remove bracketed stage directions from dialogue lines.
    pub strip_stage_directions: bool,
    /// Follow links that leave the base domain.
    pub follow_external: bool,
    pub frontier: FrontierMode,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            seeds: DEFAULT_SEEDS.iter().map(|s| s.to_string()).collect(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            cache_dir: Some(PathBuf::from(DEFAULT_CACHE_DIR)),
            max_depth: DEFAULT_MAX_DEPTH,
            parallelism: DEFAULT_PARALLELISM,
            random_delay: DEFAULT_RANDOM_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            min_name_len: DEFAULT_MIN_NAME_LEN,
            min_line_len: DEFAULT_MIN_LINE_LEN,
            strip_stage_directions: false,
            follow_external: false,
            frontier: FrontierMode::default(),
        }
    }
}

impl CrawlConfig {
    /// Check the configuration and return the parsed base URL.
    pub fn validate(&self) -> CrawlResult<Url> {
        let base = parse_url(&self.base_url)?;
        if base.host_str().is_none() {
            return Err(CrawlError::InvalidUrl {
                url: self.base_url.clone(),
                reason: "base URL has no host".to_string(),
            });
        }
        if self.seeds.is_empty() {
            return Err(CrawlError::Config("at least one seed URL is required".into()));
        }
        for seed in &self.seeds {
            parse_url(seed)?;
        }
        if self.parallelism == 0 {
            return Err(CrawlError::Config("parallelism must be at least 1".into()));
        }
        if self.max_depth == 0 {
            return Err(CrawlError::Config("max depth must be at least 1".into()));
        }
        if self.min_name_len < MIN_NAME_LEN_FLOOR {
            return Err(CrawlError::Config(format!(
                "min name length must be at least {MIN_NAME_LEN_FLOOR}"
            )));
        }
        Ok(base)
    }
}

fn parse_url(raw: &str) -> CrawlResult<Url> {
    Url::parse(raw).map_err(|e| CrawlError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Resolve the output file path: explicit flag, then environment, then default.
pub fn resolve_output_path(explicit: Option<&str>) -> PathBuf {
    if let Some(path) = explicit {
        return PathBuf::from(path);
    }

    if let Ok(env_path) = std::env::var(OUTPUT_ENV) {
        return PathBuf::from(env_path);
    }

    PathBuf::from(DEFAULT_OUTPUT)
}

/// Resolve the cache directory; `disabled` wins over everything else.
pub fn resolve_cache_dir(explicit: Option<&str>, disabled: bool) -> Option<PathBuf> {
    if disabled {
        return None;
    }

    if let Some(dir) = explicit {
        return Some(PathBuf::from(dir));
    }

    if let Ok(env_dir) = std::env::var(CACHE_DIR_ENV) {
        return Some(PathBuf::from(env_dir));
    }

    Some(PathBuf::from(DEFAULT_CACHE_DIR))
}

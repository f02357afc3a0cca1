//! Command-line flags for the crawl and their translation into a `CrawlConfig`.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use wiki_dialogue::config::{
    resolve_cache_dir, resolve_output_path, DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_MAX_DEPTH, DEFAULT_MIN_NAME_LEN, DEFAULT_PARALLELISM, DEFAULT_RANDOM_DELAY,
    DEFAULT_SEEDS,
};
use wiki_dialogue::{CrawlConfig, FrontierMode};

/// Frontier used when `--frontier` is not given.
pub const DEFAULT_FRONTIER: &str = "spawn";

/// Flags accepted by `wiki-dialogue crawl`.
#[derive(Args, Debug, Clone)]
pub struct CrawlArgs {
    /// Base URL that relative links are resolved against.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Seed listing page (repeatable). Defaults to the two transcript category pages.
    #[arg(long = "seed")]
    pub seeds: Vec<String>,

    /// Results file. Also reads WIKI_DIALOGUE_OUTPUT.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Response cache directory. Also reads WIKI_DIALOGUE_CACHE_DIR.
    #[arg(long)]
    pub cache_dir: Option<String>,

    /// Disable the response cache.
    #[arg(long)]
    pub no_cache: bool,

    /// Maximum link depth (the seed page is depth 1).
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Maximum simultaneous requests per domain.
    #[arg(long)]
    pub parallelism: Option<usize>,

    /// Upper bound of the random delay after each request, in milliseconds.
    #[arg(long)]
    pub random_delay_ms: Option<u64>,

    /// Connection attempt timeout, in seconds.
    #[arg(long)]
    pub connect_timeout_secs: Option<u64>,

    /// Shortest accepted character name.
    #[arg(long)]
    pub min_name_len: Option<usize>,

    /// Remove bracketed stage directions such as "[laughs]" from lines.
    #[arg(long)]
    pub strip_stage_directions: bool,

    /// Frontier strategy (spawn, queue).
    #[arg(long, default_value = DEFAULT_FRONTIER)]
    pub frontier: String,

    /// Follow links that leave the base domain.
    #[arg(long)]
    pub follow_external: bool,

    /// Suppress per-request console lines.
    #[arg(long, short)]
    pub quiet: bool,
}

impl Default for CrawlArgs {
    /// The same values clap produces when no flags are given.
    fn default() -> Self {
        Self {
            base_url: None,
            seeds: Vec::new(),
            output: None,
            cache_dir: None,
            no_cache: false,
            max_depth: None,
            parallelism: None,
            random_delay_ms: None,
            connect_timeout_secs: None,
            min_name_len: None,
            strip_stage_directions: false,
            frontier: DEFAULT_FRONTIER.to_string(),
            follow_external: false,
            quiet: false,
        }
    }
}

impl CrawlArgs {
    /// Build the crawl configuration, falling back to documented defaults.
    pub fn to_config(&self) -> Result<CrawlConfig> {
        let frontier: FrontierMode = self
            .frontier
            .parse()
            .with_context(|| format!("invalid --frontier value: {}", self.frontier))?;

        let seeds = if self.seeds.is_empty() {
            DEFAULT_SEEDS.iter().map(|s| s.to_string()).collect()
        } else {
            self.seeds.clone()
        };

        let config = CrawlConfig {
            base_url: self
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            seeds,
            output: resolve_output_path(self.output.as_deref()),
            cache_dir: resolve_cache_dir(self.cache_dir.as_deref(), self.no_cache),
            max_depth: self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
            parallelism: self.parallelism.unwrap_or(DEFAULT_PARALLELISM),
            random_delay: self
                .random_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_RANDOM_DELAY),
            connect_timeout: self
                .connect_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            min_name_len: self.min_name_len.unwrap_or(DEFAULT_MIN_NAME_LEN),
            strip_stage_directions: self.strip_stage_directions,
            follow_external: self.follow_external,
            frontier,
            ..CrawlConfig::default()
        };

        config.validate().context("invalid crawl configuration")?;
        Ok(config)
    }
}

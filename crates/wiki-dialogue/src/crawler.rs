//! Crawler: orchestrates the whole crawl.
//!
//! Seeds are crawled one after another. For each seed, pages are fetched,
//! both page handlers run on every page (listing markup yields links,
//! transcript markup yields dialogue), and newly discovered links are queued
//! until nothing reachable within `max_depth` is left. Only then does the
//! next seed start.
//!
//! The orchestrator alone owns the visited set and the episode list; crawl
//! tasks only return what they found. Dialogue goes straight into the shared
//! `TranscriptStore`.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{CrawlConfig, FrontierMode};
use crate::dialogue::{extract_dialogue, DialogueOptions};
use crate::events::{CrawlEventKind, EventEmitter, EventSender};
use crate::fetch::Fetcher;
use crate::links::{extract_links, is_same_host};
use crate::storage::ResultsWriter;
use crate::store::TranscriptStore;
use crate::types::{CrawlReport, CrawlResult, DiscoveredLink, PageOutcome};

/// Run both page handlers over one page body.
pub fn process_page(body: &str, base: &Url, options: &DialogueOptions) -> PageOutcome {
    PageOutcome {
        links: extract_links(body, base),
        dialogue: extract_dialogue(body, options),
    }
}

/// What a single crawl task reports back to the orchestrator.
#[derive(Debug)]
struct VisitResult {
    depth: u32,
    links: Vec<DiscoveredLink>,
    ok: bool,
}

/// Everything a crawl task needs, cheap to clone into each task.
#[derive(Clone)]
struct PageContext {
    fetcher: Arc<Fetcher>,
    store: Arc<TranscriptStore>,
    events: Arc<EventEmitter>,
    base: Url,
    options: DialogueOptions,
}

impl PageContext {
    async fn visit(self, url: String, depth: u32) -> VisitResult {
        let page = match self.fetcher.get(&url, depth).await {
            Ok(page) => page,
            Err(_) => {
                return VisitResult {
                    depth,
                    links: Vec::new(),
                    ok: false,
                }
            }
        };

        let cached = page.from_cache;
        let base = self.base.clone();
        let options = self.options;
        let parsed =
            tokio::task::spawn_blocking(move || process_page(&page.body, &base, &options)).await;
        let outcome = match parsed {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("page handler for {url} panicked: {e}");
                return VisitResult {
                    depth,
                    links: Vec::new(),
                    ok: false,
                };
            }
        };

        let lines = outcome.dialogue.len();
        for entry in outcome.dialogue {
            self.store.append(&entry.character, entry.line);
        }

        debug!("{url}: {} links, {lines} lines", outcome.links.len());
        self.events.emit(CrawlEventKind::PageProcessed {
            url,
            links: outcome.links.len(),
            lines,
            cached,
        });

        VisitResult {
            depth,
            links: outcome.links,
            ok: true,
        }
    }
}

/// Mutable crawl bookkeeping, owned by the orchestrator.
#[derive(Default)]
struct CrawlState {
    visited: HashSet<String>,
    episode_set: HashSet<String>,
    episodes: Vec<String>,
    pages_visited: usize,
    errors: usize,
}

impl CrawlState {
    fn record(&mut self, result: &VisitResult) {
        if result.ok {
            self.pages_visited += 1;
        } else {
            self.errors += 1;
        }
    }
}

/// The crawler for one configuration.
pub struct Crawler {
    config: CrawlConfig,
    base: Url,
    fetcher: Arc<Fetcher>,
    store: Arc<TranscriptStore>,
    events: Arc<EventEmitter>,
}

impl Crawler {
    /// Create a crawler without an event subscriber.
    pub fn new(config: CrawlConfig) -> CrawlResult<Self> {
        Self::with_events(config, None)
    }

    /// Create a crawler that reports progress to `events`.
    pub fn with_events(config: CrawlConfig, events: Option<EventSender>) -> CrawlResult<Self> {
        let base = config.validate()?;
        let events = Arc::new(EventEmitter::new(events));
        let fetcher = Arc::new(Fetcher::new(&config, Arc::clone(&events))?);
        Ok(Self {
            config,
            base,
            fetcher,
            store: Arc::new(TranscriptStore::new()),
            events,
        })
    }

    /// The accumulated dialogue.
    pub fn store(&self) -> &Arc<TranscriptStore> {
        &self.store
    }

    /// Crawl every seed in order and return the report.
    pub async fn run(&self) -> CrawlResult<CrawlReport> {
        let start = Instant::now();
        let mut state = CrawlState::default();
        info!(
            "crawling {} seed(s) (max_depth={}, parallelism={}, frontier={:?})",
            self.config.seeds.len(),
            self.config.max_depth,
            self.config.parallelism,
            self.config.frontier
        );

        for seed in &self.config.seeds {
            if !state.visited.insert(seed.clone()) {
                debug!("seed {seed} already visited");
                continue;
            }
            self.events.emit(CrawlEventKind::SeedStarted { seed: seed.clone() });
            let before = state.pages_visited;

            match self.config.frontier {
                FrontierMode::Spawn => self.crawl_spawned(seed, &mut state).await,
                FrontierMode::Queue => self.crawl_queued(seed, &mut state).await,
            }

            let pages = state.pages_visited - before;
            info!("seed {seed} complete: {pages} pages");
            self.events.emit(CrawlEventKind::SeedCompleted {
                seed: seed.clone(),
                pages,
            });
        }

        let report = CrawlReport {
            episodes: state.episodes,
            pages_visited: state.pages_visited,
            errors: state.errors,
            characters: self.store.len(),
            lines: self.store.total_lines(),
            elapsed: start.elapsed(),
        };
        info!(
            "crawl complete: {} episodes, {} characters, {} lines, {} errors in {:.1}s",
            report.episodes.len(),
            report.characters,
            report.lines,
            report.errors,
            report.elapsed.as_secs_f64()
        );
        self.events.emit(CrawlEventKind::CrawlComplete {
            episodes: report.episodes.len(),
            characters: report.characters,
            lines: report.lines,
            elapsed_ms: report.elapsed.as_millis() as u64,
        });
        Ok(report)
    }

    /// Crawl, then write the results file configured in `output`.
    pub async fn run_and_write(&self) -> CrawlResult<CrawlReport> {
        let report = self.run().await?;
        ResultsWriter::write_to_file(&self.store, &self.config.output)?;
        Ok(report)
    }

    fn context(&self) -> PageContext {
        PageContext {
            fetcher: Arc::clone(&self.fetcher),
            store: Arc::clone(&self.store),
            events: Arc::clone(&self.events),
            base: self.base.clone(),
            options: DialogueOptions::from(&self.config),
        }
    }

    /// Every discovered URL becomes its own task; returns once all are done.
    async fn crawl_spawned(&self, seed: &str, state: &mut CrawlState) {
        let ctx = self.context();
        let mut tasks = JoinSet::new();
        tasks.spawn(ctx.clone().visit(seed.to_string(), 1));

        while let Some(joined) = tasks.join_next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) => {
                    warn!("crawl task failed: {e}");
                    state.errors += 1;
                    continue;
                }
            };
            state.record(&result);

            for link in &result.links {
                if let Some(url) = self.admit(link, result.depth, state) {
                    tasks.spawn(ctx.clone().visit(url, result.depth + 1));
                }
            }
        }
    }

    /// Breadth-first: fetch one depth level as a batch, then the next.
    async fn crawl_queued(&self, seed: &str, state: &mut CrawlState) {
        let ctx = self.context();
        let mut level = vec![(seed.to_string(), 1u32)];

        while !level.is_empty() {
            let results: Vec<VisitResult> = stream::iter(level)
                .map(|(url, depth)| ctx.clone().visit(url, depth))
                .buffer_unordered(self.config.parallelism)
                .collect()
                .await;

            let mut next = Vec::new();
            for result in &results {
                state.record(result);
                for link in &result.links {
                    if let Some(url) = self.admit(link, result.depth, state) {
                        next.push((url, result.depth + 1));
                    }
                }
            }
            level = next;
        }
    }

    /// Decide whether a link found at `depth` should be visited.
    ///
    /// Non-directory links from the allowed domain are recorded as episodes
    /// even when the depth bound stops them from being visited.
    fn admit(&self, link: &DiscoveredLink, depth: u32, state: &mut CrawlState) -> Option<String> {
        if !self.config.follow_external && !is_same_host(&link.url, &self.base) {
            debug!("skipping external link {}", link.url);
            return None;
        }

        if !link.is_directory && state.episode_set.insert(link.url.clone()) {
            state.episodes.push(link.url.clone());
        }

        if depth + 1 > self.config.max_depth {
            return None;
        }
        if !state.visited.insert(link.url.clone()) {
            return None;
        }
        Some(link.url.clone())
    }
}

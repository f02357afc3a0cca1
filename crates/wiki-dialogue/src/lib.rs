//! wiki-dialogue — crawl wiki transcript pages and collect every character's lines.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod dialogue;
pub mod events;
pub mod fetch;
pub mod links;
pub mod storage;
pub mod store;
pub mod types;

pub use cache::ResponseCache;
pub use config::{CrawlConfig, FrontierMode};
pub use crawler::Crawler;
pub use dialogue::{extract_dialogue, strip_stage_directions, DialogueOptions};
pub use fetch::Fetcher;
pub use links::extract_links;
pub use storage::{ResultsReader, ResultsWriter};
pub use store::TranscriptStore;
pub use types::*;

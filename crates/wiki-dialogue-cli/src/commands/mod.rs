//! Subcommand implementations.

pub mod crawl;
pub mod stats;

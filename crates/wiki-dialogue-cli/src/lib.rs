//! wiki-dialogue command-line front end.

pub mod commands;
pub mod config;
pub mod output;

pub use config::CrawlArgs;

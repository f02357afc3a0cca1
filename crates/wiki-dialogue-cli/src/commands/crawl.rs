//! `wiki-dialogue crawl` — crawl the transcripts and write the results file.

use anyhow::{Context, Result};

use wiki_dialogue::events;
use wiki_dialogue::{CrawlReport, Crawler};

use crate::config::CrawlArgs;
use crate::output;

/// Run a crawl and print the summary line.
pub async fn run(args: &CrawlArgs) -> Result<CrawlReport> {
    let config = args.to_config()?;
    let output_path = config.output.clone();

    let (tx, rx) = events::channel();
    let printer = output::spawn_console_printer(rx, args.quiet);

    if !args.quiet {
        println!("\nStarting scan...\n");
    }

    let crawler = Crawler::with_events(config, Some(tx)).context("failed to set up crawler")?;
    let result = crawler.run_and_write().await;

    // Dropping the crawler closes the event channel so the printer can finish.
    drop(crawler);
    if let Err(e) = printer.await {
        tracing::debug!("console printer stopped: {e}");
    }

    let report = result.with_context(|| format!("crawl failed ({})", output_path.display()))?;
    println!("{}", report.summary_line(&output_path));
    Ok(report)
}

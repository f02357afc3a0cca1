//! Console output for crawl events.

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use wiki_dialogue::events::{CrawlEventKind, EventReceiver};

/// Print console lines for crawl events until the channel closes.
///
/// With `quiet`, request lines are suppressed; failures still go to stderr.
pub fn spawn_console_printer(mut rx: EventReceiver, quiet: bool) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => print_event(&event.event, quiet),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("console printer skipped {skipped} events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn print_event(event: &CrawlEventKind, quiet: bool) {
    let Some(line) = event.console_line() else {
        return;
    };
    match event {
        CrawlEventKind::RequestFailed { .. } => eprintln!("{line}"),
        _ if !quiet => println!("{line}"),
        _ => {}
    }
}

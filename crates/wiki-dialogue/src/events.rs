//! Crawl event types and broadcast channel for progress reporting.
//!
//! The crawler emits `CrawlEvent`s as requests start, fail, and complete.
//! They flow through a `tokio::sync::broadcast` channel to any subscriber
//! (the CLI prints them as console lines). With no subscriber, events are
//! dropped.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// An event emitted during a crawl.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlEvent {
    /// Monotonically increasing sequence number.
    pub seq: u64,
    pub event: CrawlEventKind,
}

/// The specific kind of crawl event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CrawlEventKind {
    /// Crawling of a seed URL has started.
    SeedStarted { seed: String },
    /// A page is being requested, whether or not the cache answers it.
    Request { url: String, depth: u32 },
    /// A page was served from the response cache.
    CacheHit { url: String },
    /// A request failed; status is 0 when no response was received.
    RequestFailed {
        url: String,
        status: u16,
        message: String,
    },
    /// A page was parsed by the page handlers.
    PageProcessed {
        url: String,
        links: usize,
        lines: usize,
        cached: bool,
    },
    /// Every page reachable from a seed has been visited.
    SeedCompleted { seed: String, pages: usize },
    /// The whole crawl finished.
    CrawlComplete {
        episodes: usize,
        characters: usize,
        lines: usize,
        elapsed_ms: u64,
    },
}

impl CrawlEventKind {
    /// The console line for this event, if it has one.
    pub fn console_line(&self) -> Option<String> {
        match self {
            Self::Request { url, .. } => Some(format!("[REQ] {url}")),
            Self::RequestFailed {
                url,
                status,
                message,
            } => Some(format!("[ERR] {status} {message}: {url}")),
            _ => None,
        }
    }
}

/// Sender handle for crawl events.
pub type EventSender = tokio::sync::broadcast::Sender<CrawlEvent>;

/// Receiver handle for crawl events.
pub type EventReceiver = tokio::sync::broadcast::Receiver<CrawlEvent>;

/// Create a new event channel with a bounded buffer.
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::broadcast::channel(1024)
}

/// Emits sequenced events to an optional channel. Shared between crawl tasks.
#[derive(Debug, Default)]
pub struct EventEmitter {
    tx: Option<EventSender>,
    seq: AtomicU64,
}

impl EventEmitter {
    pub fn new(tx: Option<EventSender>) -> Self {
        Self {
            tx,
            seq: AtomicU64::new(0),
        }
    }

    /// Emit an event, ignoring send errors (no receivers listening).
    pub fn emit(&self, event: CrawlEventKind) {
        if let Some(ref sender) = self.tx {
            let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
            let _ = sender.send(CrawlEvent { seq, event });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = CrawlEvent {
            seq: 1,
            event: CrawlEventKind::Request {
                url: "https://example.com/wiki/A".to_string(),
                depth: 2,
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Request\""));

        let parsed: CrawlEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.seq, 1);
        assert_eq!(parsed.event, event.event);
    }

    #[test]
    fn test_console_lines() {
        let req = CrawlEventKind::Request {
            url: "https://example.com/a".into(),
            depth: 1,
        };
        assert_eq!(req.console_line().unwrap(), "[REQ] https://example.com/a");

        let err = CrawlEventKind::RequestFailed {
            url: "https://example.com/b".into(),
            status: 404,
            message: "Not Found".into(),
        };
        assert_eq!(
            err.console_line().unwrap(),
            "[ERR] 404 Not Found: https://example.com/b"
        );

        let done = CrawlEventKind::CacheHit {
            url: "https://example.com/c".into(),
        };
        assert!(done.console_line().is_none());
    }

    #[tokio::test]
    async fn test_emitter_sequences_events() {
        let (tx, mut rx) = channel();
        let emitter = EventEmitter::new(Some(tx));
        emitter.emit(CrawlEventKind::SeedStarted { seed: "a".into() });
        emitter.emit(CrawlEventKind::SeedCompleted {
            seed: "a".into(),
            pages: 3,
        });
        assert_eq!(rx.recv().await.unwrap().seq, 1);
        assert_eq!(rx.recv().await.unwrap().seq, 2);
    }

    #[test]
    fn test_emit_without_sender_is_noop() {
        let emitter = EventEmitter::default();
        emitter.emit(CrawlEventKind::SeedStarted { seed: "a".into() });
    }
}

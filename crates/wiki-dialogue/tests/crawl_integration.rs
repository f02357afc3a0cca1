//! End-to-end crawl tests against a mock wiki.

use std::time::Duration;

use wiki_dialogue::events::{self, CrawlEventKind};
use wiki_dialogue::{CrawlConfig, Crawler, FrontierMode, ResultsReader};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ─────────────────────── helpers ───────────────────────

fn listing_page(links: &[(&str, &str)]) -> String {
    let anchors: String = links
        .iter()
        .map(|(href, text)| {
            format!(r#"<li><a class="category-page__member-link" href="{href}">{text}</a></li>"#)
        })
        .collect();
    format!(
        r#"<html><body><div id="content"><ul class="category-page__members">{anchors}</ul></div></body></html>"#
    )
}

fn transcript_page(lines: &[&str]) -> String {
    let dds: String = lines.iter().map(|l| format!("<dd>{l}</dd>")).collect();
    format!(
        r#"<html><body><div id="content"><div id="mw-content-text"><div><dl>{dds}</dl></div></div></div></body></html>"#
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

/// Two listing pages, each linking one episode; the first also links back
/// to the category itself and to an external site.
async fn mount_wiki(server: &MockServer, episode_hits: u64) {
    Mock::given(method("GET"))
        .and(path("/wiki/Category:Transcripts"))
        .and(query_param("from", "Ep_Two"))
        .respond_with(html(listing_page(&[(
            "/wiki/Ep_Two/Transcript",
            "Ep Two/Transcript",
        )])))
        .with_priority(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wiki/Category:Transcripts"))
        .respond_with(html(listing_page(&[
            ("/wiki/Ep_One/Transcript", "Ep One/Transcript"),
            ("/wiki/Category:Transcripts", "Category:Transcripts"),
            ("https://example.com/wiki/Elsewhere", "Elsewhere"),
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wiki/Ep_One/Transcript"))
        .respond_with(html(transcript_page(&[
            "<b>Finn</b>: I'm a hero!",
            "<b>Jake</b>: Hi",
            "<b>Jake</b>: Bacon pancakes forever",
            "The candy kingdom glows.",
        ])))
        .expect(episode_hits)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wiki/Ep_Two/Transcript"))
        .respond_with(html(transcript_page(&[
            "<b>Finn</b>: Mathematical!!",
            "<b>Princess Bubblegum</b>: Science is magic.",
        ])))
        .expect(episode_hits)
        .mount(server)
        .await;
}

fn config_for(server: &MockServer, dir: &tempfile::TempDir) -> CrawlConfig {
    let base = server.uri();
    CrawlConfig {
        base_url: base.clone(),
        seeds: vec![
            format!("{base}/wiki/Category:Transcripts"),
            format!("{base}/wiki/Category:Transcripts?from=Ep_Two"),
        ],
        output: dir.path().join("results.json"),
        cache_dir: None,
        random_delay: Duration::ZERO,
        connect_timeout: Duration::from_secs(5),
        ..CrawlConfig::default()
    }
}

// ─────────────────────── tests ───────────────────────

#[tokio::test]
async fn test_two_listings_two_episodes() {
    let server = MockServer::start().await;
    mount_wiki(&server, 1).await;
    let dir = tempfile::tempdir().unwrap();

    let crawler = Crawler::new(config_for(&server, &dir)).unwrap();
    let report = crawler.run().await.unwrap();

    assert_eq!(report.episodes.len(), 2);
    assert_eq!(report.errors, 0);
    assert_eq!(report.pages_visited, 4);

    let counts = crawler.store().line_counts();
    let keys: Vec<_> = counts.keys().cloned().collect();
    assert_eq!(keys, vec!["finn", "jake", "princess bubblegum"]);
    assert_eq!(counts["finn"], 2);
    assert_eq!(counts["jake"], 1);
    assert_eq!(report.characters, 3);
    assert_eq!(report.lines, 4);
}

#[tokio::test]
async fn test_queue_frontier_matches_spawn_frontier() {
    let server = MockServer::start().await;
    mount_wiki(&server, 1).await;
    let dir = tempfile::tempdir().unwrap();

    let config = CrawlConfig {
        frontier: FrontierMode::Queue,
        ..config_for(&server, &dir)
    };
    let crawler = Crawler::new(config).unwrap();
    let report = crawler.run().await.unwrap();

    assert_eq!(report.episodes.len(), 2);
    let counts = crawler.store().line_counts();
    assert_eq!(counts.len(), 3);
    assert_eq!(counts["finn"], 2);
}

#[tokio::test]
async fn test_cached_rerun_is_stable_and_offline() {
    let server = MockServer::start().await;
    // Each episode page may hit the network only once across both runs.
    mount_wiki(&server, 1).await;
    let dir = tempfile::tempdir().unwrap();
    let config = CrawlConfig {
        cache_dir: Some(dir.path().join("cache")),
        ..config_for(&server, &dir)
    };

    let first = Crawler::new(config.clone()).unwrap();
    first.run().await.unwrap();

    let (tx, mut rx) = events::channel();
    let second = Crawler::with_events(config, Some(tx)).unwrap();
    let report = second.run().await.unwrap();

    assert_eq!(report.episodes.len(), 2);
    assert_eq!(first.store().line_counts(), second.store().line_counts());

    // Cached pages still get a request line each.
    let (mut requests, mut hits, mut cached_pages) = (0, 0, 0);
    while let Ok(event) = rx.try_recv() {
        match event.event {
            CrawlEventKind::Request { .. } => requests += 1,
            CrawlEventKind::CacheHit { .. } => hits += 1,
            CrawlEventKind::PageProcessed { cached: true, .. } => cached_pages += 1,
            _ => {}
        }
    }
    assert_eq!(requests, 4);
    assert_eq!(hits, 4);
    assert_eq!(cached_pages, 4);
}

#[tokio::test]
async fn test_failed_page_is_reported_and_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wiki/Category:Transcripts"))
        .respond_with(html(listing_page(&[
            ("/wiki/Lost/Transcript", "Lost/Transcript"),
            ("/wiki/Ep_One/Transcript", "Ep One/Transcript"),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wiki/Lost/Transcript"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wiki/Ep_One/Transcript"))
        .respond_with(html(transcript_page(&["<b>Finn</b>: I'm a hero!"])))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = CrawlConfig {
        seeds: vec![format!("{}/wiki/Category:Transcripts", server.uri())],
        ..config_for(&server, &dir)
    };
    let (tx, mut rx) = events::channel();
    let crawler = Crawler::with_events(config, Some(tx)).unwrap();
    let report = crawler.run().await.unwrap();

    assert_eq!(report.errors, 1);
    assert_eq!(report.episodes.len(), 2);
    assert_eq!(crawler.store().get("finn").unwrap(), vec!["I'm a hero!"]);

    let mut failures = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let CrawlEventKind::RequestFailed { url, status, .. } = event.event {
            failures.push((url, status));
        }
    }
    assert_eq!(failures.len(), 1);
    assert!(failures[0].0.ends_with("/wiki/Lost/Transcript"));
    assert_eq!(failures[0].1, 404);
}

#[tokio::test]
async fn test_depth_bound_stops_before_episodes() {
    let server = MockServer::start().await;
    mount_wiki(&server, 0).await;
    let dir = tempfile::tempdir().unwrap();

    let config = CrawlConfig {
        max_depth: 1,
        ..config_for(&server, &dir)
    };
    let crawler = Crawler::new(config).unwrap();
    let report = crawler.run().await.unwrap();

    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.episodes.len(), 2);
    assert!(crawler.store().is_empty());
}

#[tokio::test]
async fn test_run_and_write_produces_results_file() {
    let server = MockServer::start().await;
    mount_wiki(&server, 1).await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server, &dir);
    let output = config.output.clone();

    let crawler = Crawler::new(config).unwrap();
    crawler.run_and_write().await.unwrap();

    let loaded = ResultsReader::read_from_file(&output).unwrap();
    assert_eq!(loaded["princess bubblegum"], vec!["Science is magic."]);
    for (name, lines) in &loaded {
        assert_eq!(name, &name.trim().to_lowercase());
        assert!(!lines.is_empty());
        assert!(lines.iter().all(|l| !l.contains(':')));
    }
}

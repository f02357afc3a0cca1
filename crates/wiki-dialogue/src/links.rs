//! Link extraction from category listing pages.

use scraper::{Html, Selector};
use url::Url;

use crate::types::DiscoveredLink;

/// Category member links on a listing page.
pub const MEMBER_LINK_SELECTOR: &str = "#content .category-page__member-link";

/// Link text marking a directory (category) page rather than an episode.
const DIRECTORY_MARKER: &str = "transcripts";

/// Extract every category member link from a listing page.
///
/// Hrefs are resolved against `base`. Links without an href, or whose href
/// cannot be resolved, are skipped. Pages without listing markup yield nothing.
pub fn extract_links(html: &str, base: &Url) -> Vec<DiscoveredLink> {
    let document = Html::parse_document(html);
    let Ok(sel) = Selector::parse(MEMBER_LINK_SELECTOR) else {
        return Vec::new();
    };

    let mut links = Vec::new();
    for element in document.select(&sel) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty() {
            continue;
        }

        let Ok(resolved) = base.join(href) else {
            continue;
        };

        let title: String = element.text().collect();
        links.push(DiscoveredLink {
            url: resolved.to_string(),
            is_directory: is_directory_title(&title),
        });
    }
    links
}

/// True when a link's visible text names a directory page.
pub fn is_directory_title(title: &str) -> bool {
    title.to_lowercase().contains(DIRECTORY_MARKER)
}

/// True when `url` lives on the same host as `base`, ignoring a `www.` prefix.
pub fn is_same_host(url: &str, base: &Url) -> bool {
    let Some(base_host) = base.host_str() else {
        return false;
    };
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    parsed
        .host_str()
        .map(|h| {
            h == base_host
                || h.strip_prefix("www.")
                    .unwrap_or(h)
                    .eq(base_host.strip_prefix("www.").unwrap_or(base_host))
        })
        .unwrap_or(false)
}

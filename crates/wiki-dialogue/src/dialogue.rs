//! Dialogue extraction from transcript pages.
//!
//! Transcript pages list each spoken line as a `<dd>` inside a definition
//! list, with the speaker's name in bold at the start:
//!
//! ```html
//! <div id="mw-content-text"><div><dl>
//!   <dd><b>Finn</b>: I'm a hero!</dd>
//! </dl></div></div>
//! ```
//!
//! The bold text becomes the character name and whatever follows the first
//! occurrence of that name becomes the line.
//!
//! `scraper`'s `Html` is `!Send`, so everything here is synchronous and the
//! parsed document never lives across an `.await`.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::config::{CrawlConfig, MIN_NAME_LEN_FLOOR};
use crate::types::DialogueEntry;

/// Dialogue elements on a transcript page.
pub const DIALOGUE_SELECTOR: &str = "#mw-content-text > div > dl > dd";

/// Thresholds and transforms applied to each candidate line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogueOptions {
    pub min_name_len: usize,
    pub min_line_len: usize,
    pub strip_stage_directions: bool,
}

impl Default for DialogueOptions {
    fn default() -> Self {
        Self::from(&CrawlConfig::default())
    }
}

impl From<&CrawlConfig> for DialogueOptions {
    fn from(config: &CrawlConfig) -> Self {
        Self {
            min_name_len: config.min_name_len,
            min_line_len: config.min_line_len,
            strip_stage_directions: config.strip_stage_directions,
        }
    }
}

/// Extract every accepted dialogue line from a page's HTML.
///
/// Pages without transcript markup yield nothing.
pub fn extract_dialogue(html: &str, options: &DialogueOptions) -> Vec<DialogueEntry> {
    let document = Html::parse_document(html);
    let Ok(dd_sel) = Selector::parse(DIALOGUE_SELECTOR) else {
        return Vec::new();
    };
    let Ok(bold_sel) = Selector::parse("b") else {
        return Vec::new();
    };

    document
        .select(&dd_sel)
        .filter_map(|dd| {
            let bold: String = dd.select(&bold_sel).map(element_text).collect();
            let text = element_text(dd);
            parse_dialogue(&bold, &text, options)
        })
        .collect()
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Turn one dialogue element (its bold text and full text) into an entry.
///
/// Returns `None` for anything that is not usable dialogue: no bold text,
/// a name that is too short or absent from the text, or a line that is too
/// short once cleaned.
pub fn parse_dialogue(bold: &str, text: &str, options: &DialogueOptions) -> Option<DialogueEntry> {
    if bold.is_empty() {
        return None;
    }

    // Per-char lowering keeps the key identical to what `find_ignore_case`
    // compares against (no final-sigma rule).
    let character: String = bold.trim().chars().flat_map(char::to_lowercase).collect();
    if character.chars().count() < options.min_name_len.max(MIN_NAME_LEN_FLOOR) {
        return None;
    }

    let (_, end) = find_ignore_case(text, &character)?;
    let rest = &text[end..];

    let mut line = rest.replace(':', "").trim().to_string();
    if options.strip_stage_directions {
        line = strip_stage_directions(&line);
    }
    if line.chars().count() <= options.min_line_len {
        return None;
    }

    Some(DialogueEntry { character, line })
}

/// Byte range of the first occurrence of `needle` in `haystack`, comparing
/// the haystack lower-cased one char at a time against `needle`.
///
/// `needle` must already be lower-cased the same way.
pub fn find_ignore_case(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    if needle.is_empty() {
        return None;
    }

    for (start, _) in haystack.char_indices() {
        let mut want = needle.chars().peekable();
        let mut matched = true;

        for (offset, c) in haystack[start..].char_indices() {
            for lc in c.to_lowercase() {
                if want.next() != Some(lc) {
                    matched = false;
                    break;
                }
            }
            if !matched {
                break;
            }
            if want.peek().is_none() {
                return Some((start, start + offset + c.len_utf8()));
            }
        }
    }

    None
}

fn stage_direction_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[[^\[\]]*\]").expect("stage direction regex is valid"))
}

/// Remove bracketed stage directions such as `[laughs]` from a line.
///
/// When anything was removed, leftover whitespace is collapsed and one
/// trailing period is dropped. Lines without brackets come back unchanged.
pub fn strip_stage_directions(line: &str) -> String {
    let re = stage_direction_re();
    if !re.is_match(line) {
        return line.to_string();
    }

    let stripped = re.replace_all(line, " ");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .strip_suffix('.')
        .unwrap_or(&collapsed)
        .trim()
        .to_string()
}

//! `wiki-dialogue stats <file>` — summarize a results file.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use wiki_dialogue::{ResultsReader, TranscriptStore};

/// Summary of a results file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSummary {
    pub characters: usize,
    pub total_lines: usize,
    /// Characters with the most lines, most first; ties broken by name.
    pub top: Vec<(String, usize)>,
}

/// Compute the summary for a loaded store.
pub fn summarize(store: &TranscriptStore, top: usize) -> StatsSummary {
    let mut counts: Vec<(String, usize)> = store.line_counts().into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts.truncate(top);

    StatsSummary {
        characters: store.len(),
        total_lines: store.total_lines(),
        top: counts,
    }
}

/// Load a results file and print its summary.
pub fn run(path: &Path, top: usize, json_output: bool) -> Result<StatsSummary> {
    let map = ResultsReader::read_from_file(path)
        .with_context(|| format!("failed to read results file {}", path.display()))?;
    let summary = summarize(&TranscriptStore::from(map), top);

    if json_output {
        let value = json!({
            "file": path.display().to_string(),
            "characters": summary.characters,
            "total_lines": summary.total_lines,
            "top": summary
                .top
                .iter()
                .map(|(name, lines)| json!({ "character": name, "lines": lines }))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("Results file: {}", path.display());
        println!("  Characters: {}", summary.characters);
        println!("  Lines:      {}", summary.total_lines);
        for (name, lines) in &summary.top {
            println!("  {lines:>6}  {name}");
        }
    }

    Ok(summary)
}

//! Results file reader/writer.
//!
//! The results file is a pretty-printed JSON object mapping each character
//! name to the list of lines they speak.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

use crate::store::TranscriptStore;
use crate::types::{CrawlError, CrawlResult};

/// File mode for the results file on Unix.
#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

/// Writer for results files.
pub struct ResultsWriter;

/// Reader for results files.
pub struct ResultsReader;

impl ResultsWriter {
    /// Write the store to `path`, replacing any existing file.
    pub fn write_to_file(store: &TranscriptStore, path: &Path) -> CrawlResult<()> {
        let wrap = |source: std::io::Error| CrawlError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(wrap)?;
            }
        }

        let mut file = std::fs::File::create(path).map_err(wrap)?;
        Self::write_to(store, &mut file)?;
        file.flush().map_err(wrap)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(FILE_MODE))
                .map_err(wrap)?;
        }

        tracing::info!("wrote {} characters to {}", store.len(), path.display());
        Ok(())
    }

    /// Write the store as indented JSON to any writer.
    pub fn write_to<W: Write>(store: &TranscriptStore, writer: &mut W) -> CrawlResult<()> {
        serde_json::to_writer_pretty(&mut *writer, &store.snapshot())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

impl ResultsReader {
    /// Read a results file.
    pub fn read_from_file(path: &Path) -> CrawlResult<BTreeMap<String, Vec<String>>> {
        let mut file = std::fs::File::open(path)?;
        Self::read_from(&mut file)
    }

    /// Read results from any reader.
    pub fn read_from<R: Read>(reader: &mut R) -> CrawlResult<BTreeMap<String, Vec<String>>> {
        Ok(serde_json::from_reader(reader)?)
    }
}

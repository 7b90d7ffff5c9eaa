//! Fragment snapshot storage.
//!
//! The analysis core never talks to the scanner directly; it consumes a
//! snapshot of fragments from a [`FragmentSource`]. The shipped source is a
//! JSONL file (one fragment record per line, optional schema header), which
//! is cheap for the scanner to append to and cheap to stream back.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ChunkGraphError, Result};
use crate::schema::{CodeFragment, SCHEMA_VERSION};

/// Cap on fragments loaded per query unless the caller overrides it.
pub const DEFAULT_SCAN_LIMIT: usize = 10_000;

// ========== Source Abstraction ==========

/// Anything able to produce the fragment set for one analysis run.
pub trait FragmentSource {
    /// Load up to `scan_limit` fragments. A limit of zero is rejected; a
    /// limit that is hit mid-read yields a truncated snapshot with a note,
    /// never an error.
    fn get_all_fragments(&self, scan_limit: usize) -> Result<FragmentSnapshot>;

    /// Whether this source may span multiple repositories.
    fn cross_repo(&self) -> bool {
        false
    }
}

/// Fragments loaded from a source, plus soft-condition context.
#[derive(Debug, Clone, Default)]
pub struct FragmentSnapshot {
    pub fragments: Vec<CodeFragment>,
    /// The read stopped at the scan limit.
    pub truncated: bool,
    /// Malformed records skipped during the read.
    pub skipped: usize,
    /// Caller-facing note when results are a best-effort subset.
    pub note: Option<String>,
}

// ========== JSONL Store ==========

/// Header record, recognized only in the first line of the file.
#[derive(Debug, Deserialize)]
struct SnapshotHeader {
    schema_version: String,
}

/// Fragment snapshot stored as one JSON record per line.
///
/// A header record (`{"schema_version":"1"}`) may lead the file; when
/// present its version must match [`SCHEMA_VERSION`]. Blank lines are
/// ignored and malformed records are skipped with a count.
#[derive(Debug, Clone)]
pub struct JsonlStore {
    path: PathBuf,
}

impl JsonlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the conventional cache location.
    pub fn at_default_path() -> Self {
        Self::new(default_snapshot_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FragmentSource for JsonlStore {
    fn get_all_fragments(&self, scan_limit: usize) -> Result<FragmentSnapshot> {
        use std::io::BufRead;

        if scan_limit == 0 {
            return Err(ChunkGraphError::InvalidScanLimit { value: 0 });
        }
        if !self.path.exists() {
            return Err(ChunkGraphError::SnapshotNotFound {
                path: self.path.display().to_string(),
            });
        }

        let file = fs::File::open(&self.path)?;
        let reader = std::io::BufReader::new(file);

        let mut snapshot = FragmentSnapshot::default();
        let mut first_record = true;
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if first_record {
                first_record = false;
                if let Ok(header) = serde_json::from_str::<SnapshotHeader>(line) {
                    if header.schema_version != SCHEMA_VERSION {
                        return Err(ChunkGraphError::SchemaVersion {
                            found: header.schema_version,
                            expected: SCHEMA_VERSION.to_string(),
                        });
                    }
                    continue;
                }
                // No header; headerless snapshots read as version 1.
            }

            let fragment: CodeFragment = match serde_json::from_str(line) {
                Ok(f) => f,
                Err(_) => {
                    snapshot.skipped += 1;
                    continue;
                }
            };
            snapshot.fragments.push(fragment.normalized());

            if snapshot.fragments.len() >= scan_limit {
                snapshot.truncated = true;
                snapshot.note = Some(format!(
                    "scan limit of {} fragments reached; results are a best-effort subset",
                    scan_limit
                ));
                warn!(scan_limit, "fragment scan limit reached, snapshot truncated");
                break;
            }
        }

        if snapshot.skipped > 0 {
            warn!(
                skipped = snapshot.skipped,
                path = %self.path.display(),
                "skipped malformed fragment records"
            );
        }
        debug!(
            fragments = snapshot.fragments.len(),
            truncated = snapshot.truncated,
            "loaded fragment snapshot"
        );
        Ok(snapshot)
    }
}

/// Write a snapshot file with a schema header. Parent directories are
/// created as needed; a partial file never appears at `path`.
pub fn write_snapshot(path: &Path, fragments: &[CodeFragment]) -> Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Atomic write: write to a temp file, then rename
    let temp_path = path.with_extension("jsonl.tmp");
    {
        let mut file = std::io::BufWriter::new(fs::File::create(&temp_path)?);
        writeln!(file, "{{\"schema_version\":\"{}\"}}", SCHEMA_VERSION)?;
        for fragment in fragments {
            let record = serde_json::to_string(fragment)?;
            writeln!(file, "{}", record)?;
        }
        file.flush()?;
    }
    fs::rename(&temp_path, path)?;
    Ok(())
}

/// Conventional snapshot location (XDG-compliant).
pub fn default_snapshot_path() -> PathBuf {
    if let Ok(xdg_cache) = std::env::var("XDG_CACHE_HOME") {
        return PathBuf::from(xdg_cache)
            .join("chunkgraph")
            .join("fragments.jsonl");
    }

    if let Some(home) = dirs::home_dir() {
        return home
            .join(".cache")
            .join("chunkgraph")
            .join("fragments.jsonl");
    }

    std::env::temp_dir().join("chunkgraph").join("fragments.jsonl")
}

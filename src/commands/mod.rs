//! Subcommand handlers.
//!
//! Each handler loads the snapshot selected by the global flags, runs one
//! engine operation, and renders the result in the requested output format.

mod complexity;
mod dependents;
mod graph;
mod stats;

pub use complexity::run_complexity;
pub use dependents::run_dependents;
pub use graph::run_graph;
pub use stats::run_stats;

use serde::Serialize;
use serde_json::Value;

use crate::cli::{Cli, OutputFormat};
use crate::error::Result;
use crate::storage::{FragmentSnapshot, FragmentSource, JsonlStore};

/// Shared pieces every handler needs.
pub struct CommandContext {
    pub format: OutputFormat,
    pub workspace_root: String,
    pub scan_limit: usize,
    store: JsonlStore,
}

impl CommandContext {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            workspace_root: cli.workspace_root.clone(),
            scan_limit: cli.scan_limit,
            store: cli.store(),
        }
    }

    /// Load the snapshot selected by the global flags.
    pub fn load_snapshot(&self) -> Result<FragmentSnapshot> {
        self.store.get_all_fragments(self.scan_limit)
    }

    pub fn source(&self) -> &JsonlStore {
        &self.store
    }

    /// Render a report in the selected format, appending the snapshot's
    /// soft-condition note when one was raised during the load.
    pub fn render<T: Serialize>(&self, report: &T, snapshot: &FragmentSnapshot) -> Result<String> {
        let mut payload = serde_json::to_value(report)?;
        if let Some(note) = &snapshot.note {
            if let Value::Object(map) = &mut payload {
                map.insert("snapshot_note".to_string(), Value::String(note.clone()));
            }
        }
        self.render_value(&payload)
    }

    fn render_value(&self, value: &Value) -> Result<String> {
        let rendered = match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(value)?,
            OutputFormat::Compact => serde_json::to_string(value)?,
        };
        Ok(rendered)
    }
}

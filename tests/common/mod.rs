//! Common test utilities and fixtures for chunkgraph integration tests
//!
//! This module provides:
//! - Fragment builders for assembling snapshots without an external scanner
//! - A canned service-shaped fragment set shared across test binaries
//! - A snapshot-file writer for store round-trips

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use chunkgraph::schema::{CodeFragment, FragmentKind};
use chunkgraph::storage;

/// Function fragment with a symbol, imports, and a cyclomatic score.
pub fn function(file: &str, symbol: &str, cyclomatic: u32, imports: &[&str]) -> CodeFragment {
    CodeFragment::new(file, 10, 60, FragmentKind::Function)
        .with_symbol(symbol)
        .with_language("typescript")
        .with_cyclomatic(cyclomatic)
        .with_imports(imports)
}

/// Fragment set shaped like a small web service.
///
/// Layout: an app entry point fans out through a routes file to two
/// handlers sharing a db client, with a test file covering one handler.
pub fn service_fragments() -> Vec<CodeFragment> {
    vec![
        function("src/app.ts", "start", 6, &["./routes", "./config"]),
        function(
            "src/routes/index.ts",
            "mount",
            4,
            &["../handlers/users", "../handlers/orders"],
        ),
        function(
            "src/handlers/users.ts",
            "listUsers",
            18,
            &["../db/client", "../util/log"],
        ),
        function("src/handlers/orders.ts", "listOrders", 31, &["../db/client"]),
        function("src/db/client.ts", "query", 9, &["./pool"]),
        function("src/db/pool.ts", "acquire", 3, &[]),
        function("src/util/log.ts", "log", 2, &[]),
        function("src/config.ts", "load", 1, &[]),
        function(
            "tests/handlers/users.test.ts",
            "usersSpec",
            1,
            &["../../src/handlers/users"],
        ),
    ]
}

/// Write the fragments as a snapshot file under `dir` and return its path.
pub fn write_snapshot(dir: &Path, fragments: &[CodeFragment]) -> PathBuf {
    let path = dir.join("fragments.jsonl");
    storage::write_snapshot(&path, fragments).expect("snapshot write failed");
    path
}

//! Dependency graph integration tests
//!
//! Drives `generate_graph` over the shared service-shaped snapshot:
//! - forward and reverse walks with shared-import edge dropping
//! - both-direction union
//! - directory roots and module-level aggregation
//! - test-file exclusion

mod common;

use chunkgraph::graph::node_id;
use chunkgraph::{generate_graph, Direction, GraphOptions, NodeKind};

use common::service_fragments;

fn options(direction: Direction) -> GraphOptions {
    GraphOptions {
        direction,
        ..Default::default()
    }
}

fn run(roots: &[&str], options: &GraphOptions) -> chunkgraph::DependencyGraph {
    let fragments = service_fragments();
    let roots: Vec<String> = roots.iter().map(|s| s.to_string()).collect();
    generate_graph(&fragments, "", &roots, options).unwrap()
}

#[test]
fn test_forward_walk_covers_the_import_closure() {
    let graph = run(&["src/app.ts"], &options(Direction::Forward));

    let paths: Vec<&str> = graph.nodes.iter().map(|n| n.path.as_str()).collect();
    for expected in [
        "src/app.ts",
        "src/routes/index.ts",
        "src/config.ts",
        "src/handlers/users.ts",
        "src/handlers/orders.ts",
        "src/db/client.ts",
        "src/db/pool.ts",
        "src/util/log.ts",
    ] {
        assert!(paths.contains(&expected), "missing node {expected}");
    }
    assert_eq!(graph.nodes.len(), 8);

    // The shared db client is reached from two handlers; the second edge
    // lands in a visited file and is dropped, leaving a spanning tree.
    assert_eq!(graph.edges.len(), 7);
    let into_client = graph
        .edges
        .iter()
        .filter(|e| e.to == node_id("src/db/client.ts"))
        .count();
    assert_eq!(into_client, 1);
}

#[test]
fn test_reverse_walk_finds_transitive_importers() {
    let graph = run(&["src/db/client.ts"], &options(Direction::Reverse));

    let paths: Vec<&str> = graph.nodes.iter().map(|n| n.path.as_str()).collect();
    for expected in [
        "src/db/client.ts",
        "src/handlers/users.ts",
        "src/handlers/orders.ts",
        "src/routes/index.ts",
        "src/app.ts",
    ] {
        assert!(paths.contains(&expected), "missing node {expected}");
    }
    assert_eq!(graph.nodes.len(), 5, "test file excluded by default");
    assert_eq!(graph.edges.len(), 4);

    // Reverse edges still point importer -> imported.
    assert!(graph
        .edges
        .iter()
        .any(|e| e.from == node_id("src/app.ts") && e.to == node_id("src/routes/index.ts")));
}

#[test]
fn test_include_tests_adds_the_test_dependent() {
    let mut opts = options(Direction::Reverse);
    opts.include_tests = true;
    let graph = run(&["src/db/client.ts"], &opts);

    assert_eq!(graph.nodes.len(), 6);
    assert_eq!(graph.edges.len(), 5);
    assert!(graph
        .nodes
        .iter()
        .any(|n| n.path == "tests/handlers/users.test.ts"));
}

#[test]
fn test_both_directions_union_without_duplicates() {
    let graph = run(&["src/db/client.ts"], &options(Direction::Both));

    assert_eq!(graph.nodes.len(), 6);
    assert_eq!(graph.edges.len(), 5);

    let mut ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 6, "no node appears twice");
    assert!(graph
        .edges
        .iter()
        .any(|e| e.to == node_id("src/db/pool.ts")), "forward leg present");
}

#[test]
fn test_directory_root_expands_sorted_and_filtered() {
    let graph = run(&["src/handlers"], &options(Direction::Forward));

    assert_eq!(
        graph.roots,
        vec!["src/handlers/orders.ts", "src/handlers/users.ts"]
    );
}

#[test]
fn test_module_level_reverse_aggregation() {
    let mut opts = options(Direction::Reverse);
    opts.module_level = true;
    let graph = run(&["src/db/client.ts"], &opts);

    let mut module_paths: Vec<&str> = graph.nodes.iter().map(|n| n.path.as_str()).collect();
    module_paths.sort();
    assert_eq!(module_paths, vec!["src", "src/db", "src/handlers", "src/routes"]);
    assert!(graph.nodes.iter().all(|n| n.kind == NodeKind::Module));

    // Two file edges handlers->db collapse into one module edge.
    assert_eq!(graph.edges.len(), 3);
}

#[test]
fn test_complexity_attachment_is_opt_in() {
    let mut opts = options(Direction::Forward);
    opts.include_complexity = true;
    let graph = run(&["src/handlers/orders.ts"], &opts);

    let orders = graph
        .nodes
        .iter()
        .find(|n| n.path == "src/handlers/orders.ts")
        .unwrap();
    assert_eq!(orders.complexity, Some(31.0));

    let plain = run(&["src/handlers/orders.ts"], &options(Direction::Forward));
    assert!(plain.nodes.iter().all(|n| n.complexity.is_none()));
}

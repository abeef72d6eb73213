//! Graph integration tests.
//!
//! Tests the fragment store → graph build → drag payload → dialogue context
//! path end to end.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use fragmind::models::{EdgeStrength, Fragment, Point, Size};
use fragmind::services::{
    DialogueMode, DialogueOrchestrator, DialogueState, DragPayload, DropZone, GraphBuilder,
    LayoutConfig, encode_drag_payload,
};
use fragmind::storage::{FilesystemFragmentStore, FragmentStore, MemoryFragmentStore};
use tempfile::TempDir;

fn seed_store(store: &dyn FragmentStore) {
    for (title, tags) in [
        ("Ownership", vec!["rust", "memory"]),
        ("Borrowing", vec!["rust", "memory"]),
        ("Tokio", vec!["rust", "async"]),
        ("Sourdough", vec!["baking"]),
    ] {
        store
            .add(Fragment::new(title, format!("notes on {title}")).with_tags(tags))
            .unwrap();
    }
}

#[test]
fn test_graph_from_filesystem_store() {
    let dir = TempDir::new().unwrap();
    let store = FilesystemFragmentStore::new(dir.path().join("fragments.json"));
    seed_store(&store);

    let fragments = FilesystemFragmentStore::new(store.path()).get_all().unwrap();
    let graph = GraphBuilder::new(LayoutConfig::without_jitter()).build(&fragments);

    assert_eq!(graph.nodes.len(), 4);
    assert_eq!(graph.edges.len(), 3);

    let pair = graph.edge_between("1", "2").unwrap();
    assert_eq!(pair.weight, 2);
    assert_eq!(pair.strength, EdgeStrength::Moderate);
    assert_eq!(pair.label, "2 shared tags");
    assert_eq!(graph.edge_between("1", "3").unwrap().weight, 1);
    assert!(graph.neighbors("4").is_empty());

    let stats = graph.stats();
    assert_eq!(stats.fragment_count, 4);
    assert_eq!(stats.edge_count, 3);
    assert_eq!(stats.distinct_tag_count, 4);
}

#[test]
fn test_tag_query_feeds_graph() {
    let store = MemoryFragmentStore::new();
    seed_store(&store);
    let rust = store.fragments_with_tag("rust").unwrap();
    let graph = GraphBuilder::new(LayoutConfig::without_jitter()).build(&rust);
    assert_eq!(graph.nodes.len(), 3);
    assert_eq!(graph.edges.len(), 3);
}

#[test]
fn test_rebuilding_does_not_mutate_fragments() {
    let store = MemoryFragmentStore::new();
    seed_store(&store);
    let fragments = store.get_all().unwrap();
    let builder = GraphBuilder::default().with_seed(3);
    let first = builder.build(&fragments);
    let second = builder.build(&fragments);
    assert_eq!(first, second);
    assert_eq!(store.get_all().unwrap(), fragments);
}

#[test]
fn test_drag_node_into_panel() {
    let fragments = vec![
        Fragment::new("Saved", "a").with_id(10).with_tags(["x"]),
        Fragment::new("Draft", "b").with_tags(["x"]),
    ];
    let graph = GraphBuilder::new(LayoutConfig::without_jitter()).build(&fragments);
    let zone = DropZone::new(Point::new(100.0, 100.0), Size::new(400.0, 300.0));
    let mut dialogue = DialogueOrchestrator::default();

    for node in &graph.nodes {
        let raw = encode_drag_payload(&DragPayload::from_node(&node.id, node.fragment.clone()))
            .unwrap();
        let dropped = zone.accept(&raw, Point::new(150.0, 130.0)).unwrap();
        assert_eq!(dropped.position, Point::new(50.0, 30.0));
        assert!(dialogue.accept_drop(dropped));
    }

    assert_eq!(dialogue.state(), DialogueState::Open(DialogueMode::Panel));
    let session = dialogue.session().unwrap();
    assert_eq!(session.title, "Conversation about Saved");
    assert!(session.context.contains("10"));
    assert!(session.context.contains("temp-1"));
    assert_eq!(dialogue.panel_fragments().len(), 2);

    // Dropping the same nodes again changes nothing.
    let raw = encode_drag_payload(&DragPayload::from_node("temp-1", fragments[1].clone())).unwrap();
    assert!(!dialogue.drop_payload(&raw, Point::default()));
    assert_eq!(dialogue.session().unwrap().context.len(), 2);
}

#[test]
fn test_inactive_zone_ignores_drops() {
    let mut zone = DropZone::new(Point::default(), Size::new(100.0, 100.0));
    zone.active = false;
    let raw = encode_drag_payload(&DragPayload::from_node("1", Fragment::new("a", "").with_id(1)))
        .unwrap();
    assert!(zone.accept(&raw, Point::new(10.0, 10.0)).is_none());
}

use anvaya::{load, save, GraphEngine, PersistenceError, PropertyValue};
use std::collections::HashSet;
use std::path::PathBuf;
use tempfile::TempDir;

const NAME: u16 = 1;
const WEIGHT: u16 = 3;
const KNOWS: u16 = 7;

fn snapshot_path(dir: &TempDir) -> PathBuf {
    dir.path().join("graph.snap")
}

/// All live edges as (source, type, target) triples.
fn edge_triples(engine: &GraphEngine) -> HashSet<(i32, u16, i32)> {
    engine
        .get_edges()
        .unwrap()
        .iter()
        .map(|el| {
            let edge = el.as_edge().unwrap();
            (edge.source_id(), edge.edge_type_id(), edge.target_id())
        })
        .collect()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn populated_engine() -> GraphEngine {
    init_tracing();
    let engine = GraphEngine::new();
    let mut vertices = Vec::new();
    for k in 0..10i64 {
        let v = engine
            .create_vertex(
                100 + k as u32,
                vec![(NAME, PropertyValue::from(format!("v{}", k)))],
            )
            .unwrap();
        vertices.push(v.id());
    }
    // A ring of KNOWS edges plus a couple of cross links.
    for k in 0..10 {
        engine
            .create_edge(
                vertices[k],
                KNOWS,
                vertices[(k + 1) % 10],
                200,
                vec![(WEIGHT, PropertyValue::Float(k as f64))],
            )
            .unwrap()
            .unwrap();
    }
    engine
        .create_edge(vertices[0], KNOWS + 1, vertices[5], 201, Vec::new())
        .unwrap()
        .unwrap();
    engine
}

#[test]
fn test_round_trip_preserves_graph() {
    let engine = populated_engine();
    let dir = TempDir::new().unwrap();
    save(&engine, snapshot_path(&dir), 3).unwrap();

    let loaded = load(snapshot_path(&dir)).unwrap();

    assert_eq!(loaded.vertex_count(), engine.vertex_count());
    assert_eq!(loaded.edge_count(), engine.edge_count());
    assert_eq!(edge_triples(&loaded), edge_triples(&engine));

    // Properties and timestamps survive.
    let original = engine.get_element(i32::MIN).unwrap().unwrap();
    let restored = loaded.get_element(i32::MIN).unwrap().unwrap();
    assert_eq!(restored.created_at(), original.created_at());
    assert_eq!(
        restored.get_property(NAME).unwrap(),
        Some(PropertyValue::from("v0"))
    );

    // Degrees survive through the adjacency groups.
    assert_eq!(loaded.out_degree(i32::MIN).unwrap(), Some(2));
    assert_eq!(loaded.in_degree(i32::MIN).unwrap(), Some(1));
}

#[test]
fn test_round_trip_with_tombstones() {
    let engine = populated_engine();
    // Punch holes: drop a vertex (cascading two ring edges and one cross
    // link) and one standalone edge.
    engine.remove_element(i32::MIN).unwrap();
    let surviving_edge = engine.get_edges().unwrap()[0].id();
    engine.remove_element(surviving_edge).unwrap();

    let dir = TempDir::new().unwrap();
    save(&engine, snapshot_path(&dir), 4).unwrap();
    let loaded = load(snapshot_path(&dir)).unwrap();

    assert_eq!(loaded.vertex_count(), engine.vertex_count());
    assert_eq!(loaded.edge_count(), engine.edge_count());
    assert_eq!(edge_triples(&loaded), edge_triples(&engine));
    assert!(loaded.get_element(i32::MIN).unwrap().is_none());
    assert!(loaded.get_element(surviving_edge).unwrap().is_none());
}

#[test]
fn test_loaded_engine_continues_id_sequence() {
    let engine = populated_engine();
    let dir = TempDir::new().unwrap();
    save(&engine, snapshot_path(&dir), 2).unwrap();

    let loaded = load(snapshot_path(&dir)).unwrap();
    let next = loaded.create_vertex(0, Vec::new()).unwrap();

    // 10 vertices + 11 edges were allocated before the save; the cursor
    // picks up right after them even across tombstones.
    assert_eq!(next.id(), i32::MIN + 21);
}

#[test]
fn test_more_partitions_than_elements() {
    let engine = GraphEngine::new();
    let a = engine.create_vertex(0, Vec::new()).unwrap();
    let b = engine.create_vertex(0, Vec::new()).unwrap();
    engine
        .create_edge(a.id(), KNOWS, b.id(), 0, Vec::new())
        .unwrap()
        .unwrap();

    let dir = TempDir::new().unwrap();
    save(&engine, snapshot_path(&dir), 16).unwrap();
    let loaded = load(snapshot_path(&dir)).unwrap();

    assert_eq!(loaded.vertex_count(), 2);
    assert_eq!(loaded.edge_count(), 1);
    assert_eq!(loaded.out_degree(a.id()).unwrap(), Some(1));
}

#[test]
fn test_self_loop_round_trip() {
    let engine = GraphEngine::new();
    let v = engine.create_vertex(0, Vec::new()).unwrap();
    engine
        .create_edge(v.id(), KNOWS, v.id(), 0, Vec::new())
        .unwrap()
        .unwrap();

    let dir = TempDir::new().unwrap();
    save(&engine, snapshot_path(&dir), 2).unwrap();
    let loaded = load(snapshot_path(&dir)).unwrap();

    assert_eq!(loaded.edge_count(), 1);
    assert_eq!(loaded.out_degree(v.id()).unwrap(), Some(1));
    assert_eq!(loaded.in_degree(v.id()).unwrap(), Some(1));
}

#[test]
fn test_truncated_partition_is_rejected() {
    let engine = populated_engine();
    let dir = TempDir::new().unwrap();
    let path = snapshot_path(&dir);
    save(&engine, &path, 1).unwrap();

    // Chop the tail off the single partition file.
    let part = dir.path().join("graph.snap.part0");
    let bytes = std::fs::read(&part).unwrap();
    std::fs::write(&part, &bytes[..bytes.len() / 2]).unwrap();

    let err = load(&path).unwrap_err();
    assert!(matches!(
        err,
        PersistenceError::Serialization(_) | PersistenceError::Io(_)
    ));
}

#[test]
fn test_missing_partition_file_is_rejected() {
    let engine = populated_engine();
    let dir = TempDir::new().unwrap();
    let path = snapshot_path(&dir);
    save(&engine, &path, 2).unwrap();

    std::fs::remove_file(dir.path().join("graph.snap.part1")).unwrap();
    assert!(load(&path).is_err());
}

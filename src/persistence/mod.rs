//! Partitioned snapshot persistence
//!
//! Saves the whole engine state to a manifest plus a set of partition
//! files, each covering one contiguous slice of the allocated id range,
//! written and read in parallel. Elements arrive out of order across
//! partitions, so loading resolves forward references in two passes:
//! edges whose endpoints are not yet materialized wait as *deferred
//! edges*, and vertex group entries whose edge is not yet materialized
//! wait as *pending links* keyed by the edge id. A reference that never
//! resolves is a fatal corrupt-save error.

use crate::engine::{GraphEngine, GraphError};
use crate::graph::{
    AdjacencyGroups, Edge, EdgeTypeId, ElementId, GraphElement, PropertyId, PropertyValue, Vertex,
};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Persistence errors
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// A deferred edge or pending link never resolved; the save file is
    /// unusable and the caller must discard the load.
    #[error("corrupt persistent state: {0}")]
    CorruptState(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Partition file header: the id slice `[min_id, max_id)` it covers.
#[derive(Debug, Serialize, Deserialize)]
struct PartitionHeader {
    min_id: i32,
    max_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VertexRecord {
    id: ElementId,
    created_at: u32,
    modified_at: u32,
    properties: Vec<(PropertyId, PropertyValue)>,
    out_groups: Vec<(EdgeTypeId, Vec<ElementId>)>,
    in_groups: Vec<(EdgeTypeId, Vec<ElementId>)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EdgeRecord {
    id: ElementId,
    created_at: u32,
    modified_at: u32,
    properties: Vec<(PropertyId, PropertyValue)>,
    source_id: ElementId,
    target_id: ElementId,
    edge_type_id: EdgeTypeId,
}

/// One record per id. The variant index is the on-disk discriminator:
/// edge = 0, vertex = 1, empty = 2.
#[derive(Debug, Serialize, Deserialize)]
enum PartitionRecord {
    Edge(EdgeRecord),
    Vertex(VertexRecord),
    Empty,
}

/// A plugin payload file recorded in a snapshot manifest. Plugin
/// implementations live outside the engine, so [`load`] does not restore
/// these; callers re-register their plugins and feed each one its payload
/// through [`crate::index::GraphIndex::load`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginFileEntry {
    /// Registry name the plugin was saved under.
    pub name: String,
    /// Plugin-type name, e.g. "dictionary".
    pub plugin_kind: String,
    /// Payload file name, relative to the manifest's directory.
    pub file: String,
}

/// Manifest written at the save path proper; partition and plugin files
/// are siblings named relative to it.
#[derive(Debug, Serialize, Deserialize)]
struct SaveManifest {
    /// Id-allocation cursor at save time.
    cursor: i32,
    vertex_count: u32,
    edge_count: u32,
    partition_files: Vec<String>,
    index_files: Vec<PluginFileEntry>,
    service_files: Vec<PluginFileEntry>,
}

/// A vertex group entry waiting for its edge to materialize.
#[derive(Debug)]
struct PendingLink {
    vertex_id: ElementId,
    edge_type: EdgeTypeId,
    incoming: bool,
}

/// Save the whole engine state under `path` (the manifest file), spread
/// over `partition_count` partition files written in parallel.
///
/// The engine write gate is held for the duration so the snapshot is
/// consistent against concurrent structural writes.
pub fn save(
    engine: &GraphEngine,
    path: impl AsRef<Path>,
    partition_count: u32,
) -> PersistenceResult<()> {
    if partition_count == 0 {
        return Err(PersistenceError::InvalidArgument(
            "partition count must be positive".to_string(),
        ));
    }
    let path = path.as_ref();

    engine.with_structural_lock(|| -> PersistenceResult<()> {
        let cursor = engine.state.cursor();
        let ranges = partition_ranges(cursor, partition_count);
        info!(
            "saving snapshot to {:?}: {} allocated id(s), {} partition(s)",
            path,
            cursor as i64 - i32::MIN as i64,
            ranges.len()
        );

        let partition_files: Vec<String> = (0..ranges.len())
            .map(|k| sibling_name(path, &format!(".part{}", k)))
            .collect();

        ranges
            .par_iter()
            .zip(partition_files.par_iter())
            .map(|(range, file)| write_partition(engine, &path.with_file_name(file), *range))
            .collect::<PersistenceResult<Vec<()>>>()?;

        let mut index_files = Vec::new();
        for (name, kind) in engine.indexes().describe() {
            let file = sibling_name(path, &format!(".index.{}", name));
            if let Some(index) = engine.indexes().get_index(&name) {
                let mut writer = BufWriter::new(File::create(path.with_file_name(&file))?);
                index.save(&mut writer)?;
                writer.flush()?;
            }
            index_files.push(PluginFileEntry {
                name,
                plugin_kind: kind.to_string(),
                file,
            });
        }

        let manifest = SaveManifest {
            cursor,
            vertex_count: engine.vertex_count(),
            edge_count: engine.edge_count(),
            partition_files,
            index_files,
            // Service plugins live outside the engine core.
            service_files: Vec::new(),
        };
        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut writer, &manifest)?;
        writer.flush()?;

        info!("snapshot saved to {:?}", path);
        Ok(())
    })??;
    Ok(())
}

/// Load an engine from a manifest written by [`save`].
pub fn load(path: impl AsRef<Path>) -> PersistenceResult<GraphEngine> {
    let path = path.as_ref();
    let manifest: SaveManifest = bincode::deserialize_from(BufReader::new(File::open(path)?))?;
    info!(
        "loading snapshot from {:?}: {} partition(s)",
        path,
        manifest.partition_files.len()
    );

    if !manifest.index_files.is_empty() || !manifest.service_files.is_empty() {
        warn!(
            "snapshot lists {} plugin payload file(s); not restored here, \
             re-register the plugins and feed them via saved_plugin_files",
            manifest.index_files.len() + manifest.service_files.len()
        );
    }

    let engine = GraphEngine::new();
    let deferred_edges: Mutex<Vec<EdgeRecord>> = Mutex::new(Vec::new());
    let pending_links: Mutex<FxHashMap<ElementId, Vec<PendingLink>>> =
        Mutex::new(FxHashMap::default());

    manifest
        .partition_files
        .par_iter()
        .map(|file| {
            read_partition(
                &engine,
                &path.with_file_name(file.as_str()),
                &deferred_edges,
                &pending_links,
            )
        })
        .collect::<PersistenceResult<Vec<()>>>()?;

    // Pass 1: edges whose endpoints were still missing mid-load. Every
    // vertex is in the store by now, so a miss here is corruption.
    let deferred = deferred_edges.into_inner().unwrap();
    debug!("resolving {} deferred edge(s)", deferred.len());
    for record in deferred {
        for endpoint in [record.source_id, record.target_id] {
            let live = engine
                .store
                .try_get(endpoint)
                .map(|el| el.is_vertex())
                .unwrap_or(false);
            if !live {
                return Err(PersistenceError::CorruptState(format!(
                    "edge {} references missing vertex {}",
                    record.id, endpoint
                )));
            }
        }
        materialize_edge(&engine, record);
    }

    // Pass 2: vertex group entries whose edge had not materialized when
    // the vertex was read.
    let pending = pending_links.into_inner().unwrap();
    debug!("resolving pending links for {} edge id(s)", pending.len());
    for (edge_id, links) in pending {
        let is_edge = engine
            .store
            .try_get(edge_id)
            .map(|el| el.is_edge())
            .unwrap_or(false);
        if !is_edge {
            return Err(PersistenceError::CorruptState(format!(
                "vertex adjacency references missing edge {}",
                edge_id
            )));
        }
        for link in links {
            let vertex_el = engine.store.try_get(link.vertex_id).ok_or_else(|| {
                PersistenceError::CorruptState(format!(
                    "pending link references missing vertex {}",
                    link.vertex_id
                ))
            })?;
            let vertex = vertex_el.as_vertex().ok_or_else(|| {
                PersistenceError::CorruptState(format!(
                    "pending link target {} is not a vertex",
                    link.vertex_id
                ))
            })?;
            let linked = if link.incoming {
                vertex.add_incoming_edge(link.edge_type, edge_id)
            } else {
                vertex.add_out_edge(link.edge_type, edge_id)
            };
            linked.map_err(GraphError::from)?;
        }
    }

    engine.state.set_cursor(manifest.cursor);
    engine.recount();
    if engine.vertex_count() != manifest.vertex_count
        || engine.edge_count() != manifest.edge_count
    {
        return Err(PersistenceError::CorruptState(format!(
            "recovered {}/{} elements, manifest promised {}/{}",
            engine.vertex_count(),
            engine.edge_count(),
            manifest.vertex_count,
            manifest.edge_count
        )));
    }
    info!(
        "snapshot loaded: {} vertices, {} edges",
        engine.vertex_count(),
        engine.edge_count()
    );
    Ok(engine)
}

/// List the plugin payload files a snapshot manifest carries (index
/// entries first, then service entries), without loading the graph.
pub fn saved_plugin_files(path: impl AsRef<Path>) -> PersistenceResult<Vec<PluginFileEntry>> {
    let manifest: SaveManifest =
        bincode::deserialize_from(BufReader::new(File::open(path.as_ref())?))?;
    let mut entries = manifest.index_files;
    entries.extend(manifest.service_files);
    Ok(entries)
}

/// Split the allocated range `[i32::MIN, cursor)` into `count` contiguous
/// slices, the remainder spread over the leading slices.
fn partition_ranges(cursor: i32, count: u32) -> Vec<(i32, i32)> {
    let total = cursor as i64 - i32::MIN as i64;
    let count = count as i64;
    let base = total / count;
    let remainder = total % count;

    let mut ranges = Vec::with_capacity(count as usize);
    let mut start = i32::MIN as i64;
    for k in 0..count {
        let len = base + if k < remainder { 1 } else { 0 };
        ranges.push((start as i32, (start + len) as i32));
        start += len;
    }
    ranges
}

/// Partition-sibling file name derived from the manifest file name.
fn sibling_name(path: &Path, suffix: &str) -> String {
    let stem = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snapshot".to_string());
    format!("{}{}", stem, suffix)
}

fn write_partition(
    engine: &GraphEngine,
    file: &PathBuf,
    (min_id, max_id): (i32, i32),
) -> PersistenceResult<()> {
    let mut writer = BufWriter::new(File::create(file)?);
    bincode::serialize_into(&mut writer, &PartitionHeader { min_id, max_id })?;

    let mut id = min_id as i64;
    while id < max_id as i64 {
        let record = match engine.store.try_get(id as i32) {
            None => PartitionRecord::Empty,
            Some(el) => element_record(&el)?,
        };
        bincode::serialize_into(&mut writer, &record)?;
        id += 1;
    }
    writer.flush()?;
    debug!("wrote partition {:?} covering [{}, {})", file, min_id, max_id);
    Ok(())
}

fn element_record(element: &Arc<GraphElement>) -> PersistenceResult<PartitionRecord> {
    match &**element {
        GraphElement::Vertex(v) => Ok(PartitionRecord::Vertex(VertexRecord {
            id: v.id(),
            created_at: v.created_at(),
            modified_at: v.modified_at().map_err(GraphError::from)?,
            properties: v.get_all_properties().map_err(GraphError::from)?,
            out_groups: v.out_adjacency().map_err(GraphError::from)?,
            in_groups: v.in_adjacency().map_err(GraphError::from)?,
        })),
        GraphElement::Edge(e) => Ok(PartitionRecord::Edge(EdgeRecord {
            id: e.id(),
            created_at: e.created_at(),
            modified_at: e.modified_at().map_err(GraphError::from)?,
            properties: e.get_all_properties().map_err(GraphError::from)?,
            source_id: e.source_id(),
            target_id: e.target_id(),
            edge_type_id: e.edge_type_id(),
        })),
    }
}

fn read_partition(
    engine: &GraphEngine,
    file: &Path,
    deferred_edges: &Mutex<Vec<EdgeRecord>>,
    pending_links: &Mutex<FxHashMap<ElementId, Vec<PendingLink>>>,
) -> PersistenceResult<()> {
    let mut reader = BufReader::new(File::open(file)?);
    let header: PartitionHeader = bincode::deserialize_from(&mut reader)?;
    if header.min_id > header.max_id {
        return Err(PersistenceError::InvalidArgument(format!(
            "partition {:?} has inverted bounds [{}, {})",
            file, header.min_id, header.max_id
        )));
    }

    let mut id = header.min_id as i64;
    while id < header.max_id as i64 {
        let record: PartitionRecord = bincode::deserialize_from(&mut reader)?;
        match record {
            PartitionRecord::Empty => {}
            PartitionRecord::Vertex(rec) => {
                if rec.id != id as i32 {
                    return Err(PersistenceError::CorruptState(format!(
                        "vertex record id {} found at slot {}",
                        rec.id, id
                    )));
                }
                materialize_vertex(engine, rec, pending_links);
            }
            PartitionRecord::Edge(rec) => {
                if rec.id != id as i32 {
                    return Err(PersistenceError::CorruptState(format!(
                        "edge record id {} found at slot {}",
                        rec.id, id
                    )));
                }
                let endpoints_present = [rec.source_id, rec.target_id].iter().all(|&v| {
                    engine
                        .store
                        .try_get(v)
                        .map(|el| el.is_vertex())
                        .unwrap_or(false)
                });
                if endpoints_present {
                    materialize_edge(engine, rec);
                } else {
                    deferred_edges.lock().unwrap().push(rec);
                }
            }
        }
        id += 1;
    }
    Ok(())
}

/// Materialize a vertex. Group entries whose edge already exists link
/// directly; the rest are parked as pending links. Adjacency is restored
/// exclusively through vertex records, so a later edge materialization
/// never inserts adjacency of its own.
fn materialize_vertex(
    engine: &GraphEngine,
    rec: VertexRecord,
    pending_links: &Mutex<FxHashMap<ElementId, Vec<PendingLink>>>,
) {
    let out_groups = sift_groups(engine, rec.id, rec.out_groups, false, pending_links);
    let in_groups = sift_groups(engine, rec.id, rec.in_groups, true, pending_links);
    let vertex = Vertex::restore(
        rec.id,
        rec.created_at,
        rec.modified_at,
        rec.properties,
        out_groups,
        in_groups,
    );
    engine
        .store
        .set(rec.id, Arc::new(GraphElement::Vertex(vertex)));
}

fn sift_groups(
    engine: &GraphEngine,
    vertex_id: ElementId,
    groups: Vec<(EdgeTypeId, Vec<ElementId>)>,
    incoming: bool,
    pending_links: &Mutex<FxHashMap<ElementId, Vec<PendingLink>>>,
) -> AdjacencyGroups {
    let mut sifted = AdjacencyGroups::new();
    for (edge_type, edge_ids) in groups {
        let mut present = Vec::with_capacity(edge_ids.len());
        for edge_id in edge_ids {
            if engine.store.try_get(edge_id).is_some() {
                present.push(edge_id);
            } else {
                pending_links
                    .lock()
                    .unwrap()
                    .entry(edge_id)
                    .or_default()
                    .push(PendingLink {
                        vertex_id,
                        edge_type,
                        incoming,
                    });
            }
        }
        sifted.insert(edge_type, present);
    }
    sifted
}

fn materialize_edge(engine: &GraphEngine, rec: EdgeRecord) {
    let edge = Edge::restore(
        rec.id,
        rec.created_at,
        rec.modified_at,
        rec.source_id,
        rec.target_id,
        rec.edge_type_id,
        rec.properties,
    );
    engine.store.set(rec.id, Arc::new(GraphElement::Edge(edge)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn snapshot_path(dir: &TempDir) -> PathBuf {
        dir.path().join("graph.snap")
    }

    #[test]
    fn test_partition_ranges_cover_domain() {
        let cursor = i32::MIN + 10;
        let ranges = partition_ranges(cursor, 3);
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[0].0, i32::MIN);
        assert_eq!(ranges[2].1, cursor);
        // Contiguous, no gaps.
        assert_eq!(ranges[0].1, ranges[1].0);
        assert_eq!(ranges[1].1, ranges[2].0);
        // 10 ids over 3 partitions: 4 + 3 + 3.
        assert_eq!(ranges[0].1 as i64 - ranges[0].0 as i64, 4);
    }

    #[test]
    fn test_zero_partitions_rejected() {
        let engine = GraphEngine::new();
        let dir = TempDir::new().unwrap();
        let err = save(&engine, snapshot_path(&dir), 0).unwrap_err();
        assert!(matches!(err, PersistenceError::InvalidArgument(_)));
    }

    #[test]
    fn test_empty_engine_round_trip() {
        let engine = GraphEngine::new();
        let dir = TempDir::new().unwrap();
        save(&engine, snapshot_path(&dir), 2).unwrap();

        let loaded = load(snapshot_path(&dir)).unwrap();
        assert_eq!(loaded.vertex_count(), 0);
        assert_eq!(loaded.edge_count(), 0);
        // The cursor came back too: first vertex gets the first id.
        let v = loaded.create_vertex(0, Vec::new()).unwrap();
        assert_eq!(v.id(), i32::MIN);
    }

    struct TaggedIndex;

    impl crate::index::GraphIndex for TaggedIndex {
        fn plugin_kind(&self) -> &'static str {
            "tagged"
        }

        fn on_property_set(&self, _element_id: ElementId, _value: &PropertyValue) {}

        fn on_element_removed(&self, _element_id: ElementId) {}

        fn save(&self, writer: &mut dyn Write) -> std::io::Result<()> {
            writer.write_all(b"tagged-v1")
        }

        fn load(&self, _reader: &mut dyn std::io::Read) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_plugin_payloads_listed_in_manifest() {
        let engine = GraphEngine::new();
        engine.create_vertex(0, Vec::new()).unwrap();
        assert!(engine.indexes().create_index("names", Arc::new(TaggedIndex)));

        let dir = TempDir::new().unwrap();
        let path = snapshot_path(&dir);
        save(&engine, &path, 1).unwrap();

        // The manifest names the payload file and the payload was written.
        let entries = saved_plugin_files(&path).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "names");
        assert_eq!(entries[0].plugin_kind, "tagged");
        let payload = std::fs::read(path.with_file_name(entries[0].file.as_str())).unwrap();
        assert_eq!(payload, b"tagged-v1");

        // Loading without the plugin registered still restores the graph.
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.vertex_count(), 1);
        assert!(loaded.indexes().get_index("names").is_none());
    }

    #[test]
    fn test_missing_endpoint_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = snapshot_path(&dir);

        // Hand-craft a snapshot holding one edge and no vertices.
        let part_name = sibling_name(&path, ".part0");
        let mut writer = BufWriter::new(File::create(path.with_file_name(&part_name)).unwrap());
        bincode::serialize_into(
            &mut writer,
            &PartitionHeader {
                min_id: i32::MIN,
                max_id: i32::MIN + 1,
            },
        )
        .unwrap();
        bincode::serialize_into(
            &mut writer,
            &PartitionRecord::Edge(EdgeRecord {
                id: i32::MIN,
                created_at: 0,
                modified_at: 0,
                properties: Vec::new(),
                source_id: 5,
                target_id: 6,
                edge_type_id: 1,
            }),
        )
        .unwrap();
        writer.flush().unwrap();

        let manifest = SaveManifest {
            cursor: i32::MIN + 1,
            vertex_count: 0,
            edge_count: 1,
            partition_files: vec![part_name],
            index_files: Vec::new(),
            service_files: Vec::new(),
        };
        let mut writer = BufWriter::new(File::create(&path).unwrap());
        bincode::serialize_into(&mut writer, &manifest).unwrap();
        writer.flush().unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, PersistenceError::CorruptState(_)));
    }
}

//! The query engine
//! Owns a store and its index behind one reader/writer lock

use crate::config::{EngineConfig, IndexStrategy};
use crate::error::{Result, VecError};
use crate::hnsw::HnswIndex;
use crate::index::{AnnIndex, FlatIndex};
use crate::store::{Record, RecordId, VectorStore};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

const FORMAT_VERSION: u32 = 1;

/// One row of a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: RecordId,
    pub label: String,
    pub distance: f32,
}

struct EngineState {
    store: VectorStore,
    index: Box<dyn AnnIndex>,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    format_version: u32,
    config: &'a EngineConfig,
    records: Vec<&'a Record>,
}

#[derive(Deserialize)]
struct Snapshot {
    format_version: u32,
    config: EngineConfig,
    records: Vec<Record>,
}

/// A vector store plus its index.
///
/// Queries share a read lock and run concurrently; inserts take the write
/// lock. The engine is `Send + Sync` and can be shared behind an `Arc`.
///
/// # Examples
///
/// ```
/// use annvec::{EngineConfig, QueryEngine};
///
/// let engine = QueryEngine::new(EngineConfig::with_dimension(3)).unwrap();
/// engine.insert(1, "Red apple".to_string(), vec![1.0, 0.0, 0.0]).unwrap();
/// engine.insert(2, "Green apple".to_string(), vec![0.0, 1.0, 0.0]).unwrap();
///
/// let hits = engine.similarity_search(&[0.9, 0.1, 0.0], 1).unwrap();
/// assert_eq!(hits[0].label, "Red apple");
/// ```
pub struct QueryEngine {
    config: EngineConfig,
    state: RwLock<EngineState>,
}

impl QueryEngine {
    /// Creates an empty engine. The configuration is validated before
    /// anything is built.
    pub fn new(config: EngineConfig) -> Result<QueryEngine> {
        config.validate()?;
        let store = VectorStore::new(config.dimension)?;
        let index: Box<dyn AnnIndex> = match config.strategy {
            IndexStrategy::Flat => Box::new(FlatIndex::new(config.metric)),
            IndexStrategy::Hnsw => Box::new(HnswIndex::new(config.hnsw.clone(), config.metric)?),
        };

        Ok(QueryEngine {
            config,
            state: RwLock::new(EngineState { store, index }),
        })
    }

    /// Inserts one record into the store and the index. Either both see the
    /// record or neither does.
    pub fn insert(&self, id: RecordId, label: String, vector: Vec<f32>) -> Result<()> {
        let mut state = self.state.write();
        Self::insert_locked(&mut state, id, label, vector)
    }

    fn insert_locked(
        state: &mut EngineState,
        id: RecordId,
        label: String,
        vector: Vec<f32>,
    ) -> Result<()> {
        let EngineState { store, index } = state;
        store.insert(id, label, vector)?;
        if let Err(err) = index.insert(store, id) {
            store.pop();
            return Err(err);
        }
        Ok(())
    }

    /// Inserts records in order and returns how many were added. Stops at the
    /// first failing record; the ones before it stay inserted.
    pub fn extend<I>(&self, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = (RecordId, String, Vec<f32>)>,
    {
        let mut state = self.state.write();
        let mut inserted = 0;
        for (id, label, vector) in records {
            Self::insert_locked(&mut state, id, label, vector)?;
            inserted += 1;
        }
        tracing::debug!(inserted, total = state.store.len(), "extended engine");
        Ok(inserted)
    }

    /// The `k` nearest records to `query`, closest first, using the configured
    /// `ef_search`.
    pub fn similarity_search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        self.similarity_search_with_ef(query, k, self.config.hnsw.ef_search)
    }

    pub fn similarity_search_with_ef(
        &self,
        query: &[f32],
        k: usize,
        ef_search: usize,
    ) -> Result<Vec<SearchHit>> {
        let state = self.state.read();
        if state.store.is_empty() {
            return Err(VecError::EmptyIndex);
        }

        let neighbors = state.index.query(&state.store, query, k, ef_search)?;
        neighbors
            .into_iter()
            .map(|n| -> Result<SearchHit> {
                let record = state.store.get(n.id)?;
                Ok(SearchHit {
                    id: n.id,
                    label: record.label.clone(),
                    distance: n.distance,
                })
            })
            .collect()
    }

    pub fn get(&self, id: RecordId) -> Result<Record> {
        self.state.read().store.get(id).cloned()
    }

    /// Copy of every record in insertion order.
    pub fn records(&self) -> Vec<Record> {
        self.state.read().store.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.read().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Writes the configuration and all records to `path` with bincode.
    ///
    /// The graph itself is not stored: [`load`](QueryEngine::load) replays the
    /// inserts, and the seeded level draws rebuild the same graph.
    ///
    /// A regular file is replaced through a sibling `.tmp` file and a rename,
    /// so a failed save leaves the previous snapshot intact. Any other
    /// existing target (a device, a pipe) is written in place.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let (bytes, records) = {
            let state = self.state.read();
            let snapshot = SnapshotRef {
                format_version: FORMAT_VERSION,
                config: &self.config,
                records: state.store.iter().collect(),
            };
            (bincode::serialize(&snapshot)?, snapshot.records.len())
        };

        let in_place = std::fs::metadata(path).is_ok_and(|meta| !meta.is_file());
        if in_place {
            write_synced(path, &bytes)?;
        } else {
            let tmp = tmp_path(path);
            if let Err(err) = write_synced(&tmp, &bytes) {
                let _ = std::fs::remove_file(&tmp);
                return Err(err);
            }
            std::fs::rename(&tmp, path)?;
        }

        tracing::info!(path = %path.display(), records, "saved snapshot");
        Ok(())
    }

    /// Loads a snapshot written by [`save`](QueryEngine::save) and rebuilds
    /// the index.
    pub fn load(path: impl AsRef<Path>) -> Result<QueryEngine> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let snapshot: Snapshot = bincode::deserialize_from(reader)?;
        if snapshot.format_version != FORMAT_VERSION {
            return Err(VecError::UnsupportedFormat(snapshot.format_version));
        }

        let engine = QueryEngine::new(snapshot.config)?;
        let count = engine.extend(
            snapshot
                .records
                .into_iter()
                .map(|r| (r.id, r.label, r.vector)),
        )?;

        tracing::info!(path = %path.display(), records = count, "loaded snapshot");
        Ok(engine)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Writes `bytes` and returns only once they reached the file.
fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(bytes)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}

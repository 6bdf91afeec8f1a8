//! The record store
//! Owns every (id, label, vector) record, in insertion order

use crate::error::{Result, VecError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub type RecordId = i64;

/// A labeled vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub label: String,
    pub vector: Vec<f32>,
}

/// Records keyed by id. Iteration follows insertion order so that rebuilding
/// an index from the store is deterministic.
#[derive(Debug, Clone)]
pub struct VectorStore {
    records: IndexMap<RecordId, Record>,
    dimension: usize,
}

impl VectorStore {
    /// Creates an empty store whose vectors all have `dimension` components.
    ///
    /// # Examples
    ///
    /// ```
    /// use annvec::VectorStore;
    ///
    /// let store = VectorStore::new(3).unwrap();
    /// assert_eq!(store.len(), 0);
    /// assert_eq!(store.dimension(), 3);
    /// assert!(VectorStore::new(0).is_err());
    /// ```
    pub fn new(dimension: usize) -> Result<VectorStore> {
        if dimension == 0 {
            return Err(VecError::InvalidDimension);
        }
        Ok(VectorStore { records: IndexMap::new(), dimension })
    }

    /// Stores a new record.
    ///
    /// Fails with [`VecError::DuplicateId`] if the id is taken and with
    /// [`VecError::DimensionMismatch`] if the vector has the wrong length.
    /// The store is unchanged on failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use annvec::{VectorStore, VecError};
    ///
    /// let mut store = VectorStore::new(3).unwrap();
    /// store.insert(1, "Red apple".to_string(), vec![1.0, 0.0, 0.0]).unwrap();
    ///
    /// let dup = store.insert(1, "Again".to_string(), vec![0.0, 1.0, 0.0]);
    /// assert!(matches!(dup, Err(VecError::DuplicateId(1))));
    ///
    /// let short = store.insert(2, "Short".to_string(), vec![1.0]);
    /// assert!(matches!(short, Err(VecError::DimensionMismatch { .. })));
    /// assert_eq!(store.len(), 1);
    /// ```
    pub fn insert(&mut self, id: RecordId, label: String, vector: Vec<f32>) -> Result<()> {
        self.check(id, &vector)?;
        self.records.insert(id, Record { id, label, vector });
        Ok(())
    }

    /// Runs the insert validation without storing anything.
    fn check(&self, id: RecordId, vector: &[f32]) -> Result<()> {
        if self.records.contains_key(&id) {
            return Err(VecError::DuplicateId(id));
        }
        if vector.len() != self.dimension {
            return Err(VecError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Drops the most recently inserted record.
    pub(crate) fn pop(&mut self) -> Option<Record> {
        self.records.pop().map(|(_, record)| record)
    }

    pub fn get(&self, id: RecordId) -> Result<&Record> {
        self.records.get(&id).ok_or(VecError::NotFound(id))
    }

    pub fn vector(&self, id: RecordId) -> Option<&[f32]> {
        self.records.get(&id).map(|r| r.vector.as_slice())
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.records.contains_key(&id)
    }

    /// Ids in insertion order. The iterator is lazy and can be cloned to
    /// restart it.
    pub fn all_ids(&self) -> impl Iterator<Item = RecordId> + Clone + '_ {
        self.records.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> + '_ {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

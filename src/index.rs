//! Index strategies
//!
//! An index never owns vectors: it keeps record ids and reads the vectors
//! back from the [`VectorStore`] it is handed on every call.

use crate::error::{Result, VecError};
use crate::store::{RecordId, VectorStore};
use crate::vector::Metric;
use std::cmp::Ordering;
use std::collections::HashSet;

/// A ranked search result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: RecordId,
    pub distance: f32,
}

impl Neighbor {
    /// Ascending distance, ties broken by ascending id.
    pub fn rank(&self, other: &Neighbor) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.id.cmp(&other.id))
    }
}

/// Insert and query over records held in a [`VectorStore`].
pub trait AnnIndex: Send + Sync {
    /// Adds the stored record `id` to the index.
    fn insert(&mut self, store: &VectorStore, id: RecordId) -> Result<()>;

    /// Returns at most `k` neighbors of `query` in ascending distance.
    /// `ef_search` bounds the candidate list for strategies that use one.
    fn query(
        &self,
        store: &VectorStore,
        query: &[f32],
        k: usize,
        ef_search: usize,
    ) -> Result<Vec<Neighbor>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub(crate) fn check_query_dimension(store: &VectorStore, query: &[f32]) -> Result<()> {
    if query.len() != store.dimension() {
        return Err(VecError::DimensionMismatch {
            expected: store.dimension(),
            actual: query.len(),
        });
    }
    Ok(())
}

/// Exact linear scan. Used for tiny collections and as the ground truth the
/// graph index is measured against.
#[derive(Debug, Default)]
pub struct FlatIndex {
    ids: Vec<RecordId>,
    members: HashSet<RecordId>,
    metric: Metric,
}

impl FlatIndex {
    pub fn new(metric: Metric) -> FlatIndex {
        FlatIndex { ids: Vec::new(), members: HashSet::new(), metric }
    }
}

impl AnnIndex for FlatIndex {
    fn insert(&mut self, store: &VectorStore, id: RecordId) -> Result<()> {
        if !store.contains(id) {
            return Err(VecError::NotFound(id));
        }
        if !self.members.insert(id) {
            return Err(VecError::DuplicateId(id));
        }
        self.ids.push(id);
        Ok(())
    }

    fn query(
        &self,
        store: &VectorStore,
        query: &[f32],
        k: usize,
        _ef_search: usize,
    ) -> Result<Vec<Neighbor>> {
        check_query_dimension(store, query)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored = Vec::with_capacity(self.ids.len());
        for &id in &self.ids {
            let vector = store.vector(id).ok_or(VecError::NotFound(id))?;
            scored.push(Neighbor { id, distance: self.metric.distance(query, vector)? });
        }

        scored.sort_by(Neighbor::rank);
        scored.truncate(k);
        Ok(scored)
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}

#[cfg(test)]
mod index_test {
    use super::*;

    fn line_store() -> VectorStore {
        let mut store = VectorStore::new(1).unwrap();
        for id in 0..10 {
            store.insert(id, format!("p{}", id), vec![id as f32]).unwrap();
        }
        store
    }

    #[test]
    fn test_flat_query_orders_by_distance() {
        let store = line_store();
        let mut index = FlatIndex::new(Metric::SquaredL2);
        for id in store.all_ids() {
            index.insert(&store, id).unwrap();
        }

        let hits = index.query(&store, &[6.2], 3, 0).unwrap();
        let ids: Vec<_> = hits.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![6, 7, 5]);
    }

    #[test]
    fn test_flat_ties_broken_by_id() {
        let store = line_store();
        let mut index = FlatIndex::new(Metric::SquaredL2);
        for id in store.all_ids().collect::<Vec<_>>().into_iter().rev() {
            index.insert(&store, id).unwrap();
        }

        // 4 and 6 are both at distance 1 from 5
        let hits = index.query(&store, &[5.0], 3, 0).unwrap();
        let ids: Vec<_> = hits.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![5, 4, 6]);
    }

    #[test]
    fn test_flat_rejects_unknown_and_duplicate() {
        let store = line_store();
        let mut index = FlatIndex::new(Metric::SquaredL2);

        assert!(matches!(index.insert(&store, 99), Err(VecError::NotFound(99))));
        index.insert(&store, 1).unwrap();
        assert!(matches!(index.insert(&store, 1), Err(VecError::DuplicateId(1))));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_flat_large_build_rejects_duplicates() {
        let mut store = VectorStore::new(2).unwrap();
        for id in 0..20_000 {
            store.insert(id, String::new(), vec![id as f32, 0.0]).unwrap();
        }

        let mut index = FlatIndex::new(Metric::SquaredL2);
        for id in store.all_ids() {
            index.insert(&store, id).unwrap();
        }
        assert_eq!(index.len(), 20_000);

        for id in [0, 9_999, 19_999] {
            assert!(matches!(index.insert(&store, id), Err(VecError::DuplicateId(d)) if d == id));
        }
        assert_eq!(index.len(), 20_000);

        let hits = index.query(&store, &[10_000.4, 0.0], 2, 0).unwrap();
        let ids: Vec<_> = hits.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![10_000, 10_001]);
    }

    #[test]
    fn test_flat_query_dimension_mismatch() {
        let store = line_store();
        let index = FlatIndex::new(Metric::SquaredL2);

        let result = index.query(&store, &[1.0, 2.0], 1, 0);
        assert!(matches!(result, Err(VecError::DimensionMismatch { expected: 1, actual: 2 })));
    }

    #[test]
    fn test_neighbor_rank() {
        let a = Neighbor { id: 2, distance: 0.5 };
        let b = Neighbor { id: 1, distance: 0.5 };
        let c = Neighbor { id: 0, distance: 0.7 };
        assert_eq!(a.rank(&b), Ordering::Greater);
        assert_eq!(b.rank(&c), Ordering::Less);
    }
}

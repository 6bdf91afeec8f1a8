//! HNSW graph index
//!
//! Hierarchical navigable small world graph after Malkov & Yashunin. Every
//! node lives on layer 0; a node drawn at level `l` also lives on layers
//! `1..=l`. Searches start at the single entry point on the top layer, walk
//! greedily down to layer 1 and finish with a best-first search on layer 0.
//!
//! Nodes are addressed by a dense slot number internally; the record id is
//! only used to read vectors from the store and to break distance ties.

use crate::config::HnswConfig;
use crate::error::{Result, VecError};
use crate::index::{check_query_dimension, AnnIndex, Neighbor};
use crate::store::{RecordId, VectorStore};
use crate::vector::Metric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};

type Slot = usize;

#[derive(Debug)]
struct IndexNode {
    id: RecordId,
    /// One adjacency list per layer, `0..=level`.
    neighbors: Vec<Vec<Slot>>,
}

impl IndexNode {
    fn level(&self) -> usize {
        self.neighbors.len() - 1
    }
}

/// Heap entry. Ordered by distance, then record id.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance: f32,
    id: RecordId,
    slot: Slot,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.id.cmp(&other.id))
    }
}

/// Reverse-edge update computed before the graph is touched.
struct Backlink {
    slot: Slot,
    layer: usize,
    neighbors: Vec<Slot>,
}

pub struct HnswIndex {
    config: HnswConfig,
    metric: Metric,
    nodes: Vec<IndexNode>,
    slots: HashMap<RecordId, Slot>,
    entry_point: Option<Slot>,
    top_level: usize,
    /// mL = 1 / ln(M)
    level_mult: f64,
    rng: StdRng,
}

impl HnswIndex {
    /// Creates an empty index. Fails if `config` is invalid.
    pub fn new(config: HnswConfig, metric: Metric) -> Result<HnswIndex> {
        config.validate()?;
        let level_mult = 1.0 / (config.m as f64).ln();
        let rng = StdRng::seed_from_u64(config.seed);

        Ok(HnswIndex {
            config,
            metric,
            nodes: Vec::new(),
            slots: HashMap::new(),
            entry_point: None,
            top_level: 0,
            level_mult,
            rng,
        })
    }

    pub fn config(&self) -> &HnswConfig {
        &self.config
    }

    /// Record id of the current entry point.
    pub fn entry_point(&self) -> Option<RecordId> {
        self.entry_point.map(|slot| self.nodes[slot].id)
    }

    /// Highest populated layer.
    pub fn top_level(&self) -> usize {
        self.top_level
    }

    /// Level the record was assigned on insert.
    pub fn level_of(&self, id: RecordId) -> Option<usize> {
        self.slots.get(&id).map(|&slot| self.nodes[slot].level())
    }

    /// Neighbor ids of `id` on `layer`, or `None` if the node is not on that
    /// layer.
    pub fn neighbors(&self, id: RecordId, layer: usize) -> Option<Vec<RecordId>> {
        let node = &self.nodes[*self.slots.get(&id)?];
        let links = node.neighbors.get(layer)?;
        Some(links.iter().map(|&slot| self.nodes[slot].id).collect())
    }

    /// Geometric level draw: floor(-ln(u) * mL), u in (0, 1].
    fn random_level(&mut self) -> usize {
        let u = 1.0 - self.rng.gen_range(0.0f64..1.0);
        let level = (-u.ln() * self.level_mult).floor() as usize;
        level.min(self.config.max_level)
    }

    fn candidate(&self, store: &VectorStore, query: &[f32], slot: Slot) -> Result<Candidate> {
        let id = self.nodes[slot].id;
        let vector = store.vector(id).ok_or(VecError::NotFound(id))?;
        Ok(Candidate {
            distance: self.metric.distance(query, vector)?,
            id,
            slot,
        })
    }

    /// Moves to the closest neighbor on `layer` until no neighbor is closer.
    fn greedy_closest(
        &self,
        store: &VectorStore,
        query: &[f32],
        entry: Candidate,
        layer: usize,
    ) -> Result<Candidate> {
        let mut best = entry;
        loop {
            let current = best.slot;
            let mut improved = false;
            for &slot in &self.nodes[current].neighbors[layer] {
                let candidate = self.candidate(store, query, slot)?;
                if candidate < best {
                    best = candidate;
                    improved = true;
                }
            }
            if !improved {
                return Ok(best);
            }
        }
    }

    /// Best-first search on one layer keeping at most `ef` results. Returns
    /// the results closest first.
    fn search_layer(
        &self,
        store: &VectorStore,
        query: &[f32],
        entries: Vec<Candidate>,
        ef: usize,
        layer: usize,
    ) -> Result<Vec<Candidate>> {
        let mut visited: HashSet<Slot> = entries.iter().map(|c| c.slot).collect();
        let mut candidates: BinaryHeap<Reverse<Candidate>> =
            entries.iter().copied().map(Reverse).collect();
        let mut results: BinaryHeap<Candidate> = entries.into_iter().collect();

        while let Some(Reverse(current)) = candidates.pop() {
            if let Some(farthest) = results.peek() {
                if results.len() >= ef && current > *farthest {
                    break;
                }
            }

            for &slot in &self.nodes[current.slot].neighbors[layer] {
                if !visited.insert(slot) {
                    continue;
                }
                let candidate = self.candidate(store, query, slot)?;
                let admit = results.len() < ef
                    || results.peek().is_some_and(|farthest| candidate < *farthest);
                if admit {
                    candidates.push(Reverse(candidate));
                    results.push(candidate);
                    if results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        Ok(results.into_sorted_vec())
    }

    /// Forward links of a new node at `level`, one list per layer.
    fn plan_links(
        &self,
        store: &VectorStore,
        vector: &[f32],
        level: usize,
    ) -> Result<Vec<Vec<Slot>>> {
        let mut links = vec![Vec::new(); level + 1];
        let Some(entry) = self.entry_point else {
            return Ok(links);
        };

        let mut nearest = self.candidate(store, vector, entry)?;
        for layer in (level + 1..=self.top_level).rev() {
            nearest = self.greedy_closest(store, vector, nearest, layer)?;
        }

        for layer in (0..=level.min(self.top_level)).rev() {
            let found = self.search_layer(
                store,
                vector,
                vec![nearest],
                self.config.ef_construction,
                layer,
            )?;
            links[layer] = found.iter().take(self.config.m).map(|c| c.slot).collect();
            if let Some(first) = found.first() {
                nearest = *first;
            }
        }

        Ok(links)
    }

    /// Reverse edges for the node at `slot`, pruned to M by evicting the
    /// farthest neighbors.
    fn plan_backlinks(&self, store: &VectorStore, slot: Slot) -> Result<Vec<Backlink>> {
        let mut updates = Vec::new();
        for (layer, links) in self.nodes[slot].neighbors.iter().enumerate() {
            for &neighbor in links {
                let mut list = self.nodes[neighbor].neighbors[layer].clone();
                list.push(slot);

                if list.len() > self.config.m {
                    let id = self.nodes[neighbor].id;
                    let base = store.vector(id).ok_or(VecError::NotFound(id))?;
                    let mut ranked = list
                        .iter()
                        .map(|&s| self.candidate(store, base, s))
                        .collect::<Result<Vec<_>>>()?;
                    ranked.sort();
                    ranked.truncate(self.config.m);
                    list = ranked.into_iter().map(|c| c.slot).collect();
                }

                updates.push(Backlink { slot: neighbor, layer, neighbors: list });
            }
        }
        Ok(updates)
    }
}

impl AnnIndex for HnswIndex {
    fn insert(&mut self, store: &VectorStore, id: RecordId) -> Result<()> {
        if self.slots.contains_key(&id) {
            return Err(VecError::DuplicateId(id));
        }
        let vector = store.vector(id).ok_or(VecError::NotFound(id))?;

        let level = self.random_level();
        let links = self.plan_links(store, vector, level)?;

        let slot = self.nodes.len();
        self.nodes.push(IndexNode { id, neighbors: links });
        self.slots.insert(id, slot);

        let updates = match self.plan_backlinks(store, slot) {
            Ok(updates) => updates,
            Err(err) => {
                self.nodes.pop();
                self.slots.remove(&id);
                return Err(err);
            }
        };
        for update in updates {
            self.nodes[update.slot].neighbors[update.layer] = update.neighbors;
        }

        if self.entry_point.is_none() || level > self.top_level {
            self.entry_point = Some(slot);
            self.top_level = level;
        }

        tracing::debug!(id, level, top_level = self.top_level, "hnsw insert");
        Ok(())
    }

    fn query(
        &self,
        store: &VectorStore,
        query: &[f32],
        k: usize,
        ef_search: usize,
    ) -> Result<Vec<Neighbor>> {
        check_query_dimension(store, query)?;
        let Some(entry) = self.entry_point else {
            return Ok(Vec::new());
        };
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut nearest = self.candidate(store, query, entry)?;
        for layer in (1..=self.top_level).rev() {
            nearest = self.greedy_closest(store, query, nearest, layer)?;
        }

        let found = self.search_layer(store, query, vec![nearest], ef_search.max(k), 0)?;
        Ok(found
            .into_iter()
            .take(k)
            .map(|c| Neighbor { id: c.id, distance: c.distance })
            .collect())
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }
}

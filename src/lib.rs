//! # annvec - An Embedded Vector Similarity Index
//!
//! annvec keeps labeled vectors in memory and answers top-k similarity
//! queries through an HNSW graph (or an exact linear scan for tiny sets).
//! Distances default to squared Euclidean, so smaller means closer.
//!
//! ## Example
//!
//! ```
//! use annvec::{EngineConfig, QueryEngine};
//!
//! let engine = QueryEngine::new(EngineConfig::with_dimension(3)).unwrap();
//!
//! engine.insert(1, "Red apple".to_string(), vec![1.0, 0.0, 0.0]).unwrap();
//! engine.insert(2, "Green apple".to_string(), vec![0.0, 1.0, 0.0]).unwrap();
//! engine.insert(3, "Blue berry".to_string(), vec![0.0, 0.0, 1.0]).unwrap();
//!
//! let results = engine.similarity_search(&[0.8, 0.1, 0.1], 2).unwrap();
//! assert_eq!(results[0].id, 1); // Red apple is closest
//! assert!((results[0].distance - 0.06).abs() < 1e-5);
//! ```

pub mod config;
pub mod error;
pub mod hnsw;
pub mod index;
pub mod server;
pub mod store;
pub mod vector;
mod engine;

pub use config::{Config, EngineConfig, HnswConfig, IndexStrategy, ServerConfig};
pub use engine::{QueryEngine, SearchHit};
pub use error::{Result, VecError};
pub use hnsw::HnswIndex;
pub use index::{AnnIndex, FlatIndex, Neighbor};
pub use store::{Record, RecordId, VectorStore};
pub use vector::Metric;

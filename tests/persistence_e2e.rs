use annvec::{EngineConfig, HnswConfig, QueryEngine};
use std::time::Instant;
use tempfile::NamedTempFile;

fn random_vector(dim: usize, seed: u64) -> Vec<f32> {
    // Simple LCG pseudo-random generator
    let mut state = seed;
    (0..dim)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            // Map to [-1.0, 1.0]
            ((state >> 33) as f32) / (u32::MAX as f32) * 2.0 - 1.0
        })
        .collect()
}

#[test]
fn test_save_load_rebuilds_identical_index() {
    let dim = 32;
    let num_vectors = 2_000;
    let num_searches = 50;

    let config = EngineConfig {
        hnsw: HnswConfig { m: 12, ef_construction: 64, ..Default::default() },
        ..EngineConfig::with_dimension(dim)
    };

    println!("\n=== Persistence E2E Test ===");
    println!("Vectors: {}, Dimensions: {}, Searches: {}\n", num_vectors, dim, num_searches);

    // Phase 1: build
    let start = Instant::now();
    let engine = QueryEngine::new(config).unwrap();
    let inserted = engine
        .extend((0..num_vectors).map(|i| (i as i64, format!("vec_{}", i), random_vector(dim, i as u64))))
        .unwrap();
    assert_eq!(inserted, num_vectors);
    println!("Phase 1 - Insert {} vectors: {:.3}s", num_vectors, start.elapsed().as_secs_f64());

    // Phase 2: save
    let temp = NamedTempFile::new().unwrap();
    let path = temp.path();
    engine.save(path).unwrap();
    let file_size = std::fs::metadata(path).unwrap().len();
    println!("Phase 2 - Saved ({:.2} MB)", file_size as f64 / 1_048_576.0);

    // Phase 3: load and rebuild
    let start = Instant::now();
    let loaded = QueryEngine::load(path).unwrap();
    assert_eq!(loaded.len(), num_vectors);
    assert_eq!(loaded.config(), engine.config());
    println!("Phase 3 - Load + rebuild: {:.3}s", start.elapsed().as_secs_f64());

    // Phase 4: both engines answer identically
    for i in 0..num_searches {
        let query = random_vector(dim, (num_vectors + i) as u64);
        let before = engine.similarity_search(&query, 10).unwrap();
        let after = loaded.similarity_search(&query, 10).unwrap();

        assert_eq!(before.len(), 10);
        assert_eq!(before, after);
        for w in before.windows(2) {
            assert!(w[0].distance <= w[1].distance, "Results not sorted by distance");
        }
    }
}

#[test]
fn test_save_and_load_empty_engine() {
    let temp = NamedTempFile::new().unwrap();
    let engine = QueryEngine::new(EngineConfig::with_dimension(4)).unwrap();
    engine.save(temp.path()).unwrap();

    let loaded = QueryEngine::load(temp.path()).unwrap();
    assert!(loaded.is_empty());
    assert_eq!(loaded.dimension(), 4);
}

#[test]
fn test_save_overwrite() {
    let temp = NamedTempFile::new().unwrap();

    let first = QueryEngine::new(EngineConfig::with_dimension(2)).unwrap();
    first.insert(1, "old".to_string(), vec![1.0, 0.0]).unwrap();
    first.save(temp.path()).unwrap();

    let second = QueryEngine::new(EngineConfig::with_dimension(3)).unwrap();
    second.insert(10, "new1".to_string(), vec![1.0, 0.0, 0.0]).unwrap();
    second.insert(11, "new2".to_string(), vec![0.0, 1.0, 0.0]).unwrap();
    second.save(temp.path()).unwrap();

    let loaded = QueryEngine::load(temp.path()).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.dimension(), 3);
    assert!(loaded.get(1).is_err());
    assert_eq!(loaded.get(11).unwrap().label, "new2");
}

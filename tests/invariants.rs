use annvec::{EngineConfig, QueryEngine, VecError};
use proptest::prelude::*;

fn vector_of(len: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-100.0f32..100.0, len)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn stored_vectors_always_have_store_dimension(
        dim in 1usize..8,
        lengths in prop::collection::vec(0usize..10, 1..30),
    ) {
        let engine = QueryEngine::new(EngineConfig::with_dimension(dim)).unwrap();

        for (i, len) in lengths.iter().enumerate() {
            let before = engine.len();
            let result = engine.insert(i as i64, format!("r{}", i), vec![0.5; *len]);
            if *len == dim {
                prop_assert!(result.is_ok());
                prop_assert_eq!(engine.len(), before + 1);
            } else {
                let is_mismatch = matches!(result, Err(VecError::DimensionMismatch { .. }));
                prop_assert!(is_mismatch);
                prop_assert_eq!(engine.len(), before);
            }
        }

        for record in engine.records() {
            prop_assert_eq!(record.vector.len(), dim);
        }
    }

    #[test]
    fn duplicate_ids_are_rejected(
        ids in prop::collection::vec(0i64..20, 1..40),
        vector in vector_of(3),
    ) {
        let engine = QueryEngine::new(EngineConfig::with_dimension(3)).unwrap();
        let mut seen = std::collections::HashSet::new();

        for id in ids {
            let before = engine.len();
            let result = engine.insert(id, "x".to_string(), vector.clone());
            if seen.insert(id) {
                prop_assert!(result.is_ok());
            } else {
                let is_duplicate = matches!(result, Err(VecError::DuplicateId(d)) if d == id);
                prop_assert!(is_duplicate);
                prop_assert_eq!(engine.len(), before);
            }
        }
        prop_assert_eq!(engine.len(), seen.len());
    }

    #[test]
    fn search_results_are_sorted_and_bounded(
        rows in prop::collection::vec(vector_of(4), 1..60),
        query in vector_of(4),
        k in 0usize..20,
    ) {
        let engine = QueryEngine::new(EngineConfig::with_dimension(4)).unwrap();
        engine
            .extend(rows.into_iter().enumerate().map(|(i, v)| (i as i64, String::new(), v)))
            .unwrap();

        let hits = engine.similarity_search(&query, k).unwrap();
        prop_assert!(hits.len() <= k);
        prop_assert!(hits.len() <= engine.len());
        for pair in hits.windows(2) {
            prop_assert!(
                pair[0].distance < pair[1].distance
                    || (pair[0].distance == pair[1].distance && pair[0].id < pair[1].id)
            );
        }
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use super::*;
use crate::codec::{self, CodecError};
use crate::engine::{LocalEngine, MockSimilarityEngine};
use crate::index::{GlobalDocId, MemoryIndex, MemorySegment, SegmentReader};
use crate::query::VectorQuery;

const FIELD: &str = "vector";

fn sample_vectors() -> Vec<Vec<f32>> {
    vec![
        vec![1.0, 0.0, 0.0, 0.0],
        vec![0.5, 0.5, 0.5, 0.5],
        vec![-1.0, 2.0, 0.25, 3.0],
        vec![0.1, -0.2, 0.3, -0.4],
        vec![4.0, 3.0, 2.0, 1.0],
    ]
}

fn sample_index(include_magnitude: bool) -> MemoryIndex {
    let mut builder = MemoryIndex::builder(FIELD).segment_size(2);
    for vector in sample_vectors() {
        builder.add_vector(&vector, include_magnitude);
    }
    builder.build()
}

fn collect_scores(query: &VectorQuery, index: &MemoryIndex) -> Vec<f32> {
    let context = query.new_execution_context().unwrap();
    let mut scores = Vec::new();
    for segment in index.segments() {
        let Some(mut cursor) = context.scoring_cursor_for(segment).unwrap() else {
            continue;
        };
        while cursor.next_doc().is_some() {
            scores.push(cursor.score().unwrap());
        }
    }
    scores
}

fn raw_segment(bytes: Vec<u8>) -> MemorySegment {
    let mut columns = HashMap::new();
    columns.insert(FIELD.to_string(), vec![(0, bytes)]);
    MemorySegment::new(0, 0, columns)
}

#[test]
fn test_strategy_parse() {
    assert_eq!("default".parse::<ScoringStrategy>(), Ok(ScoringStrategy::Default));
    assert_eq!("CACHED".parse::<ScoringStrategy>(), Ok(ScoringStrategy::Cached));
    assert_eq!(" external ".parse::<ScoringStrategy>(), Ok(ScoringStrategy::External));
    assert!("gpu".parse::<ScoringStrategy>().is_err());
    assert!("cache".parse::<ScoringStrategy>().is_err());
    assert!("native".parse::<ScoringStrategy>().is_err());
    assert_eq!(ScoringStrategy::External.to_string(), "external");
    assert_eq!(ScoringStrategy::default(), ScoringStrategy::Default);
}

#[test]
fn test_strategy_serde_lowercase() {
    let json = serde_json::to_string(&ScoringStrategy::Cached).unwrap();
    assert_eq!(json, "\"cached\"");
    let back: ScoringStrategy = serde_json::from_str("\"external\"").unwrap();
    assert_eq!(back, ScoringStrategy::External);
}

#[test]
fn test_strategies_agree() {
    let query = vec![0.3, -0.1, 0.8, 0.2];

    for include_magnitude in [true, false] {
        let index = sample_index(include_magnitude);
        let baseline = collect_scores(
            &VectorQuery::with_strategy(FIELD, query.clone(), ScoringStrategy::Default).unwrap(),
            &index,
        );
        assert_eq!(baseline.len(), sample_vectors().len());

        for strategy in [ScoringStrategy::Cached, ScoringStrategy::External] {
            let q = VectorQuery::with_strategy(FIELD, query.clone(), strategy).unwrap();
            let scores = collect_scores(&q, &index);
            assert_eq!(scores.len(), baseline.len());
            for (a, b) in baseline.iter().zip(scores.iter()) {
                assert!((a - b).abs() < 1e-4, "{strategy}: {a} vs {b}");
            }
        }
    }
}

#[test]
fn test_identical_vector_scores_one() {
    let target = sample_vectors()[2].clone();
    let index = sample_index(true);

    for strategy in ScoringStrategy::ALL {
        let query = VectorQuery::with_strategy(FIELD, target.clone(), strategy).unwrap();
        let scores = collect_scores(&query, &index);
        assert!((scores[2] - 1.0).abs() < 1e-5, "{strategy}: {}", scores[2]);
        assert!(scores.iter().all(|s| *s <= 1.0 + 1e-5));
    }
}

#[test]
fn test_cached_score_is_idempotent() {
    let index = sample_index(true);
    let factory = Arc::new(ScorerFactory::cached());
    let query = VectorQuery::new(FIELD, vec![1.0, 2.0, 3.0, 4.0], Arc::clone(&factory)).unwrap();
    let context = query.new_execution_context().unwrap();

    let mut cursor = context
        .scoring_cursor_for(&index.segments()[0])
        .unwrap()
        .unwrap();
    cursor.next_doc();

    let first = cursor.score().unwrap();
    let second = cursor.score().unwrap();
    let cache = factory.cache().unwrap();

    assert_eq!(first.to_bits(), second.to_bits());
    assert_eq!(cache.misses(), 1);
    assert_eq!(cache.hits(), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_cache_shared_across_queries() {
    let index = sample_index(false);
    let factory = Arc::new(ScorerFactory::cached());

    let a = VectorQuery::new(FIELD, vec![1.0, 0.0, 0.0, 0.0], Arc::clone(&factory)).unwrap();
    let b = VectorQuery::new(FIELD, vec![0.0, 1.0, 0.0, 0.0], Arc::clone(&factory)).unwrap();
    collect_scores(&a, &index);
    collect_scores(&b, &index);

    let cache = factory.cache().unwrap();
    assert_eq!(cache.misses(), sample_vectors().len() as u64);
    assert_eq!(cache.hits(), sample_vectors().len() as u64);
}

#[test]
fn test_cached_entry_checked_against_query_dimension() {
    let segment = raw_segment(codec::encode(&[1.0, 0.0], false));
    let factory = Arc::new(ScorerFactory::cached());

    let score_with = |query: &VectorQuery| {
        let context = query.new_execution_context().unwrap();
        let mut cursor = context.scoring_cursor_for(&segment).unwrap().unwrap();
        cursor.next_doc();
        cursor.score()
    };

    let narrow = VectorQuery::new(FIELD, vec![1.0, 0.0], Arc::clone(&factory)).unwrap();
    assert!((score_with(&narrow).unwrap() - 1.0).abs() < 1e-6);

    let wide = VectorQuery::new(FIELD, vec![1.0, 0.0, 0.0], Arc::clone(&factory)).unwrap();
    let err = score_with(&wide).unwrap_err();
    assert!(matches!(
        err,
        ScoringError::Format(CodecError::DimensionMismatch {
            expected: 3,
            actual: 2
        })
    ));
    assert_eq!(factory.cache().unwrap().hits(), 1);

    let default =
        VectorQuery::with_strategy(FIELD, vec![1.0, 0.0, 0.0], ScoringStrategy::Default).unwrap();
    assert!(matches!(score_with(&default), Err(ScoringError::Format(_))));
}

#[test]
fn test_bounded_cache_capacity() {
    let cache = VectorCache::with_capacity(16);
    assert_eq!(cache.capacity(), Some(16));
    assert_eq!(VectorCache::new().capacity(), None);

    let vector = cache
        .get_or_decode(GlobalDocId(4), || {
            codec::decode(&codec::encode(&[1.0, 2.0], true), 2)
        })
        .unwrap();
    assert_eq!(vector.values(), &[1.0f32, 2.0]);
    assert!(cache.contains(GlobalDocId(4)));
}

#[test]
fn test_cache_does_not_store_decode_failures() {
    let cache = VectorCache::new();
    let err = cache
        .get_or_decode(GlobalDocId(1), || codec::decode(&[0u8; 6], 1))
        .unwrap_err();

    assert_eq!(err, CodecError::NotFloatAligned { len: 6 });
    assert!(cache.is_empty());
    assert_eq!(cache.misses(), 1);
}

#[test]
fn test_malformed_bytes_are_format_errors() {
    let cases = [vec![0u8; 7], vec![0u8; 8], codec::encode(&[1.0; 6], false)];

    for bytes in cases {
        let segment = raw_segment(bytes);
        for strategy in ScoringStrategy::ALL {
            let query = VectorQuery::with_strategy(FIELD, vec![1.0; 4], strategy).unwrap();
            let context = query.new_execution_context().unwrap();
            let mut cursor = context.scoring_cursor_for(&segment).unwrap().unwrap();
            cursor.next_doc();

            let err = cursor.score().unwrap_err();
            assert!(matches!(err, ScoringError::Format(_)), "{strategy}: {err}");
        }
    }
}

#[test]
fn test_score_requires_position() {
    let index = sample_index(true);
    let query = VectorQuery::with_strategy(FIELD, vec![1.0; 4], ScoringStrategy::Default).unwrap();
    let context = query.new_execution_context().unwrap();
    let mut cursor = context
        .scoring_cursor_for(&index.segments()[0])
        .unwrap()
        .unwrap();

    assert!(matches!(
        cursor.score(),
        Err(ScoringError::Unpositioned { segment: 0 })
    ));

    while cursor.next_doc().is_some() {}
    assert!(matches!(
        cursor.score(),
        Err(ScoringError::Unpositioned { .. })
    ));
}

#[test]
fn test_score_after_close_is_lifecycle_error() {
    let index = sample_index(true);

    for strategy in ScoringStrategy::ALL {
        let query = VectorQuery::with_strategy(FIELD, vec![1.0; 4], strategy).unwrap();
        let context = query.new_execution_context().unwrap();
        let mut cursor = context
            .scoring_cursor_for(&index.segments()[0])
            .unwrap()
            .unwrap();
        cursor.next_doc();

        cursor.close().unwrap();
        assert_eq!(cursor.state(), CursorState::Closed);
        assert!(matches!(
            cursor.score(),
            Err(ScoringError::Lifecycle(LifecycleError::CursorClosed { segment: 0 }))
        ));
        assert!(!cursor.close().unwrap());
    }
}

#[test]
fn test_cursor_metadata() {
    let index = sample_index(true);
    let query = VectorQuery::with_strategy(FIELD, vec![1.0; 4], ScoringStrategy::Cached).unwrap();
    let context = query.new_execution_context().unwrap();
    let segment = &index.segments()[1];
    let mut cursor = context.scoring_cursor_for(segment).unwrap().unwrap();

    assert_eq!(cursor.segment_ord(), 1);
    assert_eq!(cursor.doc_base(), segment.doc_base());
    assert_eq!(cursor.cost(), 2);
    assert_eq!(cursor.max_score(), 1.0);
    assert_eq!(cursor.strategy(), ScoringStrategy::Cached);
    assert!(cursor.scorer_handle().is_none());

    assert_eq!(cursor.advance(1), Some(1));
    assert_eq!(cursor.global_doc_id(), Some(GlobalDocId(3)));
}

#[test]
fn test_external_factory_closes_once() {
    let engine = Arc::new(LocalEngine::new());
    let factory = ScorerFactory::external(engine.clone()).unwrap();
    assert_eq!(engine.live_factories(), 1);

    assert!(factory.close().unwrap());
    assert!(!factory.close().unwrap());
    drop(factory);

    assert_eq!(engine.stats().factories_created(), 1);
    assert_eq!(engine.stats().factories_destroyed(), 1);
}

#[test]
fn test_external_factory_destroyed_on_drop() {
    let engine = Arc::new(LocalEngine::new());
    {
        let _factory = ScorerFactory::external(engine.clone()).unwrap();
    }
    assert_eq!(engine.live_factories(), 0);
}

#[test]
fn test_closed_external_factory_rejects_new_scorers() {
    let index = sample_index(true);
    let engine = Arc::new(LocalEngine::new());
    let factory = Arc::new(ScorerFactory::external(engine.clone()).unwrap());
    factory.close().unwrap();

    let query = VectorQuery::new(FIELD, vec![1.0; 4], factory).unwrap();
    let context = query.new_execution_context().unwrap();
    let err = context.scoring_cursor_for(&index.segments()[0]).unwrap_err();

    assert!(matches!(
        err,
        ScoringError::Lifecycle(LifecycleError::FactoryClosed)
    ));
    assert_eq!(engine.stats().scorers_created(), 0);
}

#[test]
fn test_lease_releases_once() {
    let engine = Arc::new(LocalEngine::new());
    let factory = ScorerFactory::external(engine.clone()).unwrap();
    let lease = factory
        .external_factory()
        .unwrap()
        .create_scorer(&[3.0, 4.0], 5.0)
        .unwrap();
    assert_eq!(engine.live_scorers(), 1);

    assert!(lease.release().unwrap());
    assert!(!lease.release().unwrap());
    assert!(lease.is_released());
    assert_eq!(engine.stats().scorers_destroyed(), 1);
    assert_eq!(engine.live_scorers(), 0);
}

#[test]
fn test_released_lease_refuses_to_score() {
    let engine = Arc::new(LocalEngine::new());
    let factory = ScorerFactory::external(engine.clone()).unwrap();
    let lease = factory
        .external_factory()
        .unwrap()
        .create_scorer(&[1.0, 0.0], 1.0)
        .unwrap();
    lease.release().unwrap();

    let mut supplier = || codec::decode(&codec::encode(&[1.0, 0.0], true), 2);
    let err = lease
        .score(GlobalDocId(0), &mut supplier)
        .unwrap_err();
    assert!(matches!(
        err,
        ScoringError::Lifecycle(LifecycleError::HandleReleased { .. })
    ));
    assert_eq!(engine.stats().score_calls(), 0);
}

#[test]
fn test_engine_failure_surfaces_as_engine_error() {
    let index = sample_index(true);
    let engine = Arc::new(MockSimilarityEngine::new());
    let factory = Arc::new(ScorerFactory::external(engine.clone()).unwrap());
    let query = VectorQuery::new(FIELD, vec![1.0; 4], factory).unwrap();
    let context = query.new_execution_context().unwrap();
    let mut cursor = context
        .scoring_cursor_for(&index.segments()[0])
        .unwrap()
        .unwrap();
    cursor.next_doc();

    engine.set_fail_score(true);
    assert!(matches!(cursor.score(), Err(ScoringError::Engine(_))));

    engine.set_fail_score(false);
    assert!(cursor.score().is_ok());
}

//! Thread-safety of the pipeline and its shared state.
//!
//! A pipeline is built once and shared behind `Arc` across worker threads;
//! the gazetteer it owns is the only state written during extraction.

use reparto::annotation::MockAnnotator;
use reparto::{EntityLabel, FalsePositiveFilter, Gazetteer, Pipeline};
use std::sync::Arc;
use std::thread;

// =============================================================================
// Thread Safety Tests
// =============================================================================

#[test]
fn pipeline_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Pipeline>();
}

#[test]
fn shared_components_are_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Gazetteer>();
    assert_send_sync::<FalsePositiveFilter>();
}

// =============================================================================
// Concurrent Extraction Tests
// =============================================================================

#[test]
fn concurrent_extraction_matches_sequential() {
    let engine = MockAnnotator::new()
        .with_entity("Aldara", "PER")
        .with_entity("Vetusta", "LOC")
        .with_entity("Pedro y Carmen", "PER");
    let pipeline = Arc::new(Pipeline::new(engine));
    let texts = [
        "Ayer vino Aldara a casa. Luego vi que Aldara sonreía.",
        "Pedro y Carmen se miraron.",
        "El camino hacia Vetusta era largo. Llegamos a Vetusta de noche.",
        "El doctor Ramírez llegó temprano.",
    ];
    let expected: Vec<Vec<String>> = texts
        .iter()
        .map(|t| {
            pipeline
                .extract(t, None)
                .entities
                .iter()
                .map(|e| e.text().to_string())
                .collect()
        })
        .collect();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let pipeline = Arc::clone(&pipeline);
            let text = texts[i % texts.len()].to_string();
            thread::spawn(move || {
                let outcome = pipeline.extract(&text, None);
                let found: Vec<String> =
                    outcome.entities.iter().map(|e| e.text().to_string()).collect();
                (i % texts.len(), found)
            })
        })
        .collect();

    for handle in handles {
        let (idx, found) = handle.join().unwrap();
        assert_eq!(found, expected[idx], "text {idx} differs under concurrency");
    }
}

#[test]
fn concurrent_gazetteer_learning_respects_capacity() {
    let gazetteer = Arc::new(Gazetteer::with_capacity(50));
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let gazetteer = Arc::clone(&gazetteer);
            thread::spawn(move || {
                for i in 0..40 {
                    gazetteer.register(&format!("Nombre{t}x{i}"), EntityLabel::Per);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(gazetteer.len(), 50);
    assert!(gazetteer.is_full());
}

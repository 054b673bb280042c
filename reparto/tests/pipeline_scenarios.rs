//! End-to-end extraction scenarios.
//!
//! Every test drives the whole pipeline through the scripted annotation
//! engine, and the scripted semantic model where one is needed.

use reparto::annotation::{AnnotationEngine, MockAnnotator, PreAnnotated};
use reparto::config::{PipelineConfig, ValidatorConfig};
use reparto::feedback::{InMemoryFeedbackStore, OverrideAction};
use reparto::semantic::MockSemanticModel;
use reparto::{EntityLabel, ExtractionOutcome, Pipeline, Provenance};
use std::sync::Arc;

fn texts(outcome: &ExtractionOutcome) -> Vec<&str> {
    outcome.entities.iter().map(|e| e.text()).collect()
}

// =============================================================================
// Patterns
// =============================================================================

#[test]
fn title_extends_tagged_surname() {
    let pipeline = Pipeline::new(MockAnnotator::new().with_entity("Ramírez", "PER"));
    let outcome = pipeline.extract("El doctor Ramírez llegó temprano.", None);

    assert_eq!(texts(&outcome), ["doctor Ramírez"]);
    let doctor = &outcome.entities[0];
    assert_eq!(doctor.label(), EntityLabel::Per);
    assert_eq!(doctor.span(), (3, 17));
    assert!(doctor.confidence() >= 0.75);
    assert_eq!(doctor.primary_source(), Provenance::Tagger);
    assert!(doctor.provenance().contains(&Provenance::Title));
}

#[test]
fn title_creates_entity_when_nothing_was_tagged() {
    let pipeline = Pipeline::new(MockAnnotator::new());
    let outcome = pipeline.extract("El doctor Ramírez llegó temprano.", None);

    assert_eq!(texts(&outcome), ["doctor Ramírez"]);
    let doctor = &outcome.entities[0];
    assert_eq!(doctor.label(), EntityLabel::Per);
    assert!(doctor.confidence() >= 0.75);
    assert_eq!(doctor.primary_source(), Provenance::TitlePattern);
}

// =============================================================================
// Coordination
// =============================================================================

#[test]
fn coordinated_names_are_split() {
    let pipeline = Pipeline::new(MockAnnotator::new().with_entity("Pedro y Carmen", "PER"));
    let outcome = pipeline.extract("Pedro y Carmen se miraron.", None);

    assert_eq!(texts(&outcome), ["Pedro", "Carmen"]);
    for e in &outcome.entities {
        assert_eq!(e.label(), EntityLabel::Per);
        let factor = e.confidence() / 0.8;
        assert!(
            (0.85 - 1e-9..=0.9 + 1e-9).contains(&factor),
            "{e} has factor {factor}"
        );
    }
    assert!(!outcome.entities.iter().any(|e| e.text().contains(" y ")));
}

// =============================================================================
// Filtering
// =============================================================================

#[test]
fn greeting_is_rejected_with_a_reason() {
    let pipeline = Pipeline::new(MockAnnotator::new().with_entity("Hola", "MISC"));
    let outcome = pipeline.extract("Hola, dijo ella sin mirarlo.", None);

    assert!(outcome.entities.is_empty());
    let hola = outcome
        .rejected
        .iter()
        .find(|r| r.entity.text() == "Hola")
        .expect("Hola should be reported as rejected");
    assert!(!hola.reason.is_empty());
}

#[test]
fn repeated_name_is_kept_once() {
    let pipeline = Pipeline::new(MockAnnotator::new().with_entity("Marcos", "PER"));
    let outcome = pipeline.extract("Ayer vino Marcos a casa. Luego vi que Marcos sonreía.", None);

    assert_eq!(texts(&outcome), ["Marcos"]);
    assert!(outcome.rejected.iter().all(|r| r.entity.text() != "Marcos"));
}

#[test]
fn heading_mentions_do_not_survive() {
    let text = "CAPÍTULO PRIMERO\n\nAldara miró el río. Después Aldara se fue.";
    let engine = MockAnnotator::new()
        .with_entity("CAPÍTULO PRIMERO", "MISC")
        .with_entity("Aldara", "PER");
    let outcome = Pipeline::new(engine).extract(text, None);

    assert_eq!(texts(&outcome), ["Aldara"]);
    assert!(outcome
        .rejected
        .iter()
        .any(|r| r.entity.text() == "CAPÍTULO PRIMERO"));
}

// =============================================================================
// Feedback
// =============================================================================

const ALDARA_TEXT: &str = "Ayer vino Aldara a casa. Luego vi que Aldara sonreía.";

#[test]
fn project_force_reject_wins_over_a_strong_score() {
    let mut store = InMemoryFeedbackStore::new();
    store
        .add_project_override("saga", "Aldara", OverrideAction::Reject, None, None)
        .unwrap();
    let pipeline = Pipeline::builder(MockAnnotator::new().with_entity("Aldara", "PER"))
        .feedback(Arc::new(store))
        .build()
        .unwrap();

    let outcome = pipeline.extract(ALDARA_TEXT, Some("saga"));
    assert!(outcome.entities.is_empty());
    assert!(!outcome.rejected.is_empty());
    assert!(outcome.rejected.iter().all(|r| r.entity.text() == "Aldara"));

    // other projects are unaffected
    let outcome = pipeline.extract(ALDARA_TEXT, Some("otra"));
    assert_eq!(texts(&outcome), ["Aldara"]);
}

#[test]
fn project_force_include_wins_over_a_failing_score() {
    let strict = PipelineConfig {
        validator: ValidatorConfig {
            threshold: 0.99,
            ..ValidatorConfig::default()
        },
        ..PipelineConfig::default()
    };
    let mut store = InMemoryFeedbackStore::new();
    store
        .add_project_override(
            "saga",
            "Aldara",
            OverrideAction::ForceInclude,
            Some(EntityLabel::Per),
            None,
        )
        .unwrap();
    let pipeline = Pipeline::builder(MockAnnotator::new().with_entity("Aldara", "PER"))
        .config(strict)
        .feedback(Arc::new(store))
        .build()
        .unwrap();

    assert!(pipeline.extract(ALDARA_TEXT, None).entities.is_empty());
    let outcome = pipeline.extract(ALDARA_TEXT, Some("saga"));
    assert_eq!(texts(&outcome), ["Aldara"]);
    assert_eq!(outcome.validation_scores["Aldara"].total, 1.0);
}

// =============================================================================
// Semantic model
// =============================================================================

#[test]
fn semantic_preprocessing_finds_invented_places() {
    let model = MockSemanticModel::new().respond_to(
        "TEXTO",
        r#"Claro. ```json
{"entities": [{"text": "Aldara", "type": "PER"}, {"text": "Vetusta", "type": "LOC"}]}
```"#,
    );
    let pipeline = Pipeline::builder(MockAnnotator::new())
        .semantic(Arc::new(model))
        .build()
        .unwrap();
    let outcome = pipeline.extract("Aldara paseaba por Vetusta. Vetusta dormía.", None);

    let vetusta = outcome
        .entities
        .iter()
        .find(|e| e.text() == "Vetusta")
        .expect("Vetusta should be found");
    assert_eq!(vetusta.label(), EntityLabel::Loc);
    assert_eq!(vetusta.primary_source(), Provenance::Semantic);
    assert_eq!(pipeline.gazetteer().lookup("vetusta"), Some(EntityLabel::Loc));
}

#[test]
fn pipeline_works_without_semantic_model() {
    let engine = MockAnnotator::new().with_entity("Aldara", "PER");
    let outcome = Pipeline::new(engine).extract(ALDARA_TEXT, None);
    assert!(!outcome.is_partial());
    assert_eq!(texts(&outcome), ["Aldara"]);
}

// =============================================================================
// Produced interface
// =============================================================================

#[test]
fn pre_annotated_document_replays() {
    let text = "Pedro y Carmen se miraron.";
    let doc = MockAnnotator::new()
        .with_entity("Pedro y Carmen", "PERSON")
        .annotate(text)
        .unwrap();
    let json = serde_json::to_string(&doc).unwrap();
    let engine = PreAnnotated::from_json(&json).unwrap();
    let outcome = Pipeline::new(engine).extract(text, None);
    assert_eq!(texts(&outcome), ["Pedro", "Carmen"]);

    // a different text is an annotation failure, reported as partial
    let engine = PreAnnotated::from_json(&json).unwrap();
    let outcome = Pipeline::new(engine).extract("Otro texto.", None);
    assert!(outcome.is_partial());
}

#[test]
fn outcome_serializes_with_diagnostics() {
    let engine = MockAnnotator::new()
        .with_entity("Aldara", "PER")
        .with_entity("Hola", "MISC");
    let outcome = Pipeline::new(engine).extract("Hola. Ayer vino Aldara a casa.", None);
    let json = serde_json::to_value(&outcome).unwrap();

    assert_eq!(json["entities"][0]["text"], "Aldara");
    assert_eq!(json["entities"][0]["label"], "PER");
    assert_eq!(json["diagnostics"]["by_label"]["PER"], 1);
    assert_eq!(json["diagnostics"]["by_source"]["tagger"], 1);
    assert_eq!(json["validation_method"], "heuristic");
    assert!(json["rejected"].as_array().is_some_and(|r| !r.is_empty()));
    assert!(json.get("error").is_none());
}

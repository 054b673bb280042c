//! What an extraction hands to downstream consumers.
//!
//! [`ExtractionOutcome`] is the only contract location tracking, attribute
//! extraction and consistency checks read from: accepted entities, rejected
//! ones with their reasons, and per-source / per-label counts.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use crate::pipeline::ExtractionError;
use crate::validator::{RejectedEntity, ValidationMethod, ValidationScore};
use crate::{EntityLabel, ExtractedEntity};

/// Checkpoints reported through the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    SemanticPreprocessing,
    Annotation,
    Tagger,
    Gazetteer,
    Patterns,
    Splitting,
    Validation,
    Verification,
    Done,
}

impl Phase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SemanticPreprocessing => "semantic_preprocessing",
            Self::Annotation => "annotation",
            Self::Tagger => "tagger",
            Self::Gazetteer => "gazetteer",
            Self::Patterns => "patterns",
            Self::Splitting => "splitting",
            Self::Validation => "validation",
            Self::Verification => "verification",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entity counts of an outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// Keyed by [`ExtractedEntity::source_tag`].
    pub by_source: BTreeMap<String, usize>,
    pub by_label: BTreeMap<EntityLabel, usize>,
}

impl Diagnostics {
    /// Count `entities`.
    #[must_use]
    pub fn of(entities: &[ExtractedEntity]) -> Self {
        let mut out = Self::default();
        for e in entities {
            *out.by_source.entry(e.source_tag()).or_default() += 1;
            *out.by_label.entry(e.label()).or_default() += 1;
        }
        out
    }

    #[must_use]
    pub fn count(&self, label: EntityLabel) -> usize {
        self.by_label.get(&label).copied().unwrap_or(0)
    }
}

/// Result of one extraction.
///
/// A failed annotation still produces an outcome: `error` is set and
/// `entities` holds whatever was found before the failure.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionOutcome {
    /// Accepted entities in document order, pairwise non-overlapping.
    pub entities: Vec<ExtractedEntity>,
    pub rejected: Vec<RejectedEntity>,
    /// Best validation score per entity text.
    pub validation_scores: BTreeMap<String, ValidationScore>,
    pub validation_method: Option<ValidationMethod>,
    /// Capitalized words that look like unseen names. Reported only.
    pub gazetteer_candidates: BTreeSet<String>,
    /// Length of the input in chars.
    pub processed_chars: usize,
    pub diagnostics: Diagnostics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ExtractionError>,
}

impl ExtractionOutcome {
    /// Entities with `label`.
    pub fn by_label(&self, label: EntityLabel) -> impl Iterator<Item = &ExtractedEntity> + '_ {
        self.entities.iter().filter(move |e| e.label() == label)
    }

    #[must_use]
    pub fn persons(&self) -> Vec<&ExtractedEntity> {
        self.by_label(EntityLabel::Per).collect()
    }

    #[must_use]
    pub fn locations(&self) -> Vec<&ExtractedEntity> {
        self.by_label(EntityLabel::Loc).collect()
    }

    #[must_use]
    pub fn organizations(&self) -> Vec<&ExtractedEntity> {
        self.by_label(EntityLabel::Org).collect()
    }

    /// One entity per `(label, canonical form)`, the most confident mention
    /// winning (the earliest on ties), in document order.
    #[must_use]
    pub fn unique_entities(&self) -> Vec<&ExtractedEntity> {
        let mut best: HashMap<(EntityLabel, &str), &ExtractedEntity> = HashMap::new();
        for e in &self.entities {
            best.entry(e.identity_key())
                .and_modify(|kept| {
                    if e.confidence() > kept.confidence() {
                        *kept = e;
                    }
                })
                .or_insert(e);
        }
        let mut out: Vec<&ExtractedEntity> = best.into_values().collect();
        out.sort_by_key(|e| (e.start(), e.end()));
        out
    }

    /// True when a stage failed and the entities are incomplete.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.error.is_some()
    }

    /// Recompute [`diagnostics`](Self::diagnostics) from `entities`.
    pub fn refresh_diagnostics(&mut self) {
        self.diagnostics = Diagnostics::of(&self.entities);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Provenance;

    fn entity(text: &str, label: EntityLabel, start: usize, conf: f64) -> ExtractedEntity {
        let end = start + text.chars().count();
        ExtractedEntity::new(text, label, start, end, conf, Provenance::Tagger).unwrap()
    }

    fn outcome() -> ExtractionOutcome {
        let mut out = ExtractionOutcome {
            entities: vec![
                entity("Aldara", EntityLabel::Per, 0, 0.6),
                entity("Vetusta", EntityLabel::Loc, 10, 0.8),
                entity("ALDARA", EntityLabel::Per, 30, 0.9),
                entity("Cofradía", EntityLabel::Org, 50, 0.8),
                entity("Aldara", EntityLabel::Loc, 70, 0.7),
            ],
            processed_chars: 100,
            ..ExtractionOutcome::default()
        };
        out.refresh_diagnostics();
        out
    }

    #[test]
    fn test_label_views() {
        let out = outcome();
        assert_eq!(out.persons().len(), 2);
        assert_eq!(out.locations().len(), 2);
        assert_eq!(out.organizations().len(), 1);
        assert_eq!(out.by_label(EntityLabel::Misc).count(), 0);
    }

    #[test]
    fn test_unique_entities_keeps_most_confident() {
        let out = outcome();
        let unique = out.unique_entities();
        assert_eq!(unique.len(), 4);
        let aldara: Vec<_> = unique
            .iter()
            .filter(|e| e.label() == EntityLabel::Per)
            .collect();
        assert_eq!(aldara.len(), 1);
        assert_eq!(aldara[0].text(), "ALDARA");
        // a place with the same name is a different entity
        assert!(unique
            .iter()
            .any(|e| e.label() == EntityLabel::Loc && e.text() == "Aldara"));
        assert!(unique.windows(2).all(|w| w[0].start() <= w[1].start()));
    }

    #[test]
    fn test_diagnostics() {
        let out = outcome();
        assert_eq!(out.diagnostics.count(EntityLabel::Per), 2);
        assert_eq!(out.diagnostics.count(EntityLabel::Misc), 0);
        assert_eq!(out.diagnostics.by_source.get("tagger"), Some(&5));
    }

    #[test]
    fn test_serialization_omits_missing_error() {
        let out = outcome();
        assert!(!out.is_partial());
        let json = serde_json::to_value(&out).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["processed_chars"], 100);
        assert_eq!(json["diagnostics"]["by_label"]["PER"], 2);
        assert_eq!(json["entities"].as_array().map(Vec::len), Some(5));
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(Phase::SemanticPreprocessing.to_string(), "semantic_preprocessing");
        assert_eq!(
            serde_json::to_value(Phase::Done).unwrap(),
            serde_json::json!("done")
        );
    }
}

//! Coordinated-entity splitting.
//!
//! Taggers often return "Pedro y Carmen" as one PER span. This stage splits
//! it into its conjuncts:
//!
//! 1. Dependency path: the coordinating `y`/`e` must be attached as `cc`;
//!    the `conj` tokens and their heads inside the span are the conjuncts
//!    (proper nouns when no `conj` edge exists), each extended over the
//!    `flat`/`appos`/`compound` tokens that follow it. Confidence ×0.9.
//! 2. Regex fallback: `Name( Name)? y|e Name( Name)?`, both halves
//!    capitalized and accepted by the false-positive filter. Confidence ×0.85.
//!
//! An entity is only replaced when one of the two paths yields at least two
//! valid parts; otherwise it is returned unchanged.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::annotation::{AnnotatedDoc, Pos, Token};
use crate::filter::FalsePositiveFilter;
use crate::offset::{char_slice, SpanConverter};
use crate::spans::sort_by_position;
use crate::{ExtractedEntity, Provenance};

/// Confidence factor for conjuncts found through dependencies.
pub const DEPENDENCY_SPLIT_FACTOR: f64 = 0.9;

/// Confidence factor for conjuncts found by the regex fallback.
pub const REGEX_SPLIT_FACTOR: f64 = 0.85;

static SIMPLE_COORDINATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([A-ZÁÉÍÓÚÑ][a-záéíóúñ]+(?:\s+[A-ZÁÉÍÓÚÑ][a-záéíóúñ]+)?)\s+[ye]\s+([A-ZÁÉÍÓÚÑ][a-záéíóúñ]+(?:\s+[A-ZÁÉÍÓÚÑ][a-záéíóúñ]+)?)$",
    )
    .expect("SIMPLE_COORDINATION regex is invalid")
});

/// Counts from one [`CoordinationSplitter::split_all`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitReport {
    /// Entities replaced through the dependency path.
    pub dependency: usize,
    /// Entities replaced through the regex fallback.
    pub regex: usize,
    /// Coordinated entities left unchanged.
    pub kept: usize,
}

/// Splits "X y Y" entities into their conjuncts.
#[derive(Debug, Clone, Default)]
pub struct CoordinationSplitter {
    filter: FalsePositiveFilter,
}

impl CoordinationSplitter {
    #[must_use]
    pub fn new(filter: FalsePositiveFilter) -> Self {
        Self { filter }
    }

    /// True if `text` contains a coordinating " y " or " e ".
    #[must_use]
    pub fn is_coordinated(text: &str) -> bool {
        let lower = text.to_lowercase();
        lower.contains(" y ") || lower.contains(" e ")
    }

    /// Split one entity. Returns the parts, or the entity itself when it is
    /// not coordinated or cannot be split into two valid parts.
    #[must_use]
    pub fn split(
        &self,
        entity: &ExtractedEntity,
        doc: Option<&AnnotatedDoc>,
    ) -> Vec<ExtractedEntity> {
        self.split_with_path(entity, doc).0
    }

    fn split_with_path(
        &self,
        entity: &ExtractedEntity,
        doc: Option<&AnnotatedDoc>,
    ) -> (Vec<ExtractedEntity>, Option<Provenance>) {
        if !Self::is_coordinated(entity.text()) {
            return (vec![entity.clone()], None);
        }
        if let Some(doc) = doc {
            let parts = dependency_parts(entity, doc);
            if parts.len() >= 2 {
                return (parts, Some(Provenance::CoordSplit));
            }
        }
        let parts = self.regex_parts(entity);
        if parts.len() >= 2 {
            return (parts, Some(Provenance::SimpleCoordSplit));
        }
        log::debug!("could not split coordinated entity {entity}, keeping it");
        (vec![entity.clone()], None)
    }

    /// Split every coordinated entity; result is deduplicated by
    /// `(text, start, end)` and in document order.
    #[must_use]
    pub fn split_all(
        &self,
        entities: Vec<ExtractedEntity>,
        doc: Option<&AnnotatedDoc>,
    ) -> (Vec<ExtractedEntity>, SplitReport) {
        let mut report = SplitReport::default();
        let mut out = Vec::with_capacity(entities.len());
        for entity in &entities {
            let (parts, path) = self.split_with_path(entity, doc);
            match path {
                Some(Provenance::CoordSplit) => report.dependency += 1,
                Some(_) => report.regex += 1,
                None if Self::is_coordinated(entity.text()) => report.kept += 1,
                None => {}
            }
            out.extend(parts);
        }

        let mut seen = HashSet::new();
        out.retain(|e| seen.insert((e.text().to_string(), e.start(), e.end())));
        sort_by_position(&mut out);
        if report.dependency + report.regex > 0 {
            log::debug!(
                "coordination: {} -> {} entities ({report:?})",
                entities.len(),
                out.len()
            );
        }
        (out, report)
    }

    fn regex_parts(&self, entity: &ExtractedEntity) -> Vec<ExtractedEntity> {
        let text = entity.text();
        let Some(caps) = SIMPLE_COORDINATION.captures(text) else {
            return Vec::new();
        };
        let converter = SpanConverter::new(text);
        let confidence = entity.confidence() * REGEX_SPLIT_FACTOR;
        [caps.get(1), caps.get(2)]
            .into_iter()
            .flatten()
            .filter(|m| {
                let rejection = self.filter.tagged_rejection(m.as_str(), None);
                if let Some(reason) = &rejection {
                    log::debug!("coordination half '{}' rejected: {reason}", m.as_str());
                }
                rejection.is_none()
            })
            .filter_map(|m| {
                let (s, e) = converter.chars(m.start(), m.end());
                entity
                    .derive(
                        m.as_str(),
                        entity.start() + s,
                        entity.start() + e,
                        confidence,
                        Provenance::SimpleCoordSplit,
                    )
                    .ok()
            })
            .collect()
    }
}

/// Conjuncts of `entity` read from the dependency graph.
fn dependency_parts(entity: &ExtractedEntity, doc: &AnnotatedDoc) -> Vec<ExtractedEntity> {
    let lo = doc.tokens.partition_point(|t| t.idx < entity.start());
    let span = doc.tokens_in(entity.start(), entity.end());
    let hi = lo + span.len();
    let in_span = |i: usize| (lo..hi).contains(&i);

    let has_cc = span
        .iter()
        .any(|t| matches!(t.text.to_lowercase().as_str(), "y" | "e") && t.dep == "cc");
    if !has_cc {
        return Vec::new();
    }

    let mut heads: Vec<usize> = Vec::new();
    for (offset, token) in span.iter().enumerate() {
        if token.dep == "conj" {
            if in_span(token.head) {
                heads.push(token.head);
            }
            heads.push(lo + offset);
        }
    }
    if heads.len() < 2 {
        heads = span
            .iter()
            .enumerate()
            .filter(|(_, t)| t.pos == Pos::Propn && !is_name_continuation(t))
            .map(|(offset, _)| lo + offset)
            .collect();
    }
    heads.sort_unstable();
    heads.dedup();
    if heads.len() < 2 {
        return Vec::new();
    }

    let confidence = entity.confidence() * DEPENDENCY_SPLIT_FACTOR;
    let mut parts = Vec::new();
    for head in heads {
        let start = doc.tokens[head].idx;
        let mut end = doc.tokens[head].end();
        let mut next = head + 1;
        while next < doc.tokens.len() && in_span(next) {
            let t = &doc.tokens[next];
            let adjacent = t.idx == end + 1;
            if adjacent && matches!(t.pos, Pos::Propn | Pos::Noun) && is_name_continuation(t) {
                end = t.end();
                next += 1;
            } else {
                break;
            }
        }
        if start < entity.start() || end > entity.end() {
            continue;
        }
        let text = char_slice(&doc.text, start, end);
        let capitalized = text.chars().next().is_some_and(char::is_uppercase);
        if text.chars().count() < 2 || !capitalized {
            continue;
        }
        if let Ok(part) = entity.derive(text, start, end, confidence, Provenance::CoordSplit) {
            parts.push(part);
        }
    }
    parts
}

fn is_name_continuation(token: &Token) -> bool {
    matches!(token.dep.as_str(), "flat" | "appos" | "compound")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationEngine, MockAnnotator};
    use crate::EntityLabel;

    fn per(text: &str, start: usize) -> ExtractedEntity {
        let end = start + text.chars().count();
        ExtractedEntity::new(text, EntityLabel::Per, start, end, 0.8, Provenance::Tagger).unwrap()
    }

    fn texts(entities: &[ExtractedEntity]) -> Vec<&str> {
        entities.iter().map(ExtractedEntity::text).collect()
    }

    #[test]
    fn test_dependency_split() {
        let doc = MockAnnotator::new()
            .annotate("Pedro y Carmen se miraron.")
            .unwrap();
        let parts = CoordinationSplitter::default().split(&per("Pedro y Carmen", 0), Some(&doc));
        assert_eq!(texts(&parts), vec!["Pedro", "Carmen"]);
        assert_eq!(parts[1].span(), (8, 14));
        for p in &parts {
            assert_eq!(p.label(), EntityLabel::Per);
            assert!((p.confidence() - 0.72).abs() < 1e-9);
            assert_eq!(p.primary_source(), Provenance::CoordSplit);
        }
    }

    #[test]
    fn test_dependency_split_keeps_surnames() {
        let doc = MockAnnotator::new()
            .annotate("Vi a Juan Pérez y María López.")
            .unwrap();
        let entity = per("Juan Pérez y María López", 5);
        let parts = CoordinationSplitter::default().split(&entity, Some(&doc));
        assert_eq!(texts(&parts), vec!["Juan Pérez", "María López"]);
        assert_eq!(parts[1].span(), (18, 29));
    }

    #[test]
    fn test_regex_fallback_without_annotation() {
        let parts = CoordinationSplitter::default().split(&per("Pedro y Carmen", 0), None);
        assert_eq!(texts(&parts), vec!["Pedro", "Carmen"]);
        for p in &parts {
            assert!((p.confidence() - 0.68).abs() < 1e-9);
            assert_eq!(p.primary_source(), Provenance::SimpleCoordSplit);
        }
    }

    #[test]
    fn test_regex_fallback_with_e() {
        let parts = CoordinationSplitter::default().split(&per("Ana e Isabel", 3), None);
        assert_eq!(texts(&parts), vec!["Ana", "Isabel"]);
        assert_eq!(parts[1].span(), (9, 15));
    }

    #[test]
    fn test_unsplittable_entity_is_kept() {
        let original = per("Pedro y compañía", 0);
        let parts = CoordinationSplitter::default().split(&original, None);
        assert_eq!(parts, vec![original]);
    }

    #[test]
    fn test_invalid_half_keeps_original() {
        // "Hola" fails the filter, leaving a single valid half
        let original = per("Hola y Carmen", 0);
        let parts = CoordinationSplitter::default().split(&original, None);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].text(), "Hola y Carmen");
    }

    #[test]
    fn test_split_all_report_and_order() {
        let doc = MockAnnotator::new()
            .annotate("Pedro y Carmen vieron a Luis.")
            .unwrap();
        let (out, report) = CoordinationSplitter::default()
            .split_all(vec![per("Luis", 24), per("Pedro y Carmen", 0)], Some(&doc));
        assert_eq!(texts(&out), vec!["Pedro", "Carmen", "Luis"]);
        assert_eq!(report.dependency, 1);
        assert_eq!(report.regex, 0);
        assert_eq!(report.kept, 0);
    }

    #[test]
    fn test_uncoordinated_passthrough() {
        assert!(!CoordinationSplitter::is_coordinated("Yolanda"));
        assert!(CoordinationSplitter::is_coordinated("Pedro Y Carmen"));
        let e = per("Yolanda", 0);
        assert_eq!(CoordinationSplitter::default().split(&e, None), vec![e]);
    }
}

//! The extraction pipeline.
//!
//! # Stage order
//!
//! ```text
//! text
//!   │
//!   ├─ semantic preprocessing (optional) ── names from the model, top priority
//!   ├─ annotation ───────────────────────── tokens, POS, deps, tagged spans
//!   ├─ tagger pass ──────────────────────── filtered tagged spans
//!   ├─ gazetteer pass ───────────────────── re-find names learned so far
//!   ├─ patterns ─────────────────────────── "doctor Ramírez", "río Tajo"
//!   ├─ coordination split ───────────────── "Pedro y Carmen" -> 2 entities
//!   ├─ voting ───────────────────────────── boost names found by several methods
//!   ├─ validation ───────────────────────── accept / reject with reasons
//!   ├─ semantic verification (optional) ─── confirm low scorers
//!   ├─ MISC post-processing
//!   └─ sort + overlap removal
//! ```
//!
//! A range claimed by an entity can only be reused by extending that entity;
//! [`OccupiedRanges`] is the single record of what is claimed.
//!
//! Only an annotation failure surfaces in the outcome, as a recoverable
//! [`ExtractionError`] next to the entities found so far. Semantic failures
//! are logged and the pass is skipped.
//!
//! # Example
//!
//! ```rust
//! use reparto::annotation::MockAnnotator;
//! use reparto::pipeline::Pipeline;
//!
//! let pipeline = Pipeline::new(MockAnnotator::new().with_entity("Pedro y Carmen", "PER"));
//! let outcome = pipeline.extract("Pedro y Carmen se miraron.", None);
//! let names: Vec<&str> = outcome.entities.iter().map(|e| e.text()).collect();
//! assert_eq!(names, ["Pedro", "Carmen"]);
//! ```

use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::annotation::{is_person_context, AnnotatedDoc, AnnotationEngine, TaggedSpan};
use crate::config::PipelineConfig;
use crate::feedback::FeedbackStore;
use crate::filter::FalsePositiveFilter;
use crate::gazetteer::Gazetteer;
use crate::lexicon::{self, contains};
use crate::offset::char_slice;
use crate::outcome::{ExtractionOutcome, Phase};
use crate::patterns::PatternEngine;
use crate::semantic::{SemanticModel, SemanticPasses};
use crate::spans::{remove_overlaps, OccupiedRanges};
use crate::splitter::CoordinationSplitter;
use crate::validator::{EntityValidator, RejectedEntity, ValidationResult};
use crate::{EntityLabel, Error, ExtractedEntity, Provenance, Result};

/// Chars of input kept in an [`ExtractionError`].
const ERROR_SAMPLE_CHARS: usize = 100;

/// Message shown to users when an extraction is partial.
pub const PARTIAL_RESULTS_MESSAGE: &str =
    "Entity extraction failed on this text; partial results are returned.";

const VOTE_BOOST_STRONG: f64 = 0.15;
const VOTE_CAP_STRONG: f64 = 0.98;
const VOTE_BOOST: f64 = 0.08;
const VOTE_CAP: f64 = 0.95;

/// Article openings that make a short MISC span a common noun phrase.
const ARTICLE_OPENINGS: &[&str] = &["el ", "la ", "los ", "las ", "un ", "una "];

/// Longest MISC span kept, in words.
const MAX_MISC_WORDS: usize = 3;

// =============================================================================
// Errors
// =============================================================================

/// How bad an [`ExtractionError`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Severity {
    /// The outcome is usable but incomplete.
    Recoverable,
}

/// A stage failure attached to a partial outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{stage} failed: {message}")]
pub struct ExtractionError {
    pub stage: String,
    /// The first 100 chars of the input.
    pub sample: String,
    pub message: String,
    pub severity: Severity,
    pub user_message: String,
}

impl ExtractionError {
    #[must_use]
    pub fn new(stage: impl Into<String>, text: &str, cause: &Error) -> Self {
        Self {
            stage: stage.into(),
            sample: char_slice(text, 0, ERROR_SAMPLE_CHARS).to_string(),
            message: cause.to_string(),
            severity: Severity::Recoverable,
            user_message: PARTIAL_RESULTS_MESSAGE.to_string(),
        }
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`Pipeline`].
pub struct PipelineBuilder {
    engine: Arc<dyn AnnotationEngine>,
    config: PipelineConfig,
    gazetteer: Option<Arc<Gazetteer>>,
    semantic: Option<Arc<dyn SemanticModel>>,
    feedback: Option<Arc<dyn FeedbackStore>>,
    patterns: Option<PatternEngine>,
}

impl PipelineBuilder {
    #[must_use]
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Share a gazetteer with other pipelines. By default each pipeline
    /// gets its own, sized by the config.
    #[must_use]
    pub fn gazetteer(mut self, gazetteer: Arc<Gazetteer>) -> Self {
        self.gazetteer = Some(gazetteer);
        self
    }

    #[must_use]
    pub fn semantic(mut self, model: Arc<dyn SemanticModel>) -> Self {
        self.semantic = Some(model);
        self
    }

    #[must_use]
    pub fn feedback(mut self, store: Arc<dyn FeedbackStore>) -> Self {
        self.feedback = Some(store);
        self
    }

    /// Replace the built-in title and prefix vocabularies.
    #[must_use]
    pub fn patterns(mut self, patterns: PatternEngine) -> Self {
        self.patterns = Some(patterns);
        self
    }

    /// Build the pipeline.
    ///
    /// # Errors
    ///
    /// `Config` if the configuration is invalid.
    pub fn build(self) -> Result<Pipeline> {
        self.config.validate()?;
        Ok(self.assemble())
    }

    fn assemble(self) -> Pipeline {
        let filter = FalsePositiveFilter::from_config(&self.config);

        let mut validator = EntityValidator::new(self.config.validator.clone());
        if let Some(store) = &self.feedback {
            validator = validator.with_feedback(Arc::clone(store));
        }
        if let Some(model) = &self.semantic {
            validator = validator.with_semantic(Arc::clone(model));
        }
        let capacity = self.config.gazetteer_capacity;

        Pipeline {
            gazetteer: self
                .gazetteer
                .unwrap_or_else(|| Arc::new(Gazetteer::with_capacity(capacity))),
            passes: SemanticPasses::from_config(&self.config),
            splitter: CoordinationSplitter::new(filter.clone()),
            patterns: self.patterns.unwrap_or_default(),
            engine: self.engine,
            semantic: self.semantic,
            feedback: self.feedback,
            filter,
            validator,
            config: self.config,
        }
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Runs every stage over one document at a time.
///
/// A pipeline may be shared between threads; the gazetteer is the only state
/// carried from one extraction to the next.
pub struct Pipeline {
    config: PipelineConfig,
    engine: Arc<dyn AnnotationEngine>,
    gazetteer: Arc<Gazetteer>,
    semantic: Option<Arc<dyn SemanticModel>>,
    feedback: Option<Arc<dyn FeedbackStore>>,
    filter: FalsePositiveFilter,
    patterns: PatternEngine,
    splitter: CoordinationSplitter,
    validator: EntityValidator,
    passes: SemanticPasses,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("engine", &self.engine.name())
            .field("semantic", &self.semantic.as_ref().map(|m| m.name()))
            .field("gazetteer", &self.gazetteer.len())
            .field("validator", &self.validator)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Pipeline with the default configuration and no optional collaborators.
    #[must_use]
    pub fn new<E: AnnotationEngine + 'static>(engine: E) -> Self {
        Self::builder(engine).assemble()
    }

    #[must_use]
    pub fn builder<E: AnnotationEngine + 'static>(engine: E) -> PipelineBuilder {
        Self::builder_arc(Arc::new(engine))
    }

    /// Builder over an engine that is already shared.
    #[must_use]
    pub fn builder_arc(engine: Arc<dyn AnnotationEngine>) -> PipelineBuilder {
        PipelineBuilder {
            engine,
            config: PipelineConfig::default(),
            gazetteer: None,
            semantic: None,
            feedback: None,
            patterns: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The gazetteer this pipeline learns into.
    #[must_use]
    pub fn gazetteer(&self) -> &Arc<Gazetteer> {
        &self.gazetteer
    }

    /// Extract entities from `text`.
    ///
    /// `project` selects project-scoped overrides in the feedback store.
    #[must_use]
    pub fn extract(&self, text: &str, project: Option<&str>) -> ExtractionOutcome {
        self.extract_with_progress(text, project, &mut |_, _, _| {})
    }

    /// [`extract`](Self::extract), reporting progress at fixed checkpoints.
    ///
    /// The callback gets the phase, the overall fraction done in `[0, 1]`
    /// and a short message. It is never called from inside a stage.
    pub fn extract_with_progress(
        &self,
        text: &str,
        project: Option<&str>,
        progress: &mut dyn FnMut(Phase, f64, &str),
    ) -> ExtractionOutcome {
        let mut outcome = ExtractionOutcome {
            processed_chars: text.chars().count(),
            ..ExtractionOutcome::default()
        };
        if text.trim().is_empty() {
            progress(Phase::Done, 1.0, "nothing to extract");
            return outcome;
        }

        progress(Phase::SemanticPreprocessing, 0.0, "reading the opening");
        let semantic_entities = self.semantic_preprocess(text);
        progress(Phase::SemanticPreprocessing, 0.3, "opening read");

        let mut entities = semantic_entities.clone();
        let mut occupied = OccupiedRanges::from_entities(&entities);

        progress(Phase::Annotation, 0.4, "annotating text");
        let doc = match self.annotate(text) {
            Ok(doc) => doc,
            Err(e) => {
                log::error!("annotation with {} failed: {e}", self.engine.name());
                let (kept, overlapping) = remove_overlaps(entities);
                outcome.entities = kept;
                outcome.rejected.extend(overlapping);
                outcome.error = Some(ExtractionError::new("annotation", text, &e));
                outcome.refresh_diagnostics();
                return outcome;
            }
        };

        progress(Phase::Tagger, 0.7, "filtering tagged mentions");
        self.tagger_pass(&doc, project, &mut entities, &mut occupied, &mut outcome.rejected);

        if self.config.enable_gazetteer {
            progress(Phase::Gazetteer, 0.8, "looking for known names");
            let found = self.gazetteer_pass(&doc, &mut occupied);
            entities.extend(found);
            outcome.gazetteer_candidates = self.gazetteer_candidates(&doc, &occupied);
        }

        if self.config.enable_patterns {
            progress(Phase::Patterns, 0.82, "matching titles");
            let report = self.patterns.apply(&doc, &mut entities, &mut occupied);
            progress(Phase::Patterns, 0.83, "matching place names");
            progress(Phase::Patterns, 0.84, "matching particle surnames");
            log::debug!("patterns: {report:?}");
        }

        if self.config.enable_splitting {
            progress(Phase::Splitting, 0.85, "splitting coordinated names");
            entities = self.splitter.split_all(entities, Some(&doc)).0;
        }

        if self.config.enable_voting && !semantic_entities.is_empty() {
            apply_voting(&mut entities, &semantic_entities);
        }

        let mut validation: Option<ValidationResult> = None;
        if self.config.enable_validation && !entities.is_empty() {
            progress(Phase::Validation, 0.9, "validating mentions");
            let result = self.validator.validate(&entities, text, Some(&doc), project);
            entities = result.valid.clone();
            outcome.rejected.extend(result.rejected.iter().cloned());
            outcome.validation_scores = result
                .scores
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            outcome.validation_method = Some(result.method());
            validation = Some(result);
        }

        if self.config.enable_semantic_verification && !entities.is_empty() {
            if let Some(model) = self.available_model() {
                progress(Phase::Verification, 0.93, "confirming results");
                let score_of = |e: &ExtractedEntity| {
                    validation
                        .as_ref()
                        .and_then(|v| v.score_of(e))
                        .map_or(e.confidence(), |s| s.total)
                };
                match self.passes.verify(model, text, &entities, score_of) {
                    Ok(report) => {
                        let mut forced = Vec::new();
                        for e in &entities {
                            if report.entities.contains(e) {
                                continue;
                            }
                            if self.force_included(e, project) {
                                forced.push(e.clone());
                            } else {
                                outcome.rejected.push(RejectedEntity {
                                    entity: e.clone(),
                                    reason: "not confirmed by semantic verification".into(),
                                });
                            }
                        }
                        entities = report.entities;
                        entities.extend(forced);
                    }
                    Err(e) => log::warn!("semantic verification skipped: {e}"),
                }
            }
        }

        let (kept, dropped) =
            postprocess_misc(entities, &doc, &|e| self.force_included(e, project));
        outcome.rejected.extend(dropped);

        let (kept, overlapping) = remove_overlaps(kept);
        outcome.entities = kept;
        outcome.rejected.extend(overlapping);
        outcome.refresh_diagnostics();
        progress(
            Phase::Done,
            1.0,
            &format!("{} mentions found", outcome.entities.len()),
        );
        log::info!(
            "extracted {} entities ({} PER, {} LOC, {} ORG), {} rejected, sources {:?}",
            outcome.entities.len(),
            outcome.diagnostics.count(EntityLabel::Per),
            outcome.diagnostics.count(EntityLabel::Loc),
            outcome.diagnostics.count(EntityLabel::Org),
            outcome.rejected.len(),
            outcome.diagnostics.by_source
        );
        outcome
    }

    /// True if `project` has a force-include override for this entity.
    fn force_included(&self, entity: &ExtractedEntity, project: Option<&str>) -> bool {
        self.is_forced(entity.text(), entity.label(), project)
    }

    fn is_forced(&self, name: &str, label: EntityLabel, project: Option<&str>) -> bool {
        match (&self.feedback, project) {
            (Some(store), Some(_)) => store.decide(name, Some(label), project).is_forced_include(),
            _ => false,
        }
    }

    fn available_model(&self) -> Option<&dyn SemanticModel> {
        self.semantic
            .as_deref()
            .filter(|m| m.is_available())
    }

    fn semantic_preprocess(&self, text: &str) -> Vec<ExtractedEntity> {
        if !self.config.enable_semantic_preprocessing {
            return Vec::new();
        }
        let Some(model) = self.available_model() else {
            return Vec::new();
        };
        match self.passes.preprocess(model, text, &self.gazetteer) {
            Ok(found) => {
                log::info!("semantic preprocessing: {} entities", found.len());
                found
            }
            Err(e) => {
                log::warn!("semantic preprocessing skipped: {e}");
                Vec::new()
            }
        }
    }

    fn annotate(&self, text: &str) -> Result<AnnotatedDoc> {
        let doc = self.engine.annotate(text)?;
        doc.validate()?;
        if doc.text != text {
            return Err(Error::annotation("annotated text differs from the input"));
        }
        Ok(doc)
    }

    /// Turn tagged spans into candidates.
    ///
    /// Spans overlapping an earlier entity are skipped. High-quality
    /// survivors are taught to the gazetteer. Names the project forces in
    /// skip the false-positive filter.
    fn tagger_pass(
        &self,
        doc: &AnnotatedDoc,
        project: Option<&str>,
        entities: &mut Vec<ExtractedEntity>,
        occupied: &mut OccupiedRanges,
        rejected: &mut Vec<RejectedEntity>,
    ) {
        let before = entities.len();
        for span in &doc.entities {
            let Some(label) = span.label() else {
                continue;
            };
            let forced = self.is_forced(&span.text, label, project);
            let tokens = doc.tokens_in(span.start, span.end);
            let rejection = if forced {
                None
            } else {
                self.filter.tagged_rejection(&span.text, Some(tokens))
            };
            if let Some(reason) = rejection {
                let recovered = if span.text.contains('\n') {
                    self.recover_fragments(span, label, entities, occupied)
                } else {
                    0
                };
                if recovered == 0 {
                    record_rejection(rejected, span, label, reason);
                }
                continue;
            }
            if occupied.overlaps(span.start, span.end) {
                log::debug!("tagged span '{}' overlaps an earlier entity", span.text);
                continue;
            }
            let rejection = if forced {
                None
            } else {
                self.filter
                    .morphology_rejection(doc, &span.text, label, span.start, span.end)
            };
            if let Some(reason) = rejection {
                record_rejection(rejected, span, label, reason);
                continue;
            }

            let entity = match ExtractedEntity::new(
                span.text.clone(),
                label,
                span.start,
                span.end,
                self.config.tagger_confidence,
                Provenance::Tagger,
            ) {
                Ok(entity) => entity,
                Err(e) => {
                    log::debug!("tagged span '{}' dropped: {e}", span.text);
                    continue;
                }
            };
            occupied.insert(entity.start(), entity.end());
            if self.filter.is_high_quality(entity.text()) {
                self.gazetteer.register(entity.text(), label);
            }
            entities.push(entity);
        }
        log::debug!("tagger pass: {} entities", entities.len() - before);
    }

    /// Salvage the names of a span merged across line breaks.
    fn recover_fragments(
        &self,
        span: &TaggedSpan,
        label: EntityLabel,
        entities: &mut Vec<ExtractedEntity>,
        occupied: &mut OccupiedRanges,
    ) -> usize {
        let mut recovered = 0;
        for (fragment, start) in self.filter.recover_fragments(&span.text, span.start) {
            let end = start + fragment.chars().count();
            if occupied.overlaps(start, end) {
                continue;
            }
            match ExtractedEntity::new(
                fragment,
                label,
                start,
                end,
                self.config.malformed_split_confidence,
                Provenance::TaggerSplit,
            ) {
                Ok(entity) => {
                    occupied.insert(entity.start(), entity.end());
                    entities.push(entity);
                    recovered += 1;
                }
                Err(e) => log::debug!("fragment dropped: {e}"),
            }
        }
        recovered
    }

    /// Tokens that look like proper nouns and are already in the gazetteer.
    fn gazetteer_pass(
        &self,
        doc: &AnnotatedDoc,
        occupied: &mut OccupiedRanges,
    ) -> Vec<ExtractedEntity> {
        let mut out = Vec::new();
        for token in &doc.tokens {
            if token.text.chars().count() < self.config.min_entity_length
                || !token.is_capitalized()
                || token.is_sent_start
            {
                continue;
            }
            let Some(label) = self.gazetteer.lookup(&token.text) else {
                continue;
            };
            let (start, end) = (token.idx, token.end());
            if occupied.overlaps(start, end)
                || self.filter.tagged_rejection(&token.text, None).is_some()
            {
                continue;
            }
            if label == EntityLabel::Per && !is_person_context(doc, start, end) {
                log::debug!("'{}' is known as a person but reads as a place here", token.text);
                continue;
            }
            match ExtractedEntity::new(
                token.text.clone(),
                label,
                start,
                end,
                self.config.gazetteer_confidence,
                Provenance::Gazetteer,
            ) {
                Ok(entity) => {
                    occupied.insert(entity.start(), entity.end());
                    out.push(entity);
                }
                Err(e) => log::debug!("gazetteer hit '{}' dropped: {e}", token.text),
            }
        }
        if !out.is_empty() {
            log::debug!("gazetteer pass: {} entities", out.len());
        }
        out
    }

    /// Capitalized words nobody claimed that could be names.
    fn gazetteer_candidates(
        &self,
        doc: &AnnotatedDoc,
        occupied: &OccupiedRanges,
    ) -> BTreeSet<String> {
        doc.tokens
            .iter()
            .filter(|t| {
                t.text.chars().count() >= 3
                    && t.is_capitalized()
                    && !t.is_sent_start
                    && !(t.like_num || t.like_email || t.like_url)
                    && !occupied.overlaps(t.idx, t.end())
                    && self.filter.is_heuristic_candidate(&t.text)
            })
            .map(|t| t.text.clone())
            .collect()
    }
}

fn record_rejection(
    rejected: &mut Vec<RejectedEntity>,
    span: &TaggedSpan,
    label: EntityLabel,
    reason: String,
) {
    log::debug!("tagged span '{}' rejected: {reason}", span.text);
    // spans that cannot form an entity at all (empty after trimming) are not reported
    if let Ok(entity) = ExtractedEntity::new(
        span.text.clone(),
        label,
        span.start,
        span.end,
        0.0,
        Provenance::Tagger,
    ) {
        rejected.push(RejectedEntity { entity, reason });
    }
}

/// Boost names found independently by several detection methods.
fn apply_voting(entities: &mut [ExtractedEntity], semantic: &[ExtractedEntity]) {
    let mut methods: HashMap<(EntityLabel, String), HashSet<Provenance>> = HashMap::new();
    let key = |e: &ExtractedEntity| (e.label(), e.canonical().to_string());
    for e in semantic {
        methods.entry(key(e)).or_default().insert(Provenance::Semantic);
    }
    for e in entities.iter() {
        let source = e.primary_source();
        if matches!(source, Provenance::Tagger | Provenance::Gazetteer) {
            methods.entry(key(e)).or_default().insert(source);
        }
    }

    let mut boosted = 0;
    for e in entities.iter_mut() {
        let votes = methods.get(&key(e)).map_or(0, HashSet::len);
        let (boost, cap) = match votes {
            0 | 1 => continue,
            2 => (VOTE_BOOST, VOTE_CAP),
            _ => (VOTE_BOOST_STRONG, VOTE_CAP_STRONG),
        };
        let raised = (e.confidence() + boost).min(cap).max(e.confidence());
        e.set_confidence(raised);
        boosted += 1;
    }
    if boosted > 0 {
        log::debug!("voting boosted {boosted} entities");
    }
}

/// Clean up MISC entities: drop phrase-like ones, relabel known people and
/// places. Entities `forced` returns true for are never dropped.
fn postprocess_misc(
    entities: Vec<ExtractedEntity>,
    doc: &AnnotatedDoc,
    forced: &dyn Fn(&ExtractedEntity) -> bool,
) -> (Vec<ExtractedEntity>, Vec<RejectedEntity>) {
    let mut kept = Vec::with_capacity(entities.len());
    let mut dropped = Vec::new();
    let mut relabelled = 0;

    for mut entity in entities {
        if entity.label() != EntityLabel::Misc {
            kept.push(entity);
            continue;
        }
        let lower = entity.text().trim().to_lowercase();
        let words: Vec<String> = entity.text().split_whitespace().map(str::to_string).collect();
        let starts_lower = entity.text().chars().next().is_some_and(char::is_lowercase);

        let drop_reason = if forced(&entity) {
            None
        } else if words.len() > MAX_MISC_WORDS {
            Some("MISC phrase too long")
        } else if starts_lower {
            Some("MISC starting in lower case")
        } else if entity.text().contains('_') {
            Some("MISC with underscore")
        } else if contains(lexicon::MISC_ERRORS, &lower) {
            Some("known MISC error")
        } else if ARTICLE_OPENINGS.iter().any(|a| lower.starts_with(a))
            && !contains(lexicon::LITERARY_PSEUDONYMS, &lower)
        {
            Some("MISC article phrase")
        } else {
            None
        };
        if let Some(reason) = drop_reason {
            log::debug!("dropping {entity}: {reason}");
            dropped.push(RejectedEntity {
                entity,
                reason: reason.to_string(),
            });
            continue;
        }

        if contains(lexicon::COMMON_SURNAMES_AS_PER, &lower) {
            if is_person_context(doc, entity.start(), entity.end()) {
                entity.relabel(EntityLabel::Per, Provenance::Reclassified);
                relabelled += 1;
            }
            kept.push(entity);
            continue;
        }

        let full_name = (2..=MAX_MISC_WORDS).contains(&words.len())
            && words
                .iter()
                .all(|w| w.chars().next().is_some_and(char::is_uppercase))
            && words
                .iter()
                .any(|w| contains(lexicon::COMMON_SURNAMES_AS_PER, &w.to_lowercase()));
        if full_name {
            entity.relabel(EntityLabel::Per, Provenance::ReclassifiedFullName);
            relabelled += 1;
        } else if contains(lexicon::LITERARY_PSEUDONYMS, &lower) {
            entity.relabel(EntityLabel::Per, Provenance::Reclassified);
            relabelled += 1;
        } else if contains(lexicon::FICTIONAL_PLACES, &lower) {
            entity.relabel(EntityLabel::Loc, Provenance::Reclassified);
            relabelled += 1;
        }
        kept.push(entity);
    }

    if !dropped.is_empty() || relabelled > 0 {
        log::info!(
            "MISC post-processing: {} dropped, {relabelled} relabelled",
            dropped.len()
        );
    }
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{MockAnnotator, Pos};
    use crate::feedback::{InMemoryFeedbackStore, OverrideAction};
    use crate::semantic::MockSemanticModel;

    fn texts(outcome: &ExtractionOutcome) -> Vec<&str> {
        outcome.entities.iter().map(|e| e.text()).collect()
    }

    fn misc(text: &str, start: usize) -> ExtractedEntity {
        let end = start + text.chars().count();
        ExtractedEntity::new(text, EntityLabel::Misc, start, end, 0.8, Provenance::Tagger).unwrap()
    }

    fn without_validation() -> PipelineConfig {
        PipelineConfig {
            enable_validation: false,
            ..PipelineConfig::default()
        }
    }

    // ===== Orchestration =====

    #[test]
    fn test_empty_text_is_an_empty_success() {
        let pipeline = Pipeline::new(MockAnnotator::new().failing("never called"));
        for text in ["", "   \n\t"] {
            let outcome = pipeline.extract(text, None);
            assert!(outcome.entities.is_empty());
            assert!(!outcome.is_partial());
        }
    }

    #[test]
    fn test_annotation_failure_is_partial() {
        let model = MockSemanticModel::new().respond_to(
            "TEXTO",
            r#"{"entities": [{"text": "Aldara", "type": "PER"}]}"#,
        );
        let pipeline = Pipeline::builder(MockAnnotator::new().failing("model crashed"))
            .semantic(Arc::new(model))
            .build()
            .unwrap();
        let text = "Aldara cruzó el puente de Vetusta.";
        let outcome = pipeline.extract(text, None);

        assert!(outcome.is_partial());
        let error = outcome.error.as_ref().unwrap();
        assert_eq!(error.stage, "annotation");
        assert_eq!(error.severity, Severity::Recoverable);
        assert_eq!(error.sample, text);
        assert!(error.message.contains("model crashed"));
        assert_eq!(error.user_message, PARTIAL_RESULTS_MESSAGE);
        // what the semantic pass found survives
        assert_eq!(texts(&outcome), ["Aldara"]);
    }

    #[test]
    fn test_error_sample_is_truncated() {
        let text = "a".repeat(300);
        let error = ExtractionError::new("annotation", &text, &Error::annotation("x"));
        assert_eq!(error.sample.chars().count(), ERROR_SAMPLE_CHARS);
        assert_eq!(error.to_string(), format!("annotation failed: {}", Error::annotation("x")));
    }

    #[test]
    fn test_progress_checkpoints() {
        let pipeline = Pipeline::new(MockAnnotator::new().with_entity("Aldara", "PER"));
        let mut seen = Vec::new();
        pipeline.extract_with_progress("Ayer vino Aldara a casa.", None, &mut |phase, p, _| {
            seen.push((phase, p));
        });
        let fractions: Vec<f64> = seen.iter().map(|(_, p)| *p).collect();
        assert_eq!(
            fractions,
            [0.0, 0.3, 0.4, 0.7, 0.8, 0.82, 0.83, 0.84, 0.85, 0.9, 1.0]
        );
        assert_eq!(seen.last().map(|(phase, _)| *phase), Some(Phase::Done));
    }

    #[test]
    fn test_invalid_config_is_refused() {
        let config = PipelineConfig {
            gazetteer_capacity: 0,
            ..PipelineConfig::default()
        };
        let built = Pipeline::builder(MockAnnotator::new()).config(config).build();
        assert!(matches!(built, Err(Error::Config(_))));
    }

    // ===== Tagger and gazetteer =====

    #[test]
    fn test_rejected_tagged_span_is_reported() {
        let pipeline = Pipeline::builder(MockAnnotator::new().with_entity("Hola", "MISC"))
            .config(without_validation())
            .build()
            .unwrap();
        let outcome = pipeline.extract("Hola, dijo ella.", None);
        assert!(outcome.entities.is_empty());
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].entity.text(), "Hola");
        assert_eq!(outcome.rejected[0].reason, "common phrase");
    }

    #[test]
    fn test_merged_span_is_recovered() {
        let text = "María\n\nMaría Sánchez abrió la puerta.";
        let engine = MockAnnotator::new().with_entity("María\n\nMaría Sánchez", "PER");
        let pipeline = Pipeline::builder(engine)
            .config(without_validation())
            .build()
            .unwrap();
        let outcome = pipeline.extract(text, None);
        assert_eq!(texts(&outcome), ["María", "María Sánchez"]);
        assert!(outcome
            .entities
            .iter()
            .all(|e| e.primary_source() == Provenance::TaggerSplit && e.confidence() == 0.7));
        assert_eq!(outcome.entities[1].span(), (7, 20));
    }

    #[test]
    fn test_gazetteer_refinds_learned_names() {
        let text = "Ayer Aldara Vence llegó. Luego vimos que Vence dormía.";
        let pipeline = Pipeline::builder(MockAnnotator::new().with_entity("Aldara Vence", "PER"))
            .config(without_validation())
            .build()
            .unwrap();
        pipeline.gazetteer().register("Vence", EntityLabel::Per);
        let outcome = pipeline.extract(text, None);

        assert_eq!(texts(&outcome), ["Aldara Vence", "Vence"]);
        assert_eq!(outcome.entities[1].primary_source(), Provenance::Gazetteer);
        assert_eq!(outcome.entities[1].confidence(), 0.6);
        assert_eq!(pipeline.gazetteer().lookup("aldara vence"), Some(EntityLabel::Per));
    }

    #[test]
    fn test_gazetteer_skips_place_context_for_people() {
        let text = "Ayer Fernández llegó. Vivía en la calle Fernández.";
        let pipeline = Pipeline::builder(MockAnnotator::new())
            .config(PipelineConfig {
                enable_patterns: false,
                ..without_validation()
            })
            .build()
            .unwrap();
        pipeline.gazetteer().register("Fernández", EntityLabel::Per);
        let outcome = pipeline.extract(text, None);
        assert_eq!(texts(&outcome), ["Fernández"]);
        assert_eq!(outcome.entities[0].start(), 5);
    }

    #[test]
    fn test_gazetteer_candidates_are_reported_not_learned() {
        let pipeline = Pipeline::builder(MockAnnotator::new())
            .config(without_validation())
            .build()
            .unwrap();
        let outcome = pipeline.extract("Cuando llegó Ximena todos callaron.", None);
        assert!(outcome.gazetteer_candidates.contains("Ximena"));
        // sentence-initial words are not candidates
        assert!(!outcome.gazetteer_candidates.contains("Cuando"));
        assert!(pipeline.gazetteer().lookup("Ximena").is_none());
    }

    // ===== Semantic passes =====

    #[test]
    fn test_semantic_spans_take_priority() {
        let model = MockSemanticModel::new().respond_to(
            "TEXTO",
            r#"{"entities": [{"text": "Aldara Vence", "type": "PER"}]}"#,
        );
        let pipeline = Pipeline::builder(MockAnnotator::new().with_entity("Vence", "LOC"))
            .config(PipelineConfig {
                enable_semantic_verification: false,
                ..without_validation()
            })
            .semantic(Arc::new(model))
            .build()
            .unwrap();
        let outcome = pipeline.extract("Ayer Aldara Vence llegó.", None);
        assert_eq!(texts(&outcome), ["Aldara Vence"]);
        assert_eq!(outcome.entities[0].label(), EntityLabel::Per);
        assert_eq!(outcome.entities[0].primary_source(), Provenance::Semantic);
    }

    #[test]
    fn test_semantic_failure_is_not_fatal() {
        let pipeline = Pipeline::builder(MockAnnotator::new().with_entity("Aldara", "PER"))
            .semantic(Arc::new(MockSemanticModel::new().failing("timeout")))
            .build()
            .unwrap();
        let outcome = pipeline.extract("Ayer vino Aldara a casa. Aldara sonrió.", None);
        assert!(!outcome.is_partial());
        assert!(texts(&outcome).contains(&"Aldara"));
    }

    #[test]
    fn test_unavailable_model_is_never_called() {
        let model = Arc::new(MockSemanticModel::new().unavailable());
        let pipeline = Pipeline::builder(MockAnnotator::new().with_entity("Aldara", "PER"))
            .semantic(Arc::clone(&model) as Arc<dyn SemanticModel>)
            .build()
            .unwrap();
        let _ = pipeline.extract("Ayer vino Aldara a casa.", None);
        assert!(model.prompts().is_empty());
    }

    // ===== Voting =====

    #[test]
    fn test_voting_boosts_agreeing_methods() {
        let semantic = vec![ExtractedEntity::new(
            "Aldara",
            EntityLabel::Per,
            0,
            6,
            0.85,
            Provenance::Semantic,
        )
        .unwrap()];
        let mut entities = vec![
            ExtractedEntity::new("Aldara", EntityLabel::Per, 30, 36, 0.8, Provenance::Tagger)
                .unwrap(),
            ExtractedEntity::new("Aldara", EntityLabel::Per, 50, 56, 0.6, Provenance::Gazetteer)
                .unwrap(),
            ExtractedEntity::new("Brais", EntityLabel::Per, 70, 75, 0.8, Provenance::Tagger)
                .unwrap(),
        ];
        apply_voting(&mut entities, &semantic);
        assert!((entities[0].confidence() - 0.95).abs() < 1e-9);
        assert!((entities[1].confidence() - 0.75).abs() < 1e-9);
        assert!((entities[2].confidence() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_voting_never_lowers_confidence() {
        let semantic = vec![ExtractedEntity::new(
            "Aldara",
            EntityLabel::Per,
            0,
            6,
            0.99,
            Provenance::Semantic,
        )
        .unwrap()];
        let mut entities = vec![
            semantic[0].clone(),
            ExtractedEntity::new("Aldara", EntityLabel::Per, 30, 36, 0.8, Provenance::Tagger)
                .unwrap(),
        ];
        apply_voting(&mut entities, &semantic);
        assert!((entities[0].confidence() - 0.99).abs() < 1e-9);
        assert!((entities[1].confidence() - 0.88).abs() < 1e-9);
    }

    // ===== MISC post-processing =====

    #[test]
    fn test_misc_drops_phrases() {
        let doc = MockAnnotator::new().annotate("x").unwrap();
        let (kept, dropped) = postprocess_misc(
            vec![
                misc("Una Noche De Verano Larga", 0),
                misc("el Sur", 30),
                misc("Dios", 40),
                misc("Los Caballeros", 50),
                misc("META_TAG", 70),
                misc("Semana Santa", 80),
            ],
            &doc,
            &|_| false,
        );
        assert_eq!(dropped.len(), 5);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].text(), "Semana Santa");
        assert_eq!(kept[0].label(), EntityLabel::Misc);
    }

    #[test]
    fn test_misc_relabels_known_names() {
        let text = "Ayer García y Ana Pérez leyeron a Clarín en Vetusta. La Regenta calló.";
        let doc = MockAnnotator::new().annotate(text).unwrap();
        let (kept, dropped) = postprocess_misc(
            vec![
                misc("García", 5),
                misc("Ana Pérez", 14),
                misc("Clarín", 34),
                misc("Vetusta", 44),
                misc("La Regenta", 53),
            ],
            &doc,
            &|_| false,
        );
        assert!(dropped.is_empty());
        let labels: Vec<EntityLabel> = kept.iter().map(ExtractedEntity::label).collect();
        assert_eq!(
            labels,
            [
                EntityLabel::Per,
                EntityLabel::Per,
                EntityLabel::Per,
                EntityLabel::Loc,
                EntityLabel::Per
            ]
        );
        assert_eq!(kept[1].provenance().last(), Some(&Provenance::ReclassifiedFullName));
        assert_eq!(kept[0].provenance().last(), Some(&Provenance::Reclassified));
    }

    #[test]
    fn test_misc_surname_in_place_context_stays_misc() {
        let text = "Vivía en la calle García desde niña.";
        let doc = MockAnnotator::new().annotate(text).unwrap();
        let (kept, _) = postprocess_misc(vec![misc("García", 18)], &doc, &|_| false);
        assert_eq!(kept[0].label(), EntityLabel::Misc);
    }

    #[test]
    fn test_misc_forced_entities_are_never_dropped() {
        let doc = MockAnnotator::new().annotate("x").unwrap();
        let (kept, dropped) = postprocess_misc(
            vec![misc("el Sur", 0), misc("META_TAG", 10)],
            &doc,
            &|e| e.text() == "el Sur",
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].text(), "el Sur");
        assert_eq!(dropped[0].entity.text(), "META_TAG");
    }

    // ===== Overlaps =====

    #[test]
    fn test_extension_over_another_label_reports_the_loser() {
        let engine = MockAnnotator::new()
            .with_entity("Ramírez", "PER")
            .with_entity("Toledo", "LOC");
        let pipeline = Pipeline::builder(engine)
            .config(without_validation())
            .build()
            .unwrap();
        let outcome = pipeline.extract("El doctor Ramírez Toledo llegó.", None);

        assert_eq!(texts(&outcome), ["doctor Ramírez Toledo"]);
        let toledo = outcome
            .rejected
            .iter()
            .find(|r| r.entity.text() == "Toledo")
            .unwrap();
        assert_eq!(toledo.entity.label(), EntityLabel::Loc);
        assert_eq!(toledo.reason, "overlaps 'doctor Ramírez Toledo'");
    }

    // ===== Feedback =====

    #[test]
    fn test_force_include_skips_the_filter() {
        let mut store = InMemoryFeedbackStore::new();
        store
            .add_project_override("saga", "Sin embargo", OverrideAction::ForceInclude, None, None)
            .unwrap();
        let pipeline = Pipeline::builder(MockAnnotator::new().with_entity("Sin embargo", "MISC"))
            .feedback(Arc::new(store))
            .build()
            .unwrap();
        let text = "Sin embargo, nadie vino.";

        let outcome = pipeline.extract(text, Some("saga"));
        assert_eq!(texts(&outcome), ["Sin embargo"]);
        assert!(outcome.rejected.is_empty());

        let other = pipeline.extract(text, None);
        assert!(other.entities.is_empty());
        assert_eq!(other.rejected[0].reason, "common phrase");
    }

    #[test]
    fn test_project_override_reaches_the_validator() {
        let mut store = InMemoryFeedbackStore::new();
        store
            .add_project_override("saga", "Aldara", OverrideAction::Reject, None, None)
            .unwrap();
        let pipeline = Pipeline::builder(MockAnnotator::new().with_entity("Aldara", "PER"))
            .feedback(Arc::new(store))
            .build()
            .unwrap();
        let text = "Ayer vino Aldara a casa. Luego Aldara sonrió.";

        let outcome = pipeline.extract(text, Some("saga"));
        assert!(outcome.entities.is_empty());
        assert!(outcome.rejected.iter().all(|r| r.entity.text() == "Aldara"));

        let other = pipeline.extract(text, Some("otra"));
        assert_eq!(texts(&other), ["Aldara"]);
    }

    #[test]
    fn test_pos_override_feeds_morphology() {
        let pipeline = Pipeline::builder(
            MockAnnotator::new()
                .with_entity("Corrió", "PER")
                .with_pos("corrió", Pos::Verb),
        )
        .config(without_validation())
        .build()
        .unwrap();
        let outcome = pipeline.extract("Luego Corrió hacia el río.", None);
        assert!(outcome.entities.is_empty());
        assert_eq!(outcome.rejected.len(), 1);
    }
}

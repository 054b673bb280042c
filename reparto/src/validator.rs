//! Multi-layer entity validation.
//!
//! Earlier stages over-generate; this is where candidates are accepted or
//! rejected. Each candidate goes through these layers, first hit wins:
//!
//! 1. feedback: project override, then global rejection, then system pattern
//! 2. discourse markers ("sin embargo", "poco después")
//! 3. non-narrative line (heading, metadata, list item)
//! 4. not-entity patterns
//! 5. weighted heuristic sub-scores against the threshold
//!
//! A project force-include short-circuits everything with a score of 1.0.
//! Accepted instances sharing a canonical form and label collapse into the
//! first one; the rest are listed in [`ValidationResult::duplicates`].
//!
//! With a semantic model, scores in the borderline band are then nudged by
//! ±0.3 according to the model's verdict.

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::annotation::{AnnotatedDoc, Pos};
use crate::config::ValidatorConfig;
use crate::feedback::{FeedbackStore, FilterLevel};
use crate::lexicon::{self, contains};
use crate::semantic::{borderline_context, judge_borderline, SemanticModel};
use crate::zones::{is_non_narrative_line, line_at, narrative_share};
use crate::ExtractedEntity;

/// Matched ignoring case, anywhere in the entity text unless anchored.
static NOT_ENTITY: Lazy<RegexSet> = Lazy::new(|| {
    let patterns = [
        r"^¿",
        r"\?$",
        r"^(quién|qué|cómo|dónde|cuándo|cuánto|por qué|para qué)\s",
        r"^(mi|tu|su|mis|tus|sus)\s+(cara|rostro|ojos|pelo|cabello|mano|manos|cuerpo|voz)",
        r"^(el|la|los|las|un|una)\s+(pequeño|grande|viejo|joven|alto|bajo)\s+",
        r"^(hola|adiós|gracias|por favor|perdón|disculpa)\b",
        r"^\d+\s*(de\s+)?(enero|febrero|marzo|abril|mayo|junio|julio|agosto|septiembre|octubre|noviembre|diciembre)",
        r"^(ayer|hoy|mañana|anoche|esta noche|esta mañana)\b",
        r"^(CAPÍTULO|CAPITULO|PARTE|SECCIÓN|SECCION|PRÓLOGO|PROLOGO|EPÍLOGO|EPILOGO|FIN|MANUSCRITO|DOCUMENTO|TEXTO|NOTAS?)\b",
        r"^(Personaje|Atributo|Ojos|Cabello|Pelo|Estatura|Edad|Profesión|Descripción|Nombre|Tipo)\s*[:,]",
        r"^[-•*]\s*",
        r"^LISTA\s+DE\s+",
        r"^Inconsistencias?\s+(intencionadas?|temporales?)?\s*:?",
        r"^RESUMEN\s+(DE|CRONOLÓGICO)",
        r"^[A-ZÁÉÍÓÚÑÜ]{3,}\s*:",
        r"^(lunes|martes|miércoles|jueves|viernes|sábado|domingo)$",
        r"^(Barba|Postre|Perfume|Bebida|Estatura)\b",
        r"^(Dequeísmo|Queísmo|Laísmo|Leísmo|Loísmo|Concordancia|Redundancia|Pleonasmo|Solecismo|Anacoluto)\b",
        r"^[A-ZÁÉÍÓÚ][a-záéíóúñ]+(ísmo|ístico|ísticos|ísticas)s?$",
        r"^[A-Za-záéíóúñÁÉÍÓÚÑ]+/[A-Za-záéíóúñÁÉÍÓÚÑ]+$",
        r"^(ERRORES\s+GRAMATICALES|Errores\s+gramaticales)\b",
        r"^(PRIMERA|SEGUNDA|TERCERA|CUARTA|QUINTA|SEXTA|SEPTIMA|OCTAVA|NOVENA|DECIMA)\s+(PARTE|SECCION|LIBRO|VOLUMEN)\b",
        r"^(El|La)\s+(reloj|tiempo|dia|día|noche|mundo|sol|luna|viento|aire|cielo|mar|agua|luz)\s",
        r"^(Un|Una)\s+(hombre|mujer|nino|niña|niño|persona|anciano|anciana|joven|senor|señor|senora|señora)\s",
        r"^(DETECCION|DETECCIÓN|CAPITULOS|CAPÍTULOS|ESTRUCTURA|ORIGENES|ORÍGENES|URGENTE|REVELACIONES)\b",
        r"^(PERSONAJES?|FORMATOS?|PARTES?|TIMELINE|EVENTOS?)\b",
        r"^Cap[ií]tulo\s+(Uno|Dos|Tres|Cuatro|Cinco|Seis|Siete|Ocho|Nueve|Diez)\b",
        r"^[IVXLC]+\.\s*",
        r"^algo\s+(extraño|raro|diferente|especial|terrible|horrible|malo|bueno|nuevo|viejo|grande|pequeño|oscuro|claro|misterioso|sospechoso|inquietante|inesperado|sorprendente)\b",
        r"^lo\s+(extraño|raro|peor|mejor|malo|bueno|importante|difícil|fácil|curioso|interesante|terrible|horrible|posible|imposible|increíble|absurdo|lógico|normal)\b",
        r"^(eso|esto|aquello)\s+(extraño|raro|terrible|horrible|malo|bueno|nuevo|viejo|diferente|especial)\b",
        r"^(nada|todo)\s+(extraño|especial|nuevo|malo|bueno|diferente|importante)\b",
        r"^(el|la|un|una)\s+(mismo|misma|propio|propia|otro|otra|cierto|cierta|algún|alguna|ningún|ninguna)\s+(hombre|mujer|persona|cosa|lugar|momento|día|noche)\b",
        r"^cualquier\s+(cosa|persona|lugar|momento|día|forma|manera|caso)\b",
        r"^((el|la)\s+)?(esperanza|verdad|mentira|realidad|vida|muerte|amor|odio|miedo|alegría|tristeza|soledad|felicidad|desgracia)\s*$",
    ];
    RegexSet::new(patterns.iter().map(|p| format!("(?i){p}")))
        .expect("NOT_ENTITY regex set is invalid")
});

/// Long all-caps text: a title, not a name. Case matters here.
static SHOUTED_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-ZÁÉÍÓÚÑÜ\s\-:]{15,}$").expect("SHOUTED_TITLE regex is invalid")
});

const ARTICLES: &[&str] = &["el", "la", "los", "las", "un", "una", "unos", "unas"];

/// Shift applied to a borderline score by a semantic verdict.
const SEMANTIC_ADJUSTMENT: f64 = 0.3;

/// Below this share of narrative occurrences the entity is flagged.
const ZONE_FLAG_SHARE: f64 = 0.3;

/// How a score was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMethod {
    Heuristic,
    /// Heuristic adjusted by the semantic model.
    Combined,
    DiscourseMarker,
    ProjectForceInclude,
    ProjectFiltered,
    UserFiltered,
    SystemFiltered,
    ZoneRejected,
    PatternRejected,
}

impl ValidationMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Heuristic => "heuristic",
            Self::Combined => "combined",
            Self::DiscourseMarker => "discourse_marker",
            Self::ProjectForceInclude => "project_force_include",
            Self::ProjectFiltered => "project_filtered",
            Self::UserFiltered => "user_filtered",
            Self::SystemFiltered => "system_filtered",
            Self::ZoneRejected => "zone_rejected",
            Self::PatternRejected => "pattern_rejected",
        }
    }

    fn filtered_at(level: FilterLevel) -> Self {
        match level {
            FilterLevel::Project => Self::ProjectFiltered,
            FilterLevel::User => Self::UserFiltered,
            _ => Self::SystemFiltered,
        }
    }
}

/// Score breakdown of one entity instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationScore {
    pub text: String,
    pub total: f64,
    pub is_valid: bool,
    pub frequency: f64,
    pub capitalization: f64,
    pub position: f64,
    pub length: f64,
    pub article: f64,
    pub common_word: f64,
    pub morphology: f64,
    pub semantic: Option<f64>,
    pub method: ValidationMethod,
    pub rejection_reason: Option<String>,
}

impl ValidationScore {
    fn decided(text: &str, valid: bool, method: ValidationMethod, reason: Option<String>) -> Self {
        Self {
            text: text.to_string(),
            total: if valid { 1.0 } else { 0.0 },
            is_valid: valid,
            frequency: 0.0,
            capitalization: 0.0,
            position: 0.0,
            length: 0.0,
            article: 0.0,
            common_word: 0.0,
            morphology: 1.0,
            semantic: None,
            method,
            rejection_reason: reason,
        }
    }

    fn rejected(text: &str, method: ValidationMethod, reason: impl Into<String>) -> Self {
        Self::decided(text, false, method, Some(reason.into()))
    }

    /// Rounded breakdown for reports.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let r = |v: f64| (v * 1000.0).round() / 1000.0;
        json!({
            "text": self.text,
            "total_score": r(self.total),
            "is_valid": self.is_valid,
            "scores": {
                "frequency": r(self.frequency),
                "capitalization": r(self.capitalization),
                "position": r(self.position),
                "length": r(self.length),
                "article": r(self.article),
                "common_word": r(self.common_word),
                "morphology": r(self.morphology),
                "semantic": self.semantic.map(r),
            },
            "method": self.method.as_str(),
            "rejection_reason": self.rejection_reason,
        })
    }
}

/// A rejected entity and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedEntity {
    pub entity: ExtractedEntity,
    pub reason: String,
}

/// Output of [`EntityValidator::validate`].
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// Accepted entities, one per canonical form and label (first
    /// occurrence wins).
    pub valid: Vec<ExtractedEntity>,
    pub rejected: Vec<RejectedEntity>,
    /// Accepted instances folded into an earlier entry of `valid`. They
    /// passed validation, so they are not in `rejected` either.
    pub duplicates: Vec<ExtractedEntity>,
    /// Best score per entity text.
    pub scores: HashMap<String, ValidationScore>,
    pub method: Option<ValidationMethod>,
    pub semantic_available: bool,
    instances: HashMap<(String, usize), ValidationScore>,
}

impl ValidationResult {
    /// Share of candidates accepted; 1.0 for an empty input.
    #[must_use]
    pub fn acceptance_rate(&self) -> f64 {
        let total = self.valid.len() + self.rejected.len();
        if total == 0 {
            1.0
        } else {
            self.valid.len() as f64 / total as f64
        }
    }

    /// Score of this exact instance, by `(text, start)`.
    #[must_use]
    pub fn score_of(&self, entity: &ExtractedEntity) -> Option<&ValidationScore> {
        self.instances
            .get(&(entity.text().to_string(), entity.start()))
    }

    /// Overall method: `combined` once a semantic model took part.
    #[must_use]
    pub fn method(&self) -> ValidationMethod {
        self.method.unwrap_or(ValidationMethod::Heuristic)
    }
}

/// Decides which candidates are real entities.
#[derive(Clone, Default)]
pub struct EntityValidator {
    config: ValidatorConfig,
    feedback: Option<Arc<dyn FeedbackStore>>,
    semantic: Option<Arc<dyn SemanticModel>>,
}

impl std::fmt::Debug for EntityValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityValidator")
            .field("config", &self.config)
            .field("feedback", &self.feedback.is_some())
            .field("semantic", &self.semantic.as_ref().map(|m| m.name()))
            .finish()
    }
}

impl EntityValidator {
    #[must_use]
    pub fn new(config: ValidatorConfig) -> Self {
        Self {
            config,
            feedback: None,
            semantic: None,
        }
    }

    #[must_use]
    pub fn with_feedback(mut self, store: Arc<dyn FeedbackStore>) -> Self {
        self.feedback = Some(store);
        self
    }

    #[must_use]
    pub fn with_semantic(mut self, model: Arc<dyn SemanticModel>) -> Self {
        self.semantic = Some(model);
        self
    }

    #[must_use]
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate `entities` found in `text`.
    ///
    /// `doc` feeds the morphology sub-score; `project` selects project
    /// overrides in the feedback store.
    #[must_use]
    pub fn validate(
        &self,
        entities: &[ExtractedEntity],
        text: &str,
        doc: Option<&AnnotatedDoc>,
        project: Option<&str>,
    ) -> ValidationResult {
        if entities.is_empty() {
            return ValidationResult::default();
        }

        let mut frequency: HashMap<&str, usize> = HashMap::new();
        for e in entities {
            *frequency.entry(e.text()).or_default() += 1;
        }

        let mut instances = HashMap::new();
        let mut scores: HashMap<String, ValidationScore> = HashMap::new();
        for e in entities {
            let freq = frequency.get(e.text()).copied().unwrap_or(1);
            let score = self.score(e, text, freq, doc, project);
            let better = scores
                .get(e.text())
                .map_or(true, |best| score.total > best.total);
            if better {
                scores.insert(e.text().to_string(), score.clone());
            }
            instances.insert((e.text().to_string(), e.start()), score);
        }

        let semantic_available =
            self.adjust_with_semantic(entities, text, &mut scores, &mut instances);

        let mut valid = Vec::new();
        let mut rejected = Vec::new();
        let mut duplicates = Vec::new();
        let mut seen = HashSet::new();
        for e in entities {
            match instances.get(&(e.text().to_string(), e.start())) {
                Some(s) if s.is_valid => {
                    if seen.insert(e.identity_key()) {
                        valid.push(e.clone());
                    } else {
                        duplicates.push(e.clone());
                    }
                }
                other => {
                    let reason = other
                        .and_then(|s| s.rejection_reason.clone())
                        .unwrap_or_else(|| "below threshold".into());
                    log::debug!("rejected {e}: {reason}");
                    rejected.push(RejectedEntity {
                        entity: e.clone(),
                        reason,
                    });
                }
            }
        }

        let method = if semantic_available {
            ValidationMethod::Combined
        } else {
            ValidationMethod::Heuristic
        };
        log::info!(
            "validation: {} valid, {} rejected ({})",
            valid.len(),
            rejected.len(),
            method.as_str()
        );
        ValidationResult {
            valid,
            rejected,
            scores,
            method: Some(method),
            semantic_available,
            duplicates,
            instances,
        }
    }

    /// Score one instance.
    #[must_use]
    pub fn score(
        &self,
        entity: &ExtractedEntity,
        text: &str,
        frequency: usize,
        doc: Option<&AnnotatedDoc>,
        project: Option<&str>,
    ) -> ValidationScore {
        let name = entity.text();
        let lower = name.trim().to_lowercase();

        // feedback outranks every other layer
        if let Some(store) = &self.feedback {
            let decision = store.decide(name, Some(entity.label()), project);
            if decision.is_forced_include() {
                return ValidationScore::decided(
                    name,
                    true,
                    ValidationMethod::ProjectForceInclude,
                    None,
                );
            }
            if decision.should_filter {
                return ValidationScore::rejected(
                    name,
                    ValidationMethod::filtered_at(decision.level),
                    decision.reason,
                );
            }
        }

        if contains(lexicon::DISCOURSE_MARKERS, &lower) {
            return ValidationScore::rejected(
                name,
                ValidationMethod::DiscourseMarker,
                format!("discourse marker: '{name}'"),
            );
        }

        let (line, _) = line_at(text, entity.start());
        if is_non_narrative_line(line) {
            let shown: String = line.chars().take(50).collect();
            let ellipsis = if line.chars().count() > 50 { "..." } else { "" };
            return ValidationScore::rejected(
                name,
                ValidationMethod::ZoneRejected,
                format!("in non-narrative zone: '{shown}{ellipsis}'"),
            );
        }

        if NOT_ENTITY.is_match(name) {
            return ValidationScore::rejected(
                name,
                ValidationMethod::PatternRejected,
                "matches a not-entity pattern",
            );
        }
        if SHOUTED_TITLE.is_match(name) {
            return ValidationScore::rejected(
                name,
                ValidationMethod::PatternRejected,
                "matches a not-entity pattern (capitals)",
            );
        }

        self.heuristic_score(entity, text, frequency, doc)
    }

    fn heuristic_score(
        &self,
        entity: &ExtractedEntity,
        text: &str,
        frequency: usize,
        doc: Option<&AnnotatedDoc>,
    ) -> ValidationScore {
        let name = entity.text();
        let lower = name.trim().to_lowercase();
        let occurrences = occurrences(name, text);

        let frequency = match frequency {
            f if f >= 3 => 1.0,
            2 => 0.7,
            _ => 0.3,
        };
        let capitalization = if capitalization_consistent(&occurrences) {
            1.0
        } else {
            0.3
        };
        let position = if mostly_mid_sentence(&occurrences, text) {
            1.0
        } else {
            0.4
        };
        let length = match name.chars().count() {
            n if n >= 5 => 1.0,
            n if n >= 3 => 0.7,
            _ => 0.3,
        };
        let first_word = lower.split_whitespace().next().unwrap_or("");
        let article = if contains(ARTICLES, first_word) { 0.2 } else { 1.0 };
        let common_word = if contains(lexicon::COMMON_SPANISH_WORDS, &lower) {
            0.0
        } else if lower
            .split_whitespace()
            .any(|w| w.chars().count() > 2 && contains(lexicon::COMMON_SPANISH_WORDS, w))
        {
            0.5
        } else {
            1.0
        };
        let (morphology, morphology_reason) = self.morphology_score(entity, doc);

        let w = &self.config.weights;
        let total = (frequency * w.frequency
            + capitalization * w.capitalization
            + position * w.position
            + length * w.length
            + article * w.no_article
            + common_word * w.not_common
            + morphology * w.morphology)
            / w.total();
        let is_valid = total >= self.config.threshold;

        let mut rejection_reason = None;
        if narrative_share(name, text) < ZONE_FLAG_SHARE {
            rejection_reason = Some("appears mostly in headings or metadata".to_string());
        }
        if !is_valid {
            rejection_reason = Some(match morphology_reason {
                Some(reason) if morphology < 0.5 => reason,
                _ if common_word == 0.0 => "common Spanish word".to_string(),
                _ if article < 0.5 => "starts with an article (likely a description)".to_string(),
                _ if capitalization < 0.5 => "inconsistent capitalization".to_string(),
                _ if frequency < 0.5 => "appears only once".to_string(),
                _ => format!("low score ({total:.2})"),
            });
        }

        ValidationScore {
            text: name.to_string(),
            total,
            is_valid,
            frequency,
            capitalization,
            position,
            length,
            article,
            common_word,
            morphology,
            semantic: None,
            method: ValidationMethod::Heuristic,
            rejection_reason,
        }
    }

    /// 0.1 or 0.3 for annotated verbs, 0.6 for a long verb ending, else 1.0.
    fn morphology_score(
        &self,
        entity: &ExtractedEntity,
        doc: Option<&AnnotatedDoc>,
    ) -> (f64, Option<String>) {
        if !self.config.use_morphology {
            return (1.0, None);
        }
        if let Some(doc) = doc {
            let tokens = doc.tokens_in(entity.start(), entity.end());
            let multi_word = entity.text().split_whitespace().count() > 1;
            if let Some(first) = tokens.first() {
                let confidence = match (first.pos, multi_word) {
                    (Pos::Verb | Pos::Aux, true) => Some(0.7),
                    (Pos::Verb, false) => Some(0.9),
                    (Pos::Aux, false) => Some(0.8),
                    _ => None,
                };
                if let Some(c) = confidence {
                    let score = if c > 0.8 { 0.1 } else { 0.3 };
                    return (
                        score,
                        Some(format!("tagged as a verb (confidence {:.0}%)", c * 100.0)),
                    );
                }
            }
        }

        let lower = entity.text().trim().to_lowercase();
        let len = lower.chars().count();
        let ending = lexicon::VALIDATOR_VERB_ENDINGS.iter().find(|e| {
            let n = e.chars().count();
            n >= 3 && len > n + 2 && lower.ends_with(*e)
        });
        match ending {
            Some(e) => (0.6, Some(format!("ends in '{e}' (possible verb)"))),
            None => (1.0, None),
        }
    }

    /// Ask the model about borderline texts; returns whether it took part.
    fn adjust_with_semantic(
        &self,
        entities: &[ExtractedEntity],
        text: &str,
        scores: &mut HashMap<String, ValidationScore>,
        instances: &mut HashMap<(String, usize), ValidationScore>,
    ) -> bool {
        let Some(model) = self.semantic.as_deref() else {
            return false;
        };
        if !model.is_available() {
            return false;
        }

        let (low, high) = (self.config.borderline_low, self.config.borderline_high);
        let mut seen = HashSet::new();
        let candidates: Vec<_> = entities
            .iter()
            .filter(|e| {
                scores
                    .get(e.text())
                    .is_some_and(|s| (low..=high).contains(&s.total))
            })
            .filter(|e| seen.insert(e.text()))
            .take(self.config.semantic_batch)
            .map(|e| {
                (
                    e.text().to_string(),
                    e.label(),
                    borderline_context(text, e, 100),
                )
            })
            .collect();
        if candidates.is_empty() {
            log::debug!("no borderline entities for semantic validation");
            return true;
        }

        let verdicts = match judge_borderline(model, &candidates) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("semantic validation failed: {e}");
                return false;
            }
        };

        let apply = |s: &mut ValidationScore, valid: bool, reason: &str| {
            s.semantic = Some(if valid { 1.0 } else { 0.0 });
            s.method = ValidationMethod::Combined;
            if valid {
                s.total = (s.total + SEMANTIC_ADJUSTMENT).min(1.0);
                s.is_valid = true;
                s.rejection_reason = None;
            } else {
                s.total = (s.total - SEMANTIC_ADJUSTMENT).max(0.0);
                s.is_valid = false;
                s.rejection_reason = Some(format!("semantic: {reason}"));
            }
        };
        for v in &verdicts {
            let Some(best) = scores.get_mut(&v.text) else {
                continue;
            };
            apply(best, v.is_valid, &v.reason);
            for ((t, _), s) in instances.iter_mut() {
                if *t == v.text && s.method == ValidationMethod::Heuristic {
                    apply(s, v.is_valid, &v.reason);
                }
            }
        }
        log::debug!("semantic validation judged {} entities", verdicts.len());
        true
    }
}

/// Whole-word, case-insensitive occurrences of `name` in `text`, as byte
/// offset and matched slice.
fn occurrences<'t>(name: &str, text: &'t str) -> Vec<(usize, &'t str)> {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(name)))
        .map(|re| re.find_iter(text).map(|m| (m.start(), m.as_str())).collect())
        .unwrap_or_default()
}

/// At least 70% of the occurrences capitalized; assumed with fewer than two.
fn capitalization_consistent(occurrences: &[(usize, &str)]) -> bool {
    if occurrences.len() < 2 {
        return true;
    }
    let capitalized = occurrences
        .iter()
        .filter(|(_, m)| m.chars().next().is_some_and(char::is_uppercase))
        .count();
    capitalized as f64 / occurrences.len() as f64 >= 0.7
}

/// Fewer than half of the occurrences open a sentence; assumed with fewer
/// than two.
fn mostly_mid_sentence(occurrences: &[(usize, &str)], text: &str) -> bool {
    if occurrences.len() < 2 {
        return true;
    }
    let starts = occurrences
        .iter()
        .filter(|(at, _)| {
            *at == 0
                || text[..*at]
                    .trim_end()
                    .chars()
                    .last()
                    .map_or(true, |c| matches!(c, '.' | '!' | '?' | '¿' | '¡' | '\n'))
        })
        .count();
    (starts as f64 / occurrences.len() as f64) < 0.5
}

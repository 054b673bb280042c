//! Optional assistance from an external language model.
//!
//! Two passes use it:
//!
//! - **Preprocessing**: the model lists the entities it sees in the opening
//!   of the document. Names are mapped back to exact offsets and registered
//!   in the gazetteer; they claim their ranges before the tagger runs.
//! - **Verification**: entities the validator scored below a threshold are
//!   sent back with their context for a valid/invalid verdict.
//!
//! The validator also asks for a verdict on borderline scores through
//! [`judge_borderline`].
//!
//! A missing model ([`SemanticModel::is_available`] is false) skips both
//! passes. A failing model returns `Err`, which the pipeline logs and
//! ignores. A reply with no usable JSON is "no result", never an error.

use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{HashSet, VecDeque};

use crate::config::PipelineConfig;
use crate::gazetteer::Gazetteer;
use crate::offset::{char_context, char_slice, SpanConverter};
use crate::spans::OccupiedRanges;
use crate::sync::{read, write, RwLock};
use crate::{EntityLabel, Error, ExtractedEntity, Provenance, Result};

/// Cap applied to the confidence of verified entities.
pub const VERIFIED_CONFIDENCE_CAP: f64 = 0.9;

/// Boost applied to the confidence of verified entities.
pub const VERIFIED_BOOST: f64 = 0.2;

/// Longest context sent with one entity, in chars.
const MAX_CONTEXT_CHARS: usize = 200;

const PREPROCESS_SYSTEM: &str =
    "Eres un experto en reconocimiento de entidades en narrativa en español.";
const VERIFY_SYSTEM: &str =
    "Verificas entidades nombradas. Solo son válidos los nombres propios reales.";
const VALIDATE_SYSTEM: &str =
    "Eres lingüista y validas entidades nombradas en textos narrativos en español.";

/// A text-completion model.
pub trait SemanticModel: Send + Sync {
    /// Complete `prompt` under the `system` instruction.
    ///
    /// # Errors
    ///
    /// `Semantic` if the model could not be reached or failed.
    fn complete(&self, prompt: &str, system: &str) -> Result<String>;

    /// Whether the model can be called at all.
    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "semantic"
    }
}

/// Pull the JSON object out of a model reply.
///
/// Drops Markdown fence lines, then parses from the first `{` to the last
/// `}`. Returns `None` if that does not parse.
#[must_use]
pub fn extract_json(response: &str) -> Option<Value> {
    let trimmed = response.trim();
    let cleaned = if trimmed.starts_with("```") {
        trimmed
            .lines()
            .filter(|l| !l.starts_with("```"))
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        trimmed.to_string()
    };
    let slice = match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(s), Some(e)) if e > s => &cleaned[s..=e],
        _ => cleaned.as_str(),
    };
    match serde_json::from_str(slice) {
        Ok(value) => Some(value),
        Err(e) => {
            log::debug!("semantic reply is not JSON: {e}");
            None
        }
    }
}

/// Items of the array at `key`, each deserialized on its own; malformed
/// items are skipped.
fn items<T: for<'de> Deserialize<'de>>(payload: &Value, key: &str) -> Option<Vec<T>> {
    let array = payload.get(key)?.as_array()?;
    Some(
        array
            .iter()
            .filter_map(|v| match serde_json::from_value(v.clone()) {
                Ok(item) => Some(item),
                Err(e) => {
                    log::debug!("skipping malformed '{key}' item: {e}");
                    None
                }
            })
            .collect(),
    )
}

/// Char span of `name` in `text`.
///
/// Tries an exact match, then a case-insensitive whole-word match, then the
/// last word of a multi-word name ("doctor García" -> "García").
#[must_use]
pub fn find_entity_position(text: &str, name: &str) -> Option<(usize, usize)> {
    let converter = SpanConverter::new(text);
    if let Some(pos) = text.find(name) {
        return Some(converter.chars(pos, pos + name.len()));
    }
    let whole_word = |needle: &str| {
        regex::Regex::new(&format!(r"(?i)\b{}\b", regex::escape(needle)))
            .ok()
            .and_then(|re| re.find(text))
            .map(|m| converter.chars(m.start(), m.end()))
    };
    if let Some(span) = whole_word(name) {
        return Some(span);
    }
    let words: Vec<&str> = name.split_whitespace().collect();
    match words.as_slice() {
        [_, .., last] => whole_word(last),
        _ => None,
    }
}

/// Context of `[start, end)` on one line, at most 200 chars.
fn flat_context(text: &str, start: usize, end: usize, radius: usize) -> String {
    let context = char_context(text, start, end, radius)
        .replace('\n', " ")
        .trim()
        .to_string();
    if context.chars().count() > MAX_CONTEXT_CHARS {
        let cut: String = context.chars().take(MAX_CONTEXT_CHARS).collect();
        format!("{cut}...")
    } else {
        context
    }
}

#[derive(Debug, Deserialize)]
struct ProposedEntity {
    #[serde(default)]
    text: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerificationItem {
    #[serde(default)]
    text: String,
    #[serde(default)]
    verdict: String,
}

/// Verdict on one borderline entity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SemanticVerdict {
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_valid")]
    pub is_valid: bool,
    #[serde(default)]
    pub reason: String,
}

fn default_valid() -> bool {
    true
}

/// What verification changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerificationReport {
    pub entities: Vec<ExtractedEntity>,
    pub checked: usize,
    pub verified: usize,
    pub rejected: usize,
}

/// Settings of the two semantic passes.
#[derive(Debug, Clone)]
pub struct SemanticPasses {
    sample_chars: usize,
    confidence: f64,
    threshold: f64,
    batch: usize,
    context_window: usize,
}

impl Default for SemanticPasses {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl SemanticPasses {
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            sample_chars: config.semantic_sample_chars,
            confidence: config.semantic_confidence,
            threshold: config.verification_threshold,
            batch: config.verification_batch,
            context_window: config.context_window,
        }
    }

    /// Ask the model for the entities in the opening of `text`.
    ///
    /// Found names are registered in `gazetteer` (outside of any model call).
    /// Each span is reported once.
    ///
    /// # Errors
    ///
    /// Whatever the model returns; an unusable reply is an empty result.
    pub fn preprocess(
        &self,
        model: &dyn SemanticModel,
        text: &str,
        gazetteer: &Gazetteer,
    ) -> Result<Vec<ExtractedEntity>> {
        let sample = char_slice(text, 0, self.sample_chars);
        let prompt = format!(
            "Extrae todas las entidades nombradas de este texto narrativo.\n\n\
             TEXTO:\n{sample}\n\n\
             Tipos: PER (personajes, con apodos y títulos), LOC (lugares, también \
             ficticios), ORG (instituciones, grupos).\n\
             No son entidades: pronombres, el narrador sin nombre, descripciones \
             físicas, saludos (de \"Hola María\" solo \"María\").\n\n\
             Responde solo con JSON:\n\
             {{\"entities\": [{{\"text\": \"Juan\", \"type\": \"PER\", \"start\": 0}}]}}"
        );
        let response = model.complete(&prompt, PREPROCESS_SYSTEM)?;
        let Some(payload) = extract_json(&response) else {
            return Ok(Vec::new());
        };
        let Some(proposed) = items::<ProposedEntity>(&payload, "entities") else {
            log::debug!("semantic preprocessing reply has no 'entities'");
            return Ok(Vec::new());
        };

        let mut claimed = OccupiedRanges::new();
        let mut out = Vec::new();
        for item in proposed {
            let name = item.text.trim();
            if name.chars().count() < 2 {
                continue;
            }
            let label = EntityLabel::from_semantic(item.kind.as_deref().unwrap_or("PER"));
            let Some((start, end)) = find_entity_position(text, name) else {
                log::debug!("semantic entity '{name}' not found in text");
                continue;
            };
            if claimed.overlaps(start, end) {
                log::debug!("semantic entity '{name}' overlaps an earlier one");
                continue;
            }
            let surface = char_slice(text, start, end);
            match ExtractedEntity::new(
                surface,
                label,
                start,
                end,
                self.confidence,
                Provenance::Semantic,
            ) {
                Ok(entity) => {
                    claimed.insert(entity.start(), entity.end());
                    out.push(entity);
                }
                Err(e) => log::debug!("semantic entity '{name}' dropped: {e}"),
            }
        }
        for entity in &out {
            gazetteer.register(entity.text(), entity.label());
        }
        log::debug!("semantic preprocessing found {} entities", out.len());
        Ok(out)
    }

    /// Ask the model to confirm entities scoring below the threshold.
    ///
    /// Up to `batch` low scorers are sent. A "valid" verdict raises the
    /// confidence by 0.2 (capped at 0.9); entities sent but not confirmed
    /// are dropped. Everything else is returned untouched, in order. An
    /// unusable reply keeps every entity.
    ///
    /// # Errors
    ///
    /// Whatever the model returns; the caller should then keep `entities`.
    pub fn verify<F>(
        &self,
        model: &dyn SemanticModel,
        text: &str,
        entities: &[ExtractedEntity],
        score_of: F,
    ) -> Result<VerificationReport>
    where
        F: Fn(&ExtractedEntity) -> f64,
    {
        let to_check: Vec<usize> = entities
            .iter()
            .enumerate()
            .filter(|(_, e)| score_of(e) < self.threshold)
            .map(|(i, _)| i)
            .take(self.batch)
            .collect();
        let unchanged = VerificationReport {
            entities: entities.to_vec(),
            ..VerificationReport::default()
        };
        if to_check.is_empty() {
            return Ok(unchanged);
        }

        let listing: Vec<Value> = to_check
            .iter()
            .map(|&i| {
                let e = &entities[i];
                json!({
                    "text": e.text(),
                    "type": e.label().as_str(),
                    "context": flat_context(text, e.start(), e.end(), self.context_window),
                })
            })
            .collect();
        let prompt = format!(
            "Verifica si estas posibles entidades son correctas.\n\n\
             ENTIDADES:\n{}\n\n\
             Para cada una responde \"valid\" si es un nombre propio real (personaje, \
             lugar, organización) o \"invalid\" si es una descripción, una frase común \
             o un error de detección.\n\n\
             Responde solo con JSON:\n\
             {{\"results\": [{{\"text\": \"...\", \"verdict\": \"valid|invalid\", \
             \"reason\": \"...\"}}]}}",
            Value::Array(listing)
        );
        let response = model.complete(&prompt, VERIFY_SYSTEM)?;
        let Some(results) = extract_json(&response)
            .and_then(|payload| items::<VerificationItem>(&payload, "results"))
        else {
            log::debug!("semantic verification gave no usable result, keeping all");
            return Ok(unchanged);
        };

        let mut valid = HashSet::new();
        let mut invalid = HashSet::new();
        for r in results {
            let key = r.text.to_lowercase();
            if r.verdict.eq_ignore_ascii_case("valid") {
                valid.insert(key);
            } else {
                invalid.insert(key);
            }
        }

        let checked: HashSet<usize> = to_check.iter().copied().collect();
        let mut report = VerificationReport {
            checked: to_check.len(),
            ..VerificationReport::default()
        };
        for (i, entity) in entities.iter().enumerate() {
            if !checked.contains(&i) {
                report.entities.push(entity.clone());
                continue;
            }
            let key = entity.text().to_lowercase();
            if valid.contains(&key) {
                let mut confirmed = entity.clone();
                confirmed.set_confidence(
                    (confirmed.confidence() + VERIFIED_BOOST).min(VERIFIED_CONFIDENCE_CAP),
                );
                confirmed.push_provenance(Provenance::SemanticVerified);
                report.entities.push(confirmed);
                report.verified += 1;
            } else {
                if !invalid.contains(&key) {
                    log::debug!("'{}' got no verdict, dropping", entity.text());
                }
                report.rejected += 1;
            }
        }
        log::info!(
            "semantic verification: {} confirmed, {} rejected of {} checked",
            report.verified,
            report.rejected,
            report.checked
        );
        Ok(report)
    }
}

/// Ask the model whether each `(text, label, context)` is a real entity.
///
/// # Errors
///
/// Whatever the model returns. An unusable reply is an empty list.
pub fn judge_borderline(
    model: &dyn SemanticModel,
    candidates: &[(String, EntityLabel, String)],
) -> Result<Vec<SemanticVerdict>> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }
    let listing = candidates
        .iter()
        .map(|(text, label, context)| {
            format!("  - \"{text}\" (detectado como {label}): \"{context}\"")
        })
        .collect::<Vec<_>>()
        .join("\n");
    let prompt = format!(
        "Decide si cada posible entidad de un texto narrativo es una entidad \
         nombrada real o un falso positivo.\n\n\
         ENTIDADES:\n{listing}\n\n\
         Válidas: nombres propios de personas, lugares y organizaciones.\n\
         Inválidas: frases de diálogo, descripciones genéricas, sustantivos comunes, \
         expresiones temporales, pronombres y artículos.\n\n\
         Responde solo con JSON:\n\
         {{\"validations\": [{{\"text\": \"...\", \"is_valid\": true, \"reason\": \"...\"}}]}}"
    );
    let response = model.complete(&prompt, VALIDATE_SYSTEM)?;
    Ok(extract_json(&response)
        .and_then(|payload| items::<SemanticVerdict>(&payload, "validations"))
        .unwrap_or_default())
}

/// Context string for [`judge_borderline`].
#[must_use]
pub fn borderline_context(text: &str, entity: &ExtractedEntity, radius: usize) -> String {
    flat_context(text, entity.start(), entity.end(), radius)
}

// =============================================================================
// Mock
// =============================================================================

/// Scripted [`SemanticModel`] for tests.
///
/// Replies are matched by a marker the prompt must contain; the first
/// matching rule wins. Prompts are recorded.
///
/// ```rust
/// use reparto::semantic::{MockSemanticModel, SemanticModel};
///
/// let model = MockSemanticModel::new()
///     .respond_to("entities", r#"{"entities": [{"text": "Aldara", "type": "PER"}]}"#);
/// let reply = model.complete("... \"entities\" ...", "system").unwrap();
/// assert!(reply.contains("Aldara"));
/// ```
#[derive(Debug, Default)]
pub struct MockSemanticModel {
    rules: Vec<(String, String)>,
    failure: Option<String>,
    unavailable: bool,
    prompts: RwLock<VecDeque<String>>,
}

impl MockSemanticModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply `response` to any prompt containing `marker`.
    #[must_use]
    pub fn respond_to(mut self, marker: impl Into<String>, response: impl Into<String>) -> Self {
        self.rules.push((marker.into(), response.into()));
        self
    }

    /// Fail every call with a semantic error.
    #[must_use]
    pub fn failing(mut self, msg: impl Into<String>) -> Self {
        self.failure = Some(msg.into());
        self
    }

    /// Report the model as unavailable.
    #[must_use]
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Prompts received so far, oldest first.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        read(&self.prompts).iter().cloned().collect()
    }
}

impl SemanticModel for MockSemanticModel {
    fn complete(&self, prompt: &str, _system: &str) -> Result<String> {
        write(&self.prompts).push_back(prompt.to_string());
        if let Some(msg) = &self.failure {
            return Err(Error::semantic(msg.clone()));
        }
        Ok(self
            .rules
            .iter()
            .find(|(marker, _)| prompt.contains(marker.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_default())
    }

    fn is_available(&self) -> bool {
        !self.unavailable
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn per(text: &str, start: usize, conf: f64) -> ExtractedEntity {
        let end = start + text.chars().count();
        ExtractedEntity::new(text, EntityLabel::Per, start, end, conf, Provenance::Tagger).unwrap()
    }

    // ===== JSON extraction =====

    #[test]
    fn test_extract_json_plain_and_fenced() {
        assert_eq!(extract_json(r#"{"a": 1}"#).unwrap()["a"], 1);
        let fenced = "```json\n{\"a\": 2}\n```";
        assert_eq!(extract_json(fenced).unwrap()["a"], 2);
        let chatty = "Claro, aquí está: {\"a\": 3} Espero que sirva.";
        assert_eq!(extract_json(chatty).unwrap()["a"], 3);
    }

    #[test]
    fn test_extract_json_malformed_is_none() {
        assert!(extract_json("no hay nada").is_none());
        assert!(extract_json("{\"a\": ").is_none());
        assert!(extract_json("").is_none());
    }

    // ===== Positions =====

    #[test]
    fn test_find_position_exact_then_case_insensitive() {
        let text = "Vio a Aldara. Luego ALDARA volvió.";
        assert_eq!(find_entity_position(text, "Aldara"), Some((6, 12)));
        assert_eq!(find_entity_position("Llegó ALDARA.", "Aldara"), Some((6, 12)));
    }

    #[test]
    fn test_find_position_last_word_and_chars() {
        let text = "Ñoño saludó a García.";
        assert_eq!(find_entity_position(text, "doctor García"), Some((14, 20)));
        assert_eq!(find_entity_position(text, "Ñoño"), Some((0, 4)));
        assert_eq!(find_entity_position(text, "Pedro"), None);
    }

    // ===== Preprocessing =====

    #[test]
    fn test_preprocess_maps_and_registers() {
        let model = MockSemanticModel::new().respond_to(
            "TEXTO",
            r#"```json
{"entities": [
  {"text": "Aldara", "type": "PER", "start": 0},
  {"text": "Vetusta", "type": "LOCATION"},
  {"text": "doctor Ramírez", "type": "PER"},
  {"text": "X", "type": "PER"},
  {"text": "Nadie", "type": "PER"},
  {"bogus": true}
]}
```"#,
        );
        let text = "Aldara llegó a Vetusta con Ramírez.";
        let gazetteer = Gazetteer::new();
        let found = SemanticPasses::default()
            .preprocess(&model, text, &gazetteer)
            .unwrap();
        let names: Vec<_> = found.iter().map(ExtractedEntity::text).collect();
        assert_eq!(names, vec!["Aldara", "Vetusta", "Ramírez"]);
        assert_eq!(found[1].label(), EntityLabel::Loc);
        assert_eq!(found[2].span(), (27, 34));
        assert!(found.iter().all(|e| e.confidence() == 0.85));
        assert_eq!(gazetteer.lookup("vetusta"), Some(EntityLabel::Loc));
        assert!(model.prompts()[0].contains("Aldara llegó"));
    }

    #[test]
    fn test_preprocess_first_claim_wins_overlaps() {
        let model = MockSemanticModel::new().respond_to(
            "TEXTO",
            r#"{"entities": [
  {"text": "Aldara Vence", "type": "PER"},
  {"text": "Aldara", "type": "PER"},
  {"text": "Vence", "type": "LOC"},
  {"text": "Oviedo", "type": "LOC"}
]}"#,
        );
        let gazetteer = Gazetteer::new();
        let found = SemanticPasses::default()
            .preprocess(&model, "Aldara Vence volvió a Oviedo.", &gazetteer)
            .unwrap();
        let names: Vec<_> = found.iter().map(ExtractedEntity::text).collect();
        assert_eq!(names, vec!["Aldara Vence", "Oviedo"]);
        assert_eq!(gazetteer.lookup("vence"), None);
    }

    #[test]
    fn test_preprocess_garbage_is_empty() {
        let model = MockSemanticModel::new().respond_to("TEXTO", "lo siento, no puedo");
        let found = SemanticPasses::default()
            .preprocess(&model, "Aldara.", &Gazetteer::new())
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_preprocess_failure_is_error() {
        let model = MockSemanticModel::new().failing("connection refused");
        let err = SemanticPasses::default()
            .preprocess(&model, "Aldara.", &Gazetteer::new())
            .unwrap_err();
        assert!(matches!(err, Error::Semantic(_)));
    }

    #[test]
    fn test_preprocess_samples_the_opening() {
        let config = PipelineConfig {
            semantic_sample_chars: 10,
            ..PipelineConfig::default()
        };
        let model = MockSemanticModel::new();
        SemanticPasses::from_config(&config)
            .preprocess(&model, "0123456789ABCDEF", &Gazetteer::new())
            .unwrap();
        let prompt = &model.prompts()[0];
        assert!(prompt.contains("0123456789"));
        assert!(!prompt.contains("ABCDEF"));
    }

    // ===== Verification =====

    #[test]
    fn test_verify_boosts_and_drops() {
        let text = "Aldara habló con Sus Ojos y con Brais.";
        let entities = vec![
            per("Aldara", 0, 0.6),
            per("Sus Ojos", 17, 0.6),
            per("Brais", 32, 0.9),
        ];
        let model = MockSemanticModel::new().respond_to(
            "ENTIDADES",
            r#"{"results": [
                {"text": "aldara", "verdict": "valid", "reason": "nombre"},
                {"text": "Sus Ojos", "verdict": "invalid", "reason": "descripción"}
            ]}"#,
        );
        let report = SemanticPasses::default()
            .verify(&model, text, &entities, ExtractedEntity::confidence)
            .unwrap();
        assert_eq!(report.checked, 2);
        assert_eq!(report.verified, 1);
        assert_eq!(report.rejected, 1);
        let names: Vec<_> = report.entities.iter().map(ExtractedEntity::text).collect();
        assert_eq!(names, vec!["Aldara", "Brais"]);
        assert!((report.entities[0].confidence() - 0.8).abs() < 1e-9);
        assert_eq!(report.entities[0].source_tag(), "tagger+semantic_verified");
        assert!(!model.prompts()[0].contains("Brais"));
    }

    #[test]
    fn test_verify_caps_confidence() {
        let entities = vec![per("Aldara", 0, 0.69)];
        let model = MockSemanticModel::new()
            .respond_to("ENTIDADES", r#"{"results": [{"text": "Aldara", "verdict": "valid"}]}"#);
        let report = SemanticPasses::default()
            .verify(&model, "Aldara.", &entities, ExtractedEntity::confidence)
            .unwrap();
        assert_eq!(report.entities[0].confidence(), VERIFIED_CONFIDENCE_CAP);
    }

    #[test]
    fn test_verify_unusable_reply_keeps_all() {
        let entities = vec![per("Aldara", 0, 0.3)];
        let model = MockSemanticModel::new().respond_to("ENTIDADES", "{}");
        let report = SemanticPasses::default()
            .verify(&model, "Aldara.", &entities, ExtractedEntity::confidence)
            .unwrap();
        assert_eq!(report.entities, entities);
        assert_eq!(report.checked, 0);
    }

    #[test]
    fn test_verify_nothing_low_makes_no_call() {
        let entities = vec![per("Aldara", 0, 0.95)];
        let model = MockSemanticModel::new();
        let report = SemanticPasses::default()
            .verify(&model, "Aldara.", &entities, ExtractedEntity::confidence)
            .unwrap();
        assert_eq!(report.entities.len(), 1);
        assert!(model.prompts().is_empty());
    }

    #[test]
    fn test_verify_respects_batch_cap() {
        let config = PipelineConfig {
            verification_batch: 1,
            ..PipelineConfig::default()
        };
        let text = "Ana y Eva.";
        let entities = vec![per("Ana", 0, 0.5), per("Eva", 6, 0.5)];
        let model = MockSemanticModel::new().respond_to("ENTIDADES", r#"{"results": []}"#);
        let report = SemanticPasses::from_config(&config)
            .verify(&model, text, &entities, ExtractedEntity::confidence)
            .unwrap();
        // Ana was sent and got no verdict; Eva was never sent
        let names: Vec<_> = report.entities.iter().map(ExtractedEntity::text).collect();
        assert_eq!(names, vec!["Eva"]);
    }

    // ===== Borderline judgement =====

    #[test]
    fn test_judge_borderline() {
        let model = MockSemanticModel::new().respond_to(
            "validations",
            r#"{"validations": [
                {"text": "Brais", "is_valid": true, "reason": "nombre"},
                {"text": "Ayer", "is_valid": false, "reason": "temporal"}
            ]}"#,
        );
        let verdicts = judge_borderline(
            &model,
            &[
                ("Brais".into(), EntityLabel::Per, "vino Brais".into()),
                ("Ayer".into(), EntityLabel::Misc, "Ayer llovió".into()),
            ],
        )
        .unwrap();
        assert_eq!(verdicts.len(), 2);
        assert!(verdicts[0].is_valid);
        assert!(!verdicts[1].is_valid);
        assert_eq!(verdicts[1].reason, "temporal");
    }

    #[test]
    fn test_context_is_flattened_and_truncated() {
        let text = format!("{}\nAldara\n{}", "a".repeat(300), "b".repeat(300));
        let e = per("Aldara", 301, 0.5);
        let context = borderline_context(&text, &e, 150);
        assert!(!context.contains('\n'));
        assert!(context.ends_with("..."));
        assert_eq!(context.chars().count(), MAX_CONTEXT_CHARS + 3);
    }

    #[test]
    fn test_mock_availability() {
        assert!(MockSemanticModel::new().is_available());
        assert!(!MockSemanticModel::new().unavailable().is_available());
    }
}

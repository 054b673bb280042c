//! False-positive filter for Spanish narrative text.
//!
//! Statistical taggers trained on news over-generate on fiction: sentence
//! initial verbs, greetings, pronouns, kinship terms and character-sheet
//! metadata all come back labelled. This module rejects them before they
//! become candidates.
//!
//! Checks run cheapest first:
//!
//! ```text
//! tagged_rejection      length -> segmentation -> POS -> closed vocabularies
//!                       -> surface shape -> verb/enclitic endings
//! morphology_rejection  POS in context -> sentence-initial common nouns
//!                       -> DET+NOUN -> label-specific vocabularies
//! ```
//!
//! Every rejection carries a short reason string for diagnostics.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::annotation::{AnnotatedDoc, Pos, Token};
use crate::config::PipelineConfig;
use crate::lexicon::{self, contains, ends_with_any, matching_ending};
use crate::offset::{char_context, char_slice};
use crate::{is_boundary_punct, EntityLabel};

/// Longest span (in chars) accepted from the tagger.
const MAX_SPAN_CHARS: usize = 100;

/// Longest span (in words) accepted from the tagger.
const MAX_SPAN_WORDS: usize = 5;

static PHYSICAL_POSSESSED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(sus?|mis?|tus?)\s+(ojos|cabello|pelo|rostro|cara|manos?|piel)\b")
        .expect("PHYSICAL_POSSESSED regex is invalid")
});
static PHYSICAL_COLOURED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(ojos|cabello|pelo)\s+(verdes?|azules?|negros?|marrones?|rubios?|castaños?)\b",
    )
    .expect("PHYSICAL_COLOURED regex is invalid")
});
static PLACE_AFTER_DIRECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(de|del)\s+[A-ZÁÉÍÓÚÑ]").expect("PLACE_AFTER_DIRECTION regex is invalid")
});
static LINE_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n+").expect("LINE_BREAKS regex is invalid"));

/// Rule engine deciding whether a span can be an entity.
#[derive(Debug, Clone)]
pub struct FalsePositiveFilter {
    min_length: usize,
    context_window: usize,
}

impl Default for FalsePositiveFilter {
    fn default() -> Self {
        Self::new(2, 100)
    }
}

impl FalsePositiveFilter {
    /// `min_length` in chars; `context_window` chars either side for
    /// morphology checks.
    #[must_use]
    pub fn new(min_length: usize, context_window: usize) -> Self {
        Self {
            min_length,
            context_window,
        }
    }

    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.min_entity_length, config.context_window)
    }

    /// Validity check for a tagger span.
    ///
    /// `tokens` are the annotation tokens covering the span, when available;
    /// without them only the lexical rules run. Returns the rejection reason,
    /// or `None` if the span may be an entity.
    #[must_use]
    pub fn tagged_rejection(&self, text: &str, tokens: Option<&[Token]>) -> Option<String> {
        if text.trim().is_empty() {
            return Some("empty".into());
        }
        if text.contains('\n') {
            return Some("segmentation error (line break)".into());
        }
        let trimmed = text.trim_matches(is_boundary_punct);
        let len = trimmed.chars().count();
        if len < self.min_length {
            return Some("too short after trimming punctuation".into());
        }
        if len > MAX_SPAN_CHARS {
            return Some("segmentation error (too long)".into());
        }

        let lower = trimmed.to_lowercase();
        let words: Vec<&str> = trimmed.split_whitespace().collect();
        let words_lower: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
        let first = words_lower.first().map(String::as_str).unwrap_or("");

        if let Some(tokens) = tokens {
            if let Some(reason) = pos_rejection(&words, tokens) {
                return Some(reason);
            }
        }

        if contains(lexicon::STOP_TITLES, &lower) {
            return Some("stop word".into());
        }
        if contains(lexicon::FAMILY_TERMS, &lower) {
            return Some("kinship term".into());
        }
        if contains(lexicon::PRONOUNS, &lower) {
            return Some("pronoun".into());
        }
        if !trimmed.chars().any(char::is_alphabetic) {
            return Some("no letters".into());
        }
        if len > 3 && !trimmed.chars().any(char::is_lowercase) {
            return Some("all caps, probably a heading".into());
        }
        if contains(lexicon::VERBS_AT_SENTENCE_START, &lower) {
            return Some("conjugated verb".into());
        }
        if contains(lexicon::COMMON_WORDS_CAPITALIZED, &lower) {
            return Some("capitalized common word".into());
        }
        if trimmed.contains('/') {
            return Some("contains a slash".into());
        }
        if trimmed.contains('→') || trimmed.contains("->") {
            return Some("contains an arrow".into());
        }
        if trimmed.contains(':') {
            return Some("key: value metadata".into());
        }
        if lower.starts_with("personaje ") {
            return Some("character sheet metadata".into());
        }
        if contains(lexicon::COMMON_PHRASES, &lower) {
            return Some("common phrase".into());
        }
        if PHYSICAL_POSSESSED.is_match(&lower) || PHYSICAL_COLOURED.is_match(&lower) {
            return Some("physical description".into());
        }
        if contains(lexicon::TAGGER_FALSE_POSITIVES, &lower) {
            return Some("known tagger false positive".into());
        }
        if words.len() > MAX_SPAN_WORDS {
            return Some("too many words".into());
        }
        if words.len() > 2 && contains(lexicon::SENTENCE_STARTERS, first) {
            return Some("reads as a clause".into());
        }
        if words.len() >= 2 && contains(lexicon::ARTICLES, first) {
            let second = words_lower[1].as_str();
            if contains(lexicon::GENERIC_NOUNS, second) {
                return Some("generic description".into());
            }
            if contains(lexicon::VERBS_AFTER_ARTICLE, second) {
                return Some("article followed by a verb".into());
            }
        }
        if words.len() >= 2 && contains(lexicon::REFLEXIVE_PRONOUNS, first) {
            return Some("reflexive pronoun and verb".into());
        }
        if words.len() >= 3
            && words_lower[1..]
                .iter()
                .any(|w| contains(lexicon::VERB_INDICATORS, w))
        {
            return Some("contains a verb".into());
        }
        if contains(lexicon::GREETINGS, first) {
            return Some("greeting".into());
        }
        if contains(lexicon::INTERROGATIVE_STARTERS, first) {
            return Some("interrogative".into());
        }
        let last = words_lower.last().map(String::as_str).unwrap_or("");
        if contains(lexicon::SCIENTIFIC_TERMS, &lower)
            || (words.len() > 1 && contains(lexicon::SCIENTIFIC_TERMS, last))
        {
            return Some("scientific term".into());
        }
        if words.len() > 1 && ends_with_any(last, &["ando", "endo", "iendo"]) {
            return Some("ends in a gerund".into());
        }
        if words.len() >= 2
            && contains(lexicon::POSSESSIVES, first)
            && !contains(lexicon::FORMAL_TITLES, &words_lower[1])
        {
            return Some("possessive phrase".into());
        }

        if words.len() == 1 {
            if let Some(reason) = single_word_verb_rejection(trimmed, &lower) {
                return Some(reason);
            }
        }
        if words.len() >= 2 {
            let last_is_lower = words
                .last()
                .and_then(|w| w.chars().next())
                .is_some_and(|c| !c.is_uppercase());
            if last_is_lower && ends_with_any(last, &["ió", "ó", "aron", "ieron", "aba"]) {
                return Some("ends in a verb".into());
            }
            if last.ends_with("io") && !ends_with_any(last, &["lio", "rio", "nio"]) {
                return Some("ends in an unaccented preterite (-io)".into());
            }
        }
        None
    }

    /// True if [`tagged_rejection`](Self::tagged_rejection) finds nothing.
    #[must_use]
    pub fn is_valid_tagged(&self, text: &str, tokens: Option<&[Token]>) -> bool {
        self.tagged_rejection(text, tokens).is_none()
    }

    /// Morphological check of a span in its document.
    ///
    /// Looks at the POS of the span's tokens and at how the same word is
    /// written elsewhere within the context window, then applies the
    /// label-specific vocabularies of [`surface_rejection`](Self::surface_rejection).
    #[must_use]
    pub fn morphology_rejection(
        &self,
        doc: &AnnotatedDoc,
        text: &str,
        label: EntityLabel,
        start: usize,
        end: usize,
    ) -> Option<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let first_idx = doc.first_token_index_in(start, end);
        let span_tokens: Vec<&Token> = doc
            .tokens_in(start, end)
            .iter()
            .filter(|t| t.pos != Pos::Punct)
            .collect();

        if let (Some(idx), Some(first)) = (first_idx, span_tokens.first()) {
            if first.pos == Pos::Verb && first.is_verb() {
                return Some(format!("tagged as verb (morph {})", first.morph));
            }
            if matches!(first.pos, Pos::Adj | Pos::Adv) && span_tokens.len() == 1 {
                return Some(format!("tagged as {}", first.pos));
            }
            if first.pos == Pos::Noun {
                let sentence_initial = first.is_sent_start
                    || (idx > 0
                        && matches!(
                            doc.tokens[idx - 1].text.as_str(),
                            "." | "!" | "?" | "¿" | "¡"
                        ));
                if sentence_initial {
                    let context = char_context(&doc.text, start, end, self.context_window);
                    if lowercase_dominates(text, context) {
                        return Some("common noun capitalized at sentence start".into());
                    }
                }
            }
            if first.pos == Pos::Det && span_tokens.len() > 1 {
                let second = span_tokens[1];
                if second.pos == Pos::Noun
                    && !contains(lexicon::FORMAL_TITLES, &second.text.to_lowercase())
                {
                    return Some("generic noun phrase (DET + NOUN)".into());
                }
            }
        }

        if words.is_empty() {
            return None;
        }
        let following = char_slice(&doc.text, start, start.saturating_add(50));
        self.surface_rejection(text, label, following)
    }

    /// Label-aware rejection from the surface form alone.
    ///
    /// `following` is the text starting at the span (the span itself plus
    /// what comes after), used to tell "al Norte" from "Norte de España".
    #[must_use]
    pub fn surface_rejection(
        &self,
        text: &str,
        label: EntityLabel,
        following: &str,
    ) -> Option<String> {
        let lower = text.trim().to_lowercase();
        let words: Vec<String> = lower.split_whitespace().map(str::to_string).collect();

        if words.len() == 1 && lower.chars().count() > 3 {
            if let Some(e) = matching_ending(&lower, lexicon::PRETERITE_ENDINGS) {
                return Some(format!("preterite verb ending -{e}"));
            }
            if let Some(e) = matching_ending(&lower, lexicon::IMPERATIVE_ENDINGS) {
                return Some(format!("imperative verb ending -{e}"));
            }
        }
        if words.len() >= 3 {
            let function_words = words
                .iter()
                .filter(|w| contains(lexicon::FUNCTION_WORDS, w))
                .count();
            if function_words >= 2 {
                return Some("sentence fragment (function words)".into());
            }
        }
        if contains(lexicon::QUANTIFIERS, &lower) {
            return Some("quantifier".into());
        }

        match label {
            EntityLabel::Loc => {
                if contains(lexicon::CARDINAL_DIRECTIONS, &lower)
                    && !PLACE_AFTER_DIRECTION.is_match(following)
                {
                    return Some("cardinal direction without a place name".into());
                }
                if contains(lexicon::NATURE_NOUNS, &lower) {
                    return Some("common place or nature noun".into());
                }
                if let Some((article, rest)) = lower.split_once(' ') {
                    if matches!(article, "el" | "la" | "los" | "las")
                        && contains(lexicon::NATURE_NOUNS, rest)
                    {
                        return Some("article and common noun".into());
                    }
                }
            }
            EntityLabel::Org => {
                if contains(lexicon::MONTHS, &lower) {
                    return Some("month, not an organization".into());
                }
                if contains(lexicon::ORG_TECHNICAL_TERMS, &lower) {
                    return Some("generic term, not an organization".into());
                }
            }
            EntityLabel::Per => {
                if contains(lexicon::COMMON_ADJECTIVES, &lower) {
                    return Some("common adjective, not a person".into());
                }
            }
            EntityLabel::Misc => {
                if contains(lexicon::COMMON_EXPRESSIONS, &lower) {
                    return Some("common expression".into());
                }
            }
        }
        None
    }

    /// Both lexical checks on a bare string, with no annotation.
    #[must_use]
    pub fn check(&self, text: &str, label: EntityLabel) -> Option<String> {
        self.tagged_rejection(text, None)
            .or_else(|| self.surface_rejection(text, label, text))
    }

    /// Stricter check for capitalized tokens the tagger missed.
    #[must_use]
    pub fn is_heuristic_candidate(&self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.chars().count() < 3 {
            return false;
        }
        let lower = trimmed.to_lowercase();
        if contains(lexicon::STOP_TITLES, &lower)
            || contains(lexicon::HEURISTIC_FALSE_POSITIVES, &lower)
        {
            return false;
        }
        trimmed.chars().any(char::is_alphabetic)
    }

    /// Whether a detection is reliable enough to teach the gazetteer.
    ///
    /// Two significant words ("Juan García", "Ciudad de México"), or one
    /// capitalized word of five chars or more ("Hogwarts").
    #[must_use]
    pub fn is_high_quality(&self, text: &str) -> bool {
        let trimmed = text.trim();
        let words: Vec<&str> = trimmed.split_whitespace().collect();
        if words.len() >= 2 {
            let significant = words
                .iter()
                .filter(|w| {
                    !contains(lexicon::STOP_TITLES, &w.to_lowercase()) && w.chars().count() > 2
                })
                .count();
            if significant >= 2 {
                return true;
            }
        }
        words.len() == 1
            && trimmed.chars().count() >= 5
            && trimmed.chars().next().is_some_and(char::is_uppercase)
    }

    /// Recover names from a span the tagger merged across line breaks.
    ///
    /// `"María\n\nMaría Sánchez"` at offset 10 yields `("María", 10)` and
    /// `("María Sánchez", 17)`. Each fragment must be capitalized and pass
    /// [`tagged_rejection`](Self::tagged_rejection) on its own.
    #[must_use]
    pub fn recover_fragments(&self, text: &str, start: usize) -> Vec<(String, usize)> {
        let mut out = Vec::new();
        let mut pieces = Vec::new();
        let mut cursor = 0;
        for m in LINE_BREAKS.find_iter(text) {
            pieces.push((cursor, &text[cursor..m.start()]));
            cursor = m.end();
        }
        pieces.push((cursor, &text[cursor..]));

        for (piece_byte, piece) in pieces {
            let stripped = piece.trim();
            if stripped.chars().count() < 2
                || !stripped.chars().next().is_some_and(char::is_uppercase)
            {
                continue;
            }
            let Some(inner) = piece.find(stripped) else {
                continue;
            };
            if self.tagged_rejection(stripped, None).is_some() {
                log::debug!("discarding fragment '{stripped}' of a merged span");
                continue;
            }
            let char_offset = text[..piece_byte + inner].chars().count();
            out.push((stripped.to_string(), start + char_offset));
        }
        out
    }
}

/// POS-based checks on the span tokens.
fn pos_rejection(words: &[&str], tokens: &[Token]) -> Option<String> {
    let content: Vec<&Token> = tokens.iter().filter(|t| t.pos != Pos::Punct).collect();
    if words.len() == 1 {
        let token = content.first()?;
        if token.is_verb() {
            return Some(format!("tagged as verb ({})", token.pos));
        }
        if token.pos == Pos::Adv {
            return Some("tagged as adverb".into());
        }
    } else if words.len() >= 2 {
        let verbs = content.iter().filter(|t| t.is_verb()).count();
        let propns = content.iter().filter(|t| t.is_proper_noun()).count();
        if verbs > 0 && propns == 0 {
            return Some("verbs without proper nouns".into());
        }
        if let Some(last) = content.last() {
            if last.is_verb() && !last.is_capitalized() {
                return Some("ends in a verb".into());
            }
        }
    }
    None
}

/// Enclitic and conjugation-ending checks for one word.
fn single_word_verb_rejection(word: &str, lower: &str) -> Option<String> {
    let len = lower.chars().count();
    if len > 4 {
        for encl in lexicon::DOUBLE_ENCLITICS.iter().chain(lexicon::ENCLITICS) {
            let encl_len = encl.chars().count();
            if lower.ends_with(encl) && len > encl_len + 3 {
                let stem = &lower[..lower.len() - encl.len()];
                // "dámelo", "piénsalo"; "Carlos" and "Marcos" have no accent
                if lexicon::ACCENTED_VOWELS.iter().any(|v| stem.contains(v)) {
                    return Some(format!("verb with enclitic -{encl}"));
                }
            }
        }
        if len > 5 {
            if let Some(e) = matching_ending(lower, lexicon::VERB_ENDINGS) {
                let capitalized = word.chars().next().is_some_and(char::is_uppercase);
                if !capitalized || ends_with_any(lower, lexicon::DEFINITE_VERB_ENDINGS) {
                    return Some(format!("verb ending -{e}"));
                }
            }
        }
    }
    if len >= 4 {
        if ends_with_any(lower, &["ones", "enes", "ines", "anes", "unes"]) {
            return Some("present-tense verb (second person)".into());
        }
        if ends_with_any(lower, &["ío", "úo"]) {
            return Some("present-tense verb (first person)".into());
        }
    }
    None
}

/// More lower-case than capitalized occurrences of `text` in `context`.
fn lowercase_dominates(text: &str, context: &str) -> bool {
    let lower = text.to_lowercase();
    let (Ok(lower_re), Ok(exact_re)) = (
        Regex::new(&format!(r"\b{}\b", regex::escape(&lower))),
        Regex::new(&format!(r"\b{}\b", regex::escape(text))),
    ) else {
        return false;
    };
    let lowercase_matches = lower_re.find_iter(&context.to_lowercase()).count();
    let exact_matches = exact_re.find_iter(context).count();
    lowercase_matches > exact_matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationEngine, MockAnnotator};

    fn filter() -> FalsePositiveFilter {
        FalsePositiveFilter::default()
    }

    fn rejects(text: &str) -> bool {
        filter().tagged_rejection(text, None).is_some()
    }

    // ===== Closed vocabularies =====

    #[test]
    fn test_greeting_rejected_by_vocabulary() {
        let reason = filter().tagged_rejection("Hola", None).unwrap();
        assert_eq!(reason, "common phrase");
    }

    #[test]
    fn test_pronouns_kinship_and_stopwords() {
        assert!(rejects("Ella"));
        assert!(rejects("Éste"));
        assert!(rejects("Hermano"));
        assert!(rejects("Del"));
    }

    #[test]
    fn test_metadata_shapes() {
        assert!(rejects("Ojos: azules"));
        assert!(rejects("Juan/Juana"));
        assert!(rejects("CAPÍTULO"));
        assert!(rejects("Personaje principal"));
    }

    #[test]
    fn test_phrases_and_clauses() {
        assert!(rejects("Sus ojos verdes"));
        assert!(rejects("Era un hombre"));
        assert!(rejects("La casa"));
        assert!(rejects("Se levantó"));
        assert!(rejects("Hola Juan"));
        assert!(rejects("Su novio"));
        assert!(!rejects("Su Majestad"));
    }

    // ===== Verb shapes =====

    #[test]
    fn test_names_ending_like_verbs_survive() {
        for name in ["Marcos", "Carlos", "García", "Baltasar", "Mario", "Rosario"] {
            assert!(!rejects(name), "{name} should not be rejected");
        }
    }

    #[test]
    fn test_verb_forms_rejected() {
        assert!(rejects("Dámelo"));
        assert!(rejects("Cantaron"));
        assert!(rejects("Sonrío"));
        assert!(rejects("Pones"));
        assert!(rejects("María corrió"));
        assert!(rejects("Alejandro asintio"));
        assert!(rejects("Camino corriendo"));
    }

    #[test]
    fn test_punctuation_is_trimmed_before_checks() {
        assert!(!rejects("«Aldara»"));
        assert!(rejects("¡¿"));
        assert!(rejects("A."));
    }

    #[test]
    fn test_segmentation_errors() {
        assert!(rejects("María\nSánchez"));
        assert!(rejects("Uno dos tres cuatro cinco seis"));
    }

    // ===== Morphology =====

    #[test]
    fn test_morphology_rejects_tagged_verb() {
        let doc = MockAnnotator::new()
            .with_pos("Anduvo", Pos::Verb)
            .annotate("Anduvo por la playa.")
            .unwrap();
        let reason = filter()
            .morphology_rejection(&doc, "Anduvo", EntityLabel::Per, 0, 6)
            .unwrap();
        assert!(reason.starts_with("tagged as verb"));
    }

    #[test]
    fn test_morphology_spares_verb_looking_given_names() {
        let doc = MockAnnotator::new()
            .with_pos("Rosa", Pos::Verb)
            .annotate("Vino Rosa a casa.")
            .unwrap();
        assert!(filter()
            .morphology_rejection(&doc, "Rosa", EntityLabel::Per, 5, 9)
            .is_none());
    }

    #[test]
    fn test_morphology_common_noun_at_sentence_start() {
        let doc = MockAnnotator::new()
            .with_pos("Silencio", Pos::Noun)
            .annotate("Silencio. Nadie rompía el silencio del silencio.")
            .unwrap();
        assert!(filter()
            .morphology_rejection(&doc, "Silencio", EntityLabel::Misc, 0, 8)
            .is_some());
    }

    #[test]
    fn test_morphology_det_noun() {
        let doc = MockAnnotator::new()
            .annotate("Vimos el público aplaudir.")
            .unwrap();
        assert!(filter()
            .morphology_rejection(&doc, "el público", EntityLabel::Org, 6, 16)
            .is_some());
    }

    #[test]
    fn test_surface_label_rules() {
        let f = filter();
        assert!(f.surface_rejection("Norte", EntityLabel::Loc, "Norte y").is_some());
        assert!(f
            .surface_rejection("Norte", EntityLabel::Loc, "Norte de España")
            .is_none());
        assert!(f.surface_rejection("Marzo", EntityLabel::Org, "").is_some());
        assert!(f.surface_rejection("Marzo", EntityLabel::Per, "").is_none());
        assert!(f.surface_rejection("La luna", EntityLabel::Loc, "").is_some());
        assert!(f.surface_rejection("Sin duda", EntityLabel::Misc, "").is_some());
        assert!(f.surface_rejection("Llegó", EntityLabel::Per, "").is_some());
        assert!(f.surface_rejection("Marcos", EntityLabel::Per, "").is_none());
    }

    // ===== Candidates and quality =====

    #[test]
    fn test_heuristic_candidates() {
        let f = filter();
        assert!(f.is_heuristic_candidate("Aldara"));
        assert!(!f.is_heuristic_candidate("Lunes"));
        assert!(!f.is_heuristic_candidate("Al"));
        assert!(!f.is_heuristic_candidate("123"));
    }

    #[test]
    fn test_high_quality() {
        let f = filter();
        assert!(f.is_high_quality("Juan García"));
        assert!(f.is_high_quality("Ciudad de México"));
        assert!(f.is_high_quality("Hogwarts"));
        assert!(!f.is_high_quality("Ana"));
        assert!(!f.is_high_quality("el Sr"));
    }

    #[test]
    fn test_recover_fragments() {
        let frags = filter().recover_fragments("María\n\nMaría Sánchez", 10);
        assert_eq!(
            frags,
            vec![("María".to_string(), 10), ("María Sánchez".to_string(), 17)]
        );
    }

    #[test]
    fn test_recover_fragments_skips_invalid_lines() {
        let frags = filter().recover_fragments("capítulo\nEl\nAldara Vence", 0);
        assert_eq!(frags, vec![("Aldara Vence".to_string(), 12)]);
    }
}

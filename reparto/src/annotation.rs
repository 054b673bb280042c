//! Contract with the linguistic annotation engine.
//!
//! Tokenization, part-of-speech tagging, dependency parsing and statistical
//! entity tagging are done elsewhere. The pipeline consumes their output as
//! an [`AnnotatedDoc`] produced by an [`AnnotationEngine`].
//!
//! All offsets are character offsets into [`AnnotatedDoc::text`].
//!
//! Two engines ship with the crate:
//!
//! - [`PreAnnotated`] replays a document annotated offline (deserialized
//!   from JSON), which is how the CLI runs.
//! - [`MockAnnotator`] is a scripted engine for tests: whitespace/punctuation
//!   tokenization, closed-class POS guesses, capitalized tokens as `PROPN`,
//!   `conj`/`flat` edges between proper nouns, and entity spans you tell it
//!   about.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::lexicon;
use crate::{EntityLabel, Error, Result};

// =============================================================================
// Tokens
// =============================================================================

/// Universal part-of-speech tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Pos {
    Adj,
    Adp,
    Adv,
    Aux,
    Cconj,
    Det,
    Intj,
    Noun,
    Num,
    Part,
    Pron,
    Propn,
    Punct,
    Sconj,
    Sym,
    Verb,
    Space,
    #[default]
    X,
}

impl Pos {
    /// Tag as the engine spells it (`PROPN`, `VERB`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Adj => "ADJ",
            Self::Adp => "ADP",
            Self::Adv => "ADV",
            Self::Aux => "AUX",
            Self::Cconj => "CCONJ",
            Self::Det => "DET",
            Self::Intj => "INTJ",
            Self::Noun => "NOUN",
            Self::Num => "NUM",
            Self::Part => "PART",
            Self::Pron => "PRON",
            Self::Propn => "PROPN",
            Self::Punct => "PUNCT",
            Self::Sconj => "SCONJ",
            Self::Sym => "SYM",
            Self::Verb => "VERB",
            Self::Space => "SPACE",
            Self::X => "X",
        }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One token of the annotated document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    /// Character offset of the first char.
    pub idx: usize,
    #[serde(default)]
    pub pos: Pos,
    /// Fine-grained tag (language specific).
    #[serde(default)]
    pub tag: String,
    /// Morphological features, `Key=Value|Key=Value`.
    #[serde(default)]
    pub morph: String,
    #[serde(default)]
    pub lemma: String,
    /// Dependency relation to `head`.
    #[serde(default)]
    pub dep: String,
    /// Index of the head token; the root points at itself.
    #[serde(default)]
    pub head: usize,
    #[serde(default)]
    pub is_sent_start: bool,
    #[serde(default)]
    pub like_num: bool,
    #[serde(default)]
    pub like_email: bool,
    #[serde(default)]
    pub like_url: bool,
}

impl Token {
    /// Character offset one past the last char.
    #[must_use]
    pub fn end(&self) -> usize {
        self.idx + self.text.chars().count()
    }

    /// First char is upper-case.
    #[must_use]
    pub fn is_capitalized(&self) -> bool {
        self.text.chars().next().is_some_and(char::is_uppercase)
    }

    /// Verb detection with corrections for known tagger mistakes.
    ///
    /// Gerunds and voseo forms are verbs even when tagged otherwise; a set of
    /// given names ("Mercedes", "Rosa") never are.
    #[must_use]
    pub fn is_verb(&self) -> bool {
        let lower = self.text.to_lowercase();
        if lexicon::contains(lexicon::VERB_OVERRIDES, &lower) {
            return true;
        }
        if lexicon::contains(lexicon::NOT_VERB_OVERRIDES, &lower) {
            return false;
        }
        matches!(self.pos, Pos::Verb | Pos::Aux) || self.tag.starts_with('V')
    }

    #[must_use]
    pub fn is_proper_noun(&self) -> bool {
        self.pos == Pos::Propn
    }

    #[must_use]
    pub fn is_determiner(&self) -> bool {
        self.pos == Pos::Det
    }

    /// Value of one morphological feature, e.g. `morph_feature("Tense")`.
    #[must_use]
    pub fn morph_feature(&self, key: &str) -> Option<&str> {
        self.morph.split('|').find_map(|kv| {
            let (k, v) = kv.split_once('=')?;
            (k == key).then_some(v)
        })
    }
}

// =============================================================================
// Tagged spans
// =============================================================================

/// Entity span emitted by the statistical tagger, before any filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedSpan {
    pub text: String,
    /// Label as the tagger spells it (`PER`, `PERSON`, `GPE`, ...).
    #[serde(rename = "label")]
    pub raw_label: String,
    pub start: usize,
    pub end: usize,
}

impl TaggedSpan {
    /// Mapped label, or `None` for labels the pipeline does not track.
    #[must_use]
    pub fn label(&self) -> Option<EntityLabel> {
        map_raw_label(&self.raw_label)
    }
}

/// Map a tagger label: PER/PERSON, LOC/GPE, ORG, MISC; anything else is dropped.
#[must_use]
pub fn map_raw_label(raw: &str) -> Option<EntityLabel> {
    EntityLabel::from_tagger(raw)
}

// =============================================================================
// Document
// =============================================================================

/// Output of the annotation engine for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedDoc {
    pub text: String,
    #[serde(default)]
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub entities: Vec<TaggedSpan>,
    /// Sentence boundaries as `(start, end)` char ranges.
    #[serde(default)]
    pub sentences: Vec<(usize, usize)>,
}

impl AnnotatedDoc {
    /// Check that tokens and spans agree with the text.
    ///
    /// # Errors
    ///
    /// `Annotation` describing the first inconsistency.
    pub fn validate(&self) -> Result<()> {
        let len = self.text.chars().count();
        let mut prev = 0;
        for (i, t) in self.tokens.iter().enumerate() {
            if t.idx < prev {
                return Err(Error::annotation(format!(
                    "token {i} '{}' at {} is out of order",
                    t.text, t.idx
                )));
            }
            if t.end() > len {
                return Err(Error::annotation(format!(
                    "token {i} '{}' ends at {} past text length {len}",
                    t.text,
                    t.end()
                )));
            }
            if t.head >= self.tokens.len() {
                return Err(Error::annotation(format!(
                    "token {i} '{}' has head {} outside the document",
                    t.text, t.head
                )));
            }
            prev = t.idx;
        }
        for span in &self.entities {
            if span.start >= span.end || span.end > len {
                return Err(Error::annotation(format!(
                    "tagged span '{}' has invalid range [{}, {})",
                    span.text, span.start, span.end
                )));
            }
        }
        Ok(())
    }

    /// Tokens whose first char lies in `[start, end)`.
    #[must_use]
    pub fn tokens_in(&self, start: usize, end: usize) -> &[Token] {
        let lo = self.tokens.partition_point(|t| t.idx < start);
        let hi = self.tokens.partition_point(|t| t.idx < end);
        &self.tokens[lo..hi.max(lo)]
    }

    /// Index of the token starting at char `idx`.
    #[must_use]
    pub fn token_index_at(&self, idx: usize) -> Option<usize> {
        self.tokens.binary_search_by_key(&idx, |t| t.idx).ok()
    }

    /// Index of the first token starting in `[start, end)`.
    #[must_use]
    pub fn first_token_index_in(&self, start: usize, end: usize) -> Option<usize> {
        let i = self.tokens.partition_point(|t| t.idx < start);
        (i < self.tokens.len() && self.tokens[i].idx < end).then_some(i)
    }

    /// True if a token starting at `idx` opens a sentence.
    #[must_use]
    pub fn is_sentence_start_at(&self, idx: usize) -> bool {
        self.token_index_at(idx)
            .is_some_and(|i| self.tokens[i].is_sent_start)
    }
}

// =============================================================================
// Engines
// =============================================================================

/// A linguistic annotation engine.
///
/// Implementations must return offsets in characters and tokens in document
/// order. A failure is fatal for the current document only.
pub trait AnnotationEngine: Send + Sync {
    /// Annotate `text`.
    ///
    /// # Errors
    ///
    /// `Annotation` if the engine fails on this document.
    fn annotate(&self, text: &str) -> Result<AnnotatedDoc>;

    /// Name for logs.
    fn name(&self) -> &'static str {
        "annotator"
    }
}

/// Replays an annotation produced offline.
#[derive(Debug, Clone)]
pub struct PreAnnotated {
    doc: AnnotatedDoc,
}

impl PreAnnotated {
    /// Wrap a document after validating it.
    ///
    /// # Errors
    ///
    /// `Annotation` if the document is internally inconsistent.
    pub fn new(doc: AnnotatedDoc) -> Result<Self> {
        doc.validate()?;
        Ok(Self { doc })
    }

    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// `Json` on malformed input, `Annotation` on inconsistent offsets.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::new(serde_json::from_str(json)?)
    }

    /// The document text this engine will accept.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.doc.text
    }
}

impl AnnotationEngine for PreAnnotated {
    fn annotate(&self, text: &str) -> Result<AnnotatedDoc> {
        if text != self.doc.text {
            return Err(Error::annotation(
                "text differs from the pre-annotated document",
            ));
        }
        Ok(self.doc.clone())
    }

    fn name(&self) -> &'static str {
        "pre-annotated"
    }
}

/// A scripted annotation engine for testing.
///
/// # Example
///
/// ```rust
/// use reparto::annotation::{AnnotationEngine, MockAnnotator, Pos};
///
/// let engine = MockAnnotator::new()
///     .with_entity("Pedro y Carmen", "PER")
///     .with_pos("miraron", Pos::Verb);
///
/// let doc = engine.annotate("Pedro y Carmen se miraron.").unwrap();
/// assert_eq!(doc.entities.len(), 1);
/// assert!(doc.tokens[0].is_sent_start);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockAnnotator {
    entities: Vec<(String, String)>,
    pos_overrides: HashMap<String, Pos>,
    failure: Option<String>,
}

impl MockAnnotator {
    /// Create a new mock engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag every occurrence of `text` with `raw_label`.
    #[must_use]
    pub fn with_entity(mut self, text: impl Into<String>, raw_label: impl Into<String>) -> Self {
        self.entities.push((text.into(), raw_label.into()));
        self
    }

    /// Force the POS of a word (matched case-insensitively).
    #[must_use]
    pub fn with_pos(mut self, word: &str, pos: Pos) -> Self {
        self.pos_overrides.insert(word.to_lowercase(), pos);
        self
    }

    /// Make every call fail with an annotation error.
    #[must_use]
    pub fn failing(mut self, msg: impl Into<String>) -> Self {
        self.failure = Some(msg.into());
        self
    }

    fn guess_pos(&self, text: &str) -> Pos {
        let lower = text.to_lowercase();
        if let Some(pos) = self.pos_overrides.get(&lower) {
            return *pos;
        }
        let Some(first) = text.chars().next() else {
            return Pos::X;
        };
        if !first.is_alphanumeric() {
            return Pos::Punct;
        }
        if text.chars().all(|c| c.is_ascii_digit()) {
            return Pos::Num;
        }
        match lower.as_str() {
            "el" | "la" | "los" | "las" | "un" | "una" | "unos" | "unas" | "su" | "sus" | "mi"
            | "mis" | "tu" | "tus" | "este" | "esta" | "ese" | "esa" => Pos::Det,
            "a" | "al" | "de" | "del" | "en" | "con" | "por" | "para" | "desde" | "hacia"
            | "hasta" | "sin" | "sobre" | "entre" | "tras" | "ante" | "según" => Pos::Adp,
            "y" | "e" | "o" | "u" | "ni" | "pero" => Pos::Cconj,
            "que" | "si" | "porque" | "cuando" | "aunque" => Pos::Sconj,
            _ if lexicon::contains(lexicon::PRONOUNS, &lower) => Pos::Pron,
            _ if first.is_uppercase() => Pos::Propn,
            _ if lexicon::ends_with_any(&lower, &["ó", "ió", "aron", "ieron", "aba", "aban"]) => {
                Pos::Verb
            }
            _ => Pos::Noun,
        }
    }

    fn push_token(&self, tokens: &mut Vec<Token>, text: String, idx: usize, after_newline: bool) {
        let is_sent_start = match tokens.last() {
            None => true,
            Some(prev) => {
                after_newline
                    || matches!(prev.text.as_str(), "." | "!" | "?" | "…")
                    || (prev.is_sent_start && is_opener(&prev.text))
            }
        };
        let pos = self.guess_pos(&text);
        let head = tokens.len();
        tokens.push(Token {
            lemma: text.to_lowercase(),
            tag: pos.as_str().to_string(),
            like_num: pos == Pos::Num,
            like_email: text.contains('@'),
            like_url: text.starts_with("http"),
            text,
            idx,
            pos,
            morph: String::new(),
            dep: String::new(),
            head,
            is_sent_start,
        });
    }

    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut word = String::new();
        let mut word_start = 0;
        let mut word_after_newline = false;
        let mut newline_pending = false;

        for (i, c) in text.chars().enumerate() {
            if c.is_alphanumeric() {
                if word.is_empty() {
                    word_start = i;
                    word_after_newline = newline_pending;
                    newline_pending = false;
                }
                word.push(c);
                continue;
            }
            if !word.is_empty() {
                let w = std::mem::take(&mut word);
                self.push_token(&mut tokens, w, word_start, word_after_newline);
            }
            if c == '\n' {
                newline_pending = true;
            } else if !c.is_whitespace() {
                self.push_token(&mut tokens, c.to_string(), i, newline_pending);
                newline_pending = false;
            }
        }
        if !word.is_empty() {
            self.push_token(&mut tokens, word, word_start, word_after_newline);
        }

        attach_dependencies(&mut tokens);
        tokens
    }

    fn find_entities(&self, text: &str) -> Vec<TaggedSpan> {
        let mut spans = Vec::new();
        for (needle, label) in &self.entities {
            if needle.is_empty() {
                continue;
            }
            let needle_chars = needle.chars().count();
            for (byte_idx, _) in text.match_indices(needle.as_str()) {
                let start = text[..byte_idx].chars().count();
                spans.push(TaggedSpan {
                    text: needle.clone(),
                    raw_label: label.clone(),
                    start,
                    end: start + needle_chars,
                });
            }
        }
        spans.sort_by_key(|s| (s.start, s.end));
        spans
    }
}

fn is_opener(s: &str) -> bool {
    matches!(s, "¿" | "¡" | "«" | "\"" | "“" | "—" | "–" | "-")
}

/// `cc` on conjunctions, `conj` from the right conjunct to the left one and
/// `flat` inside runs of proper nouns.
fn attach_dependencies(tokens: &mut [Token]) {
    let mut run_head: Option<usize> = None;
    for i in 0..tokens.len() {
        if tokens[i].pos == Pos::Propn && !tokens[i].is_sent_start {
            if let Some(h) = run_head {
                tokens[i].dep = "flat".to_string();
                tokens[i].head = h;
                continue;
            }
            run_head = Some(i);
        } else if tokens[i].pos == Pos::Propn {
            run_head = Some(i);
        } else {
            run_head = None;
        }
    }

    for i in 1..tokens.len().saturating_sub(1) {
        if tokens[i].pos != Pos::Cconj {
            continue;
        }
        let left = i - 1;
        let right = i + 1;
        if tokens[right].pos != Pos::Propn || tokens[left].pos != Pos::Propn {
            continue;
        }
        let left_head = if tokens[left].dep == "flat" { tokens[left].head } else { left };
        tokens[i].dep = "cc".to_string();
        tokens[i].head = right;
        tokens[right].dep = "conj".to_string();
        tokens[right].head = left_head;
    }
}

fn sentence_ranges(tokens: &[Token], text_len: usize) -> Vec<(usize, usize)> {
    // a word right after an opening mark shares its sentence
    let starts: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(i, t)| {
            t.is_sent_start
                && !(*i > 0 && tokens[i - 1].is_sent_start && is_opener(&tokens[i - 1].text))
        })
        .map(|(_, t)| t.idx)
        .collect();
    starts
        .iter()
        .enumerate()
        .map(|(i, &s)| (s, starts.get(i + 1).copied().unwrap_or(text_len)))
        .collect()
}

impl AnnotationEngine for MockAnnotator {
    fn annotate(&self, text: &str) -> Result<AnnotatedDoc> {
        if let Some(msg) = &self.failure {
            return Err(Error::annotation(msg.clone()));
        }
        let tokens = self.tokenize(text);
        let sentences = sentence_ranges(&tokens, text.chars().count());
        Ok(AnnotatedDoc {
            text: text.to_string(),
            entities: self.find_entities(text),
            tokens,
            sentences,
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

// =============================================================================
// Context helpers
// =============================================================================

/// Whether the tokens around `[start, end)` suggest a person rather than a place.
///
/// "calle Fernández", "en García" and "en la García" read as places; with no
/// such cue the answer is yes.
#[must_use]
pub fn is_person_context(doc: &AnnotatedDoc, start: usize, end: usize) -> bool {
    let Some(first) = doc.first_token_index_in(start, end) else {
        return true;
    };
    if first == 0 {
        return true;
    }
    let prev = &doc.tokens[first - 1];
    let prev_lower = prev.text.to_lowercase();
    if lexicon::contains(lexicon::LOCATION_CONTEXT, &prev_lower)
        || lexicon::contains(lexicon::LOCATION_PREPOSITIONS, &prev_lower)
    {
        return false;
    }
    if first > 1 {
        let prev2 = doc.tokens[first - 2].text.to_lowercase();
        if lexicon::contains(lexicon::LOCATION_PREPOSITIONS, &prev2) && prev.is_determiner() {
            return false;
        }
    }
    true
}

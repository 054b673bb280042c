//! Entity candidate model.
//!
//! An [`ExtractedEntity`] is one detected mention in a document. Every
//! pipeline stage produces, extends or discards these; nothing mutates them
//! after the pipeline returns.
//!
//! # Offsets
//!
//! `start`/`end` are **character** offsets (not bytes) into the document
//! text, half-open: `[start, end)`.
//!
//! # Identity
//!
//! ```text
//! equality / hashing : (text, label, start, end)   -> re-detections collapse in sets
//! gazetteer key      : (label, canonical form)     -> "María" == "maria"
//! overlap checks     : (start, end)                -> two mentions of one name stay distinct
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};

/// Characters stripped from both ends of an entity's surface text.
///
/// Includes the Spanish opening marks and typographic quotes so that a span
/// like `“María` does not survive as a lower-quality mention.
pub const BOUNDARY_PUNCT: &[char] = &[
    '–', '—', '-', ',', '.', ';', ':', '!', '?', '¿', '¡', '\'', '"', '(', ')', '[', ']', '{',
    '}', '«', '»', '“', '”', '‘', '’', ' ', '\t', '\n', '\r',
];

/// Returns true if `c` is boundary punctuation (or whitespace) for entity spans.
#[must_use]
pub fn is_boundary_punct(c: char) -> bool {
    BOUNDARY_PUNCT.contains(&c) || c.is_whitespace()
}

/// Canonical form of an entity's surface text.
///
/// NFKD decomposition, combining marks removed, lower-cased, trimmed.
/// `canonical_form(canonical_form(t)) == canonical_form(t)` for every `t`.
///
/// ```rust
/// use reparto_core::canonical_form;
///
/// assert_eq!(canonical_form("  María García "), "maria garcia");
/// assert_eq!(canonical_form("MARÍA"), canonical_form("maria"));
/// ```
#[must_use]
pub fn canonical_form(text: &str) -> String {
    let stripped: String = text.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    let lowered = stripped.to_lowercase();
    let trimmed = lowered.trim();
    // Lower-casing can itself produce decomposable output ("İ" -> "i̇").
    if trimmed.chars().any(is_combining_mark) {
        trimmed
            .nfkd()
            .filter(|c| !is_combining_mark(*c))
            .collect::<String>()
            .trim()
            .to_string()
    } else {
        trimmed.to_string()
    }
}

// =============================================================================
// Labels
// =============================================================================

/// Coarse entity label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityLabel {
    /// Person or character.
    #[serde(rename = "PER")]
    Per,
    /// Place, real or invented.
    #[serde(rename = "LOC")]
    Loc,
    /// Organization or institution.
    #[serde(rename = "ORG")]
    Org,
    /// Catch-all label from the statistical tagger.
    #[serde(rename = "MISC")]
    Misc,
}

impl EntityLabel {
    /// All labels, in reporting order.
    pub const ALL: [EntityLabel; 4] = [Self::Per, Self::Loc, Self::Org, Self::Misc];

    /// Short tag (`PER`, `LOC`, `ORG`, `MISC`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Per => "PER",
            Self::Loc => "LOC",
            Self::Org => "ORG",
            Self::Misc => "MISC",
        }
    }

    /// Map a statistical tagger label onto ours.
    ///
    /// Accepts `PER`/`PERSON`, `LOC`/`GPE`, `ORG`, `MISC`; anything else is
    /// not an entity we track.
    #[must_use]
    pub fn from_tagger(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PER" | "PERSON" => Some(Self::Per),
            "LOC" | "GPE" => Some(Self::Loc),
            "ORG" => Some(Self::Org),
            "MISC" => Some(Self::Misc),
            _ => None,
        }
    }

    /// Map a semantic-model type name onto ours. Unknown names default to `PER`.
    #[must_use]
    pub fn from_semantic(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "LOC" | "LOCATION" => Self::Loc,
            "ORG" | "ORGANIZATION" => Self::Org,
            "MISC" => Self::Misc,
            _ => Self::Per,
        }
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_tagger(s).ok_or_else(|| Error::invalid_input(format!("unknown label: {s}")))
    }
}

// =============================================================================
// Provenance
// =============================================================================

/// Which pipeline stage produced or touched an entity.
///
/// An entity carries an ordered list of these: the first entry is the
/// detecting stage, later entries record extensions, splits and
/// reclassifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Provenance {
    /// Semantic-model preprocessing.
    Semantic,
    /// Statistical tagger span.
    Tagger,
    /// Fragment recovered from a tagger span merged across a line break.
    TaggerSplit,
    /// Gazetteer lookup.
    Gazetteer,
    /// New entity from a title pattern ("doctor X").
    TitlePattern,
    /// New entity from a geographic-prefix pattern ("monte X").
    LocationPattern,
    /// New entity from a surname-with-particle pattern ("García de la Vega").
    CompoundPersonPattern,
    /// Existing entity extended with a title.
    Title,
    /// Existing entity extended with a geographic prefix.
    Prefix,
    /// Existing entity extended with a "<prefix> de <Name>" form.
    Compound,
    /// Existing entity extended with a surname particle.
    CompoundPerson,
    /// Split from a coordinated span using the dependency parse.
    CoordSplit,
    /// Split from a coordinated span using the regex fallback.
    SimpleCoordSplit,
    /// Confirmed by the semantic verifier.
    SemanticVerified,
    /// Moved out of MISC by post-processing.
    Reclassified,
    /// Moved out of MISC because it looks like a full name.
    ReclassifiedFullName,
}

impl Provenance {
    /// Stable snake_case tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Semantic => "semantic",
            Self::Tagger => "tagger",
            Self::TaggerSplit => "tagger_split",
            Self::Gazetteer => "gazetteer",
            Self::TitlePattern => "title_pattern",
            Self::LocationPattern => "location_pattern",
            Self::CompoundPersonPattern => "compound_person_pattern",
            Self::Title => "title",
            Self::Prefix => "prefix",
            Self::Compound => "compound",
            Self::CompoundPerson => "compound_person",
            Self::CoordSplit => "coord_split",
            Self::SimpleCoordSplit => "simple_coord_split",
            Self::SemanticVerified => "semantic_verified",
            Self::Reclassified => "reclassified",
            Self::ReclassifiedFullName => "reclassified_fullname",
        }
    }

    /// True for stages that create entities (as opposed to annotating them).
    #[must_use]
    pub const fn is_detection(self) -> bool {
        matches!(
            self,
            Self::Semantic
                | Self::Tagger
                | Self::TaggerSplit
                | Self::Gazetteer
                | Self::TitlePattern
                | Self::LocationPattern
                | Self::CompoundPersonPattern
                | Self::CoordSplit
                | Self::SimpleCoordSplit
        )
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ExtractedEntity
// =============================================================================

/// One detected mention.
///
/// Construction trims boundary punctuation, shifts the offsets to match and
/// derives the canonical form; none of these can be set independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawEntity")]
pub struct ExtractedEntity {
    text: String,
    label: EntityLabel,
    start: usize,
    end: usize,
    confidence: f64,
    provenance: Vec<Provenance>,
    canonical: String,
}

/// Wire shape used for deserialization; funnels through [`ExtractedEntity::new`].
#[derive(Deserialize)]
struct RawEntity {
    text: String,
    label: EntityLabel,
    start: usize,
    end: usize,
    confidence: f64,
    #[serde(default)]
    provenance: Vec<Provenance>,
}

impl TryFrom<RawEntity> for ExtractedEntity {
    type Error = Error;

    fn try_from(raw: RawEntity) -> Result<Self> {
        let mut provenance = raw.provenance.into_iter();
        let first = provenance.next().unwrap_or(Provenance::Tagger);
        let mut entity = Self::new(raw.text, raw.label, raw.start, raw.end, raw.confidence, first)?;
        entity.provenance.extend(provenance);
        Ok(entity)
    }
}

impl ExtractedEntity {
    /// Create a new entity.
    ///
    /// `start`/`end` are character offsets of `text` in the document. Leading
    /// and trailing boundary punctuation is trimmed and the offsets adjusted.
    /// Confidence is clamped to `[0, 1]`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `end < start`, if the offsets disagree with the
    /// character length of `text`, or if nothing is left after trimming.
    pub fn new(
        text: impl Into<String>,
        label: EntityLabel,
        start: usize,
        end: usize,
        confidence: f64,
        provenance: Provenance,
    ) -> Result<Self> {
        let text = text.into();
        if end < start {
            return Err(Error::invalid_input(format!(
                "entity '{text}' has end {end} before start {start}"
            )));
        }
        let char_len = text.chars().count();
        if end - start != char_len {
            return Err(Error::invalid_input(format!(
                "entity '{text}' spans {} chars but has {char_len}",
                end - start
            )));
        }

        let leading = text.chars().take_while(|c| is_boundary_punct(*c)).count();
        if leading == char_len {
            return Err(Error::invalid_input(format!(
                "entity '{text}' is empty after trimming punctuation"
            )));
        }
        let trailing = text.chars().rev().take_while(|c| is_boundary_punct(*c)).count();
        let trimmed: String = text
            .chars()
            .skip(leading)
            .take(char_len - leading - trailing)
            .collect();

        let canonical = canonical_form(&trimmed);
        Ok(Self {
            text: trimmed,
            label,
            start: start + leading,
            end: end - trailing,
            confidence: clamp_confidence(confidence),
            provenance: vec![provenance],
            canonical,
        })
    }

    /// Surface text, trimmed of boundary punctuation.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Entity label.
    #[must_use]
    pub const fn label(&self) -> EntityLabel {
        self.label
    }

    /// Start character offset (inclusive).
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// End character offset (exclusive).
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// `(start, end)` pair used for overlap and duplicate checks.
    #[must_use]
    pub const fn span(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    /// Length in characters.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Always false: construction rejects empty spans.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Confidence in `[0, 1]`.
    #[must_use]
    pub const fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Canonical (normalized) form of the text.
    #[must_use]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Gazetteer identity: `(label, canonical form)`.
    #[must_use]
    pub fn identity_key(&self) -> (EntityLabel, &str) {
        (self.label, &self.canonical)
    }

    /// Full provenance trail, detecting stage first.
    #[must_use]
    pub fn provenance(&self) -> &[Provenance] {
        &self.provenance
    }

    /// The stage that first produced this entity.
    #[must_use]
    pub fn primary_source(&self) -> Provenance {
        // provenance is never empty: every constructor seeds it
        self.provenance.first().copied().unwrap_or(Provenance::Tagger)
    }

    /// Provenance rendered as `tagger+title`, for logs and diagnostics.
    #[must_use]
    pub fn source_tag(&self) -> String {
        self.provenance
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join("+")
    }

    /// True if `self` and `other` share at least one character.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        spans_overlap(self.start, self.end, other.start, other.end)
    }

    /// True if `self` lies entirely inside `[start, end)`.
    #[must_use]
    pub const fn is_within(&self, start: usize, end: usize) -> bool {
        self.start >= start && self.end <= end
    }

    /// Replace the confidence (clamped).
    pub fn set_confidence(&mut self, confidence: f64) {
        self.confidence = clamp_confidence(confidence);
    }

    /// Change the label, recording why.
    pub fn relabel(&mut self, label: EntityLabel, why: Provenance) {
        self.label = label;
        self.provenance.push(why);
    }

    /// Append a provenance tag.
    pub fn push_provenance(&mut self, provenance: Provenance) {
        self.provenance.push(provenance);
    }

    /// Extend this entity to a longer span that fully contains it.
    ///
    /// Text and offsets are replaced, confidence is kept, `why` is appended
    /// to the provenance trail.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the new span does not contain the current one or is
    /// not strictly longer.
    pub fn extend_to(
        &mut self,
        text: impl Into<String>,
        start: usize,
        end: usize,
        why: Provenance,
    ) -> Result<()> {
        if !(start <= self.start && end >= self.end && end - start > self.len()) {
            return Err(Error::invalid_input(format!(
                "[{start}, {end}) does not strictly extend '{}' [{}, {})",
                self.text, self.start, self.end
            )));
        }
        let extended = Self::new(text, self.label, start, end, self.confidence, why)?;
        self.text = extended.text;
        self.start = extended.start;
        self.end = extended.end;
        self.canonical = extended.canonical;
        self.provenance.push(why);
        Ok(())
    }

    /// Derive a sub-mention (used when splitting) with the same label.
    ///
    /// # Errors
    ///
    /// Same as [`ExtractedEntity::new`].
    pub fn derive(
        &self,
        text: impl Into<String>,
        start: usize,
        end: usize,
        confidence: f64,
        provenance: Provenance,
    ) -> Result<Self> {
        Self::new(text, self.label, start, end, confidence, provenance)
    }
}

impl PartialEq for ExtractedEntity {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
            && self.label == other.label
            && self.start == other.start
            && self.end == other.end
    }
}

impl Eq for ExtractedEntity {}

impl Hash for ExtractedEntity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
        self.label.hash(state);
        self.start.hash(state);
        self.end.hash(state);
    }
}

impl fmt::Display for ExtractedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}..{} ({:.2}, {})",
            self.text,
            self.label,
            self.start,
            self.end,
            self.confidence,
            self.source_tag()
        )
    }
}

/// Half-open range overlap.
#[must_use]
pub const fn spans_overlap(a_start: usize, a_end: usize, b_start: usize, b_end: usize) -> bool {
    a_start < b_end && b_start < a_end
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

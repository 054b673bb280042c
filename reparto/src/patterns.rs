//! Pattern extension: titles, geographic prefixes and particle surnames.
//!
//! The tagger usually finds "Ramírez" but not "doctor Ramírez", and misses
//! "Monte Perdido" entirely. Three patterns fix that:
//!
//! | Pattern | Example | Label | Extends with | New entity |
//! |---------|---------|-------|--------------|------------|
//! | title + name | "doctor Ramírez" | PER | `Title` | 0.75, `TitlePattern` |
//! | prefix + name | "Monte Perdido" | LOC | `Prefix` | 0.75, `LocationPattern` |
//! | prefix + particle + name | "Sierra de Gredos" | LOC | `Compound` | 0.70, `LocationPattern` |
//! | name + particle + name | "Miguel de Unamuno" | PER | `CompoundPerson` | 0.70, `CompoundPersonPattern` |
//!
//! A match that fully contains a shorter entity of the same label extends
//! that entity in place, keeping its confidence. Otherwise a new entity is
//! created only where no occupied range is touched.
//!
//! # Precondition
//!
//! Runs after every detection stage (semantic, tagger, gazetteer) and
//! before coordinated splitting, so that extension sees the final set of
//! short mentions.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::annotation::AnnotatedDoc;
use crate::lexicon::{self, contains};
use crate::offset::SpanConverter;
use crate::spans::OccupiedRanges;
use crate::{EntityLabel, Error, ExtractedEntity, Provenance, Result};

const CAPITALIZED: &str = "[A-ZÁÉÍÓÚÑÜ][a-záéíóúñü]+";
const PARTICLE: &str = r"(?:de\s+los|de\s+las|de\s+la|del|de)";

/// Confidence of entities created by the title and prefix patterns.
pub const PATTERN_CONFIDENCE: f64 = 0.75;

/// Confidence of entities created by the particle patterns.
pub const COMPOUND_CONFIDENCE: f64 = 0.7;

static TITLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&term_then_names(lexicon::PROFESSIONAL_TITLES))
        .expect("TITLE_PATTERN regex is invalid")
});
static PREFIX_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&term_then_names(lexicon::LOCATION_PREFIXES))
        .expect("PREFIX_PATTERN regex is invalid")
});
static PREFIX_COMPOUND_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&term_particle_names(lexicon::LOCATION_PREFIXES))
        .expect("PREFIX_COMPOUND_PATTERN regex is invalid")
});
static COMPOUND_PERSON_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b({CAPITALIZED})\s+{PARTICLE}\s+{CAPITALIZED}(?:\s+{CAPITALIZED})?\b"
    ))
    .expect("COMPOUND_PERSON_PATTERN regex is invalid")
});

/// Alternation of `terms`, longest first so "subinspector" beats "inspector".
fn alternation(terms: &[&str]) -> String {
    let mut sorted: Vec<&str> = terms.to_vec();
    sorted.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
    sorted
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|")
}

/// `<term> <Name>( <Name>)?`, term case-insensitive, names capitalized.
fn term_then_names(terms: &[&str]) -> String {
    format!(
        r"(?i)\b(?:{})\s+(?-i:{CAPITALIZED})(?:\s+(?-i:{CAPITALIZED}))?\b",
        alternation(terms)
    )
}

/// `<term> de|del|de la|de los|de las <Name>( <Name>)?`.
fn term_particle_names(terms: &[&str]) -> String {
    format!(
        r"(?i)\b(?:{})\s+{PARTICLE}\s+(?-i:{CAPITALIZED})(?:\s+(?-i:{CAPITALIZED}))?\b",
        alternation(terms)
    )
}

/// What one run of the engine changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatternReport {
    pub extended: usize,
    pub created: usize,
    /// Same-label entities swallowed by an extension.
    pub absorbed: usize,
}

/// How a pattern applies its matches.
#[derive(Debug, Clone, Copy)]
struct PatternKind {
    name: &'static str,
    label: EntityLabel,
    extend_with: Provenance,
    create_with: Provenance,
    confidence: f64,
}

const TITLE: PatternKind = PatternKind {
    name: "title",
    label: EntityLabel::Per,
    extend_with: Provenance::Title,
    create_with: Provenance::TitlePattern,
    confidence: PATTERN_CONFIDENCE,
};
const PREFIX: PatternKind = PatternKind {
    name: "location prefix",
    label: EntityLabel::Loc,
    extend_with: Provenance::Prefix,
    create_with: Provenance::LocationPattern,
    confidence: PATTERN_CONFIDENCE,
};
const PREFIX_COMPOUND: PatternKind = PatternKind {
    name: "location compound",
    label: EntityLabel::Loc,
    extend_with: Provenance::Compound,
    create_with: Provenance::LocationPattern,
    confidence: COMPOUND_CONFIDENCE,
};
const COMPOUND_PERSON: PatternKind = PatternKind {
    name: "compound person",
    label: EntityLabel::Per,
    extend_with: Provenance::CompoundPerson,
    create_with: Provenance::CompoundPersonPattern,
    confidence: COMPOUND_CONFIDENCE,
};

/// Title, prefix and particle patterns over one document.
#[derive(Debug, Clone)]
pub struct PatternEngine {
    title: Regex,
    prefix: Regex,
    prefix_compound: Regex,
    surnames: Vec<String>,
    prefixes: Vec<String>,
}

impl Default for PatternEngine {
    fn default() -> Self {
        Self {
            title: TITLE_PATTERN.clone(),
            prefix: PREFIX_PATTERN.clone(),
            prefix_compound: PREFIX_COMPOUND_PATTERN.clone(),
            surnames: lexicon::COMMON_SURNAMES.iter().map(|s| s.to_string()).collect(),
            prefixes: lexicon::LOCATION_PREFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PatternEngine {
    /// Engine with the built-in Spanish vocabularies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with custom title and prefix vocabularies (lower-case).
    ///
    /// # Errors
    ///
    /// `Config` if a vocabulary is empty.
    pub fn with_vocabularies(titles: &[&str], prefixes: &[&str]) -> Result<Self> {
        if titles.is_empty() || prefixes.is_empty() {
            return Err(Error::config("pattern vocabularies must not be empty"));
        }
        let build = |pattern: String| {
            Regex::new(&pattern).map_err(|e| Error::config(format!("bad vocabulary: {e}")))
        };
        Ok(Self {
            title: build(term_then_names(titles))?,
            prefix: build(term_then_names(prefixes))?,
            prefix_compound: build(term_particle_names(prefixes))?,
            prefixes: prefixes.iter().map(|s| s.to_lowercase()).collect(),
            ..Self::default()
        })
    }

    /// Run every pattern over `doc`, extending or adding to `entities`.
    ///
    /// `occupied` must hold the ranges of `entities` (and anything else
    /// already claimed); it is kept in sync with every change.
    pub fn apply(
        &self,
        doc: &AnnotatedDoc,
        entities: &mut Vec<ExtractedEntity>,
        occupied: &mut OccupiedRanges,
    ) -> PatternReport {
        let text = doc.text.as_str();
        let converter = SpanConverter::new(text);
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        let mut report = PatternReport::default();

        for (re, kind) in [
            (&self.title, TITLE),
            (&self.prefix, PREFIX),
            (&self.prefix_compound, PREFIX_COMPOUND),
        ] {
            for m in re.find_iter(text) {
                let (start, end) = converter.chars(m.start(), m.end());
                if !seen.insert((start, end)) {
                    continue;
                }
                apply_match(m.as_str(), start, end, kind, entities, occupied, &mut report);
            }
        }

        for caps in COMPOUND_PERSON_PATTERN.captures_iter(text) {
            let (Some(whole), Some(first)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let (start, end) = converter.chars(whole.start(), whole.end());
            if seen.contains(&(start, end)) {
                continue;
            }
            if !self.is_person_head(doc, first.as_str(), start) {
                continue;
            }
            seen.insert((start, end));
            apply_match(
                whole.as_str(),
                start,
                end,
                COMPOUND_PERSON,
                entities,
                occupied,
                &mut report,
            );
        }

        if report.extended + report.created > 0 {
            log::debug!(
                "patterns: {} extended, {} created, {} absorbed",
                report.extended,
                report.created,
                report.absorbed
            );
        }
        report
    }

    /// First word of "X de Y" reads as a person: a known surname, a proper
    /// noun token, or inside a tagged person; never a geographic prefix.
    fn is_person_head(&self, doc: &AnnotatedDoc, word: &str, start: usize) -> bool {
        let lower = word.to_lowercase();
        if self.prefixes.iter().any(|p| *p == lower)
            || contains(lexicon::PROFESSIONAL_TITLES, &lower)
            || contains(lexicon::STOP_TITLES, &lower)
        {
            return false;
        }
        if self.surnames.iter().any(|s| *s == lower) {
            return true;
        }
        if doc
            .token_index_at(start)
            .is_some_and(|i| doc.tokens[i].is_proper_noun())
        {
            return true;
        }
        doc.entities
            .iter()
            .any(|s| s.label() == Some(EntityLabel::Per) && s.start <= start && start < s.end)
    }
}

fn apply_match(
    matched: &str,
    start: usize,
    end: usize,
    kind: PatternKind,
    entities: &mut Vec<ExtractedEntity>,
    occupied: &mut OccupiedRanges,
    report: &mut PatternReport,
) {
    let contained: Vec<usize> = entities
        .iter()
        .enumerate()
        .filter(|(_, e)| {
            e.label() == kind.label && e.is_within(start, end) && e.len() < end - start
        })
        .map(|(i, _)| i)
        .collect();

    if let Some((&first, rest)) = contained.split_first() {
        let old = entities[first].span();
        if let Err(e) = entities[first].extend_to(matched, start, end, kind.extend_with) {
            log::debug!("{} pattern could not extend '{matched}': {e}", kind.name);
            return;
        }
        let new = entities[first].span();
        occupied.replace(old, new);
        log::debug!("{} pattern extended to {}", kind.name, entities[first]);
        report.extended += 1;

        // later mentions inside the same span are now part of the extension
        for &i in rest.iter().rev() {
            let absorbed = entities.remove(i);
            occupied.remove(absorbed.start(), absorbed.end());
            occupied.insert(new.0, new.1);
            report.absorbed += 1;
        }
        return;
    }

    if occupied.overlaps(start, end) {
        return;
    }
    match ExtractedEntity::new(matched, kind.label, start, end, kind.confidence, kind.create_with) {
        Ok(entity) => {
            occupied.insert(entity.start(), entity.end());
            log::debug!("{} pattern created {entity}", kind.name);
            entities.push(entity);
            report.created += 1;
        }
        Err(e) => log::debug!("{} pattern match '{matched}' rejected: {e}", kind.name),
    }
}

//! Non-narrative zones: headings, metadata labels, lists.
//!
//! Entities found on such lines are almost always false positives
//! ("CAPÍTULO PRIMERO", "Personaje: Aldara").

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};

/// Headings, matched ignoring case.
static HEADING_LINES: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)^#{1,6}\s+",
        r"(?i)^(CAPÍTULO|CAPITULO|CAP\.?)\s*[\dIVXLCDM]+\b",
        r"(?i)^(CHAPTER|Cap[íi]tulo)\s+[\dIVXLCDM]+\b",
        r"(?i)^(PARTE|SECCIÓN|SECCION|BOOK|LIBRO)\s+[\dIVXLCDM]+\b",
        r"(?i)^(PRIMERA|SEGUNDA|TERCERA|CUARTA|QUINTA)\s+(PARTE|SECCION)",
        r"(?i)^(PRÓLOGO|PROLOGO|EPÍLOGO|EPILOGO|PROLOGUE|EPILOGUE)\s*$",
        r"(?i)^[IVXLCDM]+\s*\.?\s*$",
        r"^\d{1,3}\s*\.?\s*$",
        // upper-case titles only; a lower-case line of plain words is prose
        r"^[A-ZÁÉÍÓÚÑÜ\s\-:]{10,60}$",
    ])
    .expect("HEADING_LINES regex set is invalid")
});

/// Metadata labels and list markers, matched ignoring case.
static METADATA_LINES: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)^(Nombre|Edad|Profesión|Descripción|Personaje|Atributo|Tipo|Género)\s*:",
        r"(?i)^(Ojos|Cabello|Pelo|Estatura|Altura|Peso|Complexión)\s*:",
        r"(?i)^(PERSONAJES?|LUGARES?|ORGANIZACIONES?|EVENTOS?|TIMELINE)\s*:?\s*$",
        r"(?i)^(Lista de|Resumen de|Índice de)\s+",
        r"(?i)^[-•*]\s+[A-ZÁÉÍÓÚ]",
        r"(?i)^\d+\.\s+[A-ZÁÉÍÓÚ]",
        r"(?i)^(ERRORES?\s+GRAMATICALES?|Errores?\s+de\s+concordancia)",
        r"(?i)^(DEQUEÍSMO|QUEÍSMO|LAÍSMO|LEÍSMO)\s*:?\s*$",
        r"(?i)^(NOTA|NOTE|AVISO|IMPORTANTE|TODO|FIXME)\s*:",
        r".*/.+",
    ])
    .expect("METADATA_LINES regex set is invalid")
});

/// Lines under this many chars written in capitals are titles.
const SHORT_CAPS_LINE: usize = 50;

/// An entity this close to the start of its line counts as line-initial.
const LINE_START_SLACK: usize = 3;

/// True if `s` has a cased letter and no lower-case one.
fn is_all_caps(s: &str) -> bool {
    s.chars().any(char::is_uppercase) && !s.chars().any(char::is_lowercase)
}

/// True for headings, metadata, list items and blank lines.
#[must_use]
pub fn is_non_narrative_line(line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return true;
    }
    if line.chars().count() < SHORT_CAPS_LINE && is_all_caps(line) {
        return true;
    }
    HEADING_LINES.is_match(line) || METADATA_LINES.is_match(line)
}

/// Byte bounds of the line containing byte `at`.
fn line_bounds(text: &str, at: usize) -> (usize, usize) {
    let start = text[..at].rfind('\n').map_or(0, |i| i + 1);
    let end = text[at..].find('\n').map_or(text.len(), |i| at + i);
    (start, end)
}

/// The line containing char `position`, and whether `position` is within
/// three chars of the line start. Out-of-range positions give `("", false)`.
#[must_use]
pub fn line_at(text: &str, position: usize) -> (&str, bool) {
    let Some((byte, _)) = text.char_indices().nth(position) else {
        return ("", false);
    };
    let (start, end) = line_bounds(text, byte);
    let is_line_start = text[start..byte].chars().count() < LINE_START_SLACK;
    (&text[start..end], is_line_start)
}

/// Share of the whole-word, case-insensitive occurrences of `name` that sit
/// on narrative lines. 1.0 when `name` never occurs.
#[must_use]
pub fn narrative_share(name: &str, text: &str) -> f64 {
    let Ok(re) = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(name))) else {
        return 1.0;
    };
    let mut total = 0usize;
    let mut narrative = 0usize;
    for m in re.find_iter(text) {
        total += 1;
        let (start, end) = line_bounds(text, m.start());
        if !is_non_narrative_line(&text[start..end]) {
            narrative += 1;
        }
    }
    if total == 0 {
        1.0
    } else {
        narrative as f64 / total as f64
    }
}

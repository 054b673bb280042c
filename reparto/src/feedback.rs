//! User and project feedback consulted by the validator.
//!
//! Three levels, checked in priority order:
//!
//! | Level     | Scope                  | Effect                         |
//! |-----------|------------------------|--------------------------------|
//! | `project` | one project            | force-include or reject        |
//! | `user`    | every project          | reject                         |
//! | `system`  | built-in patterns      | reject (patterns can be muted) |
//!
//! Names are keyed by [`canonical_form`]. Storage is the caller's concern;
//! [`InMemoryFeedbackStore`] is serde-loadable for tests and the CLI.

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::{canonical_form, EntityLabel, Error, Result};

/// What a project override does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideAction {
    Reject,
    ForceInclude,
}

/// Project-scoped decision about one name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectOverride {
    #[serde(default)]
    pub id: u64,
    pub project: String,
    pub name: String,
    /// Applies to every label when absent.
    #[serde(default)]
    pub label: Option<EntityLabel>,
    pub action: OverrideAction,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Global rejection of one name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRejection {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub label: Option<EntityLabel>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// How a [`SystemPattern`] is compared with a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Exact,
    /// Anchored at the start of the name.
    Regex,
    StartsWith,
    EndsWith,
    Contains,
}

/// Built-in false-positive pattern. Matching ignores case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemPattern {
    pub id: u64,
    pub pattern: String,
    pub kind: PatternKind,
    #[serde(default)]
    pub label: Option<EntityLabel>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "active_by_default")]
    pub active: bool,
    #[serde(skip)]
    compiled: OnceCell<Option<Regex>>,
}

fn active_by_default() -> bool {
    true
}

impl SystemPattern {
    #[must_use]
    pub fn new(id: u64, pattern: impl Into<String>, kind: PatternKind) -> Self {
        Self {
            id,
            pattern: pattern.into(),
            kind,
            label: None,
            category: None,
            description: None,
            active: true,
            compiled: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: EntityLabel) -> Self {
        self.label = Some(label);
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: &str, description: &str) -> Self {
        self.category = Some(category.to_string());
        self.description = Some(description.to_string());
        self
    }

    /// Whether this pattern applies to entities labelled `label`.
    #[must_use]
    pub fn applies_to(&self, label: Option<EntityLabel>) -> bool {
        self.label.is_none() || self.label == label
    }

    /// Case-insensitive match against the trimmed `name`.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        let text = name.trim().to_lowercase();
        let pat = self.pattern.to_lowercase();
        match self.kind {
            PatternKind::Exact => text == pat,
            PatternKind::StartsWith => text.starts_with(&pat),
            PatternKind::EndsWith => text.ends_with(&pat),
            PatternKind::Contains => text.contains(&pat),
            PatternKind::Regex => self
                .compiled
                .get_or_init(|| {
                    Regex::new(&format!("(?i)^(?:{})", self.pattern))
                        .map_err(|e| log::warn!("invalid system pattern {}: {e}", self.id))
                        .ok()
                })
                .as_ref()
                .is_some_and(|re| re.is_match(name.trim())),
        }
    }
}

/// Which level produced a [`FilterDecision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterLevel {
    Project,
    User,
    System,
    None,
}

impl FilterLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::User => "user",
            Self::System => "system",
            Self::None => "none",
        }
    }
}

impl fmt::Display for FilterLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`FeedbackStore::decide`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterDecision {
    pub should_filter: bool,
    pub reason: String,
    pub level: FilterLevel,
    pub rule_id: Option<u64>,
}

impl FilterDecision {
    /// A project override forcing inclusion.
    #[must_use]
    pub fn is_forced_include(&self) -> bool {
        self.level == FilterLevel::Project && !self.should_filter
    }
}

/// Source of feedback. Lookups take a canonical name.
pub trait FeedbackStore: Send + Sync {
    fn project_override(
        &self,
        project: &str,
        canonical: &str,
        label: Option<EntityLabel>,
    ) -> Option<ProjectOverride>;

    fn user_rejection(&self, canonical: &str, label: Option<EntityLabel>) -> Option<UserRejection>;

    fn system_patterns(&self) -> &[SystemPattern];

    /// Combine the three levels: project, then user, then system.
    fn decide(
        &self,
        name: &str,
        label: Option<EntityLabel>,
        project: Option<&str>,
    ) -> FilterDecision {
        let canonical = canonical_form(name);
        let why = |reason: &Option<String>| reason.clone().unwrap_or_else(|| "no reason".into());

        if let Some(project) = project {
            if let Some(o) = self.project_override(project, &canonical, label) {
                let (should_filter, verb) = match o.action {
                    OverrideAction::ForceInclude => (false, "forced include"),
                    OverrideAction::Reject => (true, "rejected"),
                };
                return FilterDecision {
                    should_filter,
                    reason: format!("{verb} in project: {}", why(&o.reason)),
                    level: FilterLevel::Project,
                    rule_id: Some(o.id),
                };
            }
        }

        if let Some(r) = self.user_rejection(&canonical, label) {
            return FilterDecision {
                should_filter: true,
                reason: format!("rejected globally: {}", why(&r.reason)),
                level: FilterLevel::User,
                rule_id: Some(r.id),
            };
        }

        // label-specific patterns take precedence over generic ones
        let patterns = self.system_patterns();
        let candidates = patterns
            .iter()
            .filter(|p| p.active && p.label.is_some() && p.applies_to(label))
            .chain(patterns.iter().filter(|p| p.active && p.label.is_none()));
        for p in candidates {
            if p.matches(name) {
                return FilterDecision {
                    should_filter: true,
                    reason: format!(
                        "system pattern: {}",
                        p.description.as_deref().unwrap_or(&p.pattern)
                    ),
                    level: FilterLevel::System,
                    rule_id: Some(p.id),
                };
            }
        }

        FilterDecision {
            should_filter: false,
            reason: "no filter matched".into(),
            level: FilterLevel::None,
            rule_id: None,
        }
    }
}

/// Built-in Spanish patterns.
#[must_use]
pub fn builtin_patterns() -> Vec<SystemPattern> {
    use PatternKind::{Exact, Regex, StartsWith};

    let rows: &[(&str, PatternKind, Option<EntityLabel>, &str, &str)] = &[
        ("Al día siguiente", Exact, None, "temporal", "common temporal expression"),
        ("Al cabo de", StartsWith, None, "temporal", "duration expression"),
        ("Hace tiempo", Exact, None, "temporal", "vague temporal expression"),
        ("Aquella noche", Exact, None, "temporal", "demonstrative temporal expression"),
        ("Aquella mañana", Exact, None, "temporal", "demonstrative temporal expression"),
        ("Aquel día", Exact, None, "temporal", "demonstrative temporal expression"),
        ("En ese momento", Exact, None, "temporal", "temporal expression"),
        ("En aquel momento", Exact, None, "temporal", "temporal expression"),
        ("Mientras tanto", Exact, None, "temporal", "temporal expression"),
        ("Por aquel entonces", Exact, None, "temporal", "temporal expression"),
        ("Un rato después", Exact, None, "temporal", "temporal expression"),
        ("Poco después", Exact, None, "temporal", "temporal expression"),
        ("Mucho después", Exact, None, "temporal", "temporal expression"),
        ("Horas después", Exact, None, "temporal", "temporal expression"),
        ("Días después", Exact, None, "temporal", "temporal expression"),
        ("Semanas después", Exact, None, "temporal", "temporal expression"),
        ("Meses después", Exact, None, "temporal", "temporal expression"),
        ("Años después", Exact, None, "temporal", "temporal expression"),
        ("El", Exact, None, "article", "definite article"),
        ("La", Exact, None, "article", "definite article"),
        ("Los", Exact, None, "article", "definite article"),
        ("Las", Exact, None, "article", "definite article"),
        ("Un", Exact, None, "article", "indefinite article"),
        ("Una", Exact, None, "article", "indefinite article"),
        ("Unos", Exact, None, "article", "indefinite article"),
        ("Unas", Exact, None, "article", "indefinite article"),
        ("Él", Exact, None, "pronoun", "personal pronoun"),
        ("Ella", Exact, None, "pronoun", "personal pronoun"),
        ("Ellos", Exact, None, "pronoun", "personal pronoun"),
        ("Ellas", Exact, None, "pronoun", "personal pronoun"),
        ("Alguien", Exact, None, "pronoun", "indefinite pronoun"),
        ("Nadie", Exact, None, "pronoun", "indefinite pronoun"),
        ("Algo", Exact, None, "pronoun", "indefinite pronoun"),
        ("Nada", Exact, None, "pronoun", "indefinite pronoun"),
        ("Todo", Exact, None, "pronoun", "indefinite pronoun"),
        ("Todos", Exact, None, "pronoun", "indefinite pronoun"),
        ("Sin embargo", Exact, None, "connector", "adversative connector"),
        ("No obstante", Exact, None, "connector", "adversative connector"),
        ("Por lo tanto", Exact, None, "connector", "consecutive connector"),
        ("Además", Exact, None, "connector", "additive connector"),
        ("Por otra parte", Exact, None, "connector", "connector"),
        ("En cambio", Exact, None, "connector", "connector"),
        (r"\d+$", Regex, None, "numeric", "digits only"),
        (r"\d+[.,]\d+$", Regex, None, "numeric", "decimal number"),
        (
            r"\d+\s*(años|meses|días|horas|minutos|segundos)$",
            Regex,
            None,
            "numeric",
            "time quantity",
        ),
        ("La casa", Exact, Some(EntityLabel::Loc), "generic_location", "generic place"),
        ("El edificio", Exact, Some(EntityLabel::Loc), "generic_location", "generic place"),
        ("La habitación", Exact, Some(EntityLabel::Loc), "generic_location", "generic place"),
        ("El cuarto", Exact, Some(EntityLabel::Loc), "generic_location", "generic place"),
        ("La cocina", Exact, Some(EntityLabel::Loc), "generic_location", "generic place"),
        ("El salón", Exact, Some(EntityLabel::Loc), "generic_location", "generic place"),
        ("La calle", Exact, Some(EntityLabel::Loc), "generic_location", "generic place"),
        ("El tiempo", Exact, Some(EntityLabel::Misc), "generic_concept", "abstract concept"),
        ("La vida", Exact, Some(EntityLabel::Misc), "generic_concept", "abstract concept"),
        ("El amor", Exact, Some(EntityLabel::Misc), "generic_concept", "abstract concept"),
        ("La muerte", Exact, Some(EntityLabel::Misc), "generic_concept", "abstract concept"),
        ("El mundo", Exact, Some(EntityLabel::Misc), "generic_concept", "abstract concept"),
    ];

    rows.iter()
        .zip(1u64..)
        .map(|(&(pattern, kind, label, category, description), id)| {
            let p = SystemPattern::new(id, pattern, kind).with_category(category, description);
            match label {
                Some(l) => p.with_label(l),
                None => p,
            }
        })
        .collect()
}

/// Feedback held in memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InMemoryFeedbackStore {
    #[serde(default)]
    overrides: Vec<ProjectOverride>,
    #[serde(default)]
    rejections: Vec<UserRejection>,
    #[serde(default = "builtin_patterns")]
    patterns: Vec<SystemPattern>,
}

impl Default for InMemoryFeedbackStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryFeedbackStore {
    /// Empty store with the built-in system patterns.
    #[must_use]
    pub fn new() -> Self {
        Self {
            overrides: Vec::new(),
            rejections: Vec::new(),
            patterns: builtin_patterns(),
        }
    }

    /// Empty store without any system pattern.
    #[must_use]
    pub fn without_patterns() -> Self {
        Self {
            patterns: Vec::new(),
            ..Self::new()
        }
    }

    /// Parse a JSON store. Missing `patterns` means the built-in set.
    ///
    /// # Errors
    ///
    /// `Json` if the document does not match.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON store from disk.
    ///
    /// # Errors
    ///
    /// `Io` or `Json`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// # Errors
    ///
    /// `Json` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn next_id(&self) -> u64 {
        self.overrides
            .iter()
            .map(|o| o.id)
            .chain(self.rejections.iter().map(|r| r.id))
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Add (or replace) a project override; returns its id.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `name` has no canonical form.
    pub fn add_project_override(
        &mut self,
        project: &str,
        name: &str,
        action: OverrideAction,
        label: Option<EntityLabel>,
        reason: Option<&str>,
    ) -> Result<u64> {
        let canonical = canonical_form(name);
        if canonical.is_empty() {
            return Err(Error::invalid_input("override name is empty"));
        }
        self.remove_project_override(project, name, label);
        let id = self.next_id();
        self.overrides.push(ProjectOverride {
            id,
            project: project.to_string(),
            name: canonical,
            label,
            action,
            reason: reason.map(str::to_string),
        });
        Ok(id)
    }

    pub fn remove_project_override(
        &mut self,
        project: &str,
        name: &str,
        label: Option<EntityLabel>,
    ) -> bool {
        let canonical = canonical_form(name);
        let before = self.overrides.len();
        self.overrides.retain(|o| {
            !(o.project == project && canonical_form(&o.name) == canonical && o.label == label)
        });
        self.overrides.len() != before
    }

    /// Reject `name` in every project; returns the rule id.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `name` has no canonical form.
    pub fn add_user_rejection(
        &mut self,
        name: &str,
        label: Option<EntityLabel>,
        reason: Option<&str>,
    ) -> Result<u64> {
        let canonical = canonical_form(name);
        if canonical.is_empty() {
            return Err(Error::invalid_input("rejection name is empty"));
        }
        self.remove_user_rejection(name, label);
        let id = self.next_id();
        self.rejections.push(UserRejection {
            id,
            name: canonical,
            label,
            reason: reason.map(str::to_string),
        });
        Ok(id)
    }

    pub fn remove_user_rejection(&mut self, name: &str, label: Option<EntityLabel>) -> bool {
        let canonical = canonical_form(name);
        let before = self.rejections.len();
        self.rejections
            .retain(|r| !(canonical_form(&r.name) == canonical && r.label == label));
        self.rejections.len() != before
    }

    /// Mute or unmute a system pattern.
    pub fn set_pattern_active(&mut self, id: u64, active: bool) -> bool {
        match self.patterns.iter_mut().find(|p| p.id == id) {
            Some(p) => {
                p.active = active;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn project_overrides(&self, project: &str) -> Vec<&ProjectOverride> {
        self.overrides.iter().filter(|o| o.project == project).collect()
    }

    #[must_use]
    pub fn user_rejections(&self) -> &[UserRejection] {
        &self.rejections
    }
}

/// The label-specific match if any, else the label-free one.
fn best_match<'a, T>(
    items: impl Iterator<Item = &'a T>,
    label_of: impl Fn(&T) -> Option<EntityLabel>,
    label: Option<EntityLabel>,
) -> Option<&'a T>
where
    T: 'a,
{
    let mut generic = None;
    for item in items {
        match label_of(item) {
            Some(l) if Some(l) == label => return Some(item),
            None if generic.is_none() => generic = Some(item),
            _ => {}
        }
    }
    generic
}

impl FeedbackStore for InMemoryFeedbackStore {
    fn project_override(
        &self,
        project: &str,
        canonical: &str,
        label: Option<EntityLabel>,
    ) -> Option<ProjectOverride> {
        best_match(
            self.overrides
                .iter()
                .filter(|o| o.project == project && canonical_form(&o.name) == canonical),
            |o| o.label,
            label,
        )
        .cloned()
    }

    fn user_rejection(&self, canonical: &str, label: Option<EntityLabel>) -> Option<UserRejection> {
        best_match(
            self.rejections
                .iter()
                .filter(|r| canonical_form(&r.name) == canonical),
            |r| r.label,
            label,
        )
        .cloned()
    }

    fn system_patterns(&self) -> &[SystemPattern] {
        &self.patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_feedback() {
        let store = InMemoryFeedbackStore::new();
        let d = store.decide("Aldara", Some(EntityLabel::Per), Some("p1"));
        assert!(!d.should_filter);
        assert_eq!(d.level, FilterLevel::None);
        assert_eq!(d.rule_id, None);
    }

    #[test]
    fn test_project_beats_user_and_system() {
        let mut store = InMemoryFeedbackStore::new();
        store.add_user_rejection("Nadie", None, Some("ruido")).unwrap();
        let id = store
            .add_project_override("p1", "nadie", OverrideAction::ForceInclude, None, None)
            .unwrap();
        let d = store.decide("Nadie", Some(EntityLabel::Per), Some("p1"));
        assert!(d.is_forced_include());
        assert_eq!(d.rule_id, Some(id));

        // another project only sees the user rejection
        let d = store.decide("Nadie", Some(EntityLabel::Per), Some("p2"));
        assert!(d.should_filter);
        assert_eq!(d.level, FilterLevel::User);
        assert!(d.reason.contains("ruido"));

        // without a user rejection the system pattern fires
        store.remove_user_rejection("NADIE", None);
        let d = store.decide("Nadie", Some(EntityLabel::Per), None);
        assert_eq!(d.level, FilterLevel::System);
    }

    #[test]
    fn test_project_reject() {
        let mut store = InMemoryFeedbackStore::without_patterns();
        store
            .add_project_override("p1", "Brais", OverrideAction::Reject, None, Some("typo"))
            .unwrap();
        let d = store.decide("  Bráis ", Some(EntityLabel::Per), Some("p1"));
        assert!(d.should_filter);
        assert_eq!(d.level, FilterLevel::Project);
        assert_eq!(d.reason, "rejected in project: typo");
    }

    #[test]
    fn test_label_specific_override_preferred() {
        let mut store = InMemoryFeedbackStore::without_patterns();
        store
            .add_project_override("p", "Sol", OverrideAction::Reject, None, None)
            .unwrap();
        store
            .add_project_override(
                "p",
                "Sol",
                OverrideAction::ForceInclude,
                Some(EntityLabel::Per),
                None,
            )
            .unwrap();
        assert!(!store.decide("Sol", Some(EntityLabel::Per), Some("p")).should_filter);
        assert!(store.decide("Sol", Some(EntityLabel::Loc), Some("p")).should_filter);
    }

    #[test]
    fn test_user_rejection_label_scope() {
        let mut store = InMemoryFeedbackStore::without_patterns();
        store
            .add_user_rejection("Mercedes", Some(EntityLabel::Org), None)
            .unwrap();
        assert!(store.decide("Mercedes", Some(EntityLabel::Org), None).should_filter);
        assert!(!store.decide("Mercedes", Some(EntityLabel::Per), None).should_filter);
    }

    #[test]
    fn test_pattern_kinds() {
        let exact = SystemPattern::new(1, "La casa", PatternKind::Exact);
        assert!(exact.matches("la CASA"));
        assert!(!exact.matches("La casa azul"));
        let starts = SystemPattern::new(2, "Al cabo de", PatternKind::StartsWith);
        assert!(starts.matches("al cabo de un rato"));
        assert!(SystemPattern::new(3, "ción", PatternKind::EndsWith).matches("La Estación"));
        assert!(SystemPattern::new(4, "casa", PatternKind::Contains).matches("Mi Casa Blanca"));
        let re = SystemPattern::new(5, r"\d+$", PatternKind::Regex);
        assert!(re.matches("1984"));
        assert!(!re.matches("Año 1984"));
        let bad = SystemPattern::new(6, r"(", PatternKind::Regex);
        assert!(!bad.matches("("));
    }

    #[test]
    fn test_builtin_label_scoped_patterns() {
        let store = InMemoryFeedbackStore::new();
        assert!(store.decide("La cocina", Some(EntityLabel::Loc), None).should_filter);
        assert!(!store.decide("La cocina", Some(EntityLabel::Org), None).should_filter);
        assert!(store.decide("12 años", Some(EntityLabel::Misc), None).should_filter);
        assert!(store.decide("Sin embargo", None, None).should_filter);
    }

    #[test]
    fn test_muted_pattern() {
        let mut store = InMemoryFeedbackStore::new();
        let id = store
            .system_patterns()
            .iter()
            .find(|p| p.pattern == "Ella")
            .map(|p| p.id)
            .unwrap();
        assert!(store.set_pattern_active(id, false));
        assert!(!store.decide("Ella", Some(EntityLabel::Per), None).should_filter);
        assert!(!store.set_pattern_active(9999, false));
    }

    #[test]
    fn test_json_roundtrip_and_defaults() {
        let store = InMemoryFeedbackStore::from_json(
            r#"{"overrides": [{"project": "p", "name": "Hola", "action": "force_include"}]}"#,
        )
        .unwrap();
        assert!(store.decide("Hola", None, Some("p")).is_forced_include());
        assert!(!store.system_patterns().is_empty());

        let again = InMemoryFeedbackStore::from_json(&store.to_json().unwrap()).unwrap();
        assert_eq!(again.project_overrides("p").len(), 1);
        assert!(InMemoryFeedbackStore::from_json("{\"overrides\": 3}").is_err());
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut store = InMemoryFeedbackStore::new();
        assert!(store.add_user_rejection("  ", None, None).is_err());
    }
}

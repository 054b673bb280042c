//! Pipeline configuration.
//!
//! Every threshold the pipeline uses lives here so that a corpus with unusual
//! conventions can be tuned from a TOML file instead of a rebuild.
//!
//! ```toml
//! gazetteer_capacity = 2000
//! enable_semantic_verification = false
//!
//! [validator]
//! threshold = 0.5
//!
//! [validator.weights]
//! morphology = 0.25
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Error, Result};

/// Top-level pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum gazetteer entries before learning stops.
    pub gazetteer_capacity: usize,
    /// Minimum entity length in characters.
    pub min_entity_length: usize,
    /// Confidence assigned to statistical tagger spans.
    pub tagger_confidence: f64,
    /// Confidence assigned to gazetteer re-detections.
    pub gazetteer_confidence: f64,
    /// Confidence for fragments recovered from spans merged across lines.
    pub malformed_split_confidence: f64,
    /// Characters of the document sent to the semantic preprocessor.
    pub semantic_sample_chars: usize,
    /// Confidence assigned to semantic preprocessor entities.
    pub semantic_confidence: f64,
    /// Entities scoring below this are sent to the semantic verifier.
    pub verification_threshold: f64,
    /// Maximum entities per verification request.
    pub verification_batch: usize,
    /// Characters of context either side of a span for morphology and verification.
    pub context_window: usize,
    pub enable_gazetteer: bool,
    pub enable_patterns: bool,
    pub enable_splitting: bool,
    pub enable_validation: bool,
    pub enable_voting: bool,
    pub enable_semantic_preprocessing: bool,
    pub enable_semantic_verification: bool,
    /// Validator settings.
    pub validator: ValidatorConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            gazetteer_capacity: 5000,
            min_entity_length: 2,
            tagger_confidence: 0.8,
            gazetteer_confidence: 0.6,
            malformed_split_confidence: 0.7,
            semantic_sample_chars: 4000,
            semantic_confidence: 0.85,
            verification_threshold: 0.7,
            verification_batch: 20,
            context_window: 100,
            enable_gazetteer: true,
            enable_patterns: true,
            enable_splitting: true,
            enable_validation: true,
            enable_voting: true,
            enable_semantic_preprocessing: true,
            enable_semantic_verification: true,
            validator: ValidatorConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// `Config` if the TOML is malformed or a value is out of range.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(s).map_err(|e| Error::config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, `Config` as for [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Serialize to TOML.
    ///
    /// # Errors
    ///
    /// `Config` if serialization fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::config(format!("failed to serialize config: {e}")))
    }

    /// Check ranges.
    ///
    /// # Errors
    ///
    /// `Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.gazetteer_capacity == 0 {
            return Err(Error::config("gazetteer_capacity must be > 0"));
        }
        if self.verification_batch == 0 {
            return Err(Error::config("verification_batch must be > 0"));
        }
        for (name, v) in [
            ("tagger_confidence", self.tagger_confidence),
            ("gazetteer_confidence", self.gazetteer_confidence),
            ("malformed_split_confidence", self.malformed_split_confidence),
            ("semantic_confidence", self.semantic_confidence),
            ("verification_threshold", self.verification_threshold),
        ] {
            check_unit(name, v)?;
        }
        self.validator.validate()
    }
}

/// Weighted-heuristic validator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Minimum blended score to accept.
    pub threshold: f64,
    /// Lower edge of the band sent to semantic validation.
    pub borderline_low: f64,
    /// Upper edge of the band sent to semantic validation.
    pub borderline_high: f64,
    /// Entities per semantic validation request.
    pub semantic_batch: usize,
    /// Use annotation morphology in the morphology sub-score.
    pub use_morphology: bool,
    pub weights: ScoreWeights,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            threshold: 0.4,
            borderline_low: 0.3,
            borderline_high: 0.7,
            semantic_batch: 20,
            use_morphology: true,
            weights: ScoreWeights::default(),
        }
    }
}

impl ValidatorConfig {
    /// Check ranges.
    ///
    /// # Errors
    ///
    /// `Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        check_unit("validator.threshold", self.threshold)?;
        check_unit("validator.borderline_low", self.borderline_low)?;
        check_unit("validator.borderline_high", self.borderline_high)?;
        if self.borderline_low > self.borderline_high {
            return Err(Error::config(
                "validator.borderline_low must not exceed borderline_high",
            ));
        }
        if self.semantic_batch == 0 {
            return Err(Error::config("validator.semantic_batch must be > 0"));
        }
        self.weights.validate()
    }
}

/// Weights of the heuristic sub-scores. They need not sum to 1; the score is
/// normalized by their total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub frequency: f64,
    pub capitalization: f64,
    pub position: f64,
    pub length: f64,
    pub no_article: f64,
    pub not_common: f64,
    pub morphology: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            frequency: 0.15,
            capitalization: 0.15,
            position: 0.10,
            length: 0.10,
            no_article: 0.15,
            not_common: 0.15,
            morphology: 0.20,
        }
    }
}

impl ScoreWeights {
    /// Sum of all weights.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.frequency
            + self.capitalization
            + self.position
            + self.length
            + self.no_article
            + self.not_common
            + self.morphology
    }

    fn validate(&self) -> Result<()> {
        for (name, w) in [
            ("frequency", self.frequency),
            ("capitalization", self.capitalization),
            ("position", self.position),
            ("length", self.length),
            ("no_article", self.no_article),
            ("not_common", self.not_common),
            ("morphology", self.morphology),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(Error::config(format!(
                    "validator.weights.{name} must be a non-negative number, got {w}"
                )));
            }
        }
        if self.total() <= 0.0 {
            return Err(Error::config("validator.weights must not all be zero"));
        }
        Ok(())
    }
}

fn check_unit(name: &str, v: f64) -> Result<()> {
    if (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(Error::config(format!("{name} must be in [0, 1], got {v}")))
    }
}

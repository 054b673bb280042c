//! # reparto
//!
//! Entity extraction and validation for Spanish narrative fiction.
//!
//! - **Detection**: statistical tagger spans ([`annotation`]), a self-learning
//!   [`Gazetteer`], title/place/particle [`patterns`], optional [`semantic`]
//!   preprocessing
//! - **Cleanup**: coordinated-name [`splitter`], false-positive [`filter`],
//!   MISC post-processing
//! - **Validation**: layered [`validator`] with user [`feedback`] and
//!   non-narrative [`zones`]
//! - **Orchestration**: [`Pipeline`] producing an [`ExtractionOutcome`]
//!
//! Core types (`ExtractedEntity`, `EntityLabel`, errors) live in
//! `reparto-core` and are re-exported here. Offsets are character offsets.
//!
//! ```rust
//! use reparto::annotation::MockAnnotator;
//! use reparto::{EntityLabel, Pipeline};
//!
//! let engine = MockAnnotator::new().with_entity("Ramírez", "PER");
//! let outcome = Pipeline::new(engine).extract("El doctor Ramírez llegó temprano.", None);
//! assert_eq!(outcome.entities[0].text(), "doctor Ramírez");
//! assert_eq!(outcome.entities[0].label(), EntityLabel::Per);
//! ```

pub mod annotation;
pub mod config;
pub mod feedback;
pub mod filter;
pub mod gazetteer;
pub mod lexicon;
pub mod offset;
pub mod outcome;
pub mod patterns;
pub mod pipeline;
pub mod semantic;
pub mod spans;
pub mod splitter;
pub mod sync;
pub mod validator;
pub mod zones;

pub use reparto_core::{
    canonical_form, is_boundary_punct, spans_overlap, EntityLabel, Error, ExtractedEntity,
    Provenance, Result, BOUNDARY_PUNCT,
};

pub use annotation::{AnnotatedDoc, AnnotationEngine, PreAnnotated};
pub use config::{PipelineConfig, ScoreWeights, ValidatorConfig};
pub use feedback::{FeedbackStore, FilterDecision, InMemoryFeedbackStore};
pub use filter::FalsePositiveFilter;
pub use gazetteer::Gazetteer;
pub use outcome::{Diagnostics, ExtractionOutcome, Phase};
pub use patterns::PatternEngine;
pub use pipeline::{ExtractionError, Pipeline, PipelineBuilder, Severity};
pub use semantic::SemanticModel;
pub use spans::OccupiedRanges;
pub use splitter::CoordinationSplitter;
pub use validator::{EntityValidator, RejectedEntity, ValidationResult, ValidationScore};

//! # reparto-core
//!
//! Core types shared by the reparto crates.
//!
//! - **Entity model**: [`ExtractedEntity`], [`EntityLabel`], [`Provenance`]
//! - **Normalization**: [`canonical_form`], [`BOUNDARY_PUNCT`]
//! - **Errors**: [`Error`], [`Result`]
//!
//! Offsets everywhere in reparto are character offsets, not bytes.

pub mod entity;
pub mod error;

pub use entity::{
    canonical_form, is_boundary_punct, spans_overlap, EntityLabel, ExtractedEntity, Provenance,
    BOUNDARY_PUNCT,
};
pub use error::{Error, Result};

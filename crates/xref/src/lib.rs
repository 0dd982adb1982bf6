//! Free-text correlation and cross-referencing against a defensive taxonomy.
//!
//! This crate provides:
//! - Technique id extraction from unstructured text
//! - The offline id-to-taxonomy-name table
//! - Remote taxonomy detail fetch behind the [`DetailSource`] trait
//! - Batch resolution of ids to records and defence suggestions
//! - A shared technique frequency tally

pub mod detail;
pub mod extract;
pub mod resolver;
pub mod tally;
pub mod taxonomy;

pub use detail::{normalize_name, DetailError, DetailSource, HttpDetailSource, TaxonomyDetail};
pub use extract::{extract_ids, extract_unique_ids};
pub use resolver::{BatchResolution, CrossReferenceResolver, DefenseOutcome, DefenseSuggestion};
pub use tally::{TallyEntry, TallySummary, TechniqueTally};
pub use taxonomy::{TaxonomyError, TaxonomyTable};

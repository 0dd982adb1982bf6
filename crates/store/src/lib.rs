//! In-memory multi-domain knowledge-base store.
//!
//! This crate provides:
//! - A conjunctive predicate engine over typed records, including
//!   same-element joins on nested list fields
//! - Per-domain stores loaded once from STIX bundles and shared read-only
//! - A registry that fans queries out across domains in load order
//! - Technique, software, content, platform, tactic and external-id helpers

pub mod error;
pub mod filter;
mod loader;
pub mod queries;
pub mod registry;
pub mod store;

pub use error::QueryError;
pub use filter::{Filter, Operator, Predicate};
pub use queries::{ExternalIdMatch, TechniqueScope};
pub use registry::{DomainLoadReport, LoadStatus, StoreRegistry};
pub use store::{DomainStore, StoreStats};

//! Cross-reference resolution: external ids to records, records to the
//! defensive taxonomy, taxonomy names to remote detail.

use std::collections::HashSet;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Serialize, Serializer};
use strix_store::{ExternalIdMatch, StoreRegistry};
use tracing::{debug, info, warn};

use crate::detail::{normalize_name, DetailError, DetailSource, TaxonomyDetail};
use crate::taxonomy::TaxonomyTable;

/// Outcome of a batch lookup. Misses are reported, never fatal.
#[derive(Debug, Serialize)]
pub struct BatchResolution<'a> {
    pub hits: Vec<ExternalIdMatch<'a>>,
    pub misses: Vec<String>,
}

/// Per-identifier defence suggestion.
#[derive(Debug, Serialize)]
pub struct DefenseSuggestion {
    pub attack_id: String,
    #[serde(flatten)]
    pub outcome: DefenseOutcome,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DefenseOutcome {
    /// The identifier has no taxonomy mapping.
    NoMapping,
    Found {
        taxonomy_name: String,
        detail: serde_json::Value,
    },
    FetchFailed {
        taxonomy_name: String,
        #[serde(serialize_with = "display")]
        error: DetailError,
    },
}

fn display<S: Serializer>(error: &DetailError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

pub struct CrossReferenceResolver {
    registry: Arc<StoreRegistry>,
    table: TaxonomyTable,
    detail: Arc<dyn DetailSource>,
}

impl CrossReferenceResolver {
    pub fn new(
        registry: Arc<StoreRegistry>,
        table: TaxonomyTable,
        detail: Arc<dyn DetailSource>,
    ) -> Self {
        Self {
            registry,
            table,
            detail,
        }
    }

    pub fn registry(&self) -> &StoreRegistry {
        &self.registry
    }

    pub fn table(&self) -> &TaxonomyTable {
        &self.table
    }

    pub fn resolve_taxonomy_name(&self, id: &str) -> Option<&str> {
        self.table.resolve_name(id)
    }

    /// Fetch remote detail for a taxonomy name. Whitespace is stripped first.
    pub async fn fetch_taxonomy_detail(&self, name: &str) -> Result<TaxonomyDetail, DetailError> {
        let normalized = normalize_name(name);
        let body = self.detail.fetch(&normalized).await?;
        Ok(TaxonomyDetail {
            name: normalized,
            body,
        })
    }

    /// Resolve each id to the first attack-pattern referencing it, searching
    /// domains in load order. Hits keep the order of `ids`.
    pub fn resolve_batch<S: AsRef<str> + Sync>(&self, ids: &[S]) -> BatchResolution<'_> {
        let registry = self.registry.as_ref();
        let looked_up: Vec<(&str, Option<ExternalIdMatch<'_>>)> = ids
            .par_iter()
            .map(|id| {
                let id = id.as_ref();
                (id, registry.first_by_external_id(id))
            })
            .collect();

        let mut hits = Vec::new();
        let mut misses = Vec::new();
        for (id, found) in looked_up {
            match found {
                Some(hit) => hits.push(hit),
                None => {
                    warn!(attack_id = id, "no attack-pattern references id");
                    misses.push(id.to_string());
                }
            }
        }
        info!(
            requested = ids.len(),
            hits = hits.len(),
            misses = misses.len(),
            "batch resolution complete"
        );
        BatchResolution { hits, misses }
    }

    /// [`resolve_batch`](Self::resolve_batch) over a comma and/or whitespace
    /// separated list. Blank entries are dropped.
    pub fn resolve_batch_str(&self, ids: &str) -> BatchResolution<'_> {
        let ids: Vec<&str> = split_ids(ids).collect();
        self.resolve_batch(&ids)
    }

    /// Taxonomy name plus remote detail for each distinct id, in first-seen
    /// order. Per-id failures are reported in the result.
    pub async fn suggest_defenses<S: AsRef<str>>(&self, ids: &[S]) -> Vec<DefenseSuggestion> {
        let mut seen = HashSet::new();
        let distinct: Vec<&str> = ids
            .iter()
            .map(AsRef::as_ref)
            .filter(|id| seen.insert(*id))
            .collect();

        let lookups = distinct.into_iter().map(|id| async move {
            let outcome = match self.resolve_taxonomy_name(id) {
                None => {
                    debug!(attack_id = id, "no taxonomy mapping");
                    DefenseOutcome::NoMapping
                }
                Some(name) => match self.fetch_taxonomy_detail(name).await {
                    Ok(detail) => DefenseOutcome::Found {
                        taxonomy_name: name.to_string(),
                        detail: detail.body,
                    },
                    Err(error) => DefenseOutcome::FetchFailed {
                        taxonomy_name: name.to_string(),
                        error,
                    },
                },
            };
            DefenseSuggestion {
                attack_id: id.to_string(),
                outcome,
            }
        });
        futures::future::join_all(lookups).await
    }
}

fn split_ids(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
}

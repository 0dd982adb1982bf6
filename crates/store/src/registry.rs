use std::path::PathBuf;

use indexmap::IndexMap;
use rayon::prelude::*;
use strix_core::config::DataConfig;
use strix_core::{Domain, LoadError, Record};
use tracing::{info, warn};

use crate::filter::Filter;
use crate::store::{DomainStore, StoreStats};

/// Outcome of loading one configured domain.
#[derive(Debug)]
pub struct DomainLoadReport {
    pub domain: Domain,
    pub path: PathBuf,
    pub status: LoadStatus,
}

#[derive(Debug)]
pub enum LoadStatus {
    Loaded { records: usize },
    /// The domain is left out of the registry; the others stay usable.
    Failed { error: LoadError },
}

/// One store per loaded domain, iterated in load order.
///
/// Aggregate queries fan out to every store and concatenate the results;
/// records present in several domains appear once per domain.
#[derive(Debug, Default)]
pub struct StoreRegistry {
    stores: IndexMap<Domain, DomainStore>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from already loaded stores; iteration follows the given order.
    pub fn from_stores(stores: impl IntoIterator<Item = DomainStore>) -> Self {
        let mut registry = Self::new();
        for store in stores {
            registry.insert(store);
        }
        registry
    }

    /// Load every configured domain.
    ///
    /// Bundles are parsed in parallel; the registry is assembled in
    /// configuration order once all parsing has finished. A failing domain
    /// is reported and skipped.
    pub fn load(config: &DataConfig) -> (Self, Vec<DomainLoadReport>) {
        let results: Vec<(Domain, PathBuf, Result<DomainStore, LoadError>)> = config
            .domains
            .par_iter()
            .map(|&domain| {
                let path = config.path_for(domain);
                let result = DomainStore::load(domain, &path);
                (domain, path, result)
            })
            .collect();

        let mut registry = Self::new();
        let mut reports = Vec::with_capacity(results.len());
        for (domain, path, result) in results {
            let status = match result {
                Ok(store) => {
                    let records = store.len();
                    registry.insert(store);
                    LoadStatus::Loaded { records }
                }
                Err(error) => {
                    warn!(domain = %domain, path = %path.display(), error = %error, "domain not loaded");
                    LoadStatus::Failed { error }
                }
            };
            reports.push(DomainLoadReport {
                domain,
                path,
                status,
            });
        }

        info!(
            loaded = registry.len(),
            configured = config.domains.len(),
            "store registry ready"
        );
        (registry, reports)
    }

    fn insert(&mut self, store: DomainStore) {
        if let Some(old) = self.stores.insert(store.domain(), store) {
            warn!(domain = %old.domain(), "replaced previously loaded store");
        }
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    pub fn domains(&self) -> impl Iterator<Item = Domain> + '_ {
        self.stores.keys().copied()
    }

    pub fn stores(&self) -> impl Iterator<Item = &DomainStore> {
        self.stores.values()
    }

    pub fn store(&self, domain: Domain) -> Option<&DomainStore> {
        self.stores.get(&domain)
    }

    /// Query a single domain; an unloaded domain yields no results.
    pub fn query_domain(&self, domain: Domain, filter: &Filter) -> Vec<&Record> {
        self.store(domain)
            .map(|s| s.query(filter))
            .unwrap_or_default()
    }

    /// Query every domain for records of `record_type` that also satisfy
    /// `filter`, concatenated in load order.
    pub fn query_all(&self, record_type: &str, filter: &Filter) -> Vec<&Record> {
        let filter = filter.clone().and(Filter::new().record_type(record_type));
        self.query(&filter)
    }

    /// Query every domain with an arbitrary filter.
    pub fn query(&self, filter: &Filter) -> Vec<&Record> {
        self.stores.values().flat_map(|s| s.query(filter)).collect()
    }

    /// Look up an internal id; the first domain holding it wins.
    pub fn get(&self, id: &str) -> Option<&Record> {
        self.stores.values().find_map(|s| s.get(id))
    }

    pub fn stats(&self) -> Vec<StoreStats> {
        self.stores.values().map(DomainStore::stats).collect()
    }
}

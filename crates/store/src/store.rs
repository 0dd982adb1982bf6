use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use strix_core::{Domain, Record};
use tracing::debug;

use crate::filter::Filter;

/// Record counts for one loaded domain.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub domain: Domain,
    pub record_count: usize,
    pub records_by_type: BTreeMap<String, usize>,
}

/// In-memory, read-only record set for one knowledge domain.
///
/// Records keep their load order; `index` maps `id` to position so `get`
/// is a single hash lookup. No method takes `&mut self` once built, so a
/// store can be shared by any number of readers.
#[derive(Debug)]
pub struct DomainStore {
    domain: Domain,
    records: Vec<Record>,
    index: HashMap<String, usize>,
}

impl DomainStore {
    /// Build a store from records in load order.
    ///
    /// A repeated `id` keeps the slot of its first occurrence, holding the
    /// version with the latest `modified` timestamp (later wins ties).
    pub fn from_records(domain: Domain, records: impl IntoIterator<Item = Record>) -> Self {
        let mut store = Self {
            domain,
            records: Vec::new(),
            index: HashMap::new(),
        };
        let mut replaced = 0usize;
        for record in records {
            match store.index.get(record.id()).copied() {
                Some(pos) => {
                    if record.modified() >= store.records[pos].modified() {
                        store.records[pos] = record;
                    }
                    replaced += 1;
                }
                None => {
                    store.index.insert(record.id().to_string(), store.records.len());
                    store.records.push(record);
                }
            }
        }
        if replaced > 0 {
            debug!(domain = %domain, duplicates = replaced, "collapsed repeated record ids");
        }
        store
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in load order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.index.get(id).map(|&pos| &self.records[pos])
    }

    /// Every record satisfying all predicates, in load order.
    pub fn query(&self, filter: &Filter) -> Vec<&Record> {
        self.records.iter().filter(|r| filter.matches(r)).collect()
    }

    /// First record (in load order) satisfying all predicates.
    pub fn first(&self, filter: &Filter) -> Option<&Record> {
        self.records.iter().find(|r| filter.matches(r))
    }

    pub fn stats(&self) -> StoreStats {
        let mut records_by_type = BTreeMap::new();
        for record in &self.records {
            *records_by_type
                .entry(record.record_type().to_string())
                .or_default() += 1;
        }
        StoreStats {
            domain: self.domain,
            record_count: self.records.len(),
            records_by_type,
        }
    }
}

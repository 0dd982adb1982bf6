//! Offensive-to-defensive technique cross-reference table.
//!
//! A CSV with a header row; columns are positional:
//! `id, technique name [, level-0 name]`. An empty technique name falls back
//! to the level-0 column.

use std::collections::HashMap;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("taxonomy table not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("malformed taxonomy table {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TaxonomyEntry {
    name: Option<String>,
    level0: Option<String>,
}

/// Read-only lookup from external technique id to taxonomy name.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyTable {
    entries: HashMap<String, TaxonomyEntry>,
}

impl TaxonomyTable {
    pub fn load(path: &Path) -> Result<Self, TaxonomyError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TaxonomyError::NotFound {
                path: path.to_path_buf(),
            },
            _ => TaxonomyError::Malformed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        })?;
        let table = Self::from_reader(file, path)?;
        info!(path = %path.display(), entries = table.len(), "loaded taxonomy table");
        Ok(table)
    }

    /// Parse CSV from any reader. `origin` is only used in error messages.
    pub fn from_reader<R: Read>(reader: R, origin: &Path) -> Result<Self, TaxonomyError> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for (idx, row) in csv.records().enumerate() {
            let row = row.map_err(|e| TaxonomyError::Malformed {
                path: origin.to_path_buf(),
                reason: format!("row {}: {e}", idx + 1),
            })?;
            let Some(id) = non_empty(row.get(0)) else {
                debug!(row = idx + 1, "skipping taxonomy row without id");
                continue;
            };
            rows.push((id, non_empty(row.get(1)), non_empty(row.get(2))));
        }
        Ok(Self::from_entries(rows))
    }

    /// Build from `(id, name, level0)` rows. The first row for an id wins.
    pub fn from_entries<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (String, Option<String>, Option<String>)>,
    {
        let mut entries = HashMap::new();
        for (id, name, level0) in rows {
            entries
                .entry(id)
                .or_insert(TaxonomyEntry { name, level0 });
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Taxonomy name for `id`, falling back to the level-0 name.
    ///
    /// None when the id is not in the table, or neither column has a value.
    pub fn resolve_name(&self, id: &str) -> Option<&str> {
        let entry = self.entries.get(id)?;
        entry.name.as_deref().or(entry.level0.as_deref())
    }
}

fn non_empty(field: Option<&str>) -> Option<String> {
    field.filter(|s| !s.is_empty()).map(str::to_string)
}

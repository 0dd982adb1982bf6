//! STIX bundle loading for a single domain.
//!
//! Accepts a bundle object (`{"type": "bundle", "objects": [...]}`) or a bare
//! array of objects. Any object without a usable `id`/`type` rejects the
//! whole file as malformed; a partial domain is never published.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde_json::Value;
use strix_core::{Domain, LoadError, Record};
use tracing::info;

use crate::store::DomainStore;

impl DomainStore {
    /// Read and parse the bundle at `path`.
    pub fn load(domain: Domain, path: &Path) -> Result<Self, LoadError> {
        let contents = fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => LoadError::NotFound {
                path: path.to_path_buf(),
            },
            _ => LoadError::Io(e),
        })?;
        let store = Self::from_json_slice(domain, path, &contents)?;
        info!(
            domain = %domain,
            path = %path.display(),
            records = store.len(),
            "loaded domain store"
        );
        Ok(store)
    }

    /// Parse bundle text. `origin` is only used in error messages.
    pub fn from_json_str(domain: Domain, origin: &Path, contents: &str) -> Result<Self, LoadError> {
        Self::from_json_slice(domain, origin, contents.as_bytes())
    }

    /// Parse raw bundle bytes. Invalid UTF-8 is reported as malformed.
    pub fn from_json_slice(domain: Domain, origin: &Path, contents: &[u8]) -> Result<Self, LoadError> {
        let value: Value = serde_json::from_slice(contents)
            .map_err(|e| LoadError::malformed(origin, format!("invalid JSON: {e}")))?;

        let objects = match value {
            Value::Object(mut bundle) => match bundle.remove("objects") {
                Some(Value::Array(objects)) => objects,
                _ => {
                    return Err(LoadError::malformed(
                        origin,
                        "expected a bundle with an `objects` array",
                    ))
                }
            },
            Value::Array(objects) => objects,
            _ => {
                return Err(LoadError::malformed(
                    origin,
                    "expected a bundle object or an array of objects",
                ))
            }
        };

        let mut records = Vec::with_capacity(objects.len());
        for (i, object) in objects.into_iter().enumerate() {
            let record = Record::from_json(object)
                .map_err(|e| LoadError::malformed(origin, format!("object #{i}: {e}")))?;
            records.push(record);
        }

        Ok(Self::from_records(domain, records))
    }
}

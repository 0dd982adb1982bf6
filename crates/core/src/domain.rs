use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownDomain;

/// A knowledge partition with its own independently loaded record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Enterprise,
    Ics,
    Mobile,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Enterprise, Domain::Ics, Domain::Mobile];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Enterprise => "enterprise",
            Domain::Ics => "ics",
            Domain::Mobile => "mobile",
        }
    }

    /// Location of this domain's bundle under `data_dir`.
    ///
    /// Layout follows the upstream release tree:
    /// `<data_dir>/<domain>-attack/<domain>-attack[-<version>].json`.
    pub fn data_file(&self, data_dir: &Path, version: Option<&str>) -> PathBuf {
        let stem = format!("{}-attack", self.as_str());
        let file = match version {
            Some(v) if !v.is_empty() => format!("{stem}-{v}.json"),
            _ => format!("{stem}.json"),
        };
        data_dir.join(&stem).join(file)
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = UnknownDomain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enterprise" => Ok(Domain::Enterprise),
            "ics" => Ok(Domain::Ics),
            "mobile" => Ok(Domain::Mobile),
            other => Err(UnknownDomain(other.to_string())),
        }
    }
}

/// Parse a comma separated domain list, keeping order and dropping repeats.
pub fn parse_domain_list(raw: &str) -> Result<Vec<Domain>, UnknownDomain> {
    let mut domains = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let domain: Domain = part.parse()?;
        if !domains.contains(&domain) {
            domains.push(domain);
        }
    }
    Ok(domains)
}

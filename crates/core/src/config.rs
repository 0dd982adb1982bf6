use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{parse_domain_list, Domain};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub data: DataConfig,
    pub taxonomy: TaxonomyConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `STRIX_PROFILE`. When set (e.g. `PROD`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("STRIX_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            data: DataConfig::from_env_profiled(p),
            taxonomy: TaxonomyConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        let domains: Vec<&str> = self.data.domains.iter().map(Domain::as_str).collect();
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  data:      dir={}, domains={}", self.data.data_dir.display(), domains.join(","));
        tracing::info!("  version:   {}", self.data.version.as_deref().unwrap_or("(latest)"));
        tracing::info!("  taxonomy:  map={}", self.taxonomy.mapping_path.display());
        tracing::info!("  detail:    url={}, timeout={}ms", self.taxonomy.detail_base_url, self.taxonomy.timeout_ms);
    }
}

// ── Knowledge-base data ───────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub data_dir: PathBuf,
    /// Domains to load, in load (and query) order.
    pub domains: Vec<Domain>,
    /// Optional release suffix appended to bundle file names.
    pub version: Option<String>,
}

impl DataConfig {
    fn from_env_profiled(p: &str) -> Self {
        let raw = profiled_env_or(p, "STRIX_DOMAINS", "enterprise,ics,mobile");
        let domains = match parse_domain_list(&raw) {
            Ok(d) if !d.is_empty() => d,
            Ok(_) => Domain::ALL.to_vec(),
            Err(e) => {
                tracing::warn!(error = %e, "invalid STRIX_DOMAINS, loading all domains");
                Domain::ALL.to_vec()
            }
        };
        Self {
            data_dir: PathBuf::from(profiled_env_or(p, "STRIX_DATA_DIR", "attack-stix-data")),
            domains,
            version: profiled_env_opt(p, "STRIX_DATA_VERSION"),
        }
    }

    /// Bundle path for one domain under this configuration.
    pub fn path_for(&self, domain: Domain) -> PathBuf {
        domain.data_file(&self.data_dir, self.version.as_deref())
    }
}

// ── Defensive taxonomy cross-reference ────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyConfig {
    /// CSV table mapping technique IDs to taxonomy names.
    pub mapping_path: PathBuf,
    /// Base URL of the detail endpoint; the normalized name is appended.
    pub detail_base_url: String,
    pub timeout_ms: u64,
}

impl TaxonomyConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            mapping_path: PathBuf::from(profiled_env_or(
                p,
                "STRIX_TAXONOMY_MAP",
                "data/d3fend-mapping.csv",
            )),
            detail_base_url: profiled_env_or(
                p,
                "STRIX_TAXONOMY_URL",
                "https://d3fend.mitre.org/api/technique",
            ),
            timeout_ms: profiled_env_u64(p, "STRIX_TAXONOMY_TIMEOUT_MS", 10_000),
        }
    }
}

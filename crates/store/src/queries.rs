//! Composite knowledge-base queries built on the predicate engine.
//!
//! Every helper answers "nothing found", "unknown parameter" and "missing
//! parameter" with an empty collection; only load-time problems are errors.

use std::str::FromStr;

use serde::Serialize;
use strix_core::{Domain, KillChainPhase, Record};
use tracing::{debug, warn};

use crate::error::QueryError;
use crate::filter::Filter;
use crate::registry::StoreRegistry;

pub const ATTACK_PATTERN: &str = "attack-pattern";
pub const INTRUSION_SET: &str = "intrusion-set";
pub const TOOL: &str = "tool";
pub const MALWARE: &str = "malware";

/// Kill chain name used for ATT&CK tactics.
pub const MITRE_KILL_CHAIN: &str = "mitre-attack";

/// Which attack-patterns a technique listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TechniqueScope {
    Techniques,
    Subtechniques,
    #[default]
    Both,
}

impl TechniqueScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TechniqueScope::Techniques => "techniques",
            TechniqueScope::Subtechniques => "subtechniques",
            TechniqueScope::Both => "both",
        }
    }

    fn filter(&self) -> Filter {
        match self {
            TechniqueScope::Techniques => Filter::new().eq("x_mitre_is_subtechnique", false),
            TechniqueScope::Subtechniques => Filter::new().eq("x_mitre_is_subtechnique", true),
            TechniqueScope::Both => Filter::new(),
        }
    }
}

impl FromStr for TechniqueScope {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "techniques" => Ok(TechniqueScope::Techniques),
            "subtechniques" => Ok(TechniqueScope::Subtechniques),
            "both" => Ok(TechniqueScope::Both),
            other => Err(QueryError::InvalidParameter {
                name: "include",
                value: other.to_string(),
            }),
        }
    }
}

/// First attack-pattern of one domain carrying a queried external id.
#[derive(Debug, Clone, Serialize)]
pub struct ExternalIdMatch<'a> {
    pub attack_id: String,
    pub domain: Domain,
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub kill_chain_phases: Vec<KillChainPhase>,
    #[serde(skip)]
    pub record: &'a Record,
}

impl<'a> ExternalIdMatch<'a> {
    fn new(attack_id: &str, domain: Domain, record: &'a Record) -> Self {
        Self {
            attack_id: attack_id.to_string(),
            domain,
            name: record.name(),
            description: record.description(),
            kill_chain_phases: record.kill_chain_phases(),
            record,
        }
    }
}

fn external_id_filter(external_id: &str) -> Filter {
    Filter::new().eq("external_references.external_id", external_id)
}

impl StoreRegistry {
    /// All records of one `type`, across domains.
    pub fn query_by_type(&self, record_type: &str) -> Vec<&Record> {
        self.query_all(record_type, &Filter::new())
    }

    /// Records of any type referencing `external_id`, across domains.
    pub fn query_by_external_id(&self, external_id: &str) -> Vec<&Record> {
        self.query(&external_id_filter(external_id))
    }

    /// Attack-patterns with exactly this `name`.
    pub fn query_by_name(&self, name: &str) -> Vec<&Record> {
        self.query_all(ATTACK_PATTERN, &Filter::new().eq("name", name))
    }

    /// Intrusion sets listing `alias` among their `aliases`.
    pub fn query_by_alias(&self, alias: &str) -> Vec<&Record> {
        self.query_all(INTRUSION_SET, &Filter::new().eq("aliases", alias))
    }

    /// Technique listing by scope name (`techniques`, `subtechniques`, `both`).
    ///
    /// Any other mode answers with an empty result rather than an error;
    /// parse a [`TechniqueScope`] first to reject bad input up front.
    pub fn techniques_or_subtechniques(&self, mode: &str) -> Vec<&Record> {
        match mode.parse::<TechniqueScope>() {
            Ok(scope) => self.techniques(scope),
            Err(e) => {
                warn!(error = %e, "unsupported technique scope, returning no results");
                Vec::new()
            }
        }
    }

    pub fn techniques(&self, scope: TechniqueScope) -> Vec<&Record> {
        let results = self.query_all(ATTACK_PATTERN, &scope.filter());
        debug!(scope = scope.as_str(), count = results.len(), "technique listing");
        results
    }

    /// Tools followed by malware.
    pub fn software(&self) -> Vec<&Record> {
        let mut results = self.query_by_type(TOOL);
        results.extend(self.query_by_type(MALWARE));
        results
    }

    /// Attack-patterns whose description contains `text`, ignoring case.
    /// The text is matched as given, surrounding whitespace included.
    /// Records without a description are skipped; blank input finds nothing.
    pub fn by_content(&self, text: &str) -> Vec<&Record> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let needle = text.to_lowercase();
        self.query_by_type(ATTACK_PATTERN)
            .into_iter()
            .filter(|r| {
                r.description()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Attack-patterns listing `platform` in `x_mitre_platforms`.
    pub fn by_platform(&self, platform: &str) -> Vec<&Record> {
        self.query_all(ATTACK_PATTERN, &Filter::new().eq("x_mitre_platforms", platform))
    }

    /// Attack-patterns with a kill-chain phase `tactic` on the ATT&CK chain.
    ///
    /// Both conditions must hold on the same phase entry.
    pub fn by_tactic(&self, tactic: &str) -> Vec<&Record> {
        let filter = Filter::new().element(
            "kill_chain_phases",
            [("phase_name", tactic), ("kill_chain_name", MITRE_KILL_CHAIN)],
        );
        self.query_all(ATTACK_PATTERN, &filter)
    }

    /// At most one attack-pattern per domain referencing `external_id`.
    pub fn by_external_id(&self, external_id: &str) -> Vec<ExternalIdMatch<'_>> {
        let filter = Filter::new()
            .record_type(ATTACK_PATTERN)
            .and(external_id_filter(external_id));
        self.stores()
            .filter_map(|store| {
                store
                    .first(&filter)
                    .map(|record| ExternalIdMatch::new(external_id, store.domain(), record))
            })
            .collect()
    }

    /// First attack-pattern referencing `external_id`, searching domains in
    /// load order.
    pub fn first_by_external_id(&self, external_id: &str) -> Option<ExternalIdMatch<'_>> {
        self.by_external_id(external_id).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DomainStore;
    use serde_json::json;

    fn technique(id: &str, ext: &str, sub: bool) -> Record {
        Record::from_json(json!({
            "type": "attack-pattern",
            "id": id,
            "name": format!("Technique {ext}"),
            "description": format!("Adversaries may use {ext} against LSASS memory."),
            "x_mitre_is_subtechnique": sub,
            "external_references": [{"source_name": "mitre-attack", "external_id": ext}]
        }))
        .unwrap()
    }

    #[test]
    fn scope_parse() {
        assert_eq!("both".parse::<TechniqueScope>(), Ok(TechniqueScope::Both));
        assert_eq!(
            "all".parse::<TechniqueScope>(),
            Err(QueryError::InvalidParameter {
                name: "include",
                value: "all".to_string()
            })
        );
        assert_eq!(TechniqueScope::default(), TechniqueScope::Both);
    }

    #[test]
    fn first_by_external_id_follows_domain_order() {
        let reg = StoreRegistry::from_stores([
            DomainStore::from_records(Domain::Ics, vec![technique("attack-pattern--b", "T0800", false)]),
            DomainStore::from_records(Domain::Enterprise, vec![technique("attack-pattern--a", "T0800", false)]),
        ]);
        let hit = reg.first_by_external_id("T0800").unwrap();
        assert_eq!(hit.domain, Domain::Ics);
        assert_eq!(hit.record.id(), "attack-pattern--b");
        assert!(reg.first_by_external_id("T9999").is_none());
    }

    #[test]
    fn blank_content_finds_nothing() {
        let reg = StoreRegistry::from_stores([DomainStore::from_records(
            Domain::Enterprise,
            vec![technique("attack-pattern--a", "T1003", false)],
        )]);
        assert!(reg.by_content("   ").is_empty());
        assert_eq!(reg.by_content("lsass").len(), 1);
    }

    #[test]
    fn content_is_not_trimmed() {
        let record = Record::from_json(json!({
            "type": "attack-pattern",
            "id": "attack-pattern--a",
            "description": "abc"
        }))
        .unwrap();
        let reg = StoreRegistry::from_stores([DomainStore::from_records(Domain::Enterprise, vec![record])]);
        assert!(reg.by_content(" abc ").is_empty());
        assert_eq!(reg.by_content("ABC").len(), 1);
        assert_eq!(reg.by_content("b").len(), 1);
    }

    #[test]
    fn external_id_match_serializes_projection() {
        let reg = StoreRegistry::from_stores([DomainStore::from_records(
            Domain::Enterprise,
            vec![technique("attack-pattern--a", "T1003", false)],
        )]);
        let hits = reg.by_external_id("T1003");
        let value = serde_json::to_value(&hits[0]).unwrap();
        assert_eq!(value["attack_id"], "T1003");
        assert_eq!(value["domain"], "enterprise");
        assert_eq!(value["name"], "Technique T1003");
        assert!(value["kill_chain_phases"].as_array().unwrap().is_empty());
        assert!(value.get("record").is_none());
    }
}

/// Integration tests for the store registry: on-disk loading, partial
/// domain failure, and the composite query helpers.

use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use strix_core::config::DataConfig;
use strix_core::Domain;
use strix_store::{LoadStatus, StoreRegistry};

// ============================================================================
// Test Helpers
// ============================================================================

fn technique(id: &str, external_id: &str, subtechnique: bool) -> Value {
    json!({
        "type": "attack-pattern",
        "id": id,
        "name": format!("Technique {external_id}"),
        "description": format!("Adversaries may abuse {external_id} to dump LSASS memory."),
        "x_mitre_is_subtechnique": subtechnique,
        "x_mitre_platforms": ["Windows"],
        "kill_chain_phases": [{"kill_chain_name": "mitre-attack", "phase_name": "credential-access"}],
        "external_references": [{"source_name": "mitre-attack", "external_id": external_id}]
    })
}

fn write_bundle(data_dir: &Path, domain: Domain, objects: Vec<Value>) -> PathBuf {
    let path = domain.data_file(data_dir, None);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let bundle = json!({"type": "bundle", "id": "bundle--test", "objects": objects});
    std::fs::write(&path, serde_json::to_string(&bundle).unwrap()).unwrap();
    path
}

fn data_config(data_dir: &Path, domains: &[Domain]) -> DataConfig {
    DataConfig {
        data_dir: data_dir.to_path_buf(),
        domains: domains.to_vec(),
        version: None,
    }
}

/// Five attack-patterns: three techniques, two sub-techniques, plus noise.
fn enterprise_objects() -> Vec<Value> {
    vec![
        technique("attack-pattern--1", "T1003", false),
        technique("attack-pattern--2", "T1003.001", true),
        technique("attack-pattern--3", "T1059", false),
        technique("attack-pattern--4", "T1059.001", true),
        technique("attack-pattern--5", "T1566", false),
        json!({"type": "tool", "id": "tool--1", "name": "Mimikatz"}),
        json!({"type": "malware", "id": "malware--1", "name": "Emotet"}),
        json!({
            "type": "intrusion-set",
            "id": "intrusion-set--1",
            "name": "APT29",
            "aliases": ["APT29", "Cozy Bear"],
            "external_references": [{"source_name": "mitre-attack", "external_id": "G0016"}]
        }),
    ]
}

fn load(dir: &Path, domains: &[Domain]) -> StoreRegistry {
    let (registry, _) = StoreRegistry::load(&data_config(dir, domains));
    registry
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn failed_domain_leaves_others_usable() {
    let dir = tempfile::tempdir().unwrap();
    write_bundle(dir.path(), Domain::Enterprise, enterprise_objects());
    let mobile = Domain::Mobile.data_file(dir.path(), None);
    std::fs::create_dir_all(mobile.parent().unwrap()).unwrap();
    std::fs::write(&mobile, "{\"objects\": 12}").unwrap();

    let (registry, reports) = StoreRegistry::load(&data_config(
        dir.path(),
        &[Domain::Enterprise, Domain::Ics, Domain::Mobile],
    ));

    assert_eq!(registry.len(), 1);
    assert_eq!(reports.len(), 3);
    assert!(matches!(reports[0].status, LoadStatus::Loaded { records: 8 }));
    match &reports[1].status {
        LoadStatus::Failed { error } => assert!(error.is_not_found()),
        other => panic!("ics should be missing, got {other:?}"),
    }
    match &reports[2].status {
        LoadStatus::Failed { error } => assert!(!error.is_not_found()),
        other => panic!("mobile should be malformed, got {other:?}"),
    }

    assert!(registry.store(Domain::Ics).is_none());
    assert_eq!(registry.query_by_type("attack-pattern").len(), 5);
}

#[test]
fn get_returns_record_iff_loaded() {
    let dir = tempfile::tempdir().unwrap();
    write_bundle(dir.path(), Domain::Enterprise, enterprise_objects());
    let registry = load(dir.path(), &[Domain::Enterprise]);

    let store = registry.store(Domain::Enterprise).unwrap();
    for object in enterprise_objects() {
        let id = object["id"].as_str().unwrap();
        assert_eq!(store.get(id).unwrap().id(), id);
    }
    assert!(store.get("attack-pattern--99").is_none());
    assert!(registry.get("tool--1").is_some());
}

#[test]
fn versioned_bundle_is_loaded_from_suffixed_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = Domain::Ics.data_file(dir.path(), Some("15.1"));
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, r#"[{"type": "tool", "id": "tool--ics"}]"#).unwrap();

    let mut config = data_config(dir.path(), &[Domain::Ics]);
    config.version = Some("15.1".to_string());
    let (registry, _) = StoreRegistry::load(&config);
    assert!(registry.get("tool--ics").is_some());
}

// ============================================================================
// Query helpers
// ============================================================================

#[test]
fn technique_scopes_partition_attack_patterns() {
    let dir = tempfile::tempdir().unwrap();
    write_bundle(dir.path(), Domain::Enterprise, enterprise_objects());
    let registry = load(dir.path(), &[Domain::Enterprise]);

    let ids = |mode: &str| -> Vec<String> {
        registry
            .techniques_or_subtechniques(mode)
            .iter()
            .map(|r| r.id().to_string())
            .collect()
    };

    assert_eq!(
        ids("techniques"),
        vec!["attack-pattern--1", "attack-pattern--3", "attack-pattern--5"]
    );
    assert_eq!(ids("subtechniques"), vec!["attack-pattern--2", "attack-pattern--4"]);
    assert_eq!(ids("both").len(), 5);
    assert!(ids("everything").is_empty());
    assert!(ids("Techniques").is_empty());
}

#[test]
fn tactic_requires_same_phase_entry() {
    let dir = tempfile::tempdir().unwrap();
    write_bundle(
        dir.path(),
        Domain::Enterprise,
        vec![json!({
            "type": "attack-pattern",
            "id": "attack-pattern--mixed",
            "kill_chain_phases": [
                {"kill_chain_name": "mitre-attack", "phase_name": "execution"},
                {"kill_chain_name": "other", "phase_name": "initial-access"}
            ]
        })],
    );
    let registry = load(dir.path(), &[Domain::Enterprise]);

    assert!(registry.by_tactic("initial-access").is_empty());
    assert_eq!(registry.by_tactic("execution").len(), 1);
}

#[test]
fn external_id_returns_first_match_per_domain() {
    let dir = tempfile::tempdir().unwrap();
    write_bundle(
        dir.path(),
        Domain::Enterprise,
        vec![
            technique("attack-pattern--first", "T1566", false),
            technique("attack-pattern--second", "T1566", false),
        ],
    );
    write_bundle(
        dir.path(),
        Domain::Mobile,
        vec![technique("attack-pattern--mobile", "T1566", false)],
    );
    let registry = load(dir.path(), &[Domain::Enterprise, Domain::Mobile]);

    let hits = registry.by_external_id("T1566");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].domain, Domain::Enterprise);
    assert_eq!(hits[0].record.id(), "attack-pattern--first");
    assert_eq!(hits[0].attack_id, "T1566");
    assert_eq!(hits[0].kill_chain_phases[0].phase_name, "credential-access");
    assert_eq!(hits[1].domain, Domain::Mobile);

    // The unrestricted lookup returns every referencing record.
    assert_eq!(registry.query_by_external_id("T1566").len(), 3);
    assert!(registry.by_external_id("T0000").is_empty());
}

#[test]
fn name_alias_platform_software_and_content() {
    let dir = tempfile::tempdir().unwrap();
    write_bundle(dir.path(), Domain::Enterprise, enterprise_objects());
    let registry = load(dir.path(), &[Domain::Enterprise]);

    assert_eq!(registry.query_by_name("Technique T1059").len(), 1);
    assert!(registry.query_by_name("technique t1059").is_empty());

    let groups = registry.query_by_alias("Cozy Bear");
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name(), Some("APT29"));
    assert_eq!(registry.query_by_external_id("G0016").len(), 1);

    assert_eq!(registry.by_platform("Windows").len(), 5);
    assert!(registry.by_platform("windows").is_empty());

    let software: Vec<_> = registry.software().iter().map(|r| r.id()).collect();
    assert_eq!(software, vec!["tool--1", "malware--1"]);

    assert_eq!(registry.by_content("lsass MEMORY").len(), 5);
    assert!(registry.by_content("kerberoast").is_empty());
}

#[test]
fn content_search_skips_records_without_description() {
    let dir = tempfile::tempdir().unwrap();
    write_bundle(
        dir.path(),
        Domain::Enterprise,
        vec![
            json!({"type": "attack-pattern", "id": "attack-pattern--bare"}),
            technique("attack-pattern--1", "T1003", false),
        ],
    );
    let registry = load(dir.path(), &[Domain::Enterprise]);
    let hits = registry.by_content("LSASS");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id(), "attack-pattern--1");
}

#[test]
fn repeated_queries_are_identical() {
    let dir = tempfile::tempdir().unwrap();
    write_bundle(dir.path(), Domain::Enterprise, enterprise_objects());
    let registry = load(dir.path(), &[Domain::Enterprise]);

    let first: Vec<_> = registry.by_tactic("credential-access").iter().map(|r| r.id().to_string()).collect();
    let second: Vec<_> = registry.by_tactic("credential-access").iter().map(|r| r.id().to_string()).collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 5);
    assert_eq!(registry.store(Domain::Enterprise).unwrap().len(), 8);
}

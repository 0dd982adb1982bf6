use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use strix_core::config::Config;
use strix_store::{LoadStatus, StoreRegistry, TechniqueScope};
use strix_xref::{
    extract_ids, extract_unique_ids, CrossReferenceResolver, HttpDetailSource, TaxonomyError,
    TaxonomyTable, TechniqueTally,
};
use tracing::{info, warn};

use crate::cli::Command;

pub async fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Get { id } => {
            let registry = load_registry(config);
            let record = registry
                .get(&id)
                .with_context(|| format!("object not found: {id}"))?;
            print_json(record)
        }
        Command::Type { record_type } => print_json(&load_registry(config).query_by_type(&record_type)),
        Command::AttackId { attack_id } => {
            print_json(&load_registry(config).query_by_external_id(&attack_id))
        }
        Command::Name { name } => print_json(&load_registry(config).query_by_name(&name)),
        Command::Alias { alias } => print_json(&load_registry(config).query_by_alias(&alias)),
        Command::Techniques { include } => {
            print_json(&load_registry(config).techniques(TechniqueScope::from(include)))
        }
        Command::Software => print_json(&load_registry(config).software()),
        Command::Content { text } => print_json(&load_registry(config).by_content(&text)),
        Command::Platform { platform } => print_json(&load_registry(config).by_platform(&platform)),
        Command::Tactic { tactic } => print_json(&load_registry(config).by_tactic(&tactic)),
        Command::Search { ids } => {
            let resolver = build_resolver(config);
            let batch = resolver.resolve_batch_str(&ids.join(","));
            print_json(&batch.hits)
        }
        Command::Extract { text, unique } => {
            let text = text_or_stdin(text)?;
            let ids = if unique {
                extract_unique_ids(&text)
            } else {
                extract_ids(&text)
            };
            print_json(&ids)
        }
        Command::Tally { text, top } => {
            let tally = TechniqueTally::new();
            for line in text_or_stdin(text)?.lines() {
                tally.record_text(line);
            }
            print_json(&tally.top(top))
        }
        Command::TaxonomyName { attack_id } => {
            let table = load_taxonomy(config);
            let name = table
                .resolve_name(&attack_id)
                .with_context(|| format!("no taxonomy mapping for {attack_id}"))?;
            print_json(&name)
        }
        Command::TaxonomyDetail { name } => {
            let resolver = build_resolver(config);
            let detail = resolver
                .fetch_taxonomy_detail(&name)
                .await
                .with_context(|| format!("fetching taxonomy detail for '{name}'"))?;
            print_json(&detail)
        }
        Command::Suggest { text } => {
            let ids = extract_unique_ids(&text_or_stdin(text)?);
            let resolver = build_resolver(config);
            print_json(&resolver.suggest_defenses(&ids).await)
        }
        Command::Stats => print_json(&load_registry(config).stats()),
    }
}

fn load_registry(config: &Config) -> Arc<StoreRegistry> {
    let (registry, reports) = StoreRegistry::load(&config.data);
    for report in &reports {
        if let LoadStatus::Loaded { records } = report.status {
            info!(domain = %report.domain, records, "domain loaded");
        }
    }
    if registry.is_empty() {
        warn!(dir = %config.data.data_dir.display(), "no domain could be loaded; every query will be empty");
    }
    Arc::new(registry)
}

/// A missing table leaves every id unmapped rather than failing the command.
fn load_taxonomy(config: &Config) -> TaxonomyTable {
    match TaxonomyTable::load(&config.taxonomy.mapping_path) {
        Ok(table) => table,
        Err(e @ TaxonomyError::NotFound { .. }) => {
            warn!(error = %e, "taxonomy table missing, no ids will map");
            TaxonomyTable::default()
        }
        Err(e) => {
            warn!(error = %e, "taxonomy table unreadable, no ids will map");
            TaxonomyTable::default()
        }
    }
}

fn build_resolver(config: &Config) -> CrossReferenceResolver {
    CrossReferenceResolver::new(
        load_registry(config),
        load_taxonomy(config),
        Arc::new(HttpDetailSource::from_config(&config.taxonomy)),
    )
}

fn text_or_stdin(text: Option<String>) -> Result<String> {
    match text {
        Some(text) if text != "-" => Ok(text),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render JSON")?;
    println!("{rendered}");
    Ok(())
}

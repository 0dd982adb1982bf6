use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use strix_core::config::Config;
use strix_core::domain::parse_domain_list;
use strix_store::TechniqueScope;

/// Query the ATT&CK knowledge base and cross-reference defensive techniques.
///
/// Results are written to stdout as pretty-printed JSON; logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "strix", about = "ATT&CK knowledge-base queries and defensive cross-references")]
pub struct CliArgs {
    /// Directory holding the `<domain>-attack/` bundle folders
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Comma separated domains to load, in query order (enterprise,ics,mobile)
    #[arg(long, global = true)]
    pub domains: Option<String>,

    /// Release suffix of the bundle files, e.g. 15.1
    #[arg(long, global = true)]
    pub data_version: Option<String>,

    /// CSV mapping technique ids to taxonomy names
    #[arg(long, global = true)]
    pub taxonomy_map: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl CliArgs {
    /// Apply command-line overrides on top of the environment config.
    pub fn apply_overrides(&self, config: &mut Config) -> anyhow::Result<()> {
        if let Some(dir) = &self.data_dir {
            config.data.data_dir = dir.clone();
        }
        if let Some(raw) = &self.domains {
            let domains = parse_domain_list(raw)?;
            if domains.is_empty() {
                anyhow::bail!("--domains must name at least one domain");
            }
            config.data.domains = domains;
        }
        if let Some(version) = &self.data_version {
            config.data.version = Some(version.clone());
        }
        if let Some(path) = &self.taxonomy_map {
            config.taxonomy.mapping_path = path.clone();
        }
        Ok(())
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch one object by its STIX id
    Get { id: String },

    /// All objects of one STIX type (attack-pattern, tool, malware, ...)
    Type { record_type: String },

    /// Objects of any type referencing an external id (T1566, G0016, ...)
    AttackId { attack_id: String },

    /// Techniques with this exact name
    Name { name: String },

    /// Intrusion sets known by this alias
    Alias { alias: String },

    /// List techniques, sub-techniques or both
    Techniques {
        #[arg(long, value_enum, default_value_t = IncludeArg::Both)]
        include: IncludeArg,
    },

    /// Tools followed by malware
    Software,

    /// Techniques whose description contains the text (case-insensitive)
    Content { text: String },

    /// Techniques for a platform (Windows, Linux, macOS, ...)
    Platform { platform: String },

    /// Techniques for an ATT&CK tactic (execution, initial-access, ...)
    Tactic { tactic: String },

    /// Resolve technique ids to their first matching technique per id
    Search {
        /// Ids separated by commas and/or spaces
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },

    /// Extract technique ids from text (reads stdin when no text is given)
    Extract {
        text: Option<String>,

        /// Keep only the first appearance of each id
        #[arg(long)]
        unique: bool,
    },

    /// Count technique ids in text (stdin when no text is given)
    Tally {
        text: Option<String>,

        /// Number of ids listed before the rest is folded into "others"
        #[arg(long, default_value = "9")]
        top: usize,
    },

    /// Defensive taxonomy name mapped to a technique id
    TaxonomyName { attack_id: String },

    /// Fetch remote detail for a taxonomy technique name
    TaxonomyDetail { name: String },

    /// Extract ids from text and suggest defensive techniques for each
    Suggest { text: Option<String> },

    /// Record counts per loaded domain
    Stats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IncludeArg {
    Techniques,
    Subtechniques,
    Both,
}

impl From<IncludeArg> for TechniqueScope {
    fn from(arg: IncludeArg) -> Self {
        match arg {
            IncludeArg::Techniques => TechniqueScope::Techniques,
            IncludeArg::Subtechniques => TechniqueScope::Subtechniques,
            IncludeArg::Both => TechniqueScope::Both,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strix_core::Domain;

    #[test]
    fn parses_subcommand_with_global_overrides() {
        let args = CliArgs::parse_from([
            "strix",
            "techniques",
            "--include",
            "subtechniques",
            "--domains",
            "mobile,enterprise",
        ]);
        match args.command {
            Command::Techniques { include } => {
                assert_eq!(TechniqueScope::from(include), TechniqueScope::Subtechniques)
            }
            other => panic!("unexpected command {other:?}"),
        }

        let mut config = Config::for_profile("");
        args.apply_overrides(&mut config).unwrap();
        assert_eq!(config.data.domains, vec![Domain::Mobile, Domain::Enterprise]);
    }

    #[test]
    fn rejects_unknown_include_mode() {
        let result = CliArgs::try_parse_from(["strix", "techniques", "--include", "everything"]);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_domain_override_is_an_error() {
        let args = CliArgs::parse_from(["strix", "stats", "--domains", "pre-attack"]);
        let mut config = Config::for_profile("");
        assert!(args.apply_overrides(&mut config).is_err());
    }

    #[test]
    fn search_collects_all_ids() {
        let args = CliArgs::parse_from(["strix", "search", "T1566,T1059", "T1003"]);
        match args.command {
            Command::Search { ids } => assert_eq!(ids, vec!["T1566,T1059", "T1003"]),
            other => panic!("unexpected command {other:?}"),
        }
    }
}

// tagwarden/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tagwarden")]
#[command(about = "Warehouse column classification & governance policy convergence", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging (DEBUG level)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🔎 Scans the warehouse and tags sensitive columns
    Scan {
        /// Path to the warehouse database file
        #[arg(long, default_value = "warehouse.duckdb")]
        db_path: String,

        /// Database label carried into result records and override keys
        #[arg(long, default_value = "")]
        database: String,

        /// Path to the tag rules file (YAML)
        #[arg(long, default_value = "config/tag_rules.yaml")]
        rules: PathBuf,

        /// Path to a manual override file (JSON or CSV)
        #[arg(long)]
        overrides: Option<PathBuf>,

        /// Schemas to process (default: all schemas)
        #[arg(long)]
        schemas: Vec<String>,

        /// Number of sample rows to check per column
        #[arg(long, default_value = "100")]
        sample_size: usize,

        /// Output file for tagging results
        #[arg(long, default_value = "tagging_results.json")]
        output: PathBuf,

        /// Output format: json | csv
        #[arg(long, default_value = "json")]
        output_format: String,

        /// Classify without writing any tag back
        #[arg(long)]
        dry_run: bool,
    },

    /// 🛡️ Converges masking and row access policies onto tagged columns
    Apply {
        /// Path to the warehouse database file
        #[arg(long, default_value = "warehouse.duckdb")]
        db_path: String,

        /// Path to the policy configuration file (YAML)
        #[arg(long, default_value = "config/policy_config.yaml")]
        policy_config: PathBuf,

        /// Path to the tag rules file, used by the PII detection pass
        #[arg(long, default_value = "config/tag_rules.yaml")]
        rules: PathBuf,

        /// Path to a manual override file (JSON or CSV)
        #[arg(long)]
        overrides: Option<PathBuf>,

        /// Apply only masking policies
        #[arg(long)]
        masking_only: bool,

        /// Apply only row access policies
        #[arg(long)]
        row_access_only: bool,

        /// Run only the PII detection pass
        #[arg(long)]
        pii_only: bool,

        /// Plan and print operations without applying them
        #[arg(long)]
        dry_run: bool,
    },

    /// ✅ Validates rule and policy configuration without applying anything
    Validate {
        /// Path to the tag rules file (YAML)
        #[arg(long, default_value = "config/tag_rules.yaml")]
        rules: PathBuf,

        /// Path to the policy configuration file (YAML)
        #[arg(long, default_value = "config/policy_config.yaml")]
        policy_config: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, bail};
    use clap::Parser;

    #[test]
    fn test_cli_parse_scan_defaults() -> Result<()> {
        let args = Cli::parse_from(["tagwarden", "scan"]);
        match args.command {
            Commands::Scan {
                db_path,
                sample_size,
                output_format,
                dry_run,
                schemas,
                ..
            } => {
                assert_eq!(db_path, "warehouse.duckdb");
                assert_eq!(sample_size, 100);
                assert_eq!(output_format, "json");
                assert!(!dry_run);
                assert!(schemas.is_empty());
                Ok(())
            }
            _ => bail!("Expected Scan command"),
        }
    }

    #[test]
    fn test_cli_parse_scan_schemas() -> Result<()> {
        let args = Cli::parse_from([
            "tagwarden",
            "scan",
            "--schemas",
            "sales",
            "--schemas",
            "hr",
            "--sample-size",
            "25",
        ]);
        match args.command {
            Commands::Scan {
                schemas,
                sample_size,
                ..
            } => {
                assert_eq!(schemas, vec!["sales".to_string(), "hr".to_string()]);
                assert_eq!(sample_size, 25);
                Ok(())
            }
            _ => bail!("Expected Scan command"),
        }
    }

    #[test]
    fn test_cli_parse_apply_selectors() -> Result<()> {
        let args = Cli::parse_from(["tagwarden", "apply", "--masking-only", "--dry-run"]);
        match args.command {
            Commands::Apply {
                masking_only,
                row_access_only,
                dry_run,
                ..
            } => {
                assert!(masking_only);
                assert!(!row_access_only);
                assert!(dry_run);
                Ok(())
            }
            _ => bail!("Expected Apply command"),
        }
    }

    #[test]
    fn test_cli_parse_validate() -> Result<()> {
        let args = Cli::parse_from([
            "tagwarden",
            "validate",
            "--policy-config",
            "/tmp/policies.yaml",
        ]);
        match args.command {
            Commands::Validate { policy_config, .. } => {
                assert_eq!(policy_config.to_string_lossy(), "/tmp/policies.yaml");
                Ok(())
            }
            _ => bail!("Expected Validate command"),
        }
    }
}

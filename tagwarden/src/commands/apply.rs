// tagwarden/src/commands/apply.rs

use std::path::{Path, PathBuf};

use anyhow::Result;

use tagwarden_core::application::{ApplyOptions, PiiScanContext, apply_policies};
use tagwarden_core::domain::classification::{Classifier, OverrideMap};
use tagwarden_core::infrastructure::adapters::DuckDbWarehouse;
use tagwarden_core::infrastructure::config::{load_overrides, load_policy_spec, load_rule_set};

#[allow(clippy::too_many_arguments)]
pub async fn run(
    db_path: &str,
    policy_config: &Path,
    rules: &Path,
    overrides: Option<PathBuf>,
    masking_only: bool,
    row_access_only: bool,
    pii_only: bool,
    dry_run: bool,
) -> Result<bool> {
    println!("⚙️  Loading policy configuration...");
    let spec = load_policy_spec(policy_config)?;

    let warehouse = DuckDbWarehouse::new(db_path)?;

    // The PII pass reuses the same classifier stack as `scan`.
    let needs_pii = pii_only || spec.pii_detection.enabled;
    let pii_stack: Option<(Classifier, OverrideMap)> = if needs_pii {
        let classifier = Classifier::new(load_rule_set(rules)?);
        let overrides = match overrides {
            Some(path) => load_overrides(&path)?,
            None => OverrideMap::new(),
        };
        Some((classifier, overrides))
    } else {
        None
    };
    let pii_ctx = pii_stack.as_ref().map(|(classifier, overrides)| PiiScanContext {
        metadata: &warehouse,
        classifier,
        overrides,
    });

    let options = ApplyOptions {
        masking_only,
        row_access_only,
        pii_only,
        dry_run,
    };

    println!("🛡️  Converging governance policies...");
    let report = apply_policies(&spec, &warehouse, &warehouse, pii_ctx, &options).await?;

    if dry_run {
        println!("📋 Planned operations (dry run):");
        println!("{}", serde_json::to_string_pretty(&report.plan.operations)?);
    }

    println!(
        "📝 {} masking policies, {} masked columns, {} row policies, {} restricted tables",
        report.plan.masking_policies_planned(),
        report.plan.columns_to_mask(),
        report.plan.row_policies_planned(),
        report.plan.tables_to_restrict(),
    );
    if needs_pii {
        println!("   {} columns classified by the PII pass", report.columns_tagged);
    }
    for warning in &report.plan.warnings {
        println!("   ⚠️  {}", warning);
    }
    if !dry_run {
        println!(
            "   {} operations executed, {} failed",
            report.operations_executed, report.operations_failed
        );
    }

    Ok(report.success)
}

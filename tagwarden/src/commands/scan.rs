// tagwarden/src/commands/scan.rs

use std::path::{Path, PathBuf};

use anyhow::Result;
use comfy_table::Table;

use tagwarden_core::application::{ScanOptions, scan_metadata};
use tagwarden_core::domain::classification::{Classifier, OverrideMap};
use tagwarden_core::infrastructure::adapters::DuckDbWarehouse;
use tagwarden_core::infrastructure::config::{load_overrides, load_rule_set};
use tagwarden_core::infrastructure::export::{ExportFormat, export_records};

#[allow(clippy::too_many_arguments)]
pub async fn run(
    db_path: &str,
    database: String,
    rules: &Path,
    overrides: Option<PathBuf>,
    schemas: Vec<String>,
    sample_size: usize,
    output: &Path,
    output_format: &str,
    dry_run: bool,
) -> Result<bool> {
    let format: ExportFormat = output_format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    println!("⚙️  Loading classification rules...");
    let classifier = Classifier::new(load_rule_set(rules)?);

    let overrides = match overrides {
        Some(path) => load_overrides(&path)?,
        None => OverrideMap::new(),
    };
    if !overrides.is_empty() {
        println!("   {} manual overrides loaded", overrides.len());
    }

    let warehouse = DuckDbWarehouse::new(db_path)?;

    if dry_run {
        println!("🔎 Scanning (dry run, no tags will be written)...");
    } else {
        println!("🔎 Scanning and tagging columns...");
    }

    let options = ScanOptions {
        database,
        schemas: (!schemas.is_empty()).then_some(schemas),
        sample_size,
        apply_tags: !dry_run,
    };
    let report = scan_metadata(&warehouse, &classifier, &overrides, &options).await?;

    if report.records.is_empty() {
        println!("   No sensitive columns detected.");
    } else {
        let mut table = Table::new();
        table.set_header(vec!["Schema", "Table", "Column", "Category", "Reason"]);
        for record in &report.records {
            table.add_row(vec![
                &record.schema,
                &record.table,
                &record.column,
                &record.tag_value,
                &record.reason,
            ]);
        }
        println!("{table}");
    }

    export_records(&report.records, output, format)?;

    println!(
        "📝 {} columns scanned, {} classified. Results saved to {}",
        report.columns_scanned,
        report.records.len(),
        output.display()
    );

    Ok(report.success)
}

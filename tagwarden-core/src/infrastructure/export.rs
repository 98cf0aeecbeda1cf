// tagwarden-core/src/infrastructure/export.rs

use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::domain::classification::TagRecord;
use crate::error::TagwardenError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("Unsupported export format: {}", other)),
        }
    }
}

/// Writes the classification results to disk. The record order is the scan
/// order; nothing is re-sorted here.
pub fn export_records(
    records: &[TagRecord],
    path: &Path,
    format: ExportFormat,
) -> Result<(), TagwardenError> {
    let content = match format {
        ExportFormat::Json => serde_json::to_string_pretty(records)?,
        ExportFormat::Csv => to_csv(records),
    };
    fs::write(path, content)?;
    info!(count = records.len(), path = %path.display(), "Exported tagging results");
    Ok(())
}

fn to_csv(records: &[TagRecord]) -> String {
    let mut out = String::from("database,schema,table,column,tag_name,tag_value,reason\n");
    for r in records {
        let row = [
            &r.database, &r.schema, &r.table, &r.column, &r.tag_name, &r.tag_value, &r.reason,
        ]
        .map(|f| csv_field(f))
        .join(",");
        out.push_str(&row);
        out.push('\n');
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn record() -> TagRecord {
        TagRecord {
            database: "prod".into(),
            schema: "sales".into(),
            table: "customers".into(),
            column: "email".into(),
            tag_name: "GDPR_CLASSIFICATION".into(),
            tag_value: "EMAIL".into(),
            reason: "name_match: email".into(),
        }
    }

    #[test]
    fn test_export_json() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("results.json");

        export_records(&[record()], &path, ExportFormat::Json)?;

        let parsed: Vec<TagRecord> = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(parsed, vec![record()]);
        Ok(())
    }

    #[test]
    fn test_export_csv_quotes_embedded_commas() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("results.csv");

        let mut rec = record();
        rec.reason = "data_match, 2/10".into();
        export_records(&[rec], &path, ExportFormat::Csv)?;

        let content = fs::read_to_string(&path)?;
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "database,schema,table,column,tag_name,tag_value,reason"
        );
        assert!(lines.next().unwrap().ends_with("\"data_match, 2/10\""));
        Ok(())
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!(ExportFormat::from_str("JSON").unwrap(), ExportFormat::Json);
        assert_eq!(ExportFormat::from_str("csv").unwrap(), ExportFormat::Csv);
        assert!(ExportFormat::from_str("xml").is_err());
    }
}

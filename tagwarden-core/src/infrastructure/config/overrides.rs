// tagwarden-core/src/infrastructure/config/overrides.rs

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, instrument, warn};

use crate::domain::classification::OverrideMap;
use crate::error::TagwardenError;
use crate::infrastructure::error::InfrastructureError;

/// Loads manual overrides, dispatching on the file extension (`.csv` rows
/// or a JSON key/value map).
#[instrument]
pub fn load_overrides(path: &Path) -> Result<OverrideMap, TagwardenError> {
    if !path.exists() {
        return Err(InfrastructureError::ConfigNotFound(path.display().to_string()).into());
    }

    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    let overrides = if is_csv {
        load_from_csv(path)?
    } else {
        load_from_json(path)?
    };

    info!(count = overrides.len(), "Loaded override mappings");
    Ok(overrides)
}

/// Expected format: `{"schema.table.column": "TAG", ...}`, optionally
/// database-qualified keys. BTreeMap keeps the last-write-wins collision
/// rule reproducible regardless of file order.
fn load_from_json(path: &Path) -> Result<OverrideMap, TagwardenError> {
    let content = fs::read_to_string(path)?;
    let raw: BTreeMap<String, String> = serde_json::from_str(&content)?;

    let mut overrides = OverrideMap::new();
    for (key, tag) in &raw {
        overrides.insert(key, tag);
    }
    Ok(overrides)
}

/// Expected columns: `schema,table,column,tag`, with an optional leading
/// `database` column. Plain comma separation; quoted fields are not
/// supported.
fn load_from_csv(path: &Path) -> Result<OverrideMap, TagwardenError> {
    let content = fs::read_to_string(path)?;
    let mut lines = content.lines();

    let header = lines.next().ok_or_else(|| InfrastructureError::OverrideFormat {
        path: path.display().to_string(),
        reason: "empty file".to_string(),
    })?;
    let fields: Vec<String> = header
        .split(',')
        .map(|f| f.trim().to_lowercase())
        .collect();

    let index_of = |name: &str| fields.iter().position(|f| f == name);
    let database_idx = index_of("database");
    let (Some(schema_idx), Some(table_idx), Some(column_idx), Some(tag_idx)) = (
        index_of("schema"),
        index_of("table"),
        index_of("column"),
        index_of("tag"),
    ) else {
        return Err(InfrastructureError::OverrideFormat {
            path: path.display().to_string(),
            reason: "header must contain schema, table, column and tag".to_string(),
        }
        .into());
    };

    let mut overrides = OverrideMap::new();
    for (line_no, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let values: Vec<&str> = line.split(',').map(str::trim).collect();
        if values.len() < fields.len() {
            warn!(line = line_no + 2, "Skipping short override row");
            continue;
        }
        overrides.insert_parts(
            database_idx.map(|i| values[i]),
            values[schema_idx],
            values[table_idx],
            values[column_idx],
            values[tag_idx],
        );
    }
    Ok(overrides)
}

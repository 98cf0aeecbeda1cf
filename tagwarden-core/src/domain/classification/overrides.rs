// tagwarden-core/src/domain/classification/overrides.rs

use std::collections::HashMap;
use tracing::debug;

/// Reference to a column in the warehouse catalog, used for override lookups
/// and result records.
#[derive(Debug, Clone, Copy)]
pub struct ColumnRef<'a> {
    pub database: Option<&'a str>,
    pub schema: &'a str,
    pub table: &'a str,
    pub column: &'a str,
}

impl ColumnRef<'_> {
    /// `schema.table.column`, lower-cased.
    pub fn key(&self) -> String {
        format!("{}.{}.{}", self.schema, self.table, self.column).to_lowercase()
    }

    /// `database.schema.table.column`, lower-cased. None when the run has no
    /// database label.
    pub fn qualified_key(&self) -> Option<String> {
        self.database.filter(|db| !db.is_empty()).map(|db| {
            format!("{}.{}.{}.{}", db, self.schema, self.table, self.column).to_lowercase()
        })
    }
}

/// Manual tag assignments, keyed by a normalized lower-cased identifier.
/// Both granularities (`schema.table.column` and
/// `database.schema.table.column`) are populated so lookup can try the
/// database-qualified key first and fall back. Last write wins on collision.
#[derive(Debug, Clone, Default)]
pub struct OverrideMap {
    entries: HashMap<String, String>,
}

impl OverrideMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a raw `schema.table.column` or
    /// `database.schema.table.column` key. Four-part keys also register
    /// their unqualified form.
    pub fn insert(&mut self, key: &str, tag: &str) {
        let key = key.to_lowercase();
        let parts: Vec<&str> = key.split('.').collect();
        if parts.len() == 4 {
            let simplified = format!("{}.{}.{}", parts[1], parts[2], parts[3]);
            debug!(key = %key, simplified = %simplified, "Registered qualified override");
            self.entries.insert(simplified, tag.to_string());
        }
        self.entries.insert(key, tag.to_string());
    }

    pub fn insert_parts(
        &mut self,
        database: Option<&str>,
        schema: &str,
        table: &str,
        column: &str,
        tag: &str,
    ) {
        match database.filter(|db| !db.is_empty()) {
            Some(db) => {
                self.insert(&format!("{}.{}.{}.{}", db, schema, table, column), tag);
            }
            None => self.insert(&format!("{}.{}.{}", schema, table, column), tag),
        }
    }

    /// Database-qualified key first, then the unqualified key.
    pub fn lookup(&self, column: &ColumnRef) -> Option<&str> {
        if let Some(qualified) = column.qualified_key()
            && let Some(tag) = self.entries.get(&qualified)
        {
            return Some(tag);
        }
        self.entries.get(&column.key()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

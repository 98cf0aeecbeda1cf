// tagwarden-core/src/infrastructure/adapters/duckdb.rs

use async_trait::async_trait;
use duckdb::{Config, Connection, params};
use std::sync::{Arc, Mutex, MutexGuard};

// Imports Hexagonaux
use crate::domain::policy::operation::{
    AttachMaskingPolicy, AttachRowAccessPolicy, UpsertMaskingPolicy, UpsertRowAccessPolicy,
};
use crate::error::TagwardenError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::metadata::{ColumnSchema, MetadataStore};
use crate::ports::policy::PolicyStore;
use crate::ports::tags::{TagState, TaggedColumn};

/// Local warehouse adapter. DuckDB has no native tag or policy objects, so
/// governance state lives in bookkeeping tables under the `tagwarden`
/// schema; the catalog itself is read through information_schema.
pub struct DuckDbWarehouse {
    conn: Arc<Mutex<Connection>>,
}

// Schemas that never take part in a scan.
const INTERNAL_SCHEMAS: [&str; 3] = ["information_schema", "pg_catalog", "tagwarden"];

impl DuckDbWarehouse {
    pub fn new(db_path: &str) -> Result<Self, InfrastructureError> {
        let config = Config::default();

        let conn = if db_path == ":memory:" {
            Connection::open_in_memory_with_flags(config)?
        } else {
            Connection::open_with_flags(db_path, config)?
        };

        conn.execute_batch(
            r"
            CREATE SCHEMA IF NOT EXISTS tagwarden;
            CREATE TABLE IF NOT EXISTS tagwarden.tag_references (
                object_schema VARCHAR,
                object_table  VARCHAR,
                column_name   VARCHAR,
                tag_schema    VARCHAR,
                tag_name      VARCHAR,
                tag_value     VARCHAR
            );
            CREATE TABLE IF NOT EXISTS tagwarden.masking_policies (
                policy_schema VARCHAR,
                policy_name   VARCHAR,
                data_type     VARCHAR,
                expression    VARCHAR,
                comment       VARCHAR
            );
            CREATE TABLE IF NOT EXISTS tagwarden.masking_policy_refs (
                object_schema VARCHAR,
                object_table  VARCHAR,
                column_name   VARCHAR,
                policy_schema VARCHAR,
                policy_name   VARCHAR
            );
            CREATE TABLE IF NOT EXISTS tagwarden.row_access_policies (
                policy_schema VARCHAR,
                policy_name   VARCHAR,
                expression    VARCHAR,
                comment       VARCHAR
            );
            CREATE TABLE IF NOT EXISTS tagwarden.row_access_policy_refs (
                object_schema VARCHAR,
                object_table  VARCHAR,
                policy_schema VARCHAR,
                policy_name   VARCHAR
            );
            ",
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, TagwardenError> {
        self.conn.lock().map_err(|_| {
            TagwardenError::Infrastructure(InfrastructureError::Io(std::io::Error::other(
                "DuckDB Mutex Poisoned",
            )))
        })
    }

    /// Raw statement escape hatch, used by tests and demos to seed data.
    pub fn execute(&self, sql: &str) -> Result<(), TagwardenError> {
        let conn = self.lock()?;
        conn.execute_batch(sql)?;
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for DuckDbWarehouse {
    async fn get_schemas(&self) -> Result<Vec<String>, TagwardenError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT schema_name FROM information_schema.schemata \
             WHERE catalog_name = current_database() \
               AND schema_name NOT IN (?, ?, ?) \
             ORDER BY schema_name",
        )?;
        let rows = stmt.query_map(
            params![INTERNAL_SCHEMAS[0], INTERNAL_SCHEMAS[1], INTERNAL_SCHEMAS[2]],
            |row| row.get::<_, String>(0),
        )?;

        let mut schemas = Vec::new();
        for row in rows {
            schemas.push(row?);
        }
        Ok(schemas)
    }

    async fn get_tables(&self, schema: &str) -> Result<Vec<String>, TagwardenError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_catalog = current_database() \
               AND table_schema = ? AND table_type = 'BASE TABLE' \
             ORDER BY table_name",
        )?;
        let rows = stmt.query_map(params![schema], |row| row.get::<_, String>(0))?;

        let mut tables = Vec::new();
        for row in rows {
            tables.push(row?);
        }
        Ok(tables)
    }

    async fn get_columns(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ColumnSchema>, TagwardenError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT column_name, data_type, is_nullable \
             FROM information_schema.columns \
             WHERE table_schema = ? AND table_name = ? \
             ORDER BY ordinal_position",
        )?;
        let rows = stmt.query_map(params![schema, table], |row| {
            Ok(ColumnSchema {
                name: row.get(0)?,
                data_type: row.get(1)?,
                is_nullable: row.get::<_, String>(2)? == "YES",
            })
        })?;

        let mut columns = Vec::new();
        for row in rows {
            columns.push(row?);
        }
        Ok(columns)
    }

    async fn get_sample_values(
        &self,
        schema: &str,
        table: &str,
        column: &str,
        limit: usize,
    ) -> Result<Vec<Option<String>>, TagwardenError> {
        let conn = self.lock()?;
        // Identifiers cannot be bound as parameters; quote them instead.
        let sql = format!(
            "SELECT CAST(\"{}\" AS VARCHAR) FROM \"{}\".\"{}\" LIMIT {}",
            column, schema, table, limit
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, Option<String>>(0))?;

        let mut samples = Vec::new();
        for row in rows {
            samples.push(row?);
        }
        Ok(samples)
    }

    async fn apply_tag(
        &self,
        schema: &str,
        table: &str,
        column: &str,
        tag_name: &str,
        tag_value: &str,
        tag_schema: &str,
    ) -> Result<bool, TagwardenError> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM tagwarden.tag_references \
             WHERE object_schema = ? AND object_table = ? AND column_name = ? \
               AND upper(tag_name) = upper(?)",
            params![schema, table, column, tag_name],
        )?;
        conn.execute(
            "INSERT INTO tagwarden.tag_references VALUES (?, ?, ?, ?, ?, ?)",
            params![schema, table, column, tag_schema, tag_name, tag_value],
        )?;
        Ok(true)
    }
}

#[async_trait]
impl TagState for DuckDbWarehouse {
    async fn get_columns_by_category(
        &self,
        _database: &str, // single-catalog engine, the label is informational
        tag_name: &str,
        categories: &[String],
    ) -> Result<Vec<TaggedColumn>, TagwardenError> {
        let rows = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare(
                "SELECT t.object_schema, t.object_table, t.column_name, c.data_type, t.tag_value \
                 FROM tagwarden.tag_references t \
                 JOIN information_schema.columns c \
                   ON c.table_schema = t.object_schema \
                  AND c.table_name = t.object_table \
                  AND c.column_name = t.column_name \
                 WHERE upper(t.tag_name) = upper(?) \
                 ORDER BY t.object_schema, t.object_table, t.column_name",
            )?;
            let mapped = stmt.query_map(params![tag_name], |row| {
                Ok(TaggedColumn {
                    schema: row.get(0)?,
                    table: row.get(1)?,
                    column: row.get(2)?,
                    data_type: row.get(3)?,
                    tag_value: row.get(4)?,
                })
            })?;

            let mut rows = Vec::new();
            for row in mapped {
                rows.push(row?);
            }
            rows
        };

        // Category filtering mirrors the warehouse view semantics: the tag
        // value contains the category, case-insensitive.
        Ok(rows
            .into_iter()
            .filter(|col| {
                let value = col.tag_value.to_uppercase();
                categories.iter().any(|cat| value.contains(&cat.to_uppercase()))
            })
            .collect())
    }

    async fn get_active_schema(&self, _database: &str) -> Result<String, TagwardenError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT current_schema()")?;
        let schema = stmt.query_row([], |row| row.get::<_, String>(0))?;
        Ok(schema)
    }

    async fn list_tag_names(&self, _database: &str) -> Result<Vec<String>, TagwardenError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT tag_name FROM tagwarden.tag_references ORDER BY tag_name")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut tags = Vec::new();
        for row in rows {
            tags.push(row?);
        }
        Ok(tags)
    }
}

#[async_trait]
impl PolicyStore for DuckDbWarehouse {
    async fn upsert_masking_policy(
        &self,
        op: &UpsertMaskingPolicy,
    ) -> Result<(), TagwardenError> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM tagwarden.masking_policies \
             WHERE policy_schema = ? AND upper(policy_name) = upper(?)",
            params![op.schema, op.object_name()],
        )?;
        conn.execute(
            "INSERT INTO tagwarden.masking_policies VALUES (?, ?, ?, ?, ?)",
            params![
                op.schema,
                op.object_name(),
                op.data_type,
                op.expression,
                op.comment
            ],
        )?;
        Ok(())
    }

    async fn attach_masking_policy(
        &self,
        op: &AttachMaskingPolicy,
    ) -> Result<(), TagwardenError> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM tagwarden.masking_policy_refs \
             WHERE object_schema = ? AND object_table = ? AND column_name = ?",
            params![op.schema, op.table, op.column],
        )?;
        conn.execute(
            "INSERT INTO tagwarden.masking_policy_refs VALUES (?, ?, ?, ?, ?)",
            params![op.schema, op.table, op.column, op.policy_schema, op.policy_name],
        )?;
        Ok(())
    }

    async fn upsert_row_access_policy(
        &self,
        op: &UpsertRowAccessPolicy,
    ) -> Result<(), TagwardenError> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM tagwarden.row_access_policies \
             WHERE policy_schema = ? AND upper(policy_name) = upper(?)",
            params![op.schema, op.name],
        )?;
        conn.execute(
            "INSERT INTO tagwarden.row_access_policies VALUES (?, ?, ?, ?)",
            params![op.schema, op.name, op.expression, op.comment],
        )?;
        Ok(())
    }

    async fn attach_row_access_policy(
        &self,
        op: &AttachRowAccessPolicy,
    ) -> Result<(), TagwardenError> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM tagwarden.row_access_policy_refs \
             WHERE object_schema = ? AND object_table = ? \
               AND policy_schema = ? AND policy_name = ?",
            params![op.schema, op.table, op.policy_schema, op.policy_name],
        )?;
        conn.execute(
            "INSERT INTO tagwarden.row_access_policy_refs VALUES (?, ?, ?, ?)",
            params![op.schema, op.table, op.policy_schema, op.policy_name],
        )?;
        Ok(())
    }
}

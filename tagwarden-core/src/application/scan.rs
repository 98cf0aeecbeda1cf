// tagwarden-core/src/application/scan.rs

use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::domain::classification::{Classifier, ColumnRef, OverrideMap, TagRecord};
use crate::error::TagwardenError;
use crate::ports::metadata::MetadataStore;

pub struct ScanOptions {
    /// Database label carried into result records and override lookups.
    pub database: String,
    /// None means every schema the store reports.
    pub schemas: Option<Vec<String>>,
    pub sample_size: usize,
    /// When false the run is a dry scan: decisions are recorded but no tag
    /// is written back.
    pub apply_tags: bool,
}

#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub records: Vec<TagRecord>,
    pub columns_scanned: usize,
    pub success: bool,
    pub completed_at: String,
}

/// The classification run: walks schemas, tables and columns, samples each
/// column, consults overrides, and tags what the classifier recognizes.
/// Per-object transport failures are logged and folded into the aggregate
/// success flag so one bad table never blocks the rest of the warehouse.
#[instrument(skip(store, classifier, overrides, options), fields(database = %options.database))]
pub async fn scan_metadata(
    store: &dyn MetadataStore,
    classifier: &Classifier,
    overrides: &OverrideMap,
    options: &ScanOptions,
) -> Result<ScanReport, TagwardenError> {
    let tag_name = classifier.rules().tag_name().to_string();
    let tag_schema = classifier.rules().tag_schema().to_string();
    info!(tag_name = %tag_name, overrides = overrides.len(), "Starting classification run");

    let mut records = Vec::new();
    let mut columns_scanned = 0usize;
    let mut success = true;

    let schemas = match &options.schemas {
        Some(schemas) if !schemas.is_empty() => schemas.clone(),
        _ => store.get_schemas().await?,
    };

    for schema in &schemas {
        info!(schema = %schema, "Processing schema");

        let tables = match store.get_tables(schema).await {
            Ok(tables) => tables,
            Err(e) => {
                error!(schema = %schema, error = %e, "Failed to list tables");
                success = false;
                continue;
            }
        };

        for table in &tables {
            let columns = match store.get_columns(schema, table).await {
                Ok(columns) => columns,
                Err(e) => {
                    error!(table = %table, error = %e, "Failed to list columns");
                    success = false;
                    continue;
                }
            };

            for column in &columns {
                columns_scanned += 1;

                let samples = match store
                    .get_sample_values(schema, table, &column.name, options.sample_size)
                    .await
                {
                    Ok(samples) => samples,
                    Err(e) => {
                        // Name rules and overrides still apply without data.
                        warn!(column = %column.name, error = %e, "Sampling failed, classifying by name only");
                        success = false;
                        Vec::new()
                    }
                };

                let column_ref = ColumnRef {
                    database: (!options.database.is_empty()).then_some(options.database.as_str()),
                    schema,
                    table,
                    column: &column.name,
                };

                let Some(decision) = classifier.classify(&column_ref, &samples, overrides) else {
                    continue;
                };

                if options.apply_tags {
                    match store
                        .apply_tag(
                            schema,
                            table,
                            &column.name,
                            &tag_name,
                            &decision.category,
                            &tag_schema,
                        )
                        .await
                    {
                        Ok(true) => {}
                        Ok(false) => {
                            warn!(column = %column.name, "Tag was not applied");
                            success = false;
                            continue;
                        }
                        Err(e) => {
                            error!(column = %column.name, error = %e, "Failed to apply tag");
                            success = false;
                            continue;
                        }
                    }
                }

                info!(
                    column = %format!("{}.{}.{}", schema, table, column.name),
                    category = %decision.category,
                    reason = %decision.reason,
                    "Column classified"
                );
                records.push(TagRecord {
                    database: options.database.clone(),
                    schema: schema.clone(),
                    table: table.clone(),
                    column: column.name.clone(),
                    tag_name: tag_name.clone(),
                    tag_value: decision.category,
                    reason: decision.reason.to_string(),
                });
            }
        }
    }

    Ok(ScanReport {
        records,
        columns_scanned,
        success,
        completed_at: chrono::Utc::now().to_rfc3339(),
    })
}

// --- UNIT TESTS ---
#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::classification::rules::{PatternEntry, RuleDocument, RuleSet};
    use crate::ports::metadata::ColumnSchema;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeMetadataStore {
        schemas: Vec<String>,
        tables: HashMap<String, Vec<String>>,
        columns: HashMap<(String, String), Vec<ColumnSchema>>,
        samples: HashMap<(String, String, String), Vec<Option<String>>>,
        applied: Mutex<Vec<(String, String, String, String)>>,
    }

    impl FakeMetadataStore {
        fn new() -> Self {
            let mut tables = HashMap::new();
            tables.insert("sales".to_string(), vec!["customers".to_string()]);

            let mut columns = HashMap::new();
            columns.insert(
                ("sales".to_string(), "customers".to_string()),
                vec![
                    ColumnSchema {
                        name: "user_email".to_string(),
                        data_type: "VARCHAR".to_string(),
                        is_nullable: true,
                    },
                    ColumnSchema {
                        name: "notes".to_string(),
                        data_type: "VARCHAR".to_string(),
                        is_nullable: true,
                    },
                ],
            );

            let mut samples = HashMap::new();
            samples.insert(
                (
                    "sales".to_string(),
                    "customers".to_string(),
                    "notes".to_string(),
                ),
                vec![Some("123-45-6789".to_string()), Some("plain".to_string())],
            );

            Self {
                schemas: vec!["sales".to_string()],
                tables,
                columns,
                samples,
                applied: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MetadataStore for FakeMetadataStore {
        async fn get_schemas(&self) -> Result<Vec<String>, TagwardenError> {
            Ok(self.schemas.clone())
        }

        async fn get_tables(&self, schema: &str) -> Result<Vec<String>, TagwardenError> {
            Ok(self.tables.get(schema).cloned().unwrap_or_default())
        }

        async fn get_columns(
            &self,
            schema: &str,
            table: &str,
        ) -> Result<Vec<ColumnSchema>, TagwardenError> {
            Ok(self
                .columns
                .get(&(schema.to_string(), table.to_string()))
                .cloned()
                .unwrap_or_default())
        }

        async fn get_sample_values(
            &self,
            schema: &str,
            table: &str,
            column: &str,
            _limit: usize,
        ) -> Result<Vec<Option<String>>, TagwardenError> {
            Ok(self
                .samples
                .get(&(schema.to_string(), table.to_string(), column.to_string()))
                .cloned()
                .unwrap_or_default())
        }

        async fn apply_tag(
            &self,
            schema: &str,
            table: &str,
            column: &str,
            tag_name: &str,
            _tag_value: &str,
            _tag_schema: &str,
        ) -> Result<bool, TagwardenError> {
            self.applied.lock().unwrap().push((
                schema.to_string(),
                table.to_string(),
                column.to_string(),
                tag_name.to_string(),
            ));
            Ok(true)
        }
    }

    fn classifier() -> Classifier {
        let doc = RuleDocument {
            name_patterns: vec![PatternEntry {
                pattern: "email".to_string(),
                category: Some("EMAIL".to_string()),
                category_id: None,
            }],
            data_patterns: vec![PatternEntry {
                pattern: r"\d{3}-\d{2}-\d{4}".to_string(),
                category: Some("SSN".to_string()),
                category_id: None,
            }],
            ..Default::default()
        };
        Classifier::new(RuleSet::compile(&doc).unwrap())
    }

    fn options(apply_tags: bool) -> ScanOptions {
        ScanOptions {
            database: "local".to_string(),
            schemas: None,
            sample_size: 100,
            apply_tags,
        }
    }

    #[tokio::test]
    async fn test_scan_classifies_and_tags() -> Result<()> {
        let store = FakeMetadataStore::new();
        let report =
            scan_metadata(&store, &classifier(), &OverrideMap::new(), &options(true)).await?;

        assert!(report.success);
        assert_eq!(report.columns_scanned, 2);
        assert_eq!(report.records.len(), 2);

        assert_eq!(report.records[0].column, "user_email");
        assert_eq!(report.records[0].tag_value, "EMAIL");
        assert_eq!(report.records[0].reason, "name_match: user_email");
        assert_eq!(report.records[1].column, "notes");
        assert_eq!(report.records[1].tag_value, "SSN");
        assert_eq!(report.records[1].reason, "data_match: 1/2");

        assert_eq!(store.applied.lock().unwrap().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_dry_scan_writes_no_tags() -> Result<()> {
        let store = FakeMetadataStore::new();
        let report =
            scan_metadata(&store, &classifier(), &OverrideMap::new(), &options(false)).await?;

        assert_eq!(report.records.len(), 2);
        assert!(store.applied.lock().unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_override_short_circuits_detection() -> Result<()> {
        let store = FakeMetadataStore::new();
        let mut overrides = OverrideMap::new();
        overrides.insert("local.sales.customers.user_email", "CONTACT_INFO");

        let report = scan_metadata(&store, &classifier(), &overrides, &options(false)).await?;

        assert_eq!(report.records[0].tag_value, "CONTACT_INFO");
        assert_eq!(report.records[0].reason, "override");
        Ok(())
    }

    #[tokio::test]
    async fn test_explicit_schema_scope() -> Result<()> {
        let store = FakeMetadataStore::new();
        let opts = ScanOptions {
            schemas: Some(vec!["empty_schema".to_string()]),
            ..options(false)
        };
        let report = scan_metadata(&store, &classifier(), &OverrideMap::new(), &opts).await?;

        assert_eq!(report.columns_scanned, 0);
        assert!(report.records.is_empty());
        Ok(())
    }
}

// tagwarden-core/src/ports/metadata.rs

// The catalog-walking contract: what the classification run needs from a
// warehouse, without knowing which engine sits behind it.

use crate::error::TagwardenError;
use async_trait::async_trait;

// Engine-independent column description
#[derive(Debug, Clone)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
}

#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn get_schemas(&self) -> Result<Vec<String>, TagwardenError>;

    async fn get_tables(&self, schema: &str) -> Result<Vec<String>, TagwardenError>;

    async fn get_columns(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ColumnSchema>, TagwardenError>;

    /// Sample values are stringified by the adapter; NULLs survive as None
    /// so the classifier can exclude them from its denominator.
    async fn get_sample_values(
        &self,
        schema: &str,
        table: &str,
        column: &str,
        limit: usize,
    ) -> Result<Vec<Option<String>>, TagwardenError>;

    /// Attach-or-replace a tag value on a column. Repeating the call with
    /// the same arguments must leave the warehouse unchanged.
    async fn apply_tag(
        &self,
        schema: &str,
        table: &str,
        column: &str,
        tag_name: &str,
        tag_value: &str,
        tag_schema: &str,
    ) -> Result<bool, TagwardenError>;
}

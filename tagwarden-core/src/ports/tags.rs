// tagwarden-core/src/ports/tags.rs

// Read side consumed by the policy planner: "what is currently tagged with
// what". Implementations must return rows in a stable order so that repeated
// plans over unchanged state emit identical operation lists.

use crate::error::TagwardenError;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedColumn {
    pub schema: String,
    pub table: String,
    pub column: String,
    pub data_type: String,
    pub tag_value: String,
}

#[async_trait]
pub trait TagState: Send + Sync {
    /// Columns carrying `tag_name` with a value matching any of `categories`
    /// (case-insensitive containment, as warehouse tag values are free text).
    async fn get_columns_by_category(
        &self,
        database: &str,
        tag_name: &str,
        categories: &[String],
    ) -> Result<Vec<TaggedColumn>, TagwardenError>;

    /// The connection's current schema, used when the spec leaves
    /// `policy_schema` unset.
    async fn get_active_schema(&self, database: &str) -> Result<String, TagwardenError>;

    async fn list_tag_names(&self, database: &str) -> Result<Vec<String>, TagwardenError>;
}

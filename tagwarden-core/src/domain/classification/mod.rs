// tagwarden-core/src/domain/classification/mod.rs

pub mod classifier;
pub mod overrides;
pub mod rules;

// Re-exports
pub use classifier::{Classifier, TagReason, TaggingDecision};
pub use overrides::{ColumnRef, OverrideMap};
pub use rules::{CategoryEntry, PatternEntry, RuleDocument, RuleSet, TagConfiguration};

use serde::{Deserialize, Serialize};

/// One row of a classification run's result set. Format-neutral: the export
/// layer decides how records are serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    pub database: String,
    pub schema: String,
    pub table: String,
    pub column: String,
    pub tag_name: String,
    pub tag_value: String,
    pub reason: String,
}

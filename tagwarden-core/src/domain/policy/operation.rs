// tagwarden-core/src/domain/policy/operation.rs

use serde::Serialize;

/// One masking policy per (base name, data type) pair, create-or-replace
/// semantics. `name` is the base policy name; the warehouse object is
/// `{name}_{data_type}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpsertMaskingPolicy {
    pub database: String,
    pub schema: String,
    pub name: String,
    pub data_type: String,
    pub expression: String,
    pub comment: String,
}

impl UpsertMaskingPolicy {
    pub fn object_name(&self) -> String {
        format!("{}_{}", self.name, self.data_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachMaskingPolicy {
    pub database: String,
    pub policy_schema: String,
    /// Full object name, data-type suffix included.
    pub policy_name: String,
    pub schema: String,
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpsertRowAccessPolicy {
    pub database: String,
    pub schema: String,
    pub name: String,
    pub expression: String,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachRowAccessPolicy {
    pub database: String,
    pub policy_schema: String,
    pub policy_name: String,
    pub schema: String,
    pub table: String,
}

/// Planner output. Every variant is idempotent by construction: upserts use
/// create-or-replace semantics, attaches are safe to repeat, so a partially
/// applied plan is always safe to re-run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    UpsertMaskingPolicy(UpsertMaskingPolicy),
    AttachMaskingPolicy(AttachMaskingPolicy),
    UpsertRowAccessPolicy(UpsertRowAccessPolicy),
    AttachRowAccessPolicy(AttachRowAccessPolicy),
}

/// Outcome of a planning run. `success` is the fail-soft aggregate: a
/// sub-step failure clears it but planning continues for the remaining
/// categories and rules.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub operations: Vec<Operation>,
    pub success: bool,
    pub warnings: Vec<String>,
    /// Set when the spec asks for PII auto-tagging; the scan use case picks
    /// this up after the plan executes.
    pub pii_auto_tagging: bool,
}

impl PlanReport {
    pub fn new() -> Self {
        Self {
            operations: Vec::new(),
            success: true,
            warnings: Vec::new(),
            pii_auto_tagging: false,
        }
    }

    pub fn masking_policies_planned(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::UpsertMaskingPolicy(_)))
            .count()
    }

    pub fn columns_to_mask(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::AttachMaskingPolicy(_)))
            .count()
    }

    pub fn row_policies_planned(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::UpsertRowAccessPolicy(_)))
            .count()
    }

    pub fn tables_to_restrict(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::AttachRowAccessPolicy(_)))
            .count()
    }
}

impl Default for PlanReport {
    fn default() -> Self {
        Self::new()
    }
}

// tagwarden-core/src/domain/policy/mod.rs

pub mod data_type;
pub mod operation;
pub mod planner;
pub mod spec;
pub mod substitution;

// Re-exports
pub use data_type::normalize_data_type;
pub use operation::{
    AttachMaskingPolicy, AttachRowAccessPolicy, Operation, PlanReport, UpsertMaskingPolicy,
    UpsertRowAccessPolicy,
};
pub use planner::{PolicyPlanner, sanitize_policy_name};
pub use spec::{
    AutoTagging, CategoryPolicy, GlobalSettings, MaskingPolicyTemplate, PiiDetectionSettings,
    PolicySpec, RowAccessRule,
};
pub use substitution::{VariableTable, substitute_str, substitute_tree};

// tagwarden-core/src/domain/policy/spec.rs

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;
use validator::Validate;

// --- CONFIGURATION STRUCTS ---

/// The declarative governance spec, validated once at the load boundary.
/// Everything downstream consumes the validated structure, never raw maps.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, Default)]
pub struct PolicySpec {
    #[serde(default)]
    pub global: GlobalSettings,

    #[validate(nested)]
    #[serde(default)]
    pub category_policies: Vec<CategoryPolicy>,

    #[validate(nested)]
    #[serde(default)]
    pub row_access: Vec<RowAccessRule>,

    #[serde(default)]
    pub pii_detection: PiiDetectionSettings,
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct GlobalSettings {
    #[serde(default)]
    pub database: String,

    #[serde(default = "default_admin_role")]
    pub admin_role: String,

    /// Unset means "resolve from the connection's active schema at plan
    /// time, falling back to PUBLIC".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_schema: Option<String>,

    #[serde(default = "default_tag")]
    pub default_tag: String,
}

fn default_admin_role() -> String {
    "ACCOUNTADMIN".to_string()
}

fn default_tag() -> String {
    "PII".to_string()
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            database: String::new(),
            admin_role: default_admin_role(),
            policy_schema: None,
            default_tag: default_tag(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct CategoryPolicy {
    #[validate(length(min = 1, message = "Category cannot be empty"))]
    pub category: String,

    #[validate(nested)]
    #[serde(default)]
    pub masking_policy: MaskingPolicyTemplate,
}

/// Masking policy template keyed by normalized target data type. BTreeMap
/// keeps per-category operation order stable across runs.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, Default)]
pub struct MaskingPolicyTemplate {
    /// Derived from the category when unset (sanitized policy name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Defaults to the resolved global policy schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default)]
    pub comment: String,

    #[serde(default)]
    pub data_types: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct RowAccessRule {
    #[validate(length(min = 1, message = "Row access policy name cannot be empty"))]
    pub name: String,

    #[validate(length(min = 1, message = "Row access policy schema cannot be empty"))]
    pub schema: String,

    #[validate(length(min = 1, message = "policy_expression cannot be empty"))]
    pub policy_expression: String,

    #[serde(default)]
    pub apply_to_categories: Vec<String>,

    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct PiiDetectionSettings {
    #[serde(default)]
    pub enabled: bool,

    /// Schemas to scan; empty means every schema the store reports.
    #[serde(default)]
    pub scan_schemas: Vec<String>,

    #[serde(default)]
    pub auto_tagging: AutoTagging,

    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AutoTagging {
    #[serde(default)]
    pub enabled: bool,
}

fn default_sample_size() -> usize {
    100
}

impl PolicySpec {
    /// Fail-fast validation at the load boundary. A spec that passes here
    /// can only fail operationally (transport), never structurally.
    pub fn validate_spec(&self) -> Result<(), DomainError> {
        self.validate()
            .map_err(|e| DomainError::ConfigError(e.to_string()))?;

        if self.global.database.is_empty() {
            warn!("No database specified in global settings, will use connection database");
        }

        for policy in &self.category_policies {
            if policy.masking_policy.data_types.is_empty() {
                return Err(DomainError::ConfigError(format!(
                    "No data types defined for masking policy in category '{}'",
                    policy.category
                )));
            }
        }

        for rule in &self.row_access {
            if rule.apply_to_categories.is_empty() {
                return Err(DomainError::ConfigError(format!(
                    "Row access policy '{}' missing apply_to_categories",
                    rule.name
                )));
            }
        }

        if self.pii_detection.enabled && self.pii_detection.scan_schemas.is_empty() {
            warn!("PII detection enabled but no schemas specified for scanning");
        }

        Ok(())
    }
}

// tagwarden-core/src/infrastructure/config/rules.rs

use std::fs;
use std::path::Path;
use tracing::{info, instrument};

use crate::domain::classification::{RuleDocument, RuleSet};
use crate::error::TagwardenError;
use crate::infrastructure::error::InfrastructureError;

/// Loads and compiles a tag rules file (YAML). Compilation is strict:
/// an invalid regex anywhere in the file aborts the run before any
/// classification happens.
#[instrument]
pub fn load_rule_set(path: &Path) -> Result<RuleSet, TagwardenError> {
    if !path.exists() {
        return Err(InfrastructureError::ConfigNotFound(path.display().to_string()).into());
    }

    let content = fs::read_to_string(path)?;
    let doc: RuleDocument = serde_yaml::from_str(&content)?;
    let rules = RuleSet::compile(&doc)?;

    info!(
        name_rules = rules.name_rules().len(),
        content_rules = rules.content_rules().len(),
        tag_name = rules.tag_name(),
        "Loaded tag rules"
    );

    Ok(rules)
}

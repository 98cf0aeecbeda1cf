// tagwarden/src/commands/validate.rs

use std::path::Path;

use anyhow::Result;

use tagwarden_core::infrastructure::config::{load_policy_spec, load_rule_set};

/// Fail-fast configuration check: loading already performs compilation and
/// validation, so reaching the summary line means both files are usable.
pub fn run(rules: &Path, policy_config: &Path) -> Result<()> {
    let rule_set = load_rule_set(rules)?;
    println!(
        "✅ Rules valid: {} name patterns, {} data patterns, tag '{}'",
        rule_set.name_rules().len(),
        rule_set.content_rules().len(),
        rule_set.tag_name()
    );

    let spec = load_policy_spec(policy_config)?;
    println!(
        "✅ Policy spec valid: {} category policies, {} row access policies",
        spec.category_policies.len(),
        spec.row_access.len()
    );

    Ok(())
}

// tagwarden-core/src/infrastructure/config/policy.rs

use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{info, instrument, warn};

use crate::domain::policy::PolicySpec;
use crate::error::TagwardenError;
use crate::infrastructure::error::InfrastructureError;

// Matches ${ENV_VAR} or $ENV_VAR references in the raw YAML text.
const ENV_VAR_PATTERN: &str = r"\$\{([A-Za-z0-9_]+)\}|\$([A-Za-z0-9_]+)";

/// Policy files may wrap the spec under a top-level `policies:` key.
#[derive(Deserialize)]
struct PolicyFile {
    policies: PolicySpec,
}

/// Loads the declarative policy spec: environment variables are resolved in
/// the raw text before parsing, then the spec is validated fail-fast. A
/// malformed spec aborts before any warehouse mutation.
#[instrument]
pub fn load_policy_spec(path: &Path) -> Result<PolicySpec, TagwardenError> {
    if !path.exists() {
        return Err(InfrastructureError::ConfigNotFound(path.display().to_string()).into());
    }

    let content = fs::read_to_string(path)?;
    let content = interpolate(&content, |name| std::env::var(name).ok());

    let spec = match serde_yaml::from_str::<PolicyFile>(&content) {
        Ok(file) => file.policies,
        Err(_) => serde_yaml::from_str::<PolicySpec>(&content)?,
    };

    spec.validate_spec()?;

    info!(
        row_access = spec.row_access.len(),
        category_policies = spec.category_policies.len(),
        "Loaded policy spec"
    );

    Ok(spec)
}

/// Replaces environment variable references with their values. Unresolved
/// references stay intact: `${admin_role}`-style policy variables share the
/// syntax and are substituted later by the planner.
fn interpolate(content: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let Ok(pattern) = Regex::new(ENV_VAR_PATTERN) else {
        return content.to_string();
    };

    pattern
        .replace_all(content, |caps: &regex::Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match lookup(name) {
                Some(value) => value,
                None => {
                    warn!(variable = name, "Environment variable not found");
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_interpolate_both_forms() {
        let lookup = |name: &str| match name {
            "SNOWFLAKE_DATABASE" => Some("ANALYTICS".to_string()),
            _ => None,
        };
        assert_eq!(
            interpolate("database: ${SNOWFLAKE_DATABASE}", lookup),
            "database: ANALYTICS"
        );
        assert_eq!(
            interpolate("database: $SNOWFLAKE_DATABASE", lookup),
            "database: ANALYTICS"
        );
    }

    #[test]
    fn test_interpolate_leaves_unknown_references() {
        let lookup = |_: &str| None;
        assert_eq!(
            interpolate("expr: \"role = ${admin_role}\"", lookup),
            "expr: \"role = ${admin_role}\""
        );
    }

    #[test]
    fn test_load_wrapped_policy_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            r#"
policies:
  global:
    database: ANALYTICS
  category_policies:
    - category: EMAIL
      masking_policy:
        data_types:
          VARCHAR: "'***'"
"#
        )?;

        let spec = load_policy_spec(file.path())?;
        assert_eq!(spec.global.database, "ANALYTICS");
        assert_eq!(spec.category_policies.len(), 1);
        Ok(())
    }

    #[test]
    fn test_load_bare_policy_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            r#"
global:
  database: ANALYTICS
"#
        )?;

        let spec = load_policy_spec(file.path())?;
        assert_eq!(spec.global.database, "ANALYTICS");
        Ok(())
    }

    #[test]
    fn test_invalid_spec_fails_at_load() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            r#"
category_policies:
  - category: EMAIL
    masking_policy:
      name: mask_email
"#
        )?;

        // data_types missing: the load must fail before anything runs
        assert!(load_policy_spec(file.path()).is_err());
        Ok(())
    }
}

// tagwarden-core/src/domain/policy/planner.rs

use std::collections::HashSet;

use crate::domain::policy::data_type::normalize_data_type;
use crate::domain::policy::operation::{
    AttachMaskingPolicy, AttachRowAccessPolicy, Operation, PlanReport, UpsertMaskingPolicy,
    UpsertRowAccessPolicy,
};
use crate::domain::policy::spec::PolicySpec;
use crate::domain::policy::substitution::{VariableTable, substitute_tree};
use crate::error::TagwardenError;
use crate::ports::tags::TagState;
use tracing::{error, info, warn};

/// The convergence engine: declarative spec + current tag state in,
/// ordered idempotent operations out. Planning never mutates the
/// warehouse; execution belongs to the PolicyStore.
pub struct PolicyPlanner<'a> {
    tags: &'a dyn TagState,
}

/// Resolved once at plan start and threaded through; the planner keeps no
/// mutable run state of its own.
struct RunContext {
    database: String,
    admin_role: String,
    policy_schema: String,
    tag_name: String,
}

impl<'a> PolicyPlanner<'a> {
    pub fn new(tags: &'a dyn TagState) -> Self {
        Self { tags }
    }

    pub async fn plan(&self, spec: &PolicySpec) -> Result<PlanReport, TagwardenError> {
        let mut report = PlanReport::new();

        // 1. Resolve the policy schema: explicit setting, else the
        // connection's active schema, else PUBLIC.
        let policy_schema = match spec.global.policy_schema.as_deref() {
            Some(schema) if !schema.is_empty() => schema.to_string(),
            _ => match self.tags.get_active_schema(&spec.global.database).await {
                Ok(schema) if !schema.is_empty() => {
                    info!(schema = %schema, "Using active schema as policy schema");
                    schema
                }
                Ok(_) => {
                    warn!("No active schema detected, defaulting to PUBLIC");
                    "PUBLIC".to_string()
                }
                Err(e) => {
                    warn!(error = %e, "Active schema lookup failed, defaulting to PUBLIC");
                    "PUBLIC".to_string()
                }
            },
        };

        let ctx = RunContext {
            database: spec.global.database.clone(),
            admin_role: spec.global.admin_role.clone(),
            policy_schema,
            tag_name: spec.global.default_tag.clone(),
        };

        // 2. Substitute the variable table across the whole spec tree.
        let spec = resolve_spec_variables(spec, &ctx)?;

        // 3. Masking policies per category.
        for policy in &spec.category_policies {
            self.plan_category(policy, &ctx, &mut report).await;
        }

        // 4. Row access policies.
        self.plan_row_access(&spec, &ctx, &mut report).await;

        // 5. PII detection is a classification concern; the plan only
        // records whether auto-tagging was requested.
        if spec.pii_detection.enabled {
            report.pii_auto_tagging = spec.pii_detection.auto_tagging.enabled;
            info!(
                auto_tagging = report.pii_auto_tagging,
                schemas = spec.pii_detection.scan_schemas.len(),
                "PII detection requested"
            );
        }

        Ok(report)
    }

    async fn plan_category(
        &self,
        policy: &crate::domain::policy::spec::CategoryPolicy,
        ctx: &RunContext,
        report: &mut PlanReport,
    ) {
        let category = &policy.category;
        if category.is_empty() {
            warn!("Skipping policy with missing category");
            return;
        }

        let masking = &policy.masking_policy;
        if masking.data_types.is_empty() {
            warn!(category = %category, "No masking policy defined for category");
            return;
        }

        let policy_name = masking
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| sanitize_policy_name(category));
        let schema = masking
            .schema
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| ctx.policy_schema.clone());

        for (data_type, expression) in &masking.data_types {
            // Substitution already ran over the tree; this hand-patch keeps
            // admin gating correct even for specs written against the
            // hardcoded ACCOUNTADMIN form.
            let expression = patch_admin_role(expression, &ctx.admin_role);
            report
                .operations
                .push(Operation::UpsertMaskingPolicy(UpsertMaskingPolicy {
                    database: ctx.database.clone(),
                    schema: schema.clone(),
                    name: policy_name.clone(),
                    data_type: data_type.clone(),
                    expression,
                    comment: masking.comment.clone(),
                }));
        }

        let tagged = match self
            .tags
            .get_columns_by_category(&ctx.database, &ctx.tag_name, std::slice::from_ref(category))
            .await
        {
            Ok(columns) => columns,
            Err(e) => {
                error!(category = %category, error = %e, "Error retrieving tagged columns");
                report.success = false;
                return;
            }
        };

        for column in tagged {
            let normalized = normalize_data_type(&column.data_type);
            if !masking.data_types.contains_key(&normalized) {
                let msg = format!(
                    "No masking policy for data type {} in category {}",
                    normalized, category
                );
                warn!("{}", msg);
                report.warnings.push(msg);
                continue;
            }
            report
                .operations
                .push(Operation::AttachMaskingPolicy(AttachMaskingPolicy {
                    database: ctx.database.clone(),
                    policy_schema: schema.clone(),
                    policy_name: format!("{}_{}", policy_name, normalized),
                    schema: column.schema,
                    table: column.table,
                    column: column.column,
                }));
        }
    }

    async fn plan_row_access(&self, spec: &PolicySpec, ctx: &RunContext, report: &mut PlanReport) {
        if spec.row_access.is_empty() {
            return;
        }

        // Tag verification is best effort: a transport failure here only
        // logs, but a genuinely absent tag means no column can gate any
        // table yet, so the whole section is skipped.
        match self.tags.list_tag_names(&ctx.database).await {
            Ok(tags) => {
                let known: HashSet<String> = tags.iter().map(|t| t.to_uppercase()).collect();
                if !known.contains(&ctx.tag_name.to_uppercase()) {
                    let msg = format!(
                        "Tag '{}' not found in database; run the metadata tagging process first",
                        ctx.tag_name
                    );
                    warn!("{}", msg);
                    report.warnings.push(msg);
                    report.success = false;
                    return;
                }
            }
            Err(e) => {
                warn!(error = %e, "Error checking available tags, continuing without verification");
            }
        }

        for rule in &spec.row_access {
            report
                .operations
                .push(Operation::UpsertRowAccessPolicy(UpsertRowAccessPolicy {
                    database: ctx.database.clone(),
                    schema: rule.schema.clone(),
                    name: rule.name.clone(),
                    expression: rule.policy_expression.clone(),
                    comment: rule.comment.clone(),
                }));

            let tagged = match self
                .tags
                .get_columns_by_category(&ctx.database, &ctx.tag_name, &rule.apply_to_categories)
                .await
            {
                Ok(columns) => columns,
                Err(e) => {
                    error!(rule = %rule.name, error = %e, "Error finding tables for row access rule");
                    report.success = false;
                    continue;
                }
            };

            // One attach per table, first-seen order from the tag reader.
            let mut seen = HashSet::new();
            let mut any = false;
            for column in tagged {
                if !seen.insert((column.schema.clone(), column.table.clone())) {
                    continue;
                }
                any = true;
                report
                    .operations
                    .push(Operation::AttachRowAccessPolicy(AttachRowAccessPolicy {
                        database: ctx.database.clone(),
                        policy_schema: rule.schema.clone(),
                        policy_name: rule.name.clone(),
                        schema: column.schema,
                        table: column.table,
                    }));
            }

            if !any {
                // Zero gated tables is a no-op, not a failure.
                warn!(
                    rule = %rule.name,
                    categories = ?rule.apply_to_categories,
                    "No tables found with columns tagged with the rule's categories"
                );
            }
        }
    }
}

/// Builds the run's variable table and applies it across the spec tree.
/// The round trip through the YAML value keeps the substitution component a
/// single implementation for both config loading and planning.
fn resolve_spec_variables(
    spec: &PolicySpec,
    ctx: &RunContext,
) -> Result<PolicySpec, TagwardenError> {
    let mut variables = VariableTable::new();
    variables.insert("admin_role".to_string(), Some(ctx.admin_role.clone()));
    variables.insert("database".to_string(), Some(ctx.database.clone()));
    variables.insert("policy_schema".to_string(), Some(ctx.policy_schema.clone()));
    variables.insert("default_tag".to_string(), Some(ctx.tag_name.clone()));

    let mut tree = serde_yaml::to_value(spec)?;
    substitute_tree(&mut tree, &variables);
    let resolved = serde_yaml::from_value(tree)?;
    Ok(resolved)
}

/// Converts a category or tag value into a valid policy identifier.
pub fn sanitize_policy_name(name: &str) -> String {
    let lowered = name.to_lowercase().replace([' ', '-'], "_");
    let mut sanitized: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if let Some(first) = sanitized.chars().next()
        && !first.is_alphabetic()
    {
        sanitized = format!("policy_{}", sanitized);
    }
    sanitized
}

/// Failsafe for admin gating: resolves `${admin_role}`/`$admin_role` left
/// over from partially substituted specs, and rewrites the hardcoded
/// ACCOUNTADMIN comparison when a different admin role is configured.
fn patch_admin_role(expression: &str, admin_role: &str) -> String {
    if expression.contains("${admin_role}") {
        expression.replace("${admin_role}", admin_role)
    } else if expression.contains("$admin_role") {
        expression.replace("$admin_role", admin_role)
    } else if admin_role != "ACCOUNTADMIN"
        && expression.contains("current_role() = 'ACCOUNTADMIN'")
    {
        expression.replace(
            "current_role() = 'ACCOUNTADMIN'",
            &format!("current_role() = '{}'", admin_role),
        )
    } else {
        expression.to_string()
    }
}

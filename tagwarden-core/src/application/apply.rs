// tagwarden-core/src/application/apply.rs

use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::application::scan::{ScanOptions, scan_metadata};
use crate::domain::classification::{Classifier, OverrideMap};
use crate::domain::policy::operation::{Operation, PlanReport};
use crate::domain::policy::planner::PolicyPlanner;
use crate::domain::policy::spec::PolicySpec;
use crate::error::TagwardenError;
use crate::ports::metadata::MetadataStore;
use crate::ports::policy::PolicyStore;
use crate::ports::tags::TagState;

#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    pub masking_only: bool,
    pub row_access_only: bool,
    pub pii_only: bool,
    /// Plan and report without touching the warehouse.
    pub dry_run: bool,
}

/// Everything the PII detection pass needs; absent when the caller only
/// converges policies.
pub struct PiiScanContext<'a> {
    pub metadata: &'a dyn MetadataStore,
    pub classifier: &'a Classifier,
    pub overrides: &'a OverrideMap,
}

#[derive(Debug, Serialize)]
pub struct ApplyReport {
    pub plan: PlanReport,
    pub operations_executed: usize,
    pub operations_failed: usize,
    pub columns_tagged: usize,
    pub success: bool,
    pub completed_at: String,
}

/// Converges the warehouse toward the declarative spec: plan, execute the
/// selected operations fail-soft, then run PII detection when the spec (or
/// the selector) asks for it. Nothing is rolled back on failure; every
/// operation is idempotent, so re-running after a partial failure is safe.
#[instrument(skip_all, fields(database = %spec.global.database))]
pub async fn apply_policies(
    spec: &PolicySpec,
    tags: &dyn TagState,
    store: &dyn PolicyStore,
    pii: Option<PiiScanContext<'_>>,
    options: &ApplyOptions,
) -> Result<ApplyReport, TagwardenError> {
    // Fail-fast: a malformed spec aborts before any mutation.
    spec.validate_spec()?;

    let plan = PolicyPlanner::new(tags).plan(spec).await?;
    let mut success = plan.success;
    let mut executed = 0usize;
    let mut failed = 0usize;

    let selected: Vec<&Operation> = plan
        .operations
        .iter()
        .filter(|op| is_selected(op, options))
        .collect();

    if options.dry_run {
        info!(operations = selected.len(), "Dry run: plan computed, nothing applied");
    } else {
        for op in selected {
            let result = match op {
                Operation::UpsertMaskingPolicy(x) => store.upsert_masking_policy(x).await,
                Operation::AttachMaskingPolicy(x) => store.attach_masking_policy(x).await,
                Operation::UpsertRowAccessPolicy(x) => store.upsert_row_access_policy(x).await,
                Operation::AttachRowAccessPolicy(x) => store.attach_row_access_policy(x).await,
            };
            match result {
                Ok(()) => executed += 1,
                Err(e) => {
                    error!(operation = ?op, error = %e, "Operation failed");
                    failed += 1;
                    success = false;
                }
            }
        }
    }

    // PII detection pass (step driven by the spec or --pii-only).
    let mut columns_tagged = 0usize;
    let wants_pii = options.pii_only || spec.pii_detection.enabled;
    if wants_pii && !options.masking_only && !options.row_access_only {
        match pii {
            Some(ctx) => {
                let auto_tag = spec.pii_detection.auto_tagging.enabled && !options.dry_run;
                let scan_options = ScanOptions {
                    database: spec.global.database.clone(),
                    schemas: (!spec.pii_detection.scan_schemas.is_empty())
                        .then(|| spec.pii_detection.scan_schemas.clone()),
                    sample_size: spec.pii_detection.sample_size,
                    apply_tags: auto_tag,
                };
                let scan = scan_metadata(ctx.metadata, ctx.classifier, ctx.overrides, &scan_options)
                    .await?;
                columns_tagged = scan.records.len();
                success = success && scan.success;

                if auto_tag {
                    info!(count = columns_tagged, "Auto-tagged columns with PII tags");
                } else {
                    info!(count = columns_tagged, "Found PII columns (auto-tagging disabled)");
                }
            }
            None => {
                warn!("PII detection requested but no metadata store was provided");
                success = false;
            }
        }
    }

    info!(
        executed,
        failed,
        masking_policies = plan.masking_policies_planned(),
        columns_to_mask = plan.columns_to_mask(),
        row_policies = plan.row_policies_planned(),
        tables_to_restrict = plan.tables_to_restrict(),
        success,
        "Policy application finished"
    );

    Ok(ApplyReport {
        plan,
        operations_executed: executed,
        operations_failed: failed,
        columns_tagged,
        success,
        completed_at: chrono::Utc::now().to_rfc3339(),
    })
}

fn is_selected(op: &Operation, options: &ApplyOptions) -> bool {
    if options.pii_only {
        return false;
    }
    let masking = matches!(
        op,
        Operation::UpsertMaskingPolicy(_) | Operation::AttachMaskingPolicy(_)
    );
    if options.masking_only {
        return masking;
    }
    if options.row_access_only {
        return !masking;
    }
    true
}

// tagwarden-core/tests/plan_convergence.rs
//
// End-to-end flow against the DuckDB adapter: classify and tag columns,
// converge policies, then verify that re-planning and re-applying on
// unchanged state changes nothing.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;

use tagwarden_core::application::{
    ApplyOptions, ScanOptions, apply_policies, scan_metadata,
};
use tagwarden_core::domain::classification::{
    Classifier, OverrideMap, PatternEntry, RuleDocument, RuleSet,
};
use tagwarden_core::domain::policy::{PolicyPlanner, PolicySpec};
use tagwarden_core::infrastructure::adapters::DuckDbWarehouse;
use tagwarden_core::ports::tags::TagState;

fn seeded_warehouse() -> Result<DuckDbWarehouse> {
    let warehouse = DuckDbWarehouse::new(":memory:")?;
    warehouse.execute(
        "CREATE SCHEMA sales;
         CREATE TABLE sales.customers (
             id BIGINT,
             user_email VARCHAR,
             ssn VARCHAR,
             balance DECIMAL(10,2)
         );
         INSERT INTO sales.customers VALUES
             (1, 'alice@example.com', '123-45-6789', 10.5),
             (2, 'bob@example.com', '987-65-4321', 22.0),
             (3, NULL, NULL, 3.25);",
    )?;
    Ok(warehouse)
}

fn classifier() -> Classifier {
    let doc = RuleDocument {
        name_patterns: vec![
            PatternEntry {
                pattern: "email".to_string(),
                category: Some("EMAIL".to_string()),
                category_id: None,
            },
            PatternEntry {
                pattern: "ssn|social".to_string(),
                category: Some("SSN".to_string()),
                category_id: None,
            },
        ],
        ..Default::default()
    };
    // Default tag name: GDPR_CLASSIFICATION
    Classifier::new(RuleSet::compile(&doc).unwrap())
}

fn spec() -> PolicySpec {
    serde_yaml::from_str(
        r#"
        global:
          database: local
          admin_role: SECADMIN
          policy_schema: main
          default_tag: GDPR_CLASSIFICATION
        category_policies:
          - category: EMAIL
            masking_policy:
              comment: "masks customer emails"
              data_types:
                VARCHAR: "case when current_role() = '${admin_role}' then val else '***' end"
          - category: SSN
            masking_policy:
              data_types:
                VARCHAR: "'XXX-XX-XXXX'"
        row_access:
          - name: pii_gate
            schema: main
            policy_expression: "current_role() in ('${admin_role}')"
            apply_to_categories: [EMAIL, SSN]
        "#,
    )
    .unwrap()
}

#[tokio::test]
async fn test_scan_then_converge_then_replan_is_stable() -> Result<()> {
    let warehouse = seeded_warehouse()?;
    let classifier = classifier();

    // 1. Classification run tags the sensitive columns.
    let scan_options = ScanOptions {
        database: "local".to_string(),
        schemas: None,
        sample_size: 100,
        apply_tags: true,
    };
    let scan = scan_metadata(&warehouse, &classifier, &OverrideMap::new(), &scan_options).await?;
    assert!(scan.success);
    assert_eq!(scan.columns_scanned, 4);

    let tagged: Vec<&str> = scan.records.iter().map(|r| r.column.as_str()).collect();
    assert_eq!(tagged, vec!["user_email", "ssn"]);

    // 2. Converge policies onto the tagged columns.
    let spec = spec();
    let first = apply_policies(
        &spec,
        &warehouse,
        &warehouse,
        None,
        &ApplyOptions::default(),
    )
    .await?;
    assert!(first.success, "warnings: {:?}", first.plan.warnings);
    assert_eq!(first.plan.masking_policies_planned(), 2);
    assert_eq!(first.plan.columns_to_mask(), 2);
    assert_eq!(first.plan.row_policies_planned(), 1);
    assert_eq!(first.plan.tables_to_restrict(), 1);
    assert_eq!(first.operations_failed, 0);

    // 3. Re-planning on unchanged state yields the identical operation list.
    let replanned = PolicyPlanner::new(&warehouse).plan(&spec).await?;
    assert_eq!(first.plan.operations, replanned.operations);

    // 4. Re-applying is a no-op from the planner's point of view: the tag
    // state and the derived plan stay byte-identical.
    let second = apply_policies(
        &spec,
        &warehouse,
        &warehouse,
        None,
        &ApplyOptions::default(),
    )
    .await?;
    assert!(second.success);
    assert_eq!(first.plan.operations, second.plan.operations);

    let still_tagged = warehouse
        .get_columns_by_category(
            "local",
            "GDPR_CLASSIFICATION",
            &["EMAIL".to_string(), "SSN".to_string()],
        )
        .await?;
    assert_eq!(still_tagged.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_rescan_does_not_duplicate_tags() -> Result<()> {
    let warehouse = seeded_warehouse()?;
    let classifier = classifier();
    let options = ScanOptions {
        database: "local".to_string(),
        schemas: None,
        sample_size: 100,
        apply_tags: true,
    };

    let first = scan_metadata(&warehouse, &classifier, &OverrideMap::new(), &options).await?;
    let second = scan_metadata(&warehouse, &classifier, &OverrideMap::new(), &options).await?;
    assert_eq!(first.records, second.records);

    let tagged = warehouse
        .get_columns_by_category(
            "local",
            "GDPR_CLASSIFICATION",
            &["EMAIL".to_string(), "SSN".to_string()],
        )
        .await?;
    assert_eq!(tagged.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_override_survives_into_policy_attachment() -> Result<()> {
    let warehouse = seeded_warehouse()?;
    let classifier = classifier();

    // The balance column matches no rule; an override pulls it in.
    let mut overrides = OverrideMap::new();
    overrides.insert("sales.customers.balance", "SSN");

    let options = ScanOptions {
        database: "local".to_string(),
        schemas: None,
        sample_size: 100,
        apply_tags: true,
    };
    let scan = scan_metadata(&warehouse, &classifier, &overrides, &options).await?;
    let balance = scan
        .records
        .iter()
        .find(|r| r.column == "balance")
        .expect("override should classify balance");
    assert_eq!(balance.reason, "override");

    // The SSN category policy only covers VARCHAR; the NUMBER-typed balance
    // column is skipped with a warning rather than failing the run.
    let report = apply_policies(
        &spec(),
        &warehouse,
        &warehouse,
        None,
        &ApplyOptions::default(),
    )
    .await?;
    assert!(report.success);
    assert!(
        report
            .plan
            .warnings
            .iter()
            .any(|w| w.contains("NUMBER") && w.contains("SSN"))
    );
    Ok(())
}

// tagwarden-core/src/domain/classification/classifier.rs

use crate::domain::classification::overrides::{ColumnRef, OverrideMap};
use crate::domain::classification::rules::RuleSet;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Why a column received its tag. Overrides always pre-empt name rules,
/// which always pre-empt content detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagReason {
    Override,
    NameMatch { column: String },
    DataMatch { matched: usize, sampled: usize },
}

impl fmt::Display for TagReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Override => write!(f, "override"),
            Self::NameMatch { column } => write!(f, "name_match: {}", column),
            Self::DataMatch { matched, sampled } => {
                write!(f, "data_match: {}/{}", matched, sampled)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggingDecision {
    pub category: String,
    pub reason: TagReason,
}

/// Decides the sensitivity category of a column. Pure function of its
/// inputs: every pattern was validated when the RuleSet compiled, so
/// classification itself cannot fail.
pub struct Classifier {
    rules: RuleSet,
}

impl Classifier {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn classify(
        &self,
        column: &ColumnRef,
        samples: &[Option<String>],
        overrides: &OverrideMap,
    ) -> Option<TaggingDecision> {
        // 1. Manual overrides win unconditionally.
        if let Some(tag) = overrides.lookup(column) {
            return Some(TaggingDecision {
                category: tag.to_string(),
                reason: TagReason::Override,
            });
        }

        // 2. Name rules in registration order, first match wins.
        for rule in self.rules.name_rules() {
            if rule.pattern.is_match(column.column) {
                debug!(column = column.column, pattern = %rule.pattern, "Name pattern match");
                return Some(TaggingDecision {
                    category: rule.category.clone(),
                    reason: TagReason::NameMatch {
                        column: column.column.to_string(),
                    },
                });
            }
        }

        // 3. Content detection over the non-null samples.
        let non_null: Vec<&str> = samples.iter().flatten().map(String::as_str).collect();
        if non_null.is_empty() {
            return None;
        }

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for sample in &non_null {
            for rule in self.rules.content_rules() {
                if rule.pattern.is_match(sample) {
                    *counts.entry(rule.category.as_str()).or_insert(0) += 1;
                }
            }
        }

        let sampled = non_null.len();
        let threshold = self.rules.match_threshold();
        let mut qualifying: Vec<(&str, usize)> = counts
            .into_iter()
            .filter(|(_, matched)| *matched as f64 / sampled as f64 >= threshold)
            .collect();

        // Deterministic selection: highest match count, ties broken by
        // category name.
        qualifying.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        qualifying.first().map(|(category, matched)| TaggingDecision {
            category: category.to_string(),
            reason: TagReason::DataMatch {
                matched: *matched,
                sampled,
            },
        })
    }
}

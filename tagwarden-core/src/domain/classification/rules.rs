// tagwarden-core/src/domain/classification/rules.rs

use crate::domain::error::DomainError;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

pub const DEFAULT_TAG_NAME: &str = "GDPR_CLASSIFICATION";
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.05;

// --- CONFIGURATION STRUCTS (parsed rule document) ---

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RuleDocument {
    #[serde(default)]
    pub tag_configuration: TagConfiguration,

    #[serde(default)]
    pub categories: Vec<CategoryEntry>,

    /// Matched against column identifiers, in declaration order.
    #[serde(default)]
    pub name_patterns: Vec<PatternEntry>,

    /// Matched against stringified sample values.
    #[serde(default)]
    pub data_patterns: Vec<PatternEntry>,

    #[serde(default)]
    pub thresholds: HashMap<String, f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TagConfiguration {
    #[serde(default = "default_tag_name")]
    pub tag_name: String,
    #[serde(default)]
    pub tag_schema: String,
}

fn default_tag_name() -> String {
    DEFAULT_TAG_NAME.to_string()
}

impl Default for TagConfiguration {
    fn default() -> Self {
        Self {
            tag_name: default_tag_name(),
            tag_schema: String::new(),
        }
    }
}

/// A category entry may carry a short id so pattern entries can reference it
/// without repeating the full name.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CategoryEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct PatternEntry {
    #[serde(default)]
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

// --- RUNTIME STRUCTS ---

/// A rule compiled for the hot path. The Regex is built once at load time;
/// the classifier never sees a pattern that failed to compile.
#[derive(Debug)]
pub struct CompiledRule {
    pub pattern: Regex,
    pub category: String,
}

#[derive(Debug)]
pub struct RuleSet {
    name_rules: Vec<CompiledRule>,
    content_rules: Vec<CompiledRule>,
    categories: Vec<String>,
    match_threshold: f64,
    tag_name: String,
    tag_schema: String,
}

impl RuleSet {
    /// Compiles a parsed rule document. Entries with an empty pattern or an
    /// unresolvable category are dropped with a warning; an invalid regex
    /// aborts loading (strict governance: a malformed rule file is a config
    /// error, never a per-column runtime error).
    pub fn compile(doc: &RuleDocument) -> Result<Self, DomainError> {
        let mut categories = Vec::with_capacity(doc.categories.len());
        let mut category_map = HashMap::new();
        for cat in &doc.categories {
            if cat.name.is_empty() {
                warn!("Dropping category entry with empty name");
                continue;
            }
            let id = cat.id.clone().unwrap_or_else(|| cat.name.clone());
            debug!(id = %id, name = %cat.name, "Loaded category");
            categories.push(cat.name.clone());
            category_map.insert(id, cat.name.clone());
        }

        // Name matching is case-insensitive; content matching takes the
        // pattern as written (rules targeting raw values control their own
        // case classes).
        let name_rules = compile_entries(&doc.name_patterns, &category_map, true)?;
        let content_rules = compile_entries(&doc.data_patterns, &category_map, false)?;

        let mut match_threshold = doc
            .thresholds
            .get("data_pattern_match")
            .copied()
            .unwrap_or(DEFAULT_MATCH_THRESHOLD);
        if !(0.0..=1.0).contains(&match_threshold) {
            warn!(
                threshold = match_threshold,
                "data_pattern_match threshold outside [0,1], clamping"
            );
            match_threshold = match_threshold.clamp(0.0, 1.0);
        }

        debug!(
            name_rules = name_rules.len(),
            content_rules = content_rules.len(),
            "Compiled rule set"
        );

        Ok(Self {
            name_rules,
            content_rules,
            categories,
            match_threshold,
            tag_name: doc.tag_configuration.tag_name.clone(),
            tag_schema: doc.tag_configuration.tag_schema.clone(),
        })
    }

    pub fn name_rules(&self) -> &[CompiledRule] {
        &self.name_rules
    }

    pub fn content_rules(&self) -> &[CompiledRule] {
        &self.content_rules
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn match_threshold(&self) -> f64 {
        self.match_threshold
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    /// Empty means "the connection default".
    pub fn tag_schema(&self) -> &str {
        &self.tag_schema
    }
}

fn compile_entries(
    entries: &[PatternEntry],
    category_map: &HashMap<String, String>,
    case_insensitive: bool,
) -> Result<Vec<CompiledRule>, DomainError> {
    let mut compiled = Vec::with_capacity(entries.len());

    for entry in entries {
        // category_id wins when it resolves; the literal category field is
        // the fallback, matching how rule files reference shared categories.
        let category = entry
            .category_id
            .as_ref()
            .and_then(|id| category_map.get(id).cloned())
            .or_else(|| entry.category.clone())
            .unwrap_or_default();

        if entry.pattern.is_empty() || category.is_empty() {
            warn!(pattern = %entry.pattern, "Dropping rule with empty pattern or category");
            continue;
        }

        let pattern = RegexBuilder::new(&entry.pattern)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|e| DomainError::InvalidRulePattern {
                pattern: entry.pattern.clone(),
                reason: e.to_string(),
            })?;

        compiled.push(CompiledRule { pattern, category });
    }

    Ok(compiled)
}

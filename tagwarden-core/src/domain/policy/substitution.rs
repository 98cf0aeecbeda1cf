// tagwarden-core/src/domain/policy/substitution.rs

use regex::{NoExpand, Regex};
use std::collections::BTreeMap;
use tracing::warn;

/// Variable table for policy expressions. A None value means "unresolved":
/// both `${name}` and `$name` occurrences are left intact so partial
/// resolution stays visible in diagnostics.
pub type VariableTable = BTreeMap<String, Option<String>>;

/// Replaces `${name}` and whole-word `$name` occurrences in every string
/// leaf of a YAML tree. Mappings and sequences are walked recursively;
/// non-string scalars are untouched. Safe to call twice: the syntax is fully
/// consumed after one pass as long as variable values carry no `$`.
pub fn substitute_tree(node: &mut serde_yaml::Value, variables: &VariableTable) {
    match node {
        serde_yaml::Value::Mapping(map) => {
            for (_key, value) in map.iter_mut() {
                substitute_tree(value, variables);
            }
        }
        serde_yaml::Value::Sequence(seq) => {
            for value in seq.iter_mut() {
                substitute_tree(value, variables);
            }
        }
        serde_yaml::Value::String(text) => {
            *text = substitute_str(text, variables);
        }
        serde_yaml::Value::Tagged(tagged) => {
            substitute_tree(&mut tagged.value, variables);
        }
        _ => {}
    }
}

pub fn substitute_str(text: &str, variables: &VariableTable) -> String {
    let mut out = text.to_string();

    // First pass: ${name} template form, literal replacement.
    for (name, value) in variables {
        let Some(value) = value else {
            if out.contains(&format!("${{{}}}", name)) {
                warn!(variable = %name, "Variable has no value, skipping replacement");
            }
            continue;
        };
        let braced = format!("${{{}}}", name);
        if out.contains(&braced) {
            out = out.replace(&braced, value);
        }
    }

    // Second pass: simplified $name form. The word boundary keeps
    // `$admin_rolex` out of reach of variable `admin_role`.
    for (name, value) in variables {
        let Some(value) = value else { continue };
        let Ok(pattern) = Regex::new(&format!(r"\${}\b", regex::escape(name))) else {
            continue;
        };
        out = pattern.replace_all(&out, NoExpand(value)).into_owned();
    }

    out
}

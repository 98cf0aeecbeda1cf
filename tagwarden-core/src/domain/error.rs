// tagwarden-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Invalid rule pattern '{pattern}': {reason}")]
    #[diagnostic(
        code(tagwarden::domain::rule_pattern),
        help("Fix the regex in the rules file; a malformed rule aborts loading.")
    )]
    InvalidRulePattern { pattern: String, reason: String },

    #[error("Policy configuration error: {0}")]
    #[diagnostic(
        code(tagwarden::domain::config),
        help("The policy spec is validated once at load; nothing has been applied.")
    )]
    ConfigError(String),

    #[error("{kind} '{name}' not found")]
    #[diagnostic(code(tagwarden::domain::not_found))]
    NotFound { kind: String, name: String },
}

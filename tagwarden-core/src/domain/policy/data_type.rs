// tagwarden-core/src/domain/policy/data_type.rs

/// Canonicalizes a vendor column type into the small lattice masking
/// policies are keyed by. Matching is case-insensitive substring
/// containment against an ordered rule list; unknown types pass through
/// upper-cased so the planner can still report them.
///
/// Ordering matters: `TIMESTAMP` contains `TIME`, and `BIGINT` contains
/// `INT`, so the guards below are positional.
pub fn normalize_data_type(raw: &str) -> String {
    let upper = raw.to_uppercase();

    // VARCHAR variants
    if upper.contains("VARCHAR")
        || upper.contains("CHAR")
        || upper.contains("TEXT")
        || upper.contains("STRING")
    {
        return "VARCHAR".to_string();
    }

    // Numeric types
    if upper.contains("INT") {
        return "INTEGER".to_string();
    }
    if upper.contains("NUMBER")
        || upper.contains("NUMERIC")
        || upper.contains("DECIMAL")
        || upper.contains("FLOAT")
        || upper.contains("DOUBLE")
        || upper.contains("REAL")
    {
        return "NUMBER".to_string();
    }

    // Date/time types
    if upper.contains("DATE") && !upper.contains("TIMESTAMP") {
        return "DATE".to_string();
    }
    if upper.contains("TIME") && !upper.contains("TIMESTAMP") {
        return "TIME".to_string();
    }
    if upper.contains("TIMESTAMP") {
        return "TIMESTAMP".to_string();
    }

    upper
}

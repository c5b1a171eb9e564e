//! Read-only statement policy.

/// Text returned when a statement is refused.
pub const READ_ONLY_REJECTION: &str =
    "Error: Only SELECT queries are allowed for security reasons.";

const SELECT_KEYWORD: &str = "SELECT";

/// Whether `query` starts with the `SELECT` keyword.
///
/// Leading whitespace is skipped and the keyword is matched
/// case-insensitively. Nothing past the keyword is inspected; the read-only
/// connection refuses writes hidden behind it.
pub fn is_select_query(query: &str) -> bool {
    query
        .trim_start()
        .get(..SELECT_KEYWORD.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(SELECT_KEYWORD))
}

//! SQL identifier quoting utilities
//!
//! Every statement Starflow sends to the warehouse is assembled from typed
//! identifiers, so quoting lives in one place.

/// Quote a SQL identifier.
///
/// Wraps the identifier in double quotes and doubles any embedded double quote.
///
/// # Examples
/// ```
/// use sf_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("users"), r#""users""#);
/// assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a potentially schema-qualified name (e.g. `schema.table`).
///
/// # Examples
/// ```
/// use sf_core::sql_utils::quote_qualified;
/// assert_eq!(quote_qualified("songs"), r#""songs""#);
/// assert_eq!(quote_qualified("public.songs"), r#""public"."songs""#);
/// ```
pub fn quote_qualified(name: &str) -> String {
    name.split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

/// Split a potentially schema-qualified table name into (schema, table).
///
/// Uses the last `.` as the separator and defaults the schema to `main`.
///
/// # Examples
/// ```
/// use sf_core::sql_utils::split_qualified_name;
/// assert_eq!(split_qualified_name("users"), ("main", "users"));
/// assert_eq!(split_qualified_name("public.users"), ("public", "users"));
/// ```
pub fn split_qualified_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => ("main", name),
    }
}

/// Escape a value for use inside a single-quoted SQL string literal.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Render a single-quoted SQL string literal.
pub fn string_literal(value: &str) -> String {
    format!("'{}'", escape_sql_string(value))
}

//! Identifier and literal quoting for DDL statement text.
//!
//! GRANT/REVOKE/ALTER statements cannot take bound parameters for object
//! names, so every interpolated name goes through these helpers. Quoting
//! also preserves case and characters that would otherwise be folded or
//! rejected by the parser.

use crate::grant::Grantee;

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Single-quote a string literal, doubling embedded quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Render the grantee reference used in GRANT ... TO / REVOKE ... FROM
/// clauses. Groups take the GROUP keyword; users are bare identifiers.
pub fn grantee_ref(grantee: &Grantee) -> String {
    match grantee {
        Grantee::User(name) => quote_ident(name),
        Grantee::Group(name) => format!("GROUP {}", quote_ident(name)),
    }
}

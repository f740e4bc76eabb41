//! Schema → identifier policy.

use heck::{ToSnakeCase, ToUpperCamelCase};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::schema::Schema;

static IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod",
    "move", "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super",
    "trait", "true", "type", "unsafe", "use", "where", "while", "abstract", "become", "box",
    "do", "final", "macro", "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NamingError {
    #[error("schema has neither a definition name nor a title to derive a type name from")]
    Anonymous,
    #[error("cannot derive an identifier from {0:?}")]
    InvalidIdentifier(String),
}

pub trait NameDeriver {
    /// Type identifier for `schema`; `definition` is its key in the document, if any.
    fn type_name(&self, schema: &Schema, definition: Option<&str>) -> Result<String, NamingError>;

    /// Field identifier for a slot holding values of `type_name`.
    fn field_name(&self, type_name: &str) -> Result<String, NamingError>;
}

/// Definition name first, then `title`. Names that are already identifiers keep their
/// spelling (acronyms survive); anything else is UpperCamelCased.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNamer;

impl NameDeriver for DefaultNamer {
    fn type_name(&self, schema: &Schema, definition: Option<&str>) -> Result<String, NamingError> {
        let raw = definition
            .or(schema.title.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(NamingError::Anonymous)?;

        let name = if IDENT.is_match(raw) {
            upper_first(raw)
        } else {
            raw.to_upper_camel_case()
        };
        if !IDENT.is_match(&name) || is_keyword(&name) {
            return Err(NamingError::InvalidIdentifier(raw.to_string()));
        }
        Ok(name)
    }

    fn field_name(&self, type_name: &str) -> Result<String, NamingError> {
        let mut field = type_name.to_snake_case();
        if !IDENT.is_match(&field) {
            return Err(NamingError::InvalidIdentifier(type_name.to_string()));
        }
        if is_keyword(&field) {
            field.push('_');
        }
        Ok(field)
    }
}

pub fn is_keyword(ident: &str) -> bool {
    RUST_KEYWORDS.contains(&ident)
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

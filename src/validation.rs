use crate::error::{Error, Result};

const MAX_IDENTIFIER_LEN: usize = 64;

fn is_leading_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

fn is_identifier_char(c: char) -> bool {
    is_leading_char(c) || c == '.' || c == '_' || c == '-'
}

/// Namespace and package names: `[a-z0-9][a-z0-9._-]{0,63}`.
#[must_use]
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if is_leading_char(first) => {}
        _ => return false,
    }
    s.len() <= MAX_IDENTIFIER_LEN && chars.all(is_identifier_char)
}

pub(crate) fn validate_namespace(ns: &str) -> Result<()> {
    validate(ns, "namespace")
}

pub(crate) fn validate_package_name(name: &str) -> Result<()> {
    validate(name, "package name")
}

fn validate(value: &str, kind: &'static str) -> Result<()> {
    if is_valid_identifier(value) {
        Ok(())
    } else {
        Err(Error::InvalidIdentifier {
            kind,
            value: value.to_string(),
        })
    }
}

//! Identifier validation for module paths, class names and parameter names.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ModelError, Result};

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

static DOTTED_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("dotted path pattern is valid")
});

/// Returns `true` for a plain identifier such as `max_depth`.
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Returns `true` for a dotted path such as `app.models` or `Outer.Inner`.
pub fn is_dotted_path(path: &str) -> bool {
    DOTTED_PATH.is_match(path)
}

/// Validate a plain identifier.
pub fn check_identifier(name: &str) -> Result<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(ModelError::InvalidIdentifier(name.to_string()))
    }
}

/// Validate a dotted path.
pub fn check_dotted_path(path: &str) -> Result<()> {
    if is_dotted_path(path) {
        Ok(())
    } else {
        Err(ModelError::InvalidIdentifier(path.to_string()))
    }
}

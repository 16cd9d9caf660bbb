//! Change request validation
//!
//! Rules are declared with `validator` attributes on the models; this module
//! holds the shared patterns and flattens `ValidationErrors` into a list of
//! rule violations so that every broken rule is reported at once.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Release dates must be written as `yyyy-mm-dd` (or with ` `, `/`, `.` separators)
pub static RELEASE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(19|20)\d\d[- /.](0[1-9]|1[012])[- /.](0[1-9]|[12][0-9]|3[01])$")
        .expect("release date pattern is valid")
});

/// One broken validation rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleViolation {
    /// Path to the offending value, e.g. `rulings[1].rule`
    pub field: String,
    /// Rule identifier (`length`, `range`, `regex`, ...)
    pub code: String,
    pub message: String,
}

impl RuleViolation {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Run all declared rules and collect every violation, sorted by field path
pub fn check<T: Validate>(value: &T) -> Result<(), Vec<RuleViolation>> {
    match value.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let mut violations = Vec::new();
            flatten(&errors, "", &mut violations);
            violations.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.code.cmp(&b.code)));
            Err(violations)
        }
    }
}

fn flatten(errors: &ValidationErrors, prefix: &str, out: &mut Vec<RuleViolation>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            camel_case(field)
        } else {
            format!("{}.{}", prefix, camel_case(field))
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                for err in list {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} failed the {} rule", path, err.code));
                    out.push(RuleViolation::new(path.clone(), err.code.to_string(), message));
                }
            }
            ValidationErrorsKind::Struct(nested) => flatten(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flatten(nested, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

/// `card_set_id` -> `cardSetId`
fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_date_pattern() {
        assert!(RELEASE_DATE.is_match("1993-08-05"));
        assert!(RELEASE_DATE.is_match("2013/09/27"));
        assert!(!RELEASE_DATE.is_match("93-08-05"));
        assert!(!RELEASE_DATE.is_match("2013-13-01"));
        assert!(!RELEASE_DATE.is_match("2013-09-27T00:00:00"));
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("converted_mana_cost"), "convertedManaCost");
        assert_eq!(camel_case("name"), "name");
    }
}

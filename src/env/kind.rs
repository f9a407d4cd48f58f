//! Type descriptors for declared variables.
//!
//! Every variable is stored as a string. A [`Kind`] says how that string is
//! parsed into a typed value, how the typed value is rendered for display,
//! and how strictly the string is checked by validation.

use super::error::{EnvError, Validated, Warning};

/// Parse, format and check rules for one semantic type.
///
/// Parsing is fail-soft: malformed input yields the type's default value.
/// Only [`check`](Kind::check) reports problems.
pub trait Kind: Send + Sync + 'static {
    /// The typed value a variable of this kind reads as.
    type Output: Default;

    /// Short type name used in introspection output.
    const NAME: &'static str;

    /// Convert a raw string into the typed value, never failing.
    fn parse(raw: &str) -> Self::Output;

    /// Render a typed value for display.
    fn format(value: &Self::Output) -> String;

    /// Check a raw string for variable `var`.
    fn check(var: &str, raw: &str) -> Validated;
}

/// Plain strings. Never fails validation.
#[derive(Debug, Clone, Copy)]
pub struct StringKind;

/// Booleans: `"1"` or `"true"` in any case is true, anything else is false.
#[derive(Debug, Clone, Copy)]
pub struct BoolKind;

/// Base-10 signed 64-bit integers.
#[derive(Debug, Clone, Copy)]
pub struct IntKind;

impl Kind for StringKind {
    type Output = String;
    const NAME: &'static str = "string";

    fn parse(raw: &str) -> String {
        raw.to_string()
    }

    fn format(value: &String) -> String {
        value.clone()
    }

    fn check(_var: &str, _raw: &str) -> Validated {
        Ok(None)
    }
}

impl Kind for BoolKind {
    type Output = bool;
    const NAME: &'static str = "bool";

    fn parse(raw: &str) -> bool {
        is_truthy(raw)
    }

    fn format(value: &bool) -> String {
        value.to_string()
    }

    fn check(var: &str, raw: &str) -> Validated {
        if is_truthy(raw) || is_falsy(raw) {
            Ok(None)
        } else {
            Ok(Some(Warning::NotBoolean {
                var: var.to_string(),
                value: raw.to_string(),
            }))
        }
    }
}

impl Kind for IntKind {
    type Output = i64;
    const NAME: &'static str = "int";

    fn parse(raw: &str) -> i64 {
        raw.parse().unwrap_or_default()
    }

    fn format(value: &i64) -> String {
        value.to_string()
    }

    fn check(var: &str, raw: &str) -> Validated {
        match raw.parse::<i64>() {
            Ok(_) => Ok(None),
            Err(source) => Err(EnvError::InvalidInt {
                var: var.to_string(),
                value: raw.to_string(),
                source,
            }),
        }
    }
}

/// Whether `raw` reads as true: `"1"` or `"true"`, case-insensitively.
///
/// ```rust
/// use tidewater::env::is_truthy;
///
/// assert!(is_truthy("1"));
/// assert!(is_truthy("TRUE"));
/// assert!(!is_truthy("yes"));
/// assert!(!is_truthy(""));
/// ```
pub fn is_truthy(raw: &str) -> bool {
    raw == "1" || raw.eq_ignore_ascii_case("true")
}

fn is_falsy(raw: &str) -> bool {
    raw == "0" || raw.eq_ignore_ascii_case("false")
}

/// Type-erased view of a [`Kind`], stored alongside each variable.
#[derive(Clone, Copy)]
pub(crate) struct KindInfo {
    pub(crate) name: &'static str,
    pub(crate) check: fn(&str, &str) -> Validated,
    pub(crate) display: fn(&str) -> String,
}

impl KindInfo {
    pub(crate) fn of<K: Kind>() -> Self {
        Self {
            name: K::NAME,
            check: K::check,
            display: display_raw::<K>,
        }
    }
}

fn display_raw<K: Kind>(raw: &str) -> String {
    K::format(&K::parse(raw))
}

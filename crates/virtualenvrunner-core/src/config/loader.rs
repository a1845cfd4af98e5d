//! Environment-variable loading helpers.
//!
//! Keeps the fallback chains in one place so callers never repeat `or_else`.

use std::env;

/// Read `key`, falling back to `default` when unset or empty.
pub fn env_or<F>(key: &str, default: F) -> String
where
    F: FnOnce() -> String,
{
    env::var(key)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(default)
}

/// Read `key` as an `Option`; empty values count as unset.
pub fn env_optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .and_then(|s| {
            let s = s.trim().to_string();
            if s.is_empty() {
                None
            } else {
                Some(s)
            }
        })
}

/// Parse a boolean variable: `0`/`false`/`no`/`off` are false, anything else true.
pub fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key).ok().as_deref() {
        Some(s) => !matches!(
            s.trim().to_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        ),
        None => default,
    }
}

/// The requirements-update switch only accepts the literal `true`, in any case.
pub fn is_true_literal(value: Option<&str>) -> bool {
    value.map_or(false, |v| v.eq_ignore_ascii_case("true"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_true_literal_is_case_insensitive() {
        assert!(is_true_literal(Some("TRUE")));
        assert!(is_true_literal(Some("True")));
        assert!(is_true_literal(Some("true")));
    }

    #[test]
    fn test_true_literal_rejects_other_values() {
        assert!(!is_true_literal(None));
        assert!(!is_true_literal(Some("1")));
        assert!(!is_true_literal(Some("yes")));
        assert!(!is_true_literal(Some(" true")));
    }

    #[test]
    fn test_env_optional_treats_empty_as_unset() {
        let key = "VIRTUALENV_RUNNER_TEST_EMPTY";
        env::set_var(key, "   ");
        assert_eq!(env_optional(key), None);
        env::set_var(key, "value");
        assert_eq!(env_optional(key), Some("value".to_string()));
        env::remove_var(key);
        assert_eq!(env_optional(key), None);
    }

    #[test]
    fn test_env_bool_and_env_or_defaults() {
        let key = "VIRTUALENV_RUNNER_TEST_BOOL";
        env::remove_var(key);
        assert!(env_bool(key, true));
        assert_eq!(env_or(key, || "fallback".to_string()), "fallback");
        env::set_var(key, "off");
        assert!(!env_bool(key, true));
        env::remove_var(key);
    }
}

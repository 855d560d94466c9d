//! Environment-variable configuration helpers. The server takes no command
//! line flags; everything is driven by the environment (optionally loaded
//! from a `.env` file by the binary).

use std::env;

/// Returns the value of the environment variable `key`, or `fallback` when
/// it is unset or not valid unicode.
pub fn get_env(key: &str, fallback: &str) -> String {
    match env::var(key) {
        Ok(value) => value,
        Err(_) => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_fallback() {
        assert_eq!(get_env("TERMROIDS_DOES_NOT_EXIST", "default"), "default");
    }

    #[test]
    fn test_get_env_set() {
        env::set_var("TERMROIDS_TEST_VAR", "value");
        assert_eq!(get_env("TERMROIDS_TEST_VAR", "default"), "value");
        env::remove_var("TERMROIDS_TEST_VAR");
    }
}

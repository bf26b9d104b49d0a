// src/config/env.rs
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static RE_ENV: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env regex"));

/// Replace every `${VAR}` in `s` with the value of `VAR`.
/// Unset or empty variables expand to "" and are logged.
pub fn resolve_env_vars(s: &str) -> String {
    RE_ENV
        .replace_all(s, |caps: &Captures| {
            let name = &caps[1];
            match std::env::var(name) {
                Ok(v) if !v.is_empty() => v,
                _ => {
                    tracing::warn!(var = name, "environment variable is not set");
                    String::new()
                }
            }
        })
        .into_owned()
}

/// Walk a parsed TOML tree and expand placeholders in every string value.
pub fn expand_env_vars(value: &mut toml::Value) {
    match value {
        toml::Value::String(s) => {
            if s.contains("${") {
                *s = resolve_env_vars(s);
            }
        }
        toml::Value::Array(items) => items.iter_mut().for_each(expand_env_vars),
        toml::Value::Table(table) => {
            for (_, v) in table.iter_mut() {
                expand_env_vars(v);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn placeholders_expand_inside_strings() {
        std::env::set_var("LOGOS_TEST_TOKEN", "abc123");
        std::env::remove_var("LOGOS_TEST_MISSING");
        assert_eq!(resolve_env_vars("${LOGOS_TEST_TOKEN}"), "abc123");
        assert_eq!(resolve_env_vars("bot-${LOGOS_TEST_TOKEN}-x"), "bot-abc123-x");
        assert_eq!(resolve_env_vars("${LOGOS_TEST_MISSING}"), "");
        assert_eq!(resolve_env_vars("no placeholders"), "no placeholders");
        std::env::remove_var("LOGOS_TEST_TOKEN");
    }

    #[serial_test::serial]
    #[test]
    fn nested_tables_and_arrays_are_walked() {
        std::env::set_var("LOGOS_TEST_KW", "반도체");
        let table: toml::Table = toml::from_str(
            r#"
[news.categories.tech]
keywords = ["${LOGOS_TEST_KW}", "AI"]
max_items = 3
"#,
        )
        .unwrap();
        let mut v = toml::Value::Table(table);
        expand_env_vars(&mut v);
        let kw = v["news"]["categories"]["tech"]["keywords"].as_array().unwrap();
        assert_eq!(kw[0].as_str(), Some("반도체"));
        assert_eq!(kw[1].as_str(), Some("AI"));
        assert_eq!(v["news"]["categories"]["tech"]["max_items"].as_integer(), Some(3));
        std::env::remove_var("LOGOS_TEST_KW");
    }
}

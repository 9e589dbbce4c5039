//! CLI command handlers.

pub mod conversations;
pub mod users;
pub mod watch;

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context as _, Result};
use console::Style;
use paanj_admin::{AdminConfig, PaanjAdmin};
use paanj_chat_admin::AdminChat;
use serde::Serialize;
use serde_json::Value;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Admin core built from the resolved configuration.
    pub admin: PaanjAdmin,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    pub fn new(config: &AdminConfig, json_output: bool, verbose: bool) -> Result<Self> {
        let admin = PaanjAdmin::from_config(config)
            .context("failed to create admin client")?;
        Ok(Self {
            admin,
            json_output,
            verbose,
        })
    }

    /// Chat resources over the shared admin core.
    pub fn chat(&self) -> AdminChat {
        AdminChat::new(self.admin.clone())
    }
}

/// Resolve configuration: file, then environment, then command-line flags.
pub fn load_config(
    path: Option<&Path>,
    api_url: Option<String>,
    secret_key: Option<String>,
) -> Result<AdminConfig> {
    let mut config = match path {
        Some(path) => {
            let mut config = AdminConfig::load_from(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            config.apply_env_with(|key| std::env::var(key).ok())?;
            config
        }
        None => AdminConfig::load()?,
    };

    if let Some(url) = api_url {
        config.api_url = url;
    }
    if let Some(key) = secret_key {
        config.secret_key = Some(key);
    }
    Ok(config)
}

/// Parse a `key=value` argument. Values that parse as JSON keep their type.
pub fn parse_key_value(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

pub fn to_map(pairs: Vec<(String, Value)>) -> Option<HashMap<String, Value>> {
    if pairs.is_empty() {
        None
    } else {
        Some(pairs.into_iter().collect())
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(message: &str, detail: &str) {
    let green = Style::new().green();
    let dim = Style::new().dim();
    println!("{} {} {}", green.apply_to("✓"), message, dim.apply_to(detail));
}

pub fn print_header(title: &str) {
    let dim = Style::new().dim();
    println!("{}", console::style(title).bold());
    println!("{}", dim.apply_to("─".repeat(50)));
}

pub fn truncate(s: &str, max_len: usize) -> String {
    let s = s.replace('\n', " ");
    if s.chars().count() <= max_len {
        s
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("plan=pro").unwrap(),
            ("plan".to_string(), json!("pro"))
        );
        assert_eq!(
            parse_key_value("seats=5").unwrap(),
            ("seats".to_string(), json!(5))
        );
        assert_eq!(
            parse_key_value("note=a=b").unwrap(),
            ("note".to_string(), json!("a=b"))
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_to_map() {
        assert!(to_map(Vec::new()).is_none());
        let map = to_map(vec![("a".to_string(), json!(1))]).unwrap();
        assert_eq!(map["a"], 1);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("line\nbreak", 20), "line break");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("admin.toml");
        std::fs::write(&path, "secret-key = \"sk_file\"\napi-url = \"http://file:1\"\n").unwrap();

        let config = load_config(
            Some(path.as_path()),
            Some("http://flag:2".to_string()),
            Some("sk_flag".to_string()),
        )
        .unwrap();
        assert_eq!(config.api_url, "http://flag:2");
        assert_eq!(config.secret_key.as_deref(), Some("sk_flag"));
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(dir.path().join("nope.toml").as_path()), None, None).unwrap_err();
        assert!(err.to_string().contains("failed to load config"));
    }
}

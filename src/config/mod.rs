// src/config/mod.rs
//! Application configuration: TOML file + `${VAR}` expansion + defaults.
//!
//! Lookup order for the file:
//!   1) explicit path (CLI `--config`)
//!   2) $LOGOS_CONFIG_PATH
//!   3) config/config.toml
//!
//! A missing file is not an error; every section falls back to its defaults.

pub mod env;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const ENV_CONFIG_PATH: &str = "LOGOS_CONFIG_PATH";

pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";
pub const DEFAULT_NAVER_OPENAPI: &str = "https://openapi.naver.com";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Hour expression: "7", "7-22", "7,12,18" or "*".
    #[serde(deserialize_with = "string_or_int")]
    pub hour: String,
    pub minute: u32,
    pub timezone: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            hour: "7".to_string(),
            minute: 0,
            timezone: "Asia/Seoul".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: DEFAULT_TELEGRAM_API.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CategoryConfig {
    pub enabled: bool,
    pub max_items: usize,
    /// Reserved: parsed but not used for fetching yet.
    pub keywords: Vec<String>,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_items: 5,
            keywords: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub enabled: bool,
    /// Reserved for tie-breaking; ranking does not consult it.
    pub priority: i32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            priority: 1,
        }
    }
}

/// Naver Search API credentials. The adapter stays off until both are set.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NaverSearchConfig {
    pub client_id: String,
    pub client_secret: String,
    pub api_base: String,
}

impl Default for NaverSearchConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            api_base: DEFAULT_NAVER_OPENAPI.to_string(),
        }
    }
}

impl NaverSearchConfig {
    pub fn is_configured(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.client_secret.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    /// Categories in document order; this is also the presentation order.
    #[serde(deserialize_with = "ordered_entries")]
    pub categories: Vec<(String, CategoryConfig)>,
    pub sources: BTreeMap<String, SourceConfig>,
    pub naver_search: NaverSearchConfig,
}

impl NewsConfig {
    pub fn enabled_categories(&self) -> impl Iterator<Item = (&str, &CategoryConfig)> {
        self.categories
            .iter()
            .filter(|(_, c)| c.enabled)
            .map(|(name, c)| (name.as_str(), c))
    }

    /// A source without a config entry counts as enabled.
    pub fn source_enabled(&self, name: &str) -> bool {
        self.sources.get(name).map_or(true, |s| s.enabled)
    }

    pub fn category(&self, name: &str) -> Option<&CategoryConfig> {
        self.categories
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MessageConfig {
    pub include_summary: bool,
    pub include_link: bool,
    /// "plain" | "markdown" | "html"
    pub format: String,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            include_summary: true,
            include_link: true,
            format: "markdown".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Empty means console only.
    pub file: String,
    /// JSON lines on the console instead of human-readable text.
    pub json: bool,
    /// Accepted for compatibility; the log file is never rotated.
    pub max_size_mb: Option<u64>,
    /// Accepted for compatibility; the log file is never rotated.
    pub backup_count: Option<u32>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: String::new(),
            json: false,
            max_size_mb: None,
            backup_count: None,
        }
    }
}

impl LoggingConfig {
    /// Rotation keys present in the file that have no effect.
    pub fn ignored_rotation_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.max_size_mb.is_some() {
            keys.push("logging.max_size_mb");
        }
        if self.backup_count.is_some() {
            keys.push("logging.backup_count");
        }
        keys
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub schedule: ScheduleConfig,
    pub telegram: TelegramConfig,
    pub news: NewsConfig,
    pub message: MessageConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(s).context("parsing config toml")?;
        let mut raw = toml::Value::Table(table);
        env::expand_env_vars(&mut raw);
        let cfg = raw.try_into::<AppConfig>().context("config schema")?;
        Ok(cfg)
    }
}

/// Resolve the config path from the explicit argument, env var, or default.
pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    std::env::var(ENV_CONFIG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load configuration. `.env` is read first so `${VAR}` placeholders can use it.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let _ = dotenvy::dotenv();

    let path = resolve_path(explicit);
    if !path.exists() {
        warn!(path = %path.display(), "config file not found; using defaults");
        return Ok(AppConfig::default());
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let cfg = AppConfig::from_toml_str(&content)
        .with_context(|| format!("loading config from {}", path.display()))?;
    info!(path = %path.display(), "config loaded");
    Ok(cfg)
}

static RE_HOUR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\*|([0-9]|1[0-9]|2[0-3])([-,]([0-9]|1[0-9]|2[0-3]))*)$").expect("hour regex")
});

/// Check a loaded config. Returns human-readable problems; empty means valid.
pub fn validate(cfg: &AppConfig) -> Vec<String> {
    let mut errors = Vec::new();

    if cfg.telegram.bot_token.trim().is_empty() {
        errors.push("telegram.bot_token is not set".to_string());
    }
    if cfg.telegram.chat_id.trim().is_empty() {
        errors.push("telegram.chat_id is not set".to_string());
    }

    if !RE_HOUR.is_match(&cfg.schedule.hour) {
        errors.push(format!(
            "invalid schedule.hour: {} (e.g. 7, 7-22, 7,12,18)",
            cfg.schedule.hour
        ));
    }
    if cfg.schedule.minute > 59 {
        errors.push(format!(
            "invalid schedule.minute: {} (0-59 required)",
            cfg.schedule.minute
        ));
    }

    if cfg.news.categories.is_empty() {
        errors.push("no news categories configured".to_string());
    }

    errors
}

/// Chat ids are shown as their first 10 characters plus "...".
pub fn mask_chat_id(chat_id: &str) -> String {
    if chat_id.chars().count() > 10 {
        format!("{}...", chat_id.chars().take(10).collect::<String>())
    } else {
        chat_id.to_string()
    }
}

/// Human-readable summary printed by `--validate`.
pub fn summary_lines(cfg: &AppConfig) -> Vec<String> {
    let mut lines = vec![format!(
        "schedule: {}:{:02} ({})",
        cfg.schedule.hour, cfg.schedule.minute, cfg.schedule.timezone
    )];
    if !cfg.telegram.chat_id.is_empty() {
        lines.push(format!("telegram chat id: {}", mask_chat_id(&cfg.telegram.chat_id)));
    }
    let categories: Vec<&str> = cfg.news.enabled_categories().map(|(n, _)| n).collect();
    lines.push(format!("enabled categories: {}", categories.join(", ")));
    let sources: Vec<&str> = cfg
        .news
        .sources
        .iter()
        .filter(|(_, s)| s.enabled)
        .map(|(n, _)| n.as_str())
        .collect();
    lines.push(format!("enabled sources: {}", sources.join(", ")));
    lines
}

fn string_or_int<'de, D>(de: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
    }
    Ok(match Raw::deserialize(de)? {
        Raw::Str(s) => s,
        Raw::Int(i) => i.to_string(),
    })
}

fn ordered_entries<'de, D, T>(de: D) -> std::result::Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    struct Entries<T>(std::marker::PhantomData<T>);

    impl<'de, T: Deserialize<'de>> Visitor<'de> for Entries<T> {
        type Value = Vec<(String, T)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a table of named entries")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut out = Vec::new();
            while let Some((name, value)) = map.next_entry::<String, T>()? {
                out.push((name, value));
            }
            Ok(out)
        }
    }

    de.deserialize_map(Entries(std::marker::PhantomData))
}

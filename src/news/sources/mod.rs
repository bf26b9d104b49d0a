// src/news/sources/mod.rs
//! Source adapters. Each provider implements [`NewsSource`]; the collector only
//! ever sees the trait object.

pub mod google;
pub mod naver;
pub mod naver_search;

pub use google::GoogleNewsSource;
pub use naver::NaverNewsSource;
pub use naver_search::NaverSearchNewsSource;

use crate::news::item::NewsItem;
use anyhow::Result;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Cap applied to scraped summaries before they reach the formatter.
pub const SUMMARY_MAX_CHARS: usize = 200;

#[async_trait::async_trait]
pub trait NewsSource: Send + Sync {
    /// Config key and provenance prefix, e.g. "naver".
    fn name(&self) -> &str;

    /// Fetch at most `max_items` items for `category`.
    /// Unknown categories yield `Ok(vec![])` plus a warning, not an error.
    async fn fetch(&self, category: &str, max_items: usize) -> Result<Vec<NewsItem>>;
}

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("ws regex"));

/// Normalize scraped text: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s);
    let stripped = RE_TAGS.replace_all(&decoded, " ");
    RE_WS.replace_all(&stripped, " ").trim().to_string()
}

/// RFC 2822 timestamps as used by RSS `pubDate` and the Naver search API.
pub(crate) fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .and_then(|dt| DateTime::from_timestamp(dt.unix_timestamp(), dt.nanosecond()))
}

/// First `max` characters of `s` (by Unicode scalar value, not bytes).
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

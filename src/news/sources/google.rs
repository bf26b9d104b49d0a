// src/news/sources/google.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use quick_xml::de::from_str;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{
    normalize_text, parse_rfc2822, truncate_chars, NewsSource, DEFAULT_TIMEOUT, SUMMARY_MAX_CHARS,
};
use crate::news::item::NewsItem;

pub const DEFAULT_BASE_URL: &str = "https://news.google.com";

const FEED_PARAMS: &str = "hl=ko&gl=KR&ceid=KR:ko";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

/// Where a category's feed comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Topic(&'static str),
    Search(&'static str),
}

pub fn category_feed(category: &str) -> Option<Feed> {
    match category {
        "society" => Some(Feed::Search("사회 뉴스")),
        // business
        "economy" => Some(Feed::Topic("CAAqJggKIiBDQkFTRWdvSUwyMHZNRGx6TVdZU0FtdHZHZ0pMVWlnQVAB")),
        "politics" => Some(Feed::Search("정치 뉴스")),
        "world" => Some(Feed::Topic("CAAqJggKIiBDQkFTRWdvSUwyMHZNRFp0Y1RjU0FtdHZHZ0pMVWlnQVAB")),
        // technology
        "tech" => Some(Feed::Topic("CAAqJggKIiBDQkFTRWdvSUwyMHZNRGRqTVhZU0FtdHZHZ0pMVWlnQVAB")),
        "culture" => Some(Feed::Search("문화 연예 뉴스")),
        _ => None,
    }
}

/// Google titles look like "headline - press"; split on the last separator.
fn split_press(title: &str) -> (String, Option<String>) {
    match title.rsplit_once(" - ") {
        Some((head, press)) if !head.trim().is_empty() && !press.trim().is_empty() => {
            (head.trim().to_string(), Some(press.trim().to_string()))
        }
        _ => (title.trim().to_string(), None),
    }
}

/// Google News RSS (Korean edition).
pub struct GoogleNewsSource {
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl Default for GoogleNewsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GoogleNewsSource {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn feed_url(&self, feed: Feed) -> String {
        match feed {
            Feed::Topic(topic) => format!("{}/rss/topics/{topic}?{FEED_PARAMS}", self.base_url),
            Feed::Search(query) => format!(
                "{}/rss/search?q={}&{FEED_PARAMS}",
                self.base_url,
                urlencoding::encode(query)
            ),
        }
    }

    /// Parse an RSS document into at most `max_items` items.
    pub fn parse_feed(
        &self,
        xml: &str,
        category: &str,
        max_items: usize,
    ) -> Result<Vec<NewsItem>> {
        let rss: Rss = from_str(xml).context("parsing google news rss xml")?;

        let mut out = Vec::with_capacity(rss.channel.item.len().min(max_items));
        for it in rss.channel.item.into_iter().take(max_items) {
            let raw_title = normalize_text(it.title.as_deref().unwrap_or_default());
            let link = it.link.unwrap_or_default().trim().to_string();
            if raw_title.is_empty() || link.is_empty() {
                continue;
            }
            let (title, press) = split_press(&raw_title);
            let source = match press {
                Some(p) => format!("{}/{p}", self.name()),
                None => self.name().to_string(),
            };
            let summary = it
                .description
                .as_deref()
                .map(|d| truncate_chars(&normalize_text(d), SUMMARY_MAX_CHARS))
                .filter(|s| !s.is_empty());

            out.push(NewsItem {
                title,
                link,
                category: category.to_string(),
                source,
                summary,
                published_at: it.pub_date.as_deref().and_then(parse_rfc2822),
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl NewsSource for GoogleNewsSource {
    fn name(&self) -> &str {
        "google"
    }

    async fn fetch(&self, category: &str, max_items: usize) -> Result<Vec<NewsItem>> {
        let Some(feed) = category_feed(category) else {
            tracing::warn!(source = "google", category, "unsupported category");
            return Ok(Vec::new());
        };
        let url = self.feed_url(feed);

        let t0 = std::time::Instant::now();
        let body = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .header(USER_AGENT, "Mozilla/5.0")
            .send()
            .await
            .context("google http get()")?
            .error_for_status()
            .context("google non-2xx")?
            .text()
            .await
            .context("google http .text()")?;

        let items = self.parse_feed(&body, category, max_items)?;
        histogram!("news_fetch_ms", "source" => "google")
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        tracing::debug!(source = "google", category, count = items.len(), "parsed feed");
        Ok(items)
    }
}

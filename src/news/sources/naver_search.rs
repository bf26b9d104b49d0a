// src/news/sources/naver_search.rs
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{
    normalize_text, parse_rfc2822, truncate_chars, NewsSource, DEFAULT_TIMEOUT, SUMMARY_MAX_CHARS,
};
use crate::config::NaverSearchConfig;
use crate::news::item::NewsItem;

const SEARCH_PATH: &str = "/v1/search/news.json";

/// The search API caps `display` at 100.
const MAX_DISPLAY: usize = 100;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    originallink: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

/// Search keywords per category. Other names are searched as given.
pub fn category_query(category: &str) -> &str {
    match category {
        "society" => "사회 사건 사고",
        "economy" => "경제 증시 금융",
        "politics" => "정치 국회",
        "world" => "국제 해외",
        "tech" => "IT 기술 과학",
        other => other,
    }
}

/// Naver Search API news adapter, newest first. Needs a client id and secret.
pub struct NaverSearchNewsSource {
    api_base: String,
    client_id: String,
    client_secret: String,
    client: Client,
    timeout: Duration,
}

impl NaverSearchNewsSource {
    pub fn new(cfg: &NaverSearchConfig) -> Self {
        Self {
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            client_id: cfg.client_id.clone(),
            client_secret: cfg.client_secret.clone(),
            client: Client::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Parse a search response. The publisher's own URL wins over the Naver mirror.
    pub fn parse_response(
        &self,
        body: &str,
        category: &str,
        max_items: usize,
    ) -> Result<Vec<NewsItem>> {
        let rsp: SearchResponse =
            serde_json::from_str(body).context("parsing naver search response")?;

        let items = rsp
            .items
            .into_iter()
            .take(max_items)
            .filter_map(|it| {
                let title = normalize_text(&it.title);
                let link = match it.originallink.trim() {
                    "" => it.link.trim().to_string(),
                    original => original.to_string(),
                };
                if title.is_empty() || link.is_empty() {
                    return None;
                }
                let summary = truncate_chars(&normalize_text(&it.description), SUMMARY_MAX_CHARS);

                Some(NewsItem {
                    title,
                    link,
                    category: category.to_string(),
                    source: self.name().to_string(),
                    summary: Some(summary).filter(|s| !s.is_empty()),
                    published_at: it.pub_date.as_deref().and_then(parse_rfc2822),
                })
            })
            .collect();
        Ok(items)
    }
}

#[async_trait]
impl NewsSource for NaverSearchNewsSource {
    fn name(&self) -> &str {
        "naver_search"
    }

    async fn fetch(&self, category: &str, max_items: usize) -> Result<Vec<NewsItem>> {
        if self.client_id.trim().is_empty() || self.client_secret.trim().is_empty() {
            bail!("naver search credentials are not configured");
        }
        let display = max_items.clamp(1, MAX_DISPLAY).to_string();
        let url = format!("{}{SEARCH_PATH}", self.api_base);

        let t0 = std::time::Instant::now();
        let body = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .header("X-Naver-Client-Id", &self.client_id)
            .header("X-Naver-Client-Secret", &self.client_secret)
            .query(&[
                ("query", category_query(category)),
                ("display", display.as_str()),
                ("sort", "date"),
            ])
            .send()
            .await
            .context("naver search http get()")?
            .error_for_status()
            .context("naver search non-2xx")?
            .text()
            .await
            .context("naver search http .text()")?;

        let items = self.parse_response(&body, category, max_items)?;
        histogram!("news_fetch_ms", "source" => "naver_search")
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        tracing::debug!(
            source = "naver_search",
            category,
            count = items.len(),
            "parsed search results"
        );
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const BODY: &str = r#"{
  "lastBuildDate": "Mon, 06 Jan 2025 10:40:00 +0900",
  "total": 3,
  "start": 1,
  "display": 3,
  "items": [
    {
      "title": "<b>코스피</b> 2,600 &quot;회복&quot;",
      "originallink": "https://www.hankyung.com/article/1",
      "link": "https://n.news.naver.com/mnews/article/015/1",
      "description": "외국인 매수세에 <b>코스피</b>가 반등했다.",
      "pubDate": "Mon, 06 Jan 2025 10:30:00 +0900"
    },
    {
      "title": "환율 하락",
      "originallink": "",
      "link": "https://n.news.naver.com/mnews/article/009/2",
      "description": "",
      "pubDate": "not a date"
    },
    {
      "title": "",
      "originallink": "https://example.com/untitled",
      "link": "",
      "description": "제목 없음"
    }
  ]
}"#;

    fn source() -> NaverSearchNewsSource {
        NaverSearchNewsSource::new(&NaverSearchConfig {
            client_id: "id".into(),
            client_secret: "secret".into(),
            ..NaverSearchConfig::default()
        })
    }

    #[test]
    fn parses_titles_links_and_dates() {
        let items = source().parse_response(BODY, "economy", 10).unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].title, "코스피 2,600 \"회복\"");
        assert_eq!(items[0].link, "https://www.hankyung.com/article/1");
        assert_eq!(items[0].source, "naver_search");
        assert_eq!(items[0].summary.as_deref(), Some("외국인 매수세에 코스피 가 반등했다."));
        assert_eq!(
            items[0].published_at,
            Some(Utc.with_ymd_and_hms(2025, 1, 6, 1, 30, 0).unwrap())
        );

        assert_eq!(items[1].link, "https://n.news.naver.com/mnews/article/009/2");
        assert!(items[1].summary.is_none());
        assert!(items[1].published_at.is_none());
    }

    #[test]
    fn max_items_bounds_the_results_looked_at() {
        let items = source().parse_response(BODY, "economy", 1).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn unmapped_category_is_searched_verbatim() {
        assert_eq!(category_query("economy"), "경제 증시 금융");
        assert_eq!(category_query("culture"), "culture");
    }

    #[tokio::test]
    async fn missing_credentials_fail_without_request() {
        let src = NaverSearchNewsSource::new(&NaverSearchConfig {
            api_base: "http://127.0.0.1:9".into(),
            ..NaverSearchConfig::default()
        });
        assert!(src.fetch("economy", 5).await.is_err());
    }
}

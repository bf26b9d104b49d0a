// src/news/sources/naver.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use once_cell::sync::Lazy;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, Url};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

use super::{normalize_text, truncate_chars, NewsSource, DEFAULT_TIMEOUT, SUMMARY_MAX_CHARS};
use crate::news::item::NewsItem;

pub const DEFAULT_BASE_URL: &str = "https://news.naver.com";

const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

static SEL_ARTICLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("ul.type06_headline li, ul.type06 li").expect("article selector"));
static SEL_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("dt:not(.photo) a, a.nclicks").expect("title selector"));
static SEL_SUMMARY: Lazy<Selector> =
    Lazy::new(|| Selector::parse("dd, span.lede").expect("summary selector"));
static SEL_PRESS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.writing").expect("press selector"));

/// Section ids on the Naver news list page.
pub fn section_id(category: &str) -> Option<&'static str> {
    match category {
        "society" => Some("102"),
        "economy" => Some("101"),
        "politics" => Some("100"),
        "world" => Some("104"),
        "culture" => Some("103"),
        "tech" => Some("105"),
        _ => None,
    }
}

/// Scrapes the Naver news section list pages.
pub struct NaverNewsSource {
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl Default for NaverNewsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl NaverNewsSource {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the adapter at another host (tests, mirrors).
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

    fn list_url(&self, sid: &str) -> String {
        format!("{}/main/list.naver?mode=LSD&mid=sec&sid1={sid}", self.base_url)
    }

    /// Parse a list page. Looks at the first `max_items` entries and drops the
    /// ones without a title or link.
    pub fn parse_list_page(
        &self,
        html: &str,
        page_url: &str,
        category: &str,
        max_items: usize,
    ) -> Vec<NewsItem> {
        let base = Url::parse(page_url).ok();
        let document = Html::parse_document(html);
        document
            .select(&SEL_ARTICLE)
            .take(max_items)
            .filter_map(|el| self.parse_article(el, base.as_ref(), category))
            .collect()
    }

    fn parse_article(
        &self,
        article: ElementRef<'_>,
        base: Option<&Url>,
        category: &str,
    ) -> Option<NewsItem> {
        let title_el = article.select(&SEL_TITLE).next()?;
        let title = normalize_text(&title_el.text().collect::<String>());
        let href = title_el.value().attr("href").unwrap_or_default().trim();
        if title.is_empty() || href.is_empty() {
            return None;
        }
        let link = match base.and_then(|b| b.join(href).ok()) {
            Some(u) => u.to_string(),
            None => href.to_string(),
        };

        let summary = article
            .select(&SEL_SUMMARY)
            .next()
            .map(|el| {
                let text = normalize_text(&el.text().collect::<String>());
                truncate_chars(&text, SUMMARY_MAX_CHARS)
            })
            .filter(|s| !s.is_empty());

        let press = article
            .select(&SEL_PRESS)
            .next()
            .map(|el| normalize_text(&el.text().collect::<String>()))
            .unwrap_or_default();
        let source = if press.is_empty() {
            self.name().to_string()
        } else {
            format!("{}:{press}", self.name())
        };

        Some(NewsItem {
            title,
            link,
            category: category.to_string(),
            source,
            summary,
            published_at: None,
        })
    }
}

#[async_trait]
impl NewsSource for NaverNewsSource {
    fn name(&self) -> &str {
        "naver"
    }

    async fn fetch(&self, category: &str, max_items: usize) -> Result<Vec<NewsItem>> {
        let Some(sid) = section_id(category) else {
            tracing::warn!(source = "naver", category, "unsupported category");
            return Ok(Vec::new());
        };
        let url = self.list_url(sid);

        let t0 = std::time::Instant::now();
        let body = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .header(USER_AGENT, BROWSER_UA)
            .header(ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header(ACCEPT_LANGUAGE, "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7")
            .send()
            .await
            .context("naver http get()")?
            .error_for_status()
            .context("naver non-2xx")?
            .text()
            .await
            .context("naver http .text()")?;

        let items = self.parse_list_page(&body, &url, category, max_items);
        histogram!("news_fetch_ms", "source" => "naver")
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        tracing::debug!(source = "naver", category, count = items.len(), "parsed list page");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html><body>
<ul class="type06_headline">
  <li>
    <dl>
      <dt class="photo"><a href="https://n.news.naver.com/article/001/0001"><img src="x.jpg"></a></dt>
      <dt><a href="https://n.news.naver.com/article/001/0001"> 서울 도심 집회 &amp; 교통 통제 </a></dt>
      <dd><span class="lede">주말 서울 도심에서 대규모 집회가 열려 교통이 통제됐다.</span>
          <span class="writing">연합뉴스</span></dd>
    </dl>
  </li>
  <li>
    <dl>
      <dt><a href="/article/002/0002">상대 경로 기사</a></dt>
    </dl>
  </li>
  <li><dl><dt><a href="">제목만 있고 링크 없음</a></dt></dl></li>
</ul>
<ul class="type06">
  <li><dl><dt><a href="https://n.news.naver.com/article/003/0003">세 번째 기사</a></dt></dl></li>
</ul>
</body></html>"#;

    #[test]
    fn section_ids_cover_known_categories() {
        for c in crate::news::item::KNOWN_CATEGORIES {
            assert!(section_id(c).is_some(), "{c}");
        }
        assert!(section_id("unknown_category").is_none());
    }

    #[test]
    fn parses_title_link_summary_and_press() {
        let src = NaverNewsSource::new();
        let page_url = "https://news.naver.com/main/list.naver?mode=LSD&mid=sec&sid1=102";
        let items = src.parse_list_page(PAGE, page_url, "society", 10);
        assert_eq!(items.len(), 3);

        let first = &items[0];
        assert_eq!(first.title, "서울 도심 집회 & 교통 통제");
        assert_eq!(first.link, "https://n.news.naver.com/article/001/0001");
        assert_eq!(first.source, "naver:연합뉴스");
        assert_eq!(first.category, "society");
        assert!(first.summary.as_deref().unwrap().starts_with("주말 서울 도심에서"));
        assert!(first.published_at.is_none());

        assert_eq!(items[1].link, "https://news.naver.com/article/002/0002");
        assert_eq!(items[1].source, "naver");
        assert!(items[1].summary.is_none());
        assert_eq!(items[2].title, "세 번째 기사");
    }

    #[test]
    fn max_items_bounds_the_entries_looked_at() {
        let src = NaverNewsSource::new();
        let items = src.parse_list_page(PAGE, "https://news.naver.com/", "society", 2);
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn unknown_category_is_empty_not_error() {
        let src = NaverNewsSource::with_base_url("http://127.0.0.1:9");
        let items = src.fetch("unknown_category", 5).await.unwrap();
        assert!(items.is_empty());
    }
}

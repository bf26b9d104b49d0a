// tests/formatter.rs
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use logos_news::config::AppConfig;
use logos_news::news::formatter::{Dialect, FormatOptions};
use logos_news::{Collector, Formatter, NewsItem, NewsSource};

struct Fixed(Vec<NewsItem>);

#[async_trait]
impl NewsSource for Fixed {
    fn name(&self) -> &str {
        "naver"
    }

    async fn fetch(&self, category: &str, max_items: usize) -> Result<Vec<NewsItem>> {
        Ok(self
            .0
            .iter()
            .filter(|i| i.category == category)
            .take(max_items)
            .cloned()
            .collect())
    }
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
}

async fn collected(items: Vec<NewsItem>) -> logos_news::CategoryNews {
    let cfg = AppConfig::from_toml_str(
        "[news.categories.economy]\nmax_items = 5\n[news.categories.society]\nmax_items = 5\n",
    )
    .unwrap();
    let mut c = Collector::new(cfg.news);
    c.register_source(Box::new(Fixed(items)));
    c.collect_all().await
}

#[tokio::test]
async fn summaries_can_be_left_out() {
    let news = collected(vec![NewsItem::new("금리 동결", "https://n.com/1", "economy", "naver")
        .with_summary("한국은행이 기준금리를 동결했다")])
    .await;

    let f = Formatter::new(FormatOptions {
        include_summary: false,
        include_link: true,
        dialect: Dialect::Plain,
    });
    let out = f.format_at(&news, Some("naver"), monday());

    assert!(out.starts_with("🟢 네이버 뉴스\n2025년 01월 06일 (월)\n"));
    assert!(out.contains("💰 경제"));
    assert!(out.contains("1. 금리 동결"));
    assert!(out.contains("🔗 https://n.com/1"));
    assert!(!out.contains("한국은행"));
    // society came back empty and is omitted
    assert!(!out.contains("📌 사회"));
}

#[tokio::test]
async fn markdown_escapes_title_punctuation_once() {
    let news = collected(vec![NewsItem::new(
        "속보! 금리 동결.",
        "https://n.com/2",
        "society",
        "naver",
    )])
    .await;

    let f = Formatter::new(FormatOptions {
        include_summary: true,
        include_link: false,
        dialect: Dialect::Markdown,
    });
    let out = f.format_at(&news, None, monday());

    assert!(out.contains("1\\. 속보\\! 금리 동결\\."));
    assert!(!out.contains("\\\\"));
    assert!(out.starts_with("*📰 오늘의 뉴스 브리핑*\n_2025년 01월 06일 \\(월\\)_"));
}

#[tokio::test]
async fn same_input_and_date_give_identical_output() {
    let items = vec![
        NewsItem::new("a & b", "https://n.com/3", "economy", "naver").with_summary("<요약>"),
        NewsItem::new("c", "https://n.com/4", "society", "naver"),
    ];
    let news = collected(items).await;
    let f = Formatter::new(FormatOptions {
        dialect: Dialect::Html,
        ..FormatOptions::default()
    });
    let first = f.format_at(&news, Some("naver"), monday());
    assert_eq!(first, f.format_at(&news, Some("naver"), monday()));
    assert!(first.contains("1. a &amp; b"));
    assert!(first.contains("<i>&lt;요약&gt;</i>"));
}

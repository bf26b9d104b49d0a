// src/news/item.rs
use chrono::{DateTime, Utc};
use std::hash::{Hash, Hasher};

/// Categories every bundled source knows how to fetch.
pub const KNOWN_CATEGORIES: [&str; 6] =
    ["society", "economy", "politics", "world", "culture", "tech"];

/// A single fetched article.
///
/// Identity is the `link`: two items with the same link compare equal and hash
/// the same, whatever their title, source or timestamps say.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    pub category: String, // e.g. "society", "economy"
    pub source: String,   // e.g. "naver", "google/연합뉴스"
    pub summary: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl NewsItem {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        category: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            category: category.into(),
            source: source.into(),
            summary: None,
            published_at: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_published_at(mut self, ts: DateTime<Utc>) -> Self {
        self.published_at = Some(ts);
        self
    }

    /// Summary text if present and non-empty.
    pub fn summary_text(&self) -> Option<&str> {
        self.summary.as_deref().filter(|s| !s.is_empty())
    }

    /// Sort key: missing timestamps rank as the earliest possible time.
    pub fn rank_time(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl PartialEq for NewsItem {
    fn eq(&self, other: &Self) -> bool {
        self.link == other.link
    }
}

impl Eq for NewsItem {}

impl Hash for NewsItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.link.hash(state);
    }
}

/// Per-category results in presentation order.
pub type CategoryNews = Vec<(String, Vec<NewsItem>)>;

/// Total number of items across all categories.
pub fn total_items(news: &CategoryNews) -> usize {
    news.iter().map(|(_, items)| items.len()).sum()
}

/// Items collected for `category`, if the category is present.
pub fn items_for<'a>(news: &'a CategoryNews, category: &str) -> Option<&'a [NewsItem]> {
    news.iter()
        .find(|(name, _)| name == category)
        .map(|(_, items)| items.as_slice())
}

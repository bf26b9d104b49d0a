// src/news/collector.rs
//! Collector: fan out to sources per category, then merge, dedup, rank, cap.
//!
//! Source failures never escape this module. They are logged with the source,
//! category and cause, counted, and the category simply ends up with fewer
//! items. An all-failed run and an all-empty run look the same to callers.

use futures::future::join_all;
use metrics::counter;
use std::collections::HashSet;
use tracing::{error, info, warn};

use crate::config::NewsConfig;
use crate::news::item::{total_items, CategoryNews, NewsItem};
use crate::news::sources::NewsSource;

/// Headroom factor when several sources feed one category.
pub const FETCH_HEADROOM: usize = 2;

/// Keep one item per link. The first occurrence wins and keeps its position.
/// Returns the unique items and how many duplicates were dropped.
pub fn dedup_by_link(items: Vec<NewsItem>) -> (Vec<NewsItem>, usize) {
    let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
    let mut unique = Vec::with_capacity(items.len());
    let mut dropped = 0usize;
    for item in items {
        if seen.insert(item.link.clone()) {
            unique.push(item);
        } else {
            dropped += 1;
        }
    }
    (unique, dropped)
}

/// Newest first; undated items last. Stable, so ties keep collection order.
pub fn rank(items: &mut [NewsItem]) {
    items.sort_by(|a, b| b.rank_time().cmp(&a.rank_time()));
}

pub struct Collector {
    config: NewsConfig,
    sources: Vec<Box<dyn NewsSource>>,
}

impl Collector {
    pub fn new(config: NewsConfig) -> Self {
        crate::news::ensure_metrics_described();
        Self {
            config,
            sources: Vec::new(),
        }
    }

    pub fn register_source(&mut self, source: Box<dyn NewsSource>) {
        info!(source = source.name(), "news source registered");
        self.sources.push(source);
    }

    pub fn sources(&self) -> &[Box<dyn NewsSource>] {
        &self.sources
    }

    pub fn config(&self) -> &NewsConfig {
        &self.config
    }

    /// Aggregate every enabled category across all enabled sources.
    pub async fn collect_all(&self) -> CategoryNews {
        let mut result = CategoryNews::new();

        for (category, cat_cfg) in self.config.enabled_categories() {
            info!(category, "collecting category");

            let active: Vec<&dyn NewsSource> = self
                .sources
                .iter()
                .map(|s| s.as_ref())
                .filter(|s| self.config.source_enabled(s.name()))
                .collect();

            let want = cat_cfg.max_items.saturating_mul(FETCH_HEADROOM);
            let fetches = active.iter().map(|s| s.fetch(category, want));
            // all fetches for this category settle before anything is merged
            let outcomes = join_all(fetches).await;

            let mut merged = Vec::new();
            for (source, outcome) in active.iter().zip(outcomes) {
                counter!("news_fetch_total", "source" => source.name().to_string()).increment(1);
                match outcome {
                    Ok(items) => {
                        info!(source = source.name(), category, count = items.len(), "fetched");
                        merged.extend(items);
                    }
                    Err(e) => {
                        error!(source = source.name(), category, error = ?e, "fetch failed");
                        counter!("news_fetch_errors_total", "source" => source.name().to_string())
                            .increment(1);
                    }
                }
            }

            let (mut unique, dropped) = dedup_by_link(merged);
            counter!("news_dedup_total").increment(dropped as u64);
            rank(&mut unique);
            unique.truncate(cat_cfg.max_items);

            counter!("news_items_collected_total").increment(unique.len() as u64);
            info!(category, count = unique.len(), dropped, "category done");
            result.push((category.to_string(), unique));
        }

        result
    }

    /// Collect every enabled category from one source, as that source reports it.
    pub async fn collect_by_source(&self, source: &dyn NewsSource) -> CategoryNews {
        let mut result = CategoryNews::new();

        if !self.config.source_enabled(source.name()) {
            warn!(source = source.name(), "source is disabled; skipping");
            return result;
        }

        info!(source = source.name(), "collecting from source");

        for (category, cat_cfg) in self.config.enabled_categories() {
            counter!("news_fetch_total", "source" => source.name().to_string()).increment(1);
            let items = match source.fetch(category, cat_cfg.max_items).await {
                Ok(items) => {
                    info!(source = source.name(), category, count = items.len(), "fetched");
                    items
                }
                Err(e) => {
                    error!(source = source.name(), category, error = ?e, "fetch failed");
                    counter!("news_fetch_errors_total", "source" => source.name().to_string())
                        .increment(1);
                    Vec::new()
                }
            };
            counter!("news_items_collected_total").increment(items.len() as u64);
            result.push((category.to_string(), items));
        }

        info!(source = source.name(), total = total_items(&result), "source done");
        result
    }
}

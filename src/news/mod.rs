// src/news/mod.rs
pub mod collector;
pub mod formatter;
pub mod item;
pub mod sources;

pub use collector::Collector;
pub use formatter::{Dialect, FormatOptions, Formatter};
pub use item::{CategoryNews, NewsItem};
pub use sources::NewsSource;

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration, so series carry descriptions once a
/// recorder is installed.
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("news_fetch_total", "Source fetches attempted, per source.");
        describe_counter!("news_fetch_errors_total", "Source fetches that failed, per source.");
        describe_counter!("news_dedup_total", "Items dropped as duplicate links.");
        describe_counter!(
            "news_items_collected_total",
            "Items handed to the formatter after merge and cap."
        );
        describe_histogram!("news_fetch_ms", "Source fetch + parse time in milliseconds.");
    });
}

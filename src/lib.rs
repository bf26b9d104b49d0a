// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod briefing;
pub mod cli;
pub mod config;
pub mod logging;
pub mod news;
pub mod notify;
pub mod scheduler;

// ---- Re-exports for stable public API ----
pub use crate::briefing::Briefing;
pub use crate::config::{load_config, validate, AppConfig};
pub use crate::news::{CategoryNews, Collector, Dialect, Formatter, NewsItem, NewsSource};
pub use crate::notify::{ErrorNotifier, MessageChannel, TelegramSender};

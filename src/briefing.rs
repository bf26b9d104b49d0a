// src/briefing.rs
//! One briefing run: collect per source, format, deliver.

use anyhow::{bail, Context, Result};
use metrics::counter;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::{validate, AppConfig, MessageConfig, NewsConfig};
use crate::news::collector::Collector;
use crate::news::formatter::{Dialect, FormatOptions, Formatter};
use crate::news::item::total_items;
use crate::news::sources::{GoogleNewsSource, NaverNewsSource, NaverSearchNewsSource, NewsSource};
use crate::notify::{ErrorNotifier, MessageChannel};
use crate::scheduler::parse_timezone;

pub const NO_NEWS_MESSAGE: &str = "📰 오늘의 뉴스 브리핑\n\n현재 수집된 뉴스가 없습니다.";

pub const TEST_MESSAGE: &str = "✅ Logos News 연결 테스트 성공!\n\n\
텔레그램 봇이 정상적으로 작동합니다.\n\
뉴스 브리핑을 받을 준비가 되었습니다.";

const RUN_CONTEXT: &str = "뉴스 브리핑 실행";

/// Built-in adapters that are enabled in `cfg`, in dispatch order. The search
/// API adapter also needs credentials.
pub fn build_sources(cfg: &NewsConfig) -> Vec<Box<dyn NewsSource>> {
    let mut sources: Vec<Box<dyn NewsSource>> = Vec::new();
    if cfg.source_enabled("naver") {
        sources.push(Box::new(NaverNewsSource::new()));
    }
    if cfg.source_enabled("naver_search") && cfg.naver_search.is_configured() {
        sources.push(Box::new(NaverSearchNewsSource::new(&cfg.naver_search)));
    }
    if cfg.source_enabled("google") {
        sources.push(Box::new(GoogleNewsSource::new()));
    }
    sources
}

pub fn formatter_for(msg: &MessageConfig) -> Formatter {
    Formatter::new(FormatOptions {
        include_summary: msg.include_summary,
        include_link: msg.include_link,
        dialect: Dialect::from_name(&msg.format),
    })
}

/// Formatter for a run: message options plus the schedule's timezone for the date.
pub fn briefing_formatter(config: &AppConfig) -> Formatter {
    formatter_for(&config.message).with_offset(parse_timezone(&config.schedule.timezone))
}

pub struct Briefing {
    config: AppConfig,
    collector: Collector,
    formatter: Formatter,
    channel: Arc<dyn MessageChannel>,
    notifier: ErrorNotifier,
}

impl Briefing {
    pub fn new(
        config: AppConfig,
        sources: Vec<Box<dyn NewsSource>>,
        channel: Arc<dyn MessageChannel>,
    ) -> Self {
        let mut collector = Collector::new(config.news.clone());
        for s in sources {
            collector.register_source(s);
        }
        let formatter = briefing_formatter(&config);
        Self {
            config,
            collector,
            formatter,
            channel,
            notifier: ErrorNotifier::disabled(),
        }
    }

    pub fn with_notifier(mut self, notifier: ErrorNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Run once. `true` only when every non-empty source message was delivered.
    pub async fn run(&self) -> bool {
        info!("news briefing starting");
        counter!("briefing_runs_total").increment(1);

        match self.try_run().await {
            Ok(ok) => ok,
            Err(e) => {
                error!(error = ?e, "news briefing failed");
                counter!("briefing_failures_total").increment(1);
                self.notifier.notify_error(&e, Some(RUN_CONTEXT)).await;
                false
            }
        }
    }

    async fn try_run(&self) -> Result<bool> {
        let problems = validate(&self.config);
        if !problems.is_empty() {
            for p in &problems {
                error!(problem = %p, "config error");
            }
            return Ok(false);
        }

        self.channel.check().await.context("delivery channel check")?;

        if self.collector.sources().is_empty() {
            warn!("no news sources enabled");
            return Ok(false);
        }

        let dialect = self.formatter.dialect();
        let mut all_sent = true;
        let mut total = 0usize;

        for source in self.collector.sources() {
            let name = source.name();
            let news = self.collector.collect_by_source(source.as_ref()).await;
            let count = total_items(&news);
            total += count;

            if count == 0 {
                warn!(source = name, "no news collected");
                continue;
            }

            let message = self.formatter.format(&news, Some(name));
            if self.channel.send(&message, Some(dialect)).await {
                info!(source = name, items = count, "briefing delivered");
            } else {
                error!(source = name, "briefing delivery failed");
                all_sent = false;
            }
        }

        info!(total, "news collected");

        if total == 0 && !self.channel.send(NO_NEWS_MESSAGE, None).await {
            bail!("no-news notice could not be delivered");
        }

        Ok(all_sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_sources_honors_enabled_flags() {
        let mut cfg = NewsConfig::default();
        let names: Vec<String> = build_sources(&cfg).iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["naver", "google"]);

        cfg.sources.insert(
            "naver".into(),
            crate::config::SourceConfig {
                enabled: false,
                priority: 1,
            },
        );
        let names: Vec<String> = build_sources(&cfg).iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["google"]);
    }

    #[test]
    fn search_adapter_joins_once_credentials_are_set() {
        let mut cfg = NewsConfig::default();
        cfg.naver_search.client_id = "id".into();
        cfg.naver_search.client_secret = "secret".into();
        let names: Vec<String> = build_sources(&cfg).iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["naver", "naver_search", "google"]);

        cfg.sources.insert(
            "naver_search".into(),
            crate::config::SourceConfig {
                enabled: false,
                priority: 1,
            },
        );
        let names: Vec<String> = build_sources(&cfg).iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["naver", "google"]);
    }

    #[test]
    fn formatter_follows_message_config() {
        let msg = MessageConfig {
            include_summary: false,
            include_link: true,
            format: "html".into(),
        };
        let f = formatter_for(&msg);
        assert_eq!(f.dialect(), Dialect::Html);
        assert!(!f.options().include_summary);
    }

    #[test]
    fn run_formatter_dates_in_schedule_timezone() {
        let mut cfg = AppConfig::default();
        let f = briefing_formatter(&cfg);
        assert_eq!(f.offset().map(|o| o.local_minus_utc()), Some(9 * 3600));

        cfg.schedule.timezone = "UTC".into();
        assert_eq!(briefing_formatter(&cfg).offset().map(|o| o.local_minus_utc()), Some(0));
    }
}

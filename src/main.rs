//! Logos News binary entrypoint.
//! Parses the CLI, loads config, installs logging, then runs the chosen mode.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use logos_news::briefing::{build_sources, Briefing, TEST_MESSAGE};
use logos_news::cli::{Cli, Mode};
use logos_news::config::{self, AppConfig, LoggingConfig};
use logos_news::notify::{ErrorNotifier, MessageChannel, TelegramSender};
use logos_news::{logging, scheduler::Scheduler};

/// Log every validation problem; `true` when the config is usable.
fn check_config(cfg: &AppConfig) -> bool {
    let problems = config::validate(cfg);
    for p in &problems {
        error!(problem = %p, "config error");
    }
    problems.is_empty()
}

fn validate_only(cfg: &AppConfig) -> bool {
    if !check_config(cfg) {
        error!("config validation failed");
        return false;
    }
    info!("config is valid");
    for line in config::summary_lines(cfg) {
        info!("  {line}");
    }
    true
}

async fn test_telegram(cfg: &AppConfig) -> bool {
    if !check_config(cfg) {
        return false;
    }
    let sender = TelegramSender::new(&cfg.telegram);
    if !sender.test_connection().await {
        return false;
    }
    sender.send_plain(TEST_MESSAGE).await
}

async fn run_once(cfg: AppConfig) -> bool {
    let sender: Arc<dyn MessageChannel> = Arc::new(TelegramSender::new(&cfg.telegram));
    let sources = build_sources(&cfg.news);
    Briefing::new(cfg, sources, sender).run().await
}

async fn run_scheduler(cfg: AppConfig) -> bool {
    if !check_config(&cfg) {
        return false;
    }
    let scheduler = match Scheduler::new(&cfg.schedule) {
        Ok(s) => s,
        Err(e) => {
            error!(error = ?e, "invalid schedule");
            return false;
        }
    };

    let sender: Arc<dyn MessageChannel> = Arc::new(TelegramSender::new(&cfg.telegram));
    let notifier = ErrorNotifier::new(sender.clone());
    let sources = build_sources(&cfg.news);
    let briefing = Briefing::new(cfg, sources, sender).with_notifier(notifier.clone());

    notifier.notify_startup().await;

    let outcome = scheduler.run_forever(|| briefing.run()).await;
    let ok = match outcome {
        Ok(()) => true,
        Err(e) => {
            error!(error = ?e, "scheduler failed");
            notifier.notify_error(&e, Some("스케줄러 실행")).await;
            false
        }
    };

    notifier.notify_shutdown("정상 종료").await;
    ok
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let cfg = match config::load_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            let _ = logging::init(&LoggingConfig::default());
            error!(error = ?e, "failed to load config");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&cfg.logging) {
        let _ = logging::init(&LoggingConfig::default());
        error!(error = ?e, "log file unavailable; console only");
    }

    let mode = cli.mode();
    info!(?mode, "logos-news starting");

    let ok = match mode {
        Mode::Validate => validate_only(&cfg),
        Mode::Test => test_telegram(&cfg).await,
        Mode::Scheduler => run_scheduler(cfg).await,
        Mode::Now => run_once(cfg).await,
    };

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

// src/notify/alerts.rs
//! Operational notices (errors, scheduler start/stop) sent as plain text.

use chrono::Local;
use std::sync::Arc;

use super::MessageChannel;
use crate::news::sources::truncate_chars;

pub const ERROR_TEXT_MAX_CHARS: usize = 200;
pub const CAUSE_CHAIN_MAX_CHARS: usize = 500;

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn now_stamp() -> String {
    Local::now().format(TS_FORMAT).to_string()
}

/// Build the error notice body. `timestamp` is injected so tests stay stable.
pub fn error_message(err: &anyhow::Error, context: Option<&str>, timestamp: &str) -> String {
    let mut lines = vec![
        "⚠️ Logos News 에러 발생".to_string(),
        String::new(),
        format!("🕐 시간: {timestamp}"),
        format!("📝 메시지: {}", truncate_chars(&err.to_string(), ERROR_TEXT_MAX_CHARS)),
    ];
    if let Some(ctx) = context {
        lines.push(format!("📍 컨텍스트: {ctx}"));
    }

    let causes: Vec<String> = err.chain().skip(1).map(|c| c.to_string()).collect();
    if !causes.is_empty() {
        lines.push(String::new());
        lines.push("📋 원인:".to_string());
        lines.push(truncate_chars(&causes.join("\n"), CAUSE_CHAIN_MAX_CHARS));
    }
    lines.join("\n")
}

#[derive(Clone)]
pub struct ErrorNotifier {
    channel: Option<Arc<dyn MessageChannel>>,
}

impl ErrorNotifier {
    pub fn new(channel: Arc<dyn MessageChannel>) -> Self {
        Self {
            channel: Some(channel),
        }
    }

    /// A notifier that never sends.
    pub fn disabled() -> Self {
        Self { channel: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.channel.is_some()
    }

    async fn deliver(&self, text: &str) -> bool {
        match &self.channel {
            Some(ch) => {
                let ok = ch.send(text, None).await;
                if !ok {
                    tracing::error!("operational notice delivery failed");
                }
                ok
            }
            None => false,
        }
    }

    pub async fn notify_error(&self, err: &anyhow::Error, context: Option<&str>) -> bool {
        if !self.is_enabled() {
            return false;
        }
        self.deliver(&error_message(err, context, &now_stamp())).await
    }

    pub async fn notify_startup(&self) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let text = format!(
            "🚀 Logos News 스케줄러 시작\n\n🕐 시작 시간: {}\n📰 뉴스 브리핑 서비스가 활성화되었습니다.",
            now_stamp()
        );
        self.deliver(&text).await
    }

    pub async fn notify_shutdown(&self, reason: &str) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let text = format!(
            "🛑 Logos News 스케줄러 종료\n\n🕐 종료 시간: {}\n📝 사유: {reason}",
            now_stamp()
        );
        self.deliver(&text).await
    }
}

// src/notify/telegram.rs
use anyhow::{anyhow, bail, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{split_message, MessageChannel};
use crate::config::TelegramConfig;
use crate::news::formatter::Dialect;

/// Bot API hard limit for one message.
pub const MAX_MESSAGE_CHARS: usize = 4096;

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<serde_json::Value>,
}

fn parse_mode(dialect: Option<Dialect>) -> Option<&'static str> {
    match dialect {
        Some(Dialect::Markdown) => Some("MarkdownV2"),
        Some(Dialect::Html) => Some("HTML"),
        Some(Dialect::Plain) | None => None,
    }
}

/// Telegram Bot API client for one bot + default chat.
#[derive(Clone)]
pub struct TelegramSender {
    api_base: String,
    token: String,
    chat_id: String,
    client: Client,
    timeout: Duration,
    max_retries: u32,
    backoff_base: Duration,
}

impl TelegramSender {
    pub fn new(cfg: &TelegramConfig) -> Self {
        Self {
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            token: cfg.bot_token.clone(),
            chat_id: cfg.chat_id.clone(),
            client: Client::new(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    /// Delay before retry `n` is `base * 2^(n-1)`.
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.token)
    }

    async fn call(&self, method: &str, body: &serde_json::Value) -> Result<ApiResponse> {
        let rsp = self
            .client
            .post(self.method_url(method))
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .with_context(|| format!("telegram {method} request"))?;

        let status = rsp.status();
        let parsed: ApiResponse = rsp
            .json()
            .await
            .with_context(|| format!("telegram {method} response (HTTP {status})"))?;
        if !parsed.ok {
            bail!(
                "telegram {method} rejected (HTTP {status}): {}",
                parsed.description.as_deref().unwrap_or("no description")
            );
        }
        Ok(parsed)
    }

    fn message_body(chat_id: &str, chunk: &str, dialect: Option<Dialect>) -> serde_json::Value {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "text": chunk,
            "disable_web_page_preview": true,
        });
        if let Some(mode) = parse_mode(dialect) {
            body["parse_mode"] = serde_json::Value::from(mode);
        }
        body
    }

    /// Delivers every chunk of `text`, giving each one up to `attempts` tries.
    /// A chunk that went through is never posted again.
    async fn deliver(
        &self,
        text: &str,
        chat_id: &str,
        attempts: u32,
        dialect: Option<Dialect>,
    ) -> Result<()> {
        if chat_id.trim().is_empty() {
            return Err(anyhow!("chat id is not configured"));
        }

        let chunks = split_message(text, MAX_MESSAGE_CHARS, dialect);
        let total = chunks.len();
        for (idx, chunk) in chunks.iter().enumerate() {
            let body = Self::message_body(chat_id, chunk, dialect);
            let mut attempt = 1;
            loop {
                match self.call("sendMessage", &body).await {
                    Ok(_) => break,
                    Err(e) if attempt < attempts => {
                        let delay = self.backoff_base * (1u32 << (attempt - 1).min(16));
                        tracing::warn!(
                            chunk = idx + 1,
                            chunks = total,
                            attempt,
                            max = attempts,
                            ?delay,
                            error = %e,
                            "send attempt failed; backing off"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    Err(e) => {
                        return Err(e.context(format!("chunk {} of {total}", idx + 1)));
                    }
                }
            }
        }
        Ok(())
    }

    async fn send_attempts(
        &self,
        text: &str,
        chat_id: Option<&str>,
        attempts: u32,
        dialect: Option<Dialect>,
    ) -> bool {
        let target = chat_id.unwrap_or(&self.chat_id);
        match self.deliver(text, target, attempts, dialect).await {
            Ok(()) => {
                tracing::info!(chat_id = target, "message sent");
                true
            }
            Err(e) => {
                tracing::error!(
                    chat_id = target,
                    max = attempts,
                    error = ?e,
                    "message send failed"
                );
                false
            }
        }
    }

    /// One delivery attempt to `chat_id` (or the configured chat).
    pub async fn send_message(
        &self,
        text: &str,
        chat_id: Option<&str>,
        dialect: Option<Dialect>,
    ) -> bool {
        self.send_attempts(text, chat_id, 1, dialect).await
    }

    /// Send without a parse mode.
    pub async fn send_plain(&self, text: &str) -> bool {
        self.send_message(text, None, None).await
    }

    /// Up to `max_retries` attempts per chunk, with exponential backoff between them.
    pub async fn send_with_retry(
        &self,
        text: &str,
        max_retries: u32,
        dialect: Option<Dialect>,
    ) -> bool {
        self.send_attempts(text, None, max_retries.max(1), dialect).await
    }

    /// `getMe`; returns the bot username.
    pub async fn get_me(&self) -> Result<String> {
        let rsp = self.call("getMe", &serde_json::json!({})).await?;
        let username = rsp
            .result
            .as_ref()
            .and_then(|r| r.get("username"))
            .and_then(|u| u.as_str())
            .unwrap_or("?")
            .to_string();
        Ok(username)
    }

    /// Verifies the token and logs the bot username.
    pub async fn test_connection(&self) -> bool {
        match self.get_me().await {
            Ok(username) => {
                tracing::info!(bot = %username, "telegram bot connected");
                true
            }
            Err(e) => {
                tracing::error!(error = ?e, "telegram bot connection failed");
                false
            }
        }
    }
}

#[async_trait::async_trait]
impl MessageChannel for TelegramSender {
    async fn send(&self, text: &str, dialect: Option<Dialect>) -> bool {
        self.send_with_retry(text, self.max_retries, dialect).await
    }

    async fn check(&self) -> Result<()> {
        let username = self.get_me().await.context("telegram bot connection")?;
        tracing::info!(bot = %username, "telegram bot connected");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_modes_map_to_bot_api_names() {
        assert_eq!(parse_mode(Some(Dialect::Markdown)), Some("MarkdownV2"));
        assert_eq!(parse_mode(Some(Dialect::Html)), Some("HTML"));
        assert_eq!(parse_mode(Some(Dialect::Plain)), None);
        assert_eq!(parse_mode(None), None);
    }

    #[tokio::test]
    async fn empty_chat_id_fails_without_request() {
        let cfg = TelegramConfig {
            bot_token: "t".into(),
            chat_id: String::new(),
            api_base: "http://127.0.0.1:9".into(),
        };
        let sender = TelegramSender::new(&cfg);
        assert!(!sender.send_plain("hi").await);
    }
}

// src/notify/mod.rs
pub mod alerts;
pub mod telegram;

pub use alerts::ErrorNotifier;
pub use telegram::TelegramSender;

use crate::news::formatter::Dialect;

/// Outbound delivery of a finished message.
///
/// Implementations own their retry policy; callers only see the final outcome.
#[async_trait::async_trait]
pub trait MessageChannel: Send + Sync {
    /// `None` sends the text without any parse mode.
    async fn send(&self, text: &str, dialect: Option<Dialect>) -> bool;

    /// Verify the channel is usable before a run starts.
    async fn check(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Split `text` on line boundaries into chunks of at most `limit` characters.
/// A single line longer than `limit` is hard-split; for MarkdownV2 the cut never
/// lands between a backslash and the character it escapes.
pub fn split_message(text: &str, limit: usize, dialect: Option<Dialect>) -> Vec<String> {
    if limit == 0 || text.chars().count() <= limit {
        return vec![text.to_string()];
    }
    let keep_escapes = dialect == Some(Dialect::Markdown);

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        // +1 for the newline that rejoins this line to `current`
        let needed = if current.is_empty() { line_len } else { line_len + 1 };
        if current_len + needed > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len > limit {
            hard_split(line, limit, keep_escapes, &mut chunks);
            continue;
        }

        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn hard_split(line: &str, limit: usize, keep_escapes: bool, chunks: &mut Vec<String>) {
    let chars: Vec<char> = line.chars().collect();
    let mut start = 0;
    while start < chars.len() {
        let mut end = (start + limit).min(chars.len());
        if keep_escapes && end < chars.len() {
            let trailing = chars[start..end].iter().rev().take_while(|c| **c == '\\').count();
            // an odd run ends in a lone escape character
            if trailing % 2 == 1 && end - start > 1 {
                end -= 1;
            }
        }
        chunks.push(chars[start..end].iter().collect());
        start = end;
    }
}

// src/news/formatter.rs
//! Renders collected news into one message in a Telegram-friendly dialect.
//!
//! Output is a pure function of (news, source name, date); `format` only adds
//! today's date in the formatter's timezone.

use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDate, Utc};

use crate::news::item::{CategoryNews, NewsItem};

/// Summary excerpt length, in characters.
pub const SUMMARY_EXCERPT_CHARS: usize = 80;

const WEEKDAYS_KO: [&str; 7] = ["월", "화", "수", "목", "금", "토", "일"];

/// Characters Telegram MarkdownV2 requires to be escaped.
const MARKDOWN_SPECIAL: [char; 18] = [
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

const BRIEFING_TITLE: &str = "📰 오늘의 뉴스 브리핑";
const LINK_LABEL: &str = "원문 보기";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Plain,
    /// Telegram MarkdownV2.
    Markdown,
    Html,
}

impl Dialect {
    /// Unknown names fall back to plain text.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "markdown" | "markdownv2" | "md" => Dialect::Markdown,
            "html" => Dialect::Html,
            _ => Dialect::Plain,
        }
    }

    /// User-supplied text escaped for this dialect.
    pub fn escape(self, text: &str) -> String {
        match self {
            Dialect::Plain => text.to_string(),
            Dialect::Markdown => escape_markdown(text),
            Dialect::Html => escape_html(text),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FormatOptions {
    pub include_summary: bool,
    pub include_link: bool,
    pub dialect: Dialect,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            include_summary: true,
            include_link: true,
            dialect: Dialect::Plain,
        }
    }
}

pub fn category_info(category: &str) -> Option<(&'static str, &'static str)> {
    match category {
        "society" => Some(("📌", "사회")),
        "economy" => Some(("💰", "경제")),
        "politics" => Some(("🏛️", "정치")),
        "world" => Some(("🌍", "국제")),
        "culture" => Some(("🎭", "문화")),
        "tech" => Some(("💻", "IT/과학")),
        _ => None,
    }
}

pub fn source_info(source: &str) -> Option<(&'static str, &'static str)> {
    match source {
        "naver" => Some(("🟢", "네이버 뉴스")),
        "naver_search" => Some(("🟢", "네이버 뉴스 검색")),
        "google" => Some(("🔵", "구글 뉴스")),
        _ => None,
    }
}

pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if MARKDOWN_SPECIAL.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// `2025년 01월 06일` and `월` for the given date.
pub fn korean_date(date: NaiveDate) -> (String, &'static str) {
    let date_str = date.format("%Y년 %m월 %d일").to_string();
    let weekday = WEEKDAYS_KO[date.weekday().num_days_from_monday() as usize];
    (date_str, weekday)
}

#[derive(Debug, Clone, Default)]
pub struct Formatter {
    opts: FormatOptions,
    /// `None` uses the host's local time.
    offset: Option<FixedOffset>,
}

impl Formatter {
    pub fn new(opts: FormatOptions) -> Self {
        Self { opts, offset: None }
    }

    /// Date the header in `offset` instead of the host's timezone.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn options(&self) -> FormatOptions {
        self.opts
    }

    pub fn dialect(&self) -> Dialect {
        self.opts.dialect
    }

    pub fn offset(&self) -> Option<FixedOffset> {
        self.offset
    }

    /// Calendar date of `now` as seen in the formatter's timezone.
    pub fn date_of(&self, now: DateTime<Utc>) -> NaiveDate {
        match self.offset {
            Some(off) => now.with_timezone(&off).date_naive(),
            None => now.with_timezone(&Local).date_naive(),
        }
    }

    /// Render with today's date in the header.
    pub fn format(&self, news: &CategoryNews, source_name: Option<&str>) -> String {
        self.format_at(news, source_name, self.date_of(Utc::now()))
    }

    pub fn format_at(
        &self,
        news: &CategoryNews,
        source_name: Option<&str>,
        date: NaiveDate,
    ) -> String {
        let mut lines = self.header(source_name, date);

        for (category, items) in news {
            if items.is_empty() {
                continue;
            }
            self.push_category(&mut lines, category, items);
        }

        lines.join("\n")
    }

    fn header(&self, source_name: Option<&str>, date: NaiveDate) -> Vec<String> {
        let (date_str, weekday) = korean_date(date);
        let d = self.opts.dialect;

        let title = match source_name {
            Some(name) => {
                let (emoji, label) = match source_info(name) {
                    Some((e, l)) => (e, l.to_string()),
                    None => ("📰", d.escape(name)),
                };
                format!("{emoji} {label}")
            }
            None => BRIEFING_TITLE.to_string(),
        };

        let (title, date_line) = match d {
            Dialect::Plain => (title, format!("{date_str} ({weekday})")),
            Dialect::Markdown => {
                (format!("*{title}*"), format!("_{date_str} \\({weekday}\\)_"))
            }
            Dialect::Html => {
                (format!("<b>{title}</b>"), format!("<i>{date_str} ({weekday})</i>"))
            }
        };

        vec![title, date_line, String::new()]
    }

    fn push_category(&self, lines: &mut Vec<String>, category: &str, items: &[NewsItem]) {
        let d = self.opts.dialect;
        let (emoji, label) = match category_info(category) {
            Some((e, l)) => (e, l.to_string()),
            None => ("📋", d.escape(category)),
        };

        match d {
            Dialect::Plain => {
                lines.push(format!("{emoji} {label}"));
                lines.push("─".repeat(20));
            }
            Dialect::Markdown => {
                lines.push(format!("*{emoji} {label}*"));
                lines.push(String::new());
            }
            Dialect::Html => {
                lines.push(format!("<b>{emoji} {label}</b>"));
                lines.push(String::new());
            }
        }

        for (i, item) in items.iter().enumerate() {
            self.push_item(lines, i + 1, item);
        }
        lines.push(String::new());
    }

    fn push_item(&self, lines: &mut Vec<String>, n: usize, item: &NewsItem) {
        let d = self.opts.dialect;
        let title = d.escape(&item.title);
        match d {
            Dialect::Markdown => lines.push(format!("{n}\\. {title}")),
            Dialect::Plain | Dialect::Html => lines.push(format!("{n}. {title}")),
        }

        if self.opts.include_summary {
            if let Some(summary) = item.summary_text() {
                let truncated = summary.chars().count() > SUMMARY_EXCERPT_CHARS;
                let excerpt: String = summary.chars().take(SUMMARY_EXCERPT_CHARS).collect();
                let mut excerpt = d.escape(&excerpt);
                lines.push(match d {
                    Dialect::Plain => {
                        if truncated {
                            excerpt.push_str("...");
                        }
                        format!("   {excerpt}")
                    }
                    Dialect::Markdown => {
                        if truncated {
                            excerpt.push_str("\\.\\.\\.");
                        }
                        format!("   _{excerpt}_")
                    }
                    Dialect::Html => {
                        if truncated {
                            excerpt.push_str("...");
                        }
                        format!("   <i>{excerpt}</i>")
                    }
                });
            }
        }

        if self.opts.include_link {
            let link = &item.link;
            lines.push(match d {
                Dialect::Plain => format!("   🔗 {link}"),
                Dialect::Markdown => format!("   [{LINK_LABEL}]({link})"),
                Dialect::Html => format!("   <a href=\"{link}\">{LINK_LABEL}</a>"),
            });
        }

        lines.push(String::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        // a Monday
        NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
    }

    fn formatter(dialect: Dialect) -> Formatter {
        Formatter::new(FormatOptions {
            dialect,
            ..FormatOptions::default()
        })
    }

    fn one(category: &str, item: NewsItem) -> CategoryNews {
        vec![(category.to_string(), vec![item])]
    }

    #[test]
    fn korean_date_is_zero_padded_with_weekday() {
        assert_eq!(korean_date(date()), ("2025년 01월 06일".to_string(), "월"));
        let sunday = NaiveDate::from_ymd_opt(2025, 1, 12).unwrap();
        assert_eq!(korean_date(sunday).1, "일");
    }

    #[test]
    fn plain_layout_is_exact() {
        let news = one(
            "society",
            NewsItem::new("사회 뉴스 1", "https://example.com/1", "society", "naver")
                .with_summary("사회 뉴스 요약입니다."),
        );
        let out = formatter(Dialect::Plain).format_at(&news, None, date());
        let expected = [
            "📰 오늘의 뉴스 브리핑",
            "2025년 01월 06일 (월)",
            "",
            "📌 사회",
            "────────────────────",
            "1. 사회 뉴스 1",
            "   사회 뉴스 요약입니다.",
            "   🔗 https://example.com/1",
            "",
            "",
        ]
        .join("\n");
        assert_eq!(out, expected);
    }

    #[test]
    fn source_header_uses_lookup_then_fallback() {
        let news = CategoryNews::new();
        let f = formatter(Dialect::Plain);
        assert!(f.format_at(&news, Some("naver"), date()).starts_with("🟢 네이버 뉴스\n"));
        assert!(f.format_at(&news, Some("google"), date()).starts_with("🔵 구글 뉴스\n"));
        assert!(f
            .format_at(&news, Some("naver_search"), date())
            .starts_with("🟢 네이버 뉴스 검색\n"));
        assert!(f.format_at(&news, Some("daum"), date()).starts_with("📰 daum\n"));
    }

    #[test]
    fn empty_categories_are_skipped() {
        let news: CategoryNews = vec![
            ("economy".to_string(), vec![]),
            (
                "tech".to_string(),
                vec![NewsItem::new("AI 뉴스", "https://t/1", "tech", "google")],
            ),
        ];
        let out = formatter(Dialect::Plain).format_at(&news, None, date());
        assert!(!out.contains("경제"));
        assert!(out.contains("💻 IT/과학"));
    }

    #[test]
    fn unknown_category_gets_generic_heading() {
        let news = one("sports", NewsItem::new("경기 결과", "https://s/1", "sports", "naver"));
        let out = formatter(Dialect::Plain).format_at(&news, None, date());
        assert!(out.contains("📋 sports\n"));
    }

    #[test]
    fn long_summary_is_cut_at_80_chars() {
        let long: String = "가".repeat(100);
        let news = one(
            "world",
            NewsItem::new("t", "https://w/1", "world", "google").with_summary(long),
        );
        let out = formatter(Dialect::Plain).format_at(&news, None, date());
        let expected = format!("   {}...", "가".repeat(80));
        assert!(out.lines().any(|l| l == expected));

        let exact: String = "나".repeat(80);
        let news = one(
            "world",
            NewsItem::new("t", "https://w/1", "world", "google").with_summary(exact.clone()),
        );
        let out = formatter(Dialect::Plain).format_at(&news, None, date());
        assert!(out.lines().any(|l| l == format!("   {exact}")));
    }

    #[test]
    fn summary_and_link_can_be_disabled() {
        let news = one(
            "society",
            NewsItem::new("사회 뉴스 1", "https://example.com/1", "society", "naver")
                .with_summary("사회 뉴스 요약입니다."),
        );
        let f = Formatter::new(FormatOptions {
            include_summary: false,
            include_link: false,
            dialect: Dialect::Plain,
        });
        let out = f.format_at(&news, None, date());
        assert!(out.contains("사회 뉴스 1"));
        assert!(!out.contains("사회 뉴스 요약"));
        assert!(!out.contains("https://example.com"));
    }

    #[test]
    fn markdown_escapes_user_text_once() {
        let news = one(
            "society",
            NewsItem::new("속보. 대박!", "https://a.com/x_(1)", "society", "naver"),
        );
        let out = formatter(Dialect::Markdown).format_at(&news, None, date());
        assert!(out.contains("1\\. 속보\\. 대박\\!"));
        assert!(!out.contains("\\\\."));
        // link url stays untouched
        assert!(out.contains("[원문 보기](https://a.com/x_(1))"));
        assert!(out.starts_with("*📰 오늘의 뉴스 브리핑*\n_2025년 01월 06일 \\(월\\)_\n"));
    }

    #[test]
    fn markdown_escapes_all_special_characters() {
        let all = "_*[]()~`>#+-=|{}.!";
        let escaped = escape_markdown(all);
        assert_eq!(escaped.chars().filter(|c| *c == '\\').count(), 18);
        assert_eq!(escape_markdown("가나다 abc"), "가나다 abc");
    }

    #[test]
    fn markdown_truncation_marker_is_escaped() {
        let news = one(
            "tech",
            NewsItem::new("t", "https://t/1", "tech", "g").with_summary("a".repeat(81)),
        );
        let out = formatter(Dialect::Markdown).format_at(&news, None, date());
        assert!(out.contains(&format!("   _{}\\.\\.\\._", "a".repeat(80))));
    }

    #[test]
    fn html_escapes_ampersand_first() {
        assert_eq!(escape_html("a & <b> &lt;"), "a &amp; &lt;b&gt; &amp;lt;");
        let news = one(
            "economy",
            NewsItem::new("R&D <투자>", "https://e.com/?a=1&b=2", "economy", "google")
                .with_summary("<요약> & 전망"),
        );
        let out = formatter(Dialect::Html).format_at(&news, None, date());
        assert!(out.contains("1. R&amp;D &lt;투자&gt;"));
        assert!(out.contains("   <i>&lt;요약&gt; &amp; 전망</i>"));
        assert!(out.contains("<a href=\"https://e.com/?a=1&b=2\">원문 보기</a>"));
        assert!(out.starts_with("<b>📰 오늘의 뉴스 브리핑</b>\n<i>2025년 01월 06일 (월)</i>\n"));
    }

    #[test]
    fn formatting_is_idempotent() {
        let news = one(
            "culture",
            NewsItem::new("전시 개막", "https://c/1", "culture", "naver").with_summary("요약"),
        );
        for d in [Dialect::Plain, Dialect::Markdown, Dialect::Html] {
            let f = formatter(d);
            let first = f.format_at(&news, Some("naver"), date());
            assert_eq!(first, f.format_at(&news, Some("naver"), date()));
        }
    }

    #[test]
    fn dialect_names_parse_with_plain_fallback() {
        assert_eq!(Dialect::from_name("markdown"), Dialect::Markdown);
        assert_eq!(Dialect::from_name("HTML"), Dialect::Html);
        assert_eq!(Dialect::from_name("plain"), Dialect::Plain);
        assert_eq!(Dialect::from_name("rtf"), Dialect::Plain);
    }

    #[test]
    fn header_date_follows_configured_offset() {
        use chrono::TimeZone;
        // 22:30 UTC on Sunday is already Monday morning in Seoul
        let now = Utc.with_ymd_and_hms(2025, 1, 5, 22, 30, 0).unwrap();
        let seoul = FixedOffset::east_opt(9 * 3600).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();

        assert_eq!(formatter(Dialect::Plain).with_offset(seoul).date_of(now), date());
        assert_eq!(
            formatter(Dialect::Plain).with_offset(utc).date_of(now),
            NaiveDate::from_ymd_opt(2025, 1, 5).unwrap()
        );
    }
}

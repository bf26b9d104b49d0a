// src/scheduler.rs
//! Daily briefing scheduler: cron-style hour list, fixed minute and zone.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, Offset, TimeZone, Utc};
use metrics::{counter, gauge};
use std::future::Future;
use tracing::{error, info, warn};

use crate::config::ScheduleConfig;

// Zones served without a tz database; none of these observe DST.
const ZONE_OFFSETS: &[(&str, i32)] = &[
    ("UTC", 0),
    ("Etc/UTC", 0),
    ("Asia/Seoul", 9 * 3600),
    ("Asia/Tokyo", 9 * 3600),
    ("Asia/Shanghai", 8 * 3600),
    ("Asia/Singapore", 8 * 3600),
    ("Asia/Kolkata", 5 * 3600 + 1800),
];

fn parse_hour(s: &str) -> Result<u32> {
    let h: u32 = s
        .trim()
        .parse()
        .with_context(|| format!("hour `{s}` is not a number"))?;
    if h > 23 {
        bail!("hour {h} out of range 0-23");
    }
    Ok(h)
}

/// Parse `*`, `7`, `7-22`, `7,12,18` (and mixes like `6-8,18`) into sorted,
/// distinct hours.
pub fn parse_hour_expr(expr: &str) -> Result<Vec<u32>> {
    let expr = expr.trim();
    if expr == "*" {
        return Ok((0..24).collect());
    }
    if expr.is_empty() {
        bail!("empty hour expression");
    }

    let mut hours = Vec::new();
    for part in expr.split(',') {
        match part.split_once('-') {
            Some((a, b)) => {
                let (start, end) = (parse_hour(a)?, parse_hour(b)?);
                if start > end {
                    bail!("hour range `{part}` is reversed");
                }
                hours.extend(start..=end);
            }
            None => hours.push(parse_hour(part)?),
        }
    }
    hours.sort_unstable();
    hours.dedup();
    Ok(hours)
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let (h, m) = rest.split_once(':').unwrap_or((rest, "0"));
    let h: i32 = h.parse().ok()?;
    let m: i32 = m.parse().ok()?;
    if h > 14 || m > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (h * 3600 + m * 60))
}

/// Resolve a zone name or `+HH:MM` offset. Unknown names fall back to UTC.
pub fn parse_timezone(name: &str) -> FixedOffset {
    let name = name.trim();
    if let Some(&(_, secs)) = ZONE_OFFSETS.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
        if let Some(off) = FixedOffset::east_opt(secs) {
            return off;
        }
    }
    if let Some(off) = parse_offset(name) {
        return off;
    }
    warn!(timezone = name, "unknown timezone; using UTC");
    Utc.fix()
}

/// First instant strictly after `now` whose local time in `tz` is one of
/// `hours` at `minute`.
pub fn next_run(
    now: DateTime<Utc>,
    hours: &[u32],
    minute: u32,
    tz: FixedOffset,
) -> Option<DateTime<Utc>> {
    let local_today = now.with_timezone(&tz).date_naive();
    for day in 0..2 {
        let date = local_today + ChronoDuration::days(day);
        for &h in hours {
            let Some(naive) = date.and_hms_opt(h, minute, 0) else {
                continue;
            };
            let Some(at) = tz.from_local_datetime(&naive).single() else {
                continue;
            };
            let at = at.with_timezone(&Utc);
            if at > now {
                return Some(at);
            }
        }
    }
    None
}

/// Resolves on SIGINT or (on unix) SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = ?e, "ctrl-c handler failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let term = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                error!(error = ?e, "SIGTERM handler failed");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let term = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received"),
        _ = term => info!("SIGTERM received"),
    }
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    hours: Vec<u32>,
    minute: u32,
    tz: FixedOffset,
    tz_name: String,
}

impl Scheduler {
    pub fn new(cfg: &ScheduleConfig) -> Result<Self> {
        let hours = parse_hour_expr(&cfg.hour).context("schedule.hour")?;
        if cfg.minute > 59 {
            bail!("schedule.minute {} out of range 0-59", cfg.minute);
        }
        Ok(Self {
            hours,
            minute: cfg.minute,
            tz: parse_timezone(&cfg.timezone),
            tz_name: cfg.timezone.clone(),
        })
    }

    pub fn hours(&self) -> &[u32] {
        &self.hours
    }

    pub fn offset(&self) -> FixedOffset {
        self.tz
    }

    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        next_run(now, &self.hours, self.minute, self.tz)
    }

    /// Run `job` at every scheduled time until `shutdown` resolves.
    /// One job runs at a time; a tick missed while a job runs is skipped.
    pub async fn run_until<F, Fut, S>(&self, mut job: F, shutdown: S) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(
            hours = ?self.hours,
            minute = self.minute,
            timezone = %self.tz_name,
            "scheduler started"
        );

        loop {
            let now = Utc::now();
            let Some(next) = self.next_after(now) else {
                bail!("no future run time could be computed");
            };
            gauge!("scheduler_next_run_ts").set(next.timestamp() as f64);
            info!(next_run = %next.with_timezone(&self.tz), "waiting for next run");

            let wait = (next - now).to_std().unwrap_or_default();
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = &mut shutdown => {
                    info!("scheduler stopping");
                    return Ok(());
                }
            }

            info!("scheduled job starting");
            counter!("scheduler_runs_total").increment(1);
            if job().await {
                info!("scheduled job finished");
            } else {
                counter!("scheduler_run_failures_total").increment(1);
                error!("scheduled job failed");
            }
        }
    }

    pub async fn run_forever<F, Fut>(&self, job: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        self.run_until(job, shutdown_signal()).await
    }
}

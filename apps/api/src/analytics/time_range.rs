//! Symbolic time-range resolution.
//!
//! Upstream callers pass one of two token families: calendar tokens
//! (`today`, `lastQuarter`, ...) and duration tokens (`7d`, `24h`, ...).
//! Every time-windowed computation resolves through this module so that
//! "current" vs "previous period" comparisons share identical boundaries.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

/// Display bucket width for grouping snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    Day,
    Week,
    Month,
}

impl Granularity {
    /// Bucket width for a range token, `None` for unrecognized tokens.
    pub fn for_token(token: &str) -> Option<Granularity> {
        match token {
            "1h" | "6h" | "12h" | "24h" | "today" | "yesterday" => Some(Granularity::Hour),
            "7d" | "thisWeek" | "lastWeek" | "thisMonth" | "lastMonth" => Some(Granularity::Day),
            "30d" | "90d" | "thisQuarter" | "lastQuarter" => Some(Granularity::Week),
            "180d" | "365d" | "halfYear" | "lastHalfYear" | "thisYear" | "lastYear" | "all" => {
                Some(Granularity::Month)
            }
            _ => None,
        }
    }

    /// Chronological bucket label for a timestamp at this granularity.
    pub fn label(&self, t: DateTime<Utc>) -> String {
        match self {
            Granularity::Hour => t.format("%Y-%m-%d %H:00").to_string(),
            Granularity::Day => t.format("%Y-%m-%d").to_string(),
            Granularity::Week => format!("{}-W{:02}", t.iso_week().year(), t.iso_week().week()),
            Granularity::Month => t.format("%Y-%m").to_string(),
        }
    }
}

/// An absolute `[start, end]` interval resolved from a symbolic token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Resolves a token against the current clock.
    pub fn resolve(token: &str) -> Option<TimeRange> {
        Self::resolve_at(token, Utc::now())
    }

    /// Pure resolution against an explicit `now` (the testable entry point).
    ///
    /// Closed calendar periods (`yesterday`, `lastWeek`, ...) end 1ms before
    /// the following period starts; open periods and duration tokens end at
    /// `now`. `all` starts at the Unix epoch.
    pub fn resolve_at(token: &str, now: DateTime<Utc>) -> Option<TimeRange> {
        let today = day_start(now);

        let range = match token {
            "today" => TimeRange { start: today, end: now },
            "yesterday" => TimeRange {
                start: today - Duration::days(1),
                end: today - Duration::milliseconds(1),
            },
            "thisWeek" => TimeRange { start: week_start(now), end: now },
            "lastWeek" => {
                let this_week = week_start(now);
                TimeRange {
                    start: this_week - Duration::days(7),
                    end: this_week - Duration::milliseconds(1),
                }
            }
            "thisMonth" => TimeRange {
                start: month_start(now.year(), now.month()),
                end: now,
            },
            "lastMonth" => {
                let this_month = month_start(now.year(), now.month());
                let (y, m) = previous_month(now.year(), now.month());
                TimeRange {
                    start: month_start(y, m),
                    end: this_month - Duration::milliseconds(1),
                }
            }
            "thisQuarter" => TimeRange {
                start: month_start(now.year(), quarter_first_month(now.month())),
                end: now,
            },
            "lastQuarter" => {
                let this_quarter = month_start(now.year(), quarter_first_month(now.month()));
                let start = if quarter_first_month(now.month()) == 1 {
                    month_start(now.year() - 1, 10)
                } else {
                    month_start(now.year(), quarter_first_month(now.month()) - 3)
                };
                TimeRange {
                    start,
                    end: this_quarter - Duration::milliseconds(1),
                }
            }
            "halfYear" => TimeRange {
                start: month_start(now.year(), half_year_first_month(now.month())),
                end: now,
            },
            "lastHalfYear" => {
                let this_half = month_start(now.year(), half_year_first_month(now.month()));
                let start = if half_year_first_month(now.month()) == 1 {
                    month_start(now.year() - 1, 7)
                } else {
                    month_start(now.year(), 1)
                };
                TimeRange {
                    start,
                    end: this_half - Duration::milliseconds(1),
                }
            }
            "thisYear" => TimeRange { start: month_start(now.year(), 1), end: now },
            "lastYear" => TimeRange {
                start: month_start(now.year() - 1, 1),
                end: month_start(now.year(), 1) - Duration::milliseconds(1),
            },
            "all" => TimeRange { start: DateTime::<Utc>::UNIX_EPOCH, end: now },
            _ => TimeRange {
                start: now - duration_for(token)?,
                end: now,
            },
        };

        Some(range)
    }
}

/// Fixed duration-token table. Anything else is unrecognized.
fn duration_for(token: &str) -> Option<Duration> {
    match token {
        "1h" => Some(Duration::hours(1)),
        "6h" => Some(Duration::hours(6)),
        "12h" => Some(Duration::hours(12)),
        "24h" => Some(Duration::hours(24)),
        "7d" => Some(Duration::days(7)),
        "30d" => Some(Duration::days(30)),
        "90d" => Some(Duration::days(90)),
        "180d" => Some(Duration::days(180)),
        "365d" => Some(Duration::days(365)),
        _ => None,
    }
}

fn day_start(t: DateTime<Utc>) -> DateTime<Utc> {
    t.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Monday 00:00 of the week containing `t`.
fn week_start(t: DateTime<Utc>) -> DateTime<Utc> {
    let days = t.weekday().num_days_from_monday() as i64;
    day_start(t) - Duration::days(days)
}

fn month_start(year: i32, month: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN)
        .and_utc()
}

fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

fn quarter_first_month(month: u32) -> u32 {
    ((month - 1) / 3) * 3 + 1
}

fn half_year_first_month(month: u32) -> u32 {
    if month <= 6 {
        1
    } else {
        7
    }
}

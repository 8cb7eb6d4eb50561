//! Trend and propagation analytics over snapshot histories.
//!
//! Everything here is a pure transform: same input, byte-identical output.
//! Snapshot ordering is carried by the series wrappers, so the one place
//! data gets reversed is the `into_chronological` call at the top of each
//! function that receives a newest-first history.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analytics::time_range::Granularity;
use crate::models::event::Event;
use crate::models::series::{ChronologicalSeries, RecencySeries};

/// Hotness delta beyond which movement counts as a trend rather than noise.
const TREND_DELTA_THRESHOLD: f64 = 5.0;

/// Fixed user-type decomposition of an event's audience:
/// (label, share of users, share of posts, influence score).
/// Each ratio column sums to exactly 1.0.
const PROPAGATION_BUCKETS: [(&str, f64, f64, u32); 4] = [
    ("leader", 0.05, 0.15, 95),
    ("active", 0.15, 0.35, 75),
    ("normal", 0.50, 0.40, 45),
    ("observer", 0.30, 0.10, 20),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

/// Classifies a hotness delta. Movement within ±5 is noise, not a trend.
pub fn classify_trend(delta: f64) -> TrendDirection {
    if delta > TREND_DELTA_THRESHOLD {
        TrendDirection::Up
    } else if delta < -TREND_DELTA_THRESHOLD {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    }
}

/// Cross-event trend series bucketed at a display granularity.
/// All five arrays are aligned and chronologically ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub categories: Vec<String>,
    pub events: Vec<i64>,
    pub posts: Vec<i64>,
    pub users: Vec<i64>,
    pub hotness: Vec<i64>,
}

/// Buckets all events' snapshots into time buckets, producing aligned series
/// of distinct-event count, post count, user count, and rounded average
/// hotness. The input is already ascending (this is the one computation fed
/// by an ascending query), so equal-label snapshots are contiguous.
pub fn build_trend_series(snapshots: &ChronologicalSeries, granularity: Granularity) -> TrendSeries {
    let mut series = TrendSeries {
        categories: Vec::new(),
        events: Vec::new(),
        posts: Vec::new(),
        users: Vec::new(),
        hotness: Vec::new(),
    };

    let mut bucket_events: HashSet<Uuid> = HashSet::new();
    let mut bucket_posts = 0i64;
    let mut bucket_users = 0i64;
    let mut bucket_hotness = 0.0f64;
    let mut bucket_samples = 0usize;

    let mut flush = |series: &mut TrendSeries,
                     events: &mut HashSet<Uuid>,
                     posts: &mut i64,
                     users: &mut i64,
                     hotness: &mut f64,
                     samples: &mut usize| {
        series.events.push(events.len() as i64);
        series.posts.push(*posts);
        series.users.push(*users);
        series.hotness.push((*hotness / *samples as f64).round() as i64);
        events.clear();
        *posts = 0;
        *users = 0;
        *hotness = 0.0;
        *samples = 0;
    };

    for snapshot in snapshots.iter() {
        let label = granularity.label(snapshot.snapshot_at);
        if series.categories.last() != Some(&label) {
            if bucket_samples > 0 {
                flush(
                    &mut series,
                    &mut bucket_events,
                    &mut bucket_posts,
                    &mut bucket_users,
                    &mut bucket_hotness,
                    &mut bucket_samples,
                );
            }
            series.categories.push(label);
        }
        bucket_events.insert(snapshot.event_id);
        bucket_posts += snapshot.post_count;
        bucket_users += snapshot.user_count;
        bucket_hotness += snapshot.hotness;
        bucket_samples += 1;
    }
    if bucket_samples > 0 {
        flush(
            &mut series,
            &mut bucket_events,
            &mut bucket_posts,
            &mut bucket_users,
            &mut bucket_hotness,
            &mut bucket_samples,
        );
    }

    series
}

/// Per-event time series: five aligned arrays plus chronological labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTimeSeries {
    pub categories: Vec<String>,
    pub posts: Vec<i64>,
    pub users: Vec<i64>,
    pub positive: Vec<f64>,
    pub negative: Vec<f64>,
    pub neutral: Vec<f64>,
}

/// Emits the per-event series in chronological order. Every output array has
/// exactly `stats.len()` entries.
pub fn event_time_series(stats: RecencySeries, granularity: Granularity) -> EventTimeSeries {
    let chronological = stats.into_chronological();
    let mut series = EventTimeSeries {
        categories: Vec::with_capacity(chronological.len()),
        posts: Vec::with_capacity(chronological.len()),
        users: Vec::with_capacity(chronological.len()),
        positive: Vec::with_capacity(chronological.len()),
        negative: Vec::with_capacity(chronological.len()),
        neutral: Vec::with_capacity(chronological.len()),
    };

    for snapshot in chronological.iter() {
        series.categories.push(granularity.label(snapshot.snapshot_at));
        series.posts.push(snapshot.post_count);
        series.users.push(snapshot.user_count);
        series.positive.push(snapshot.sentiment_positive);
        series.negative.push(snapshot.sentiment_negative);
        series.neutral.push(snapshot.sentiment_neutral);
    }

    series
}

/// Trend-analysis scores derived from one event's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTrendAnalysis {
    pub timeline: Vec<String>,
    pub post_volume: Vec<i64>,
    pub sentiment_scores: Vec<i64>,
    pub user_engagement: Vec<i64>,
    pub hotness_data: Vec<i64>,
}

/// Per chronological snapshot: a sentiment score mapping the signed
/// positive-negative difference onto [0,100], and a hotness blend weighting
/// post volume (0.6) over user count (0.4).
pub fn event_trends(stats: RecencySeries, granularity: Granularity) -> EventTrendAnalysis {
    let chronological = stats.into_chronological();
    let mut analysis = EventTrendAnalysis {
        timeline: Vec::with_capacity(chronological.len()),
        post_volume: Vec::with_capacity(chronological.len()),
        sentiment_scores: Vec::with_capacity(chronological.len()),
        user_engagement: Vec::with_capacity(chronological.len()),
        hotness_data: Vec::with_capacity(chronological.len()),
    };

    for snapshot in chronological.iter() {
        analysis.timeline.push(granularity.label(snapshot.snapshot_at));
        analysis.post_volume.push(snapshot.post_count);
        analysis
            .sentiment_scores
            .push(((snapshot.sentiment_positive - snapshot.sentiment_negative) * 50.0 + 50.0).round() as i64);
        analysis.user_engagement.push(snapshot.user_count);
        analysis
            .hotness_data
            .push((snapshot.post_count as f64 * 0.6 + snapshot.user_count as f64 * 0.4).round() as i64);
    }

    analysis
}

/// One influence-tier bucket of the modeled audience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagationPathEntry {
    pub user_type: String,
    pub user_count: i64,
    pub post_count: i64,
    pub influence: u32,
}

/// Deterministic decomposition of the audience across the four fixed
/// user-type buckets. Same headline hotness, same path.
pub fn propagation_path(event: &Event) -> Vec<PropagationPathEntry> {
    let base_count = event.hotness * 10.0;
    PROPAGATION_BUCKETS
        .iter()
        .map(|&(user_type, user_ratio, post_ratio, influence)| PropagationPathEntry {
            user_type: user_type.to_string(),
            user_count: (base_count * user_ratio).floor() as i64,
            post_count: (base_count * post_ratio).floor() as i64,
            influence,
        })
        .collect()
}

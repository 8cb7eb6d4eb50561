use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Sentiment breakdown attached to an event or a snapshot.
/// All three components are non-negative (counts or normalized shares).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

impl SentimentScore {
    /// Positive share of the total, 0.5 when the breakdown is empty.
    pub fn positive_share(&self) -> f64 {
        let total = self.positive + self.negative + self.neutral;
        if total > 0.0 {
            self.positive / total
        } else {
            0.5
        }
    }
}

/// A tracked public-opinion event. Immutable input for the duration of one
/// request; ownership lives in the data store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    /// "active" | "archived"
    pub status: String,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Headline popularity score, clamped to [0,100] by the writer.
    pub hotness: f64,
    pub sentiment_positive: f64,
    pub sentiment_negative: f64,
    pub sentiment_neutral: f64,
}

impl Event {
    pub fn sentiment(&self) -> SentimentScore {
        SentimentScore {
            positive: self.sentiment_positive,
            negative: self.sentiment_negative,
            neutral: self.sentiment_neutral,
        }
    }
}

/// One point-in-time measurement of an event's statistics.
/// Histories never contain two rows with the same `snapshot_at` per event.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventStatisticsSnapshot {
    pub event_id: Uuid,
    pub snapshot_at: DateTime<Utc>,
    pub post_count: i64,
    pub user_count: i64,
    pub sentiment_positive: f64,
    pub sentiment_negative: f64,
    pub sentiment_neutral: f64,
    /// Per-snapshot hotness, clamped to [0,100] by the writer.
    pub hotness: f64,
}

impl EventStatisticsSnapshot {
    pub fn sentiment(&self) -> SentimentScore {
        SentimentScore {
            positive: self.sentiment_positive,
            negative: self.sentiment_negative,
            neutral: self.sentiment_neutral,
        }
    }
}

//! Ordering-tagged snapshot sequences.
//!
//! Snapshot histories arrive from the store either newest-first
//! (`snapshot_at DESC`, the common case) or oldest-first. Which one a given
//! computation expects used to be a caller convention; these wrappers make it
//! a property of the type, so a reversal can only happen through an explicit
//! conversion at the boundary.

use crate::models::event::EventStatisticsSnapshot;

/// Snapshots ordered newest-first (`snapshot_at DESC`). Index 0 is the most
/// recent sample.
#[derive(Debug, Clone, Default)]
pub struct RecencySeries(Vec<EventStatisticsSnapshot>);

/// Snapshots ordered oldest-first. Index 0 is the earliest sample.
#[derive(Debug, Clone, Default)]
pub struct ChronologicalSeries(Vec<EventStatisticsSnapshot>);

impl RecencySeries {
    /// Wraps a vector already sorted newest-first, as returned by a
    /// `snapshot_at DESC` query. The caller vouches for the order.
    pub fn from_descending(snapshots: Vec<EventStatisticsSnapshot>) -> Self {
        Self(snapshots)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Most recent sample, if any.
    pub fn latest(&self) -> Option<&EventStatisticsSnapshot> {
        self.0.first()
    }

    /// Earliest sample, if any.
    pub fn oldest(&self) -> Option<&EventStatisticsSnapshot> {
        self.0.last()
    }

    pub fn get(&self, index: usize) -> Option<&EventStatisticsSnapshot> {
        self.0.get(index)
    }

    /// Newest-first view of the underlying snapshots.
    pub fn as_slice(&self) -> &[EventStatisticsSnapshot] {
        &self.0
    }

    /// The one sanctioned reversal point.
    pub fn into_chronological(self) -> ChronologicalSeries {
        let mut snapshots = self.0;
        snapshots.reverse();
        ChronologicalSeries(snapshots)
    }

    pub fn to_chronological(&self) -> ChronologicalSeries {
        self.clone().into_chronological()
    }
}

impl ChronologicalSeries {
    /// Wraps a vector already sorted oldest-first, as returned by a
    /// `snapshot_at ASC` query.
    pub fn from_ascending(snapshots: Vec<EventStatisticsSnapshot>) -> Self {
        Self(snapshots)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[EventStatisticsSnapshot] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EventStatisticsSnapshot> {
        self.0.iter()
    }

    /// The sanctioned reversal in the other direction, for computations that
    /// consume newest-first data.
    pub fn into_recency(self) -> RecencySeries {
        let mut snapshots = self.0;
        snapshots.reverse();
        RecencySeries(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn snapshot(hours_ago: i64, hotness: f64) -> EventStatisticsSnapshot {
        EventStatisticsSnapshot {
            event_id: Uuid::nil(),
            snapshot_at: Utc::now() - Duration::hours(hours_ago),
            post_count: 10,
            user_count: 5,
            sentiment_positive: 0.5,
            sentiment_negative: 0.2,
            sentiment_neutral: 0.3,
            hotness,
        }
    }

    #[test]
    fn test_latest_and_oldest_on_descending_input() {
        let series =
            RecencySeries::from_descending(vec![snapshot(1, 90.0), snapshot(2, 60.0), snapshot(3, 30.0)]);
        assert_eq!(series.latest().unwrap().hotness, 90.0);
        assert_eq!(series.oldest().unwrap().hotness, 30.0);
    }

    #[test]
    fn test_into_chronological_reverses() {
        let series =
            RecencySeries::from_descending(vec![snapshot(1, 90.0), snapshot(2, 60.0), snapshot(3, 30.0)]);
        let chrono = series.into_chronological();
        let hotness: Vec<f64> = chrono.iter().map(|s| s.hotness).collect();
        assert_eq!(hotness, vec![30.0, 60.0, 90.0]);
        // timestamps ascend
        let times: Vec<_> = chrono.iter().map(|s| s.snapshot_at).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_into_recency_reverses_back() {
        let series =
            RecencySeries::from_descending(vec![snapshot(1, 90.0), snapshot(2, 60.0), snapshot(3, 30.0)]);
        let round_trip = series.clone().into_chronological().into_recency();
        let hotness: Vec<f64> = round_trip.as_slice().iter().map(|s| s.hotness).collect();
        assert_eq!(hotness, vec![90.0, 60.0, 30.0]);
    }

    #[test]
    fn test_empty_series() {
        let series = RecencySeries::from_descending(vec![]);
        assert!(series.is_empty());
        assert!(series.latest().is_none());
        assert!(series.oldest().is_none());
        assert!(series.into_chronological().is_empty());
    }
}

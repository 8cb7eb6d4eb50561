//! Data-store boundary.
//!
//! The analytics core never talks SQL; it consumes this trait. `postgres`
//! holds the only implementation. Ordering is part of each method's type:
//! range queries return newest-first (`RecencySeries`), full-history and
//! cross-event queries return oldest-first (`ChronologicalSeries`).

pub mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analytics::time_range::TimeRange;
use crate::errors::AppError;
use crate::models::event::{Event, EventStatisticsSnapshot};
use crate::models::series::{ChronologicalSeries, RecencySeries};

/// Optional event-list filters. `None` means "any".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilters {
    pub category: Option<String>,
    pub status: Option<String>,
}

/// Per-category aggregate over a time range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStat {
    pub category: String,
    pub event_count: i64,
    pub avg_hotness: f64,
}

/// A ranked participant with a derived influence score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluenceUser {
    pub user_name: String,
    pub interactions: i64,
    pub followers: i64,
    pub post_count: i64,
    pub influence: u32,
}

/// Per-region distribution entry. `is_estimated` marks sentiment values that
/// were synthesized because no real aggregate existed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeographicEntry {
    pub region: String,
    pub post_count: i64,
    pub sentiment: f64,
    pub is_estimated: bool,
}

/// Read-side access to events and their snapshot histories.
#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn get_event_by_id(&self, id: Uuid) -> Result<Option<Event>, AppError>;

    /// Most recent snapshot regardless of any window. Feeds the detail
    /// payload, which must show the freshest sample even for stale events.
    async fn get_latest_statistics(
        &self,
        event_id: Uuid,
    ) -> Result<Option<EventStatisticsSnapshot>, AppError>;

    /// Snapshots within `range`, newest first.
    async fn get_statistics_in_range(
        &self,
        event_id: Uuid,
        range: &TimeRange,
    ) -> Result<RecencySeries, AppError>;

    /// The full history for one event, oldest first. Feeds the lifecycle
    /// timeline, whose phase segmentation spans the whole life of the event.
    async fn get_all_statistics(&self, event_id: Uuid) -> Result<ChronologicalSeries, AppError>;

    /// All events' snapshots within `range`, oldest first. Feeds the
    /// cross-event trend series, the one computation that consumes ascending
    /// data directly.
    async fn get_snapshots_in_range(
        &self,
        range: &TimeRange,
    ) -> Result<ChronologicalSeries, AppError>;

    async fn get_event_list(
        &self,
        range: &TimeRange,
        filters: &EventFilters,
    ) -> Result<Vec<Event>, AppError>;

    async fn get_hot_events(&self, limit: i64) -> Result<Vec<Event>, AppError>;

    async fn get_category_stats(&self, range: &TimeRange) -> Result<Vec<CategoryStat>, AppError>;

    /// Participants ranked by derived influence score.
    async fn get_influence_users(&self, event_id: Uuid) -> Result<Vec<InfluenceUser>, AppError>;

    /// Regional distribution with measured-or-estimated sentiment.
    async fn get_geographic_distribution(
        &self,
        event_id: Uuid,
    ) -> Result<Vec<GeographicEntry>, AppError>;
}

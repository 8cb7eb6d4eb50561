//! Postgres-backed `DataProvider`.
//!
//! Thin SQL composition; every derived number (influence weighting,
//! sentiment fallback) comes from `analytics::influence` so the formulas stay
//! testable without a database.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::analytics::influence::{geographic_sentiment, influence_score};
use crate::analytics::time_range::TimeRange;
use crate::errors::AppError;
use crate::models::event::{Event, EventStatisticsSnapshot};
use crate::models::series::{ChronologicalSeries, RecencySeries};
use crate::provider::{CategoryStat, DataProvider, EventFilters, GeographicEntry, InfluenceUser};

pub struct PgDataProvider {
    pool: PgPool,
}

impl PgDataProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool and wraps it.
    pub async fn connect(database_url: &str) -> Result<Self> {
        info!("Connecting to PostgreSQL...");
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        info!("PostgreSQL connection pool established");
        Ok(Self::new(pool))
    }
}

#[derive(FromRow)]
struct CategoryStatRow {
    category: String,
    event_count: i64,
    avg_hotness: Option<f64>,
}

#[derive(FromRow)]
struct ParticipantRow {
    user_name: String,
    interactions: i64,
    followers: i64,
    post_count: i64,
}

#[derive(FromRow)]
struct RegionRow {
    region: String,
    post_count: i64,
    sentiment: Option<f64>,
}

#[async_trait]
impl DataProvider for PgDataProvider {
    async fn get_event_by_id(&self, id: Uuid) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    async fn get_latest_statistics(
        &self,
        event_id: Uuid,
    ) -> Result<Option<EventStatisticsSnapshot>, AppError> {
        let snapshot = sqlx::query_as::<_, EventStatisticsSnapshot>(
            "SELECT * FROM event_statistics WHERE event_id = $1 ORDER BY snapshot_at DESC LIMIT 1",
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(snapshot)
    }

    async fn get_statistics_in_range(
        &self,
        event_id: Uuid,
        range: &TimeRange,
    ) -> Result<RecencySeries, AppError> {
        let snapshots = sqlx::query_as::<_, EventStatisticsSnapshot>(
            r#"
            SELECT * FROM event_statistics
            WHERE event_id = $1 AND snapshot_at >= $2 AND snapshot_at <= $3
            ORDER BY snapshot_at DESC
            "#,
        )
        .bind(event_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;
        Ok(RecencySeries::from_descending(snapshots))
    }

    async fn get_all_statistics(&self, event_id: Uuid) -> Result<ChronologicalSeries, AppError> {
        let snapshots = sqlx::query_as::<_, EventStatisticsSnapshot>(
            "SELECT * FROM event_statistics WHERE event_id = $1 ORDER BY snapshot_at ASC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ChronologicalSeries::from_ascending(snapshots))
    }

    async fn get_snapshots_in_range(
        &self,
        range: &TimeRange,
    ) -> Result<ChronologicalSeries, AppError> {
        let snapshots = sqlx::query_as::<_, EventStatisticsSnapshot>(
            r#"
            SELECT * FROM event_statistics
            WHERE snapshot_at >= $1 AND snapshot_at <= $2
            ORDER BY snapshot_at ASC
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;
        Ok(ChronologicalSeries::from_ascending(snapshots))
    }

    async fn get_event_list(
        &self,
        range: &TimeRange,
        filters: &EventFilters,
    ) -> Result<Vec<Event>, AppError> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT * FROM events
            WHERE occurred_at >= $1 AND occurred_at <= $2
              AND ($3::text IS NULL OR category = $3)
              AND ($4::text IS NULL OR status = $4)
            ORDER BY hotness DESC
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .bind(filters.category.as_deref())
        .bind(filters.status.as_deref())
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn get_hot_events(&self, limit: i64) -> Result<Vec<Event>, AppError> {
        let events = sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE status = 'active' ORDER BY hotness DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn get_category_stats(&self, range: &TimeRange) -> Result<Vec<CategoryStat>, AppError> {
        let rows = sqlx::query_as::<_, CategoryStatRow>(
            r#"
            SELECT category, COUNT(*) AS event_count, AVG(hotness) AS avg_hotness
            FROM events
            WHERE occurred_at >= $1 AND occurred_at <= $2
            GROUP BY category
            ORDER BY event_count DESC
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| CategoryStat {
                category: r.category,
                event_count: r.event_count,
                avg_hotness: r.avg_hotness.unwrap_or(0.0),
            })
            .collect())
    }

    async fn get_influence_users(&self, event_id: Uuid) -> Result<Vec<InfluenceUser>, AppError> {
        let rows = sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT user_name, interactions, followers, post_count
            FROM event_participants
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        let mut users: Vec<InfluenceUser> = rows
            .into_iter()
            .map(|r| InfluenceUser {
                influence: influence_score(r.interactions, r.followers, r.post_count),
                user_name: r.user_name,
                interactions: r.interactions,
                followers: r.followers,
                post_count: r.post_count,
            })
            .collect();
        users.sort_by(|a, b| b.influence.cmp(&a.influence));
        Ok(users)
    }

    async fn get_geographic_distribution(
        &self,
        event_id: Uuid,
    ) -> Result<Vec<GeographicEntry>, AppError> {
        let rows = sqlx::query_as::<_, RegionRow>(
            r#"
            SELECT region, post_count, sentiment
            FROM event_regions
            WHERE event_id = $1
            ORDER BY post_count DESC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                let estimate = geographic_sentiment(r.sentiment);
                GeographicEntry {
                    region: r.region,
                    post_count: r.post_count,
                    sentiment: estimate.value,
                    is_estimated: estimate.is_estimated,
                }
            })
            .collect())
    }
}

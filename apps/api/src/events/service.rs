//! Aggregate facade composing the data provider, the cache layer, and the
//! analytics core into response payloads.
//!
//! This is where "event not found" lives: the facade resolves the event
//! before any analytics function runs, so the pure computations stay total.
//! Every operation goes through `CacheLayer::get_or_set` with a tier matched
//! to how fast the underlying fact changes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analytics::time_range::{Granularity, TimeRange};
use crate::analytics::timeline::{
    build_timeline, development_pattern, development_phases, key_nodes, success_factors,
    DevelopmentPattern, DevelopmentPhase, KeyNode, SuccessFactor, TimelineNode,
};
use crate::analytics::trends::{
    self, classify_trend, EventTimeSeries, EventTrendAnalysis, PropagationPathEntry, TrendDirection,
    TrendSeries,
};
use crate::cache::{cache_key, CacheLayer, Ttl};
use crate::errors::AppError;
use crate::models::event::{Event, EventStatisticsSnapshot};
use crate::provider::{CategoryStat, DataProvider, EventFilters, GeographicEntry, InfluenceUser};

const HOT_EVENTS_LIMIT: i64 = 10;

/// Window the detail trend is computed over: the two most recent samples
/// inside this range decide up/down/stable.
const TREND_WINDOW_TOKEN: &str = "7d";

/// Detail payload: the event, its latest snapshot, and the headline trend
/// direction derived from the two most recent hotness samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDetail {
    pub event: Event,
    pub latest: Option<EventStatisticsSnapshot>,
    pub trend: TrendDirection,
}

/// Full lifecycle payload for the timeline endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventTimelinePayload {
    pub timeline: Vec<TimelineNode>,
    pub key_nodes: Vec<KeyNode>,
    pub phases: Vec<DevelopmentPhase>,
    pub pattern: DevelopmentPattern,
    pub success_factors: Vec<SuccessFactor>,
}

#[derive(Clone)]
pub struct EventsService {
    provider: Arc<dyn DataProvider>,
    cache: CacheLayer,
}

impl EventsService {
    pub fn new(provider: Arc<dyn DataProvider>, cache: CacheLayer) -> Self {
        Self { provider, cache }
    }

    pub async fn list_events(
        &self,
        token: &str,
        filters: EventFilters,
    ) -> Result<Vec<Event>, AppError> {
        let (range, _) = resolve_token(token)?;
        let key = cache_key(
            "events:list",
            &[
                token,
                filters.category.as_deref().unwrap_or("-"),
                filters.status.as_deref().unwrap_or("-"),
            ],
        );
        let provider = self.provider.clone();
        self.cache
            .get_or_set(&key, Ttl::Short, move || async move {
                provider.get_event_list(&range, &filters).await
            })
            .await
    }

    pub async fn hot_events(&self) -> Result<Vec<Event>, AppError> {
        let provider = self.provider.clone();
        self.cache
            .get_or_set("events:hot", Ttl::Short, move || async move {
                provider.get_hot_events(HOT_EVENTS_LIMIT).await
            })
            .await
    }

    pub async fn event_detail(&self, id: Uuid) -> Result<EventDetail, AppError> {
        let (trend_range, _) = resolve_token(TREND_WINDOW_TOKEN)?;
        let key = cache_key("events:detail", &[&id.to_string()]);
        let provider = self.provider.clone();
        self.cache
            .get_or_set(&key, Ttl::Short, move || async move {
                let event = require_event(&*provider, id).await?;
                // the latest sample may sit outside the trend window for
                // stale events; fetch it independently
                let latest = provider.get_latest_statistics(id).await?;
                let recent = provider.get_statistics_in_range(id, &trend_range).await?;
                let trend = match (recent.get(0), recent.get(1)) {
                    (Some(newest), Some(previous)) => {
                        classify_trend(newest.hotness - previous.hotness)
                    }
                    _ => TrendDirection::Stable,
                };
                Ok(EventDetail { event, latest, trend })
            })
            .await
    }

    /// Lifecycle view over the event's entire history: phase segmentation
    /// and the development pattern describe the whole life of the event, not
    /// a display window.
    pub async fn event_timeline(&self, id: Uuid) -> Result<EventTimelinePayload, AppError> {
        let key = cache_key("events:timeline", &[&id.to_string()]);
        let provider = self.provider.clone();
        self.cache
            .get_or_set(&key, Ttl::Medium, move || async move {
                let event = require_event(&*provider, id).await?;
                let stats = provider.get_all_statistics(id).await?.into_recency();

                let timeline = build_timeline(&event, &stats);
                Ok(EventTimelinePayload {
                    key_nodes: key_nodes(&timeline),
                    phases: development_phases(&stats),
                    pattern: development_pattern(&event, &stats),
                    success_factors: success_factors(&event),
                    timeline,
                })
            })
            .await
    }

    pub async fn event_trends(
        &self,
        id: Uuid,
        token: &str,
    ) -> Result<EventTrendAnalysis, AppError> {
        let (range, granularity) = resolve_token(token)?;
        let key = cache_key("events:trends", &[&id.to_string(), token]);
        let provider = self.provider.clone();
        self.cache
            .get_or_set(&key, Ttl::Medium, move || async move {
                require_event(&*provider, id).await?;
                let stats = provider.get_statistics_in_range(id, &range).await?;
                Ok(trends::event_trends(stats, granularity))
            })
            .await
    }

    pub async fn event_time_series(
        &self,
        id: Uuid,
        token: &str,
    ) -> Result<EventTimeSeries, AppError> {
        let (range, granularity) = resolve_token(token)?;
        let key = cache_key("events:timeseries", &[&id.to_string(), token]);
        let provider = self.provider.clone();
        self.cache
            .get_or_set(&key, Ttl::Medium, move || async move {
                require_event(&*provider, id).await?;
                let stats = provider.get_statistics_in_range(id, &range).await?;
                Ok(trends::event_time_series(stats, granularity))
            })
            .await
    }

    pub async fn propagation_path(
        &self,
        id: Uuid,
    ) -> Result<Vec<PropagationPathEntry>, AppError> {
        let key = cache_key("events:propagation", &[&id.to_string()]);
        let provider = self.provider.clone();
        self.cache
            .get_or_set(&key, Ttl::Medium, move || async move {
                let event = require_event(&*provider, id).await?;
                Ok(trends::propagation_path(&event))
            })
            .await
    }

    pub async fn influence_users(&self, id: Uuid) -> Result<Vec<InfluenceUser>, AppError> {
        let key = cache_key("events:influence", &[&id.to_string()]);
        let provider = self.provider.clone();
        self.cache
            .get_or_set(&key, Ttl::Long, move || async move {
                require_event(&*provider, id).await?;
                provider.get_influence_users(id).await
            })
            .await
    }

    pub async fn geographic_distribution(
        &self,
        id: Uuid,
    ) -> Result<Vec<GeographicEntry>, AppError> {
        let key = cache_key("events:geo", &[&id.to_string()]);
        let provider = self.provider.clone();
        self.cache
            .get_or_set(&key, Ttl::Long, move || async move {
                require_event(&*provider, id).await?;
                provider.get_geographic_distribution(id).await
            })
            .await
    }

    /// Cross-event trend series at the token's display granularity.
    pub async fn trend_data(&self, token: &str) -> Result<TrendSeries, AppError> {
        let (range, granularity) = resolve_token(token)?;
        let key = cache_key("analytics:trends", &[token]);
        let provider = self.provider.clone();
        self.cache
            .get_or_set(&key, Ttl::Medium, move || async move {
                let snapshots = provider.get_snapshots_in_range(&range).await?;
                Ok(trends::build_trend_series(&snapshots, granularity))
            })
            .await
    }

    pub async fn category_stats(&self, token: &str) -> Result<Vec<CategoryStat>, AppError> {
        let (range, _) = resolve_token(token)?;
        let key = cache_key("analytics:categories", &[token]);
        let provider = self.provider.clone();
        self.cache
            .get_or_set(&key, Ttl::Long, move || async move {
                provider.get_category_stats(&range).await
            })
            .await
    }
}

/// The facade's not-found branch. Runs before any analytics computation.
async fn require_event(provider: &dyn DataProvider, id: Uuid) -> Result<Event, AppError> {
    provider
        .get_event_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event {id} not found")))
}

/// Resolves a symbolic range token or rejects it as a validation error.
fn resolve_token(token: &str) -> Result<(TimeRange, Granularity), AppError> {
    let range = TimeRange::resolve(token)
        .ok_or_else(|| AppError::Validation(format!("Unknown time range '{token}'")))?;
    let granularity = Granularity::for_token(token)
        .ok_or_else(|| AppError::Validation(format!("Unknown time range '{token}'")))?;
    Ok((range, granularity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::timeline::NodeType;
    use crate::cache::test_support::MemoryBackend;
    use crate::models::series::{ChronologicalSeries, RecencySeries};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap()
    }

    fn snapshot(days_ago: i64, hotness: f64) -> EventStatisticsSnapshot {
        EventStatisticsSnapshot {
            event_id: Uuid::nil(),
            snapshot_at: base_time() - Duration::days(days_ago),
            post_count: 10,
            user_count: 5,
            sentiment_positive: 0.5,
            sentiment_negative: 0.2,
            sentiment_neutral: 0.3,
            hotness,
        }
    }

    fn test_event() -> Event {
        Event {
            id: Uuid::new_v4(),
            title: "test event".into(),
            description: String::new(),
            category: "social".into(),
            status: "active".into(),
            occurred_at: base_time() - Duration::days(30),
            created_at: base_time(),
            updated_at: base_time(),
            hotness: 75.0,
            sentiment_positive: 0.5,
            sentiment_negative: 0.2,
            sentiment_neutral: 0.3,
        }
    }

    /// Canned provider: `window` is newest-first, `history` oldest-first.
    struct StubProvider {
        event: Event,
        latest: Option<EventStatisticsSnapshot>,
        window: Vec<EventStatisticsSnapshot>,
        history: Vec<EventStatisticsSnapshot>,
    }

    #[async_trait]
    impl DataProvider for StubProvider {
        async fn get_event_by_id(&self, id: Uuid) -> Result<Option<Event>, AppError> {
            Ok((id == self.event.id).then(|| self.event.clone()))
        }

        async fn get_latest_statistics(
            &self,
            _event_id: Uuid,
        ) -> Result<Option<EventStatisticsSnapshot>, AppError> {
            Ok(self.latest.clone())
        }

        async fn get_statistics_in_range(
            &self,
            _event_id: Uuid,
            _range: &TimeRange,
        ) -> Result<RecencySeries, AppError> {
            Ok(RecencySeries::from_descending(self.window.clone()))
        }

        async fn get_all_statistics(
            &self,
            _event_id: Uuid,
        ) -> Result<ChronologicalSeries, AppError> {
            Ok(ChronologicalSeries::from_ascending(self.history.clone()))
        }

        async fn get_snapshots_in_range(
            &self,
            _range: &TimeRange,
        ) -> Result<ChronologicalSeries, AppError> {
            Ok(ChronologicalSeries::from_ascending(vec![]))
        }

        async fn get_event_list(
            &self,
            _range: &TimeRange,
            _filters: &EventFilters,
        ) -> Result<Vec<Event>, AppError> {
            Ok(vec![])
        }

        async fn get_hot_events(&self, _limit: i64) -> Result<Vec<Event>, AppError> {
            Ok(vec![])
        }

        async fn get_category_stats(
            &self,
            _range: &TimeRange,
        ) -> Result<Vec<CategoryStat>, AppError> {
            Ok(vec![])
        }

        async fn get_influence_users(
            &self,
            _event_id: Uuid,
        ) -> Result<Vec<InfluenceUser>, AppError> {
            Ok(vec![])
        }

        async fn get_geographic_distribution(
            &self,
            _event_id: Uuid,
        ) -> Result<Vec<GeographicEntry>, AppError> {
            Ok(vec![])
        }
    }

    fn service_with(provider: StubProvider) -> EventsService {
        EventsService::new(
            Arc::new(provider),
            CacheLayer::new(Arc::new(MemoryBackend::default())),
        )
    }

    #[test]
    fn test_resolve_token_rejects_unknown() {
        assert!(matches!(
            resolve_token("fortnight"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_resolve_token_accepts_both_families() {
        assert!(resolve_token("7d").is_ok());
        assert!(resolve_token("thisQuarter").is_ok());
    }

    #[tokio::test]
    async fn test_event_detail_latest_is_fetched_independently_of_window() {
        let event = test_event();
        let id = event.id;
        // the freshest sample is outside the trend window
        let service = service_with(StubProvider {
            event,
            latest: Some(snapshot(0, 99.0)),
            window: vec![snapshot(8, 80.0), snapshot(9, 70.0)],
            history: vec![],
        });

        let detail = service.event_detail(id).await.unwrap();
        assert_eq!(detail.latest.unwrap().hotness, 99.0);
        // delta 10 within the window → up
        assert_eq!(detail.trend, TrendDirection::Up);
    }

    #[tokio::test]
    async fn test_event_detail_single_sample_window_is_stable() {
        let event = test_event();
        let id = event.id;
        let service = service_with(StubProvider {
            event,
            latest: Some(snapshot(0, 50.0)),
            window: vec![snapshot(1, 50.0)],
            history: vec![],
        });

        let detail = service.event_detail(id).await.unwrap();
        assert_eq!(detail.trend, TrendDirection::Stable);
    }

    #[tokio::test]
    async fn test_event_detail_unknown_event_is_not_found() {
        let service = service_with(StubProvider {
            event: test_event(),
            latest: None,
            window: vec![],
            history: vec![],
        });

        let err = service.event_detail(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_event_timeline_spans_full_history() {
        let event = test_event();
        let id = event.id;
        // oldest-first full history, long enough for all three phases
        let history: Vec<EventStatisticsSnapshot> =
            (0..6).map(|i| snapshot(9 - i, 10.0 * (i + 1) as f64)).collect();
        let oldest_time = history[0].snapshot_at;
        let service = service_with(StubProvider {
            event,
            latest: None,
            window: vec![],
            history,
        });

        let payload = service.event_timeline(id).await.unwrap();
        assert_eq!(payload.phases.len(), 3);
        assert_eq!(payload.timeline[0].node_type, NodeType::Start);
        assert_eq!(payload.timeline[0].time, oldest_time);
    }
}

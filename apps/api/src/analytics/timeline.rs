//! Lifecycle timeline construction and development-phase segmentation.
//!
//! All functions are total: an empty or short history degrades to defaults or
//! omitted sections. "Not found" is the facade's problem, never raised here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::event::Event;
use crate::models::series::RecencySeries;

/// Latest hotness below this share of the headline hotness reads as decline.
const DECLINE_RATIO: f64 = 0.7;

const START_IMPACT: u32 = 60;
const PEAK_IMPACT: u32 = 95;
const KEY_EVENT_IMPACT: u32 = 75;
const DECLINE_IMPACT: u32 = 40;

/// Fixed lifecycle-phase catalog. Metrics are computed per event; the
/// qualitative content is shared by every event in a given phase.
struct PhaseDefinition {
    name: &'static str,
    description: &'static str,
    key_events: &'static [&'static str],
    key_tasks: &'static [&'static str],
    key_measures: &'static [&'static str],
}

const EARLY_PHASE: PhaseDefinition = PhaseDefinition {
    name: "early",
    description: "Initial discussion emerges around the topic",
    key_events: &["First posts observed", "Topic picked up by early communities"],
    key_tasks: &["Identify originating accounts", "Confirm topic classification"],
    key_measures: &["Baseline sentiment capture", "Watchlist registration"],
};

const OUTBREAK_PHASE: PhaseDefinition = PhaseDefinition {
    name: "outbreak",
    description: "Rapid spread with accelerating participation",
    key_events: &["Cross-platform amplification", "High-influence accounts join"],
    key_tasks: &["Track propagation channels", "Escalate to duty analysts"],
    key_measures: &["Hourly sentiment sampling", "Response coordination"],
};

const STABLE_PHASE: PhaseDefinition = PhaseDefinition {
    name: "stable",
    description: "Discussion volume plateaus or recedes",
    key_events: &["Participation growth flattens", "Follow-up coverage tapers"],
    key_tasks: &["Summarize lifecycle for reporting", "Review response effectiveness"],
    key_measures: &["Daily monitoring cadence", "Archive decision checkpoint"],
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Start,
    Peak,
    Decline,
    KeyEvent,
    Milestone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMetrics {
    pub posts: i64,
    pub users: i64,
    pub sentiment: f64,
}

/// One derived point on an event's lifecycle timeline. Never persisted;
/// lifetime is one request or cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineNode {
    pub time: DateTime<Utc>,
    pub event: String,
    pub node_type: NodeType,
    pub impact: u32,
    pub description: String,
    pub metrics: NodeMetrics,
}

/// Builds the lifecycle timeline from a newest-first history.
///
/// Always emits a `start` node (defaults when the history is empty). A `peak`
/// is the first interior local maximum of hotness when at least three samples
/// exist; a `key_event` marks the midpoint when at least two exist; `decline`
/// appears when the latest sample has fallen below 70% of the headline
/// hotness. Construction order is not chronological, so nodes are explicitly
/// sorted by time before return.
pub fn build_timeline(event: &Event, stats: &RecencySeries) -> Vec<TimelineNode> {
    let mut nodes = Vec::new();

    match stats.oldest() {
        Some(oldest) => nodes.push(TimelineNode {
            time: oldest.snapshot_at,
            event: event.title.clone(),
            node_type: NodeType::Start,
            impact: START_IMPACT,
            description: "Event first observed".to_string(),
            metrics: NodeMetrics {
                posts: oldest.post_count,
                users: oldest.user_count,
                sentiment: oldest.sentiment().positive_share(),
            },
        }),
        None => nodes.push(TimelineNode {
            time: event.occurred_at,
            event: event.title.clone(),
            node_type: NodeType::Start,
            impact: START_IMPACT,
            description: "Event first observed".to_string(),
            metrics: NodeMetrics {
                posts: 100,
                users: 50,
                sentiment: 0.5,
            },
        }),
    }

    let samples = stats.as_slice();

    if samples.len() >= 3 {
        // first interior local maximum of hotness (ties count)
        for i in 1..samples.len() - 1 {
            if samples[i].hotness >= samples[i - 1].hotness
                && samples[i].hotness >= samples[i + 1].hotness
            {
                nodes.push(TimelineNode {
                    time: samples[i].snapshot_at,
                    event: event.title.clone(),
                    node_type: NodeType::Peak,
                    impact: PEAK_IMPACT,
                    description: "Discussion reached peak intensity".to_string(),
                    metrics: NodeMetrics {
                        posts: samples[i].post_count,
                        users: samples[i].user_count,
                        sentiment: samples[i].sentiment().positive_share(),
                    },
                });
                break;
            }
        }
    }

    if samples.len() >= 2 {
        let mid = &samples[samples.len() / 2];
        nodes.push(TimelineNode {
            time: mid.snapshot_at,
            event: event.title.clone(),
            node_type: NodeType::KeyEvent,
            impact: KEY_EVENT_IMPACT,
            description: "Significant development in the discussion".to_string(),
            metrics: NodeMetrics {
                posts: mid.post_count,
                users: mid.user_count,
                sentiment: mid.sentiment().positive_share(),
            },
        });
    }

    if let Some(latest) = stats.latest() {
        if latest.hotness < event.hotness * DECLINE_RATIO {
            nodes.push(TimelineNode {
                time: latest.snapshot_at,
                event: event.title.clone(),
                node_type: NodeType::Decline,
                impact: DECLINE_IMPACT,
                description: "Activity falling off from its peak".to_string(),
                metrics: NodeMetrics {
                    posts: latest.post_count,
                    users: latest.user_count,
                    sentiment: latest.sentiment().positive_share(),
                },
            });
        }
    }

    nodes.sort_by_key(|n| n.time);
    nodes
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyNode {
    pub time: DateTime<Utc>,
    pub event: String,
    pub level: String,
    pub impact: u32,
    pub description: String,
}

/// Key nodes are the timeline minus its `start` node, with impact mapped to a
/// three-tier label.
pub fn key_nodes(timeline: &[TimelineNode]) -> Vec<KeyNode> {
    timeline
        .iter()
        .filter(|n| n.node_type != NodeType::Start)
        .map(|n| KeyNode {
            time: n.time,
            event: n.event.clone(),
            level: impact_level(n.impact).to_string(),
            impact: n.impact,
            description: n.description.clone(),
        })
        .collect()
}

fn impact_level(impact: u32) -> &'static str {
    if impact >= 80 {
        "high"
    } else if impact >= 50 {
        "medium"
    } else {
        "low"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseStatus {
    Completed,
    Ongoing,
    Planned,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseMetrics {
    pub hotness: f64,
    pub posts: i64,
    pub users: i64,
    pub sentiment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentPhase {
    pub phase: String,
    pub time_range: String,
    pub description: String,
    pub key_events: Vec<String>,
    pub key_tasks: Vec<String>,
    pub key_measures: Vec<String>,
    pub metrics: PhaseMetrics,
    pub status: PhaseStatus,
}

/// Splits the newest-first history into three positional windows: late (first
/// 30%, newest), mid (30%–70%), early (last 30%, oldest). The early phase
/// appears whenever its slice is non-empty; mid requires more than 3 samples
/// in total, late more than 5.
pub fn development_phases(stats: &RecencySeries) -> Vec<DevelopmentPhase> {
    let samples = stats.as_slice();
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }

    let cut_late = (n as f64 * 0.3).floor() as usize;
    let cut_mid = (n as f64 * 0.7).floor() as usize;
    let late = &samples[..cut_late];
    let mid = &samples[cut_late..cut_mid];
    let early = &samples[cut_mid..];

    let mut phases = Vec::new();

    if !early.is_empty() {
        phases.push(make_phase(&EARLY_PHASE, early, PhaseStatus::Completed));
    }
    if n > 3 && !mid.is_empty() {
        let status = if n <= 5 {
            PhaseStatus::Ongoing
        } else {
            PhaseStatus::Completed
        };
        phases.push(make_phase(&OUTBREAK_PHASE, mid, status));
    }
    if n > 5 && !late.is_empty() {
        phases.push(make_phase(&STABLE_PHASE, late, PhaseStatus::Ongoing));
    }

    phases
}

/// Aggregates one phase over a newest-first slice: average hotness across the
/// window, post/user/sentiment from the window's closing (newest) boundary.
fn make_phase(
    definition: &PhaseDefinition,
    slice: &[crate::models::event::EventStatisticsSnapshot],
    status: PhaseStatus,
) -> DevelopmentPhase {
    let avg_hotness = slice.iter().map(|s| s.hotness).sum::<f64>() / slice.len() as f64;
    let newest = &slice[0];
    let oldest = &slice[slice.len() - 1];

    DevelopmentPhase {
        phase: definition.name.to_string(),
        time_range: format!(
            "{} ~ {}",
            oldest.snapshot_at.format("%Y-%m-%d"),
            newest.snapshot_at.format("%Y-%m-%d")
        ),
        description: definition.description.to_string(),
        key_events: definition.key_events.iter().map(|s| s.to_string()).collect(),
        key_tasks: definition.key_tasks.iter().map(|s| s.to_string()).collect(),
        key_measures: definition.key_measures.iter().map(|s| s.to_string()).collect(),
        metrics: PhaseMetrics {
            hotness: avg_hotness,
            posts: newest.post_count,
            users: newest.user_count,
            sentiment: newest.sentiment().positive_share(),
        },
        status,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentPattern {
    pub outbreak_speed: String,
    pub propagation_scope: String,
    pub duration: String,
    pub impact_depth: String,
}

/// Classifies how the event unfolded. Spread speed is peak hotness divided by
/// how many samples back from the present the peak sits.
pub fn development_pattern(event: &Event, stats: &RecencySeries) -> DevelopmentPattern {
    let samples = stats.as_slice();

    let mut peak_hotness = 0.0f64;
    let mut peak_index = 0usize;
    for (i, s) in samples.iter().enumerate() {
        if s.hotness > peak_hotness {
            peak_hotness = s.hotness;
            peak_index = i;
        }
    }
    let spread_speed = peak_hotness / (peak_index + 1) as f64;

    let outbreak_speed = if spread_speed > 20.0 {
        "fast"
    } else if spread_speed > 10.0 {
        "medium"
    } else {
        "slow"
    };
    let propagation_scope = if event.hotness >= 80.0 {
        "wide"
    } else if event.hotness >= 50.0 {
        "moderate"
    } else {
        "limited"
    };
    let duration = if samples.len() >= 30 {
        "long"
    } else if samples.len() >= 7 {
        "medium"
    } else {
        "short"
    };
    let impact_depth = if peak_hotness >= 90.0 {
        "deep"
    } else if peak_hotness >= 60.0 {
        "moderate"
    } else {
        "shallow"
    };

    DevelopmentPattern {
        outbreak_speed: outbreak_speed.to_string(),
        propagation_scope: propagation_scope.to_string(),
        duration: duration.to_string(),
        impact_depth: impact_depth.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessFactor {
    pub factor: String,
    pub description: String,
}

/// Qualitative factors behind the event's spread. Three fixed factors always
/// apply; media amplification is added for headline hotness of 80 or above.
pub fn success_factors(event: &Event) -> Vec<SuccessFactor> {
    let mut factors = vec![
        SuccessFactor {
            factor: "Topic sensitivity".to_string(),
            description: "The subject touches widely shared concerns".to_string(),
        },
        SuccessFactor {
            factor: "Timing".to_string(),
            description: "Emerged while public attention was available".to_string(),
        },
        SuccessFactor {
            factor: "Participant influence".to_string(),
            description: "Early participants carried established audiences".to_string(),
        },
    ];

    if event.hotness >= 80.0 {
        factors.push(SuccessFactor {
            factor: "Media amplification".to_string(),
            description: "Mainstream coverage multiplied organic reach".to_string(),
        });
    }

    factors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::EventStatisticsSnapshot;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap()
    }

    fn event_with_hotness(hotness: f64) -> Event {
        Event {
            id: Uuid::nil(),
            title: "test event".into(),
            description: String::new(),
            category: "social".into(),
            status: "active".into(),
            occurred_at: base_time() - Duration::days(30),
            created_at: base_time(),
            updated_at: base_time(),
            hotness,
            sentiment_positive: 0.5,
            sentiment_negative: 0.2,
            sentiment_neutral: 0.3,
        }
    }

    /// Builds a newest-first history from hotness values (index 0 = newest).
    fn history(hotness: &[f64]) -> RecencySeries {
        let snapshots = hotness
            .iter()
            .enumerate()
            .map(|(i, &h)| EventStatisticsSnapshot {
                event_id: Uuid::nil(),
                snapshot_at: base_time() - Duration::days(i as i64),
                post_count: 10 * (i as i64 + 1),
                user_count: 5 * (i as i64 + 1),
                sentiment_positive: 0.5,
                sentiment_negative: 0.2,
                sentiment_neutral: 0.3,
                hotness: h,
            })
            .collect();
        RecencySeries::from_descending(snapshots)
    }

    #[test]
    fn test_empty_history_yields_single_default_start_node() {
        let timeline = build_timeline(&event_with_hotness(50.0), &history(&[]));
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].node_type, NodeType::Start);
        assert_eq!(timeline[0].metrics.posts, 100);
        assert_eq!(timeline[0].metrics.users, 50);
        assert_eq!(timeline[0].metrics.sentiment, 0.5);
    }

    #[test]
    fn test_interior_local_minimum_emits_no_peak() {
        // newest-first [80, 60, 90]: the middle sample is a local minimum
        let timeline = build_timeline(&event_with_hotness(80.0), &history(&[80.0, 60.0, 90.0]));
        assert!(timeline.iter().all(|n| n.node_type != NodeType::Peak));
    }

    #[test]
    fn test_interior_local_maximum_emits_peak() {
        let timeline = build_timeline(&event_with_hotness(50.0), &history(&[50.0, 90.0, 40.0]));
        let peak = timeline
            .iter()
            .find(|n| n.node_type == NodeType::Peak)
            .expect("peak node");
        assert_eq!(peak.impact, 95);
        // the peak carries the metrics of the middle sample
        assert_eq!(peak.metrics.posts, 20);
    }

    #[test]
    fn test_two_samples_emit_midpoint_key_event_but_no_peak() {
        let timeline = build_timeline(&event_with_hotness(60.0), &history(&[60.0, 50.0]));
        assert!(timeline.iter().any(|n| n.node_type == NodeType::KeyEvent && n.impact == 75));
        assert!(timeline.iter().all(|n| n.node_type != NodeType::Peak));
    }

    #[test]
    fn test_decline_node_when_latest_falls_below_70_percent() {
        // headline 100, latest 60 < 70
        let timeline = build_timeline(&event_with_hotness(100.0), &history(&[60.0, 90.0]));
        assert!(timeline.iter().any(|n| n.node_type == NodeType::Decline && n.impact == 40));

        // latest 70 is exactly the boundary: not a decline
        let timeline = build_timeline(&event_with_hotness(100.0), &history(&[70.0, 90.0]));
        assert!(timeline.iter().all(|n| n.node_type != NodeType::Decline));
    }

    #[test]
    fn test_timeline_is_sorted_ascending_by_time() {
        let timeline = build_timeline(
            &event_with_hotness(100.0),
            &history(&[40.0, 90.0, 50.0, 30.0, 20.0]),
        );
        assert!(timeline.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    fn test_key_nodes_drop_start_and_tier_impact() {
        let timeline = build_timeline(
            &event_with_hotness(100.0),
            &history(&[40.0, 90.0, 50.0, 30.0, 20.0]),
        );
        let keys = key_nodes(&timeline);
        assert!(!keys.is_empty());
        assert!(keys.len() < timeline.len());
        for key in &keys {
            let expected = if key.impact >= 80 {
                "high"
            } else if key.impact >= 50 {
                "medium"
            } else {
                "low"
            };
            assert_eq!(key.level, expected);
        }
    }

    #[test]
    fn test_phases_all_three_for_long_history() {
        let phases = development_phases(&history(&[80.0, 85.0, 90.0, 70.0, 50.0, 30.0, 20.0, 10.0, 5.0, 2.0]));
        let names: Vec<&str> = phases.iter().map(|p| p.phase.as_str()).collect();
        assert_eq!(names, vec!["early", "outbreak", "stable"]);
        assert_eq!(phases[0].status, PhaseStatus::Completed);
        assert_eq!(phases[1].status, PhaseStatus::Completed); // >5 samples
        assert_eq!(phases[2].status, PhaseStatus::Ongoing);
    }

    #[test]
    fn test_phases_short_history_gates_mid_and_late() {
        // 4 samples: early + mid only, mid still ongoing
        let phases = development_phases(&history(&[50.0, 40.0, 30.0, 20.0]));
        let names: Vec<&str> = phases.iter().map(|p| p.phase.as_str()).collect();
        assert_eq!(names, vec!["early", "outbreak"]);
        assert_eq!(phases[1].status, PhaseStatus::Ongoing);

        // 2 samples: early only
        let phases = development_phases(&history(&[50.0, 40.0]));
        let names: Vec<&str> = phases.iter().map(|p| p.phase.as_str()).collect();
        assert_eq!(names, vec!["early"]);
    }

    #[test]
    fn test_phases_empty_history() {
        assert!(development_phases(&history(&[])).is_empty());
    }

    #[test]
    fn test_phase_metrics_average_hotness() {
        let phases = development_phases(&history(&[
            80.0, 85.0, 90.0, 70.0, 50.0, 30.0, 20.0, 10.0, 5.0, 3.0,
        ]));
        // early phase covers the oldest 30%: hotness [10, 5, 3] → avg 6
        assert!((phases[0].metrics.hotness - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_development_pattern_classification() {
        // peak 90 at index 1 → spread 45 → fast; 10 samples → medium duration
        let pattern = development_pattern(
            &event_with_hotness(85.0),
            &history(&[40.0, 90.0, 50.0, 30.0, 20.0, 10.0, 10.0, 10.0, 10.0, 10.0]),
        );
        assert_eq!(pattern.outbreak_speed, "fast");
        assert_eq!(pattern.propagation_scope, "wide");
        assert_eq!(pattern.duration, "medium");
        assert_eq!(pattern.impact_depth, "deep");
    }

    #[test]
    fn test_development_pattern_slow_and_limited() {
        // peak 30 at index 3 → spread 7.5 → slow
        let pattern = development_pattern(
            &event_with_hotness(40.0),
            &history(&[10.0, 20.0, 25.0, 30.0]),
        );
        assert_eq!(pattern.outbreak_speed, "slow");
        assert_eq!(pattern.propagation_scope, "limited");
        assert_eq!(pattern.duration, "short");
        assert_eq!(pattern.impact_depth, "shallow");
    }

    #[test]
    fn test_development_pattern_empty_history_is_total() {
        let pattern = development_pattern(&event_with_hotness(55.0), &history(&[]));
        assert_eq!(pattern.outbreak_speed, "slow");
        assert_eq!(pattern.propagation_scope, "moderate");
        assert_eq!(pattern.duration, "short");
        assert_eq!(pattern.impact_depth, "shallow");
    }

    #[test]
    fn test_success_factors_media_amplification_threshold() {
        assert_eq!(success_factors(&event_with_hotness(85.0)).len(), 4);
        assert_eq!(success_factors(&event_with_hotness(80.0)).len(), 4);
        assert_eq!(success_factors(&event_with_hotness(70.0)).len(), 3);
    }
}

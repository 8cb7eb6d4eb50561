//! Influence scoring and geographic sentiment normalization.
//!
//! These back the data provider's `get_influence_users` and
//! `get_geographic_distribution`: the SQL fetches raw counts, the weighting
//! lives here where it can be tested without a database.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Weighted influence score for a participant, capped at 100.
pub fn influence_score(interactions: i64, followers: i64, post_count: i64) -> u32 {
    let raw = interactions as f64 * 0.0006
        + followers as f64 / 1000.0 * 0.3
        + post_count as f64 * 0.1;
    raw.round().clamp(0.0, 100.0) as u32
}

/// A regional sentiment value, tagged with whether it was measured or
/// synthesized. Downstream consumers must be able to tell the two apart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentEstimate {
    pub value: f64,
    pub is_estimated: bool,
}

/// Uses the real aggregate when one exists; otherwise falls back to a
/// synthetic normal-ish sample (mean 0.5, sd 0.15, clamped to [0,1]) flagged
/// as estimated.
pub fn geographic_sentiment(real: Option<f64>) -> SentimentEstimate {
    match real {
        Some(value) => SentimentEstimate {
            value,
            is_estimated: false,
        },
        None => SentimentEstimate {
            value: sample_synthetic_sentiment(),
            is_estimated: true,
        },
    }
}

/// Box-Muller draw around 0.5 with sd 0.15, clamped to [0,1].
fn sample_synthetic_sentiment() -> f64 {
    let mut rng = rand::thread_rng();
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
    (0.5 + 0.15 * z).clamp(0.0, 1.0)
}

//! Sentiment-scaled reminder delay.
//!
//! A distressed conversation gets a check-in sooner than a cheerful one:
//!
//! - **Short**: score at or below the low threshold, base + negative extra
//! - **Medium**: score between the thresholds, or no score, base only
//! - **Long**: score at or above the high threshold, base + positive extra

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::storage::ReminderConfig;

/// Emotional valence of the latest exchange, as rated by the backend.
///
/// Observed range is 1-10; fractional values occur.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SentimentScore(pub f64);

impl SentimentScore {
    /// `None` for NaN and infinities; those carry no usable valence.
    pub fn new(value: f64) -> Option<Self> {
        value.is_finite().then_some(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Additional-delay tier derived from a sentiment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelayTier {
    /// Negative sentiment: follow up early
    Short,
    /// Neutral or unknown sentiment: base quiet period only
    Medium,
    /// Positive sentiment: tolerate a longer gap
    Long,
}

/// Outcome of applying the policy to one score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayDecision {
    pub tier: DelayTier,
    #[serde(with = "secs")]
    pub delay: Duration,
}

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

/// Maps sentiment scores to reminder delays.
#[derive(Debug, Clone, PartialEq)]
pub struct DelayPolicy {
    pub base_delay: Duration,
    pub negative_extra: Duration,
    pub positive_extra: Duration,
    pub low_threshold: f64,
    pub high_threshold: f64,
}

impl Default for DelayPolicy {
    fn default() -> Self {
        Self::from_config(&ReminderConfig::default())
    }
}

impl DelayPolicy {
    pub fn from_config(config: &ReminderConfig) -> Self {
        Self {
            base_delay: Duration::from_secs(config.base_delay_secs),
            negative_extra: Duration::from_secs(config.negative_extra_secs),
            positive_extra: Duration::from_secs(config.positive_extra_secs),
            low_threshold: config.low_threshold,
            high_threshold: config.high_threshold,
        }
    }

    /// Tier for a score. Absent scores are Medium.
    pub fn classify(&self, score: Option<SentimentScore>) -> DelayTier {
        match score {
            None => DelayTier::Medium,
            Some(SentimentScore(s)) if s.is_nan() => DelayTier::Medium,
            Some(SentimentScore(s)) if s <= self.low_threshold => DelayTier::Short,
            Some(SentimentScore(s)) if s >= self.high_threshold => DelayTier::Long,
            Some(_) => DelayTier::Medium,
        }
    }

    pub fn extra_for(&self, tier: DelayTier) -> Duration {
        match tier {
            DelayTier::Short => self.negative_extra,
            DelayTier::Medium => Duration::ZERO,
            DelayTier::Long => self.positive_extra,
        }
    }

    pub fn decide(&self, score: Option<SentimentScore>) -> DelayDecision {
        let tier = self.classify(score);
        DelayDecision {
            tier,
            delay: self.base_delay.saturating_add(self.extra_for(tier)),
        }
    }

    /// Total quiet period before a reminder for this score.
    ///
    /// Total function: every input, including an absent score, yields a
    /// finite delay of at least `base_delay`.
    pub fn compute_delay(&self, score: Option<SentimentScore>) -> Duration {
        self.decide(score).delay
    }
}

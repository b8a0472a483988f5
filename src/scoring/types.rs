//! Deal scoring types

use crate::config::ScoringConfig;
use crate::error::DealScoutError;
use crate::types::ListingId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How much to trust a market estimate, derived from its sample size
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn from_sample_size(sample_size: u32, config: &ScoringConfig) -> Self {
        if sample_size >= config.high_confidence_samples {
            Confidence::High
        } else if sample_size >= config.medium_confidence_samples {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    pub fn score(&self, config: &ScoringConfig) -> Decimal {
        match self {
            Confidence::High => config.high_confidence_score,
            Confidence::Medium => config.medium_confidence_score,
            Confidence::Low => config.low_confidence_score,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Confidence::Low => "LOW",
            Confidence::Medium => "MEDIUM",
            Confidence::High => "HIGH",
        };
        write!(f, "{}", s)
    }
}

/// Comparable-sales estimate for a listing's category, supplied by a market data provider
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketEstimate {
    pub average: Decimal,
    pub median: Option<Decimal>,
    pub sample_size: u32,
    pub confidence: Confidence,
}

impl MarketEstimate {
    /// Build an estimate whose confidence follows from the sample size
    pub fn from_samples(
        average: Decimal,
        median: Option<Decimal>,
        sample_size: u32,
        config: &ScoringConfig,
    ) -> Self {
        Self {
            average,
            median,
            sample_size,
            confidence: Confidence::from_sample_size(sample_size, config),
        }
    }

    /// An estimate with no samples or no positive average carries no information
    pub fn is_usable(&self) -> bool {
        self.sample_size > 0 && self.average > Decimal::ZERO
    }
}

/// Coarse buy recommendation
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DealRating {
    Hot,
    Good,
    Fair,
    Pass,
}

impl DealRating {
    pub fn from_score(score: Decimal, config: &ScoringConfig) -> Self {
        if score >= config.hot_threshold {
            DealRating::Hot
        } else if score >= config.good_threshold {
            DealRating::Good
        } else if score >= config.fair_threshold {
            DealRating::Fair
        } else {
            DealRating::Pass
        }
    }
}

impl fmt::Display for DealRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DealRating::Hot => "HOT",
            DealRating::Good => "GOOD",
            DealRating::Fair => "FAIR",
            DealRating::Pass => "PASS",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for DealRating {
    type Err = DealScoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HOT" => Ok(DealRating::Hot),
            "GOOD" => Ok(DealRating::Good),
            "FAIR" => Ok(DealRating::Fair),
            "PASS" => Ok(DealRating::Pass),
            other => Err(DealScoutError::Validation(format!(
                "unknown deal rating: {}",
                other
            ))),
        }
    }
}

/// The four normalized sub-scores behind a deal score
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub discount_score: Decimal,
    pub roi_score: Decimal,
    pub profit_score: Decimal,
    pub confidence_score: Decimal,
    /// Market price the discount was measured against
    pub reference_price: Decimal,
}

/// Result of scoring one listing against the market
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DealAnalysis {
    pub listing_id: ListingId,
    /// Weighted score in [0, 100]
    pub score: Decimal,
    pub rating: DealRating,
    pub profit_estimate: Decimal,
    pub roi_percent: Decimal,
    pub discount_pct: Decimal,
    pub confidence: Confidence,
    /// Average used for bounds, `None` when the estimate was missing or empty
    pub market_average: Option<Decimal>,
    pub reason: String,
    pub breakdown: ScoreBreakdown,
}

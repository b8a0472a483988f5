//! Engine configuration
//!
//! Every policy constant the scoring and negotiation engines use lives here.
//! `Default` reproduces the reference policy; a TOML file only needs to name
//! the values it overrides.

pub mod loader;

pub use loader::{load_config, parse_config};

use crate::error::{DealScoutError, Result};
use crate::negotiation::types::StrategyTier;
use crate::scoring::fees::FeeSchedule;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scoring: ScoringConfig,
    pub negotiation: NegotiationConfig,
    pub fees: FeesConfig,
}

/// Deal scoring thresholds and weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Discount (percent below market) that earns the full discount score
    pub max_discount_pct: Decimal,
    /// ROI percent that earns the full ROI score
    pub max_roi_pct: Decimal,
    /// Absolute profit that earns the full profit score
    pub max_profit: Decimal,

    pub discount_weight: Decimal,
    pub roi_weight: Decimal,
    pub profit_weight: Decimal,
    pub confidence_weight: Decimal,

    pub hot_threshold: Decimal,
    pub good_threshold: Decimal,
    pub fair_threshold: Decimal,

    pub high_confidence_score: Decimal,
    pub medium_confidence_score: Decimal,
    pub low_confidence_score: Decimal,

    /// Minimum comparable sample size for HIGH confidence
    pub high_confidence_samples: u32,
    /// Minimum comparable sample size for MEDIUM confidence
    pub medium_confidence_samples: u32,

    /// Sub-score used when no market estimate is available
    pub neutral_score: Decimal,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            max_discount_pct: dec!(40),
            max_roi_pct: dec!(50),
            max_profit: dec!(150),
            discount_weight: dec!(0.40),
            roi_weight: dec!(0.30),
            profit_weight: dec!(0.20),
            confidence_weight: dec!(0.10),
            hot_threshold: dec!(80),
            good_threshold: dec!(60),
            fair_threshold: dec!(40),
            high_confidence_score: dec!(100),
            medium_confidence_score: dec!(60),
            low_confidence_score: dec!(20),
            high_confidence_samples: 20,
            medium_confidence_samples: 10,
            neutral_score: dec!(50),
        }
    }
}

/// Opening fraction and per-round concession cap for one strategy tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierPolicy {
    pub opening_fraction: Decimal,
    /// Largest fraction of the remaining gap to the walk-away price one round may add
    pub max_increase_per_round_pct: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TiersConfig {
    pub shrewd: TierPolicy,
    pub moderate: TierPolicy,
    pub lenient: TierPolicy,
    pub accept: TierPolicy,
}

impl TiersConfig {
    pub fn policy(&self, tier: StrategyTier) -> &TierPolicy {
        match tier {
            StrategyTier::Shrewd => &self.shrewd,
            StrategyTier::Moderate => &self.moderate,
            StrategyTier::Lenient => &self.lenient,
            StrategyTier::Accept => &self.accept,
        }
    }
}

impl Default for TiersConfig {
    fn default() -> Self {
        Self {
            shrewd: TierPolicy {
                opening_fraction: dec!(0.50),
                max_increase_per_round_pct: dec!(0.08),
            },
            moderate: TierPolicy {
                opening_fraction: dec!(0.70),
                max_increase_per_round_pct: dec!(0.12),
            },
            lenient: TierPolicy {
                opening_fraction: dec!(0.85),
                max_increase_per_round_pct: dec!(0.18),
            },
            accept: TierPolicy {
                opening_fraction: Decimal::ONE,
                max_increase_per_round_pct: Decimal::ZERO,
            },
        }
    }
}

/// Concession policy for the negotiation state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegotiationConfig {
    /// Fraction of the gap conceded per round; the last entry repeats
    pub concession_schedule: Vec<Decimal>,
    /// Seller counter within this fraction of asking triggers a split
    pub convergence_pct: Decimal,
    /// Seller counter within this fraction above walk-away earns a final offer
    pub final_offer_tolerance_pct: Decimal,
    /// Walk-away price sits this fraction above the market average
    pub walk_away_markup: Decimal,
    pub tiers: TiersConfig,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            concession_schedule: vec![dec!(0.50), dec!(0.40), dec!(0.30), dec!(0.20), dec!(0.15)],
            convergence_pct: dec!(0.05),
            final_offer_tolerance_pct: dec!(0.05),
            walk_away_markup: dec!(0.05),
            tiers: TiersConfig::default(),
        }
    }
}

impl NegotiationConfig {
    /// Concession rate for a 1-based round, capped at the last schedule entry
    pub fn concession_rate(&self, round_number: u32) -> Decimal {
        let last = self.concession_schedule.len().saturating_sub(1);
        let index = (round_number.saturating_sub(1) as usize).min(last);
        self.concession_schedule
            .get(index)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

/// Named marketplace fee schedules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeesConfig {
    pub default_schedule: String,
    pub schedules: BTreeMap<String, FeeSchedule>,
}

impl Default for FeesConfig {
    fn default() -> Self {
        let mut schedules = BTreeMap::new();
        schedules.insert("ebay".to_string(), FeeSchedule::ebay());
        schedules.insert("facebook".to_string(), FeeSchedule::facebook());
        schedules.insert("none".to_string(), FeeSchedule::none());

        Self {
            default_schedule: "ebay".to_string(),
            schedules,
        }
    }
}

impl FeesConfig {
    /// Look up a schedule by name, or the default schedule when `name` is `None`
    pub fn schedule(&self, name: Option<&str>) -> Result<&FeeSchedule> {
        let name = name.unwrap_or(&self.default_schedule);
        self.schedules
            .get(name)
            .ok_or_else(|| DealScoutError::Validation(format!("unknown fee schedule: {}", name)))
    }
}
